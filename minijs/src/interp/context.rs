//! Scope chain and evaluation signals.
//!
//! A [`Context`] is a cheap handle over a shared scope. Lookups try
//! the own bindings, then the dynamic caller chain, then the lexical
//! parent chain, and finally the lazily materialized globals. Control
//! flow travels as signals on the context instead of unwinding the
//! Rust stack: `return`, `break` and `throw` all set flags that the
//! evaluation loops poll.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::interp::{builtins, Value};

#[derive(Default)]
struct Signals {
    stopped: bool,
    return_value: Option<Value>,
    error_thrown: Option<Value>,
}

/// Shared across a whole evaluation tree, surfaced by the engine.
#[derive(Default)]
pub struct Counters {
    pub statements: Cell<u64>,
    pub errors: Cell<u64>,
}

struct Scope {
    bindings: RefCell<HashMap<Rc<str>, Value>>,
    parent: Option<Context>,
    caller: Option<Context>,
    signals: RefCell<Signals>,
    /// Pending instance while a `new` expression resolves its callee.
    construct: RefCell<Option<Value>>,
    counters: Rc<Counters>,
}

#[derive(Clone)]
pub struct Context {
    scope: Rc<Scope>,
}

impl Context {
    pub fn root() -> Context {
        Context::with(None, None, Rc::new(Counters::default()))
    }

    fn with(parent: Option<Context>, caller: Option<Context>, counters: Rc<Counters>) -> Context {
        Context {
            scope: Rc::new(Scope {
                bindings: RefCell::new(HashMap::new()),
                parent,
                caller,
                signals: RefCell::new(Signals::default()),
                construct: RefCell::new(None),
                counters,
            }),
        }
    }

    /// Lexical child, used for loops, catch and finally blocks and
    /// arrow function bodies.
    pub fn child(&self) -> Context {
        Context::with(Some(self.clone()), None, self.scope.counters.clone())
    }

    /// Function invocation scope: lexical parent is the declaration
    /// context, the caller chain carries dynamic visibility.
    pub fn merge(&self, caller: Option<&Context>) -> Context {
        Context::with(
            Some(self.clone()),
            caller.cloned(),
            self.scope.counters.clone(),
        )
    }

    /// Flat snapshot of the own bindings with fresh counters and
    /// signals, for engine forking.
    pub fn copy(&self) -> Context {
        let copy = Context::with(None, None, Rc::new(Counters::default()));
        let bindings = self.scope.bindings.borrow();
        let mut target = copy.scope.bindings.borrow_mut();
        for (key, value) in bindings.iter() {
            target.insert(key.clone(), value.clone());
        }
        drop(target);
        copy
    }

    //==================================================================
    // bindings

    pub fn get(&self, name: &str) -> Value {
        if let Some(value) = self.scope.bindings.borrow().get(name) {
            return value.clone();
        }
        if let Some(caller) = &self.scope.caller {
            if caller.has_key(name) {
                return caller.get(name);
            }
        }
        if let Some(parent) = &self.scope.parent {
            if parent.has_key(name) {
                return parent.get(name);
            }
        }
        if let Some(global) = builtins::global(name) {
            // cache so later lookups and mutation see the same value
            self.scope
                .bindings
                .borrow_mut()
                .insert(Rc::from(name), global.clone());
            return global;
        }
        Value::Undefined
    }

    pub fn has_key(&self, name: &str) -> bool {
        if self.scope.bindings.borrow().contains_key(name) {
            return true;
        }
        if let Some(caller) = &self.scope.caller {
            if caller.has_key(name) {
                return true;
            }
        }
        if let Some(parent) = &self.scope.parent {
            if parent.has_key(name) {
                return true;
            }
        }
        builtins::is_global(name)
    }

    /// Bind in this scope. Anonymous functions pick up the name they
    /// are first bound under.
    pub fn declare(&self, name: &str, value: Value) {
        if let Value::Function(f) = &value {
            if f.get_name().is_none() {
                f.set_name(name);
            }
        }
        self.scope
            .bindings
            .borrow_mut()
            .insert(Rc::from(name), value);
    }

    /// Assign to the nearest scope that owns the name. A miss walks to
    /// the root scope and declares there, sloppy-mode style, so
    /// assignments from nested blocks stay visible afterwards.
    pub fn update(&self, name: &str, value: Value) {
        if self.scope.bindings.borrow().contains_key(name) {
            self.scope
                .bindings
                .borrow_mut()
                .insert(Rc::from(name), value);
            return;
        }
        if let Some(caller) = &self.scope.caller {
            if caller.has_key(name) {
                caller.update(name, value);
                return;
            }
        }
        if let Some(parent) = &self.scope.parent {
            if parent.has_key(name) {
                parent.update(name, value);
                return;
            }
        }
        self.root_scope().declare(name, value);
    }

    pub fn remove(&self, name: &str) {
        self.scope.bindings.borrow_mut().remove(name);
    }

    fn root_scope(&self) -> Context {
        let mut current = self.clone();
        while let Some(parent) = current.scope.parent.clone() {
            current = parent;
        }
        current
    }

    //==================================================================
    // signals

    pub fn stop_and_return(&self, value: Value) {
        let mut signals = self.scope.signals.borrow_mut();
        signals.stopped = true;
        signals.return_value = Some(value);
    }

    pub fn stop_and_throw(&self, error: Value) {
        let mut signals = self.scope.signals.borrow_mut();
        signals.stopped = true;
        signals.error_thrown = Some(error);
    }

    pub fn is_stopped(&self) -> bool {
        self.scope.signals.borrow().stopped
    }

    pub fn is_error(&self) -> bool {
        self.scope.signals.borrow().error_thrown.is_some()
    }

    pub fn error_thrown(&self) -> Option<Value> {
        self.scope.signals.borrow().error_thrown.clone()
    }

    /// The value of a completed `return`, undefined when the stop came
    /// from an error or a bare `break`.
    pub fn return_value(&self) -> Value {
        let signals = self.scope.signals.borrow();
        if signals.error_thrown.is_some() {
            return Value::Undefined;
        }
        signals.return_value.clone().unwrap_or(Value::Undefined)
    }

    /// Copy the signal state of a child context onto this one, used
    /// when loop and catch scopes finish.
    pub fn update_from(&self, child: &Context) {
        let from = child.scope.signals.borrow();
        let mut signals = self.scope.signals.borrow_mut();
        signals.stopped = from.stopped;
        signals.return_value = from.return_value.clone();
        signals.error_thrown = from.error_thrown.clone();
    }

    /// Program statements run to completion even after a stray break,
    /// only errors survive between top-level statements.
    pub fn clear_stopped(&self) {
        let mut signals = self.scope.signals.borrow_mut();
        if signals.error_thrown.is_none() {
            signals.stopped = false;
            signals.return_value = None;
        }
    }

    pub fn clear_error(&self) {
        *self.scope.signals.borrow_mut() = Signals::default();
    }

    //==================================================================
    // construction protocol

    pub fn set_construct(&self, instance: Value) {
        *self.scope.construct.borrow_mut() = Some(instance);
    }

    pub fn take_construct(&self) -> Option<Value> {
        self.scope.construct.borrow_mut().take()
    }

    //==================================================================
    // counters

    pub fn counters(&self) -> Rc<Counters> {
        self.scope.counters.clone()
    }

    pub fn bump_statements(&self) {
        let counters = &self.scope.counters;
        counters.statements.set(counters.statements.get() + 1);
    }

    pub fn bump_errors(&self) {
        let counters = &self.scope.counters;
        counters.errors.set(counters.errors.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_chain() {
        let root = Context::root();
        root.declare("a", Value::from(1));
        let child = root.child();
        assert!(matches!(child.get("a"), Value::Num(crate::interp::Num::I32(1))));
        child.update("a", Value::from(2));
        assert!(matches!(root.get("a"), Value::Num(crate::interp::Num::I32(2))));
    }

    #[test]
    fn test_shadowing() {
        let root = Context::root();
        root.declare("a", Value::from(1));
        let child = root.child();
        child.declare("a", Value::from(5));
        assert!(matches!(child.get("a"), Value::Num(crate::interp::Num::I32(5))));
        assert!(matches!(root.get("a"), Value::Num(crate::interp::Num::I32(1))));
    }

    #[test]
    fn test_update_miss_declares_at_root() {
        let root = Context::root();
        let inner = root.child().child();
        inner.update("leaked", Value::from(3));
        assert!(root.has_key("leaked"));
        assert!(matches!(root.get("leaked"), Value::Num(crate::interp::Num::I32(3))));
    }

    #[test]
    fn test_caller_chain_visibility() {
        let root = Context::root();
        root.declare("x", Value::from(7));
        let decl = Context::root();
        let invoke = decl.merge(Some(&root.child()));
        assert!(matches!(invoke.get("x"), Value::Num(crate::interp::Num::I32(7))));
    }

    #[test]
    fn test_globals_are_cached() {
        let ctx = Context::root();
        assert!(!ctx.scope.bindings.borrow().contains_key("Math"));
        let first = ctx.get("Math");
        assert!(ctx.scope.bindings.borrow().contains_key("Math"));
        let second = ctx.get("Math");
        assert!(first.ref_eq(&second));
    }

    #[test]
    fn test_signals() {
        let ctx = Context::root();
        assert!(!ctx.is_stopped());
        ctx.stop_and_return(Value::from(9));
        assert!(ctx.is_stopped());
        assert!(!ctx.is_error());
        assert!(matches!(ctx.return_value(), Value::Num(crate::interp::Num::I32(9))));

        let child = ctx.child();
        child.stop_and_throw(Value::str("boom"));
        assert!(child.is_error());
        assert!(child.return_value().is_undefined());
        ctx.update_from(&child);
        assert!(ctx.is_error());
    }

    #[test]
    fn test_copy_is_independent() {
        let ctx = Context::root();
        ctx.declare("a", Value::from(1));
        let copy = ctx.copy();
        copy.declare("a", Value::from(2));
        assert!(matches!(ctx.get("a"), Value::Num(crate::interp::Num::I32(1))));
        assert!(matches!(copy.get("a"), Value::Num(crate::interp::Num::I32(2))));
    }
}

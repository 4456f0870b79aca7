//! Embedding facade. An [`Engine`] owns a root context and runs
//! source through the parser and evaluator, exposing host bindings,
//! console capture and execution counters.

use std::path::Path;
use std::rc::Rc;

use crate::interp::{self, builtins, Context, HostFn, JsFunction, Value};
use crate::parser::Parser;
use crate::Result;

pub struct Engine {
    root: Context,
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Engine {
        Engine {
            root: Context::root(),
        }
    }

    fn with_root(root: Context) -> Engine {
        Engine { root }
    }

    /// Evaluate source in the engine's root context. Bindings persist
    /// across calls, the value of the last statement comes back.
    pub fn eval(&self, source: &str) -> Result<Value> {
        let program = Parser::new(source)?.parse()?;
        interp::eval(&program, &self.root)
    }

    pub fn eval_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let source = std::fs::read_to_string(path)?;
        self.eval(&source)
    }

    /// Evaluate in a child scope seeded with extra bindings. The root
    /// context stays visible but declarations made here do not leak
    /// into it.
    pub fn eval_with(&self, source: &str, bindings: &[(&str, Value)]) -> Result<Value> {
        let child = self.root.child();
        for (name, value) in bindings {
            child.declare(name, value.clone());
        }
        let program = Parser::new(source)?.parse()?;
        interp::eval(&program, &child)
    }

    pub fn get(&self, name: &str) -> Value {
        self.root.get(name)
    }

    pub fn set(&self, name: &str, value: Value) {
        self.root.declare(name, value);
    }

    /// Expose a host function to scripts under the given name.
    pub fn register(&self, name: &str, f: HostFn) {
        self.root
            .declare(name, Value::Function(JsFunction::host(name, f)));
    }

    /// Route `console.log` output through the given sink instead of
    /// stdout.
    pub fn set_on_console(&self, sink: Rc<dyn Fn(&str)>) {
        self.root.declare("console", builtins::console(sink));
    }

    /// Fork with a snapshot of the root bindings. Values are shared,
    /// scopes and counters are not.
    pub fn copy(&self) -> Engine {
        Engine::with_root(self.root.copy())
    }

    pub fn statement_count(&self) -> u64 {
        self.root.counters().statements.get()
    }

    pub fn error_count(&self) -> u64 {
        self.root.counters().errors.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_eval_persists_bindings() {
        let engine = Engine::new();
        engine.eval("var a = 2").unwrap();
        let result = engine.eval("a * 21").unwrap();
        assert!(matches!(result, Value::Num(crate::Num::I32(42))));
    }

    #[test]
    fn test_get_set() {
        let engine = Engine::new();
        engine.set("greeting", Value::str("hi"));
        let result = engine.eval("greeting + '!'").unwrap();
        assert_eq!(result.as_str(), Some("hi!"));
        engine.eval("var answer = 42").unwrap();
        assert!(matches!(
            engine.get("answer"),
            Value::Num(crate::Num::I32(42))
        ));
    }

    #[test]
    fn test_eval_with_does_not_leak() {
        let engine = Engine::new();
        let result = engine
            .eval_with("var local = x + 1; local", &[("x", Value::from(4))])
            .unwrap();
        assert!(matches!(result, Value::Num(crate::Num::I32(5))));
        assert!(engine.get("local").is_undefined());
        assert!(engine.get("x").is_undefined());
    }

    #[test]
    fn test_register_host_function() {
        let engine = Engine::new();
        engine.register(
            "double",
            Rc::new(|args| {
                let n = args
                    .first()
                    .map(|v| crate::interp::coerce::to_number(v).to_i32())
                    .unwrap_or(0);
                Ok(Value::from(n * 2))
            }),
        );
        let result = engine.eval("double(21)").unwrap();
        assert!(matches!(result, Value::Num(crate::Num::I32(42))));
    }

    #[test]
    fn test_console_capture() {
        let engine = Engine::new();
        let lines = Rc::new(RefCell::new(Vec::new()));
        let captured = lines.clone();
        engine.set_on_console(Rc::new(move |line| {
            captured.borrow_mut().push(line.to_string())
        }));
        engine.eval("console.log('a', 1, true)").unwrap();
        assert_eq!(lines.borrow().as_slice(), ["a 1 true"]);
    }

    #[test]
    fn test_copy_is_isolated() {
        let engine = Engine::new();
        engine.eval("var a = 1").unwrap();
        let fork = engine.copy();
        fork.eval("a = 2").unwrap();
        assert!(matches!(engine.get("a"), Value::Num(crate::Num::I32(1))));
        assert!(matches!(fork.get("a"), Value::Num(crate::Num::I32(2))));
    }

    #[test]
    fn test_counters() {
        let engine = Engine::new();
        engine.eval("var a = 1; a + 1; a + 2").unwrap();
        assert_eq!(engine.statement_count(), 3);
        assert_eq!(engine.error_count(), 0);
        assert!(engine.eval("nope()").is_err());
        assert_eq!(engine.error_count(), 1);
    }
}

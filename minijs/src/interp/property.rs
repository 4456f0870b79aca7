//! Property references: the one place that resolves reads, writes and
//! callee lookups for plain names, dot members and bracket indexes.

use std::rc::Rc;

use crate::ast::{Node, SyntaxKind};
use crate::error::{Error, Result};
use crate::interp::{builtins, coerce, eval, Context, Exotic, JsFunction, Value};
use crate::lexer::Token;

pub struct PropertyRef {
    /// Source-ish text of the reference, for error messages.
    text: String,
    ctx: Context,
    target: Option<Value>,
    name: Option<Rc<str>>,
    index: Option<Value>,
}

impl PropertyRef {
    pub fn new(node: &Node, ctx: &Context) -> Result<PropertyRef> {
        let mut current = node;
        while current.kind == SyntaxKind::Expr && !current.children.is_empty() {
            current = &current.children[0];
        }
        let mut prop = PropertyRef {
            text: current.text(),
            ctx: ctx.clone(),
            target: None,
            name: None,
            index: None,
        };
        match current.kind {
            SyntaxKind::RefExpr => {
                prop.name = Some(Rc::from(current.children[0].chunk_text()));
            }
            SyntaxKind::RefDotExpr => {
                // a broken target reads as undefined, not as a failure
                prop.target =
                    Some(eval::eval(&current.children[0], ctx).unwrap_or(Value::Undefined));
                prop.name = Some(Rc::from(current.children[2].chunk_text()));
            }
            SyntaxKind::RefBracketExpr => {
                prop.target = Some(eval::eval(&current.children[0], ctx)?);
                prop.index = Some(eval::eval(&current.children[2], ctx)?);
            }
            SyntaxKind::LitExpr
            | SyntaxKind::ParenExpr
            | SyntaxKind::FnCallExpr
            | SyntaxKind::FnExpr
            | SyntaxKind::FnArrowExpr
            | SyntaxKind::NewExpr
            | SyntaxKind::LitTemplate
            | SyntaxKind::RegexLiteral => {
                prop.target = Some(eval::eval(current, ctx)?);
            }
            SyntaxKind::Leaf => match current.token() {
                Some(Token::Ident | Token::This) => {
                    prop.name = Some(Rc::from(current.chunk_text()));
                }
                _ => {
                    prop.target = Some(eval::eval(current, ctx)?);
                }
            },
            _ => {
                return Err(Error::eval(format!("cannot assign to: {}", prop.text)));
            }
        }
        Ok(prop)
    }

    pub fn get(&self) -> Result<Value> {
        let Some(target) = &self.target else {
            let name = self.name.as_deref().unwrap_or_default();
            return Ok(self.ctx.get(name));
        };
        if target.is_undefined() {
            return Ok(Value::Undefined);
        }
        if let Some(Value::Num(n)) = &self.index {
            return self.get_index(target, n.to_i64());
        }
        let key: Rc<str> = match (&self.name, &self.index) {
            (Some(name), _) => name.clone(),
            (None, Some(index)) => Rc::from(coerce::to_display(index)),
            (None, None) => return Ok(target.clone()),
        };
        Ok(get_member(target, &key))
    }

    fn get_index(&self, target: &Value, index: i64) -> Result<Value> {
        match target {
            Value::Array(items) => {
                if index < 0 {
                    return Ok(Value::Undefined);
                }
                Ok(items
                    .borrow()
                    .get(index as usize)
                    .cloned()
                    .unwrap_or(Value::Undefined))
            }
            Value::Str(s) => {
                if index < 0 {
                    return Ok(Value::Undefined);
                }
                Ok(s.chars()
                    .nth(index as usize)
                    .map(|c| Value::from(c.to_string()))
                    .unwrap_or(Value::Undefined))
            }
            // numeric keys on objects go through stringified lookup,
            // which is what array-like match results rely on
            Value::Object(o) => Ok(o.get_own(&index.to_string()).unwrap_or(Value::Undefined)),
            Value::Function(f) => Ok(f
                .props
                .borrow()
                .get(&index.to_string())
                .unwrap_or(Value::Undefined)),
            _ => Err(Error::eval(format!(
                "get by index [{index}] not supported for: {}",
                self.text
            ))),
        }
    }

    pub fn set(&self, value: Value) -> Result<()> {
        if let Some(Value::Num(n)) = &self.index {
            return self.set_index(n.to_i64(), value);
        }
        let name: Rc<str> = match (&self.name, &self.index) {
            (Some(name), _) => name.clone(),
            (None, Some(index)) => Rc::from(coerce::to_display(index)),
            (None, None) => {
                return Err(Error::eval(format!("cannot assign to: {}", self.text)));
            }
        };
        if let Value::Function(f) = &value {
            if f.get_name().is_none() {
                f.set_name(&name);
            }
        }
        match &self.target {
            None => {
                self.ctx.update(&name, value);
                Ok(())
            }
            Some(Value::Object(o)) => {
                o.put(name, value);
                Ok(())
            }
            Some(Value::Function(f)) => {
                f.props.borrow_mut().insert(name, value);
                Ok(())
            }
            Some(_) => Err(Error::eval(format!("cannot set '{name}' on: {}", self.text))),
        }
    }

    fn set_index(&self, index: i64, value: Value) -> Result<()> {
        match &self.target {
            Some(Value::Array(items)) => {
                if index < 0 {
                    return Err(Error::eval(format!(
                        "cannot set by index [{index}] on: {}",
                        self.text
                    )));
                }
                let mut items = items.borrow_mut();
                let index = index as usize;
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            Some(Value::Object(o)) => {
                o.put(index.to_string(), value);
                Ok(())
            }
            _ => Err(Error::eval(format!(
                "cannot set by index [{index}] on: {}",
                self.text
            ))),
        }
    }

    pub fn delete(&self) {
        let key: String = match (&self.name, &self.index) {
            (Some(name), _) => name.to_string(),
            (None, Some(index)) => coerce::to_display(index),
            (None, None) => return,
        };
        match &self.target {
            None => self.ctx.remove(&key),
            Some(Value::Object(o)) => o.remove(&key),
            Some(Value::Function(f)) => {
                f.props.borrow_mut().remove(&key);
            }
            _ => {}
        }
    }

    /// Resolve to a callable plus its `this` binding. A receiver-less
    /// call binds the function value itself.
    pub fn get_callable(&self) -> Result<(Rc<JsFunction>, Value)> {
        let value = self.get()?;
        match value {
            Value::Function(f) => {
                let this = match &self.target {
                    Some(t) if !t.is_undefined() && !matches!(t, Value::Null) => t.clone(),
                    _ => Value::Function(f.clone()),
                };
                Ok((f, this))
            }
            // calling a prototype-shaped object dispatches to its
            // constructor entry
            Value::Object(o) => match o.get_own("constructor") {
                Some(Value::Function(f)) => Ok((f, Value::Object(o.clone()))),
                _ => Err(Error::eval(format!("not a function: {}", self.text))),
            },
            Value::Undefined => Err(Error::eval(format!(
                "undefined is not a function: {}",
                self.text
            ))),
            Value::Null => Err(Error::eval(format!(
                "null is not a function: {}",
                self.text
            ))),
            _ => Err(Error::eval(format!("not a function: {}", self.text))),
        }
    }
}

/// Member access on any value: own properties, then the prototype
/// chain of constructed instances, then the per-family built-ins.
pub fn get_member(target: &Value, name: &str) -> Value {
    match target {
        Value::Array(items) => builtins::array::get_prop(items, name)
            .or_else(|| builtins::object::proto(name))
            .unwrap_or(Value::Undefined),
        Value::Str(s) => builtins::string::get_prop(s, name)
            .or_else(|| builtins::object::proto(name))
            .unwrap_or(Value::Undefined),
        Value::Object(o) => {
            if let Some(value) = o.get_own(name) {
                return value;
            }
            let mut proto = o.proto.borrow().clone();
            while let Some(p) = proto {
                if let Some(value) = p.get_own(name) {
                    return value;
                }
                proto = p.proto.borrow().clone();
            }
            let exotic = match &o.kind {
                Exotic::Math => builtins::math::prop(name),
                Exotic::Json => builtins::json::prop(name),
                Exotic::Regex(data) => builtins::regex::prop(data, name),
                Exotic::Date(_) => builtins::date::prop(name),
                Exotic::None => None,
            };
            exotic
                .or_else(|| builtins::object::proto(name))
                .unwrap_or(Value::Undefined)
        }
        Value::Function(f) => {
            if let Some(value) = f.props.borrow().get(name) {
                return value;
            }
            match name {
                "name" => Value::from(f.get_name().unwrap_or_default()),
                "prototype" => Value::Object(f.get_prototype()),
                "constructor" => target.clone(),
                "call" => Value::Function(JsFunction::native("call", eval::call_method)),
                "apply" => Value::Function(JsFunction::native("apply", eval::apply_method)),
                _ => builtins::object::proto(name).unwrap_or(Value::Undefined),
            }
        }
        _ => Value::Undefined,
    }
}

//! Built-in globals and the per-family prototype methods. Globals are
//! materialized lazily by the context on first lookup, member methods
//! by the property resolver.

pub mod array;
pub mod date;
pub mod error;
pub mod json;
pub mod math;
pub mod object;
pub mod regex;
pub mod string;

use std::rc::Rc;

use crate::interp::{coerce, Context, Exotic, HostFn, JsFunction, JsObject, Num, Value};
use crate::Result;

pub fn global(name: &str) -> Option<Value> {
    Some(match name {
        "undefined" => Value::Undefined,
        "NaN" => Value::NAN,
        "Infinity" => Value::Num(Num::F64(f64::INFINITY)),
        "console" => console(Rc::new(|line| println!("{line}"))),
        "parseInt" => Value::Function(JsFunction::native("parseInt", parse_int)),
        "Number" => Value::Function(JsFunction::native("Number", number)),
        "Array" => array::constructor(),
        "Date" => date::constructor(),
        "Error" => error::constructor("Error"),
        "TypeError" => error::constructor("TypeError"),
        "JSON" => Value::Object(JsObject::with_kind(Exotic::Json)),
        "Math" => Value::Object(JsObject::with_kind(Exotic::Math)),
        "Object" => object::constructor(),
        "RegExp" => regex::constructor(),
        "String" => string::constructor(),
        _ => return None,
    })
}

pub fn is_global(name: &str) -> bool {
    matches!(
        name,
        "undefined"
            | "NaN"
            | "Infinity"
            | "console"
            | "parseInt"
            | "Number"
            | "Array"
            | "Date"
            | "Error"
            | "TypeError"
            | "JSON"
            | "Math"
            | "Object"
            | "RegExp"
            | "String"
    )
}

/// A console object writing through the given sink, one line per call.
pub fn console(sink: Rc<dyn Fn(&str)>) -> Value {
    let obj = JsObject::new();
    let log: HostFn = Rc::new(move |args| {
        let line: Vec<String> = args.iter().map(coerce::to_log).collect();
        sink(&line.join(" "));
        Ok(Value::Undefined)
    });
    obj.put("log", Value::Function(JsFunction::host("log", log)));
    Value::Object(obj)
}

fn parse_int(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let Some(arg) = args.first() else {
        return Ok(Value::NAN);
    };
    let n = coerce::to_number(arg).as_f64();
    if n.is_nan() || n.is_infinite() {
        return Ok(Value::Num(coerce::narrow(n)));
    }
    Ok(Value::Num(coerce::narrow(n.trunc())))
}

fn number(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    match args.first() {
        Some(arg) => Ok(Value::Num(coerce::to_number(arg))),
        None => Ok(Value::from(0)),
    }
}

/// The iteration view shared by for-in, for-of and the Object
/// statics: index/element pairs for arrays and strings, key/value
/// pairs for objects.
pub fn key_values(value: &Value) -> Vec<(Value, Value)> {
    match value {
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, item)| (Value::from(i.to_string()), item.clone()))
            .collect(),
        Value::Str(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (Value::from(i.to_string()), Value::from(c.to_string())))
            .collect(),
        Value::Object(o) => o
            .props
            .borrow()
            .entries()
            .into_iter()
            .map(|(key, value)| (Value::from(key), value))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_global_registry() {
        assert!(global("Math").is_some());
        assert!(global("nope").is_none());
        assert!(is_global("console"));
        assert!(!is_global("window"));
    }

    #[test]
    fn test_console_sink() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let captured = lines.clone();
        let console = console(Rc::new(move |line| captured.borrow_mut().push(line.to_string())));
        let Value::Object(obj) = &console else {
            panic!("console should be an object");
        };
        let Some(Value::Function(log)) = obj.get_own("log") else {
            panic!("console.log missing");
        };
        let ctx = Context::root();
        crate::interp::call_function(&log, &console, &[Value::from(1), Value::str("a")], &ctx)
            .unwrap();
        assert_eq!(lines.borrow().as_slice(), ["1 a"]);
    }

    #[test]
    fn test_key_values() {
        let arr = Value::array(vec![Value::str("x"), Value::str("y")]);
        let pairs = key_values(&arr);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.as_str(), Some("0"));
        assert_eq!(pairs[1].1.as_str(), Some("y"));
    }
}

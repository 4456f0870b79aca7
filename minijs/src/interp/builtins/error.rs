//! Error constructors. Errors are plain objects carrying `name` and
//! `message`, thrown values need no special representation.

use crate::interp::{coerce, Context, JsFunction, JsObject, Value};
use crate::Result;

pub fn constructor(kind: &'static str) -> Value {
    let f = match kind {
        "TypeError" => JsFunction::native("TypeError", construct_type_error),
        _ => JsFunction::native("Error", construct_error),
    };
    Value::Function(f)
}

fn construct_error(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(build("Error", args))
}

fn construct_type_error(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(build("TypeError", args))
}

fn build(name: &str, args: &[Value]) -> Value {
    let message = match args.first() {
        None | Some(Value::Undefined) => String::new(),
        Some(value) => coerce::to_display(value),
    };
    let obj = JsObject::new();
    obj.put("name", Value::str(name));
    obj.put("message", Value::from(message));
    Value::Object(obj)
}

/// Wraps an internal failure so a catch block sees a regular error
/// object.
pub fn from_message(message: &str) -> Value {
    build("Error", &[Value::str(message)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let error = build("TypeError", &[Value::str("boom")]);
        let Value::Object(obj) = &error else {
            panic!("expected object");
        };
        assert_eq!(
            obj.get_own("name").as_ref().and_then(Value::as_str),
            Some("TypeError")
        );
        assert_eq!(
            obj.get_own("message").as_ref().and_then(Value::as_str),
            Some("boom")
        );
    }

    #[test]
    fn test_empty_message() {
        let error = from_message("");
        let Value::Object(obj) = &error else {
            panic!("expected object");
        };
        assert_eq!(
            obj.get_own("message").as_ref().and_then(Value::as_str),
            Some("")
        );
    }
}

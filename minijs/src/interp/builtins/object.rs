//! Object statics and the base members every value family falls back
//! to.

use crate::error::Error;
use crate::interp::builtins::key_values;
use crate::interp::{coerce, Context, JsFunction, JsObject, Value};
use crate::Result;

/// Members shared by all object-like values: the final fallback of
/// property resolution.
pub fn proto(name: &str) -> Option<Value> {
    let f = match name {
        "toString" => JsFunction::native("toString", to_string),
        "hasOwnProperty" => JsFunction::native("hasOwnProperty", has_own_property),
        "valueOf" => JsFunction::native("valueOf", value_of),
        _ => return None,
    };
    Some(Value::Function(f))
}

pub fn constructor() -> Value {
    let f = JsFunction::native("Object", construct);
    let statics = [
        ("keys", JsFunction::native("keys", keys)),
        ("values", JsFunction::native("values", values)),
        ("entries", JsFunction::native("entries", entries)),
        ("assign", JsFunction::native("assign", assign)),
        ("fromEntries", JsFunction::native("fromEntries", from_entries)),
        ("is", JsFunction::native("is", is)),
    ];
    for (name, value) in statics {
        f.props.borrow_mut().insert(name, Value::Function(value));
    }
    Value::Function(f)
}

fn construct(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    match args.first() {
        Some(value) if !value.is_undefined() && !matches!(value, Value::Null) => Ok(value.clone()),
        _ => Ok(Value::Object(JsObject::new())),
    }
}

fn to_string(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let text = match this {
        Value::Null => "[object Null]".to_string(),
        Value::Array(_) => "[object Array]".to_string(),
        Value::Object(_) => "[object Object]".to_string(),
        other => coerce::to_display(other),
    };
    Ok(Value::from(text))
}

fn has_own_property(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let key = args.first().map(coerce::to_display).unwrap_or_default();
    let owned = match this {
        Value::Object(o) => o.has_own(&key),
        Value::Function(f) => f.props.borrow().contains_key(&key),
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) => index < items.borrow().len(),
            Err(_) => key == "length",
        },
        _ => false,
    };
    Ok(Value::Bool(owned))
}

fn value_of(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(this.clone())
}

//======================================================================
// statics

fn first_arg<'a>(args: &'a [Value], name: &str) -> Result<&'a Value> {
    args.first()
        .ok_or_else(|| Error::eval(format!("{name} needs an argument")))
}

fn keys(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let value = first_arg(args, "Object.keys")?;
    Ok(Value::array(
        key_values(value).into_iter().map(|(k, _)| k).collect(),
    ))
}

fn values(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let value = first_arg(args, "Object.values")?;
    Ok(Value::array(
        key_values(value).into_iter().map(|(_, v)| v).collect(),
    ))
}

fn entries(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let value = first_arg(args, "Object.entries")?;
    Ok(Value::array(
        key_values(value)
            .into_iter()
            .map(|(k, v)| Value::array(vec![k, v]))
            .collect(),
    ))
}

fn assign(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let target = first_arg(args, "Object.assign")?;
    let Value::Object(obj) = target else {
        return Err(Error::eval("Object.assign target must be an object"));
    };
    for source in args.iter().skip(1) {
        for (key, value) in key_values(source) {
            obj.put(coerce::to_display(&key), value);
        }
    }
    Ok(target.clone())
}

fn from_entries(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let value = first_arg(args, "Object.fromEntries")?;
    let obj = JsObject::new();
    for (_, pair) in key_values(value) {
        if let Value::Array(items) = pair {
            let items = items.borrow();
            let key = items.first().map(coerce::to_display).unwrap_or_default();
            let entry = items.get(1).cloned().unwrap_or(Value::Undefined);
            obj.put(key, entry);
        }
    }
    Ok(Value::Object(obj))
}

/// SameValue: like strict equality but NaN equals itself and signed
/// zeroes differ.
fn is(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let a = args.first().cloned().unwrap_or(Value::Undefined);
    let b = args.get(1).cloned().unwrap_or(Value::Undefined);
    if a.is_nan() && b.is_nan() {
        return Ok(Value::Bool(true));
    }
    if let (Value::Num(x), Value::Num(y)) = (&a, &b) {
        let (x, y) = (x.as_f64(), y.as_f64());
        return Ok(Value::Bool(
            x == y && x.is_sign_negative() == y.is_sign_negative(),
        ));
    }
    Ok(Value::Bool(coerce::eq(&a, &b, true)))
}

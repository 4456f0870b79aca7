//! The JSON namespace, backed by serde_json.

use crate::error::Error;
use crate::interp::{coerce, Context, JsFunction, JsObject, Value};
use crate::Result;

pub fn prop(name: &str) -> Option<Value> {
    let f = match name {
        "stringify" => JsFunction::native("stringify", stringify),
        "parse" => JsFunction::native("parse", parse),
        _ => return None,
    };
    Some(Value::Function(f))
}

fn stringify(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let Some(value) = args.first() else {
        return Ok(Value::Undefined);
    };
    let mut json = coerce::to_json(value);
    // optional whitelist of top-level keys
    if let (serde_json::Value::Object(map), Some(Value::Array(keys))) = (&mut json, args.get(1)) {
        let allowed: Vec<String> = keys.borrow().iter().map(coerce::to_display).collect();
        map.retain(|key, _| allowed.iter().any(|a| a == key));
    }
    let text =
        serde_json::to_string(&json).map_err(|e| Error::eval(format!("json stringify: {e}")))?;
    Ok(Value::from(text))
}

fn parse(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let text = args.first().map(coerce::to_display).unwrap_or_default();
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| Error::eval(format!("json parse error: {e}")))?;
    Ok(from_json(&json))
}

pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Num(coerce::narrow(i as f64))
            } else {
                Value::Num(coerce::narrow(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            let obj = JsObject::new();
            for (key, value) in map {
                obj.put(key.as_str(), from_json(value));
            }
            Value::Object(obj)
        }
    }
}

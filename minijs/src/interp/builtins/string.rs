//! String members. Strings are immutable, every method returns a new
//! value.

use std::rc::Rc;

use crate::error::Error;
use crate::interp::builtins::regex;
use crate::interp::{coerce, Context, Exotic, JsFunction, RegexData, Value};
use crate::Result;

pub fn get_prop(s: &Rc<str>, name: &str) -> Option<Value> {
    if name == "length" {
        return Some(Value::from(s.chars().count() as i32));
    }
    let f = match name {
        "charAt" => JsFunction::native("charAt", char_at),
        "charCodeAt" => JsFunction::native("charCodeAt", char_code_at),
        "codePointAt" => JsFunction::native("codePointAt", code_point_at),
        "indexOf" => JsFunction::native("indexOf", index_of),
        "lastIndexOf" => JsFunction::native("lastIndexOf", last_index_of),
        "startsWith" => JsFunction::native("startsWith", starts_with),
        "endsWith" => JsFunction::native("endsWith", ends_with),
        "includes" => JsFunction::native("includes", includes),
        "split" => JsFunction::native("split", split),
        "concat" => JsFunction::native("concat", concat),
        "padStart" => JsFunction::native("padStart", pad_start),
        "padEnd" => JsFunction::native("padEnd", pad_end),
        "repeat" => JsFunction::native("repeat", repeat),
        "slice" => JsFunction::native("slice", slice),
        "substring" => JsFunction::native("substring", substring),
        "toLowerCase" => JsFunction::native("toLowerCase", to_lower_case),
        "toUpperCase" => JsFunction::native("toUpperCase", to_upper_case),
        "trim" => JsFunction::native("trim", trim),
        "trimStart" => JsFunction::native("trimStart", trim_start),
        "trimEnd" => JsFunction::native("trimEnd", trim_end),
        "replace" => JsFunction::native("replace", replace),
        "replaceAll" => JsFunction::native("replaceAll", replace_all),
        "match" => JsFunction::native("match", match_method),
        "search" => JsFunction::native("search", search),
        "valueOf" => JsFunction::native("valueOf", value_of),
        "toString" => JsFunction::native("toString", value_of),
        _ => return None,
    };
    Some(Value::Function(f))
}

pub fn constructor() -> Value {
    let f = JsFunction::native("String", construct);
    f.props.borrow_mut().insert(
        "fromCharCode",
        Value::Function(JsFunction::native("fromCharCode", from_char_code)),
    );
    f.props.borrow_mut().insert(
        "fromCodePoint",
        Value::Function(JsFunction::native("fromCodePoint", from_char_code)),
    );
    Value::Function(f)
}

/// Returns the primitive even under `new String(..)`, the evaluator
/// recognizes this function for that case.
pub fn construct(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    match args.first() {
        Some(value) if !value.is_undefined() => Ok(Value::from(coerce::to_display(value))),
        _ => Ok(Value::str("")),
    }
}

//======================================================================
// helpers

fn this_str(this: &Value) -> Result<Rc<str>> {
    match this {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(Error::eval("not a string")),
    }
}

fn str_arg(args: &[Value], index: usize) -> String {
    args.get(index).map(coerce::to_display).unwrap_or_default()
}

fn int_arg(args: &[Value], index: usize) -> Option<i64> {
    match args.get(index) {
        None | Some(Value::Undefined) => None,
        Some(value) => Some(coerce::to_number(value).to_i64()),
    }
}

/// Relative char index with negative-from-end handling.
fn rel_index(arg: Option<i64>, len: usize, default: usize) -> usize {
    match arg {
        None => default,
        Some(mut i) => {
            if i < 0 {
                i += len as i64;
            }
            i.clamp(0, len as i64) as usize
        }
    }
}

fn substr(chars: &[char], start: usize, end: usize) -> Value {
    if start >= end {
        return Value::str("");
    }
    Value::from(chars[start..end].iter().collect::<String>())
}

fn with_regex<T>(value: &Value, f: impl FnOnce(&RegexData) -> T) -> Option<T> {
    if let Value::Object(o) = value {
        if let Exotic::Regex(data) = &o.kind {
            return Some(f(data));
        }
    }
    None
}

//======================================================================
// methods

fn char_at(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let index = int_arg(args, 0).unwrap_or(0);
    if index < 0 {
        return Ok(Value::str(""));
    }
    Ok(s.chars()
        .nth(index as usize)
        .map(|c| Value::from(c.to_string()))
        .unwrap_or(Value::str("")))
}

fn char_code_at(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let index = int_arg(args, 0).unwrap_or(0);
    if index < 0 {
        return Ok(Value::NAN);
    }
    Ok(s.chars()
        .nth(index as usize)
        .map(|c| Value::from(c as i32))
        .unwrap_or(Value::NAN))
}

fn code_point_at(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let index = int_arg(args, 0).unwrap_or(0);
    if index < 0 {
        return Ok(Value::Undefined);
    }
    Ok(s.chars()
        .nth(index as usize)
        .map(|c| Value::from(c as i32))
        .unwrap_or(Value::Undefined))
}

fn char_index(s: &str, byte_pos: usize) -> i32 {
    s[..byte_pos].chars().count() as i32
}

fn index_of(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let needle = str_arg(args, 0);
    Ok(Value::from(
        s.find(&needle).map(|p| char_index(&s, p)).unwrap_or(-1),
    ))
}

fn last_index_of(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let needle = str_arg(args, 0);
    Ok(Value::from(
        s.rfind(&needle).map(|p| char_index(&s, p)).unwrap_or(-1),
    ))
}

fn starts_with(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    Ok(Value::Bool(s.starts_with(&str_arg(args, 0))))
}

fn ends_with(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    Ok(Value::Bool(s.ends_with(&str_arg(args, 0))))
}

fn includes(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    Ok(Value::Bool(s.contains(&str_arg(args, 0))))
}

fn split(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let limit = int_arg(args, 1).map(|n| n.max(0) as usize);
    let mut parts: Vec<Value> = match args.first() {
        None | Some(Value::Undefined) => vec![Value::Str(s.clone())],
        Some(pattern) => {
            if let Some(parts) = with_regex(pattern, |data| {
                data.regex
                    .split(&s)
                    .map(|p| Value::from(p.to_string()))
                    .collect::<Vec<Value>>()
            }) {
                parts
            } else {
                let sep = coerce::to_display(pattern);
                if sep.is_empty() {
                    s.chars().map(|c| Value::from(c.to_string())).collect()
                } else {
                    s.split(&sep).map(|p| Value::from(p.to_string())).collect()
                }
            }
        }
    };
    if let Some(limit) = limit {
        parts.truncate(limit);
    }
    Ok(Value::array(parts))
}

fn concat(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let mut out = this_str(this)?.to_string();
    for arg in args {
        out.push_str(&coerce::to_display(arg));
    }
    Ok(Value::from(out))
}

fn pad(s: &str, args: &[Value], at_start: bool) -> Value {
    let target = int_arg(args, 0).unwrap_or(0).max(0) as usize;
    let pad = match args.get(1) {
        None | Some(Value::Undefined) => " ".to_string(),
        Some(value) => coerce::to_display(value),
    };
    let len = s.chars().count();
    if len >= target || pad.is_empty() {
        return Value::from(s.to_string());
    }
    let filler: String = pad.chars().cycle().take(target - len).collect();
    if at_start {
        Value::from(format!("{filler}{s}"))
    } else {
        Value::from(format!("{s}{filler}"))
    }
}

fn pad_start(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(pad(&this_str(this)?, args, true))
}

fn pad_end(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(pad(&this_str(this)?, args, false))
}

fn repeat(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let count = int_arg(args, 0).unwrap_or(0);
    if count < 0 {
        return Err(Error::eval("invalid count value"));
    }
    Ok(Value::from(s.repeat(count as usize)))
}

fn slice(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let chars: Vec<char> = s.chars().collect();
    let start = rel_index(int_arg(args, 0), chars.len(), 0);
    let end = rel_index(int_arg(args, 1), chars.len(), chars.len());
    Ok(substr(&chars, start, end))
}

/// Unlike slice, substring clamps negatives to zero and swaps
/// reversed bounds.
fn substring(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let a = int_arg(args, 0).unwrap_or(0).clamp(0, len) as usize;
    let b = int_arg(args, 1).unwrap_or(len).clamp(0, len) as usize;
    Ok(substr(&chars, a.min(b), a.max(b)))
}

fn to_lower_case(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_str(this)?.to_lowercase()))
}

fn to_upper_case(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_str(this)?.to_uppercase()))
}

fn trim(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_str(this)?.trim().to_string()))
}

fn trim_start(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_str(this)?.trim_start().to_string()))
}

fn trim_end(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_str(this)?.trim_end().to_string()))
}

fn replace(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let replacement = str_arg(args, 1);
    let Some(pattern) = args.first() else {
        return Ok(Value::Str(s));
    };
    if let Some(out) = with_regex(pattern, |data| {
        if data.flags.contains('g') {
            data.regex.replace_all(&s, replacement.as_str()).to_string()
        } else {
            data.regex.replace(&s, replacement.as_str()).to_string()
        }
    }) {
        return Ok(Value::from(out));
    }
    let needle = coerce::to_display(pattern);
    Ok(Value::from(s.replacen(&needle, &replacement, 1)))
}

fn replace_all(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let replacement = str_arg(args, 1);
    let Some(pattern) = args.first() else {
        return Ok(Value::Str(s));
    };
    if let Some(out) = with_regex(pattern, |data| {
        data.regex.replace_all(&s, replacement.as_str()).to_string()
    }) {
        return Ok(Value::from(out));
    }
    let needle = coerce::to_display(pattern);
    Ok(Value::from(s.replace(&needle, &replacement)))
}

/// With a global regex returns all full matches, otherwise the first
/// exec-style result. Null when nothing matches.
fn match_method(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let Some(pattern) = args.first() else {
        return Ok(Value::Null);
    };
    let result = with_regex(pattern, |data| {
        if data.flags.contains('g') {
            let all: Vec<Value> = data
                .regex
                .find_iter(&s)
                .map(|m| Value::from(m.as_str().to_string()))
                .collect();
            if all.is_empty() {
                Value::Null
            } else {
                Value::array(all)
            }
        } else {
            regex::exec_on(data, &s)
        }
    });
    match result {
        Some(value) => Ok(value),
        None => {
            // a plain string behaves like an escaped pattern
            let needle = coerce::to_display(pattern);
            match s.find(&needle) {
                Some(_) => Ok(Value::array(vec![Value::from(needle)])),
                None => Ok(Value::Null),
            }
        }
    }
}

fn search(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let s = this_str(this)?;
    let Some(pattern) = args.first() else {
        return Ok(Value::from(-1));
    };
    let found = with_regex(pattern, |data| {
        data.regex.find(&s).map(|m| char_index(&s, m.start()))
    })
    .unwrap_or_else(|| {
        let needle = coerce::to_display(pattern);
        s.find(&needle).map(|p| char_index(&s, p))
    });
    Ok(Value::from(found.unwrap_or(-1)))
}

fn value_of(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::Str(this_str(this)?))
}

fn from_char_code(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let mut out = String::new();
    for arg in args {
        let code = coerce::to_number(arg).to_i64();
        if let Some(c) = u32::try_from(code).ok().and_then(char::from_u32) {
            out.push(c);
        }
    }
    Ok(Value::from(out))
}

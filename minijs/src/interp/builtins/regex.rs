//! Regular expressions, compiled through the regex crate. Script
//! flags map onto inline flag groups, the `g` flag drives the
//! `lastIndex` protocol on test and exec.

use std::cell::Cell;

use crate::error::Error;
use crate::interp::{coerce, Context, Exotic, JsFunction, JsObject, RegexData, Value};
use crate::Result;

/// Compile a pattern with script-style flags. `i`, `m` and `s` become
/// inline flags, `g` only affects matching state, unknown flags fail.
pub fn compile(pattern: &str, flags: &str) -> Result<RegexData> {
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' => inline.push('i'),
            'm' => inline.push('m'),
            's' => inline.push('s'),
            'g' | 'u' | 'y' => {}
            other => {
                return Err(Error::eval(format!("invalid regex flag: {other}")));
            }
        }
    }
    let source = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{inline}){pattern}")
    };
    let regex = regex::Regex::new(&source)
        .map_err(|e| Error::eval(format!("invalid regex: /{pattern}/{flags} - {e}")))?;
    Ok(RegexData {
        source: pattern.to_string(),
        flags: flags.to_string(),
        regex,
        last_index: Cell::new(0),
    })
}

pub fn new_regex(data: RegexData) -> Value {
    Value::Object(JsObject::with_kind(Exotic::Regex(data)))
}

/// A literal like `/ab+c/gi` as it comes out of the lexer.
pub fn from_literal(text: &str) -> Result<Value> {
    let end = text
        .rfind('/')
        .ok_or_else(|| Error::eval(format!("invalid regex: {text}")))?;
    let pattern = &text[1..end];
    let flags = &text[end + 1..];
    Ok(new_regex(compile(pattern, flags)?))
}

pub fn constructor() -> Value {
    Value::Function(JsFunction::native("RegExp", construct))
}

fn construct(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let (pattern, flags) = match args.first() {
        None | Some(Value::Undefined) => ("(?:)".to_string(), String::new()),
        Some(Value::Object(o)) => match &o.kind {
            Exotic::Regex(data) => (data.source.clone(), data.flags.clone()),
            _ => (coerce::to_display(args.first().unwrap()), String::new()),
        },
        Some(value) => (coerce::to_display(value), String::new()),
    };
    let flags = match args.get(1) {
        None | Some(Value::Undefined) => flags,
        Some(value) => coerce::to_display(value),
    };
    Ok(new_regex(compile(&pattern, &flags)?))
}

pub fn prop(data: &RegexData, name: &str) -> Option<Value> {
    let value = match name {
        "source" => Value::str(&data.source),
        "flags" => Value::str(&data.flags),
        "global" => Value::Bool(data.flags.contains('g')),
        "ignoreCase" => Value::Bool(data.flags.contains('i')),
        "multiline" => Value::Bool(data.flags.contains('m')),
        "dotAll" => Value::Bool(data.flags.contains('s')),
        "lastIndex" => Value::from(data.last_index.get() as i32),
        "test" => Value::Function(JsFunction::native("test", test)),
        "exec" => Value::Function(JsFunction::native("exec", exec)),
        "toString" => Value::Function(JsFunction::native("toString", to_string)),
        _ => return None,
    };
    Some(value)
}

fn this_regex<T>(this: &Value, f: impl FnOnce(&RegexData) -> T) -> Result<T> {
    if let Value::Object(o) = this {
        if let Exotic::Regex(data) = &o.kind {
            return Ok(f(data));
        }
    }
    Err(Error::eval("not a regex"))
}

fn test(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let text = args.first().map(coerce::to_display).unwrap_or_default();
    this_regex(this, |data| Ok(Value::Bool(test_on(data, &text))))?
}

fn exec(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let text = args.first().map(coerce::to_display).unwrap_or_default();
    this_regex(this, |data| Ok(exec_on(data, &text)))?
}

fn to_string(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    this_regex(this, |data| {
        Ok(Value::from(format!("/{}/{}", data.source, data.flags)))
    })?
}

/// Match test honoring the global `lastIndex` cursor.
pub fn test_on(data: &RegexData, text: &str) -> bool {
    if !data.flags.contains('g') {
        return data.regex.is_match(text);
    }
    let start = data.last_index.get();
    if start > text.len() {
        data.last_index.set(0);
        return false;
    }
    match data.regex.find_at(text, start) {
        Some(m) => {
            data.last_index.set(m.end());
            true
        }
        None => {
            data.last_index.set(0);
            false
        }
    }
}

/// Exec result: an array-like object with numbered capture entries,
/// `length`, `index` and `input`, or null on a miss. A global regex
/// advances or resets `lastIndex`.
pub fn exec_on(data: &RegexData, text: &str) -> Value {
    let global = data.flags.contains('g');
    let start = if global { data.last_index.get() } else { 0 };
    if start > text.len() {
        data.last_index.set(0);
        return Value::Null;
    }
    let Some(caps) = data.regex.captures_at(text, start) else {
        if global {
            data.last_index.set(0);
        }
        return Value::Null;
    };
    let full = caps.get(0).expect("group 0 always participates");
    if global {
        data.last_index.set(full.end());
    }
    let result = JsObject::new();
    for (i, group) in caps.iter().enumerate() {
        let text = group.map(|m| m.as_str()).unwrap_or_default();
        result.put(i.to_string(), Value::from(text.to_string()));
    }
    result.put("length", Value::from(caps.len() as i32));
    result.put("index", Value::from(full.start() as i32));
    result.put("input", Value::from(text.to_string()));
    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_flags() {
        let data = compile("ab+", "gi").unwrap();
        assert!(data.regex.is_match("xABBy"));
        assert!(compile("a", "x").is_err());
        assert!(compile("(unclosed", "").is_err());
    }

    #[test]
    fn test_literal() {
        let value = from_literal("/a(b+)/i").unwrap();
        let Value::Object(o) = &value else {
            panic!("expected regex object");
        };
        let Exotic::Regex(data) = &o.kind else {
            panic!("expected regex kind");
        };
        assert_eq!(data.source, "a(b+)");
        assert_eq!(data.flags, "i");
    }

    #[test]
    fn test_global_last_index() {
        let data = compile("a", "g").unwrap();
        assert!(test_on(&data, "banana"));
        assert_eq!(data.last_index.get(), 2);
        assert!(test_on(&data, "banana"));
        assert!(test_on(&data, "banana"));
        // exhausted, resets
        assert!(!test_on(&data, "banana"));
        assert_eq!(data.last_index.get(), 0);
    }

    #[test]
    fn test_exec_captures() {
        let data = compile("a(b+)", "").unwrap();
        let result = exec_on(&data, "xabby");
        let Value::Object(o) = &result else {
            panic!("expected match object");
        };
        assert_eq!(o.get_own("0").and_then(|v| v.as_str().map(String::from)), Some("abb".into()));
        assert_eq!(o.get_own("1").and_then(|v| v.as_str().map(String::from)), Some("bb".into()));
        assert!(matches!(o.get_own("index"), Some(Value::Num(crate::interp::Num::I32(1)))));
        assert!(matches!(exec_on(&data, "zzz"), Value::Null));
    }
}

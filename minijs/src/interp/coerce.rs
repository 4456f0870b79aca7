//! Type coercion: numbers, truthiness, equality, operators and the
//! string conversions used by concatenation, logging and JSON.

use crate::interp::{builtins, Callable, Exotic, JsFunction, Num, Value};

/// Bring a whole-valued f64 back down to the narrowest integer
/// representation. Negative zero, NaN, infinities and fractions stay
/// f64.
pub fn narrow(d: f64) -> Num {
    if d == 0.0 && d.is_sign_negative() {
        return Num::F64(d);
    }
    if !d.is_finite() || d % 1.0 != 0.0 {
        return Num::F64(d);
    }
    if d >= i32::MIN as f64 && d <= i32::MAX as f64 {
        return Num::I32(d as i32);
    }
    if d >= i64::MIN as f64 && d <= i64::MAX as f64 {
        return Num::I64(d as i64);
    }
    Num::F64(d)
}

/// ToNumber for strings: trimmed, empty is zero, decimal or hex,
/// anything else NaN.
pub fn str_to_number(text: &str) -> Num {
    let text = text.trim();
    if text.is_empty() {
        return Num::I32(0);
    }
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if let Ok(n) = i64::from_str_radix(hex, 16) {
            return narrow(n as f64);
        }
        return Num::F64(f64::NAN);
    }
    match text.parse::<f64>() {
        Ok(d) => narrow(d),
        Err(_) => Num::F64(f64::NAN),
    }
}

pub fn to_number(value: &Value) -> Num {
    match value {
        Value::Null => Num::I32(0),
        Value::Bool(b) => Num::I32(*b as i32),
        Value::Num(n) => *n,
        Value::Str(s) => str_to_number(s),
        Value::Object(o) => match &o.kind {
            Exotic::Date(dt) => narrow(dt.borrow().timestamp_millis() as f64),
            _ => Num::F64(f64::NAN),
        },
        _ => Num::F64(f64::NAN),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Num(n) => {
            let d = n.as_f64();
            d != 0.0 && !d.is_nan()
        }
        Value::Str(s) => !s.is_empty(),
        _ => true,
    }
}

/// Loose and strict equality. Reference values compare by identity,
/// primitives by representation first and numerically after. Numbers
/// of different widths only meet in the numeric fallback, so under
/// loose rules 0 and -0 stay unequal while strict comparison accepts
/// them.
pub fn eq(lhs: &Value, rhs: &Value, strict: bool) -> bool {
    if matches!(lhs, Value::Null) {
        return matches!(rhs, Value::Null) || (!strict && rhs.is_undefined());
    }
    if lhs.is_undefined() {
        return rhs.is_undefined() || (!strict && matches!(rhs, Value::Null));
    }
    if lhs.ref_eq(rhs) {
        return true;
    }
    if !lhs.is_primitive() {
        return false;
    }
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => return a == b,
        (Value::Bool(a), Value::Bool(b)) if a == b => return true,
        (Value::Num(a), Value::Num(b)) if a.same(*b) => return true,
        _ => {}
    }
    if strict {
        if let (Value::Num(a), Value::Num(b)) = (lhs, rhs) {
            return a.as_f64() == b.as_f64();
        }
        return false;
    }
    if matches!(lhs, Value::Num(_)) || matches!(rhs, Value::Num(_)) {
        return to_number(lhs).same(to_number(rhs));
    }
    false
}

/// Relational operators coerce both sides to double, so strings
/// compare numerically and non-numeric strings sink to NaN, which
/// makes every comparison involving them false.
pub fn lt(lhs: &Value, rhs: &Value) -> bool {
    to_number(lhs).as_f64() < to_number(rhs).as_f64()
}

pub fn gt(lhs: &Value, rhs: &Value) -> bool {
    to_number(lhs).as_f64() > to_number(rhs).as_f64()
}

pub fn le(lhs: &Value, rhs: &Value) -> bool {
    to_number(lhs).as_f64() <= to_number(rhs).as_f64()
}

pub fn ge(lhs: &Value, rhs: &Value) -> bool {
    to_number(lhs).as_f64() >= to_number(rhs).as_f64()
}

//======================================================================
// arithmetic

/// `+` concatenates when either side is not a number.
pub fn add(lhs: &Value, rhs: &Value) -> Value {
    if let (Value::Num(a), Value::Num(b)) = (lhs, rhs) {
        return Value::Num(narrow(a.as_f64() + b.as_f64()));
    }
    Value::from(format!("{}{}", to_display(lhs), to_display(rhs)))
}

pub fn sub(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(narrow(to_number(lhs).as_f64() - to_number(rhs).as_f64()))
}

pub fn mul(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(narrow(to_number(lhs).as_f64() * to_number(rhs).as_f64()))
}

pub fn rem(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(narrow(to_number(lhs).as_f64() % to_number(rhs).as_f64()))
}

pub fn exp(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(narrow(to_number(lhs).as_f64().powf(to_number(rhs).as_f64())))
}

/// IEEE 754 division: 0/0 is NaN, x/0 gives a signed infinity and
/// x/Infinity a signed zero.
pub fn div(lhs: &Value, rhs: &Value) -> Value {
    let l = to_number(lhs).as_f64();
    let r = to_number(rhs).as_f64();
    if l.is_nan() || r.is_nan() {
        return Value::NAN;
    }
    if r == 0.0 {
        if l == 0.0 {
            return Value::NAN;
        }
        let negative = l.is_sign_negative() != r.is_sign_negative();
        return Value::Num(Num::F64(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }));
    }
    if r.is_infinite() {
        if l.is_infinite() {
            return Value::NAN;
        }
        let negative = l.is_sign_negative() != r.is_sign_negative();
        return Value::Num(narrow(if negative { -0.0 } else { 0.0 }));
    }
    Value::Num(narrow(l / r))
}

//======================================================================
// bitwise, operating on the 32-bit view

pub fn bit_and(lhs: &Value, rhs: &Value) -> Value {
    Value::from(to_number(lhs).to_i32() & to_number(rhs).to_i32())
}

pub fn bit_or(lhs: &Value, rhs: &Value) -> Value {
    Value::from(to_number(lhs).to_i32() | to_number(rhs).to_i32())
}

pub fn bit_xor(lhs: &Value, rhs: &Value) -> Value {
    Value::from(to_number(lhs).to_i32() ^ to_number(rhs).to_i32())
}

pub fn bit_not(value: &Value) -> Value {
    Value::from(!to_number(value).to_i32())
}

pub fn shl(lhs: &Value, rhs: &Value) -> Value {
    let shift = (to_number(rhs).to_i32() & 31) as u32;
    Value::from(to_number(lhs).to_i32().wrapping_shl(shift))
}

pub fn shr(lhs: &Value, rhs: &Value) -> Value {
    let shift = (to_number(rhs).to_i32() & 31) as u32;
    Value::from(to_number(lhs).to_i32().wrapping_shr(shift))
}

/// `>>>` widens the left side to an unsigned 64-bit lane and masks the
/// shift count to six bits, so counts of 32 and more keep draining
/// bits instead of wrapping.
pub fn shr_unsigned(lhs: &Value, rhs: &Value) -> Value {
    let l = to_number(lhs).to_i32() as u32 as u64;
    let shift = (to_number(rhs).to_i64() & 63) as u32;
    Value::Num(narrow((l >> shift) as f64))
}

//======================================================================
// type queries

pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Bool(_) => "boolean",
        Value::Num(_) => "number",
        Value::Str(_) => "string",
        Value::Function(_) => "function",
        _ => "object",
    }
}

/// `instanceof` walks the prototype chain of the left side looking for
/// a `constructor` entry that is the right side.
pub fn instance_of(lhs: &Value, rhs: &Value) -> bool {
    let Value::Object(obj) = lhs else {
        return false;
    };
    let mut proto = obj.proto.borrow().clone();
    while let Some(p) = proto {
        if let Some(ctor) = p.get_own("constructor") {
            let matched = match rhs {
                Value::Function(_) => ctor.ref_eq(rhs),
                Value::Object(o) => match o.get_own("constructor") {
                    Some(c) => ctor.ref_eq(&c),
                    None => false,
                },
                _ => false,
            };
            if matched {
                return true;
            }
        }
        proto = p.proto.borrow().clone();
    }
    false
}

//======================================================================
// string conversions

pub fn num_display(n: Num) -> String {
    match n {
        Num::I32(i) => i.to_string(),
        Num::I64(i) => i.to_string(),
        Num::F64(d) => {
            if d.is_nan() {
                "NaN".to_string()
            } else if d.is_infinite() {
                if d > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
            } else if d == 0.0 && d.is_sign_negative() {
                "-0".to_string()
            } else {
                format!("{d}")
            }
        }
    }
}

/// The conversion used by concatenation and template interpolation.
/// Arrays and objects render as JSON, dates and regexes by their own
/// notation.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Num(n) => num_display(*n),
        Value::Str(s) => s.to_string(),
        Value::Object(o) => match &o.kind {
            Exotic::Date(dt) => builtins::date::display(&dt.borrow()),
            Exotic::Regex(data) => format!("/{}/{}", data.source, data.flags),
            _ => serde_json::to_string(&to_json(value)).unwrap_or_default(),
        },
        Value::Array(_) => serde_json::to_string(&to_json(value)).unwrap_or_default(),
        Value::Function(f) => fn_display(f),
    }
}

/// Console rendering, which differs from display only for null.
pub fn to_log(value: &Value) -> String {
    match value {
        Value::Null => "[object Null]".to_string(),
        _ => to_display(value),
    }
}

pub fn fn_display(f: &JsFunction) -> String {
    let name = f.get_name().unwrap_or_default();
    match &f.callable {
        Callable::Script(s) => {
            let params: Vec<&str> = s
                .params
                .iter()
                .map(|p| p.as_ref().trim_start_matches('.'))
                .collect();
            if s.arrow {
                format!("({}) => {{}}", params.join(", "))
            } else {
                format!("function {name}({}) {{}}", params.join(", "))
            }
        }
        _ => format!("function {name}() {{}}"),
    }
}

/// Lossy JSON projection: undefined and functions turn to null inside
/// arrays and are skipped as object members, non-finite numbers go to
/// null, dates and regexes to strings.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Num(n) => match n {
            Num::I32(i) => serde_json::Value::from(*i),
            Num::I64(i) => serde_json::Value::from(*i),
            Num::F64(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        },
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => {
            serde_json::Value::Array(items.borrow().iter().map(to_json).collect())
        }
        Value::Object(o) => match &o.kind {
            Exotic::Date(dt) => serde_json::Value::String(builtins::date::display(&dt.borrow())),
            Exotic::Regex(data) => {
                serde_json::Value::String(format!("/{}/{}", data.source, data.flags))
            }
            _ => {
                let mut map = serde_json::Map::new();
                for (key, value) in o.props.borrow().entries() {
                    if matches!(value, Value::Function(_)) {
                        continue;
                    }
                    map.insert(key.to_string(), to_json(&value));
                }
                serde_json::Value::Object(map)
            }
        },
        Value::Function(_) => serde_json::Value::Null,
    }
}

//======================================================================
// string literal processing

/// Strip the quotes of a string literal and process escapes.
pub fn unquote(text: &str) -> String {
    if text.len() < 2 {
        return text.to_string();
    }
    unescape(&text[1..text.len() - 1])
}

pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' || i >= chars.len() {
            out.push(c);
            continue;
        }
        let next = chars[i];
        i += 1;
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'u' => {
                let (code, used) = parse_unicode_escape(&chars[i..]);
                match code {
                    Some(c) => {
                        out.push(c);
                        i += used;
                    }
                    None => out.push('u'),
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `\uXXXX` or `\u{...}`, returning the character and how many input
/// characters the escape body consumed.
fn parse_unicode_escape(chars: &[char]) -> (Option<char>, usize) {
    if chars.first() == Some(&'{') {
        let Some(end) = chars.iter().position(|c| *c == '}') else {
            return (None, 0);
        };
        let body: String = chars[1..end].iter().collect();
        let code = u32::from_str_radix(&body, 16).ok().and_then(char::from_u32);
        return match code {
            Some(c) => (Some(c), end + 1),
            None => (None, 0),
        };
    }
    if chars.len() < 4 {
        return (None, 0);
    }
    let body: String = chars[..4].iter().collect();
    match u32::from_str_radix(&body, 16).ok().and_then(char::from_u32) {
        Some(c) => (Some(c), 4),
        None => (None, 0),
    }
}

//! The Math namespace. Out-of-domain inputs yield NaN through the
//! underlying f64 operations.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::interp::{coerce, Context, JsFunction, Num, Value};
use crate::Result;

pub fn prop(name: &str) -> Option<Value> {
    let constant = match name {
        "E" => Some(std::f64::consts::E),
        "LN10" => Some(std::f64::consts::LN_10),
        "LN2" => Some(std::f64::consts::LN_2),
        "LOG2E" => Some(std::f64::consts::LOG2_E),
        "PI" => Some(std::f64::consts::PI),
        "SQRT1_2" => Some(std::f64::consts::FRAC_1_SQRT_2),
        "SQRT2" => Some(std::f64::consts::SQRT_2),
        _ => None,
    };
    if let Some(value) = constant {
        return Some(Value::Num(Num::F64(value)));
    }
    let f = match name {
        "abs" => JsFunction::native("abs", abs),
        "acos" => JsFunction::native("acos", acos),
        "acosh" => JsFunction::native("acosh", acosh),
        "asin" => JsFunction::native("asin", asin),
        "asinh" => JsFunction::native("asinh", asinh),
        "atan" => JsFunction::native("atan", atan),
        "atan2" => JsFunction::native("atan2", atan2),
        "atanh" => JsFunction::native("atanh", atanh),
        "cbrt" => JsFunction::native("cbrt", cbrt),
        "ceil" => JsFunction::native("ceil", ceil),
        "clz32" => JsFunction::native("clz32", clz32),
        "cos" => JsFunction::native("cos", cos),
        "cosh" => JsFunction::native("cosh", cosh),
        "exp" => JsFunction::native("exp", exp),
        "expm1" => JsFunction::native("expm1", expm1),
        "floor" => JsFunction::native("floor", floor),
        "fround" => JsFunction::native("fround", fround),
        "hypot" => JsFunction::native("hypot", hypot),
        "imul" => JsFunction::native("imul", imul),
        "log" => JsFunction::native("log", log),
        "log10" => JsFunction::native("log10", log10),
        "log1p" => JsFunction::native("log1p", log1p),
        "log2" => JsFunction::native("log2", log2),
        "max" => JsFunction::native("max", max),
        "min" => JsFunction::native("min", min),
        "pow" => JsFunction::native("pow", pow),
        "random" => JsFunction::native("random", random),
        "round" => JsFunction::native("round", round),
        "sign" => JsFunction::native("sign", sign),
        "sin" => JsFunction::native("sin", sin),
        "sinh" => JsFunction::native("sinh", sinh),
        "sqrt" => JsFunction::native("sqrt", sqrt),
        "tan" => JsFunction::native("tan", tan),
        "tanh" => JsFunction::native("tanh", tanh),
        "trunc" => JsFunction::native("trunc", trunc),
        _ => return None,
    };
    Some(Value::Function(f))
}

fn arg(args: &[Value], index: usize) -> f64 {
    args.get(index)
        .map(|v| coerce::to_number(v).as_f64())
        .unwrap_or(f64::NAN)
}

macro_rules! unary {
    ($name:ident, $op:expr) => {
        fn $name(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
            let f: fn(f64) -> f64 = $op;
            Ok(Value::Num(coerce::narrow(f(arg(args, 0)))))
        }
    };
}

unary!(abs, f64::abs);
unary!(acos, f64::acos);
unary!(acosh, f64::acosh);
unary!(asin, f64::asin);
unary!(asinh, f64::asinh);
unary!(atan, f64::atan);
unary!(atanh, f64::atanh);
unary!(cbrt, f64::cbrt);
unary!(ceil, f64::ceil);
unary!(cos, f64::cos);
unary!(cosh, f64::cosh);
unary!(exp, f64::exp);
unary!(expm1, f64::exp_m1);
unary!(floor, f64::floor);
unary!(fround, |d| d as f32 as f64);
unary!(log, f64::ln);
unary!(log10, f64::log10);
unary!(log1p, f64::ln_1p);
unary!(log2, f64::log2);
unary!(sin, f64::sin);
unary!(sinh, f64::sinh);
unary!(sqrt, f64::sqrt);
unary!(tan, f64::tan);
unary!(tanh, f64::tanh);
unary!(trunc, f64::trunc);

fn atan2(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::Num(coerce::narrow(arg(args, 0).atan2(arg(args, 1)))))
}

fn pow(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::Num(coerce::narrow(arg(args, 0).powf(arg(args, 1)))))
}

fn clz32(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let n = args
        .first()
        .map(|v| coerce::to_number(v).to_i32())
        .unwrap_or(0) as u32;
    Ok(Value::from(n.leading_zeros() as i32))
}

fn imul(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let a = args
        .first()
        .map(|v| coerce::to_number(v).to_i32())
        .unwrap_or(0);
    let b = args
        .get(1)
        .map(|v| coerce::to_number(v).to_i32())
        .unwrap_or(0);
    Ok(Value::from(a.wrapping_mul(b)))
}

fn hypot(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let sum: f64 = args
        .iter()
        .map(|v| {
            let d = coerce::to_number(v).as_f64();
            d * d
        })
        .sum();
    Ok(Value::Num(coerce::narrow(sum.sqrt())))
}

fn max(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let mut best = f64::NEG_INFINITY;
    for value in args {
        let d = coerce::to_number(value).as_f64();
        if d.is_nan() {
            return Ok(Value::NAN);
        }
        if d > best {
            best = d;
        }
    }
    Ok(Value::Num(coerce::narrow(best)))
}

fn min(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let mut best = f64::INFINITY;
    for value in args {
        let d = coerce::to_number(value).as_f64();
        if d.is_nan() {
            return Ok(Value::NAN);
        }
        if d < best {
            best = d;
        }
    }
    Ok(Value::Num(coerce::narrow(best)))
}

/// Rounds half toward positive infinity, so -0.5 rounds to -0.
fn round(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let d = arg(args, 0);
    if d.is_nan() || d.is_infinite() {
        return Ok(Value::Num(coerce::narrow(d)));
    }
    Ok(Value::Num(coerce::narrow((d + 0.5).floor())))
}

/// Signum that passes signed zeroes through unchanged.
fn sign(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let d = arg(args, 0);
    if d.is_nan() {
        return Ok(Value::NAN);
    }
    if d == 0.0 {
        return Ok(Value::Num(coerce::narrow(d)));
    }
    Ok(Value::from(if d > 0.0 { 1 } else { -1 }))
}

/// xorshift64 seeded from the clock on first use, scaled to [0, 1).
fn random(_this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    thread_local! {
        static SEED: Cell<u64> = const { Cell::new(0) };
    }
    let sample = SEED.with(|seed| {
        let mut x = seed.get();
        if x == 0 {
            x = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x9e3779b97f4a7c15)
                | 1;
        }
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        seed.set(x);
        (x >> 11) as f64 / (1u64 << 53) as f64
    });
    Ok(Value::Num(Num::F64(sample)))
}

//! Array members. Method objects are created on demand by the
//! property resolver, the backing storage is the shared vector.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::error::Error;
use crate::interp::builtins::key_values;
use crate::interp::{call_function, coerce, Context, JsFunction, Value};
use crate::Result;

type Items = Rc<RefCell<Vec<Value>>>;

pub fn get_prop(items: &Items, name: &str) -> Option<Value> {
    if name == "length" {
        return Some(Value::from(items.borrow().len() as i32));
    }
    let f = match name {
        "push" => JsFunction::native("push", push),
        "pop" => JsFunction::native("pop", pop),
        "shift" => JsFunction::native("shift", shift),
        "unshift" => JsFunction::native("unshift", unshift),
        "reverse" => JsFunction::native("reverse", reverse),
        "join" => JsFunction::native("join", join),
        "slice" => JsFunction::native("slice", slice),
        "splice" => JsFunction::native("splice", splice),
        "concat" => JsFunction::native("concat", concat),
        "fill" => JsFunction::native("fill", fill),
        "flat" => JsFunction::native("flat", flat),
        "flatMap" => JsFunction::native("flatMap", flat_map),
        "includes" => JsFunction::native("includes", includes),
        "indexOf" => JsFunction::native("indexOf", index_of),
        "lastIndexOf" => JsFunction::native("lastIndexOf", last_index_of),
        "at" => JsFunction::native("at", at),
        "with" => JsFunction::native("with", with),
        "copyWithin" => JsFunction::native("copyWithin", copy_within),
        "keys" => JsFunction::native("keys", keys),
        "values" => JsFunction::native("values", values),
        "entries" => JsFunction::native("entries", entries),
        "map" => JsFunction::native("map", map),
        "filter" => JsFunction::native("filter", filter),
        "forEach" => JsFunction::native("forEach", for_each),
        "find" => JsFunction::native("find", find),
        "findIndex" => JsFunction::native("findIndex", find_index),
        "findLast" => JsFunction::native("findLast", find_last),
        "findLastIndex" => JsFunction::native("findLastIndex", find_last_index),
        "every" => JsFunction::native("every", every),
        "some" => JsFunction::native("some", some),
        "reduce" => JsFunction::native("reduce", reduce),
        "reduceRight" => JsFunction::native("reduceRight", reduce_right),
        "sort" => JsFunction::native("sort", sort),
        _ => return None,
    };
    Some(Value::Function(f))
}

pub fn constructor() -> Value {
    let f = JsFunction::native("Array", construct);
    f.props
        .borrow_mut()
        .insert("from", Value::Function(JsFunction::native("from", from)));
    f.props
        .borrow_mut()
        .insert("of", Value::Function(JsFunction::native("of", of)));
    f.props.borrow_mut().insert(
        "isArray",
        Value::Function(JsFunction::native("isArray", is_array)),
    );
    Value::Function(f)
}

fn construct(_this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::array(Vec::new()))
}

//======================================================================
// helpers

fn this_array(this: &Value) -> Result<Items> {
    match this {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(Error::eval("not an array")),
    }
}

fn callback(args: &[Value], index: usize) -> Result<Rc<JsFunction>> {
    match args.get(index) {
        Some(Value::Function(f)) => Ok(f.clone()),
        _ => Err(Error::eval("not a function")),
    }
}

/// Relative index with negative-from-end handling, clamped to the
/// array bounds.
fn rel_index(arg: Option<&Value>, len: usize, default: usize) -> usize {
    match arg {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let mut i = coerce::to_number(value).to_i64();
            if i < 0 {
                i += len as i64;
            }
            i.clamp(0, len as i64) as usize
        }
    }
}

fn strict_position(items: &[Value], needle: &Value) -> Option<usize> {
    items.iter().position(|item| coerce::eq(item, needle, true))
}

//======================================================================
// plain methods

fn push(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    items.borrow_mut().extend(args.iter().cloned());
    Ok(Value::from(items.borrow().len() as i32))
}

fn pop(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let value = items.borrow_mut().pop();
    Ok(value.unwrap_or(Value::Undefined))
}

fn shift(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    if items.is_empty() {
        return Ok(Value::Undefined);
    }
    Ok(items.remove(0))
}

fn unshift(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    for (i, arg) in args.iter().enumerate() {
        items.insert(i, arg.clone());
    }
    Ok(Value::from(items.len() as i32))
}

fn reverse(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    items.borrow_mut().reverse();
    Ok(this.clone())
}

fn join(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let sep = match args.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(value) => coerce::to_display(value),
    };
    let parts: Vec<String> = items
        .borrow()
        .iter()
        .map(|item| match item {
            Value::Undefined | Value::Null => String::new(),
            other => coerce::to_display(other),
        })
        .collect();
    Ok(Value::from(parts.join(&sep)))
}

fn slice(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let items = items.borrow();
    let len = items.len();
    let start = rel_index(args.first(), len, 0);
    let end = rel_index(args.get(1), len, len);
    if start >= end {
        return Ok(Value::array(Vec::new()));
    }
    Ok(Value::array(items[start..end].to_vec()))
}

fn splice(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    let len = items.len();
    let start = rel_index(args.first(), len, 0);
    let delete_count = match args.get(1) {
        None | Some(Value::Undefined) => len - start,
        Some(value) => {
            let n = coerce::to_number(value).to_i64().max(0) as usize;
            n.min(len - start)
        }
    };
    let removed: Vec<Value> = items.splice(start..start + delete_count, args.iter().skip(2).cloned()).collect();
    Ok(Value::array(removed))
}

fn concat(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut out = items.borrow().clone();
    for arg in args {
        match arg {
            Value::Array(more) => out.extend(more.borrow().iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::array(out))
}

fn fill(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    let len = items.len();
    let value = args.first().cloned().unwrap_or(Value::Undefined);
    let start = rel_index(args.get(1), len, 0);
    let end = rel_index(args.get(2), len, len);
    for slot in items.iter_mut().take(end).skip(start) {
        *slot = value.clone();
    }
    drop(items);
    Ok(this.clone())
}

fn flatten(items: &[Value], depth: i64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => {
                flatten(&inner.borrow(), depth - 1, out);
            }
            other => out.push(other.clone()),
        }
    }
}

fn flat(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let depth = match args.first() {
        None | Some(Value::Undefined) => 1,
        Some(value) => coerce::to_number(value).to_i64(),
    };
    let mut out = Vec::new();
    flatten(&items.borrow(), depth, &mut out);
    Ok(Value::array(out))
}

fn flat_map(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let mapped = map(this, args, ctx)?;
    if ctx.is_error() {
        return Ok(Value::Undefined);
    }
    flat(&mapped, &[], ctx)
}

fn includes(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let needle = args.first().cloned().unwrap_or(Value::Undefined);
    let found = strict_position(&items.borrow(), &needle).is_some()
        || (needle.is_nan() && items.borrow().iter().any(Value::is_nan));
    Ok(Value::Bool(found))
}

fn index_of(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let needle = args.first().cloned().unwrap_or(Value::Undefined);
    let index = strict_position(&items.borrow(), &needle);
    Ok(Value::from(index.map(|i| i as i32).unwrap_or(-1)))
}

fn last_index_of(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let needle = args.first().cloned().unwrap_or(Value::Undefined);
    let items = items.borrow();
    let index = items
        .iter()
        .rposition(|item| coerce::eq(item, &needle, true));
    Ok(Value::from(index.map(|i| i as i32).unwrap_or(-1)))
}

fn at(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let items = items.borrow();
    let mut index = args
        .first()
        .map(|v| coerce::to_number(v).to_i64())
        .unwrap_or(0);
    if index < 0 {
        index += items.len() as i64;
    }
    if index < 0 {
        return Ok(Value::Undefined);
    }
    Ok(items
        .get(index as usize)
        .cloned()
        .unwrap_or(Value::Undefined))
}

fn with(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut out = items.borrow().clone();
    let mut index = args
        .first()
        .map(|v| coerce::to_number(v).to_i64())
        .unwrap_or(0);
    if index < 0 {
        index += out.len() as i64;
    }
    if index < 0 || index as usize >= out.len() {
        return Err(Error::eval(format!("invalid index: {index}")));
    }
    out[index as usize] = args.get(1).cloned().unwrap_or(Value::Undefined);
    Ok(Value::array(out))
}

fn copy_within(this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    let len = items.len();
    let target = rel_index(args.first(), len, 0);
    let start = rel_index(args.get(1), len, 0);
    let end = rel_index(args.get(2), len, len);
    let window: Vec<Value> = items[start.min(end)..end].to_vec();
    for (offset, value) in window.into_iter().enumerate() {
        let slot = target + offset;
        if slot >= len {
            break;
        }
        items[slot] = value;
    }
    drop(items);
    Ok(this.clone())
}

fn keys(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let len = items.borrow().len();
    Ok(Value::array((0..len as i32).map(Value::from).collect()))
}

fn values(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    Ok(Value::array(items.borrow().clone()))
}

fn entries(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    Ok(Value::array(
        items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, item)| Value::array(vec![Value::from(i as i32), item.clone()]))
            .collect(),
    ))
}

//======================================================================
// callback-driven methods

fn map(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let snapshot = items.borrow().clone();
    let mut out = Vec::with_capacity(snapshot.len());
    for (i, item) in snapshot.into_iter().enumerate() {
        let value = call_function(&f, this, &[item, Value::from(i as i32), this.clone()], ctx)?;
        if ctx.is_error() {
            return Ok(Value::Undefined);
        }
        out.push(value);
    }
    Ok(Value::array(out))
}

fn filter(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let snapshot = items.borrow().clone();
    let mut out = Vec::new();
    for (i, item) in snapshot.into_iter().enumerate() {
        let keep = call_function(
            &f,
            this,
            &[item.clone(), Value::from(i as i32), this.clone()],
            ctx,
        )?;
        if ctx.is_error() {
            return Ok(Value::Undefined);
        }
        if coerce::is_truthy(&keep) {
            out.push(item);
        }
    }
    Ok(Value::array(out))
}

fn for_each(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let snapshot = items.borrow().clone();
    for (i, item) in snapshot.into_iter().enumerate() {
        call_function(&f, this, &[item, Value::from(i as i32), this.clone()], ctx)?;
        if ctx.is_error() {
            return Ok(Value::Undefined);
        }
    }
    Ok(Value::Undefined)
}

/// Shared scan for the find family, returning the first matching
/// index scanning forward or backward.
fn scan(
    this: &Value,
    args: &[Value],
    ctx: &Context,
    backward: bool,
) -> Result<Option<(usize, Value)>> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let snapshot = items.borrow().clone();
    let indexes: Vec<usize> = if backward {
        (0..snapshot.len()).rev().collect()
    } else {
        (0..snapshot.len()).collect()
    };
    for i in indexes {
        let item = snapshot[i].clone();
        let matched = call_function(
            &f,
            this,
            &[item.clone(), Value::from(i as i32), this.clone()],
            ctx,
        )?;
        if ctx.is_error() {
            return Ok(None);
        }
        if coerce::is_truthy(&matched) {
            return Ok(Some((i, item)));
        }
    }
    Ok(None)
}

fn find(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    Ok(scan(this, args, ctx, false)?
        .map(|(_, item)| item)
        .unwrap_or(Value::Undefined))
}

fn find_index(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    Ok(Value::from(
        scan(this, args, ctx, false)?
            .map(|(i, _)| i as i32)
            .unwrap_or(-1),
    ))
}

fn find_last(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    Ok(scan(this, args, ctx, true)?
        .map(|(_, item)| item)
        .unwrap_or(Value::Undefined))
}

fn find_last_index(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    Ok(Value::from(
        scan(this, args, ctx, true)?
            .map(|(i, _)| i as i32)
            .unwrap_or(-1),
    ))
}

fn every(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let snapshot = items.borrow().clone();
    for (i, item) in snapshot.into_iter().enumerate() {
        let matched = call_function(&f, this, &[item, Value::from(i as i32), this.clone()], ctx)?;
        if ctx.is_error() {
            return Ok(Value::Undefined);
        }
        if !coerce::is_truthy(&matched) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn some(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let snapshot = items.borrow().clone();
    for (i, item) in snapshot.into_iter().enumerate() {
        let matched = call_function(&f, this, &[item, Value::from(i as i32), this.clone()], ctx)?;
        if ctx.is_error() {
            return Ok(Value::Undefined);
        }
        if coerce::is_truthy(&matched) {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn fold(this: &Value, args: &[Value], ctx: &Context, backward: bool) -> Result<Value> {
    let items = this_array(this)?;
    let f = callback(args, 0)?;
    let mut snapshot = items.borrow().clone();
    if backward {
        snapshot.reverse();
    }
    let mut iter = snapshot.into_iter();
    let mut acc = match args.get(1) {
        Some(initial) => initial.clone(),
        None => iter
            .next()
            .ok_or_else(|| Error::eval("reduce of empty array with no initial value"))?,
    };
    for item in iter {
        acc = call_function(&f, this, &[acc, item], ctx)?;
        if ctx.is_error() {
            return Ok(Value::Undefined);
        }
    }
    Ok(acc)
}

fn reduce(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    fold(this, args, ctx, false)
}

fn reduce_right(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    fold(this, args, ctx, true)
}

/// Without a comparator sorts by display text, with one by its
/// numeric result.
fn sort(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let items = this_array(this)?;
    let mut sorted = items.borrow().clone();
    if let Some(Value::Function(f)) = args.first() {
        let mut failed = None;
        sorted.sort_by(|a, b| {
            if failed.is_some() || ctx.is_error() {
                return Ordering::Equal;
            }
            match call_function(f, this, &[a.clone(), b.clone()], ctx) {
                Ok(value) => {
                    let d = coerce::to_number(&value).as_f64();
                    if d < 0.0 {
                        Ordering::Less
                    } else if d > 0.0 {
                        Ordering::Greater
                    } else {
                        Ordering::Equal
                    }
                }
                Err(e) => {
                    failed = Some(e);
                    Ordering::Equal
                }
            }
        });
        if let Some(e) = failed {
            return Err(e);
        }
    } else {
        sorted.sort_by(|a, b| coerce::to_display(a).cmp(&coerce::to_display(b)));
    }
    *items.borrow_mut() = sorted;
    Ok(this.clone())
}

//======================================================================
// statics

fn from(_this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let source = args.first().cloned().unwrap_or(Value::Undefined);
    let mut out: Vec<Value> = key_values(&source).into_iter().map(|(_, v)| v).collect();
    if let Some(Value::Function(f)) = args.get(1) {
        let mut mapped = Vec::with_capacity(out.len());
        for (i, item) in out.into_iter().enumerate() {
            let value = call_function(f, &Value::Undefined, &[item, Value::from(i as i32)], ctx)?;
            if ctx.is_error() {
                return Ok(Value::Undefined);
            }
            mapped.push(value);
        }
        out = mapped;
    }
    Ok(Value::array(out))
}

fn of(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::array(args.to_vec()))
}

fn is_array(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::Bool(matches!(args.first(), Some(Value::Array(_)))))
}

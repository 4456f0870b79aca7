//! Dates, stored as a chrono `DateTime<FixedOffset>` pinned to UTC.

use std::cell::RefCell;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::Error;
use crate::interp::{coerce, Context, Exotic, JsFunction, JsObject, Value};
use crate::Result;

pub fn constructor() -> Value {
    let f = JsFunction::native("Date", construct);
    f.props
        .borrow_mut()
        .insert("now", Value::Function(JsFunction::native("now", now)));
    f.props
        .borrow_mut()
        .insert("parse", Value::Function(JsFunction::native("parse", parse)));
    Value::Function(f)
}

fn new_date(dt: DateTime<FixedOffset>) -> Value {
    Value::Object(JsObject::with_kind(Exotic::Date(RefCell::new(dt))))
}

fn construct(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let dt = match args {
        [] => Utc::now().fixed_offset(),
        [Value::Str(s)] => parse_date(s)?,
        [Value::Object(o)] if matches!(o.kind, Exotic::Date(_)) => {
            let Exotic::Date(dt) = &o.kind else {
                unreachable!()
            };
            *dt.borrow()
        }
        [value] => from_millis(coerce::to_number(value).as_f64())?,
        parts => from_parts(parts)?,
    };
    Ok(new_date(dt))
}

fn now(_this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::Num(coerce::narrow(
        Utc::now().timestamp_millis() as f64
    )))
}

fn parse(_this: &Value, args: &[Value], _ctx: &Context) -> Result<Value> {
    let text = args.first().map(coerce::to_display).unwrap_or_default();
    match parse_date(&text) {
        Ok(dt) => Ok(Value::Num(coerce::narrow(dt.timestamp_millis() as f64))),
        Err(_) => Ok(Value::NAN),
    }
}

fn from_millis(millis: f64) -> Result<DateTime<FixedOffset>> {
    if millis.is_nan() || millis.is_infinite() {
        return Err(Error::eval("invalid date"));
    }
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| Error::eval("invalid date"))
}

/// Year, month index, day and optional time components, all UTC.
fn from_parts(parts: &[Value]) -> Result<DateTime<FixedOffset>> {
    let part = |i: usize, default: i32| {
        parts
            .get(i)
            .map(|v| coerce::to_number(v).to_i32())
            .unwrap_or(default)
    };
    let date = NaiveDate::from_ymd_opt(part(0, 1970), part(1, 0) as u32 + 1, part(2, 1) as u32)
        .ok_or_else(|| Error::eval("invalid date"))?;
    let time = date
        .and_hms_milli_opt(
            part(3, 0) as u32,
            part(4, 0) as u32,
            part(5, 0) as u32,
            part(6, 0) as u32,
        )
        .ok_or_else(|| Error::eval("invalid date"))?;
    Ok(time.and_utc().fixed_offset())
}

fn parse_date(text: &str) -> Result<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(Error::eval(format!("invalid date: {text}")))
}

pub fn prop(name: &str) -> Option<Value> {
    let f = match name {
        "getTime" => JsFunction::native("getTime", get_time),
        "valueOf" => JsFunction::native("valueOf", get_time),
        "toString" => JsFunction::native("toString", to_string),
        "toISOString" => JsFunction::native("toISOString", to_iso_string),
        "getFullYear" => JsFunction::native("getFullYear", get_full_year),
        "getMonth" => JsFunction::native("getMonth", get_month),
        "getDate" => JsFunction::native("getDate", get_date),
        "getDay" => JsFunction::native("getDay", get_day),
        "getHours" => JsFunction::native("getHours", get_hours),
        "getMinutes" => JsFunction::native("getMinutes", get_minutes),
        "getSeconds" => JsFunction::native("getSeconds", get_seconds),
        "getMilliseconds" => JsFunction::native("getMilliseconds", get_milliseconds),
        _ => return None,
    };
    Some(Value::Function(f))
}

fn this_date(this: &Value) -> Result<DateTime<FixedOffset>> {
    if let Value::Object(o) = this {
        if let Exotic::Date(dt) = &o.kind {
            return Ok(*dt.borrow());
        }
    }
    Err(Error::eval("not a date"))
}

pub fn display(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn get_time(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let dt = this_date(this)?;
    Ok(Value::Num(coerce::narrow(dt.timestamp_millis() as f64)))
}

fn to_string(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(display(&this_date(this)?)))
}

fn to_iso_string(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(display(&this_date(this)?)))
}

fn get_full_year(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_date(this)?.with_timezone(&Utc).year()))
}

fn get_month(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(
        this_date(this)?.with_timezone(&Utc).month0() as i32
    ))
}

fn get_date(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_date(this)?.with_timezone(&Utc).day() as i32))
}

fn get_day(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let weekday = this_date(this)?.with_timezone(&Utc).weekday();
    Ok(Value::from(weekday.num_days_from_sunday() as i32))
}

fn get_hours(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(this_date(this)?.with_timezone(&Utc).hour() as i32))
}

fn get_minutes(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(
        this_date(this)?.with_timezone(&Utc).minute() as i32
    ))
}

fn get_seconds(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    Ok(Value::from(
        this_date(this)?.with_timezone(&Utc).second() as i32
    ))
}

fn get_milliseconds(this: &Value, _args: &[Value], _ctx: &Context) -> Result<Value> {
    let millis = this_date(this)?.with_timezone(&Utc).timestamp_subsec_millis();
    Ok(Value::from(millis as i32))
}

use crate::core::data_type::ValueType;
use crate::core::value::Value;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as Json;
use thiserror::Error;

pub const PERIOD_UNITS: [&str; 5] = ["day", "week", "month", "quarter", "year"];

#[derive(Debug, Error)]
pub enum CastError {
    #[error("cannot cast `{value}` to {target}")]
    Invalid { target: ValueType, value: Json },
}

impl CastError {
    fn invalid(target: ValueType, value: &Json) -> Self {
        CastError::Invalid {
            target,
            value: value.clone(),
        }
    }
}

/// Maps a raw JSON argument from the filter payload to a typed [`Value`].
///
/// Pluggable so callers can override casting rules (custom date formats,
/// enum-backed columns and so on) without touching the planner.
pub trait ValueCaster: Send + Sync {
    fn cast(&self, ty: ValueType, raw: &Json) -> Result<Value, CastError>;
}

/// Default caster for the JSON wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCaster;

impl ValueCaster for JsonCaster {
    fn cast(&self, ty: ValueType, raw: &Json) -> Result<Value, CastError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match ty {
            ValueType::String => cast_string(raw),
            ValueType::Integer => cast_integer(raw),
            ValueType::Float => cast_float(raw),
            ValueType::Decimal => cast_decimal(raw),
            ValueType::Boolean => cast_boolean(raw),
            ValueType::Date => cast_date(raw),
            ValueType::Time => cast_time(raw),
            ValueType::List => cast_list(raw),
            ValueType::Period => cast_period(raw),
            ValueType::Reference => cast_reference(raw),
        }
    }
}

fn cast_string(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Number(n) => Ok(Value::String(n.to_string())),
        Json::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(CastError::invalid(ValueType::String, raw)),
    }
}

fn cast_integer(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| CastError::invalid(ValueType::Integer, raw)),
        Json::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CastError::invalid(ValueType::Integer, raw)),
        _ => Err(CastError::invalid(ValueType::Integer, raw)),
    }
}

fn cast_float(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::Number(n) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| CastError::invalid(ValueType::Float, raw)),
        Json::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CastError::invalid(ValueType::Float, raw)),
        _ => Err(CastError::invalid(ValueType::Float, raw)),
    }
}

fn cast_decimal(raw: &Json) -> Result<Value, CastError> {
    let text = match raw {
        Json::Number(n) => n.to_string(),
        Json::String(s) => s.trim().to_string(),
        _ => return Err(CastError::invalid(ValueType::Decimal, raw)),
    };
    text.parse::<BigDecimal>()
        .map(Value::Decimal)
        .map_err(|_| CastError::invalid(ValueType::Decimal, raw))
}

fn cast_boolean(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        // Form-encoded payloads send booleans as "0"/"1".
        Json::String(s) => match s.as_str() {
            "0" | "false" => Ok(Value::Boolean(false)),
            "1" | "true" => Ok(Value::Boolean(true)),
            _ => Err(CastError::invalid(ValueType::Boolean, raw)),
        },
        Json::Number(n) => match n.as_i64() {
            Some(0) => Ok(Value::Boolean(false)),
            Some(1) => Ok(Value::Boolean(true)),
            _ => Err(CastError::invalid(ValueType::Boolean, raw)),
        },
        _ => Err(CastError::invalid(ValueType::Boolean, raw)),
    }
}

fn cast_date(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| CastError::invalid(ValueType::Date, raw)),
        _ => Err(CastError::invalid(ValueType::Date, raw)),
    }
}

fn cast_time(raw: &Json) -> Result<Value, CastError> {
    let Json::String(s) = raw else {
        return Err(CastError::invalid(ValueType::Time, raw));
    };
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(Value::Timestamp(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Value::Timestamp(naive.and_utc()))
        .map_err(|_| CastError::invalid(ValueType::Time, raw))
}

fn cast_scalar(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else {
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| CastError::invalid(ValueType::List, raw))
            }
        }
        _ => Err(CastError::invalid(ValueType::List, raw)),
    }
}

fn cast_list(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::Array(items) => {
            let values = items.iter().map(cast_scalar).collect::<Result<_, _>>()?;
            Ok(Value::List(values))
        }
        // A bare scalar coerces to a one-element list.
        _ => Ok(Value::List(vec![cast_scalar(raw)?])),
    }
}

fn cast_period(raw: &Json) -> Result<Value, CastError> {
    match raw {
        Json::String(s) if PERIOD_UNITS.contains(&s.as_str()) => Ok(Value::String(s.clone())),
        _ => Err(CastError::invalid(ValueType::Period, raw)),
    }
}

fn cast_reference(raw: &Json) -> Result<Value, CastError> {
    // A primary key; passed through without loading the referenced row.
    match raw {
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| CastError::invalid(ValueType::Reference, raw)),
        Json::String(s) => Ok(Value::String(s.clone())),
        _ => Err(CastError::invalid(ValueType::Reference, raw)),
    }
}

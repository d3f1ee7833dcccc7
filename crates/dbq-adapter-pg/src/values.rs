//! PostgreSQL values to JSON.
//!
//! Result rows are fetched over the simple query protocol, so every value
//! arrives in the server's own text form and is normalized from there.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use sqlx::postgres::{PgRow, PgValueFormat};
use sqlx::{Row, TypeInfo, ValueRef};

/// Decode column `index` of `row`.
///
/// Values outside the text format, which the simple query protocol never
/// produces, become `null` rather than being misread.
pub fn decode_value(row: &PgRow, index: usize) -> Value {
    let Ok(raw) = row.try_get_raw(index) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    if raw.format() != PgValueFormat::Text {
        tracing::debug!(index, "Unexpected binary value, returning null");
        return Value::Null;
    }

    let type_name = raw.type_info().name().to_ascii_uppercase();
    match raw.as_str() {
        Ok(text) => text_to_json(&type_name, text),
        Err(e) => {
            tracing::debug!(index, type_name = %type_name, error = %e, "Undecodable value");
            Value::Null
        }
    }
}

/// Normalize one non-null value given its type name and text form.
///
/// Numerics stay strings so no precision is lost. Timestamps become
/// ISO-8601. Types without a dedicated mapping keep their text form.
pub fn text_to_json(type_name: &str, text: &str) -> Value {
    match type_name {
        "BOOL" => match text {
            "t" => Value::Bool(true),
            "f" => Value::Bool(false),
            other => Value::String(other.to_string()),
        },
        "INT2" | "INT4" | "INT8" | "OID" => text
            .parse::<i64>()
            .map_or_else(|_| Value::String(text.to_string()), Value::from),
        "FLOAT4" | "FLOAT8" => float(text),
        "JSON" | "JSONB" => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
        "TIMESTAMPTZ" => timestamptz(text),
        "TIMESTAMP" => timestamp(text),
        // NUMERIC, TEXT, UUID, DATE, TIME, BYTEA (already `\x` hex), arrays,
        // intervals, network types and everything else.
        _ => Value::String(text.to_string()),
    }
}

/// Finite floats become JSON numbers; `NaN` and the infinities keep their
/// PostgreSQL spelling.
fn float(text: &str) -> Value {
    match text {
        "NaN" | "Infinity" | "-Infinity" => Value::String(text.to_string()),
        _ => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(text.to_string()), Value::Number),
    }
}

fn timestamptz(text: &str) -> Value {
    DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
        .map(|t| {
            t.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::AutoSi, false)
        })
        .map_or_else(|_| Value::String(text.to_string()), Value::String)
}

fn timestamp(text: &str) -> Value {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        .map_or_else(|_| Value::String(text.to_string()), Value::String)
}

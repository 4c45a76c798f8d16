use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use core_types::ScalarValue;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgRow, PgTypeKind};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

/// Column names of a row, in the order the engine reported them.
pub fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

pub fn decode_row(row: &PgRow) -> Vec<ScalarValue> {
    (0..row.len()).map(|index| decode_cell(row, index)).collect()
}

/// How a cell is read, chosen from the type the engine reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellDecoder {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
    Uuid,
    Json,
    TextArray,
    Text,
    Unsupported,
}

impl CellDecoder {
    /// Domains decode as their base type and enums as their label. Any type
    /// not listed here (`tsvector`, `bytea`, geometric types, ...) is
    /// unsupported; its binary form is never read as text.
    pub(crate) fn for_type(name: &str, kind: &PgTypeKind) -> Self {
        match kind {
            PgTypeKind::Domain(base) => {
                return match base.name() {
                    "?" => CellDecoder::Unsupported,
                    base_name => CellDecoder::for_type(base_name, base.kind()),
                };
            }
            PgTypeKind::Enum(_) => return CellDecoder::Text,
            _ => {}
        }

        match name {
            "BOOL" => CellDecoder::Bool,
            "INT2" => CellDecoder::Int2,
            "INT4" => CellDecoder::Int4,
            "INT8" => CellDecoder::Int8,
            "FLOAT4" => CellDecoder::Float4,
            "FLOAT8" => CellDecoder::Float8,
            "NUMERIC" => CellDecoder::Numeric,
            "DATE" => CellDecoder::Date,
            "TIME" => CellDecoder::Time,
            "TIMESTAMP" => CellDecoder::Timestamp,
            "TIMESTAMPTZ" => CellDecoder::TimestampTz,
            "INTERVAL" => CellDecoder::Interval,
            "UUID" => CellDecoder::Uuid,
            "JSON" | "JSONB" => CellDecoder::Json,
            "TEXT[]" | "VARCHAR[]" | "CHAR[]" | "NAME[]" => CellDecoder::TextArray,
            "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "UNKNOWN" | "citext" => CellDecoder::Text,
            _ => CellDecoder::Unsupported,
        }
    }
}

/// Decodes one cell by the type the engine reported for it.
///
/// A cell that cannot be read becomes `Null` and is logged; one odd column
/// never fails the whole statement. The type is matched by name, so values
/// are read unchecked (a domain reports its own name, not its base type's).
pub fn decode_cell(row: &PgRow, index: usize) -> ScalarValue {
    let (type_name, decoder) = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return ScalarValue::Null,
        Ok(raw) => {
            let info = raw.type_info();
            let name = info.name().to_string();
            // "?" is a type the driver could not resolve; its kind is unknown.
            let decoder = if name == "?" {
                CellDecoder::Unsupported
            } else {
                CellDecoder::for_type(&name, info.kind())
            };
            (name, decoder)
        }
        Err(e) => {
            tracing::warn!(column = index, error = %e, "Could not read result cell.");
            return ScalarValue::Null;
        }
    };

    let decoded = match decoder {
        CellDecoder::Bool => row.try_get_unchecked::<bool, _>(index).map(ScalarValue::Bool),
        CellDecoder::Int2 => row
            .try_get_unchecked::<i16, _>(index)
            .map(|v| ScalarValue::Int(v.into())),
        CellDecoder::Int4 => row
            .try_get_unchecked::<i32, _>(index)
            .map(|v| ScalarValue::Int(v.into())),
        CellDecoder::Int8 => row.try_get_unchecked::<i64, _>(index).map(ScalarValue::Int),
        CellDecoder::Float4 => row
            .try_get_unchecked::<f32, _>(index)
            .map(|v| ScalarValue::Float(v.into())),
        CellDecoder::Float8 => row.try_get_unchecked::<f64, _>(index).map(ScalarValue::Float),
        CellDecoder::Numeric => row
            .try_get_unchecked::<Decimal, _>(index)
            .map(ScalarValue::Decimal),
        CellDecoder::Date => row
            .try_get_unchecked::<NaiveDate, _>(index)
            .map(|d| ScalarValue::Text(d.format("%Y-%m-%d").to_string())),
        CellDecoder::Time => row
            .try_get_unchecked::<NaiveTime, _>(index)
            .map(|t| ScalarValue::Text(t.format("%H:%M:%S%.f").to_string())),
        CellDecoder::Timestamp => row
            .try_get_unchecked::<NaiveDateTime, _>(index)
            .map(|ts| ScalarValue::Text(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        CellDecoder::TimestampTz => row
            .try_get_unchecked::<DateTime<Utc>, _>(index)
            .map(|ts| ScalarValue::Text(ts.to_rfc3339())),
        CellDecoder::Interval => row
            .try_get_unchecked::<PgInterval, _>(index)
            .map(|iv| ScalarValue::Text(iso_duration(&iv))),
        CellDecoder::Uuid => row
            .try_get_unchecked::<Uuid, _>(index)
            .map(|u| ScalarValue::Text(u.to_string())),
        CellDecoder::Json => row
            .try_get_unchecked::<JsonValue, _>(index)
            .map(|v| ScalarValue::Text(v.to_string())),
        CellDecoder::TextArray => row
            .try_get_unchecked::<Vec<String>, _>(index)
            .map(|items| ScalarValue::Text(array_literal(&items))),
        CellDecoder::Text => row.try_get_unchecked::<String, _>(index).map(ScalarValue::Text),
        CellDecoder::Unsupported => {
            tracing::warn!(
                column = index,
                pg_type = %type_name,
                "Unsupported result type; returning null."
            );
            return ScalarValue::Null;
        }
    };

    decoded.unwrap_or_else(|e| {
        tracing::warn!(
            column = index,
            pg_type = %type_name,
            error = %e,
            "Undecodable result cell; returning null."
        );
        ScalarValue::Null
    })
}

/// Renders an interval as an ISO-8601 duration, e.g. `P1Y2M3DT4H5M6.5S`.
/// Zero parts are left out; a zero interval is `PT0S`.
pub(crate) fn iso_duration(interval: &PgInterval) -> String {
    let years = interval.months / 12;
    let months = interval.months % 12;
    let hours = interval.microseconds / 3_600_000_000;
    let minutes = (interval.microseconds % 3_600_000_000) / 60_000_000;
    let micros = interval.microseconds % 60_000_000;

    let mut out = String::from("P");
    for (value, unit) in [(years, 'Y'), (months, 'M'), (interval.days, 'D')] {
        if value != 0 {
            out.push_str(&format!("{value}{unit}"));
        }
    }

    if hours != 0 || minutes != 0 || micros != 0 {
        out.push('T');
        if hours != 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes != 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if micros != 0 {
            out.push_str(&seconds(micros));
            out.push('S');
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    out
}

fn seconds(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let whole = (micros / 1_000_000).abs();
    let fraction = (micros % 1_000_000).abs();
    if fraction == 0 {
        format!("{sign}{whole}")
    } else {
        let digits = format!("{fraction:06}");
        format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

/// Renders a text array the way PostgreSQL prints it, e.g.
/// `{Trailers,"Deleted Scenes"}`.
pub(crate) fn array_literal(items: &[String]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| {
            let needs_quotes = item.is_empty()
                || item.eq_ignore_ascii_case("null")
                || item
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, ',' | '{' | '}' | '"' | '\\'));
            if needs_quotes {
                format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                item.clone()
            }
        })
        .collect();
    format!("{{{}}}", rendered.join(","))
}

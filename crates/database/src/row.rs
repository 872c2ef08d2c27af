//! Generic decoding of `SELECT *` rows into JSON objects.
//!
//! The handlers return whatever columns the store defines, so rows are not
//! mapped onto structs: each column is decoded according to its MySQL type and
//! inserted under its own name, in column order.

use crate::error::DbError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// A row as returned to API callers.
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    Text,
    Date,
    DateTime,
    Timestamp,
    Time,
    Json,
    Binary,
    Null,
}

/// Classifies a column by the type name the driver reports (e.g. `INT UNSIGNED`).
pub(crate) fn column_kind(type_name: &str) -> ColumnKind {
    let upper = type_name.to_ascii_uppercase();
    let (base, unsigned) = match upper.strip_suffix(" UNSIGNED") {
        Some(base) => (base, true),
        None => (upper.as_str(), false),
    };

    match base {
        "BOOLEAN" => ColumnKind::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" if unsigned => ColumnKind::Unsigned,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ColumnKind::Signed,
        "YEAR" => ColumnKind::Unsigned,
        "FLOAT" => ColumnKind::Float,
        "DOUBLE" => ColumnKind::Double,
        "DECIMAL" => ColumnKind::Decimal,
        "DATE" => ColumnKind::Date,
        "DATETIME" => ColumnKind::DateTime,
        "TIMESTAMP" => ColumnKind::Timestamp,
        "TIME" => ColumnKind::Time,
        "JSON" => ColumnKind::Json,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => ColumnKind::Binary,
        "NULL" => ColumnKind::Null,
        _ => ColumnKind::Text,
    }
}

pub fn row_to_record(row: &MySqlRow) -> Result<Record, DbError> {
    let mut record = Record::with_capacity(row.len());
    for column in row.columns() {
        let index = column.ordinal();
        let kind = column_kind(column.type_info().name());
        let value = decode_column(row, index, kind)
            .or_else(|_| decode_fallback(row, index))
            .map_err(|e| DbError::Decode {
                column: column.name().to_string(),
                reason: e.to_string(),
            })?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_column(row: &MySqlRow, index: usize, kind: ColumnKind) -> Result<Value, sqlx::Error> {
    if kind == ColumnKind::Null || row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match kind {
        ColumnKind::Bool => Value::Bool(row.try_get::<bool, _>(index)?),
        ColumnKind::Signed => Value::from(row.try_get::<i64, _>(index)?),
        ColumnKind::Unsigned => Value::from(row.try_get::<u64, _>(index)?),
        ColumnKind::Float => float_value(f64::from(row.try_get::<f32, _>(index)?)),
        ColumnKind::Double => float_value(row.try_get::<f64, _>(index)?),
        ColumnKind::Decimal => Value::String(row.try_get::<Decimal, _>(index)?.to_string()),
        ColumnKind::Text => Value::String(row.try_get::<String, _>(index)?),
        ColumnKind::Date => Value::String(format_date(row.try_get::<NaiveDate, _>(index)?)),
        ColumnKind::DateTime => {
            Value::String(format_datetime(row.try_get::<NaiveDateTime, _>(index)?.and_utc()))
        }
        ColumnKind::Timestamp => {
            Value::String(format_datetime(row.try_get::<DateTime<Utc>, _>(index)?))
        }
        ColumnKind::Time => Value::String(format_time(row.try_get::<NaiveTime, _>(index)?)),
        ColumnKind::Json => row.try_get::<Value, _>(index)?,
        ColumnKind::Binary => bytes_value(row.try_get::<Vec<u8>, _>(index)?),
        ColumnKind::Null => Value::Null,
    };
    Ok(value)
}

// Types the driver refuses to decode strictly are read as text, then as raw bytes.
fn decode_fallback(row: &MySqlRow, index: usize) -> Result<Value, sqlx::Error> {
    if let Ok(text) = row.try_get_unchecked::<String, _>(index) {
        return Ok(Value::String(text));
    }
    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
    Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn bytes_value(bytes: Vec<u8>) -> Value {
    Value::Array(bytes.into_iter().map(Value::from).collect())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_datetime(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

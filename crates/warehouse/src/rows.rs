//! `BigQuery` result rows to JSON objects
//!
//! Query results arrive as positional cells (`{"f": [{"v": ...}]}`) with every
//! scalar encoded as a string. The schema tells us the names and types.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, WarehouseError};

/// One decoded row keyed by column name
pub type Record = Map<String, Value>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

impl TableFieldSchema {
    fn is_repeated(&self) -> bool {
        self.mode.as_deref().is_some_and(|mode| mode.eq_ignore_ascii_case("REPEATED"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableCell {
    #[serde(default)]
    pub v: Value,
}

/// Decode result rows against their schema
pub(crate) fn decode_rows(schema: &TableSchema, rows: Vec<TableRow>) -> Result<Vec<Record>> {
    rows.into_iter()
        .map(|row| decode_record(&schema.fields, row.f))
        .collect()
}

fn decode_record(fields: &[TableFieldSchema], cells: Vec<TableCell>) -> Result<Record> {
    if cells.len() != fields.len() {
        return Err(WarehouseError::Decode(format!(
            "row has {} cells but the schema has {} fields",
            cells.len(),
            fields.len()
        )));
    }

    fields
        .iter()
        .zip(cells)
        .map(|(field, cell)| Ok((field.name.clone(), decode_field(field, cell.v)?)))
        .collect()
}

fn decode_field(field: &TableFieldSchema, value: Value) -> Result<Value> {
    if !field.is_repeated() {
        return decode_value(field, value);
    }

    match value {
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                let inner = match item {
                    Value::Object(mut cell) => cell.remove("v").unwrap_or(Value::Null),
                    other => other,
                };
                decode_value(field, inner)
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Err(type_mismatch(field, &other)),
    }
}

fn decode_value(field: &TableFieldSchema, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match field.field_type.to_ascii_uppercase().as_str() {
        "RECORD" | "STRUCT" => {
            let cells = match value {
                Value::Object(mut object) => object.remove("f").unwrap_or(Value::Null),
                other => return Err(type_mismatch(field, &other)),
            };
            let cells: Vec<TableCell> =
                serde_json::from_value(cells).map_err(|e| WarehouseError::Decode(format!("{}: {e}", field.name)))?;
            decode_record(&field.fields, cells).map(Value::Object)
        }
        "INTEGER" | "INT64" => {
            let text = scalar_text(field, &value)?;
            text.parse::<i64>()
                .map(Value::from)
                .map_err(|_| type_mismatch(field, &value))
        }
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => {
            let number = scalar_text(field, &value)?
                .parse::<f64>()
                .map_err(|_| type_mismatch(field, &value))?;

            // "NaN" and "Infinity" have no JSON number form
            Ok(serde_json::Number::from_f64(number).map_or(Value::Null, Value::Number))
        }
        "BOOLEAN" | "BOOL" => match scalar_text(field, &value)? {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(type_mismatch(field, &value)),
        },
        "TIMESTAMP" => {
            let text = scalar_text(field, &value)?;
            parse_timestamp(text)
                .map(|ts| Value::String(ts.to_string()))
                .ok_or_else(|| type_mismatch(field, &value))
        }
        _ => match value {
            Value::String(_) => Ok(value),
            other => Ok(Value::String(other.to_string())),
        },
    }
}

fn scalar_text<'a>(field: &TableFieldSchema, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| type_mismatch(field, value))
}

/// Timestamps come back as int64 microseconds, or as float seconds when the
/// int64 format option is not honoured
fn parse_timestamp(text: &str) -> Option<jiff::Timestamp> {
    if let Ok(micros) = text.parse::<i64>() {
        return jiff::Timestamp::from_microsecond(micros).ok();
    }

    let seconds = text.parse::<f64>().ok().filter(|s| s.is_finite())?;
    #[allow(clippy::cast_possible_truncation)]
    let micros = (seconds * 1_000_000.0).round() as i64;
    jiff::Timestamp::from_microsecond(micros).ok()
}

fn type_mismatch(field: &TableFieldSchema, value: &Value) -> WarehouseError {
    WarehouseError::Decode(format!(
        "column `{}` of type {} has unexpected value {value}",
        field.name, field.field_type
    ))
}

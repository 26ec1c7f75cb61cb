//! Stateless helpers shared by the loader, merger and codec.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::conf::{
    C_DATE_TRANSFER_FORMAT, TUP_DATE_FORMATS, TUP_DATETIME_FORMATS, TUP_NULL_TOKENS,
};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueInference

/// Infer a typed cell value from raw text.
///
/// Order: null token, boolean, integer, finite decimal, date, text.
pub fn infer_cell_value(text: &str) -> EnumCellValue {
    let c_trimmed = text.trim();
    if c_trimmed.is_empty() || TUP_NULL_TOKENS.contains(&c_trimmed) {
        return EnumCellValue::None;
    }
    if c_trimmed.eq_ignore_ascii_case("true") {
        return EnumCellValue::Boolean(true);
    }
    if c_trimmed.eq_ignore_ascii_case("false") {
        return EnumCellValue::Boolean(false);
    }
    if let Ok(val) = c_trimmed.parse::<i64>() {
        return EnumCellValue::Integer(val);
    }
    if let Ok(val) = c_trimmed.parse::<f64>()
        && val.is_finite()
    {
        return EnumCellValue::Number(val);
    }
    if let Some(val) = parse_date(c_trimmed) {
        return EnumCellValue::Date(val);
    }
    EnumCellValue::String(text.to_string())
}

/// Parse a date or timestamp, dropping any time part.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    for c_fmt in TUP_DATE_FORMATS {
        if let Ok(val) = NaiveDate::parse_from_str(text, c_fmt) {
            return Some(val);
        }
    }
    if let Ok(val) = DateTime::parse_from_rfc3339(text) {
        return Some(val.date_naive());
    }
    for c_fmt in TUP_DATETIME_FORMATS {
        if let Ok(val) = NaiveDateTime::parse_from_str(text, c_fmt) {
            return Some(val.date());
        }
    }
    None
}

/// Map one JSON value onto a cell value.
pub fn convert_json_value(value: &Value) -> EnumCellValue {
    match value {
        Value::Null => EnumCellValue::None,
        Value::Bool(val) => EnumCellValue::Boolean(*val),
        Value::Number(val) => {
            if let Some(n) = val.as_i64() {
                EnumCellValue::Integer(n)
            } else {
                match val.as_f64() {
                    Some(n) if n.is_finite() => EnumCellValue::Number(n),
                    _ => EnumCellValue::None,
                }
            }
        }
        Value::String(val) => convert_json_text(val),
        Value::Array(_) | Value::Object(_) => EnumCellValue::String(value.to_string()),
    }
}

/// Map a JSON string onto a cell value.
///
/// Null tokens become `None` and date-shaped text becomes a date; any other
/// text stays verbatim, so `"0815"` or `"001100"` are never read as numbers.
pub fn convert_json_text(text: &str) -> EnumCellValue {
    let c_trimmed = text.trim();
    if c_trimmed.is_empty() || TUP_NULL_TOKENS.contains(&c_trimmed) {
        return EnumCellValue::None;
    }
    match parse_date(c_trimmed) {
        Some(val) => EnumCellValue::Date(val),
        None => EnumCellValue::String(text.to_string()),
    }
}

/// Map one cell value onto JSON. Dates become `YYYY-MM-DD` strings.
pub fn convert_cell_value_to_json(value: &EnumCellValue) -> Value {
    match value {
        EnumCellValue::None => Value::Null,
        EnumCellValue::Boolean(val) => Value::Bool(*val),
        EnumCellValue::Integer(val) => Value::from(*val),
        EnumCellValue::Number(val) => serde_json::Number::from_f64(*val)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        EnumCellValue::Date(val) => Value::String(val.format(C_DATE_TRANSFER_FORMAT).to_string()),
        EnumCellValue::String(val) => Value::String(val.clone()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Validate that `columns` has no empty or duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if let Some(n_idx) = columns.iter().position(|c_name| c_name.trim().is_empty()) {
        return Err(format!("Empty column name at index {n_idx}"));
    }
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

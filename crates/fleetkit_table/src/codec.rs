//! Row-indexed JSON transfer encoding.
//!
//! Envelope: `{"columns": [..], "data": {"0": {col: value, ..}, "1": {..}}}`.
//! The explicit column list keeps column order and survives empty tables.
//! Strings decode verbatim except date-shaped ones, which is how dates travel.

use serde_json::{Map, Value, json};

use crate::spec::{EnumCellValue, SpecTable, TableError};
use crate::util::{convert_cell_value_to_json, convert_json_value};

/// Encode a table into its transfer text.
pub fn encode_transfer_table(table: &SpecTable) -> String {
    let mut dict_data = Map::new();
    for (n_idx_row, row) in table.rows().iter().enumerate() {
        let dict_row: Map<String, Value> = table
            .columns()
            .iter()
            .zip(row)
            .map(|(c_name, value)| (c_name.clone(), convert_cell_value_to_json(value)))
            .collect();
        dict_data.insert(n_idx_row.to_string(), Value::Object(dict_row));
    }

    json!({
        "columns": table.columns(),
        "data": dict_data,
    })
    .to_string()
}

/// Decode transfer text back into a table, ordering rows by numeric index.
pub fn decode_transfer_table(text: &str) -> Result<SpecTable, TableError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| TableError::Transfer(format!("invalid JSON: {err}")))?;

    let l_colnames = value
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| TableError::Transfer("missing \"columns\" array".to_string()))?
        .iter()
        .map(|col| {
            col.as_str()
                .map(ToString::to_string)
                .ok_or_else(|| TableError::Transfer(format!("non-string column name: {col}")))
        })
        .collect::<Result<Vec<String>, _>>()?;

    let dict_data = value
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| TableError::Transfer("missing \"data\" object".to_string()))?;

    let mut l_rows_indexed = Vec::with_capacity(dict_data.len());
    for (c_key, row_value) in dict_data {
        let n_idx_row = c_key
            .parse::<usize>()
            .map_err(|_| TableError::Transfer(format!("row index is not numeric: {c_key:?}")))?;
        let dict_row = row_value
            .as_object()
            .ok_or_else(|| TableError::Transfer(format!("row {c_key} is not an object")))?;
        if let Some(c_unknown) = dict_row.keys().find(|key| !l_colnames.contains(*key)) {
            return Err(TableError::Transfer(format!(
                "row {c_key} carries unknown column {c_unknown:?}"
            )));
        }

        let row: Vec<EnumCellValue> = l_colnames
            .iter()
            .map(|c_name| {
                dict_row
                    .get(c_name)
                    .map(convert_json_value)
                    .unwrap_or(EnumCellValue::None)
            })
            .collect();
        l_rows_indexed.push((n_idx_row, row));
    }
    l_rows_indexed.sort_by_key(|(n_idx_row, _)| *n_idx_row);

    SpecTable::from_rows(
        l_colnames,
        l_rows_indexed.into_iter().map(|(_, row)| row).collect(),
    )
    .map_err(|err| TableError::Transfer(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn transfer_roundtrip_keeps_order_and_types() {
        let l_rows: Vec<Vec<EnumCellValue>> = (0..12)
            .map(|n| {
                vec![
                    EnumCellValue::Integer(n),
                    EnumCellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")),
                    EnumCellValue::None,
                ]
            })
            .collect();
        let table = SpecTable::from_rows(
            vec!["rnr".to_string(), "hu".to_string(), "colorCode".to_string()],
            l_rows,
        )
        .expect("table");

        let decoded = decode_transfer_table(&encode_transfer_table(&table)).expect("decode");
        assert_eq!(decoded, table);
    }

    #[test]
    fn transfer_roundtrip_keeps_numeric_looking_text() {
        let table = SpecTable::from_rows(
            vec!["rnr".to_string(), "colorCode".to_string(), "fuhrparkNr".to_string()],
            vec![vec![
                EnumCellValue::Integer(1),
                EnumCellValue::String("001100".to_string()),
                EnumCellValue::String("0815".to_string()),
            ]],
        )
        .expect("table");

        let decoded = decode_transfer_table(&encode_transfer_table(&table)).expect("decode");
        assert_eq!(decoded, table);
        assert_eq!(
            decoded.value(0, "colorCode"),
            Some(&EnumCellValue::String("001100".to_string()))
        );
    }

    #[test]
    fn transfer_keeps_columns_of_empty_table() {
        let table = SpecTable::new(vec!["rnr".to_string(), "hu".to_string()]).expect("table");
        let decoded = decode_transfer_table(&encode_transfer_table(&table)).expect("decode");
        assert_eq!(decoded.columns(), table.columns());
        assert_eq!(decoded.height(), 0);
    }

    #[test]
    fn decode_rejects_malformed_envelopes() {
        assert!(decode_transfer_table("not json").is_err());
        assert!(decode_transfer_table(r#"{"data": {}}"#).is_err());
        assert!(decode_transfer_table(r#"{"columns": ["a"], "data": {"x": {}}}"#).is_err());
        assert!(
            decode_transfer_table(r#"{"columns": ["a"], "data": {"0": {"b": 1}}}"#).is_err()
        );
    }
}

//! Delimited text loader.
//!
//! The `csv` reader checks record shape and header names and rewrites the
//! records as canonical CSV; the polars CSV reader then tokenizes that text
//! with every column read as text, and each cell is typed through
//! [`infer_cell_value`].

use std::io::Cursor;
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, StringRecord, WriterBuilder};
use polars::prelude::{AnyValue, CsvReadOptions, DataFrame, SerReader};
use tracing::debug;

use crate::conf::C_COL_RNR;
use crate::spec::{EnumCellValue, SpecTable, TableError};
use crate::util::{infer_cell_value, validate_unique_columns};

/// Load a table from delimited bytes.
///
/// Fails with [`TableError::Parse`] on invalid UTF-8, ragged records, bad
/// header names or a missing `rnr` column; never returns a partial table.
pub fn load_table_from_bytes(bytes: &[u8], delimiter: u8) -> Result<SpecTable, TableError> {
    std::str::from_utf8(bytes)
        .map_err(|err| TableError::Parse(format!("Input is not valid UTF-8: {err}")))?;

    let (l_colnames, l_records) = read_delimited_records(bytes, delimiter)?;
    validate_unique_columns(&l_colnames).map_err(TableError::Parse)?;
    if !l_colnames.iter().any(|c_name| c_name == C_COL_RNR) {
        return Err(TableError::Parse(format!(
            "Missing required column {C_COL_RNR:?}"
        )));
    }

    let v_canonical = derive_canonical_csv(&l_colnames, &l_records, delimiter)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(delimiter))
        .into_reader_with_file_handle(Cursor::new(v_canonical))
        .finish()
        .map_err(|err| TableError::Parse(format!("Failed to tokenize input: {err}")))?;

    let table = derive_table_from_dataframe(&df, l_colnames)?;
    debug!(
        rows = table.height(),
        cols = table.width(),
        "loaded delimited table"
    );
    Ok(table)
}

/// Load a table from a delimited file on disk.
pub fn load_table_from_path(path: &Path, delimiter: u8) -> Result<SpecTable, TableError> {
    let v_bytes = std::fs::read(path).map_err(|err| TableError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    load_table_from_bytes(&v_bytes, delimiter)
}

/// Read the trimmed header names and every data record.
///
/// Every record must carry exactly as many fields as the header.
fn read_delimited_records(
    bytes: &[u8],
    delimiter: u8,
) -> Result<(Vec<String>, Vec<StringRecord>), TableError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let l_colnames: Vec<String> = rdr
        .headers()
        .map_err(derive_csv_error)?
        .iter()
        .map(|c_name| c_name.trim().to_string())
        .collect();
    if l_colnames.is_empty() {
        return Err(TableError::Parse("Input is empty (no header line).".to_string()));
    }

    let l_records = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(derive_csv_error)?;
    Ok((l_colnames, l_records))
}

fn derive_canonical_csv(
    colnames: &[String],
    records: &[StringRecord],
    delimiter: u8,
) -> Result<Vec<u8>, TableError> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    wtr.write_record(colnames).map_err(derive_csv_error)?;
    for record in records {
        wtr.write_record(record).map_err(derive_csv_error)?;
    }
    wtr.into_inner()
        .map_err(|err| TableError::Parse(format!("Failed to buffer records: {err}")))
}

fn derive_csv_error(err: csv::Error) -> TableError {
    match err.kind() {
        ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => TableError::Parse(format!(
            "Line {}: expected {expected_len} fields, found {len}",
            pos.as_ref().map_or(0, |pos| pos.line())
        )),
        _ => TableError::Parse(format!("Malformed delimited input: {err}")),
    }
}

fn derive_table_from_dataframe(
    df: &DataFrame,
    colnames: Vec<String>,
) -> Result<SpecTable, TableError> {
    if df.width() != colnames.len() {
        return Err(TableError::Parse(format!(
            "Tokenizer produced {} columns, header declares {}",
            df.width(),
            colnames.len()
        )));
    }

    let l_cols = df.get_columns();
    let mut l_rows = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut row = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            let value = col
                .get(n_idx_row)
                .map_err(|err| TableError::Parse(format!("Failed to access cell value: {err}")))?;
            row.push(derive_cell_value_from_any_value(value));
        }
        l_rows.push(row);
    }

    SpecTable::from_rows(colnames, l_rows).map_err(|err| TableError::Parse(err.to_string()))
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => infer_cell_value(val),
        AnyValue::StringOwned(val) => infer_cell_value(val.as_str()),
        _ => infer_cell_value(&value.to_string()),
    }
}

//! Table models and error types.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::util::validate_unique_columns;

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Normalized cell value. `None` is the single null representation.
#[derive(Debug, Clone)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Boolean value.
    Boolean(bool),
    /// Integral number.
    Integer(i64),
    /// Non-integral number.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// Text value.
    String(String),
}

impl EnumCellValue {
    /// Return `true` for the null representation.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Return the date payload, if any.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(val) => Some(*val),
            _ => None,
        }
    }

    /// Render the value as display text; `None` for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::None => None,
            _ => Some(self.to_string()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Boolean(_) => 0,
            Self::Integer(_) | Self::Number(_) => 1,
            Self::Date(_) => 2,
            Self::String(_) => 3,
            Self::None => 4,
        }
    }

    /// Total order used for table sorting.
    ///
    /// Nulls sort last; integers and decimals compare numerically; values of
    /// different kinds fall back to kind rank.
    pub fn cmp_for_sort(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::None, Self::None) => Ordering::Equal,
            (Self::None, _) => Ordering::Greater,
            (_, Self::None) => Ordering::Less,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Integer(a), Self::Number(b)) => (*a as f64).total_cmp(b),
            (Self::Number(a), Self::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl PartialEq for EnumCellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            // Bitwise so that `Eq` and `Hash` agree.
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for EnumCellValue {}

impl Hash for EnumCellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::None => {}
            Self::Boolean(val) => val.hash(state),
            Self::Integer(val) => val.hash(state),
            Self::Number(val) => val.to_bits().hash(state),
            Self::Date(val) => val.hash(state),
            Self::String(val) => val.hash(state),
        }
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Boolean(val) => write!(f, "{val}"),
            Self::Integer(val) => write!(f, "{val}"),
            Self::Number(val) => write!(f, "{val}"),
            Self::Date(val) => write!(f, "{}", val.format("%Y-%m-%d")),
            Self::String(val) => write!(f, "{val}"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Table

/// Ordered rows over a fixed, unique column list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTable {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<EnumCellValue>>,
}

impl SpecTable {
    /// Create an empty table over `columns`.
    pub fn new(columns: Vec<String>) -> Result<Self, TableError> {
        validate_unique_columns(&columns).map_err(TableError::InvalidShape)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table from column names and row-major values.
    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<Vec<EnumCellValue>>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Zero-based index of `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == name)
    }

    /// Cell at `row_idx` in column `name`.
    pub fn value(&self, row_idx: usize, name: &str) -> Option<&EnumCellValue> {
        let n_idx_col = self.column_index(name)?;
        self.rows.get(row_idx).map(|row| &row[n_idx_col])
    }

    /// Append one row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<EnumCellValue>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::InvalidShape(format!(
                "row width {} does not match column count {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Return the index of `name`, appending a null-filled column if absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(n_idx) = self.column_index(name) {
            return n_idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(EnumCellValue::None);
        }
        self.columns.len() - 1
    }

    /// Overwrite one cell. Out-of-range coordinates are ignored.
    pub fn set_value(&mut self, row_idx: usize, col_idx: usize, value: EnumCellValue) {
        if let Some(cell) = self
            .rows
            .get_mut(row_idx)
            .and_then(|row| row.get_mut(col_idx))
        {
            *cell = value;
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// Counters collected by one merge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecMergeReport {
    /// External records appended as rows.
    pub cnt_appended: usize,
    /// External records skipped for a missing `hu`.
    pub cnt_skipped: usize,
    /// Rows dropped by deduplication.
    pub cnt_duplicates_removed: usize,
}

/// Table-level failures.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Delimited input could not be parsed or failed boundary validation.
    #[error("CSV parsing failed: {0}")]
    Parse(String),
    /// Input file could not be read.
    #[error("Failed to read {}: {message}", .path.display())]
    Io {
        /// Input path.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Transfer payload is malformed.
    #[error("Malformed transfer table: {0}")]
    Transfer(String),
    /// Row/column shape violation while building a table.
    #[error("Invalid table shape: {0}")]
    InvalidShape(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn cmp_for_sort_puts_nulls_last_and_mixes_numbers() {
        let mut l_values = vec![
            EnumCellValue::None,
            EnumCellValue::Number(2.5),
            EnumCellValue::Integer(3),
            EnumCellValue::Integer(1),
        ];
        l_values.sort_by(|a, b| a.cmp_for_sort(b));
        assert_eq!(
            l_values,
            vec![
                EnumCellValue::Integer(1),
                EnumCellValue::Number(2.5),
                EnumCellValue::Integer(3),
                EnumCellValue::None,
            ]
        );
    }

    #[test]
    fn ensure_column_null_fills_existing_rows() {
        let mut table = SpecTable::from_rows(
            cols(&["rnr"]),
            vec![vec![EnumCellValue::Integer(1)], vec![EnumCellValue::Integer(2)]],
        )
        .expect("table");

        let n_idx = table.ensure_column("hu");
        assert_eq!(n_idx, 1);
        assert_eq!(table.ensure_column("rnr"), 0);
        assert!(table.rows().iter().all(|row| row[1].is_none()));
    }

    #[test]
    fn push_row_rejects_width_mismatch() {
        let mut table = SpecTable::new(cols(&["rnr", "hu"])).expect("table");
        let err = table
            .push_row(vec![EnumCellValue::Integer(1)])
            .expect_err("width mismatch");
        assert!(matches!(err, TableError::InvalidShape(_)));
    }

    #[test]
    fn new_rejects_duplicate_columns() {
        assert!(SpecTable::new(cols(&["rnr", "rnr"])).is_err());
    }
}

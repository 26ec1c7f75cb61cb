//! Shared XLSX formats, options, reports and errors.

use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
///
/// Every field is optional so formats can be layered with [`Self::merge`].
/// Style rules emit patches that only touch `bg_color` or `font_color`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color, `#RRGGBB`, `#RGB` or a CSS color name.
    pub bg_color: Option<String>,
    /// Font color, same notation as `bg_color`.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }

    /// `true` when no property is set.
    pub fn is_empty(&self) -> bool {
        *self == SpecCellFormat::default()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnFormatSpecification

/// Value kind of one column, inferred from its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColumnKind {
    /// Mixed or textual values.
    Text,
    /// Only integers.
    Integer,
    /// Only numbers, at least one non-integral.
    Decimal,
    /// Only dates.
    Date,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetSpecification

/// Concrete sheet part emitted to workbook (after Excel-limit slicing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Inclusive source row start.
    pub row_start_inclusive: usize,
    /// Exclusive source row end.
    pub row_end_exclusive: usize,
    /// Inclusive source column start.
    pub col_start_inclusive: usize,
    /// Exclusive source column end.
    pub col_end_exclusive: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet slices produced by the write call.
    pub sheets: Vec<SpecSheetSlice>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Result of one spreadsheet export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportReport {
    /// Written workbook path.
    pub path_file_out: PathBuf,
    /// Exported columns in sheet order.
    pub columns: Vec<String>,
    /// Exported data rows.
    pub cnt_rows: usize,
    /// Writer warnings (e.g. sheet overflow splits).
    pub warnings: Vec<String>,
}

/// Export failures.
#[derive(Debug, thiserror::Error)]
pub enum XlsxExportError {
    /// A requested column does not exist in the table.
    #[error("Column not found: {0:?}")]
    ColumnNotFound(String),
    /// A requested column is listed twice.
    #[error("Column requested more than once: {0:?}")]
    DuplicateColumn(String),
    /// An explicit column selection is empty.
    #[error("Column selection is empty")]
    EmptySelection,
    /// Output directory could not be prepared.
    #[error("Failed to prepare {}: {message}", .path.display())]
    OutputDir {
        /// Output directory.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Workbook could not be built or saved.
    #[error("{0}")]
    Write(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_only_set_properties() {
        let fmt_base = SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#FFFFFF".to_string()),
            ..Default::default()
        };
        let fmt_patch = SpecCellFormat {
            bg_color: Some("#007500".to_string()),
            font_color: Some("#000000".to_string()),
            ..Default::default()
        };

        let fmt = fmt_base.merge(&fmt_patch);
        assert_eq!(fmt.bold, Some(true));
        assert_eq!(fmt.bg_color.as_deref(), Some("#007500"));
        assert_eq!(fmt.font_color.as_deref(), Some("#000000"));
        assert!(SpecCellFormat::default().is_empty());
        assert!(!fmt.is_empty());
    }
}

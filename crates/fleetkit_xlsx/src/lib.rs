//! `fleetkit_xlsx` v1:
//! Conditional styling and XLSX export of vehicle tables.
//!
//! Module layout:
//! - `conf`   : Excel limits, rule colors/thresholds, CSS colors and presets
//! - `spec`   : formats, reports and errors
//! - `util`   : pure helper functions
//! - `style`  : row-level style rules and the styled table view
//! - `writer` : `rust_xlsxwriter` kernel
//! - `export` : timestamped export of a styled table
pub mod conf;
pub mod export;
pub mod spec;
pub mod style;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
pub use export::{derive_export_path, export_styled_table};
pub use spec::{
    EnumColumnKind, SpecCellFormat, SpecExportReport, SpecSheetSlice, SpecXlsxReport,
    XlsxExportError,
};
pub use style::{
    EnumTintPolicy, RuleHuFreshness, RuleLabelTint, SpecStyledTable, StyleRule,
    derive_hu_background, resolve_tint_rule, style_table,
};
pub use util::{parse_color_rgb, plan_sheet_slices, sanitize_sheet_name, select_column_indices};
pub use writer::XlsxWriter;

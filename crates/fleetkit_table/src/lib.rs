//! `fleetkit_table` v1:
//! In-memory vehicle inventory table kernel.
//!
//! Module layout:
//! - `conf`  : column names, null tokens and date formats
//! - `spec`  : cell/table models and errors
//! - `util`  : pure helper functions (inference, JSON mapping, column checks)
//! - `load`  : delimited text loader
//! - `merge` : external record merge, dedupe and sort
//! - `codec` : row-indexed JSON transfer encoding
pub mod codec;
pub mod conf;
pub mod load;
pub mod merge;
pub mod spec;
pub mod util;

pub use codec::{decode_transfer_table, encode_transfer_table};
pub use conf::{C_COL_COLOR_CODE, C_COL_GRUPPE, C_COL_HU, C_COL_LABEL_IDS, C_COL_RNR};
pub use load::{load_table_from_bytes, load_table_from_path};
pub use merge::{dedupe_rows, merge_external_records, sort_rows_by_column};
pub use spec::{EnumCellValue, SpecMergeReport, SpecTable, TableError};
pub use util::{convert_json_value, infer_cell_value};

//! Table constants shared by loader, merger and codec.

/// Unique record identifier; required in every loaded table.
pub const C_COL_RNR: &str = "rnr";
/// Periodic inspection (HU) date column.
pub const C_COL_HU: &str = "hu";
/// Grouping column used for the final sort.
pub const C_COL_GRUPPE: &str = "gruppe";
/// Label identifier column resolved against the label API.
pub const C_COL_LABEL_IDS: &str = "labelIds";
/// Column holding the resolved label color.
pub const C_COL_COLOR_CODE: &str = "colorCode";

/// Default field delimiter of the inventory CSV.
pub const U8_DELIMITER_DEFAULT: u8 = b';';

/// Cell texts normalized to [`crate::spec::EnumCellValue::None`].
pub const TUP_NULL_TOKENS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];
/// Accepted plain date layouts, tried in order.
pub const TUP_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];
/// Accepted timestamp layouts without offset; the time part is dropped.
pub const TUP_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Date layout used when a date crosses the transfer boundary.
pub const C_DATE_TRANSFER_FORMAT: &str = "%Y-%m-%d";

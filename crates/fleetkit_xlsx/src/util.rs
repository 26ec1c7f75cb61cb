//! Stateless helper utilities used by the XLSX writer and exporter.

use std::collections::BTreeSet;

use fleetkit_table::{EnumCellValue, SpecTable};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_CSS_NAMED_COLORS,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumColumnKind, SpecSheetSlice, SpecXlsxReport, XlsxExportError};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnSelection

/// Resolve an optional column selection to table indices in caller order.
///
/// `None` selects every column in table order. Unknown or repeated names fail
/// before anything is written.
pub fn select_column_indices(
    columns: &[String],
    refs: Option<&[String]>,
) -> Result<Vec<usize>, XlsxExportError> {
    let Some(refs) = refs else {
        return Ok((0..columns.len()).collect());
    };
    if refs.is_empty() {
        return Err(XlsxExportError::EmptySelection);
    }

    let mut set_seen = BTreeSet::new();
    let mut l_cols_idx = Vec::with_capacity(refs.len());
    for ref_col in refs {
        let Some(n_idx) = columns.iter().position(|c_name| c_name == ref_col) else {
            return Err(XlsxExportError::ColumnNotFound(ref_col.clone()));
        };
        if !set_seen.insert(n_idx) {
            return Err(XlsxExportError::DuplicateColumn(ref_col.clone()));
        }
        l_cols_idx.push(n_idx);
    }

    Ok(l_cols_idx)
}

/// Infer one [`EnumColumnKind`] per selected column from its non-null cells.
///
/// All-null columns are text.
pub fn derive_column_kinds(table: &SpecTable, cols_idx: &[usize]) -> Vec<EnumColumnKind> {
    cols_idx
        .iter()
        .map(|n_idx_col| {
            let mut kind: Option<EnumColumnKind> = None;
            for row in table.rows() {
                let kind_cell = match &row[*n_idx_col] {
                    EnumCellValue::None => continue,
                    EnumCellValue::Integer(_) => EnumColumnKind::Integer,
                    EnumCellValue::Number(_) => EnumColumnKind::Decimal,
                    EnumCellValue::Date(_) => EnumColumnKind::Date,
                    EnumCellValue::Boolean(_) | EnumCellValue::String(_) => {
                        return EnumColumnKind::Text;
                    }
                };
                kind = Some(match (kind, kind_cell) {
                    (None, k) => k,
                    (Some(a), b) if a == b => a,
                    (Some(EnumColumnKind::Integer), EnumColumnKind::Decimal)
                    | (Some(EnumColumnKind::Decimal), EnumColumnKind::Integer) => {
                        EnumColumnKind::Decimal
                    }
                    _ => return EnumColumnKind::Text,
                });
            }
            kind.unwrap_or(EnumColumnKind::Text)
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Estimate displayed width units for one cell value.
///
/// Used by autofit inference logic.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::Boolean(val) => if *val { 4 } else { 5 },
        EnumCellValue::Integer(val) => val.to_string().len(),
        EnumCellValue::Number(val) => format!("{val:.2}").len(),
        EnumCellValue::Date(_) => 10,
        EnumCellValue::String(val) => estimate_unicode_string_width(val),
    }
}

/// Width of `s` with non-ASCII characters weighted wider.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColorConversion

/// Parse `#RRGGBB`, `#RGB` (leading `#` optional) or a CSS color name to RGB.
pub fn parse_color_rgb(text: &str) -> Option<u32> {
    let c_trimmed = text.trim();
    let c_hex = c_trimmed.strip_prefix('#').unwrap_or(c_trimmed);
    if c_hex.chars().all(|chr| chr.is_ascii_hexdigit()) {
        match c_hex.len() {
            6 => return u32::from_str_radix(c_hex, 16).ok(),
            3 => {
                let c_expanded: String = c_hex.chars().flat_map(|chr| [chr, chr]).collect();
                return u32::from_str_radix(&c_expanded, 16).ok();
            }
            _ => {}
        }
    }

    let c_name = c_trimmed.to_ascii_lowercase();
    TUP_CSS_NAMED_COLORS
        .iter()
        .find(|(c_css, _)| *c_css == c_name)
        .map(|(_, n_rgb)| *n_rgb)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    let c_name = c_name.trim().trim_matches('\'');
    if c_name.is_empty() {
        return "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Split a `height × width` table into Excel-compliant sheet slices.
///
/// Columns are split first, then rows. An empty table still yields one slice
/// so the header is written.
pub fn plan_sheet_slices(
    height_table: usize,
    width_table: usize,
    height_header: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<Vec<SpecSheetSlice>, String> {
    if height_header == 0 {
        return Err("height_header must be >= 1.".to_string());
    }
    let n_rows_data_max = N_NROWS_EXCEL_MAX
        .checked_sub(height_header)
        .filter(|n_max| *n_max > 0)
        .ok_or_else(|| {
            format!("Header too tall: height_header={height_header} exceeds Excel limit.")
        })?;

    let l_col_slices = derive_spans(width_table, N_NCOLS_EXCEL_MAX);
    let l_row_slices = derive_spans(height_table, n_rows_data_max);
    let n_parts_total = l_col_slices.len() * l_row_slices.len();

    let mut l_sheet_parts = Vec::with_capacity(n_parts_total);
    for (n_idx_part, ((col_start, col_end), (row_start, row_end))) in l_col_slices
        .iter()
        .flat_map(|col| l_row_slices.iter().map(move |row| (*col, *row)))
        .enumerate()
    {
        l_sheet_parts.push(SpecSheetSlice {
            sheet_name: if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx_part + 1)
            },
            row_start_inclusive: row_start,
            row_end_exclusive: row_end,
            col_start_inclusive: col_start,
            col_end_exclusive: col_end,
        });
    }

    if n_parts_total > 1 {
        report.warn(format!(
            "Excel limit overflow: split into {n_parts_total} sheets (columns-first, then rows)."
        ));
    }

    Ok(l_sheet_parts)
}

fn derive_spans(n_total: usize, n_span_max: usize) -> Vec<(usize, usize)> {
    if n_total == 0 {
        return vec![(0, 0)];
    }
    (0..n_total)
        .step_by(n_span_max)
        .map(|n_start| (n_start, usize::min(n_total, n_start + n_span_max)))
        .collect()
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

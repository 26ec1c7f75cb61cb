//! XLSX writer kernel that renders a [`SpecTable`] with per-row format patches.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use fleetkit_table::{EnumCellValue, SpecTable};
use rust_xlsxwriter::{
    Color, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};
use tracing::{debug, warn};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_RGB_COLOR_FALLBACK, N_ROWS_AUTOFIT_MAX, N_WIDTH_CELL_MAX,
    N_WIDTH_CELL_MIN, N_WIDTH_CELL_PADDING, derive_default_xlsx_formats,
};
use crate::spec::{EnumColumnKind, SpecCellFormat, SpecSheetSlice, SpecXlsxReport};
use crate::util::{
    derive_column_kinds, estimate_unicode_string_width, estimate_width_len, parse_color_rgb,
    plan_sheet_slices, sanitize_sheet_name,
};

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_integer: SpecCellFormat,
    fmt_decimal: SpecCellFormat,
    fmt_date: SpecCellFormat,
    fmt_header: SpecCellFormat,
    set_sheet_names_existing: BTreeSet<String>,
    dict_formats: HashMap<SpecCellFormat, Format>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create a writer bound to `path_file_out` using the presets of
    /// [`derive_default_xlsx_formats`].
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: PathBuf) -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        let get = |key: &str| dict_fmt.get(key).cloned().unwrap_or_default();
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_text: get("text"),
            fmt_integer: get("integer"),
            fmt_decimal: get("decimal"),
            fmt_date: get("date"),
            fmt_header: get("header"),
            set_sheet_names_existing: BTreeSet::new(),
            dict_formats: HashMap::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), String> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        Ok(())
    }

    /// Write the columns `cols_idx` of `table` into one logical sheet.
    ///
    /// The header row is bold and frozen. `row_formats`, when given, holds one
    /// patch per table row; each cell is written with its column base format
    /// merged with the row patch.
    pub fn write_sheet(
        &mut self,
        table: &SpecTable,
        cols_idx: &[usize],
        row_formats: Option<&[SpecCellFormat]>,
        sheet_name: &str,
    ) -> Result<(), String> {
        if self.if_closed {
            return Err("Cannot write after close().".to_string());
        }
        if let Some(n_idx_col) = cols_idx.iter().find(|n_idx| **n_idx >= table.width()) {
            return Err(format!("Column index out of range: {n_idx_col}"));
        }
        if let Some(l_fmts) = row_formats
            && l_fmts.len() != table.height()
        {
            return Err(format!(
                "row_formats length {} does not match table height {}.",
                l_fmts.len(),
                table.height()
            ));
        }

        let l_colnames: Vec<&str> = cols_idx
            .iter()
            .map(|n_idx| table.columns()[*n_idx].as_str())
            .collect();
        let l_fmts_base: Vec<SpecCellFormat> = derive_column_kinds(table, cols_idx)
            .iter()
            .map(|kind| match kind {
                EnumColumnKind::Text => self.fmt_text.clone(),
                EnumColumnKind::Integer => self.fmt_integer.clone(),
                EnumColumnKind::Decimal => self.fmt_decimal.clone(),
                EnumColumnKind::Date => self.fmt_date.clone(),
            })
            .collect();
        let fmt_date_patch = SpecCellFormat {
            num_format: self.fmt_date.num_format.clone(),
            ..Default::default()
        };

        let mut report = SpecXlsxReport::default();
        let n_rows_header = 1;
        let l_sheet_parts = plan_sheet_slices(
            table.height(),
            cols_idx.len(),
            n_rows_header,
            &sanitize_sheet_name(sheet_name, "_"),
            &mut report,
        )?;

        for sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name);
            let fmt_header = derive_cached_format(&mut self.dict_formats, &self.fmt_header);
            let worksheet = self.workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name_unique)
                .map_err(derive_xlsx_error_text)?;

            let n_cols_slice = sheet_slice.col_end_exclusive - sheet_slice.col_start_inclusive;
            let mut l_width_by_col = vec![0usize; n_cols_slice];

            for n_idx_col in 0..n_cols_slice {
                let c_colname = l_colnames[sheet_slice.col_start_inclusive + n_idx_col];
                worksheet
                    .write_string_with_format(0, cast_col_num(n_idx_col)?, c_colname, &fmt_header)
                    .map_err(derive_xlsx_error_text)?;
                l_width_by_col[n_idx_col] = estimate_unicode_string_width(c_colname);
            }

            worksheet
                .set_freeze_panes(cast_row_num(n_rows_header)?, 0)
                .map_err(derive_xlsx_error_text)?;

            let fmt_row_empty = SpecCellFormat::default();

            for (n_row_local, n_idx_row) in
                (sheet_slice.row_start_inclusive..sheet_slice.row_end_exclusive).enumerate()
            {
                let row = &table.rows()[n_idx_row];
                let fmt_row = row_formats.map_or(&fmt_row_empty, |l_fmts| &l_fmts[n_idx_row]);

                for n_idx_col in 0..n_cols_slice {
                    let n_idx_col_sel = sheet_slice.col_start_inclusive + n_idx_col;
                    let value = &row[cols_idx[n_idx_col_sel]];

                    let mut fmt_cell = l_fmts_base[n_idx_col_sel].merge(fmt_row);
                    if matches!(value, EnumCellValue::Date(_)) {
                        fmt_cell = fmt_cell.merge(&fmt_date_patch);
                    }
                    let format = derive_cached_format(&mut self.dict_formats, &fmt_cell);

                    if n_row_local < N_ROWS_AUTOFIT_MAX {
                        l_width_by_col[n_idx_col] =
                            usize::max(l_width_by_col[n_idx_col], estimate_width_len(value));
                    }

                    write_cell_with_format(
                        worksheet,
                        n_rows_header + n_row_local,
                        n_idx_col,
                        value,
                        &format,
                    )?;
                }
            }

            for (n_idx_col, n_width_recorded) in l_width_by_col.iter().enumerate() {
                let n_width_final = usize::min(
                    N_WIDTH_CELL_MAX,
                    usize::max(N_WIDTH_CELL_MIN, n_width_recorded + N_WIDTH_CELL_PADDING),
                );
                worksheet
                    .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                    .map_err(derive_xlsx_error_text)?;
            }

            debug!(
                sheet = %sheet_name_unique,
                rows = sheet_slice.row_end_exclusive - sheet_slice.row_start_inclusive,
                cols = n_cols_slice,
                "wrote sheet"
            );
            report.sheets.push(SpecSheetSlice {
                sheet_name: sheet_name_unique,
                ..sheet_slice
            });
        }

        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if self.set_sheet_names_existing.insert(name.to_string()) {
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if self.set_sheet_names_existing.insert(candidate.clone()) {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => worksheet.write_blank(n_row, n_col, format),
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)
        }
        EnumCellValue::Integer(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val as f64, format)
        }
        EnumCellValue::Number(val) if val.is_finite() => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)
        }
        EnumCellValue::Number(val) => {
            worksheet.write_string_with_format(n_row, n_col, val.to_string(), format)
        }
        EnumCellValue::Date(val) => match derive_excel_date(*val) {
            Some(datetime) => worksheet.write_date_with_format(n_row, n_col, &datetime, format),
            None => worksheet.write_string_with_format(n_row, n_col, val.to_string(), format),
        },
        EnumCellValue::String(val) => worksheet.write_string_with_format(n_row, n_col, val, format),
    }
    .map_err(derive_xlsx_error_text)?;
    Ok(())
}

/// Excel date for `date`; `None` outside the range Excel can display.
fn derive_excel_date(date: NaiveDate) -> Option<ExcelDateTime> {
    let n_year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(n_year, date.month() as u8, date.day() as u8).ok()
}

fn derive_cached_format(
    dict_formats: &mut HashMap<SpecCellFormat, Format>,
    spec: &SpecCellFormat,
) -> Format {
    dict_formats
        .entry(spec.clone())
        .or_insert_with(|| derive_rust_xlsx_format(spec))
        .clone()
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(derive_xlsx_color(val));
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(derive_xlsx_color(val));
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

/// RGB color for a hex or CSS color string; unparseable text renders black.
fn derive_xlsx_color(text: &str) -> Color {
    match parse_color_rgb(text) {
        Some(n_rgb) => Color::RGB(n_rgb),
        None => {
            warn!(color = text, "unrecognized color; rendering black");
            Color::RGB(N_RGB_COLOR_FALLBACK)
        }
    }
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;
    use std::path::Path;

    use chrono::NaiveDate;
    use tempfile::tempdir;
    use zip::ZipArchive;

    use super::*;

    fn table() -> SpecTable {
        SpecTable::from_rows(
            vec!["rnr".to_string(), "hu".to_string(), "kurzname".to_string()],
            vec![
                vec![
                    EnumCellValue::Integer(1),
                    EnumCellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")),
                    EnumCellValue::String("Kran".to_string()),
                ],
                vec![
                    EnumCellValue::Integer(2),
                    EnumCellValue::None,
                    EnumCellValue::Boolean(true),
                ],
            ],
        )
        .expect("table")
    }

    fn read_workbook_part(path: &Path, name: &str) -> String {
        let mut archive = ZipArchive::new(File::open(path).expect("open")).expect("zip");
        let mut entry = archive.by_name(name).expect("part");
        let mut c_xml = String::new();
        entry.read_to_string(&mut c_xml).expect("read");
        c_xml
    }

    #[test]
    fn write_sheet_and_close_creates_file() {
        let dir = tempdir().expect("tempdir");
        let path_file_out = dir.path().join("out.xlsx");
        let mut writer = XlsxWriter::new(path_file_out.clone());

        let l_fmts = vec![
            SpecCellFormat {
                bg_color: Some("#007500".to_string()),
                ..Default::default()
            },
            SpecCellFormat::default(),
        ];
        writer
            .write_sheet(&table(), &[2, 0], Some(l_fmts.as_slice()), "vehicles")
            .expect("write");
        writer.close().expect("close");
        writer.close().expect("close twice");

        assert!(path_file_out.exists());
        let l_reports = writer.report();
        assert_eq!(l_reports.len(), 1);
        assert_eq!(l_reports[0].sheets[0].sheet_name, "vehicles");
        assert_eq!(l_reports[0].sheets[0].row_end_exclusive, 2);
        assert_eq!(l_reports[0].sheets[0].col_end_exclusive, 2);
    }

    #[test]
    fn row_colors_are_rendered_as_rgb() {
        let dir = tempdir().expect("tempdir");
        let path_file_out = dir.path().join("out.xlsx");
        let mut writer = XlsxWriter::new(path_file_out.clone());

        let l_fmts = vec![
            SpecCellFormat {
                bg_color: Some("#0F0".to_string()),
                font_color: Some("red".to_string()),
                ..Default::default()
            },
            SpecCellFormat {
                bg_color: Some("#b30000".to_string()),
                font_color: Some("001100".to_string()),
                ..Default::default()
            },
        ];
        writer
            .write_sheet(&table(), &[0, 1, 2], Some(l_fmts.as_slice()), "vehicles")
            .expect("write");
        writer.close().expect("close");

        let c_styles = read_workbook_part(&path_file_out, "xl/styles.xml");
        assert!(c_styles.contains("FFFF0000"));
        assert!(c_styles.contains("FF00FF00"));
        assert!(c_styles.contains("FFB30000"));
        assert!(c_styles.contains("FF001100"));
    }

    #[test]
    fn unparseable_color_falls_back_to_black() {
        assert_eq!(derive_xlsx_color("rot"), Color::RGB(N_RGB_COLOR_FALLBACK));
        assert_eq!(derive_xlsx_color("Navy"), Color::RGB(0x000080));
    }

    #[test]
    fn dates_are_written_as_excel_dates() {
        let dir = tempdir().expect("tempdir");
        let path_file_out = dir.path().join("out.xlsx");
        let mut writer = XlsxWriter::new(path_file_out.clone());
        writer
            .write_sheet(&table(), &[1], None, "vehicles")
            .expect("write");
        writer.close().expect("close");

        let c_sheet = read_workbook_part(&path_file_out, "xl/worksheets/sheet1.xml");
        assert!(c_sheet.contains("<v>45292</v>"));
        let c_styles = read_workbook_part(&path_file_out, "xl/styles.xml");
        assert!(c_styles.contains("yyyy-mm-dd"));
        assert!(c_styles.contains(r#"<left style="thin">"#));
    }

    #[test]
    fn write_sheet_rejects_mismatched_row_formats() {
        let dir = tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(dir.path().join("out.xlsx"));

        let err = writer
            .write_sheet(
                &table(),
                &[0],
                Some(&[SpecCellFormat::default()][..]),
                "vehicles",
            )
            .expect_err("length mismatch");
        assert!(err.contains("row_formats"));

        assert!(writer.write_sheet(&table(), &[5], None, "vehicles").is_err());
    }

    #[test]
    fn repeated_sheet_names_are_made_unique() {
        let dir = tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(dir.path().join("out.xlsx"));
        for _ in 0..2 {
            writer
                .write_sheet(&table(), &[0, 1, 2], None, "vehicles")
                .expect("write");
        }

        let l_names: Vec<String> = writer
            .report()
            .iter()
            .map(|report| report.sheets[0].sheet_name.clone())
            .collect();
        assert_eq!(l_names, vec!["vehicles", "vehicles__2"]);
    }

    #[test]
    fn write_after_close_fails() {
        let dir = tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(dir.path().join("out.xlsx"));
        writer.close().expect("close");
        assert!(writer.write_sheet(&table(), &[0], None, "vehicles").is_err());
    }
}

//! Timestamped workbook export of a styled table.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::conf::{
    C_EXPORT_FILE_EXT, C_EXPORT_FILE_PREFIX, C_EXPORT_SHEET_NAME, C_EXPORT_TIMESTAMP_FORMAT,
};
use crate::spec::{SpecExportReport, XlsxExportError};
use crate::style::SpecStyledTable;
use crate::util::select_column_indices;
use crate::writer::XlsxWriter;

/// Write `styled` to `dir_out/vehicles_<timestamp>.xlsx`.
///
/// `columns` selects and orders the exported columns; `None` keeps all of
/// them. Rules are evaluated on full rows, so a selection that drops `hu`
/// still colors by `hu`. Nothing is written when the selection is invalid.
pub fn export_styled_table(
    styled: &SpecStyledTable<'_>,
    columns: Option<&[String]>,
    dir_out: &Path,
    now: NaiveDateTime,
) -> Result<SpecExportReport, XlsxExportError> {
    let table = styled.table();
    let l_cols_idx = select_column_indices(table.columns(), columns)?;

    fs::create_dir_all(dir_out).map_err(|err| XlsxExportError::OutputDir {
        path: dir_out.to_path_buf(),
        message: err.to_string(),
    })?;
    let path_file_out = derive_export_path(dir_out, now);

    let l_row_fmts = styled.derive_row_formats();
    let mut writer = XlsxWriter::new(path_file_out.clone());
    writer
        .write_sheet(
            table,
            &l_cols_idx,
            Some(l_row_fmts.as_slice()),
            C_EXPORT_SHEET_NAME,
        )
        .map_err(XlsxExportError::Write)?;
    writer.close().map_err(XlsxExportError::Write)?;

    let warnings: Vec<String> = writer
        .report()
        .into_iter()
        .flat_map(|report| report.warnings)
        .collect();
    let report = SpecExportReport {
        path_file_out,
        columns: l_cols_idx
            .iter()
            .map(|n_idx| table.columns()[*n_idx].clone())
            .collect(),
        cnt_rows: table.height(),
        warnings,
    };
    info!(
        path = %report.path_file_out.display(),
        rows = report.cnt_rows,
        cols = report.columns.len(),
        "exported workbook"
    );
    Ok(report)
}

/// First free `vehicles_<timestamp>[_n].xlsx` path in `dir_out`.
pub fn derive_export_path(dir_out: &Path, now: NaiveDateTime) -> PathBuf {
    let c_stem = format!(
        "{C_EXPORT_FILE_PREFIX}_{}",
        now.format(C_EXPORT_TIMESTAMP_FORMAT)
    );
    let path_candidate = dir_out.join(format!("{c_stem}.{C_EXPORT_FILE_EXT}"));
    if !path_candidate.exists() {
        return path_candidate;
    }

    (1usize..)
        .map(|n_idx| dir_out.join(format!("{c_stem}_{n_idx}.{C_EXPORT_FILE_EXT}")))
        .find(|path| !path.exists())
        .unwrap_or(path_candidate)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;

    use chrono::{Days, NaiveDate};
    use fleetkit_table::{EnumCellValue, SpecTable};
    use tempfile::tempdir;
    use zip::ZipArchive;

    use super::*;
    use crate::conf::{C_COLOR_HU_FRESH, C_COLOR_HU_OVERDUE};
    use crate::style::style_table;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .and_then(|date| date.and_hms_milli_opt(14, 5, 9, 42))
            .expect("datetime")
    }

    fn table() -> SpecTable {
        table_with_color("#ff0000")
    }

    fn table_with_color(c_color: &str) -> SpecTable {
        let today = now().date();
        let date = |n_days: u64| {
            EnumCellValue::Date(today.checked_sub_days(Days::new(n_days)).expect("date"))
        };
        SpecTable::from_rows(
            vec![
                "rnr".to_string(),
                "gruppe".to_string(),
                "hu".to_string(),
                "labelIds".to_string(),
                "colorCode".to_string(),
            ],
            vec![
                vec![
                    EnumCellValue::Integer(1),
                    EnumCellValue::String("A".to_string()),
                    date(40),
                    EnumCellValue::String("L1".to_string()),
                    EnumCellValue::String(c_color.to_string()),
                ],
                vec![
                    EnumCellValue::Integer(2),
                    EnumCellValue::String("B".to_string()),
                    date(400),
                    EnumCellValue::None,
                    EnumCellValue::None,
                ],
            ],
        )
        .expect("table")
    }

    #[test]
    fn export_uses_timestamped_name() {
        let dir = tempdir().expect("tempdir");
        let table = table();
        let styled = style_table(&table, true, true, now().date());

        let report = export_styled_table(&styled, None, dir.path(), now()).expect("export");
        assert_eq!(
            report.path_file_out,
            dir.path().join("vehicles_2025-06-30T14-05-09.042.xlsx")
        );
        assert!(report.path_file_out.exists());
        assert_eq!(report.columns, table.columns());
        assert_eq!(report.cnt_rows, 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn export_never_overwrites_previous_runs() {
        let dir = tempdir().expect("tempdir");
        let table = table();
        let styled = style_table(&table, true, false, now().date());

        let report_a = export_styled_table(&styled, None, dir.path(), now()).expect("export");
        let report_b = export_styled_table(&styled, None, dir.path(), now()).expect("export");
        assert_ne!(report_a.path_file_out, report_b.path_file_out);
        assert_eq!(
            report_b.path_file_out,
            dir.path().join("vehicles_2025-06-30T14-05-09.042_1.xlsx")
        );
    }

    #[test]
    fn export_projects_selected_columns_in_caller_order() {
        let dir = tempdir().expect("tempdir");
        let table = table();
        let styled = style_table(&table, true, true, now().date());
        let l_keys = vec!["gruppe".to_string(), "rnr".to_string()];

        let report = export_styled_table(&styled, Some(l_keys.as_slice()), dir.path(), now())
            .expect("export");
        assert_eq!(report.columns, l_keys);

        let l_fmts = styled.derive_row_formats();
        assert_eq!(l_fmts[0].bg_color.as_deref(), Some(C_COLOR_HU_FRESH));
        assert_eq!(l_fmts[1].bg_color.as_deref(), Some(C_COLOR_HU_OVERDUE));
    }

    #[test]
    fn unknown_column_fails_before_writing() {
        let dir = tempdir().expect("tempdir");
        let table = table();
        let before = table.clone();
        let styled = style_table(&table, true, true, now().date());
        let l_keys = vec!["rnr".to_string(), "kurzname".to_string()];

        let err = export_styled_table(&styled, Some(l_keys.as_slice()), dir.path(), now())
            .expect_err("unknown column");
        assert!(matches!(err, XlsxExportError::ColumnNotFound(c_name) if c_name == "kurzname"));
        assert_eq!(table, before);
        assert_eq!(fs::read_dir(dir.path()).expect("read_dir").count(), 0);
    }

    #[test]
    fn export_creates_missing_output_dir() {
        let dir = tempdir().expect("tempdir");
        let dir_out = dir.path().join("reports").join("fleet");
        let table = table();
        let styled = style_table(&table, false, false, now().date());

        let report = export_styled_table(&styled, None, &dir_out, now()).expect("export");
        assert!(report.path_file_out.starts_with(&dir_out));
        assert!(report.path_file_out.exists());
    }

    #[test]
    fn export_renders_named_label_color() {
        let dir = tempdir().expect("tempdir");
        let table = table_with_color("red");
        let styled = style_table(&table, true, true, now().date());

        let report = export_styled_table(&styled, None, dir.path(), now()).expect("export");
        let mut archive =
            ZipArchive::new(File::open(&report.path_file_out).expect("open")).expect("zip");
        let mut c_styles = String::new();
        archive
            .by_name("xl/styles.xml")
            .expect("styles")
            .read_to_string(&mut c_styles)
            .expect("read");

        assert!(c_styles.contains("FFFF0000"));
        assert!(c_styles.contains("FF007500"));
        assert!(c_styles.contains("FFB30000"));
    }
}

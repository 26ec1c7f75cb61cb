//! External record merge, deduplication and sorting.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::conf::C_COL_HU;
use crate::spec::{EnumCellValue, SpecMergeReport, SpecTable};
use crate::util::convert_json_value;

/// Append external records to `base` and deduplicate the result.
///
/// Records whose `hu` is absent or null are skipped. Columns are unioned:
/// new keys extend the column list (null-filled for existing rows) and
/// columns missing from a record are null for that record.
pub fn merge_external_records(
    base: SpecTable,
    externals: &[Map<String, Value>],
) -> (SpecTable, SpecMergeReport) {
    let mut table = base;
    let mut report = SpecMergeReport::default();

    for (n_idx_record, record) in externals.iter().enumerate() {
        let if_has_hu = record
            .get(C_COL_HU)
            .is_some_and(|value| !convert_json_value(value).is_none());
        if !if_has_hu {
            debug!(record = n_idx_record, "skipping external record without hu");
            report.cnt_skipped += 1;
            continue;
        }

        let l_cols_idx: Vec<usize> = record.keys().map(|key| table.ensure_column(key)).collect();
        let mut row = vec![EnumCellValue::None; table.width()];
        for (n_idx_col, value) in l_cols_idx.into_iter().zip(record.values()) {
            row[n_idx_col] = convert_json_value(value);
        }
        table.rows.push(row);
        report.cnt_appended += 1;
    }

    report.cnt_duplicates_removed = dedupe_rows(&mut table);
    debug!(
        appended = report.cnt_appended,
        skipped = report.cnt_skipped,
        duplicates = report.cnt_duplicates_removed,
        "merged external records"
    );
    (table, report)
}

/// Drop rows equal to an earlier row across all columns. Returns the number dropped.
pub fn dedupe_rows(table: &mut SpecTable) -> usize {
    let l_rows = std::mem::take(&mut table.rows);
    let n_rows_before = l_rows.len();

    let mut set_seen: HashSet<Vec<EnumCellValue>> = HashSet::with_capacity(n_rows_before);
    let mut l_rows_unique = Vec::with_capacity(n_rows_before);
    for row in l_rows {
        if set_seen.insert(row.clone()) {
            l_rows_unique.push(row);
        }
    }

    table.rows = l_rows_unique;
    n_rows_before - table.rows.len()
}

/// Stable ascending sort by `column`, nulls last.
///
/// Returns `false` (table unchanged) when the column does not exist.
pub fn sort_rows_by_column(table: &mut SpecTable, column: &str) -> bool {
    let Some(n_idx_col) = table.column_index(column) else {
        warn!(column, "sort column not present; keeping merge order");
        return false;
    };
    table
        .rows
        .sort_by(|a, b| a[n_idx_col].cmp_for_sort(&b[n_idx_col]));
    true
}

//! Enrichment orchestrator.
//!
//! `received -> parsing -> fetching -> merging -> enriching -> sorting`; the
//! first two transitions may end the pass with a failure status.

use fleetkit_table::{
    EnumCellValue, SpecTable, encode_transfer_table, load_table_from_bytes,
    merge_external_records, sort_rows_by_column,
};
use tracing::{info, warn};

use crate::api::FleetApi;
use crate::color::ColorResolver;
use crate::spec::{
    EnrichError, SpecBearerToken, SpecEnrichOptions, SpecEnrichReport, SpecEnrichResponse,
};

/// Run one enrichment pass and map the outcome onto a tagged response.
pub fn enrich<A: FleetApi + ?Sized>(
    csv_bytes: &[u8],
    api: &A,
    token: &SpecBearerToken,
    options: &SpecEnrichOptions,
) -> SpecEnrichResponse {
    match enrich_table(csv_bytes, api, token, options) {
        Ok((table, _)) => SpecEnrichResponse::success(encode_transfer_table(&table)),
        Err(err) => {
            let status = err.status();
            warn!(status = %status, error = %err, "enrichment failed");
            SpecEnrichResponse::failure(status)
        }
    }
}

/// Load, merge, color and sort; returns the enriched table and its counters.
pub fn enrich_table<A: FleetApi + ?Sized>(
    csv_bytes: &[u8],
    api: &A,
    token: &SpecBearerToken,
    options: &SpecEnrichOptions,
) -> Result<(SpecTable, SpecEnrichReport), EnrichError> {
    info!(bytes = csv_bytes.len(), "received upload");
    let table_base = load_table_from_bytes(csv_bytes, options.delimiter)?;
    info!(rows = table_base.height(), cols = table_base.width(), "parsed upload");

    let l_externals = api.fetch_active_resources(token)?;
    info!(records = l_externals.len(), "fetched active resources");

    let (mut table, report_merge) = merge_external_records(table_base, &l_externals);
    info!(
        rows = table.height(),
        appended = report_merge.cnt_appended,
        skipped = report_merge.cnt_skipped,
        duplicates = report_merge.cnt_duplicates_removed,
        "merged"
    );

    let cnt_label_lookups = apply_color_codes(&mut table, api, token, options);
    info!(lookups = cnt_label_lookups, "resolved label colors");

    sort_rows_by_column(&mut table, &options.col_sort);

    let report = SpecEnrichReport {
        merge: report_merge,
        cnt_label_lookups,
        cnt_rows: table.height(),
    };
    Ok((table, report))
}

fn apply_color_codes<A: FleetApi + ?Sized>(
    table: &mut SpecTable,
    api: &A,
    token: &SpecBearerToken,
    options: &SpecEnrichOptions,
) -> usize {
    let mut resolver = ColorResolver::new(api, token);
    let l_colors: Vec<Option<String>> = match table.column_index(&options.col_label_ids) {
        Some(n_idx_label) => table
            .rows()
            .iter()
            .map(|row| resolver.resolve_cell(&row[n_idx_label]))
            .collect(),
        None => {
            warn!(
                column = %options.col_label_ids,
                "label column not present; all colors left empty"
            );
            vec![None; table.height()]
        }
    };

    let n_idx_color = table.ensure_column(&options.col_color_code);
    for (n_idx_row, color) in l_colors.into_iter().enumerate() {
        let value = color.map_or(EnumCellValue::None, EnumCellValue::String);
        table.set_value(n_idx_row, n_idx_color, value);
    }
    resolver.lookup_count()
}

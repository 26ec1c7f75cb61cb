mod cli;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use fleetkit_enrich::{
    EnumResponseStatus, HttpFleetApi, LocalTransport, SpecBearerToken, SpecEnrichOptions,
    SpecFleetApiOptions, Transport,
};
use fleetkit_table::{C_COL_LABEL_IDS, decode_transfer_table};
use fleetkit_xlsx::{SpecExportReport, export_styled_table, resolve_tint_rule, style_table};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::Cli;

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => {
            println!("{}", report.path_file_out.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<SpecExportReport> {
    let token = SpecBearerToken::new(cli.token.clone());
    if token.is_empty() {
        bail!("bearer token is empty");
    }

    let v_bytes =
        fs::read(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;
    info!(input = %cli.input.display(), bytes = v_bytes.len(), "uploading inventory");

    let api = HttpFleetApi::new(SpecFleetApiOptions {
        base_url: cli.api_base.clone(),
        timeout_ms: cli.timeout_ms,
        ..SpecFleetApiOptions::default()
    })
    .context("building fleet API client")?;
    let transport = LocalTransport::new(api, token, SpecEnrichOptions::default());

    run_with_transport(cli, &v_bytes, &transport, Local::now().naive_local())
}

fn run_with_transport(
    cli: &Cli,
    v_bytes: &[u8],
    transport: &impl Transport,
    now: NaiveDateTime,
) -> Result<SpecExportReport> {
    let response = transport.send(v_bytes);
    let c_payload = match response.status {
        EnumResponseStatus::Success => response
            .payload
            .context("success response carried no table")?,
        EnumResponseStatus::Error => bail!("enrichment failed; see the log above for the cause"),
        EnumResponseStatus::CsvParsingError => {
            bail!("{} is not a valid inventory CSV", cli.input.display())
        }
        EnumResponseStatus::Unknown(tag) => bail!("unexpected response status {tag:?}"),
    };
    let table = decode_transfer_table(&c_payload).context("decoding enriched table")?;
    info!(rows = table.height(), cols = table.width(), "received enriched table");

    let l_keys = cli.selected_keys();
    let if_apply_tint_rule =
        resolve_tint_rule(cli.tint.into(), l_keys.as_deref(), C_COL_LABEL_IDS);

    let styled = style_table(&table, cli.colored, if_apply_tint_rule, now.date());
    let report = export_styled_table(&styled, l_keys.as_deref(), &cli.out_dir, now)
        .context("exporting workbook")?;

    for c_warning in &report.warnings {
        warn!("{c_warning}");
    }
    Ok(report)
}

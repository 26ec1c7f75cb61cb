use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use fleetkit_enrich::conf::{C_API_BASE_URL_DEFAULT, N_API_TIMEOUT_MS_DEFAULT};
use fleetkit_xlsx::EnumTintPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "fleetkit",
    version,
    about = "Merge a vehicle inventory CSV with the fleet API and export a colored workbook"
)]
pub struct Cli {
    #[arg(long, default_value = "vehicles.csv", help = "Inventory CSV to upload")]
    pub input: PathBuf,
    #[arg(
        short = 'k',
        long = "keys",
        value_delimiter = ',',
        help = "Columns to export, in order (comma separated, repeatable)"
    )]
    pub keys: Vec<String>,
    #[arg(
        short = 'c',
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Color rows by inspection date freshness"
    )]
    pub colored: bool,
    #[arg(long, value_enum, default_value_t = TintArg::Auto, help = "Label tint policy")]
    pub tint: TintArg,
    #[arg(long, default_value = ".", help = "Directory receiving the workbook")]
    pub out_dir: PathBuf,
    #[arg(long, env = "FLEETKIT_API_BASE", default_value = C_API_BASE_URL_DEFAULT)]
    pub api_base: String,
    #[arg(long, env = "FLEETKIT_TOKEN", hide_env_values = true, help = "Bearer token")]
    pub token: String,
    #[arg(long, default_value_t = N_API_TIMEOUT_MS_DEFAULT, help = "HTTP timeout in milliseconds")]
    pub timeout_ms: u64,
}

impl Cli {
    /// Explicit column selection; `None` exports every column.
    pub fn selected_keys(&self) -> Option<Vec<String>> {
        let l_keys: Vec<String> = self
            .keys
            .iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        if l_keys.is_empty() { None } else { Some(l_keys) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TintArg {
    Auto,
    Always,
    Never,
}

impl From<TintArg> for EnumTintPolicy {
    fn from(value: TintArg) -> Self {
        match value {
            TintArg::Auto => EnumTintPolicy::Auto,
            TintArg::Always => EnumTintPolicy::Always,
            TintArg::Never => EnumTintPolicy::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let cli = Cli::try_parse_from(["fleetkit", "--token", "t"]).expect("parse");
        assert_eq!(cli.input, PathBuf::from("vehicles.csv"));
        assert!(cli.colored);
        assert_eq!(cli.tint, TintArg::Auto);
        assert_eq!(cli.selected_keys(), None);
        assert_eq!(cli.timeout_ms, N_API_TIMEOUT_MS_DEFAULT);
    }

    #[test]
    fn keys_are_split_and_repeatable() {
        let cli = Cli::try_parse_from([
            "fleetkit", "--token", "t", "-k", "rnr,hu", "--keys", "labelIds", "-c", "false",
            "--tint", "never",
        ])
        .expect("parse");
        assert_eq!(
            cli.selected_keys(),
            Some(vec![
                "rnr".to_string(),
                "hu".to_string(),
                "labelIds".to_string()
            ])
        );
        assert!(!cli.colored);
        assert_eq!(EnumTintPolicy::from(cli.tint), EnumTintPolicy::Never);
    }
}

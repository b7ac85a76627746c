use crate::strategy::ReplayConfig;
use crate::types::{DeleteCascade, LedgerConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay a banking operation script and print the resulting accounts
#[derive(Parser, Debug)]
#[command(name = "banking-ledger")]
#[command(about = "Replay a banking operation script against an in-memory ledger", long_about = None)]
pub struct CliArgs {
    /// Operation script to replay
    #[arg(value_name = "INPUT", help = "Path to the operation script (CSV)")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for in-order or 'async' for batched concurrent replay"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads for concurrent groups (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for concurrent account groups (default: CPU cores)"
    )]
    pub max_concurrent_groups: Option<usize>,

    #[arg(
        long = "delete-cascade",
        value_name = "MODE",
        value_enum,
        default_value_t = DeleteCascade::DepositWithdrawOnly,
        help = "Ledger rows flagged when an account is closed"
    )]
    pub delete_cascade: DeleteCascade,

    /// Also write every ledger row to this file
    #[arg(long = "ledger-out", value_name = "PATH")]
    pub ledger_out: Option<PathBuf>,

    /// Log filter, e.g. `info` or `rust_banking_ledger=debug`; defaults to RUST_LOG
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Replay settings for the async strategy, defaults where unset
    pub fn to_replay_config(&self) -> ReplayConfig {
        if self.batch_size.is_none() && self.max_concurrent_groups.is_none() {
            return ReplayConfig::default();
        }

        let default = ReplayConfig::default();
        ReplayConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent_groups
                .unwrap_or(default.max_concurrent_groups),
        )
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig::new(self.delete_cascade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::default(&["program", "input.csv"], DeleteCascade::DepositWithdrawOnly)]
    #[case::none(&["program", "--delete-cascade", "none", "input.csv"], DeleteCascade::None)]
    #[case::all(&["program", "--delete-cascade", "all", "input.csv"], DeleteCascade::All)]
    #[case::explicit_default(
        &["program", "--delete-cascade", "deposit-withdraw-only", "input.csv"],
        DeleteCascade::DepositWithdrawOnly
    )]
    fn test_delete_cascade_parsing(#[case] args: &[&str], #[case] expected: DeleteCascade) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.delete_cascade, expected);
        assert_eq!(parsed.ledger_config().delete_cascade, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(&["program", "--max-concurrent", "0", "input.csv"], 1000, num_cpus::get())]
    fn test_replay_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_replay_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_groups, expected_max_concurrent);
    }

    #[test]
    fn test_optional_outputs() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--ledger-out",
            "ledger.csv",
            "--log-level",
            "debug",
            "input.csv",
        ])
        .unwrap();

        assert_eq!(parsed.ledger_out, Some(PathBuf::from("ledger.csv")));
        assert_eq!(parsed.log_level.as_deref(), Some("debug"));
        assert_eq!(parsed.input_file, PathBuf::from("input.csv"));
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::invalid_cascade(&["program", "--delete-cascade", "some", "input.csv"])]
    #[case::negative_batch(&["program", "--batch-size", "-1", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}

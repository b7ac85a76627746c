//! Rust Banking Ledger CLI
//!
//! Replays an operation script against an empty ledger and prints the final
//! account states as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > accounts.csv
//! cargo run -- --strategy sync operations.csv > accounts.csv
//! cargo run -- --batch-size 2000 --max-concurrent 8 operations.csv > accounts.csv
//! cargo run -- --delete-cascade all --ledger-out ledger.csv operations.csv
//! RUST_LOG=info cargo run -- operations.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success (rejected operations and malformed rows do not change this)
//! - 1: The script could not be read or the output could not be written

use rust_banking_ledger::cli::{self, CliArgs, StrategyType};
use rust_banking_ledger::core::BankEngine;
use rust_banking_ledger::io::{write_accounts_csv, write_ledger_csv};
use rust_banking_ledger::types::BankError;
use rust_banking_ledger::{logging, strategy};
use std::fs::File;
use std::process;
use std::sync::Arc;

fn main() {
    let args = cli::parse_args();
    logging::init(args.log_level.as_deref());

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), BankError> {
    let engine = Arc::new(BankEngine::with_config(args.ledger_config()));

    let config = match args.strategy {
        StrategyType::Async => Some(args.to_replay_config()),
        StrategyType::Sync => None,
    };
    let strategy = strategy::create_strategy(args.strategy, config);
    strategy.process(&args.input_file, &engine)?;

    let mut output = std::io::stdout();
    write_accounts_csv(&engine.accounts().all(), &mut output)?;

    if let Some(path) = &args.ledger_out {
        let mut file = File::create(path)?;
        write_ledger_csv(&engine.ledger().all(), &mut file)?;
    }

    Ok(())
}

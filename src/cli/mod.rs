//! Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, StrategyType};

use clap::Parser;

/// Parse command-line arguments
///
/// On invalid arguments or `--help`, clap prints its message and exits.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

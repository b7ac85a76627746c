//! Replay strategies for operation scripts
//!
//! A strategy reads an operation script and applies every well-formed row to
//! a shared [`BankEngine`]. Strategies differ only in how they schedule the
//! work; for the same script they leave the same balances behind.

use crate::cli::StrategyType;
use crate::core::BankEngine;
use crate::types::BankError;
use std::path::Path;
use std::sync::Arc;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, ReplayConfig};
pub use sync::SyncProcessingStrategy;

/// Counts collected while replaying a script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Operations the engine accepted
    pub applied: usize,

    /// Operations the engine rejected
    pub rejected: usize,

    /// Rows that could not be turned into an operation
    pub skipped: usize,
}

impl ReplaySummary {
    pub(crate) fn record(&mut self, result: &Result<String, BankError>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

/// A complete replay pipeline: script parsing plus application
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the script at `input_path` against `engine`
    ///
    /// Malformed rows and rejected operations are logged and counted; they
    /// never stop the replay.
    ///
    /// # Errors
    ///
    /// Returns an error only when the script cannot be read at all
    /// (`FileNotFound`, `IoError`) or the runtime cannot start.
    fn process(&self, input_path: &Path, engine: &Arc<BankEngine>)
        -> Result<ReplaySummary, BankError>;
}

/// Create a replay strategy
///
/// `config` only applies to the async strategy; `None` means defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<ReplayConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(config.unwrap_or_default())),
    }
}

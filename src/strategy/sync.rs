//! Synchronous replay strategy
//!
//! Streams the script one row at a time through [`SyncReader`] and applies
//! each operation in file order on the calling thread. Memory use depends on
//! the ledger's size, not the script's.

use crate::core::BankEngine;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, ReplaySummary};
use crate::types::BankError;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Synchronous, single-threaded replay
///
/// ```no_run
/// use rust_banking_ledger::core::BankEngine;
/// use rust_banking_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let engine = Arc::new(BankEngine::new());
/// let summary = SyncProcessingStrategy
///     .process(Path::new("operations.csv"), &engine)
///     .expect("Replay failed");
/// println!("{} applied, {} rejected", summary.applied, summary.rejected);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        engine: &Arc<BankEngine>,
    ) -> Result<ReplaySummary, BankError> {
        let reader = SyncReader::new(input_path)?;
        let mut summary = ReplaySummary::default();

        for row in reader {
            match row {
                Ok(operation) => {
                    let result = engine.apply(&operation);
                    summary.record(&result);
                }
                Err(e) => {
                    warn!(error = %e, "skipping malformed row");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            skipped = summary.skipped,
            "sync replay finished"
        );
        Ok(summary)
    }
}

//! Asynchronous batch replay strategy
//!
//! Reads the script in batches with csv-async and hands each batch to the
//! [`BatchProcessor`], which runs account-disjoint groups on a tokio
//! multi-thread runtime.
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── ReplayConfig (batch_size, max_concurrent_groups)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (barrier segments + account partitioning)
//!         └── BankEngine (shared, per-account locking)
//! ```
//!
//! Batches are processed one after another, so an account's operations keep
//! their file order even when they span batches.

use crate::core::{BankEngine, BatchProcessor};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{ProcessingStrategy, ReplaySummary};
use crate::types::BankError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Batch size and worker count for the async strategy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Number of operations read per batch
    pub batch_size: usize,
    /// Worker threads available to concurrent groups
    pub max_concurrent_groups: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_groups: num_cpus::get(),
        }
    }
}

impl ReplayConfig {
    /// Create a config, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_groups: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "invalid batch_size 0, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_groups = if max_concurrent_groups == 0 {
            warn!(
                default = default.max_concurrent_groups,
                "invalid max_concurrent_groups 0, using default"
            );
            default.max_concurrent_groups
        } else {
            max_concurrent_groups
        };

        Self {
            batch_size,
            max_concurrent_groups,
        }
    }
}

/// Multi-threaded batch replay
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: ReplayConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay the script batch by batch
    ///
    /// 1. Start a tokio runtime with `max_concurrent_groups` workers
    /// 2. Read up to `batch_size` operations
    /// 3. Apply the batch through the `BatchProcessor` and wait for it
    /// 4. Repeat until the reader returns an empty batch
    fn process(
        &self,
        input_path: &Path,
        engine: &Arc<BankEngine>,
    ) -> Result<ReplaySummary, BankError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_groups)
            .build()?;

        runtime.block_on(async {
            let processor = BatchProcessor::new(Arc::clone(engine));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => BankError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => BankError::IoError {
                        message: format!("Failed to open file '{}': {}", input_path.display(), e),
                    },
                })?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut summary = ReplaySummary::default();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                debug!(size = batch.len(), "applying batch");
                for processed in processor.process_batch(batch).await {
                    summary.record(&processed.result);
                }
            }
            summary.skipped = reader.skipped();

            info!(
                applied = summary.applied,
                rejected = summary.rejected,
                skipped = summary.skipped,
                "async replay finished"
            );
            Ok(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_replay_config_zero_values_fall_back() {
        let config = ReplayConfig::new(0, 0);
        assert_eq!(config, ReplayConfig::default());

        let config = ReplayConfig::new(50, 2);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.max_concurrent_groups, 2);
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let strategy = AsyncProcessingStrategy::new(ReplayConfig::default());
        let engine = Arc::new(BankEngine::new());

        let result = strategy.process(Path::new("nonexistent.csv"), &engine);
        assert!(matches!(result, Err(BankError::FileNotFound { .. })));
    }

    #[test]
    fn test_async_strategy_keeps_order_across_batches() {
        // Batch size 2 splits each account's operations over several batches
        let file = create_temp_csv(
            "op,subject,target,amount,class,name\n\
             customer,,,6000,Current,Ada\n\
             customer,,,6000,Current,Grace\n\
             deposit,222200000001,,100,,\n\
             deposit,222200000002,,50,,\n\
             withdraw,222200000001,,1200,,\n\
             deposit,222200000002,,25,,\n\
             withdraw,222200000001,,100,,\n\
             transfer,222200000002,222200000001,75,,\n",
        );

        let strategy = AsyncProcessingStrategy::new(ReplayConfig::new(2, 4));
        let engine = Arc::new(BankEngine::new());
        let summary = strategy.process(file.path(), &engine).unwrap();

        // Ada's withdrawal of 1200 would leave 4900, below the Current minimum
        assert_eq!(summary.applied, 7);
        assert_eq!(summary.rejected, 1);

        let balance = |id| engine.accounts().get(id).unwrap().balance;
        assert_eq!(balance(222200000001), Decimal::new(6075, 0));
        assert_eq!(balance(222200000002), Decimal::new(6000, 0));
    }

    #[test]
    fn test_async_strategy_counts_skipped_rows() {
        let file = create_temp_csv(
            "op,subject,target,amount,class,name\n\
             customer,,,20000,Savings,Ada\n\
             deposit,222200000001,,abc,,\n\
             chargeback,222200000001,,,,\n\
             deposit,222200000001,,10,,\n",
        );

        let strategy = AsyncProcessingStrategy::new(ReplayConfig::default());
        let engine = Arc::new(BankEngine::new());
        let summary = strategy.process(file.path(), &engine).unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                applied: 2,
                rejected: 0,
                skipped: 2
            }
        );
    }
}

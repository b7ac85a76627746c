//! Asynchronous CSV reader with batch interface
//!
//! Reads an operation script in batches using csv-async, so the async
//! replay strategy can hand whole batches to the batch processor.
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (OperationRow, convert_operation_row)
//! ```
//!
//! Malformed rows are logged and skipped; [`AsyncReader::skipped`] counts them.

use crate::io::csv_format::{convert_operation_row, OperationRow};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` well-formed operations
    ///
    /// Returns an empty batch at end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut skipped = 0;
        let mut rows = self.csv_reader.deserialize::<OperationRow>();

        while batch.len() < batch_size {
            match rows.next().await {
                Some(Ok(row)) => match convert_operation_row(row) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => {
                        warn!(error = %e, "skipping malformed row");
                        skipped += 1;
                    }
                },
                Some(Err(e)) => {
                    warn!(error = %e, "skipping unparseable row");
                    skipped += 1;
                }
                None => break,
            }
        }

        drop(rows);
        self.skipped += skipped;
        batch
    }

    /// Number of rows skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

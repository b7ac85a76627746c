//! Batch processing with account-based partitioning for async replay
//!
//! This module provides the `BatchProcessor`, which applies a batch of script
//! operations concurrently while producing the same final balances as applying
//! them one by one in file order.
//!
//! # Design
//!
//! A batch is first cut into segments at barrier operations (creations,
//! deletions, reverts), whose account footprint is unknown until they run.
//! Barriers are applied alone, in order. The operations between two barriers
//! are partitioned into groups that share no account: two operations land in
//! the same group if they touch a common account, directly or through a chain
//! of other operations (union-find over account ids). Groups run concurrently
//! as tokio tasks; each group applies its operations sequentially in file
//! order.
//!
//! ```text
//! batch ──► segments ──► Barrier(op)            applied inline
//!                    └─► Concurrent(ops) ──► groups ──► one tokio task each
//! ```
//!
//! # Transaction ids
//!
//! Groups take ledger ids in whatever order they finish. Once every group of
//! a segment is done, the segment's ids are handed back out in file order
//! (see [`TransactionLedger::reorder_ids`]). A group's accounts are touched
//! by nobody else, so the same operations succeed as in a sequential replay
//! and the renumbered ids match it exactly. A later `revert` row therefore
//! finds the same transfer under either strategy.
//!
//! [`TransactionLedger::reorder_ids`]: crate::core::TransactionLedger::reorder_ids

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::BankEngine;
use crate::types::{AccountId, Applied, BankError, Operation, TransactionId};
use tracing::error;

/// Result of applying a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was applied
    pub operation: Operation,

    /// Confirmation message or rejection
    pub result: Result<String, BankError>,

    /// Ledger id the operation wrote, if any
    pub transaction: Option<TransactionId>,
}

impl ProcessingResult {
    fn new(operation: Operation, outcome: Result<Applied, BankError>) -> Self {
        let transaction = outcome.as_ref().ok().and_then(|applied| applied.transaction);
        ProcessingResult {
            operation,
            result: outcome.map(|applied| applied.message),
            transaction,
        }
    }
}

/// A run of operations that can be scheduled together
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Must run alone, after everything before it and before everything after it
    Barrier(Operation),

    /// Operations with known account footprints, safe to partition
    Concurrent(Vec<Operation>),
}

/// Batch processor with account-based partitioning
///
/// Cloneable; every clone shares the same engine.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: Arc<BankEngine>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<BankEngine>) -> Self {
        Self { engine }
    }

    /// Cut a batch into segments at barrier operations
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one segment
    /// - Segments, and operations within them, keep file order
    /// - No `Concurrent` segment is empty
    pub fn segment(batch: Vec<Operation>) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut pending = Vec::new();

        for operation in batch {
            if operation.is_barrier() {
                if !pending.is_empty() {
                    segments.push(Segment::Concurrent(std::mem::take(&mut pending)));
                }
                segments.push(Segment::Barrier(operation));
            } else {
                pending.push(operation);
            }
        }
        if !pending.is_empty() {
            segments.push(Segment::Concurrent(pending));
        }

        segments
    }

    /// Partition operations into groups that share no account
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one group
    /// - Operations touching a common account are in the same group
    /// - Operations keep their relative order within a group
    /// - Groups are ordered by their first operation
    pub fn partition_by_accounts(operations: Vec<Operation>) -> Vec<Vec<Operation>> {
        let groups = Self::partition_indices(&operations);
        take_groups(&groups, operations)
    }

    /// Same partition as [`partition_by_accounts`](Self::partition_by_accounts),
    /// as positions into `operations`
    fn partition_indices(operations: &[Operation]) -> Vec<Vec<usize>> {
        let mut parent: Vec<usize> = (0..operations.len()).collect();
        let mut owner: HashMap<AccountId, usize> = HashMap::new();

        for (index, operation) in operations.iter().enumerate() {
            for account in operation.footprint().unwrap_or_default() {
                match owner.get(&account) {
                    Some(&other) => union(&mut parent, index, other),
                    None => {
                        owner.insert(account, index);
                    }
                }
            }
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        for index in 0..operations.len() {
            let root = find(&mut parent, index);
            let slot = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(index);
        }

        groups
    }

    /// Apply a group's operations sequentially, in order
    ///
    /// Rejections are captured in the results and do not stop the group.
    pub async fn process_group(&self, operations: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            let outcome = self.engine.execute(&operation);
            results.push(ProcessingResult::new(operation, outcome));
        }

        results
    }

    /// Apply a batch: barriers inline, everything else in concurrent groups
    ///
    /// Results come back in file order, and transaction ids match a
    /// sequential replay of the same batch. The processor must be the only
    /// writer to the engine while this runs.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut results = Vec::new();

        for segment in Self::segment(batch) {
            match segment {
                Segment::Barrier(operation) => {
                    let outcome = self.engine.execute(&operation);
                    results.push(ProcessingResult::new(operation, outcome));
                }
                Segment::Concurrent(operations) => {
                    results.extend(self.process_segment(operations).await);
                }
            }
        }

        results
    }

    async fn process_segment(&self, operations: Vec<Operation>) -> Vec<ProcessingResult> {
        let positions = Self::partition_indices(&operations);
        let mut slots: Vec<Option<ProcessingResult>> = vec![None; operations.len()];

        let mut tasks = Vec::with_capacity(positions.len());
        for (indices, group) in positions.iter().zip(take_groups(&positions, operations)) {
            let processor = self.clone();
            let task = tokio::spawn(async move { processor.process_group(group).await });
            tasks.push((indices, task));
        }

        for (indices, task) in tasks {
            match task.await {
                Ok(group_results) => {
                    for (&index, processed) in indices.iter().zip(group_results) {
                        slots[index] = Some(processed);
                    }
                }
                Err(e) => error!(error = ?e, "replay task panicked"),
            }
        }

        let mut results: Vec<ProcessingResult> = slots.into_iter().flatten().collect();
        if positions.len() > 1 {
            self.renumber_in_file_order(&mut results);
        }
        results
    }

    fn renumber_in_file_order(&self, results: &mut [ProcessingResult]) {
        let in_order: Vec<TransactionId> =
            results.iter().filter_map(|processed| processed.transaction).collect();
        let renumbered = self.engine.ledger().reorder_ids(&in_order);

        for processed in results.iter_mut() {
            if let Some(id) = processed.transaction.as_mut() {
                if let Some(&new_id) = renumbered.get(id) {
                    *id = new_id;
                }
            }
        }
    }
}

/// Move operations into the groups described by `positions`
fn take_groups(positions: &[Vec<usize>], operations: Vec<Operation>) -> Vec<Vec<Operation>> {
    let mut pending: Vec<Option<Operation>> = operations.into_iter().map(Some).collect();
    positions
        .iter()
        .map(|indices| {
            indices
                .iter()
                .filter_map(|&index| pending[index].take())
                .collect()
        })
        .collect()
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

/// Merge two sets, keeping the smaller index as root
fn union(parent: &mut [usize], a: usize, b: usize) {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a < root_b {
        parent[root_b] = root_a;
    } else if root_b < root_a {
        parent[root_a] = root_b;
    }
}

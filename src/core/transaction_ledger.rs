//! Append-only transaction ledger
//!
//! The ledger owns every [`LedgerEntry`] and hands out transaction ids. Rows
//! are never edited or removed; the only mutation is flipping the soft-delete
//! flag when an account is closed.
//!
//! # Id allocation
//!
//! The next id is one past the highest id ever written, or
//! [`TRANSACTION_ID_BASE`] for an empty ledger. Allocation and the append
//! that uses it happen under the same write lock, so ids are unique and a
//! transfer's two rows always share theirs.
//!
//! Concurrent writers take ids in the order they finish. Async replay calls
//! [`TransactionLedger::reorder_ids`] once a concurrent segment is done so
//! the segment's ids follow file order, as they would in a sequential replay.

use crate::types::{
    AccountId, DeleteCascade, EntryType, LedgerEntry, TransactionId, TRANSACTION_ID_BASE,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
struct LedgerInner {
    rows: Vec<LedgerEntry>,
    next_id: TransactionId,
}

#[derive(Debug)]
pub struct TransactionLedger {
    inner: RwLock<LedgerInner>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                rows: Vec::new(),
                next_id: TRANSACTION_ID_BASE,
            }),
        }
    }

    /// Id the next append will receive
    pub fn next_id(&self) -> TransactionId {
        self.inner.read().next_id
    }

    /// Append a single-row operation (deposit, withdrawal, opening deposit)
    ///
    /// # Returns
    ///
    /// The transaction id allocated for the row.
    pub fn append(
        &self,
        account: AccountId,
        entry_type: EntryType,
        amount: Decimal,
        description: String,
        now: DateTime<Utc>,
    ) -> TransactionId {
        let mut inner = self.inner.write();
        let transaction_id = inner.next_id;
        inner.next_id += 1;

        inner.rows.push(LedgerEntry {
            transaction_id,
            account,
            entry_type,
            amount,
            created_at: now,
            description,
            deleted: false,
        });

        transaction_id
    }

    /// Append the two legs of a transfer under one transaction id
    ///
    /// Writes a `Withdraw` row against `sender` and a `Deposit` row against
    /// `receiver`, both for `amount`.
    pub fn append_transfer_pair(
        &self,
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> TransactionId {
        let mut inner = self.inner.write();
        let transaction_id = inner.next_id;
        inner.next_id += 1;

        inner.rows.push(LedgerEntry {
            transaction_id,
            account: sender,
            entry_type: EntryType::Withdraw,
            amount,
            created_at: now,
            description: format!(
                "{:.2} debited. Transferred to account id {}",
                amount, receiver
            ),
            deleted: false,
        });
        inner.rows.push(LedgerEntry {
            transaction_id,
            account: receiver,
            entry_type: EntryType::Deposit,
            amount,
            created_at: now,
            description: format!(
                "{:.2} credited. Received from account id {}",
                amount, sender
            ),
            deleted: false,
        });

        transaction_id
    }

    /// Reassign a block of ids so they ascend in `in_order`
    ///
    /// `in_order` lists transaction ids in the order their operations were
    /// issued. The same set of ids is handed back out in ascending order:
    /// the first listed transaction gets the smallest id, and so on. Rows from
    /// the smallest listed id onward are then re-sorted by id, keeping a
    /// transfer's withdraw leg ahead of its deposit leg.
    ///
    /// Only meaningful while the listed ids are the newest in the ledger and
    /// nothing else is appending.
    ///
    /// # Returns
    ///
    /// Old id to new id, for every id that changed.
    pub fn reorder_ids(
        &self,
        in_order: &[TransactionId],
    ) -> HashMap<TransactionId, TransactionId> {
        let mut ascending = in_order.to_vec();
        ascending.sort_unstable();

        let renumbered: HashMap<TransactionId, TransactionId> = in_order
            .iter()
            .copied()
            .zip(ascending.iter().copied())
            .filter(|(old, new)| old != new)
            .collect();
        if renumbered.is_empty() {
            return renumbered;
        }
        let lowest = ascending[0];

        let mut inner = self.inner.write();
        let start = inner
            .rows
            .iter()
            .position(|row| row.transaction_id >= lowest)
            .unwrap_or(inner.rows.len());
        let tail = &mut inner.rows[start..];
        for row in tail.iter_mut() {
            if let Some(&new_id) = renumbered.get(&row.transaction_id) {
                row.transaction_id = new_id;
            }
        }
        tail.sort_by_key(|row| row.transaction_id);

        renumbered
    }

    /// Live rows carrying `transaction_id`
    pub fn rows_for(&self, transaction_id: TransactionId) -> Vec<LedgerEntry> {
        self.inner
            .read()
            .rows
            .iter()
            .filter(|row| row.transaction_id == transaction_id && !row.deleted)
            .cloned()
            .collect()
    }

    /// Run `f` against the full row list (deleted rows included) under a read lock
    pub fn read<R>(&self, f: impl FnOnce(&[LedgerEntry]) -> R) -> R {
        f(&self.inner.read().rows)
    }

    /// Copy of every row, deleted included, in append order
    pub fn all(&self) -> Vec<LedgerEntry> {
        self.read(|rows| rows.to_vec())
    }

    /// Flag an account's rows as deleted according to `cascade`
    ///
    /// # Returns
    ///
    /// The number of rows newly flagged.
    pub fn flag_deleted(&self, account: AccountId, cascade: DeleteCascade) -> usize {
        if cascade == DeleteCascade::None {
            return 0;
        }

        let mut inner = self.inner.write();
        let transfers = transfer_ids(&inner.rows);

        let mut flagged = 0;
        for row in inner.rows.iter_mut() {
            if row.account != account || row.deleted {
                continue;
            }
            let selected = match cascade {
                DeleteCascade::All => true,
                DeleteCascade::DepositWithdrawOnly => !transfers.contains(&row.transaction_id),
                DeleteCascade::None => false,
            };
            if selected {
                row.deleted = true;
                flagged += 1;
            }
        }

        flagged
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }
}

impl Default for TransactionLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids shared by more than one row, i.e. transfers
pub fn transfer_ids(rows: &[LedgerEntry]) -> HashSet<TransactionId> {
    let mut counts: HashMap<TransactionId, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.transaction_id).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const A: AccountId = 222200000001;
    const B: AccountId = 222200000002;

    fn deposit(ledger: &TransactionLedger, account: AccountId, amount: i64) -> TransactionId {
        ledger.append(
            account,
            EntryType::Deposit,
            Decimal::new(amount, 0),
            format!("Account Id {} credited with {}", account, amount),
            Utc::now(),
        )
    }

    #[test]
    fn test_first_id_is_base() {
        let ledger = TransactionLedger::new();
        assert_eq!(ledger.next_id(), TRANSACTION_ID_BASE);
        assert_eq!(deposit(&ledger, A, 100), 111100000001);
        assert_eq!(deposit(&ledger, A, 100), 111100000002);
        assert_eq!(ledger.next_id(), 111100000003);
    }

    #[test]
    fn test_transfer_pair_shares_one_id() {
        let ledger = TransactionLedger::new();
        deposit(&ledger, A, 20_000);

        let id = ledger.append_transfer_pair(A, B, Decimal::new(1000, 0), Utc::now());
        assert_eq!(id, 111100000002);

        let rows = ledger.rows_for(id);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account, A);
        assert_eq!(rows[0].entry_type, EntryType::Withdraw);
        assert_eq!(rows[1].account, B);
        assert_eq!(rows[1].entry_type, EntryType::Deposit);
        assert_eq!(rows[0].amount, rows[1].amount);
        assert_eq!(
            rows[0].description,
            "1000.00 debited. Transferred to account id 222200000002"
        );
    }

    #[test]
    fn test_rows_for_unknown_id_is_empty() {
        let ledger = TransactionLedger::new();
        assert!(ledger.rows_for(111100000001).is_empty());
    }

    #[test]
    fn test_flag_deleted_deposit_withdraw_only_keeps_transfers() {
        let ledger = TransactionLedger::new();
        let opening = deposit(&ledger, A, 20_000);
        let transfer = ledger.append_transfer_pair(A, B, Decimal::new(1000, 0), Utc::now());

        let flagged = ledger.flag_deleted(A, DeleteCascade::DepositWithdrawOnly);
        assert_eq!(flagged, 1);
        assert!(ledger.rows_for(opening).is_empty());
        assert_eq!(ledger.rows_for(transfer).len(), 2);
    }

    #[test]
    fn test_flag_deleted_all_flags_transfer_leg() {
        let ledger = TransactionLedger::new();
        deposit(&ledger, A, 20_000);
        let transfer = ledger.append_transfer_pair(A, B, Decimal::new(1000, 0), Utc::now());

        let flagged = ledger.flag_deleted(A, DeleteCascade::All);
        assert_eq!(flagged, 2);

        // Receiver leg survives on its own
        let rows = ledger.rows_for(transfer);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account, B);
    }

    #[test]
    fn test_flag_deleted_none_is_noop() {
        let ledger = TransactionLedger::new();
        deposit(&ledger, A, 20_000);
        assert_eq!(ledger.flag_deleted(A, DeleteCascade::None), 0);
        assert!(ledger.all().iter().all(|row| !row.deleted));
    }

    #[test]
    fn test_ids_never_reused_after_flagging() {
        let ledger = TransactionLedger::new();
        deposit(&ledger, A, 100);
        ledger.flag_deleted(A, DeleteCascade::All);
        assert_eq!(deposit(&ledger, B, 100), 111100000002);
    }

    #[test]
    fn test_reorder_ids_follows_issue_order() {
        let ledger = TransactionLedger::new();
        let opening = deposit(&ledger, A, 20_000);

        // Finished out of order: the transfer was issued first
        let late_deposit = deposit(&ledger, B, 7);
        let transfer = ledger.append_transfer_pair(A, B, Decimal::new(1000, 0), Utc::now());
        assert_eq!((late_deposit, transfer), (111100000002, 111100000003));

        let renumbered = ledger.reorder_ids(&[transfer, late_deposit]);
        assert_eq!(renumbered.len(), 2);
        assert_eq!(renumbered[&transfer], 111100000002);
        assert_eq!(renumbered[&late_deposit], 111100000003);

        let rows = ledger.all();
        let ids: Vec<TransactionId> = rows.iter().map(|row| row.transaction_id).collect();
        assert_eq!(ids, vec![opening, 111100000002, 111100000002, 111100000003]);
        assert_eq!(rows[1].entry_type, EntryType::Withdraw);
        assert_eq!(rows[2].entry_type, EntryType::Deposit);
        assert_eq!(rows[3].amount, Decimal::new(7, 0));

        // Allocation carries on past the block
        assert_eq!(ledger.next_id(), 111100000004);
    }

    #[test]
    fn test_reorder_ids_in_order_is_noop() {
        let ledger = TransactionLedger::new();
        let first = deposit(&ledger, A, 1);
        let second = deposit(&ledger, B, 2);

        assert!(ledger.reorder_ids(&[first, second]).is_empty());
        assert!(ledger.reorder_ids(&[]).is_empty());
        assert_eq!(ledger.all()[0].account, A);
    }

    #[test]
    fn test_concurrent_appends_allocate_unique_ids() {
        let ledger = Arc::new(TransactionLedger::new());

        let mut handles = vec![];
        for i in 0..4u64 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                for _ in 0..250 {
                    deposit(&ledger, A + i, 1);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let ids: HashSet<TransactionId> =
            ledger.all().iter().map(|row| row.transaction_id).collect();
        assert_eq!(ids.len(), 1000);
        assert_eq!(ledger.next_id(), TRANSACTION_ID_BASE + 1000);
    }
}

//! Thread-safe account storage
//!
//! Accounts live in a `DashMap` keyed by account number. Each value is an
//! `Arc<Mutex<Account>>`: the map only hands out the handle, and every
//! mutation happens under the account's own lock. That gives per-account
//! serialization without holding a map shard lock across a whole operation.
//!
//! # Lock order
//!
//! Callers that need two accounts (transfers) must lock them in ascending
//! account number order. See [`AccountStore::lock_pair`].

use crate::types::{Account, AccountId, ACCOUNT_ID_BASE};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, lockable account record
pub type AccountHandle = Arc<Mutex<Account>>;

#[derive(Debug)]
pub struct AccountStore {
    accounts: DashMap<AccountId, AccountHandle>,
    next_id: AtomicU64,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicU64::new(ACCOUNT_ID_BASE),
        }
    }

    /// Reserve the next account number
    ///
    /// Numbers are never reused, even if the account that reserved one is
    /// never inserted.
    pub fn allocate_id(&self) -> AccountId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Store a new account record and run `f` while holding its lock
    ///
    /// The handle is published already locked: anyone who finds the account
    /// waits until `f` returns, so `f` can write the opening ledger row
    /// without the account ever being seen without it.
    pub fn insert_with<R>(&self, account: Account, f: impl FnOnce(&mut Account) -> R) -> R {
        let id = account.id;
        let handle = Arc::new(Mutex::new(account));

        let mut guard = handle.lock();
        self.accounts.insert(id, Arc::clone(&handle));
        f(&mut guard)
    }

    /// Handle for an account, live or deleted
    ///
    /// The handle is cloned out so the map shard is released before the
    /// caller locks the account.
    pub fn handle(&self, id: AccountId) -> Option<AccountHandle> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Copy of an account record, live or deleted
    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.handle(id).map(|handle| handle.lock().clone())
    }

    /// Lock two distinct accounts in ascending id order
    ///
    /// Returns the guards as `(first, second)` matching the argument order,
    /// not the locking order.
    pub fn lock_pair<'a>(
        first: &'a AccountHandle,
        first_id: AccountId,
        second: &'a AccountHandle,
        second_id: AccountId,
    ) -> (MutexGuard<'a, Account>, MutexGuard<'a, Account>) {
        if first_id < second_id {
            let a = first.lock();
            let b = second.lock();
            (a, b)
        } else {
            let b = second.lock();
            let a = first.lock();
            (a, b)
        }
    }

    /// Copies of every account (deleted included), sorted by account number
    pub fn all(&self) -> Vec<Account> {
        let handles: Vec<AccountHandle> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = handles.iter().map(|h| h.lock().clone()).collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PolicyCatalog;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::thread;

    fn open(store: &AccountStore, balance: i64) -> AccountId {
        let policy = PolicyCatalog::new().resolve("Current").unwrap();
        let id = store.allocate_id();
        store.insert_with(
            Account::open(id, 333300000001, &policy, Decimal::new(balance, 0), Utc::now()),
            |_| (),
        );
        id
    }

    #[test]
    fn test_insert_with_publishes_locked_account() {
        let store = AccountStore::new();
        let policy = PolicyCatalog::new().resolve("Savings").unwrap();
        let id = store.allocate_id();
        let account = Account::open(id, 333300000001, &policy, Decimal::new(10_000, 0), Utc::now());

        let locked_inside = store.insert_with(account, |stored| {
            assert_eq!(stored.id, id);
            store.handle(id).map(|handle| handle.try_lock().is_none())
        });

        assert_eq!(locked_inside, Some(true));
        assert_eq!(store.get(id).unwrap().balance, Decimal::new(10_000, 0));
    }

    #[test]
    fn test_ids_start_at_base() {
        let store = AccountStore::new();
        assert_eq!(open(&store, 5000), 222200000001);
        assert_eq!(open(&store, 5000), 222200000002);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_missing_account() {
        let store = AccountStore::new();
        assert!(store.get(222200000001).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_all_sorted_by_id() {
        let store = AccountStore::new();
        for _ in 0..5 {
            open(&store, 6000);
        }

        let ids: Vec<AccountId> = store.all().iter().map(|a| a.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_lock_pair_returns_argument_order() {
        let store = AccountStore::new();
        let low = open(&store, 5000);
        let high = open(&store, 7000);

        let high_handle = store.handle(high).unwrap();
        let low_handle = store.handle(low).unwrap();
        let (a, b) = AccountStore::lock_pair(&high_handle, high, &low_handle, low);
        assert_eq!(a.id, high);
        assert_eq!(b.id, low);
    }

    #[test]
    fn test_concurrent_opposite_lock_pairs_do_not_deadlock() {
        let store = Arc::new(AccountStore::new());
        let a = open(&store, 5000);
        let b = open(&store, 5000);

        let mut handles = vec![];
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let (x, y) = if i % 2 == 0 { (a, b) } else { (b, a) };
                for _ in 0..200 {
                    let hx = store.handle(x).unwrap();
                    let hy = store.handle(y).unwrap();
                    let (mut gx, _gy) = AccountStore::lock_pair(&hx, x, &hy, y);
                    gx.balance += Decimal::ONE;
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let total = store.get(a).unwrap().balance + store.get(b).unwrap().balance;
        assert_eq!(total, Decimal::new(10_000 + 1600, 0));
    }
}

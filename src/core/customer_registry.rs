//! Customer records
//!
//! Same layout as the account store: a `DashMap` of `Arc<Mutex<Customer>>`
//! handles. The customer lock serializes lifecycle changes for one customer
//! (opening accounts, closing them, removal). Balance operations never take
//! it.
//!
//! # Lock order
//!
//! Customer, then account, then ledger. Code holding a customer's lock must
//! not call [`CustomerRegistry::get`] or [`CustomerRegistry::live`] for that
//! same customer.

use crate::types::{Customer, CustomerId, CUSTOMER_ID_BASE};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, lockable customer record
pub type CustomerHandle = Arc<Mutex<Customer>>;

#[derive(Debug)]
pub struct CustomerRegistry {
    customers: DashMap<CustomerId, CustomerHandle>,
    next_id: AtomicU64,
}

impl CustomerRegistry {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            next_id: AtomicU64::new(CUSTOMER_ID_BASE),
        }
    }

    /// Register a new customer and run `f` while holding their lock
    ///
    /// The record is published already locked, so nobody can remove the
    /// customer before `f` (typically opening the first account) returns.
    pub fn create_with<R>(
        &self,
        name: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(CustomerId) -> R,
    ) -> (CustomerId, R) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = Arc::new(Mutex::new(Customer {
            id,
            name: name.to_string(),
            created_at: now,
            deleted: false,
            deleted_at: None,
        }));

        let _guard = handle.lock();
        self.customers.insert(id, Arc::clone(&handle));
        (id, f(id))
    }

    /// Handle for a customer, live or deleted
    pub fn handle(&self, id: CustomerId) -> Option<CustomerHandle> {
        self.customers.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Copy of a customer record, live or deleted
    pub fn get(&self, id: CustomerId) -> Option<Customer> {
        self.handle(id).map(|handle| handle.lock().clone())
    }

    /// Copy of a customer record if it exists and is not deleted
    pub fn live(&self, id: CustomerId) -> Option<Customer> {
        self.get(id).filter(|customer| !customer.deleted)
    }

    /// Copies of every customer, deleted included, sorted by id
    pub fn all(&self) -> Vec<Customer> {
        let handles: Vec<CustomerHandle> = self
            .customers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut customers: Vec<Customer> = handles.iter().map(|h| h.lock().clone()).collect();
        customers.sort_by_key(|customer| customer.id);
        customers
    }
}

impl Default for CustomerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

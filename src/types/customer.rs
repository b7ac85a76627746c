//! Customer record

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type CustomerId = u64;

/// First customer id handed out; anything below is malformed
pub const CUSTOMER_ID_BASE: CustomerId = 333_300_000_001;

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Flag the customer deleted; `false` if it already was
    pub fn soft_delete(&mut self, now: DateTime<Utc>) -> bool {
        if self.deleted {
            return false;
        }
        self.deleted = true;
        self.deleted_at = Some(now);
        true
    }

    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            customer: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSnapshot {
    pub customer: CustomerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

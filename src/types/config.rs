//! Ledger configuration

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which ledger rows get flagged when an account is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteCascade {
    /// Leave every ledger row live
    None,

    /// Flag the account's single-row deposits and withdrawals; transfer legs stay live
    #[default]
    DepositWithdrawOnly,

    /// Flag every row on the account, transfer legs included
    All,
}

/// Settings that change ledger behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub delete_cascade: DeleteCascade,
}

impl LedgerConfig {
    pub fn new(delete_cascade: DeleteCascade) -> Self {
        Self { delete_cascade }
    }
}

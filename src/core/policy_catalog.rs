//! Account policy catalog
//!
//! Maps an account class to its limits. The catalog is table driven: the
//! mutation engine never matches on a class, it only reads the
//! [`AccountPolicy`] this catalog hands back.

use crate::types::{AccountClass, AccountPolicy, BankError};
use rust_decimal::Decimal;

/// Lookup table from account class to policy
#[derive(Debug, Clone)]
pub struct PolicyCatalog {
    policies: Vec<AccountPolicy>,
}

impl PolicyCatalog {
    /// Create the catalog with the standard Savings and Current policies
    ///
    /// | Class   | min balance | interest | max per day | count per day |
    /// |---------|-------------|----------|-------------|---------------|
    /// | Savings | 10 000      | 3.5%     | 25 000      | 5             |
    /// | Current | 5 000       | 1.1%     | 10 000 000  | 6             |
    pub fn new() -> Self {
        Self::with_policies(vec![
            AccountPolicy {
                class: AccountClass::Savings,
                min_balance: Decimal::new(10_000, 0),
                interest_rate: Decimal::new(35, 1),
                max_withdrawal_amount_per_day: Decimal::new(25_000, 0),
                max_withdrawal_count_per_day: 5,
            },
            AccountPolicy {
                class: AccountClass::Current,
                min_balance: Decimal::new(5_000, 0),
                interest_rate: Decimal::new(11, 1),
                max_withdrawal_amount_per_day: Decimal::new(10_000_000, 0),
                max_withdrawal_count_per_day: 6,
            },
        ])
    }

    /// Create a catalog from an explicit table
    pub fn with_policies(policies: Vec<AccountPolicy>) -> Self {
        Self { policies }
    }

    /// Resolve a class name to its policy
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountClass` if no policy is registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<AccountPolicy, BankError> {
        let wanted = name.trim();
        self.policies
            .iter()
            .find(|policy| policy.class.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| BankError::invalid_account_class(name))
    }

    /// Policy for a class already stored on an account
    pub fn policy_for(&self, class: AccountClass) -> Result<AccountPolicy, BankError> {
        self.policies
            .iter()
            .find(|policy| policy.class == class)
            .copied()
            .ok_or_else(|| BankError::invalid_account_class(class.as_str()))
    }

    pub fn policies(&self) -> &[AccountPolicy] {
        &self.policies
    }
}

impl Default for PolicyCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::savings("Savings", AccountClass::Savings)]
    #[case::lowercase("savings", AccountClass::Savings)]
    #[case::uppercase("CURRENT", AccountClass::Current)]
    #[case::mixed_case_with_spaces("  cUrReNt ", AccountClass::Current)]
    fn test_resolve_case_insensitive(#[case] name: &str, #[case] expected: AccountClass) {
        let catalog = PolicyCatalog::new();
        assert_eq!(catalog.resolve(name).unwrap().class, expected);
    }

    #[rstest]
    #[case::unknown("Gold")]
    #[case::empty("")]
    #[case::prefix("Sav")]
    fn test_resolve_unknown_class(#[case] name: &str) {
        let catalog = PolicyCatalog::new();
        let err = catalog.resolve(name).unwrap_err();
        assert!(matches!(err, BankError::InvalidAccountClass { .. }));
    }

    #[test]
    fn test_savings_limits() {
        let policy = PolicyCatalog::new().resolve("Savings").unwrap();
        assert_eq!(policy.min_balance, Decimal::new(10_000, 0));
        assert_eq!(policy.interest_rate, Decimal::new(35, 1));
        assert_eq!(policy.max_withdrawal_amount_per_day, Decimal::new(25_000, 0));
        assert_eq!(policy.max_withdrawal_count_per_day, 5);
    }

    #[test]
    fn test_current_limits() {
        let policy = PolicyCatalog::new().resolve("Current").unwrap();
        assert_eq!(policy.min_balance, Decimal::new(5_000, 0));
        assert_eq!(policy.interest_rate, Decimal::new(11, 1));
        assert_eq!(
            policy.max_withdrawal_amount_per_day,
            Decimal::new(10_000_000, 0)
        );
        assert_eq!(policy.max_withdrawal_count_per_day, 6);
    }

    #[test]
    fn test_resolve_is_stable() {
        let catalog = PolicyCatalog::new();
        assert_eq!(
            catalog.resolve("savings").unwrap(),
            catalog.resolve("SAVINGS").unwrap()
        );
    }

    #[test]
    fn test_policy_for_missing_class_in_custom_table() {
        let savings = PolicyCatalog::new().resolve("Savings").unwrap();
        let catalog = PolicyCatalog::with_policies(vec![savings]);

        assert!(catalog.policy_for(AccountClass::Savings).is_ok());
        let err = catalog.policy_for(AccountClass::Current).unwrap_err();
        assert!(matches!(err, BankError::InvalidAccountClass { .. }));
    }
}

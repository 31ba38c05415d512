//! Account balances, sequence numbers, and storage accounting. Grounded on
//! `data/account.go`.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Total money supply, used only to sanity-check genesis allocation.
pub const TOTAL_MONEY: u64 = 1_000_000_000;

/// Monthly cost, in the native token, of reserving one megabyte of bucket
/// storage against an account's balance.
pub const COST_PER_MEGABYTE_MONTH: u64 = 3000;

/// A single account's on-chain state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub owner: String,
    pub sequence: u32,
    pub balance: u64,
    /// Megabytes of bucket storage currently reserved by this account.
    pub storage: u32,
}

impl Account {
    pub fn new(owner: impl Into<String>, balance: u64) -> Self {
        Account {
            owner: owner.into(),
            sequence: 0,
            balance,
            storage: 0,
        }
    }

    /// The monthly cost of this account's currently reserved storage.
    pub fn storage_cost(&self) -> u64 {
        self.storage as u64 * COST_PER_MEGABYTE_MONTH
    }

    /// True if adding `additional` megabytes would still fit within the
    /// account's balance once the new storage cost is charged.
    pub fn can_add_storage(&self, additional: u32) -> bool {
        let possible = self.storage as u64 + additional as u64;
        possible * COST_PER_MEGABYTE_MONTH <= self.balance
    }

    pub fn check_equal(&self, other: &Account) -> LedgerResult<()> {
        if self != other {
            return Err(LedgerError::AccountStateMismatch(self.owner.clone()));
        }
        Ok(())
    }

    /// Checks that `amount + fee` can be deducted from this account's
    /// balance for a send operation.
    pub fn validate_send_operation(&self, amount: u64, fee: u64) -> LedgerResult<()> {
        let cost = amount.checked_add(fee).ok_or(LedgerError::InsufficientBalance {
            have: self.balance,
            need: u64::MAX,
        })?;
        if cost > self.balance {
            return Err(LedgerError::InsufficientBalance {
                have: self.balance,
                need: cost,
            });
        }
        Ok(())
    }

    /// A short summary for log lines, matching `StringifyAccount`.
    pub fn stringify(&self) -> String {
        format!(
            "{}: seq={} balance={} storage={}mb",
            self.owner, self.sequence, self.balance, self.storage
        )
    }

    /// The byte sequence hashed into a ledger chunk's fingerprint.
    pub fn hashable_bytes(&self) -> Vec<u8> {
        format!("{}:{}:{}", self.owner, self.sequence, self.balance).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_send_checks_amount_plus_fee() {
        let account = Account::new("alice", 100);
        assert!(account.validate_send_operation(90, 10).is_ok());
        assert_eq!(
            account.validate_send_operation(95, 10),
            Err(LedgerError::InsufficientBalance { have: 100, need: 105 })
        );
    }

    #[test]
    fn can_add_storage_checks_against_balance() {
        let account = Account {
            owner: "alice".into(),
            sequence: 0,
            balance: COST_PER_MEGABYTE_MONTH * 5,
            storage: 2,
        };
        assert!(account.can_add_storage(3));
        assert!(!account.can_add_storage(4));
    }

    #[test]
    fn storage_cost_scales_with_megabytes() {
        let account = Account {
            owner: "alice".into(),
            sequence: 0,
            balance: 0,
            storage: 4,
        };
        assert_eq!(account.storage_cost(), 4 * COST_PER_MEGABYTE_MONTH);
    }
}

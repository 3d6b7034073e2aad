//! Incentive-asset boundary: issuance-only capability consumed by genesis and
//! admitted transitions. Issuance shares fate with the record mutation of the
//! same invocation; both commit or neither does.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("issuance overflows balance for {0}")]
    BalanceOverflow(String),
    #[error("asset ledger unavailable: {0}")]
    Unavailable(String),
}

/// Mint-and-bookkeep capability of the external fungible-asset ledger.
pub trait AssetLedger {
    /// Credit `amount` base units to `account`, creating the balance entry if
    /// absent. Returns the post-issuance balance.
    fn issue(&mut self, account: &str, amount: u64) -> Result<u64, AssetError>;

    /// Pure read; `None` when no balance entry exists yet.
    fn balance_of(&self, account: &str) -> Option<u64>;
}

/// In-memory ledger backing tests and the gateway shell.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryAssetLedger {
    balances: HashMap<String, u64>,
}

impl MemoryAssetLedger {
    pub fn new() -> Self {
        MemoryAssetLedger::default()
    }
}

impl AssetLedger for MemoryAssetLedger {
    fn issue(&mut self, account: &str, amount: u64) -> Result<u64, AssetError> {
        let current = self.balances.get(account).copied().unwrap_or(0);
        let next = current
            .checked_add(amount)
            .ok_or_else(|| AssetError::BalanceOverflow(account.to_string()))?;
        self.balances.insert(account.to_string(), next);
        Ok(next)
    }

    fn balance_of(&self, account: &str) -> Option<u64> {
        self.balances.get(account).copied()
    }
}

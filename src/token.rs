//! Derivative Token Ledger
//!
//! Withdrawals settle into a fungible balance. Only issuance and balance
//! queries live here; transfer mechanics are outside the core.

use std::collections::HashMap;

use crate::types::ids::{Address, Amount};

/// Balance map of the withdrawal derivative token
#[derive(Debug, Default)]
pub struct TokenLedger {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a freshly minted balance
    pub(crate) fn credit(&mut self, to: Address, amount: Amount) {
        if amount == 0 {
            return;
        }
        *self.balances.entry(to).or_insert(0) += amount;
        self.total_supply += amount;
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }
}

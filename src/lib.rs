//! Pooled-Staking Deposit Core
//!
//! Accounting core for a decentralized staking pool: user deposits are
//! queued, matched in chunks against node-operator minipools, and later
//! withdrawn as a fee-adjusted derivative-token balance.
//!
//! ## Components
//!
//! 1. **Deposit Queue** - per (user, group, duration) FIFO of deposit fragments
//! 2. **Matching Engine** - assigns queued value to PreLaunch minipools
//! 3. **Minipool Registry** - lifecycle observation and per-user ledgers
//! 4. **Withdrawal Accounting** - fee-split withdrawal into token balances
//! 5. **Deposit API** - the single validated entry point
//!
//! External collaborators (settings registry, group access layer, node
//! capacity) are injected as trait handles at construction; the core never
//! resolves them through a global registry.

pub mod common;
pub mod deposit;
pub mod events;
pub mod group;
pub mod minipool;
pub mod node;
pub mod settings;
pub mod token;
pub mod types;

// Re-exports: infrastructure
pub use common::config::{ConfigError, PoolConfig};
pub use common::error::{ErrorKind, PoolError, Result};
pub use common::logging::{init_logging, LogLevel, LoggingError};

// Re-exports: domain types
pub use types::fragment::{DepositFragment, FragmentStatus};
pub use types::ids::{Address, Amount, DepositId, DurationId, FeePerc, GroupId};
pub use types::minipool::{Minipool, MinipoolStatus};

// Re-exports: collaborator seams
pub use group::{Group, GroupAccess, GroupRegistry};
pub use node::{NodeSupply, StagedNodeSupply};
pub use settings::{Settings, StaticSettings};

// Re-exports: subsystems
pub use deposit::api::{DepositApi, SharedDepositApi};
pub use deposit::queue::DepositQueue;
pub use deposit::service::{PoolService, PoolStats};
pub use events::{EventLog, PoolEvent};
pub use minipool::MinipoolRegistry;
pub use token::TokenLedger;

/// Amount and fee arithmetic helpers
pub mod units {
    use crate::types::ids::{Amount, FeePerc};

    /// Smallest units per whole token (wei per ether)
    pub const WEI_PER_ETH: Amount = 1_000_000_000_000_000_000;

    /// Fixed-point base for fee percentages: `FEE_BASE` == 100%
    pub const FEE_BASE: u64 = 1_000_000_000_000_000_000;

    /// Convert whole ether to wei
    pub fn eth_to_wei(eth: u64) -> Amount {
        eth as Amount * WEI_PER_ETH
    }

    /// Fee owed on `amount` at the fixed-point rate `perc`.
    ///
    /// Exact truncating integer division, `amount * perc / FEE_BASE`,
    /// decomposed so the intermediate product cannot overflow:
    /// `floor(a*p/B) = (a/B)*p + floor((a%B)*p/B)` since the first term
    /// is exact.
    pub fn fee_of(amount: Amount, perc: FeePerc) -> Amount {
        let base = FEE_BASE as Amount;
        let perc = perc as Amount;
        (amount / base) * perc + (amount % base) * perc / base
    }

    /// Format an amount with its ether value for log output
    pub fn format_wei(amount: Amount) -> String {
        let whole = amount / WEI_PER_ETH;
        let frac = amount % WEI_PER_ETH;
        format!("{} wei ({}.{:018} ETH)", amount, whole, frac)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_fee_of_truncates() {
            // 5% of 100 wei
            let five_pct = FEE_BASE / 20;
            assert_eq!(fee_of(100, five_pct), 5);
            // 5% of 99 wei truncates to 4
            assert_eq!(fee_of(99, five_pct), 4);
            // 100% is identity
            assert_eq!(fee_of(12_345, FEE_BASE), 12_345);
            // 0% is zero
            assert_eq!(fee_of(12_345, 0), 0);
        }

        #[test]
        fn test_fee_of_matches_direct_division() {
            // Decomposed form must equal the naive form wherever the
            // naive form does not overflow.
            let amounts = [0, 1, 7, 1_000, WEI_PER_ETH - 1, WEI_PER_ETH, 32 * WEI_PER_ETH];
            let rates = [0, 1, FEE_BASE / 400, FEE_BASE / 20, FEE_BASE / 2, FEE_BASE];
            for &a in &amounts {
                for &p in &rates {
                    let naive = a * p as Amount / FEE_BASE as Amount;
                    assert_eq!(fee_of(a, p), naive, "a={} p={}", a, p);
                }
            }
        }

        #[test]
        fn test_fee_of_large_amount() {
            // Naive multiplication of 10^30 * 10^18 would overflow u128;
            // the decomposed form must not.
            let huge: Amount = 1_000_000_000_000 * WEI_PER_ETH;
            assert_eq!(fee_of(huge, FEE_BASE / 2), huge / 2);
        }

        #[test]
        fn test_format_wei() {
            let s = format_wei(eth_to_wei(2) + 5);
            assert!(s.contains("2.000000000000000005 ETH"));
        }
    }
}

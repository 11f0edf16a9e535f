//! Domain Types
//!
//! Identifier newtypes plus the deposit fragment and minipool records the
//! subsystems operate on.

pub mod fragment;
pub mod ids;
pub mod minipool;

pub use fragment::{DepositFragment, FragmentStatus};
pub use ids::{Address, Amount, DepositId, DurationId, FeePerc, GroupId};
pub use minipool::{Minipool, MinipoolStatus};

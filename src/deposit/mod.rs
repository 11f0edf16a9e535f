//! Deposit Subsystem
//!
//! Queue, matching engine, withdrawal accounting, the pool service that ties
//! them to the collaborator seams, and the validated API facade.

pub mod api;
pub mod matching;
pub mod queue;
pub mod service;
pub mod withdrawal;

pub use api::{create_shared_api, DepositApi, SharedDepositApi};
pub use queue::DepositQueue;
pub use service::{PoolService, PoolStats};

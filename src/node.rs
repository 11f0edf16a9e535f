//! Node Capacity Collaborator
//!
//! When the matching engine finds no PreLaunch minipool with room, it asks
//! the node layer for a new one. Node registration and collateral sit outside
//! this core; only the request seam is modelled here.

use std::collections::VecDeque;

use crate::types::ids::DurationId;
use crate::types::minipool::Minipool;

/// Source of fresh minipools backed by node-operator capacity
pub trait NodeSupply: Send + Sync {
    /// Request a new PreLaunch minipool for a duration class.
    ///
    /// `None` means no node capacity exists; queued deposits then simply
    /// wait for capacity to appear.
    fn request_minipool(&mut self, duration: &DurationId) -> Option<Minipool>;
}

/// Supply backed by a staged list of prepared minipools
#[derive(Debug, Default)]
pub struct StagedNodeSupply {
    staged: VecDeque<Minipool>,
}

impl StagedNodeSupply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a prepared minipool to hand out on request
    pub fn stage(&mut self, minipool: Minipool) {
        self.staged.push_back(minipool);
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

impl NodeSupply for StagedNodeSupply {
    fn request_minipool(&mut self, duration: &DurationId) -> Option<Minipool> {
        let idx = self
            .staged
            .iter()
            .position(|pool| &pool.duration == duration)?;
        self.staged.remove(idx)
    }
}

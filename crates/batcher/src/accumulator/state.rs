use std::mem;

use gateway_primitives::Cid;

/// CIDs added since the last flush, in insertion order.
#[derive(Debug, Default)]
pub struct PendingBatch {
    cids: Vec<Cid>,
}

impl PendingBatch {
    pub fn push(&mut self, cid: Cid) {
        self.cids.push(cid);
    }

    pub fn len(&self) -> usize {
        self.cids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }

    /// Swaps in an empty batch and returns what was pending.
    pub fn take(&mut self) -> Vec<Cid> {
        mem::take(&mut self.cids)
    }
}

use serde::{Deserialize, Serialize};

/// Traffic that reached main memory at the bottom of the hierarchy.
///
/// Counts whole-line transfers, not bytes. Main memory always hits, so there
/// is no status dimension here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Line fetches triggered by misses in the lowest cache level.
    pub fetches: u64,
    /// Writes propagated through by a write-through lowest level.
    pub stores: u64,
    /// Dirty lines written back by the lowest level on eviction or flush.
    pub writebacks: u64,
}

impl Memory {
    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.fetches + self.stores + self.writebacks
    }

    #[must_use]
    pub fn num_reads(&self) -> u64 {
        self.fetches
    }

    #[must_use]
    pub fn num_writes(&self) -> u64 {
        self.stores + self.writebacks
    }
}

impl std::ops::AddAssign for Memory {
    fn add_assign(&mut self, other: Self) {
        self.fetches += other.fetches;
        self.stores += other.stores;
        self.writebacks += other.writebacks;
    }
}

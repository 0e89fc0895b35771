#![allow(non_camel_case_types, clippy::upper_case_acronyms)]

pub mod cache;
pub mod mem;

pub use cache::{AccessKind, PerLevel, RequestStatus};
pub use mem::Memory;

use serde::{Deserialize, Serialize};

/// Statistics for a full cache hierarchy run.
///
/// One [`cache::Level`] entry per cache level, ordered from the level closest
/// to the processor, plus the traffic that reached main memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub caches: PerLevel,
    pub mem: Memory,
}

impl Stats {
    #[must_use]
    pub fn new(num_levels: usize) -> Self {
        Self {
            caches: PerLevel::new(num_levels),
            mem: Memory::default(),
        }
    }

    /// Zero all counters while keeping the hierarchy shape.
    pub fn reset(&mut self) {
        self.caches.reset();
        self.mem = Memory::default();
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            levels: self.caches.iter().map(cache::Level::snapshot).collect(),
            mem: self.mem,
        }
    }
}

impl std::ops::AddAssign for Stats {
    fn add_assign(&mut self, other: Self) {
        self.caches += other.caches;
        self.mem += other.mem;
    }
}

/// Point-in-time summary: per-level hit/miss totals and memory traffic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub levels: Vec<cache::LevelSnapshot>,
    pub mem: Memory,
}

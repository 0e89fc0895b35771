use crate::cache::block::Line;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A cache replacement policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReplacementPolicy {
    /// Evict the line untouched for the longest time.
    LRU,
    /// Evict the line resident for the longest time, ignoring hits.
    FIFO,
    /// Evict the line with the fewest accesses, oldest allocation on a tie.
    LFU,
    /// Evict a uniformly chosen line.
    RANDOM,
}

impl ReplacementPolicy {
    /// Pick the way to evict from a full set.
    ///
    /// The scans keep the first minimum they see, so remaining ties resolve
    /// to the lowest way index.
    pub(crate) fn victim(self, ways: &[Line], rng: &mut SmallRng) -> usize {
        debug_assert!(!ways.is_empty());
        debug_assert!(ways.iter().all(|line| !line.is_invalid()));
        match self {
            ReplacementPolicy::LRU => {
                let mut victim = 0;
                for (way, line) in ways.iter().enumerate().skip(1) {
                    if line.last_access_time < ways[victim].last_access_time {
                        victim = way;
                    }
                }
                victim
            }
            ReplacementPolicy::FIFO => {
                let mut victim = 0;
                for (way, line) in ways.iter().enumerate().skip(1) {
                    if line.alloc_time < ways[victim].alloc_time {
                        victim = way;
                    }
                }
                victim
            }
            ReplacementPolicy::LFU => {
                let mut victim = 0;
                for (way, line) in ways.iter().enumerate().skip(1) {
                    let candidate = (line.access_count, line.alloc_time);
                    let current = (ways[victim].access_count, ways[victim].alloc_time);
                    if candidate < current {
                        victim = way;
                    }
                }
                victim
            }
            ReplacementPolicy::RANDOM => rng.gen_range(0..ways.len()),
        }
    }

    /// Update the metadata this policy ranks victims by, on a hit.
    ///
    /// Allocation stamps all metadata, so each policy only has to maintain
    /// its own counters afterwards.
    pub(crate) fn touch(self, line: &mut Line, time: u64) {
        match self {
            ReplacementPolicy::LRU => line.last_access_time = time,
            ReplacementPolicy::LFU => line.access_count += 1,
            ReplacementPolicy::FIFO | ReplacementPolicy::RANDOM => {}
        }
    }
}

use crate::addr::AddressSpace;
use crate::cache::{AccessKind, Level, Lower, RequestStatus};
use crate::memory::MainMemory;
use crate::{address, config, Error};

/// Decorrelates the per level rng streams derived from one user seed.
const SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// A memory request issued by a front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Read { addr: address },
    Write { addr: address, value: u8 },
}

/// The reply to a [`Request`].
///
/// The status is the outcome at the level closest to the processor; deeper
/// levels record their own outcomes in the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Read { data: u8, status: RequestStatus },
    Write { status: RequestStatus },
}

/// A multi-level cache hierarchy in front of an always-hit main memory.
///
/// Requests enter at the first configured level and every miss recurses one
/// level further down. All processing is synchronous and single threaded.
#[derive(Debug)]
pub struct Hierarchy {
    levels: Vec<Level>,
    memory: MainMemory,
    address_space: AddressSpace,
    latency: Option<config::Latency>,
    stats: stats::Stats,
    config: config::Hierarchy,
}

impl Hierarchy {
    /// Build a hierarchy after validating `config`.
    pub fn new(config: config::Hierarchy) -> Result<Self, Error> {
        config.validate()?;
        let address_space = AddressSpace::new(config.address_width_bits)?;
        let levels: Vec<Level> = config
            .levels
            .iter()
            .enumerate()
            .map(|(index, cache)| {
                let seed = config
                    .random_seed
                    .wrapping_add((index as u64).wrapping_mul(SEED_STRIDE));
                Level::new(index, cache.clone(), seed)
            })
            .collect();
        let stats = stats::Stats::new(levels.len());
        log::debug!("hierarchy: {config}");
        Ok(Self {
            levels,
            memory: MainMemory::new(),
            address_space,
            latency: config.latency.clone(),
            stats,
            config,
        })
    }

    /// Read one byte.
    pub fn read(&mut self, addr: address) -> Result<(u8, RequestStatus), Error> {
        let addr = self.address_space.check(addr)?;
        let (first, rest) = self.levels.split_first_mut().expect("at least one level");
        let (data, status) = first.read(
            addr,
            1,
            AccessKind::READ,
            Lower {
                levels: rest,
                memory: &mut self.memory,
                stats: &mut self.stats,
            },
        );
        Ok((data[0], status))
    }

    /// Write one byte.
    pub fn write(&mut self, addr: address, value: u8) -> Result<RequestStatus, Error> {
        let addr = self.address_space.check(addr)?;
        let (first, rest) = self.levels.split_first_mut().expect("at least one level");
        let status = first.write(
            addr,
            &[value],
            AccessKind::WRITE,
            Lower {
                levels: rest,
                memory: &mut self.memory,
                stats: &mut self.stats,
            },
        );
        Ok(status)
    }

    /// Serve one request.
    pub fn request(&mut self, request: Request) -> Result<Reply, Error> {
        match request {
            Request::Read { addr } => {
                let (data, status) = self.read(addr)?;
                Ok(Reply::Read { data, status })
            }
            Request::Write { addr, value } => {
                let status = self.write(addr, value)?;
                Ok(Reply::Write { status })
            }
        }
    }

    /// Write all dirty lines down to main memory, level by level.
    ///
    /// Lines stay resident and clean afterwards.
    ///
    /// # Returns
    /// The total number of lines written back across all levels.
    pub fn flush(&mut self) -> usize {
        let mut flushed = 0;
        for start in 0..self.levels.len() {
            if let Some((head, rest)) = self.levels[start..].split_first_mut() {
                flushed += head.flush_into(Lower {
                    levels: rest,
                    memory: &mut self.memory,
                    stats: &mut self.stats,
                });
            }
        }
        flushed
    }

    /// Drop all cached lines without writing anything back.
    ///
    /// Dirty data that was never flushed is lost.
    pub fn invalidate(&mut self) {
        for level in &mut self.levels {
            level.invalidate();
        }
    }

    /// Statistics recorded since construction or the last reset.
    #[must_use]
    pub fn stats(&self) -> &stats::Stats {
        &self.stats
    }

    /// Zero the statistics. Cache contents are untouched.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    #[must_use]
    pub fn snapshot(&self) -> stats::Snapshot {
        self.stats.snapshot()
    }

    /// Average access time over the recorded accesses.
    ///
    /// Folds the observed per level miss ratios over the configured hit
    /// latencies, starting at main memory. `None` without a latency model;
    /// without any recorded accesses the result is the first level's hit
    /// latency.
    #[must_use]
    pub fn amat(&self) -> Option<f64> {
        let latency = self.latency.as_ref()?;
        let mut result = latency.memory as f64;
        for (level, hit) in latency.hit.iter().enumerate().rev() {
            result = *hit as f64 + self.stats.caches.miss_ratio(level) * result;
        }
        Some(result)
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    #[must_use]
    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    #[must_use]
    pub fn address_space(&self) -> AddressSpace {
        self.address_space
    }

    #[must_use]
    pub fn config(&self) -> &config::Hierarchy {
        &self.config
    }
}

use crate::{addr, address, replacement::ReplacementPolicy};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A cache write policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum WritePolicy {
    /// Writes stay in the level and mark the line dirty. Lower levels see the
    /// data when the line is evicted or flushed.
    WRITE_BACK,
    /// Writes update the level and propagate to the next level immediately.
    /// Lines in a write-through level are never dirty.
    WRITE_THROUGH,
}

/// `Cache` configures a single cache level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    /// Name used in logs. Defaults to `L<n>` when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Number of sets. Must be a power of two.
    pub num_sets: usize,

    /// Cache line size in bytes. Must be a power of two.
    pub line_size: u32,

    /// Number of ways per set.
    pub associativity: usize,

    /// Cache replacement policy.
    pub replacement_policy: ReplacementPolicy,

    /// Cache write policy.
    pub write_policy: WritePolicy,
}

impl std::fmt::Display for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let size = human_bytes::human_bytes(self.total_bytes() as f64);
        write!(
            f,
            "{size} ({} set, {}-way, {} byte line)",
            self.num_sets, self.associativity, self.line_size
        )
    }
}

impl Cache {
    /// The total size of the cache in bytes.
    #[inline]
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.line_size as usize * self.num_sets * self.associativity
    }

    /// Number of lines in total.
    #[inline]
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.num_sets * self.associativity
    }

    #[inline]
    #[must_use]
    pub fn line_size_log2(&self) -> u32 {
        addr::logb2(u64::from(self.line_size))
    }

    #[inline]
    #[must_use]
    pub fn num_sets_log2(&self) -> u32 {
        addr::logb2(self.num_sets as u64)
    }

    /// Linear set index: the bits directly above the byte offset.
    #[inline]
    #[must_use]
    pub fn set_index(&self, addr: address) -> u64 {
        (addr >> self.line_size_log2()) & (self.num_sets as u64 - 1)
    }

    /// Tag for hit/miss checks.
    ///
    /// For generality, the tag includes both index and tag bits, making it
    /// identical to the block address.
    #[inline]
    #[must_use]
    pub fn tag(&self, addr: address) -> address {
        addr & !u64::from(self.line_size - 1)
    }

    /// Block address: `addr` with the offset bits cleared.
    #[inline]
    #[must_use]
    pub fn block_addr(&self, addr: address) -> address {
        addr & !u64::from(self.line_size - 1)
    }

    #[inline]
    #[must_use]
    pub fn decompose(&self, addr: address) -> addr::Decomposed {
        addr::decompose(addr, self.line_size_log2(), self.num_sets_log2())
    }

    #[must_use]
    pub fn label(&self, level: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("L{}", level + 1),
        }
    }

    pub fn validate(&self, level: usize) -> Result<(), Error> {
        if self.num_sets == 0 {
            return Err(Error::Zero {
                level,
                what: "number of sets",
            });
        }
        if self.line_size == 0 {
            return Err(Error::Zero {
                level,
                what: "line size",
            });
        }
        if self.associativity == 0 {
            return Err(Error::Zero {
                level,
                what: "associativity",
            });
        }
        if !addr::is_power_of_two(self.num_sets as u64) {
            return Err(Error::NotPowerOfTwo {
                level,
                what: "number of sets",
                value: self.num_sets as u64,
            });
        }
        if !addr::is_power_of_two(u64::from(self.line_size)) {
            return Err(Error::NotPowerOfTwo {
                level,
                what: "line size",
                value: u64::from(self.line_size),
            });
        }
        Ok(())
    }
}

/// Latency model for average access time accounting.
///
/// Unit-less: cycles or nanoseconds both work as long as the entries agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latency {
    /// Hit latency per level, level closest to the processor first.
    pub hit: Vec<u64>,
    /// Main memory access latency.
    pub memory: u64,
}

/// Configures a full hierarchy, level closest to the processor first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub levels: Vec<Cache>,

    /// Width of valid addresses in bits, at most 64.
    pub address_width_bits: u32,

    /// Optional latency model consumed by average access time accounting.
    #[serde(default)]
    pub latency: Option<Latency>,

    /// Seed for the RANDOM replacement policy so runs are reproducible.
    #[serde(default)]
    pub random_seed: u64,
}

impl std::fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let chain = self.levels.iter().map(ToString::to_string).join(" -> ");
        write!(f, "{chain} -> memory")
    }
}

impl Hierarchy {
    /// Check the whole configuration, returning the first violation.
    pub fn validate(&self) -> Result<(), Error> {
        if self.levels.is_empty() {
            return Err(Error::NoLevels);
        }
        let space = addr::AddressSpace::new(self.address_width_bits)?;
        for (level, cache) in self.levels.iter().enumerate() {
            cache.validate(level)?;
            let needed = cache.line_size_log2() + cache.num_sets_log2();
            if needed > space.width_bits() {
                return Err(Error::ExceedsAddressWidth {
                    level,
                    needed,
                    width_bits: space.width_bits(),
                });
            }
        }
        // an upper level block must lie inside exactly one lower level block
        for (upper, pair) in self.levels.windows(2).enumerate() {
            let (outer, inner) = (&pair[0], &pair[1]);
            if inner.line_size % outer.line_size != 0 {
                return Err(Error::LineSizesDoNotNest {
                    upper,
                    upper_line_size: outer.line_size,
                    lower: upper + 1,
                    lower_line_size: inner.line_size,
                });
            }
        }
        if let Some(latency) = &self.latency {
            if latency.hit.len() != self.levels.len() {
                return Err(Error::LatencyLevels {
                    expected: self.levels.len(),
                    got: latency.hit.len(),
                });
            }
            if latency.memory == 0 || latency.hit.iter().any(|&lat| lat == 0) {
                return Err(Error::ZeroLatency);
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("hierarchy needs at least one cache level")]
    NoLevels,

    #[error("level {level}: {what} must be positive")]
    Zero { level: usize, what: &'static str },

    #[error("level {level}: {what} must be a power of two, got {value}")]
    NotPowerOfTwo {
        level: usize,
        what: &'static str,
        value: u64,
    },

    #[error("address width must be between 1 and 64 bits, got {width_bits}")]
    AddressWidth { width_bits: u32 },

    #[error(
        "level {level}: offset and index need {needed} bits, \
         more than the {width_bits} bit address space has"
    )]
    ExceedsAddressWidth {
        level: usize,
        needed: u32,
        width_bits: u32,
    },

    #[error(
        "level {upper} line size {upper_line_size} does not divide \
         level {lower} line size {lower_line_size}"
    )]
    LineSizesDoNotNest {
        upper: usize,
        upper_line_size: u32,
        lower: usize,
        lower_line_size: u32,
    },

    #[error("latency model must cover {expected} levels, got {got}")]
    LatencyLevels { expected: usize, got: usize },

    #[error("latency model entries must be positive")]
    ZeroLatency,
}

#[cfg(test)]
mod tests {
    use crate::replacement::ReplacementPolicy;
    use color_eyre::eyre;
    use pretty_assertions_sorted as diff;

    fn l1() -> super::Cache {
        super::Cache {
            name: None,
            num_sets: 16,
            line_size: 64,
            associativity: 4,
            replacement_policy: ReplacementPolicy::LRU,
            write_policy: super::WritePolicy::WRITE_BACK,
        }
    }

    fn hierarchy(levels: Vec<super::Cache>) -> super::Hierarchy {
        super::Hierarchy {
            levels,
            address_width_bits: 32,
            latency: None,
            random_seed: 0,
        }
    }

    #[test]
    fn test_valid_configuration() -> eyre::Result<()> {
        hierarchy(vec![l1()]).validate()?;
        Ok(())
    }

    #[test]
    fn test_geometry_helpers() {
        let cache = l1();
        diff::assert_eq!(cache.total_bytes(), 64 * 16 * 4);
        diff::assert_eq!(cache.total_lines(), 64);
        diff::assert_eq!(cache.line_size_log2(), 6);
        diff::assert_eq!(cache.num_sets_log2(), 4);

        let addr = 0b1101_0110_1010_1101;
        diff::assert_eq!(cache.set_index(addr), 0b1010);
        diff::assert_eq!(cache.block_addr(addr), addr & !0b11_1111);
        diff::assert_eq!(cache.tag(addr), cache.block_addr(addr));

        let parts = cache.decompose(addr);
        diff::assert_eq!(u64::from(parts.offset), addr & 0b11_1111);
        diff::assert_eq!(parts.set, cache.set_index(addr));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        for (field, cache) in [
            ("sets", super::Cache { num_sets: 0, ..l1() }),
            (
                "line size",
                super::Cache {
                    line_size: 0,
                    ..l1()
                },
            ),
            (
                "associativity",
                super::Cache {
                    associativity: 0,
                    ..l1()
                },
            ),
        ] {
            assert!(
                matches!(
                    hierarchy(vec![cache]).validate(),
                    Err(super::Error::Zero { level: 0, .. })
                ),
                "zero {field} must be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_non_power_of_two_dimensions() {
        assert!(matches!(
            hierarchy(vec![super::Cache { num_sets: 3, ..l1() }]).validate(),
            Err(super::Error::NotPowerOfTwo { value: 3, .. })
        ));
        assert!(matches!(
            hierarchy(vec![super::Cache {
                line_size: 96,
                ..l1()
            }])
            .validate(),
            Err(super::Error::NotPowerOfTwo { value: 96, .. })
        ));
        // associativity does not have to be a power of two
        hierarchy(vec![super::Cache {
            associativity: 6,
            ..l1()
        }])
        .validate()
        .unwrap();
    }

    #[test]
    fn test_rejects_empty_hierarchy() {
        assert!(matches!(
            hierarchy(vec![]).validate(),
            Err(super::Error::NoLevels)
        ));
    }

    #[test]
    fn test_rejects_bad_address_width() {
        let mut config = hierarchy(vec![l1()]);
        config.address_width_bits = 0;
        assert!(matches!(
            config.validate(),
            Err(super::Error::AddressWidth { width_bits: 0 })
        ));
        config.address_width_bits = 65;
        assert!(matches!(
            config.validate(),
            Err(super::Error::AddressWidth { width_bits: 65 })
        ));
    }

    #[test]
    fn test_rejects_index_wider_than_address() {
        // 64 byte lines and 16 sets need 10 bits
        let mut config = hierarchy(vec![l1()]);
        config.address_width_bits = 8;
        assert!(matches!(
            config.validate(),
            Err(super::Error::ExceedsAddressWidth {
                level: 0,
                needed: 10,
                width_bits: 8
            })
        ));
    }

    #[test]
    fn test_rejects_line_sizes_that_do_not_nest() {
        let config = hierarchy(vec![
            l1(),
            super::Cache {
                line_size: 32,
                num_sets: 64,
                ..l1()
            },
        ]);
        assert!(matches!(
            config.validate(),
            Err(super::Error::LineSizesDoNotNest {
                upper: 0,
                upper_line_size: 64,
                lower: 1,
                lower_line_size: 32
            })
        ));
    }

    #[test]
    fn test_rejects_bad_latency_model() {
        let mut config = hierarchy(vec![l1()]);
        config.latency = Some(super::Latency {
            hit: vec![1, 10],
            memory: 100,
        });
        assert!(matches!(
            config.validate(),
            Err(super::Error::LatencyLevels {
                expected: 1,
                got: 2
            })
        ));

        config.latency = Some(super::Latency {
            hit: vec![0],
            memory: 100,
        });
        assert!(matches!(config.validate(), Err(super::Error::ZeroLatency)));
    }

    #[test]
    fn test_display() {
        diff::assert_eq!(l1().to_string(), "4 KiB (16 set, 4-way, 64 byte line)");
        let config = hierarchy(vec![l1(), super::Cache { num_sets: 64, ..l1() }]);
        diff::assert_eq!(
            config.to_string(),
            "4 KiB (16 set, 4-way, 64 byte line) -> 16 KiB (64 set, 4-way, 64 byte line) -> memory"
        );
    }

    #[test]
    fn test_serde_round_trip() -> eyre::Result<()> {
        let config = super::Hierarchy {
            levels: vec![
                super::Cache {
                    name: Some("L1D".to_string()),
                    ..l1()
                },
                super::Cache {
                    num_sets: 256,
                    replacement_policy: ReplacementPolicy::FIFO,
                    write_policy: super::WritePolicy::WRITE_THROUGH,
                    ..l1()
                },
            ],
            address_width_bits: 48,
            latency: Some(super::Latency {
                hit: vec![1, 10],
                memory: 100,
            }),
            random_seed: 42,
        };
        let json = serde_json::to_string_pretty(&config)?;
        let back: super::Hierarchy = serde_json::from_str(&json)?;
        diff::assert_eq!(config, back);
        Ok(())
    }

    #[test]
    fn test_serde_defaults() -> eyre::Result<()> {
        let json = r#"{
            "levels": [{
                "num_sets": 4,
                "line_size": 16,
                "associativity": 2,
                "replacement_policy": "LRU",
                "write_policy": "WRITE_THROUGH"
            }],
            "address_width_bits": 16
        }"#;
        let config: super::Hierarchy = serde_json::from_str(json)?;
        config.validate()?;
        diff::assert_eq!(config.levels[0].name, None);
        diff::assert_eq!(config.latency, None);
        diff::assert_eq!(config.random_seed, 0);
        diff::assert_eq!(config.levels[0].label(0), "L1");
        Ok(())
    }
}

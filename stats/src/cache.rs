use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::IntoEnumIterator;

#[derive(
    Debug,
    strum::EnumIter,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum RequestStatus {
    HIT = 0,
    MISS,
}

#[derive(
    Debug,
    strum::EnumIter,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum AccessKind {
    /// Demand read, or a line fetch issued by the level above on its miss.
    READ = 0,
    /// Demand write, or a write propagated by a write-through level above.
    WRITE,
    /// Dirty line evicted or flushed by the level above.
    WRITEBACK,
}

impl AccessKind {
    #[must_use]
    pub fn is_write(self) -> bool {
        match self {
            AccessKind::READ => false,
            AccessKind::WRITE | AccessKind::WRITEBACK => true,
        }
    }
}

pub type LevelCsvRow = ((AccessKind, RequestStatus), u64);

/// Access counters for a single cache level.
///
/// Every `(kind, status)` combination is present from the start, so consumers
/// can rely on the key set independent of the traffic a run produced.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub accesses: HashMap<(AccessKind, RequestStatus), u64>,
}

impl Default for Level {
    fn default() -> Self {
        let mut accesses = HashMap::new();
        for kind in AccessKind::iter() {
            for status in RequestStatus::iter() {
                accesses.insert((kind, status), 0);
            }
        }
        Self { accesses }
    }
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut accesses: Vec<_> = self
            .accesses
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|((kind, status), count)| (format!("{kind:?}[{status:?}]"), count))
            .collect();
        accesses.sort_by_key(|(key, _)| key.clone());

        let mut out = f.debug_struct("LevelStats");
        for (key, count) in accesses {
            out.field(&key, count);
        }
        out.finish_non_exhaustive()
    }
}

impl std::ops::AddAssign for Level {
    fn add_assign(&mut self, other: Self) {
        for (k, v) in other.accesses {
            *self.accesses.entry(k).or_insert(0) += v;
        }
    }
}

impl Level {
    #[inline]
    pub fn inc(
        &mut self,
        kind: impl Into<AccessKind>,
        status: impl Into<RequestStatus>,
        count: u64,
    ) {
        *self
            .accesses
            .entry((kind.into(), status.into()))
            .or_insert(0) += count;
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.count(RequestStatus::HIT)
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.count(RequestStatus::MISS)
    }

    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.accesses.values().sum()
    }

    /// Hit ratio over all traffic this level served, in `[0.0, 1.0]`.
    ///
    /// Defined as `0.0` before the first access.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            return 0.0;
        }
        self.hits() as f64 / total as f64
    }

    #[must_use]
    pub fn miss_ratio(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            return 0.0;
        }
        self.misses() as f64 / total as f64
    }

    fn count(&self, status: RequestStatus) -> u64 {
        self.accesses
            .iter()
            .filter(|((_, s), _)| *s == status)
            .map(|(_, count)| count)
            .sum()
    }

    /// Drop zero counters, keeping only the combinations a run produced.
    pub fn shave(&mut self) {
        self.accesses.retain(|_, v| *v > 0);
    }

    #[must_use]
    pub fn flatten(self) -> Vec<LevelCsvRow> {
        let mut flattened: Vec<_> = self.accesses.into_iter().collect();
        flattened.sort_by_key(|(access, _)| *access);
        flattened
    }

    #[must_use]
    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            ratio: self.ratio(),
        }
    }
}

/// Hit/miss totals for one level, as exposed to front-ends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub ratio: f64,
}

pub type PerLevelCsvRow = (usize, LevelCsvRow);

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerLevel(pub Vec<Level>);

impl PerLevel {
    #[must_use]
    pub fn new(num_levels: usize) -> Self {
        Self(vec![Level::default(); num_levels])
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Level> {
        self.0
    }

    #[inline]
    pub fn record(
        &mut self,
        level: usize,
        kind: impl Into<AccessKind>,
        status: impl Into<RequestStatus>,
    ) {
        self.0[level].inc(kind, status, 1);
    }

    #[must_use]
    pub fn hits(&self, level: usize) -> u64 {
        self.0[level].hits()
    }

    #[must_use]
    pub fn misses(&self, level: usize) -> u64 {
        self.0[level].misses()
    }

    #[must_use]
    pub fn accesses(&self, level: usize) -> u64 {
        self.0[level].total_accesses()
    }

    #[must_use]
    pub fn ratio(&self, level: usize) -> f64 {
        self.0[level].ratio()
    }

    #[must_use]
    pub fn miss_ratio(&self, level: usize) -> f64 {
        self.0[level].miss_ratio()
    }

    pub fn reset(&mut self) {
        for level in &mut self.0 {
            *level = Level::default();
        }
    }

    pub fn shave(&mut self) {
        for level in &mut self.0 {
            level.shave();
        }
    }

    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.0.iter().map(Level::total_accesses).sum()
    }

    #[must_use]
    pub fn flatten(self) -> Vec<PerLevelCsvRow> {
        self.0
            .into_iter()
            .enumerate()
            .flat_map(|(id, level)| level.flatten().into_iter().map(move |row| (id, row)))
            .collect()
    }
}

impl std::ops::AddAssign for PerLevel {
    fn add_assign(&mut self, other: Self) {
        if other.0.len() > self.0.len() {
            self.0.resize_with(other.0.len(), Level::default);
        }
        for (level, stats) in other.0.into_iter().enumerate() {
            self.0[level] += stats;
        }
    }
}

impl std::ops::Deref for PerLevel {
    type Target = Vec<Level>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for PerLevel {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessKind, Level, PerLevel, RequestStatus};

    #[test]
    fn ratio_counts_all_kinds() {
        let mut level = Level::default();
        level.inc(AccessKind::READ, RequestStatus::HIT, 2);
        level.inc(AccessKind::WRITE, RequestStatus::HIT, 1);
        level.inc(AccessKind::READ, RequestStatus::MISS, 1);
        assert_eq!(level.hits(), 3);
        assert_eq!(level.misses(), 1);
        assert_eq!(level.ratio(), 0.75);
        assert_eq!(level.miss_ratio(), 0.25);
    }

    #[test]
    fn ratio_is_zero_without_accesses() {
        let level = Level::default();
        assert_eq!(level.total_accesses(), 0);
        assert_eq!(level.ratio(), 0.0);
        assert_eq!(level.miss_ratio(), 0.0);
    }

    #[test]
    fn default_prefills_every_combination() {
        let level = Level::default();
        assert_eq!(level.accesses.len(), 3 * 2);
        assert!(level.accesses.values().all(|&count| count == 0));
    }

    #[test]
    fn flatten_orders_by_kind_then_status() {
        let mut per_level = PerLevel::new(2);
        per_level.record(1, AccessKind::WRITEBACK, RequestStatus::MISS);
        per_level.record(0, AccessKind::READ, RequestStatus::HIT);

        let rows = per_level.flatten();
        assert_eq!(rows.len(), 2 * 3 * 2);
        // level-major, then (kind, status) ascending
        assert_eq!(rows[0].0, 0);
        assert_eq!(
            (rows[0].1).0,
            (AccessKind::READ, RequestStatus::HIT)
        );
        let writeback_misses: Vec<_> = rows
            .iter()
            .filter(|(id, ((kind, status), _))| {
                *id == 1 && *kind == AccessKind::WRITEBACK && *status == RequestStatus::MISS
            })
            .collect();
        assert_eq!(writeback_misses.len(), 1);
        assert_eq!((writeback_misses[0].1).1, 1);
    }

    #[test]
    fn shave_drops_zero_counters() {
        let mut level = Level::default();
        level.inc(AccessKind::READ, RequestStatus::HIT, 1);
        level.shave();
        assert_eq!(level.accesses.len(), 1);
    }

    #[test]
    fn reset_keeps_shape() {
        let mut per_level = PerLevel::new(3);
        per_level.record(2, AccessKind::READ, RequestStatus::MISS);
        per_level.reset();
        assert_eq!(per_level.len(), 3);
        assert_eq!(per_level.total_accesses(), 0);
    }
}

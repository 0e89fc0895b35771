use crate::cache::block::Line;
use crate::replacement::ReplacementPolicy;
use crate::{address, config};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Contents and state of a line displaced by [`TagArray::allocate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evicted {
    pub block_addr: address,
    pub dirty: bool,
    pub data: Box<[u8]>,
}

/// Set-associative tag and data store for one cache level.
///
/// Holds `num_sets x associativity` lines in a flat vector, set by set with
/// ways adjacent.
#[derive(Debug)]
pub struct TagArray {
    pub lines: Vec<Line>,
    pub num_dirty: usize,
    config: config::Cache,
    policy: ReplacementPolicy,
    rng: SmallRng,
}

impl TagArray {
    #[must_use]
    pub fn new(config: &config::Cache, seed: u64) -> Self {
        let lines = (0..config.total_lines())
            .map(|_| Line::new(config.line_size))
            .collect();
        Self {
            lines,
            num_dirty: 0,
            policy: config.replacement_policy,
            rng: SmallRng::seed_from_u64(seed),
            config: config.clone(),
        }
    }

    /// Looks up the line holding `addr` without touching replacement metadata.
    ///
    /// # Returns
    /// The index of the resident line, if any.
    ///
    /// # Panics
    /// When two resident lines in the set carry the same tag. That must never
    /// happen and is not silently repaired.
    #[must_use]
    pub fn probe(&self, addr: address) -> Option<usize> {
        let set_index = self.config.set_index(addr) as usize;
        let tag = self.config.tag(addr);

        log::trace!(
            "tag_array::probe(addr={addr:#x}) set_idx = {set_index}, tag = {tag:#x}, assoc = {}",
            self.config.associativity,
        );

        let mut found = None;
        for way in 0..self.config.associativity {
            let idx = set_index * self.config.associativity + way;
            let line = &self.lines[idx];
            if line.is_invalid() || line.tag != tag {
                continue;
            }
            assert!(
                found.is_none(),
                "two resident lines for tag {tag:#x} in set {set_index}"
            );
            found = Some(idx);
        }
        found
    }

    /// Update replacement metadata for a hit on `idx`.
    pub fn touch(&mut self, idx: usize, time: u64) {
        let line = &mut self.lines[idx];
        debug_assert!(!line.is_invalid());
        self.policy.touch(line, time);
    }

    /// Install the block for `addr`, evicting a victim when the set is full.
    ///
    /// # Returns
    /// The index the block now lives at, and the displaced line if one was
    /// resident. Dirty victims carry their data so the caller can write them
    /// back before they are discarded.
    pub fn allocate(&mut self, addr: address, data: &[u8], time: u64) -> (usize, Option<Evicted>) {
        let set_index = self.config.set_index(addr) as usize;
        let tag = self.config.tag(addr);
        let base = set_index * self.config.associativity;
        let ways = base..base + self.config.associativity;

        let idx = match self.lines[ways.clone()].iter().position(Line::is_invalid) {
            Some(way) => base + way,
            None => base + self.policy.victim(&self.lines[ways], &mut self.rng),
        };

        let line = &mut self.lines[idx];
        let evicted = if line.is_invalid() {
            None
        } else {
            if line.is_modified() {
                self.num_dirty -= 1;
            }
            Some(Evicted {
                block_addr: line.block_addr,
                dirty: line.is_modified(),
                data: line.data.clone(),
            })
        };

        log::trace!(
            "tag_array::allocate(cache={idx}, tag={tag:#x}, evicted={:?}, time={time})",
            evicted.as_ref().map(|evicted| evicted.block_addr),
        );

        line.allocate(tag, self.config.block_addr(addr), data, time);
        (idx, evicted)
    }

    /// Set the dirty bit on a resident line, tracking the dirty line count.
    pub fn mark_modified(&mut self, idx: usize) {
        let line = &mut self.lines[idx];
        if !line.is_modified() {
            self.num_dirty += 1;
            line.mark_modified();
        }
    }

    /// Get a reference to a line.
    #[must_use]
    pub fn get_line(&self, idx: usize) -> &Line {
        &self.lines[idx]
    }

    /// Get a mutable reference to a line.
    ///
    /// Dirty state must be changed through [`TagArray::mark_modified`] so the
    /// dirty line count stays consistent.
    #[must_use]
    pub fn get_line_mut(&mut self, idx: usize) -> &mut Line {
        &mut self.lines[idx]
    }

    /// Write all dirty lines out through `writeback` and mark them clean.
    ///
    /// # Returns
    /// The number of dirty lines flushed.
    pub fn flush_dirty(&mut self, mut writeback: impl FnMut(address, &[u8])) -> usize {
        let mut flushed = 0;
        for line in &mut self.lines {
            if line.is_modified() {
                writeback(line.block_addr, &line.data);
                line.mark_clean();
                flushed += 1;
            }
        }
        debug_assert_eq!(flushed, self.num_dirty);
        self.num_dirty = 0;
        flushed
    }

    /// Invalidate all lines, dropping dirty data without writeback.
    ///
    /// This effectively resets the tag array.
    pub fn invalidate(&mut self) {
        for line in &mut self.lines {
            line.invalidate();
        }
        self.num_dirty = 0;
    }

    /// The maximum number of lines this array can hold.
    #[must_use]
    pub fn size(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn num_resident_lines(&self) -> usize {
        self.lines.iter().filter(|line| !line.is_invalid()).count()
    }
}

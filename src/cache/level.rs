use crate::cache::{AccessKind, LineBuf, RequestStatus};
use crate::memory::MainMemory;
use crate::tag_array::TagArray;
use crate::{address, config};

/// Everything below one cache level: the remaining levels and main memory.
///
/// Misses recurse through this chain head first, which keeps each level
/// exclusively borrowed for exactly one step of the descent.
pub struct Lower<'a> {
    pub levels: &'a mut [Level],
    pub memory: &'a mut MainMemory,
    pub stats: &'a mut stats::Stats,
}

impl Lower<'_> {
    /// Fetch a whole block for the level above.
    fn fetch(&mut self, block_addr: address, len: u32) -> LineBuf {
        match self.levels.split_first_mut() {
            Some((head, rest)) => {
                let (data, _) = head.read(
                    block_addr,
                    len,
                    AccessKind::READ,
                    Lower {
                        levels: rest,
                        memory: &mut *self.memory,
                        stats: &mut *self.stats,
                    },
                );
                data
            }
            None => {
                self.stats.mem.fetches += 1;
                self.memory.fetch(block_addr, len)
            }
        }
    }

    /// Push bytes down one level: write-through traffic or a dirty writeback.
    fn write(&mut self, addr: address, bytes: &[u8], kind: AccessKind) {
        debug_assert!(kind.is_write());
        match self.levels.split_first_mut() {
            Some((head, rest)) => {
                head.write(
                    addr,
                    bytes,
                    kind,
                    Lower {
                        levels: rest,
                        memory: &mut *self.memory,
                        stats: &mut *self.stats,
                    },
                );
            }
            None => {
                if kind == AccessKind::WRITEBACK {
                    self.stats.mem.writebacks += 1;
                } else {
                    self.stats.mem.stores += 1;
                }
                self.memory.store(addr, bytes);
            }
        }
    }
}

/// One cache level.
///
/// The level owns its tag array and a logical clock; the clock advances once
/// per access and orders allocations and hits for the replacement policies.
#[derive(Debug)]
pub struct Level {
    name: String,
    index: usize,
    config: config::Cache,
    tag_array: TagArray,
    time: u64,
}

impl Level {
    pub(crate) fn new(index: usize, config: config::Cache, seed: u64) -> Self {
        Self {
            name: config.label(index),
            index,
            tag_array: TagArray::new(&config, seed),
            config,
            time: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &config::Cache {
        &self.config
    }

    #[must_use]
    pub fn num_resident_lines(&self) -> usize {
        self.tag_array.num_resident_lines()
    }

    #[must_use]
    pub fn num_dirty_lines(&self) -> usize {
        self.tag_array.num_dirty
    }

    fn tick(&mut self) -> u64 {
        self.time += 1;
        self.time
    }

    /// Serve a read of `len` bytes at `addr` from this level.
    ///
    /// `len` never crosses a line boundary: demand reads are single bytes
    /// and fetches from the level above are whole upper level lines, which
    /// nest inside ours by construction.
    pub(crate) fn read(
        &mut self,
        addr: address,
        len: u32,
        kind: AccessKind,
        mut lower: Lower<'_>,
    ) -> (LineBuf, RequestStatus) {
        let time = self.tick();
        let offset = self.config.decompose(addr).offset;
        debug_assert!(offset + len <= self.config.line_size);

        log::debug!(
            "{}::read(addr={addr:#x}, len={len}, kind={kind:?}, time={time})",
            self.name
        );

        let (idx, status) = match self.tag_array.probe(addr) {
            Some(idx) => {
                self.tag_array.touch(idx, time);
                (idx, RequestStatus::HIT)
            }
            None => (self.fetch_block(addr, &mut lower, time), RequestStatus::MISS),
        };
        lower.stats.caches.record(self.index, kind, status);

        let line = self.tag_array.get_line(idx);
        let start = offset as usize;
        let data = LineBuf::from_slice(&line.data[start..start + len as usize]);
        (data, status)
    }

    /// Serve a write of `bytes` at `addr`.
    ///
    /// Misses allocate under both write policies: the containing block is
    /// fetched from below, installed, and then overwritten.
    pub(crate) fn write(
        &mut self,
        addr: address,
        bytes: &[u8],
        kind: AccessKind,
        mut lower: Lower<'_>,
    ) -> RequestStatus {
        let time = self.tick();

        log::debug!(
            "{}::write(addr={addr:#x}, len={}, kind={kind:?}, time={time})",
            self.name,
            bytes.len(),
        );

        let (idx, status) = match self.tag_array.probe(addr) {
            Some(idx) => {
                self.tag_array.touch(idx, time);
                (idx, RequestStatus::HIT)
            }
            None => (self.fetch_block(addr, &mut lower, time), RequestStatus::MISS),
        };

        let func = match self.config.write_policy {
            config::WritePolicy::WRITE_BACK => Self::write_write_back,
            config::WritePolicy::WRITE_THROUGH => Self::write_write_through,
        };
        (func)(self, addr, bytes, idx, kind, &mut lower);

        lower.stats.caches.record(self.index, kind, status);
        status
    }

    /// Write-back: update the line and mark it dirty. The data leaves this
    /// level on eviction or flush.
    fn write_write_back(
        &mut self,
        addr: address,
        bytes: &[u8],
        idx: usize,
        _kind: AccessKind,
        _lower: &mut Lower<'_>,
    ) {
        self.update_line(addr, bytes, idx);
        self.tag_array.mark_modified(idx);
    }

    /// Write-through: update the line and propagate the bytes immediately.
    /// The line stays clean.
    fn write_write_through(
        &mut self,
        addr: address,
        bytes: &[u8],
        idx: usize,
        kind: AccessKind,
        lower: &mut Lower<'_>,
    ) {
        self.update_line(addr, bytes, idx);
        lower.write(addr, bytes, kind);
    }

    fn update_line(&mut self, addr: address, bytes: &[u8], idx: usize) {
        let offset = (addr - self.config.block_addr(addr)) as usize;
        let line = self.tag_array.get_line_mut(idx);
        debug_assert!(offset + bytes.len() <= line.data.len());
        line.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Miss path: fetch the containing block from below, install it here, and
    /// write the victim back down if it was dirty.
    fn fetch_block(&mut self, addr: address, lower: &mut Lower<'_>, time: u64) -> usize {
        let block_addr = self.config.block_addr(addr);
        let fetched = lower.fetch(block_addr, self.config.line_size);
        let (idx, evicted) = self.tag_array.allocate(addr, &fetched, time);
        if let Some(evicted) = evicted {
            if evicted.dirty {
                log::debug!(
                    "{}::writeback(block_addr={:#x}) evicted by {block_addr:#x}",
                    self.name,
                    evicted.block_addr,
                );
                lower.write(evicted.block_addr, &evicted.data, AccessKind::WRITEBACK);
            }
        }
        idx
    }

    /// Write every dirty line in this level through to the next.
    ///
    /// # Returns
    /// The number of dirty lines written back.
    pub(crate) fn flush_into(&mut self, mut lower: Lower<'_>) -> usize {
        let name = &self.name;
        self.tag_array.flush_dirty(|block_addr, data| {
            log::debug!("{name}::flush(block_addr={block_addr:#x})");
            lower.write(block_addr, data, AccessKind::WRITEBACK);
        })
    }

    /// Drop all lines, dirty data included.
    pub(crate) fn invalidate(&mut self) {
        log::debug!("{}::invalidate()", self.name);
        self.tag_array.invalidate();
    }
}

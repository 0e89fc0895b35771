use crate::address;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Status {
    INVALID = 0,
    VALID,
    MODIFIED,
}

/// A single cache line together with its resident data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    pub tag: address,
    pub block_addr: address,

    pub status: Status,

    pub alloc_time: u64,
    pub last_access_time: u64,
    pub access_count: u64,

    pub data: Box<[u8]>,
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Line")
            .field("addr", &self.block_addr)
            .field("status", &self.status)
            .finish()
    }
}

impl Line {
    #[must_use]
    pub fn new(line_size: u32) -> Self {
        Self {
            tag: 0,
            block_addr: 0,
            status: Status::INVALID,
            alloc_time: 0,
            last_access_time: 0,
            access_count: 0,
            data: vec![0; line_size as usize].into_boxed_slice(),
        }
    }

    /// Install a fetched block, overwriting whatever was resident.
    ///
    /// The insertion counts as the line's first access.
    #[inline]
    pub fn allocate(&mut self, tag: address, block_addr: address, data: &[u8], time: u64) {
        debug_assert_eq!(data.len(), self.data.len());
        self.tag = tag;
        self.block_addr = block_addr;
        self.alloc_time = time;
        self.last_access_time = time;
        self.access_count = 1;
        self.status = Status::VALID;
        self.data.copy_from_slice(data);
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == Status::VALID
    }

    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.status == Status::MODIFIED
    }

    #[inline]
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.status == Status::INVALID
    }

    #[inline]
    pub fn mark_modified(&mut self) {
        debug_assert!(!self.is_invalid());
        self.status = Status::MODIFIED;
    }

    /// Clear the dirty bit after a writeback, keeping the data resident.
    #[inline]
    pub fn mark_clean(&mut self) {
        debug_assert!(self.is_modified());
        self.status = Status::VALID;
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.status = Status::INVALID;
    }
}

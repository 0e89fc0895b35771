pub mod block;
pub mod level;

pub use level::{Level, Lower};

use smallvec::SmallVec;

/// Line sized byte buffer moved between levels.
///
/// Stays inline for common line sizes and spills to the heap beyond that.
pub(crate) type LineBuf = SmallVec<[u8; 64]>;

#[derive(Debug, strum::EnumIter, Clone, Copy, Hash, PartialEq, Eq)]
pub enum RequestStatus {
    HIT = 0,
    MISS,
}

impl From<RequestStatus> for stats::cache::RequestStatus {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::HIT => Self::HIT,
            RequestStatus::MISS => Self::MISS,
        }
    }
}

/// Kind of traffic, as seen by the level receiving it.
///
/// A demand read misses in L1 and arrives at L2 as a [`AccessKind::READ`]
/// fetch; a dirty L1 victim arrives as a [`AccessKind::WRITEBACK`].
#[derive(Debug, strum::EnumIter, Clone, Copy, Hash, PartialEq, Eq)]
pub enum AccessKind {
    READ = 0,
    WRITE,
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

impl From<AccessKind> for stats::cache::AccessKind {
    fn from(kind: AccessKind) -> Self {
        match kind {
            AccessKind::READ => Self::READ,
            AccessKind::WRITE => Self::WRITE,
            AccessKind::WRITEBACK => Self::WRITEBACK,
        }
    }
}

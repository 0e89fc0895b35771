#![allow(
    clippy::upper_case_acronyms,
    non_camel_case_types,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]

pub mod addr;
pub mod cache;
pub mod config;
pub mod hierarchy;
pub mod memory;
pub mod replacement;
pub mod tag_array;

#[cfg(test)]
pub mod testing;

pub use stats;

pub use addr::AddressSpace;
pub use cache::{AccessKind, RequestStatus};
pub use hierarchy::{Hierarchy, Reply, Request};
pub use replacement::ReplacementPolicy;

pub type address = u64;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Address(#[from] addr::Error),

    #[error(transparent)]
    Config(#[from] config::Error),
}

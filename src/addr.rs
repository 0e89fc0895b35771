use crate::{address, config};

/// Base-2 logarithm of a power of two.
#[inline]
#[must_use]
pub fn logb2(n: u64) -> u32 {
    debug_assert!(is_power_of_two(n), "{n} is not a power of two");
    n.trailing_zeros()
}

#[inline]
#[must_use]
pub fn is_power_of_two(n: u64) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// An address split into tag, set index and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decomposed {
    pub tag: address,
    pub set: u64,
    pub offset: u32,
}

/// Split `addr` for a cache with `line_size_log2` offset bits followed by
/// `num_sets_log2` index bits.
#[inline]
#[must_use]
pub fn decompose(addr: address, line_size_log2: u32, num_sets_log2: u32) -> Decomposed {
    let offset = (addr & ((1u64 << line_size_log2) - 1)) as u32;
    let set = (addr >> line_size_log2) & ((1u64 << num_sets_log2) - 1);
    let tag_shift = line_size_log2 + num_sets_log2;
    let tag = if tag_shift >= address::BITS {
        0
    } else {
        addr >> tag_shift
    };
    Decomposed { tag, set, offset }
}

/// The set of valid addresses, fixed by a width in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpace {
    width_bits: u32,
}

impl std::fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} bit address space", self.width_bits)
    }
}

impl AddressSpace {
    pub fn new(width_bits: u32) -> Result<Self, config::Error> {
        if !(1..=address::BITS).contains(&width_bits) {
            return Err(config::Error::AddressWidth { width_bits });
        }
        Ok(Self { width_bits })
    }

    #[inline]
    #[must_use]
    pub fn width_bits(&self) -> u32 {
        self.width_bits
    }

    /// The largest valid address.
    #[inline]
    #[must_use]
    pub fn max_address(&self) -> address {
        if self.width_bits == address::BITS {
            address::MAX
        } else {
            (1 << self.width_bits) - 1
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, addr: address) -> bool {
        addr <= self.max_address()
    }

    /// Pass `addr` through if it fits the address width.
    pub fn check(&self, addr: address) -> Result<address, Error> {
        if self.contains(addr) {
            Ok(addr)
        } else {
            Err(Error::OutOfRange {
                addr,
                width_bits: self.width_bits,
            })
        }
    }

    /// Parse a decimal or `0x` prefixed hexadecimal address.
    ///
    /// Surrounding whitespace is ignored and underscore separators are
    /// allowed, like Rust literals. Signs are not part of an address: a sign
    /// after the `0x` prefix never parses, and negative values are rejected
    /// by the unsigned conversion.
    pub fn parse(&self, input: &str) -> Result<address, Error> {
        let trimmed = input.trim();
        let not_a_number = || Error::NotANumber {
            input: trimmed.to_string(),
        };
        let (digits, radix) = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(digits) => (digits, 16),
            None => (trimmed, 10),
        };
        if radix == 16 && digits.starts_with(['+', '-']) {
            return Err(not_a_number());
        }
        let digits = digits.replace('_', "");
        let addr = address::from_str_radix(&digits, radix).map_err(|_| not_a_number())?;
        self.check(addr)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{input:?} is not a number")]
    NotANumber { input: String },

    #[error("address {addr:#x} does not fit into {width_bits} bits")]
    OutOfRange { addr: address, width_bits: u32 },
}

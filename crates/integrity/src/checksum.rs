//! Running CRC32 state for chunked input.

use crc32fast::Hasher;

/// A reusable-within-one-operation CRC32 accumulator.
///
/// Wraps the `crc32fast` primitive so chunk boundaries are invisible to
/// callers: updating with `a` then `b` finalizes to the same value as a
/// single update with `a ++ b`. This streaming equivalence is what lets
/// the validator process multi-gigabyte inputs one bounded chunk at a
/// time.
///
/// `finalize` consumes the accumulator; each validation creates a fresh
/// one, so checksum state can never leak between unrelated operations.
#[derive(Debug, Default)]
pub struct Crc32Accumulator {
    hasher: Hasher,
}

impl Crc32Accumulator {
    /// Creates an accumulator with empty state.
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    /// Feeds a chunk into the running checksum.
    ///
    /// Empty chunks are a no-op.
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    /// Consumes the accumulator and returns the final CRC32 value.
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

//! Seeded CRC-64 fingerprints for naming cache directories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reflected ECMA-182 polynomial (the CRC-64/XZ variant).
const CRC64_POLY: u64 = 0xC96C_5795_D787_0F42;

/// Byte-at-a-time lookup table, generated at compile time.
const CRC64_TABLE: [u64; 256] = build_table();

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC64_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Computes a CRC-64 over `data`, continuing from `seed`.
///
/// A seed of `0` starts a fresh checksum. Passing the result of one call as the
/// seed of the next is equivalent to checksumming the concatenated inputs, which
/// is how a whole file set is folded into one value.
pub fn crc64_with_seed(data: &[u8], seed: u64) -> u64 {
    let mut crc = !seed;
    for &byte in data {
        crc = (crc >> 8) ^ CRC64_TABLE[((crc ^ u64::from(byte)) & 0xff) as usize];
    }
    !crc
}

/// A 64-bit fingerprint of an ordered sequence of byte strings.
///
/// Only used to name a cache directory. It is not collision resistant; the
/// manifests stored inside the directory are what decide reuse.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Wraps a raw checksum value.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Folds every item, in iteration order, through one running checksum.
    pub fn of<I, B>(items: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let crc = items
            .into_iter()
            .fold(0, |crc, item| crc64_with_seed(item.as_ref(), crc));
        Self(crc)
    }

    /// Returns the raw checksum value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:016x})", self.0)
    }
}

//! Shared foundational types for the warden build cache.
//!
//! Currently this is the seeded CRC-64 [`Fingerprint`] that names a cache
//! directory after the set of input files.

#![warn(missing_docs)]

pub mod fingerprint;

pub use fingerprint::{crc64_with_seed, Fingerprint};

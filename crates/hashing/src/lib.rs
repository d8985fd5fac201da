#![allow(clippy::uninlined_format_args)]

//! Hashing algorithms used to fingerprint ROMs and save states.

pub mod crc32;
pub mod hash;
pub mod sha256;

pub use crc32::crc32;
pub use sha256::sha256;

//! Error related data structures.
//!
//! The canonical [`Error`] type lives in `gbcore-common` so that it can be
//! shared with the encoding/hashing crates and the frontends without a
//! circular dependency on this crate. Re-exported here so callers can write
//! `gbcore::error::Error` without reaching into the common crate directly.

pub use gbcore_common::error::Error;

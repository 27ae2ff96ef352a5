//! Shared types and on-disk format for kiln.
//!
//! Everything in this crate is plain data: the registry file written by
//! `kiln-core` is a JSON array of [`PackageRecord`] values.

pub mod commit;
pub mod types;

pub use commit::CommitId;
pub use types::*;

/// File name of the package registry inside the state directory.
pub const REGISTRY_FILE: &str = "packages.json";

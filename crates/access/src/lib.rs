//! Permission-checked resolution of symbols into handles.
//!
//! An [`AccessContext`] pairs a lookup type with a set of [`LookupModes`]. Every resolution
//! entry point checks the resolved member against that pair and either returns a
//! [`Handle`](linkage_handle::Handle) or fails with
//! [`Error::IllegalAccess`](linkage_types::Error::IllegalAccess). A symbol that does not exist
//! fails with [`Error::NotFound`](linkage_types::Error::NotFound) instead, before any
//! permission check runs.
//!
//! The rules themselves live in [`lattice`] as pure functions of types and bits.

mod context;
#[cfg(test)]
mod fixture;
pub mod lattice;
mod modes;
mod resolve;

pub use context::AccessContext;
pub use modes::LookupModes;

//! Typed dynamic invocation.
//!
//! Symbols are resolved through an [`AccessContext`](access::AccessContext) into
//! [`Handle`](handle::Handle)s, composed with the combinators in [`handle`], and installed in
//! a [`DispatchCell`](handle::DispatchCell) that a call site reads. Rebinding the cell later
//! changes what the call site runs without touching it.
//!
//! | Crate | Contents |
//! |---|---|
//! | [`types`] | kinds, signatures, values, the type universe, conversions, errors, config |
//! | [`handle`] | handles, combinators, dispatch cells, invalidation tokens |
//! | [`access`] | lookup contexts and permission-checked resolution |

pub use linkage_access as access;
pub use linkage_handle as handle;
pub use linkage_types as types;

/// The names most call sites need.
pub mod prelude {
	pub use linkage_access::{AccessContext, LookupModes};
	pub use linkage_handle::{ConstantCell, DispatchCell, Handle, InvalidationToken, MutableCell, VolatileCell};
	pub use linkage_types::{Error, Kind, Result, Signature, TypeBuilder, TypeFactory, TypeRef, Value};
}

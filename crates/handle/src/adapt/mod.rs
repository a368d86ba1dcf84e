//! Signature adaptation.
//!
//! [`Handle::as_type`] applies implicit conversions only: widening primitives, boxing,
//! unboxing with widening, and reference casts that may succeed. [`explicit_cast_arguments`]
//! additionally allows every primitive cast, treats null as zero when unboxing, and checks
//! reference casts only at invocation.

use linkage_types::{Mode, Result, Signature};

use crate::handle::Handle;

/// Adapts `target` to `sig` with explicit casting conversions.
pub fn explicit_cast_arguments(target: &Handle, sig: &Signature) -> Result<Handle> {
	target.adapt(sig, Mode::Explicit)
}

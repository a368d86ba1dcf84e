//! Handles that invoke a handle passed as their leading argument.

use linkage_types::{builtins, Error, Kind, Result, Signature};

use crate::handle::{Form, Handle};
use crate::spread::{as_spreader, object_array};

fn invoker_signature(sig: &Signature) -> Result<Signature> {
	sig.insert_params(0, &[Kind::Ref(builtins::handle())])
}

/// `(Handle, sig...) -> ret` requiring the handle argument to have exactly `sig`.
pub fn exact_invoker(sig: &Signature) -> Result<Handle> {
	Ok(Handle::new(
		invoker_signature(sig)?,
		Form::Invoker {
			sig: sig.clone(),
			exact: true,
		},
	))
}

/// `(Handle, sig...) -> ret` adapting the handle argument to `sig` before invoking it.
pub fn invoker(sig: &Signature) -> Result<Handle> {
	Ok(Handle::new(
		invoker_signature(sig)?,
		Form::Invoker {
			sig: sig.clone(),
			exact: false,
		},
	))
}

/// An [`invoker`] whose arguments after the first `leading` arrive packed in an `Object[]`.
pub fn spread_invoker(sig: &Signature, leading: usize) -> Result<Handle> {
	if leading > sig.arity() {
		return Err(Error::IllegalArgument(format!(
			"{leading} leading arguments exceed {sig}"
		)));
	}
	as_spreader(&invoker(sig)?, &object_array(), sig.arity() - leading)
}

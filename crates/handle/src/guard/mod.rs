//! Two-way dispatch: boolean guards, condition catching and cleanup.

use linkage_types::{builtins, Error, Kind, Result, Signature, TypeRef};

use crate::handle::{Form, Handle};

/// Requires `prefix` to be a leading run of `sig`'s parameters.
fn require_prefix(prefix: &[Kind], sig: &Signature, what: &str) -> Result<()> {
	if prefix.len() > sig.arity() || prefix != &sig.params()[..prefix.len()] {
		return Err(Error::IllegalArgument(format!(
			"{what} parameters {prefix:?} are not a prefix of {sig}"
		)));
	}
	Ok(())
}

/// Evaluates `test` over the leading arguments and dispatches all arguments to exactly one branch.
///
/// `on_true` and `on_false` must share one signature; `test` returns boolean and takes a
/// (possibly shorter) prefix of its parameters.
pub fn guard_with_test(test: &Handle, on_true: &Handle, on_false: &Handle) -> Result<Handle> {
	let sig = on_true.signature();
	if on_false.signature() != sig {
		return Err(Error::IllegalArgument(format!(
			"guard branches differ: {sig} and {}",
			on_false.signature()
		)));
	}
	if test.ret() != &Kind::Boolean {
		return Err(Error::IllegalArgument(format!("guard test {test:?} does not return boolean")));
	}
	require_prefix(test.signature().params(), sig, "guard test")?;
	Ok(Handle::new(
		sig.clone(),
		Form::Guard {
			test: test.clone(),
			on_true: on_true.clone(),
			on_false: on_false.clone(),
		},
	))
}

/// Runs `handler` when `target` raises a condition assignable to `condition`.
///
/// The handler receives the condition followed by the leading arguments of the call, as many
/// as its arity accepts. Other conditions propagate unchanged.
pub fn catch_exception(target: &Handle, condition: &TypeRef, handler: &Handle) -> Result<Handle> {
	if !builtins::throwable().is_assignable_from(condition) {
		return Err(Error::IllegalArgument(format!("{condition} is not a throwable type")));
	}
	if handler.ret() != target.ret() {
		return Err(Error::IllegalArgument(format!(
			"handler returns {}, target returns {}",
			handler.ret(),
			target.ret()
		)));
	}
	match handler.signature().param(0) {
		Some(Kind::Ref(accepts)) if accepts.is_assignable_from(condition) => {}
		_ => {
			return Err(Error::IllegalArgument(format!(
				"handler {handler:?} cannot accept a {condition}"
			)));
		}
	}
	require_prefix(&handler.signature().params()[1..], target.signature(), "handler")?;
	Ok(Handle::new(
		target.signature().clone(),
		Form::Catch {
			target: target.clone(),
			condition: condition.clone(),
			handler: handler.clone(),
		},
	))
}

/// Runs `cleanup` after `target`, whether it returns or raises.
///
/// `cleanup` takes the raised condition (null on success), then the result if `target` is not
/// void (zero on failure), then a prefix of the arguments. Its result replaces the target's;
/// a condition from `target` is raised again after cleanup unless cleanup raises first.
pub fn try_finally(target: &Handle, cleanup: &Handle) -> Result<Handle> {
	if cleanup.ret() != target.ret() {
		return Err(Error::IllegalArgument(format!(
			"cleanup returns {}, target returns {}",
			cleanup.ret(),
			target.ret()
		)));
	}
	let params = cleanup.signature().params();
	match params.first() {
		Some(Kind::Ref(accepts)) if accepts.is_assignable_from(&builtins::throwable()) => {}
		_ => {
			return Err(Error::IllegalArgument(format!(
				"cleanup {cleanup:?} must take a throwable first"
			)));
		}
	}
	let mut rest = &params[1..];
	if !target.ret().is_void() {
		match rest.first() {
			Some(kind) if kind == target.ret() => rest = &rest[1..],
			_ => {
				return Err(Error::IllegalArgument(format!(
					"cleanup {cleanup:?} must take the {} result second",
					target.ret()
				)));
			}
		}
	}
	require_prefix(rest, target.signature(), "cleanup")?;
	Ok(Handle::new(
		target.signature().clone(),
		Form::TryFinally {
			target: target.clone(),
			cleanup: cleanup.clone(),
		},
	))
}

#[cfg(test)]
mod tests;

//! Argument insertion, dropping and permutation.

use std::sync::Arc;

use linkage_types::convert::coerce;
use linkage_types::{Error, Kind, Result, Signature, Value};

use crate::handle::{Form, Handle};

/// Binds `values` to the parameters starting at `pos`, removing them from the signature.
///
/// Values are converted to the parameter kinds now, so a class-cast or null-pointer
/// failure is raised here rather than on invocation. `values` is copied.
pub fn insert_arguments(target: &Handle, pos: usize, values: &[Value]) -> Result<Handle> {
	let end = pos
		.checked_add(values.len())
		.filter(|&end| end <= target.arity())
		.ok_or_else(|| {
			Error::IllegalArgument(format!(
				"cannot insert {} values at {pos} into {}",
				values.len(),
				target.signature()
			))
		})?;
	if values.is_empty() {
		return Ok(target.clone());
	}
	let bound = values
		.iter()
		.zip(&target.signature().params()[pos..end])
		.map(|(value, kind)| coerce(value.clone(), kind))
		.collect::<Result<Vec<_>>>()?;
	let sig = target.signature().drop_params(pos, end)?;
	Ok(Handle::new(
		sig,
		Form::Insert {
			target: target.clone(),
			pos,
			values: bound.into(),
		},
	))
}

/// Binds a receiver to the leading reference parameter.
pub fn bind_to(target: &Handle, receiver: Value) -> Result<Handle> {
	match target.signature().param(0) {
		Some(Kind::Ref(_)) => insert_arguments(target, 0, &[receiver]),
		_ => Err(Error::IllegalArgument(format!(
			"{} has no leading reference parameter to bind",
			target.signature()
		))),
	}
}

/// Adds ignored parameters of `kinds` before position `pos`.
pub fn drop_arguments(target: &Handle, pos: usize, kinds: &[Kind]) -> Result<Handle> {
	if pos > target.arity() {
		return Err(Error::IllegalArgument(format!(
			"drop position {pos} out of range for {}",
			target.signature()
		)));
	}
	if kinds.is_empty() {
		return Ok(target.clone());
	}
	let sig = target.signature().insert_params(pos, kinds)?;
	Ok(Handle::new(
		sig,
		Form::Drop {
			target: target.clone(),
			pos,
			count: kinds.len(),
		},
	))
}

/// Drops arguments so that `target`'s parameters from `skip` line up with `kinds[pos..]`.
///
/// The result takes `target`'s first `skip` parameters followed by all of `kinds`.
pub fn drop_arguments_to_match(target: &Handle, skip: usize, kinds: &[Kind], pos: usize) -> Result<Handle> {
	if skip > target.arity() || pos > kinds.len() {
		return Err(Error::IllegalArgument(format!(
			"skip {skip} / position {pos} out of range for {}",
			target.signature()
		)));
	}
	let matched = target.arity() - skip;
	let tail = pos + matched;
	if tail > kinds.len() || target.signature().params()[skip..] != kinds[pos..tail] {
		return Err(Error::IllegalArgument(format!(
			"parameters {skip}.. of {} do not match the given kinds at {pos}",
			target.signature()
		)));
	}
	let leading = drop_arguments(target, skip, &kinds[..pos])?;
	drop_arguments(&leading, skip + tail, &kinds[tail..])
}

/// Reorders arguments: parameter `i` of `target` receives argument `reorder[i]` of `sig`.
///
/// Positions may repeat (fan-out) and `sig` positions may go unused. `reorder` is copied.
pub fn permute_arguments(target: &Handle, sig: &Signature, reorder: &[usize]) -> Result<Handle> {
	if reorder.len() != target.arity() {
		return Err(Error::IllegalArgument(format!(
			"reorder has {} entries, {} needs {}",
			reorder.len(),
			target.signature(),
			target.arity()
		)));
	}
	if sig.ret() != target.signature().ret() {
		return Err(Error::IllegalArgument(format!(
			"return kind of {sig} differs from {}",
			target.signature()
		)));
	}
	for (i, &source) in reorder.iter().enumerate() {
		match sig.param(source) {
			Some(kind) if kind == target.param(i) => {}
			Some(kind) => {
				return Err(Error::IllegalArgument(format!(
					"parameter {i} of {} is {}, but position {source} of {sig} is {kind}",
					target.signature(),
					target.param(i)
				)));
			}
			None => {
				return Err(Error::IllegalArgument(format!("reorder index {source} out of range for {sig}")));
			}
		}
	}
	Ok(Handle::new(
		sig.clone(),
		Form::Permute {
			target: target.clone(),
			reorder: Arc::from(reorder),
		},
	))
}

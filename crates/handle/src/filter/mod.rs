//! Per-argument filters, subset combiners, return filters and argument collection.

use std::sync::Arc;

use linkage_types::{Error, Result};

use crate::handle::{Form, Handle};

/// Applies `filters[i]` to argument `pos + i` before invoking `target`; `None` passes through.
///
/// Each filter takes one argument and must return exactly the parameter kind it feeds.
/// `filters` is copied.
pub fn filter_arguments(target: &Handle, pos: usize, filters: &[Option<Handle>]) -> Result<Handle> {
	if pos.checked_add(filters.len()).is_none_or(|end| end > target.arity()) {
		return Err(Error::IllegalArgument(format!(
			"{} filters at {pos} exceed {}",
			filters.len(),
			target.signature()
		)));
	}
	let mut sig = target.signature().clone();
	for (i, filter) in filters.iter().enumerate() {
		let Some(filter) = filter else { continue };
		let param = target.param(pos + i);
		if filter.arity() != 1 || filter.ret() != param {
			return Err(Error::IllegalArgument(format!(
				"filter {:?} cannot feed parameter {} of kind {param}",
				filter,
				pos + i
			)));
		}
		sig = sig.change_param(pos + i, filter.param(0).clone())?;
	}
	if filters.iter().all(Option::is_none) {
		return Ok(target.clone());
	}
	Ok(Handle::new(
		sig,
		Form::Filter {
			target: target.clone(),
			pos,
			filters: Arc::from(filters),
		},
	))
}

/// Replaces argument `pos` with `combiner` applied to the arguments at `positions`.
///
/// The signature is unchanged; `positions` is copied.
pub fn filter_arguments_with_combiner(target: &Handle, pos: usize, combiner: &Handle, positions: &[usize]) -> Result<Handle> {
	if pos >= target.arity() {
		return Err(Error::IllegalArgument(format!(
			"filter position {pos} out of range for {}",
			target.signature()
		)));
	}
	if combiner.ret() != target.param(pos) {
		return Err(Error::IllegalArgument(format!(
			"combiner returns {}, parameter {pos} is {}",
			combiner.ret(),
			target.param(pos)
		)));
	}
	check_positions(target, combiner, positions)?;
	Ok(Handle::new(
		target.signature().clone(),
		Form::FilterWithCombiner {
			target: target.clone(),
			pos,
			combiner: combiner.clone(),
			positions: Arc::from(positions),
		},
	))
}

/// Checks that the arguments of `sig_owner` at `positions` fit the parameters of `combiner`.
pub(crate) fn check_positions(sig_owner: &Handle, combiner: &Handle, positions: &[usize]) -> Result<()> {
	if positions.len() != combiner.arity() {
		return Err(Error::IllegalArgument(format!(
			"{} positions given for combiner {:?}",
			positions.len(),
			combiner
		)));
	}
	for (j, &i) in positions.iter().enumerate() {
		if i >= sig_owner.arity() || sig_owner.param(i) != combiner.param(j) {
			return Err(Error::IllegalArgument(format!(
				"position {i} of {} cannot feed parameter {j} of {:?}",
				sig_owner.signature(),
				combiner
			)));
		}
	}
	Ok(())
}

/// Applies `filter` to the result of `target`.
///
/// A void `target` needs a nullary filter.
pub fn filter_return_value(target: &Handle, filter: &Handle) -> Result<Handle> {
	let fits = if target.ret().is_void() {
		filter.arity() == 0
	} else {
		filter.arity() == 1 && filter.param(0) == target.ret()
	};
	if !fits {
		return Err(Error::IllegalArgument(format!(
			"filter {:?} cannot accept the result of {:?}",
			filter, target
		)));
	}
	Ok(Handle::new(
		target.signature().change_return(filter.ret().clone()),
		Form::FilterReturn {
			target: target.clone(),
			filter: filter.clone(),
		},
	))
}

/// Preprocesses the arguments at `pos` with `filter`.
///
/// A non-void filter's result replaces parameter `pos`, and the filter's parameters take its
/// place in the signature. A void filter consumes its parameters, inserted at `pos`, and adds
/// nothing to the target's arguments.
pub fn collect_arguments(target: &Handle, pos: usize, filter: &Handle) -> Result<Handle> {
	let params = filter.signature().params();
	let sig = if filter.ret().is_void() {
		if pos > target.arity() {
			return Err(Error::IllegalArgument(format!(
				"collect position {pos} out of range for {}",
				target.signature()
			)));
		}
		target.signature().insert_params(pos, params)?
	} else {
		if pos >= target.arity() || target.param(pos) != filter.ret() {
			return Err(Error::IllegalArgument(format!(
				"filter {:?} cannot feed parameter {pos} of {}",
				filter,
				target.signature()
			)));
		}
		target.signature().drop_params(pos, pos + 1)?.insert_params(pos, params)?
	};
	Ok(Handle::new(
		sig,
		Form::Collect {
			target: target.clone(),
			pos,
			filter: filter.clone(),
		},
	))
}

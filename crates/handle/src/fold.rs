//! Folding: deriving a new argument from existing ones.

use std::sync::Arc;

use linkage_types::{Error, Result};

use crate::filter::check_positions;
use crate::handle::{Form, Handle};

/// Folds over the leading arguments. See [`fold_arguments_at`].
pub fn fold_arguments(target: &Handle, combiner: &Handle) -> Result<Handle> {
	fold_arguments_at(target, 0, combiner)
}

/// Runs `combiner` over the `combiner.arity()` arguments starting at `pos`.
///
/// A non-void result is inserted at `pos` before the original arguments are passed on, so
/// `target` has one more parameter than the result. A void combiner runs for its side
/// effects and the arguments pass through unchanged.
pub fn fold_arguments_at(target: &Handle, pos: usize, combiner: &Handle) -> Result<Handle> {
	let end = pos.checked_add(combiner.arity()).ok_or_else(|| {
		Error::IllegalArgument(format!("fold position {pos} out of range for {}", target.signature()))
	})?;
	let positions: Vec<usize> = (pos..end).collect();
	fold_arguments_with_combiner(target, pos, combiner, &positions)
}

/// Like [`fold_arguments_at`], but `combiner` receives the arguments at `positions` of the
/// resulting handle. `positions` is copied.
pub fn fold_arguments_with_combiner(target: &Handle, pos: usize, combiner: &Handle, positions: &[usize]) -> Result<Handle> {
	let folds_value = !combiner.ret().is_void();
	if folds_value && (pos >= target.arity() || target.param(pos) != combiner.ret()) {
		return Err(Error::IllegalArgument(format!(
			"combiner {:?} cannot supply parameter {pos} of {}",
			combiner,
			target.signature()
		)));
	}
	if !folds_value && pos > target.arity() {
		return Err(Error::IllegalArgument(format!(
			"fold position {pos} out of range for {}",
			target.signature()
		)));
	}
	let sig = if folds_value {
		target.signature().drop_params(pos, pos + 1)?
	} else {
		target.signature().clone()
	};
	let result = Handle::new(
		sig,
		Form::Fold {
			target: target.clone(),
			pos,
			combiner: combiner.clone(),
			positions: Arc::from(positions),
		},
	);
	check_positions(&result, combiner, positions)?;
	Ok(result)
}

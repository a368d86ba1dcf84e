//! Array spreading and collecting.
//!
//! A spreader takes one array argument in place of `count` positional parameters and unpacks it
//! at invocation time; a collector is the converse, packing `count` positional arguments into
//! one array parameter.

use linkage_types::{builtins, Error, Kind, Mode, Result, Step, TypeRef};

use crate::handle::{Form, Handle};

fn array_component(array_type: &TypeRef) -> Result<Kind> {
	array_type
		.component()
		.cloned()
		.ok_or_else(|| Error::IllegalArgument(format!("{array_type} is not an array type")))
}

/// Collapses the trailing `count` parameters into one trailing `array_type` parameter.
pub fn as_spreader(target: &Handle, array_type: &TypeRef, count: usize) -> Result<Handle> {
	let pos = target.arity().checked_sub(count).ok_or_else(|| {
		Error::IllegalArgument(format!("cannot spread {count} of {} parameters", target.arity()))
	})?;
	as_spreader_at(target, pos, array_type, count)
}

/// Collapses the `count` parameters starting at `pos` into one `array_type` parameter.
///
/// Each element is converted to its parameter kind as an implicit adaptation would; a
/// conversion that can never succeed is rejected here. The array length is checked on every
/// invocation, and a null array is accepted only when `count` is zero.
pub fn as_spreader_at(target: &Handle, pos: usize, array_type: &TypeRef, count: usize) -> Result<Handle> {
	let component = array_component(array_type)?;
	let end = pos
		.checked_add(count)
		.filter(|&end| end <= target.arity())
		.ok_or_else(|| {
			Error::IllegalArgument(format!("cannot spread {count} parameters at {pos} of {}", target.signature()))
		})?;
	let steps = target.signature().params()[pos..end]
		.iter()
		.map(|param| {
			Step::plan(&component, param, Mode::Implicit).map_err(|_| {
				Error::IllegalArgument(format!("{array_type} elements cannot be passed as {param}"))
			})
		})
		.collect::<Result<Vec<_>>>()?;
	let sig = target
		.signature()
		.drop_params(pos, end)?
		.insert_params(pos, &[Kind::Ref(array_type.clone())])?;
	Ok(Handle::new(
		sig,
		Form::Spread {
			target: target.clone(),
			pos,
			steps: steps.into(),
		},
	))
}

/// Replaces the trailing array parameter with `count` parameters of its component kind.
pub fn as_collector(target: &Handle, array_type: &TypeRef, count: usize) -> Result<Handle> {
	let pos = target
		.arity()
		.checked_sub(1)
		.ok_or_else(|| Error::IllegalArgument(format!("{} has no parameter to collect into", target.signature())))?;
	as_collector_at(target, pos, array_type, count)
}

/// Replaces the array parameter at `pos` with `count` parameters of `array_type`'s component.
pub fn as_collector_at(target: &Handle, pos: usize, array_type: &TypeRef, count: usize) -> Result<Handle> {
	let component = array_component(array_type)?;
	let accepts = match target.signature().param(pos) {
		Some(Kind::Ref(param)) => param.is_assignable_from(array_type),
		_ => false,
	};
	if !accepts {
		return Err(Error::IllegalArgument(format!(
			"parameter {pos} of {} cannot accept {array_type}",
			target.signature()
		)));
	}
	let collected = vec![component.clone(); count];
	let sig = target
		.signature()
		.drop_params(pos, pos + 1)?
		.insert_params(pos, &collected)?;
	Ok(Handle::new(
		sig,
		Form::Collector {
			target: target.clone(),
			pos,
			count,
			component,
		},
	))
}

/// The `Object[]` array type used by generic spreading.
pub(crate) fn object_array() -> TypeRef {
	builtins::array_of(Kind::object())
}

//! Leaf handles: literals, identity, zeros, raising and array access.

use linkage_types::convert::coerce;
use linkage_types::{builtins, Error, Kind, Result, Signature, TypeRef, Value};

use crate::handle::{Form, Handle};

/// `() -> kind` returning `value`, converted to `kind` now.
pub fn constant(kind: Kind, value: Value) -> Result<Handle> {
	if kind.is_void() {
		return Err(Error::IllegalArgument("constant of kind void".into()));
	}
	let value = coerce(value, &kind)?;
	Ok(Handle::new(Signature::new(kind, [])?, Form::Constant(value)))
}

/// `(kind) -> kind` returning its argument.
pub fn identity(kind: Kind) -> Result<Handle> {
	if kind.is_void() {
		return Err(Error::IllegalArgument("identity of kind void".into()));
	}
	Ok(Handle::new(Signature::new(kind.clone(), [kind])?, Form::Identity))
}

/// `() -> kind` returning the zero of `kind`.
pub fn zero(kind: Kind) -> Result<Handle> {
	Ok(Handle::new(Signature::new(kind, [])?, Form::Zero))
}

/// A handle of any signature that ignores its arguments and returns the zero of its return kind.
pub fn empty(sig: &Signature) -> Handle {
	Handle::new(sig.clone(), Form::Zero)
}

/// `(condition) -> ret` raising its argument.
pub fn throw_exception(ret: Kind, condition: &TypeRef) -> Result<Handle> {
	if !builtins::throwable().is_assignable_from(condition) {
		return Err(Error::IllegalArgument(format!("{condition} is not a throwable type")));
	}
	Ok(Handle::new(Signature::new(ret, [Kind::Ref(condition.clone())])?, Form::Throw))
}

fn require_array(array_type: &TypeRef) -> Result<Kind> {
	array_type
		.component()
		.cloned()
		.ok_or_else(|| Error::IllegalArgument(format!("{array_type} is not an array type")))
}

/// `(array) -> int` returning the array length.
pub fn array_length(array_type: &TypeRef) -> Result<Handle> {
	require_array(array_type)?;
	Ok(Handle::new(
		Signature::new(Kind::Int, [Kind::Ref(array_type.clone())])?,
		Form::ArrayLength,
	))
}

/// `(array, int) -> component` reading one element.
pub fn array_element_getter(array_type: &TypeRef) -> Result<Handle> {
	let component = require_array(array_type)?;
	Ok(Handle::new(
		Signature::new(component, [Kind::Ref(array_type.clone()), Kind::Int])?,
		Form::ArrayElement,
	))
}

#[cfg(test)]
mod tests {
	use linkage_types::Condition;
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn test_constant_converts_eagerly() {
		let c = constant(Kind::Long, Value::Int(5)).unwrap();
		assert_eq!(c.call(&[]).unwrap(), Value::Long(5));
		assert!(matches!(constant(Kind::Int, Value::Null), Err(Error::NullPointer(_))));
		assert!(matches!(constant(Kind::string(), Value::Int(1)), Err(Error::ClassCast { .. })));
		assert!(constant(Kind::Void, Value::Void).is_err());
	}

	#[test]
	fn test_identity_zero_and_empty() {
		let id = identity(Kind::string()).unwrap();
		assert_eq!(id.call(&[Value::str("x")]).unwrap(), Value::str("x"));
		assert_eq!(zero(Kind::Double).unwrap().call(&[]).unwrap(), Value::Double(0.0));
		assert_eq!(zero(Kind::Void).unwrap().call(&[]).unwrap(), Value::Void);

		let sig = Signature::new(Kind::Int, [Kind::string(), Kind::Long]).unwrap();
		let e = empty(&sig);
		assert_eq!(e.call(&[Value::Null, Value::Long(3)]).unwrap(), Value::Int(0));
	}

	#[test]
	fn test_throw_exception_raises_argument() {
		let thrower = throw_exception(Kind::Int, &builtins::illegal_state()).unwrap();
		let condition = Condition::new(builtins::illegal_state(), "boom").into_value();
		let err = thrower.call(&[condition]).unwrap_err();
		assert!(err.is_instance_of(&builtins::runtime_exception()));
		assert!(throw_exception(Kind::Int, &builtins::string()).is_err());
	}

	#[test]
	fn test_array_access() {
		let ints = builtins::array_of(Kind::Int);
		let array = Value::array(Kind::Int, vec![Value::Int(7), Value::Int(8)]).unwrap();
		assert_eq!(array_length(&ints).unwrap().call(&[array.clone()]).unwrap(), Value::Int(2));

		let get = array_element_getter(&ints).unwrap();
		assert_eq!(get.call(&[array.clone(), Value::Int(1)]).unwrap(), Value::Int(8));
		assert!(matches!(
			get.call(&[array, Value::Int(2)]),
			Err(Error::IndexOutOfBounds { index: 2, len: 2 })
		));
		assert!(matches!(get.call(&[Value::Null, Value::Int(0)]), Err(Error::NullPointer(_))));
		assert!(array_length(&builtins::string()).is_err());
	}
}

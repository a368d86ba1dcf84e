//! Error kinds shared by signature construction, adaptation, invocation and resolution.
//!
//! Each variant corresponds to one condition type in the builtin throwable hierarchy
//! (see [`Error::condition_type`]), which is what lets a catching combinator select failures
//! by subtype and pass them on as ordinary reference values.

use std::sync::Arc;

use crate::builtins;
use crate::ty::TypeRef;
use crate::value::{Condition, Object, Value};

/// Failure raised by any linkage operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
	/// A signature did not match structurally, or an adaptation is statically impossible.
	#[error("wrong signature: {0}")]
	WrongSignature(String),

	/// An argument was out of range or malformed.
	#[error("illegal argument: {0}")]
	IllegalArgument(String),

	/// A reference value was not an instance of the required type.
	#[error("cannot cast {value} to {target}")]
	ClassCast {
		/// Runtime type (or description) of the offending value.
		value: String,
		/// Type the value was required to conform to.
		target: String,
	},

	/// A null reference was used where a value is required.
	#[error("null pointer: {0}")]
	NullPointer(String),

	/// The resolving context lacks permission for the requested symbol.
	#[error("illegal access: {0}")]
	IllegalAccess(String),

	/// The requested symbol does not exist.
	#[error("no such {what}: {name}")]
	NotFound {
		/// Symbol category (`method`, `field`, `constructor`, `type`).
		what: &'static str,
		/// Name that failed to resolve.
		name: String,
	},

	/// The operation is never permitted on this receiver.
	#[error("unsupported operation: {0}")]
	UnsupportedOperation(String),

	/// The receiver is not in a state that permits the operation.
	#[error("illegal state: {0}")]
	IllegalState(String),

	/// An array index was outside the array bounds.
	#[error("index {index} out of bounds for length {len}")]
	IndexOutOfBounds {
		/// Requested index.
		index: i64,
		/// Array length.
		len: usize,
	},

	/// A condition raised by a handle body or re-raised after a catch.
	#[error("raised {0}")]
	Raised(Arc<Condition>),
}

/// Result alias used across the linkage crates.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Builds a [`Error::WrongSignature`] from two displayable signatures.
	pub fn signature_mismatch(expected: impl std::fmt::Display, found: impl std::fmt::Display) -> Self {
		Self::WrongSignature(format!("expected {expected}, found {found}"))
	}

	/// Builds a [`Error::ClassCast`] for `value` failing to conform to `target`.
	pub fn class_cast(value: &Value, target: impl std::fmt::Display) -> Self {
		Self::ClassCast {
			value: value.describe(),
			target: target.to_string(),
		}
	}

	/// Builds a [`Error::NotFound`].
	pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
		Self::NotFound { what, name: name.into() }
	}

	/// Returns the condition type this error is raised as.
	pub fn condition_type(&self) -> TypeRef {
		match self {
			Self::WrongSignature(_) => builtins::wrong_signature(),
			Self::IllegalArgument(_) => builtins::illegal_argument(),
			Self::ClassCast { .. } => builtins::class_cast(),
			Self::NullPointer(_) => builtins::null_pointer(),
			Self::IllegalAccess(_) => builtins::illegal_access(),
			Self::NotFound { .. } => builtins::not_found(),
			Self::UnsupportedOperation(_) => builtins::unsupported_operation(),
			Self::IllegalState(_) => builtins::illegal_state(),
			Self::IndexOutOfBounds { .. } => builtins::index_out_of_bounds(),
			Self::Raised(condition) => condition.type_of().clone(),
		}
	}

	/// Returns true when this error is raised as a subtype of `ty`.
	pub fn is_instance_of(&self, ty: &TypeRef) -> bool {
		ty.is_assignable_from(&self.condition_type())
	}

	/// Materializes this error as a condition reference value.
	///
	/// Non-raised errors remember their origin so [`Error::from_value`] restores the same
	/// variant after the value travelled through a catching combinator.
	pub fn to_value(&self) -> Value {
		let condition = match self {
			Self::Raised(condition) => condition.clone(),
			other => Arc::new(Condition::with_origin(other.condition_type(), other.to_string(), other.clone())),
		};
		Value::Object(Object::Condition(condition))
	}

	/// Recovers an error from a condition reference value.
	pub fn from_value(value: &Value) -> Self {
		match value {
			Value::Object(Object::Condition(condition)) => match condition.origin() {
				Some(origin) => origin.clone(),
				None => Self::Raised(condition.clone()),
			},
			Value::Null => Self::NullPointer("raised a null condition".into()),
			other => Self::class_cast(other, builtins::throwable()),
		}
	}
}

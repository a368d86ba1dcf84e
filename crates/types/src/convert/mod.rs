//! Conversion algebra behind every signature-changing adapter.
//!
//! A conversion is planned once, statically, from a source kind to a destination kind, and
//! the resulting [`Step`] is applied to each value at invocation time. Planning rejects
//! conversions that can never succeed ([`Error::WrongSignature`]); applying a step raises the
//! dynamic failures (class-cast, null-pointer) exactly at the failing value.
//!
//! # Modes
//!
//! * [`Mode::Implicit`] permits identity, widening primitive conversions, boxing into a
//!   supertype of the wrapper, unboxing (then widening) from a wrapper or a wrapper supertype,
//!   and checked reference casts between related types.
//! * [`Mode::Explicit`] additionally permits every primitive-to-primitive cast (narrowing
//!   truncates, boolean maps through the low bit), unboxes null to zero, treats casts to
//!   interfaces as unchecked and casts between unrelated classes as checked.
//!
//! In both modes a void source produces the destination's zero, and a void destination
//! discards the (still computed) source value.

use std::fmt;

use tracing::trace;

use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::signature::Signature;
use crate::ty::TypeRef;
use crate::value::{Object, Value};

/// Strictness of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
	Implicit,
	Explicit,
}

/// One planned value conversion.
#[derive(Clone, PartialEq, Eq)]
pub enum Step {
	Identity,
	/// Drops the value, producing void.
	Discard,
	/// Ignores the (void) input and produces the zero of the kind.
	Zero(Kind),
	/// Checked reference cast.
	Cast(TypeRef),
	/// Boxes a primitive into its wrapper; `target` is a supertype of that wrapper.
	Box { target: TypeRef },
	/// Unboxes a reference into `target`.
	Unbox { target: Kind, mode: Mode },
	/// Primitive-to-primitive conversion.
	Primitive { to: Kind },
}

impl Step {
	/// Plans the conversion of a `from` value into a `to` slot.
	pub fn plan(from: &Kind, to: &Kind, mode: Mode) -> Result<Step> {
		if from == to {
			return Ok(Step::Identity);
		}
		let impossible = || Error::WrongSignature(format!("cannot convert {from} to {to} ({mode:?})"));
		let step = match (from, to) {
			(_, Kind::Void) => Step::Discard,
			(Kind::Void, to) => Step::Zero(to.clone()),
			(Kind::Ref(src), Kind::Ref(dst)) => {
				if dst.is_assignable_from(src) {
					Step::Identity
				} else if mode == Mode::Explicit && dst.is_interface() {
					Step::Identity
				} else if src.is_assignable_from(dst) || src.is_interface() || dst.is_interface() {
					Step::Cast(dst.clone())
				} else if mode == Mode::Explicit {
					Step::Cast(dst.clone())
				} else {
					return Err(impossible());
				}
			}
			(Kind::Ref(src), prim) => match Kind::unwrapped(src) {
				Some(boxed) if mode == Mode::Explicit || boxed.widens_to(prim) => Step::Unbox {
					target: prim.clone(),
					mode,
				},
				Some(_) => return Err(impossible()),
				None if is_wrapper_supertype(src) => Step::Unbox {
					target: prim.clone(),
					mode,
				},
				None => return Err(impossible()),
			},
			(prim, Kind::Ref(dst)) => {
				if dst.is_assignable_from(&prim.wrapper()) {
					Step::Box { target: dst.clone() }
				} else {
					return Err(impossible());
				}
			}
			(prim_from, prim_to) => {
				if mode == Mode::Explicit || prim_from.widens_to(prim_to) {
					Step::Primitive { to: prim_to.clone() }
				} else {
					return Err(impossible());
				}
			}
		};
		Ok(step)
	}

	pub fn is_identity(&self) -> bool {
		matches!(self, Step::Identity)
	}

	/// Applies the step to one value.
	pub fn apply(&self, value: Value) -> Result<Value> {
		match self {
			Step::Identity => Ok(value),
			Step::Discard => Ok(Value::Void),
			Step::Zero(kind) => Ok(kind.zero()),
			Step::Cast(target) => match &value {
				Value::Null => Ok(value),
				Value::Object(object) if target.is_assignable_from(&object.type_of()) => Ok(value),
				other => Err(Error::class_cast(other, target)),
			},
			Step::Box { .. } => Ok(value.boxed()),
			Step::Unbox { target, mode } => unbox(value, target, *mode),
			Step::Primitive { to } => cast_primitive(&value, to),
		}
	}
}

impl fmt::Debug for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Step::Identity => f.write_str("identity"),
			Step::Discard => f.write_str("discard"),
			Step::Zero(kind) => write!(f, "zero({kind})"),
			Step::Cast(ty) => write!(f, "cast({ty})"),
			Step::Box { target } => write!(f, "box({target})"),
			Step::Unbox { target, mode } => write!(f, "unbox({target}, {mode:?})"),
			Step::Primitive { to } => write!(f, "prim({to})"),
		}
	}
}

/// True when `ty` is a proper supertype of at least one wrapper (`Object`, `Number`).
fn is_wrapper_supertype(ty: &TypeRef) -> bool {
	Kind::PRIMITIVES.iter().any(|p| ty.is_assignable_from(&p.wrapper()))
}

fn unbox(value: Value, target: &Kind, mode: Mode) -> Result<Value> {
	match &value {
		Value::Null if mode == Mode::Explicit => Ok(target.zero()),
		Value::Null => Err(Error::NullPointer(format!("cannot unbox null to {target}"))),
		Value::Object(Object::Boxed(inner)) => {
			if mode == Mode::Explicit || inner.kind().widens_to(target) {
				cast_primitive(inner, target)
			} else {
				Err(Error::class_cast(&value, target.wrapper()))
			}
		}
		other => Err(Error::class_cast(other, target.wrapper())),
	}
}

enum Numeric {
	Integral(i64),
	Floating(f64),
}

/// Casts a primitive value to another primitive kind with two's-complement truncation,
/// saturating float-to-integral rounding toward zero and low-bit boolean mapping.
pub fn cast_primitive(value: &Value, to: &Kind) -> Result<Value> {
	let n = match *value {
		Value::Boolean(b) => Numeric::Integral(i64::from(b)),
		Value::Byte(v) => Numeric::Integral(i64::from(v)),
		Value::Short(v) => Numeric::Integral(i64::from(v)),
		Value::Int(v) => Numeric::Integral(i64::from(v)),
		Value::Long(v) => Numeric::Integral(v),
		Value::Float(v) => Numeric::Floating(f64::from(v)),
		Value::Double(v) => Numeric::Floating(v),
		_ => return Err(Error::class_cast(value, to)),
	};
	// Narrow floating values to int first so byte/short truncate the way int does.
	let as_int = |n: &Numeric| match *n {
		Numeric::Integral(i) => i as i32,
		Numeric::Floating(f) => f as i32,
	};
	let out = match to {
		Kind::Boolean => Value::Boolean(as_int(&n) & 1 != 0),
		Kind::Byte => Value::Byte(as_int(&n) as i8),
		Kind::Short => Value::Short(as_int(&n) as i16),
		Kind::Int => Value::Int(as_int(&n)),
		Kind::Long => Value::Long(match n {
			Numeric::Integral(i) => i,
			Numeric::Floating(f) => f as i64,
		}),
		Kind::Float => Value::Float(match (n, value) {
			(_, Value::Float(v)) => *v,
			(Numeric::Integral(i), _) => i as f32,
			(Numeric::Floating(f), _) => f as f32,
		}),
		Kind::Double => Value::Double(match n {
			Numeric::Integral(i) => i as f64,
			Numeric::Floating(f) => f,
		}),
		Kind::Void => Value::Void,
		Kind::Ref(_) => return Err(Error::class_cast(value, to)),
	};
	Ok(out)
}

/// Converts a literal so it may occupy a slot of `to`.
///
/// Used where a value is bound eagerly: references are checked against the slot type,
/// primitives may widen, boxes unbox then widen, and null into a primitive slot is a
/// null-pointer failure.
pub fn coerce(value: Value, to: &Kind) -> Result<Value> {
	match to {
		Kind::Void => Err(Error::IllegalArgument("cannot bind a value to a void slot".into())),
		Kind::Ref(ty) => {
			let value = value.boxed();
			if value.conforms_to(to) {
				Ok(value)
			} else {
				Err(Error::class_cast(&value, ty))
			}
		}
		prim => match &value {
			Value::Null => Err(Error::NullPointer(format!("cannot bind null to {prim}"))),
			Value::Object(Object::Boxed(inner)) if inner.kind().widens_to(prim) => cast_primitive(inner, prim),
			v if v.kind().widens_to(prim) => cast_primitive(v, prim),
			other => Err(Error::class_cast(other, prim.wrapper())),
		},
	}
}

/// Per-position conversions adapting a handle of one signature to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptPlan {
	/// Caller argument to callee parameter, per position.
	pub args: Vec<Step>,
	/// Callee result to caller result.
	pub ret: Step,
}

impl AdaptPlan {
	/// Plans adapting a callee of signature `callee` to be invoked as `caller`.
	pub fn new(callee: &Signature, caller: &Signature, mode: Mode) -> Result<Self> {
		if callee.arity() != caller.arity() {
			return Err(Error::WrongSignature(format!(
				"cannot adapt {callee} to {caller}: arity {} != {}",
				callee.arity(),
				caller.arity()
			)));
		}
		let args = caller
			.params()
			.iter()
			.zip(callee.params())
			.map(|(from, to)| Step::plan(from, to, mode))
			.collect::<Result<Vec<_>>>()?;
		let ret = Step::plan(callee.ret(), caller.ret(), mode)?;
		let plan = Self { args, ret };
		trace!(callee = %callee, caller = %caller, mode = ?mode, plan = ?plan, "linkage.adapt.plan");
		Ok(plan)
	}

	pub fn is_identity(&self) -> bool {
		self.ret.is_identity() && self.args.iter().all(Step::is_identity)
	}

	/// Converts caller arguments into callee arguments.
	pub fn convert_args(&self, args: &[Value]) -> Result<Vec<Value>> {
		self.args.iter().zip(args).map(|(step, v)| step.apply(v.clone())).collect()
	}
}

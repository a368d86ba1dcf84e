//! The handle value and its interpreter.
//!
//! # Mental model
//!
//! A [`Handle`] pairs a fixed [`Signature`] with a [`Form`]: one node of a closed tagged
//! union. Leaf forms run native code or produce literals; every other form owns its component
//! handles plus snapshot copies of any auxiliary data, and describes how to rewrite the argument
//! list before (and the result after) delegating to them. Evaluation is a recursive `match`.
//!
//! # Invariants
//!
//! - Forms are immutable after construction. The only indirection that can change what runs is
//!   [`Form::Dynamic`], which reads a dispatch cell.
//! - Every combinator validates shapes at construction, so the interpreter only raises the
//!   dynamic failures of the conversion algebra, array unpacking and handle bodies.
//! - Arguments reaching [`Handle::eval`] conform to the handle's signature.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use linkage_types::{builtins, config, AdaptPlan, Error, Kind, Mode, NativeFn, Object, OpaqueObject, Result, Signature, Step, TypeRef, Value};
use smallvec::SmallVec;
use tracing::{trace, trace_span};

use crate::invalidation::InvalidationToken;

/// Argument buffer threaded through evaluation.
pub(crate) type Args = SmallVec<[Value; 6]>;

/// Source of the current target of a dispatch cell.
pub(crate) trait TargetSource: Send + Sync + fmt::Debug {
	fn current(&self) -> Result<Handle>;
}

/// One node of the combinator tree.
pub(crate) enum Form {
	Native {
		name: Arc<str>,
		body: NativeFn,
	},
	Constant(Value),
	Identity,
	/// Returns the zero of the return kind, ignoring arguments.
	Zero,
	/// Raises its sole argument.
	Throw,
	ArrayLength,
	ArrayElement,
	Insert {
		target: Handle,
		pos: usize,
		values: Arc<[Value]>,
	},
	Drop {
		target: Handle,
		pos: usize,
		count: usize,
	},
	Permute {
		target: Handle,
		reorder: Arc<[usize]>,
	},
	Filter {
		target: Handle,
		pos: usize,
		filters: Arc<[Option<Handle>]>,
	},
	/// Replaces the argument at `pos` with `combiner` applied to `positions`.
	FilterWithCombiner {
		target: Handle,
		pos: usize,
		combiner: Handle,
		positions: Arc<[usize]>,
	},
	FilterReturn {
		target: Handle,
		filter: Handle,
	},
	/// Replaces `filter.arity()` arguments at `pos` with the filter result (or nothing if void).
	Collect {
		target: Handle,
		pos: usize,
		filter: Handle,
	},
	/// Inserts `combiner` applied to `positions` at `pos` (or nothing if void).
	Fold {
		target: Handle,
		pos: usize,
		combiner: Handle,
		positions: Arc<[usize]>,
	},
	Guard {
		test: Handle,
		on_true: Handle,
		on_false: Handle,
	},
	Catch {
		target: Handle,
		condition: TypeRef,
		handler: Handle,
	},
	TryFinally {
		target: Handle,
		cleanup: Handle,
	},
	/// Unpacks the array at `pos` into `steps.len()` arguments.
	Spread {
		target: Handle,
		pos: usize,
		steps: Arc<[Step]>,
	},
	/// Packs `count` arguments at `pos` into an array of `component`.
	Collector {
		target: Handle,
		pos: usize,
		count: usize,
		component: Kind,
	},
	/// Invokes the leading handle argument as `sig`.
	Invoker {
		sig: Signature,
		exact: bool,
	},
	Adapt {
		target: Handle,
		plan: AdaptPlan,
	},
	Dynamic(Arc<dyn TargetSource>),
	Switch {
		token: InvalidationToken,
		valid: Handle,
		fallback: Handle,
	},
}

impl Form {
	fn name(&self) -> &'static str {
		match self {
			Form::Native { .. } => "native",
			Form::Constant(_) => "constant",
			Form::Identity => "identity",
			Form::Zero => "zero",
			Form::Throw => "throw",
			Form::ArrayLength => "array_length",
			Form::ArrayElement => "array_element",
			Form::Insert { .. } => "insert",
			Form::Drop { .. } => "drop",
			Form::Permute { .. } => "permute",
			Form::Filter { .. } => "filter",
			Form::FilterWithCombiner { .. } => "filter_with_combiner",
			Form::FilterReturn { .. } => "filter_return",
			Form::Collect { .. } => "collect",
			Form::Fold { .. } => "fold",
			Form::Guard { .. } => "guard",
			Form::Catch { .. } => "catch",
			Form::TryFinally { .. } => "try_finally",
			Form::Spread { .. } => "spread",
			Form::Collector { .. } => "collector",
			Form::Invoker { exact: true, .. } => "exact_invoker",
			Form::Invoker { exact: false, .. } => "invoker",
			Form::Adapt { .. } => "adapt",
			Form::Dynamic(_) => "dynamic",
			Form::Switch { .. } => "switch",
		}
	}
}

pub(crate) struct HandleData {
	sig: Signature,
	form: Form,
}

/// A callable value with exactly one signature.
#[derive(Clone)]
pub struct Handle(Arc<HandleData>);

impl Handle {
	pub(crate) fn new(sig: Signature, form: Form) -> Self {
		trace!(sig = %sig, form = form.name(), "linkage.handle.new");
		Self(Arc::new(HandleData { sig, form }))
	}

	/// A handle running a native closure.
	pub fn native<F>(name: &str, sig: Signature, body: F) -> Self
	where
		F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		Self::from_native_fn(name, sig, Arc::new(body))
	}

	/// A handle running an already shared native body.
	pub fn from_native_fn(name: &str, sig: Signature, body: NativeFn) -> Self {
		Self::new(sig, Form::Native { name: name.into(), body })
	}

	pub fn signature(&self) -> &Signature {
		&self.0.sig
	}

	pub fn arity(&self) -> usize {
		self.0.sig.arity()
	}

	pub(crate) fn param(&self, index: usize) -> &Kind {
		&self.0.sig.params()[index]
	}

	pub(crate) fn ret(&self) -> &Kind {
		self.0.sig.ret()
	}

	/// Invokes with a call-site signature that must equal this handle's signature.
	///
	/// # Errors
	///
	/// [`Error::WrongSignature`] when `sig` differs, or when the actual arguments do not fit it.
	pub fn invoke_exact(&self, sig: &Signature, args: &[Value]) -> Result<Value> {
		if sig != self.signature() {
			return Err(Error::signature_mismatch(self.signature(), sig));
		}
		let config = config::current();
		if args.len() != sig.arity() {
			return Err(Error::WrongSignature(format!(
				"{sig} takes {} arguments, got {}",
				sig.arity(),
				args.len()
			)));
		}
		if config.check_exact_arguments {
			if let Some((i, (arg, kind))) = args.iter().zip(sig.params()).enumerate().find(|(_, (a, k))| !a.conforms_to(k)) {
				return Err(Error::WrongSignature(format!(
					"argument {i} of {sig}: expected {kind}, found {}",
					arg.describe()
				)));
			}
		}
		if config.trace_invocations {
			let span = trace_span!("linkage.invoke", sig = %sig, form = self.0.form.name());
			let _enter = span.enter();
			return self.eval(args.iter().cloned().collect());
		}
		self.eval(args.iter().cloned().collect())
	}

	/// Exact invocation with this handle's own signature.
	pub fn call(&self, args: &[Value]) -> Result<Value> {
		self.invoke_exact(&self.0.sig, args)
	}

	/// Invokes through an implicit adapter to the call-site signature `sig`.
	pub fn invoke(&self, sig: &Signature, args: &[Value]) -> Result<Value> {
		self.as_type(sig)?.invoke_exact(sig, args)
	}

	/// Invokes with every argument and the result treated as `Object`.
	pub fn invoke_with_arguments(&self, args: &[Value]) -> Result<Value> {
		let sig = Signature::generic(args.len())?;
		let boxed: Vec<Value> = args.iter().cloned().map(Value::boxed).collect();
		self.invoke(&sig, &boxed)
	}

	/// Adapts this handle to `sig` with implicit conversions.
	///
	/// Returns `self` unchanged when the signature already matches, so repeating an
	/// adaptation to the same signature is a no-op.
	pub fn as_type(&self, sig: &Signature) -> Result<Handle> {
		self.adapt(sig, Mode::Implicit)
	}

	pub(crate) fn adapt(&self, sig: &Signature, mode: Mode) -> Result<Handle> {
		if sig == self.signature() {
			return Ok(self.clone());
		}
		let plan = AdaptPlan::new(self.signature(), sig, mode)?;
		Ok(Handle::new(
			sig.clone(),
			Form::Adapt {
				target: self.clone(),
				plan,
			},
		))
	}

	/// Wraps this handle as a reference value of type `rt.Handle`.
	pub fn to_value(&self) -> Value {
		Value::Object(Object::Opaque(self.0.clone()))
	}

	/// Recovers a handle from a reference value.
	pub fn from_value(value: &Value) -> Result<Handle> {
		match value {
			Value::Null => Err(Error::NullPointer("handle is null".into())),
			other => other
				.opaque_arc::<HandleData>()
				.map(Handle)
				.ok_or_else(|| Error::class_cast(other, builtins::handle())),
		}
	}

	/// Evaluates with arguments already conforming to the signature.
	pub(crate) fn eval(&self, mut args: Args) -> Result<Value> {
		match &self.0.form {
			Form::Native { body, .. } => body(&args),
			Form::Constant(value) => Ok(value.clone()),
			Form::Identity => Ok(args.swap_remove(0)),
			Form::Zero => Ok(self.ret().zero()),
			Form::Throw => Err(Error::from_value(&args[0])),
			Form::ArrayLength => {
				let array = array_arg(&args[0])?;
				Ok(Value::Int(i32::try_from(array.len()).unwrap_or(i32::MAX)))
			}
			Form::ArrayElement => {
				let array = array_arg(&args[0])?;
				let index = args[1].as_int().unwrap_or_default();
				array.get(i64::from(index))
			}
			Form::Insert { target, pos, values } => {
				args.insert_many(*pos, values.iter().cloned());
				target.eval(args)
			}
			Form::Drop { target, pos, count } => {
				args.drain(*pos..*pos + *count);
				target.eval(args)
			}
			Form::Permute { target, reorder } => target.eval(reorder.iter().map(|&i| args[i].clone()).collect()),
			Form::Filter { target, pos, filters } => {
				for (i, filter) in filters.iter().enumerate() {
					if let Some(filter) = filter {
						let slot = &mut args[pos + i];
						let input = std::mem::replace(slot, Value::Void);
						*slot = filter.eval(smallvec::smallvec![input])?;
					}
				}
				target.eval(args)
			}
			Form::FilterWithCombiner {
				target,
				pos,
				combiner,
				positions,
			} => {
				let replacement = combiner.eval(pick(&args, positions))?;
				args[*pos] = replacement;
				target.eval(args)
			}
			Form::FilterReturn { target, filter } => {
				let result = target.eval(args)?;
				if target.ret().is_void() {
					filter.eval(Args::new())
				} else {
					filter.eval(smallvec::smallvec![result])
				}
			}
			Form::Collect { target, pos, filter } => {
				let consumed: Args = args.drain(*pos..*pos + filter.arity()).collect();
				let result = filter.eval(consumed)?;
				if !filter.ret().is_void() {
					args.insert(*pos, result);
				}
				target.eval(args)
			}
			Form::Fold {
				target,
				pos,
				combiner,
				positions,
			} => {
				let result = combiner.eval(pick(&args, positions))?;
				if !combiner.ret().is_void() {
					args.insert(*pos, result);
				}
				target.eval(args)
			}
			Form::Guard { test, on_true, on_false } => {
				let verdict = test.eval(args[..test.arity()].iter().cloned().collect())?;
				match verdict {
					Value::Boolean(true) => on_true.eval(args),
					_ => on_false.eval(args),
				}
			}
			Form::Catch {
				target,
				condition,
				handler,
			} => {
				let leading: Args = args[..handler.arity() - 1].iter().cloned().collect();
				match target.eval(args) {
					Err(err) if err.is_instance_of(condition) => {
						let mut handler_args = Args::with_capacity(handler.arity());
						handler_args.push(err.to_value());
						handler_args.extend(leading);
						handler.eval(handler_args)
					}
					other => other,
				}
			}
			Form::TryFinally { target, cleanup } => {
				let keep_result = !target.ret().is_void();
				let leading_count = cleanup.arity() - 1 - usize::from(keep_result);
				let leading: Args = args[..leading_count].iter().cloned().collect();
				let outcome = target.eval(args);
				let mut cleanup_args = Args::with_capacity(cleanup.arity());
				match &outcome {
					Ok(result) => {
						cleanup_args.push(Value::Null);
						if keep_result {
							cleanup_args.push(result.clone());
						}
					}
					Err(err) => {
						cleanup_args.push(err.to_value());
						if keep_result {
							cleanup_args.push(target.ret().zero());
						}
					}
				}
				cleanup_args.extend(leading);
				let cleaned = cleanup.eval(cleanup_args)?;
				outcome.map(|_| cleaned)
			}
			Form::Spread { target, pos, steps } => {
				let array = args.remove(*pos);
				let elements: &[Value] = match &array {
					Value::Null if steps.is_empty() => &[],
					Value::Null => return Err(Error::NullPointer(format!("cannot spread null into {} arguments", steps.len()))),
					other => array_arg(other)?.elements(),
				};
				if elements.len() != steps.len() {
					return Err(Error::IllegalArgument(format!(
						"array of length {} cannot fill {} arguments",
						elements.len(),
						steps.len()
					)));
				}
				let spread = steps
					.iter()
					.zip(elements)
					.map(|(step, element)| step.apply(element.clone()))
					.collect::<Result<Args>>()?;
				args.insert_many(*pos, spread);
				target.eval(args)
			}
			Form::Collector {
				target,
				pos,
				count,
				component,
			} => {
				let packed: Vec<Value> = args.drain(*pos..*pos + *count).collect();
				args.insert(*pos, Value::array(component.clone(), packed)?);
				target.eval(args)
			}
			Form::Invoker { sig, exact } => {
				let callee = Handle::from_value(&args.remove(0))?;
				let callee = if *exact {
					if callee.signature() != sig {
						return Err(Error::signature_mismatch(callee.signature(), sig));
					}
					callee
				} else {
					callee.as_type(sig)?
				};
				callee.eval(args)
			}
			Form::Adapt { target, plan } => {
				let converted = plan
					.args
					.iter()
					.zip(args)
					.map(|(step, arg)| step.apply(arg))
					.collect::<Result<Args>>()?;
				let result = target.eval(converted)?;
				plan.ret.apply(result)
			}
			Form::Dynamic(source) => source.current()?.eval(args),
			Form::Switch { token, valid, fallback } => {
				if token.has_been_invalidated() {
					fallback.eval(args)
				} else {
					valid.eval(args)
				}
			}
		}
	}
}

fn pick(args: &Args, positions: &[usize]) -> Args {
	positions.iter().map(|&i| args[i].clone()).collect()
}

fn array_arg(value: &Value) -> Result<&linkage_types::Array> {
	match value {
		Value::Null => Err(Error::NullPointer("array is null".into())),
		other => other.as_array().ok_or_else(|| Error::class_cast(other, "array")),
	}
}

impl OpaqueObject for HandleData {
	fn type_of(&self) -> TypeRef {
		builtins::handle()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

impl fmt::Debug for HandleData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.form {
			Form::Native { name, .. } => write!(f, "Handle{}[{name}]", self.sig),
			form => write!(f, "Handle{}[{}]", self.sig, form.name()),
		}
	}
}

impl fmt::Debug for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl PartialEq for Handle {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Handle {}

impl From<Handle> for Value {
	fn from(handle: Handle) -> Self {
		handle.to_value()
	}
}

#[cfg(test)]
mod tests;

//! Dispatch cells: mutable indirection to a handle of fixed signature.
//!
//! # Mental model
//!
//! A call site holds the handle returned by [`DispatchCell::dynamic_invoker`]. Each invocation
//! of that handle reads the cell's current target and invokes it, so rebinding the cell
//! redirects every call site built on it without touching them.
//!
//! # Invariants
//!
//! * A cell's signature is fixed at construction; every target it ever holds has exactly that
//!   signature. Rebinding to a different signature fails with [`Error::WrongSignature`].
//! * A [`ConstantCell`] is bound exactly once. Every [`DispatchCell::set_target`] on it fails.
//!
//! # Concurrency & ordering
//!
//! * [`MutableCell`] publishes a rebind with a plain store. Another thread is only guaranteed to
//!   see it after [`MutableCell::sync_all`] names the cell and returns.
//! * [`VolatileCell`] rebinds are sequentially consistent: a read that follows a write in any
//!   thread sees it without further synchronization.
//! * Both read through `ArcSwap`, so invocation never blocks on a writer.
//!
//! # Lifecycle
//!
//! * Constant: constructing, then frozen. The hook path exposes the cell while constructing;
//!   reading its target in that window fails with [`Error::IllegalState`].
//! * Mutable and volatile: live from construction, rebound any number of times.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{self, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use linkage_types::{builtins, Error, Kind, Object, OpaqueObject, Result, Signature, TypeRef, Value};
use tracing::debug;

use crate::handle::{Form, Handle, TargetSource};

/// A mutable reference to a handle with a fixed signature.
pub trait DispatchCell: Send + Sync {
	fn signature(&self) -> &Signature;

	/// The handle currently bound.
	fn target(&self) -> Result<Handle>;

	/// Rebinds the cell.
	fn set_target(&self, target: &Handle) -> Result<()>;

	/// A handle of the cell's signature that invokes whatever target is current at call time.
	fn dynamic_invoker(&self) -> Handle;

	/// The cell as a reference value.
	fn to_value(&self) -> Value;
}

fn check_target(sig: &Signature, target: &Handle) -> Result<()> {
	if target.signature() != sig {
		return Err(Error::signature_mismatch(sig, target.signature()));
	}
	Ok(())
}

fn recover<T: OpaqueObject>(value: &Value, ty: TypeRef) -> Result<Arc<T>> {
	match value {
		Value::Null => Err(Error::NullPointer("cell is null".into())),
		other => other.opaque_arc::<T>().ok_or_else(|| Error::class_cast(other, ty)),
	}
}

struct ConstantInner {
	sig: Signature,
	target: OnceLock<Handle>,
}

/// A cell bound once at construction.
#[derive(Clone)]
pub struct ConstantCell(Arc<ConstantInner>);

impl ConstantCell {
	/// Binds `target` with its own signature.
	pub fn new(target: &Handle) -> Self {
		Self(Arc::new(ConstantInner {
			sig: target.signature().clone(),
			target: OnceLock::from(target.clone()),
		}))
	}

	/// Binds `target`, which must have exactly `sig`.
	pub fn with_signature(sig: &Signature, target: &Handle) -> Result<Self> {
		check_target(sig, target)?;
		Ok(Self::new(target))
	}

	/// Computes the target by invoking `hook` with the half-built cell.
	///
	/// `hook` takes one reference argument that accepts a `ConstantCell` and returns a handle
	/// value. The returned handle must have exactly `sig`.
	pub fn from_hook(sig: &Signature, hook: &Handle) -> Result<Self> {
		let accepts_cell = matches!(
			hook.signature().params(),
			[Kind::Ref(param)] if param.is_assignable_from(&builtins::constant_cell())
		);
		let returns_handle = matches!(hook.signature().ret(), Kind::Ref(ret) if ret.is_assignable_from(&builtins::handle()));
		if !accepts_cell || !returns_handle {
			return Err(Error::IllegalArgument(format!(
				"hook {hook:?} must take a cell and return a handle"
			)));
		}
		Self::from_hook_fn(sig, |cell| Handle::from_value(&hook.call(&[cell.to_value()])?))
	}

	/// Computes the target by calling `hook` with the half-built cell.
	pub fn from_hook_fn<F>(sig: &Signature, hook: F) -> Result<Self>
	where
		F: FnOnce(&ConstantCell) -> Result<Handle>,
	{
		let cell = Self(Arc::new(ConstantInner {
			sig: sig.clone(),
			target: OnceLock::new(),
		}));
		let target = hook(&cell)?;
		check_target(sig, &target)?;
		if cell.0.target.set(target).is_err() {
			return Err(Error::IllegalState("constant cell bound twice".into()));
		}
		debug!(sig = %sig, "linkage.cell.constant.bind");
		Ok(cell)
	}

	/// Recovers a cell from a reference value.
	pub fn from_value(value: &Value) -> Result<Self> {
		recover::<ConstantInner>(value, builtins::constant_cell()).map(Self)
	}
}

impl DispatchCell for ConstantCell {
	fn signature(&self) -> &Signature {
		&self.0.sig
	}

	fn target(&self) -> Result<Handle> {
		self.0.current()
	}

	fn set_target(&self, _target: &Handle) -> Result<()> {
		Err(Error::UnsupportedOperation("constant cell cannot be rebound".into()))
	}

	fn dynamic_invoker(&self) -> Handle {
		// Bound cells hand out their target directly; a cell still in its hook defers the read.
		match self.0.target.get() {
			Some(target) => target.clone(),
			None => Handle::new(self.0.sig.clone(), Form::Dynamic(self.0.clone())),
		}
	}

	fn to_value(&self) -> Value {
		Value::Object(Object::Opaque(self.0.clone()))
	}
}

impl TargetSource for ConstantInner {
	fn current(&self) -> Result<Handle> {
		self.target
			.get()
			.cloned()
			.ok_or_else(|| Error::IllegalState("constant cell target read during construction".into()))
	}
}

struct SwapInner {
	sig: Signature,
	target: ArcSwap<Handle>,
	volatile: bool,
}

impl SwapInner {
	fn new(target: &Handle, volatile: bool) -> Arc<Self> {
		Arc::new(Self {
			sig: target.signature().clone(),
			target: ArcSwap::from_pointee(target.clone()),
			volatile,
		})
	}

	fn rebind(&self, target: &Handle) -> Result<()> {
		check_target(&self.sig, target)?;
		self.target.store(Arc::new(target.clone()));
		debug!(sig = %self.sig, volatile = self.volatile, "linkage.cell.rebind");
		Ok(())
	}
}

impl TargetSource for SwapInner {
	fn current(&self) -> Result<Handle> {
		Ok(Handle::clone(&self.target.load()))
	}
}

/// A cell rebound with plain stores and published by [`MutableCell::sync_all`].
#[derive(Clone)]
pub struct MutableCell(Arc<SwapInner>);

impl MutableCell {
	pub fn new(target: &Handle) -> Self {
		Self(SwapInner::new(target, false))
	}

	/// A cell of `sig` whose initial target returns zero and ignores its arguments.
	pub fn with_signature(sig: &Signature) -> Self {
		Self::new(&crate::basic::empty(sig))
	}

	/// Publishes every earlier rebind of `cells` to all threads.
	///
	/// Synchronous: when this returns, a reader on any thread that reads one of `cells` after
	/// observing the return sees that cell's latest target.
	///
	/// Rebinds already publish through their atomic store, so this issues one global fence
	/// covering every cell; `cells` is only counted for the log event.
	pub fn sync_all(cells: &[&MutableCell]) {
		atomic::fence(Ordering::SeqCst);
		debug!(cells = cells.len(), "linkage.cell.sync_all");
	}

	/// Recovers a cell from a reference value.
	pub fn from_value(value: &Value) -> Result<Self> {
		match recover::<SwapInner>(value, builtins::mutable_cell())? {
			inner if !inner.volatile => Ok(Self(inner)),
			_ => Err(Error::class_cast(value, builtins::mutable_cell())),
		}
	}
}

/// A cell whose rebinds are immediately visible to every thread.
#[derive(Clone)]
pub struct VolatileCell(Arc<SwapInner>);

impl VolatileCell {
	pub fn new(target: &Handle) -> Self {
		Self(SwapInner::new(target, true))
	}

	pub fn with_signature(sig: &Signature) -> Self {
		Self::new(&crate::basic::empty(sig))
	}

	/// Recovers a cell from a reference value.
	pub fn from_value(value: &Value) -> Result<Self> {
		match recover::<SwapInner>(value, builtins::volatile_cell())? {
			inner if inner.volatile => Ok(Self(inner)),
			_ => Err(Error::class_cast(value, builtins::volatile_cell())),
		}
	}
}

macro_rules! swap_cell {
	($cell:ty) => {
		impl DispatchCell for $cell {
			fn signature(&self) -> &Signature {
				&self.0.sig
			}

			fn target(&self) -> Result<Handle> {
				self.0.current()
			}

			fn set_target(&self, target: &Handle) -> Result<()> {
				self.0.rebind(target)
			}

			fn dynamic_invoker(&self) -> Handle {
				Handle::new(self.0.sig.clone(), Form::Dynamic(self.0.clone()))
			}

			fn to_value(&self) -> Value {
				Value::Object(Object::Opaque(self.0.clone()))
			}
		}

		impl fmt::Debug for $cell {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				fmt::Debug::fmt(&*self.0, f)
			}
		}
	};
}

swap_cell!(MutableCell);
swap_cell!(VolatileCell);

impl OpaqueObject for ConstantInner {
	fn type_of(&self) -> TypeRef {
		builtins::constant_cell()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

impl OpaqueObject for SwapInner {
	fn type_of(&self) -> TypeRef {
		if self.volatile {
			builtins::volatile_cell()
		} else {
			builtins::mutable_cell()
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

impl fmt::Debug for ConstantInner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.target.get() {
			Some(target) => write!(f, "ConstantCell{}[{target:?}]", self.sig),
			None => write!(f, "ConstantCell{}[unbound]", self.sig),
		}
	}
}

impl fmt::Debug for SwapInner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = if self.volatile { "VolatileCell" } else { "MutableCell" };
		write!(f, "{name}{}[{:?}]", self.sig, **self.target.load())
	}
}

impl fmt::Debug for ConstantCell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

//! Resolution of named members into handles.
//!
//! Every entry point resolves first and checks access second, so a missing symbol reports
//! [`Error::NotFound`] whatever the context, and an existing one the context cannot see
//! reports [`Error::IllegalAccess`].
//!
//! Instance handles take the receiver as their first parameter. Virtual handles look the
//! method up again on the receiver's runtime type at every call, unless the resolved method
//! is private or final.

use std::sync::Arc;

use linkage_handle::{Handle, bind_to};
use linkage_types::{
	Error, FieldStorage, Instance, Kind, Member, MemberBody, Modifiers, NativeFn, Object, Result, Signature, TypeRef,
	Value, builtins,
};
use tracing::trace;

use crate::context::AccessContext;
use crate::lattice;

/// A method found by name and signature.
struct Resolved {
	declaring: TypeRef,
	modifiers: Modifiers,
	body: NativeFn,
}

impl AccessContext {
	/// A handle on the static method `name` of `ty`.
	pub fn find_static(&self, ty: &TypeRef, name: &str, sig: &Signature) -> Result<Handle> {
		let method = resolve_method(ty, name, sig)?;
		if !method.modifiers.is_static() {
			return Err(expected(&method.declaring, name, "a static method"));
		}
		self.check_member(&method.declaring, name, method.modifiers, None)?;
		Ok(self.resolved(&method.declaring, name, sig.clone(), method.body))
	}

	/// A handle on the instance method `name` of `ty`, receiver first.
	///
	/// Calls dispatch on the receiver's runtime type. A protected method reached by
	/// inheritance from another package takes the lookup type as its receiver.
	pub fn find_virtual(&self, ty: &TypeRef, name: &str, sig: &Signature) -> Result<Handle> {
		let method = resolve_method(ty, name, sig)?;
		if method.modifiers.is_static() {
			return Err(expected(&method.declaring, name, "an instance method"));
		}
		self.check_member(&method.declaring, name, method.modifiers, None)?;
		let receiver = self.receiver_type(ty, &method.declaring, method.modifiers);
		let handle_sig = sig.insert_params(0, &[Kind::Ref(receiver)])?;
		if method.modifiers.intersects(Modifiers::PRIVATE | Modifiers::FINAL) {
			let body = with_receiver(name, method.body);
			return Ok(self.resolved(&method.declaring, name, handle_sig, body));
		}
		let selector: Arc<str> = name.into();
		let method_sig = sig.clone();
		let fallback = method.body;
		let body: NativeFn = Arc::new(move |args: &[Value]| {
			let runtime = receiver_of(args, &selector)?;
			match runtime.find_member(|m| overrides(m, &selector, &method_sig)) {
				Some((_, Member { body: MemberBody::Method { body, .. }, .. })) => body(args),
				_ => fallback(args),
			}
		});
		Ok(self.resolved(&method.declaring, name, handle_sig, body))
	}

	/// A handle on the instance method `name` of `ty` that never dispatches.
	///
	/// The context must hold private access and `special_caller` must be its lookup type,
	/// which becomes the receiver type.
	pub fn find_special(&self, ty: &TypeRef, name: &str, sig: &Signature, special_caller: &TypeRef) -> Result<Handle> {
		if !self.has_private_access() || special_caller != self.lookup_type() {
			return Err(Error::IllegalAccess(format!(
				"{self} cannot make special calls on behalf of {special_caller}"
			)));
		}
		if !ty.is_assignable_from(special_caller) {
			return Err(Error::IllegalAccess(format!("{special_caller} is not a subtype of {ty}")));
		}
		let method = resolve_method(ty, name, sig)?;
		if method.modifiers.is_static() {
			return Err(expected(&method.declaring, name, "an instance method"));
		}
		self.check_member(&method.declaring, name, method.modifiers, Some(special_caller))?;
		let handle_sig = sig.insert_params(0, &[Kind::Ref(special_caller.clone())])?;
		let body = with_receiver(name, method.body);
		Ok(self.resolved(&method.declaring, name, handle_sig, body))
	}

	/// A handle that allocates a `ty` and runs its constructor taking `params`.
	///
	/// `params` must return void; the handle returns the new instance.
	pub fn find_constructor(&self, ty: &TypeRef, params: &Signature) -> Result<Handle> {
		let missing = || Error::not_found("constructor", format!("{ty}{params}"));
		if !params.ret().is_void() {
			return Err(missing());
		}
		let (modifiers, init) = ty
			.members()
			.iter()
			.find_map(|m| match &m.body {
				MemberBody::Constructor { params: declared, init } if declared.params() == params.params() => {
					Some((m.modifiers, init.clone()))
				}
				_ => None,
			})
			.ok_or_else(missing)?;
		if ty.is_interface() || ty.modifiers().contains(Modifiers::ABSTRACT) {
			return Err(Error::IllegalAccess(format!("cannot instantiate abstract {ty}")));
		}
		// A protected constructor is only usable from its own package.
		let modifiers = modifiers - Modifiers::PROTECTED;
		self.check_member(ty, "<init>", modifiers, None)?;
		let handle_sig = Signature::new(Kind::Ref(ty.clone()), params.params().iter().cloned())?;
		let allocated = ty.clone();
		let body: NativeFn = Arc::new(move |args: &[Value]| {
			let instance = Instance::allocate(&allocated);
			init(instance.as_ref(), args)?;
			Ok(Value::Object(Object::Instance(instance)))
		});
		Ok(self.resolved(ty, "<init>", handle_sig, body))
	}

	/// `(receiver) -> kind`, reading the instance field `name`.
	pub fn find_getter(&self, ty: &TypeRef, name: &str, kind: &Kind) -> Result<Handle> {
		let (declaring, field) = self.instance_field(ty, name, kind)?;
		let receiver = self.receiver_type(ty, &declaring, field.modifiers);
		let handle_sig = Signature::new(kind.clone(), [Kind::Ref(receiver)])?;
		let owner = declaring.clone();
		let field_name = field.name.clone();
		let body: NativeFn = Arc::new(move |args: &[Value]| {
			instance_of(args, &field_name)?
				.get(&owner, &field_name)
				.ok_or_else(|| Error::not_found("field", format!("{owner}.{field_name}")))
		});
		Ok(self.resolved(&declaring, name, handle_sig, body))
	}

	/// `(receiver, kind) -> void`, writing the instance field `name`. Final fields are refused.
	pub fn find_setter(&self, ty: &TypeRef, name: &str, kind: &Kind) -> Result<Handle> {
		let (declaring, field) = self.instance_field(ty, name, kind)?;
		if field.modifiers.contains(Modifiers::FINAL) {
			return Err(Error::IllegalAccess(format!("{declaring}.{name} is final")));
		}
		let receiver = self.receiver_type(ty, &declaring, field.modifiers);
		let handle_sig = Signature::new(Kind::Void, [Kind::Ref(receiver), kind.clone()])?;
		let owner = declaring.clone();
		let field_name = field.name.clone();
		let body: NativeFn = Arc::new(move |args: &[Value]| {
			instance_of(args, &field_name)?.set(&owner, &field_name, args[1].clone())?;
			Ok(Value::Void)
		});
		Ok(self.resolved(&declaring, name, handle_sig, body))
	}

	/// `() -> kind`, reading the static field `name`.
	pub fn find_static_getter(&self, ty: &TypeRef, name: &str, kind: &Kind) -> Result<Handle> {
		let (declaring, field) = self.static_field(ty, name, kind)?;
		let cell = match field.body {
			MemberBody::Field {
				storage: FieldStorage::Static(cell),
				..
			} => cell,
			_ => return Err(expected(&declaring, name, "a static field")),
		};
		let body: NativeFn = Arc::new(move |_: &[Value]| Ok(cell.read().clone()));
		Ok(self.resolved(&declaring, name, Signature::new(kind.clone(), [])?, body))
	}

	/// `(kind) -> void`, writing the static field `name`. Final fields are refused.
	pub fn find_static_setter(&self, ty: &TypeRef, name: &str, kind: &Kind) -> Result<Handle> {
		let (declaring, field) = self.static_field(ty, name, kind)?;
		if field.modifiers.contains(Modifiers::FINAL) {
			return Err(Error::IllegalAccess(format!("{declaring}.{name} is final")));
		}
		let cell = match field.body {
			MemberBody::Field {
				storage: FieldStorage::Static(cell),
				..
			} => cell,
			_ => return Err(expected(&declaring, name, "a static field")),
		};
		let body: NativeFn = Arc::new(move |args: &[Value]| {
			*cell.write() = args[0].clone();
			Ok(Value::Void)
		});
		Ok(self.resolved(&declaring, name, Signature::new(Kind::Void, [kind.clone()])?, body))
	}

	/// Resolves `name` from the lookup type's namespace and checks it is accessible.
	pub fn find_class(&self, name: &str) -> Result<TypeRef> {
		let ty = builtins::resolve_in(self.lookup_type().namespace(), name).ok_or_else(|| Error::not_found("type", name))?;
		self.check_type(&ty)?;
		Ok(ty)
	}

	/// [`AccessContext::find_virtual`] on the receiver's runtime type, with the receiver bound.
	pub fn bind(&self, receiver: &Value, name: &str, sig: &Signature) -> Result<Handle> {
		if receiver.is_null() {
			return Err(Error::NullPointer(format!("cannot bind {name} to null")));
		}
		let ty = receiver
			.type_of()
			.ok_or_else(|| Error::IllegalArgument(format!("cannot bind {name} to {}", receiver.describe())))?;
		let handle = self.find_virtual(&ty, name, sig)?;
		bind_to(&handle, receiver.clone())
	}

	fn check_member(
		&self,
		declaring: &TypeRef,
		name: &str,
		modifiers: Modifiers,
		protected_bound: Option<&TypeRef>,
	) -> Result<()> {
		if lattice::can_access_member(
			self.lookup_type(),
			self.lookup_modes(),
			declaring,
			modifiers,
			protected_bound,
		) {
			Ok(())
		} else {
			Err(Error::IllegalAccess(format!("{declaring}.{name} is not accessible from {self}")))
		}
	}

	fn receiver_type(&self, ty: &TypeRef, declaring: &TypeRef, modifiers: Modifiers) -> TypeRef {
		if lattice::restricts_receiver(self.lookup_type(), declaring, modifiers) {
			self.lookup_type().clone()
		} else {
			ty.clone()
		}
	}

	fn instance_field(&self, ty: &TypeRef, name: &str, kind: &Kind) -> Result<(TypeRef, Member)> {
		let (declaring, field) = resolve_field(ty, name, kind)?;
		if field.is_static() {
			return Err(expected(&declaring, name, "an instance field"));
		}
		self.check_member(&declaring, name, field.modifiers, None)?;
		Ok((declaring, field))
	}

	fn static_field(&self, ty: &TypeRef, name: &str, kind: &Kind) -> Result<(TypeRef, Member)> {
		let (declaring, field) = resolve_field(ty, name, kind)?;
		if !field.is_static() {
			return Err(expected(&declaring, name, "a static field"));
		}
		self.check_member(&declaring, name, field.modifiers, None)?;
		Ok((declaring, field))
	}

	fn resolved(&self, declaring: &TypeRef, name: &str, sig: Signature, body: NativeFn) -> Handle {
		let symbol = format!("{declaring}.{name}");
		trace!(symbol = %symbol, sig = %sig, context = %self, "linkage.access.resolve");
		Handle::from_native_fn(&symbol, sig, body)
	}
}

/// Finds `name` with `sig` on `ty`, its supertypes, then its interfaces.
fn resolve_method(ty: &TypeRef, name: &str, sig: &Signature) -> Result<Resolved> {
	match lookup_method(ty, name, sig) {
		Some((declaring, Member { modifiers, body: MemberBody::Method { body, .. }, .. })) => Ok(Resolved {
			declaring,
			modifiers,
			body,
		}),
		_ => Err(Error::not_found("method", format!("{ty}.{name}{sig}"))),
	}
}

fn lookup_method(ty: &TypeRef, name: &str, sig: &Signature) -> Option<(TypeRef, Member)> {
	if let Some(found) = ty.find_member(|m| m.is_method() && &*m.name == name && m.method_signature() == Some(sig)) {
		return Some(found);
	}
	ty.ancestry()
		.flat_map(|t| t.interfaces().to_vec())
		.find_map(|iface| lookup_method(&iface, name, sig))
}

fn resolve_field(ty: &TypeRef, name: &str, kind: &Kind) -> Result<(TypeRef, Member)> {
	ty.find_member(|m| &*m.name == name && m.field_kind() == Some(kind))
		.ok_or_else(|| Error::not_found("field", format!("{ty}.{name}:{kind}")))
}

/// True when `m` can stand in for `name` with `sig` during dispatch.
fn overrides(m: &Member, name: &str, sig: &Signature) -> bool {
	m.is_method()
		&& !m.is_static()
		&& !m.modifiers.contains(Modifiers::PRIVATE)
		&& &*m.name == name
		&& m.method_signature() == Some(sig)
}

fn expected(declaring: &TypeRef, name: &str, what: &str) -> Error {
	Error::IllegalAccess(format!("expected {declaring}.{name} to be {what}"))
}

fn receiver_of(args: &[Value], name: &str) -> Result<TypeRef> {
	args.first()
		.and_then(Value::type_of)
		.ok_or_else(|| Error::NullPointer(format!("receiver of {name}")))
}

fn instance_of<'a>(args: &'a [Value], name: &str) -> Result<&'a Arc<Instance>> {
	match args.first() {
		Some(Value::Null) | None => Err(Error::NullPointer(format!("receiver of {name}"))),
		Some(value) => value
			.as_instance()
			.ok_or_else(|| Error::class_cast(value, format!("owner of {name}"))),
	}
}

/// Wraps a direct body with the null-receiver check.
fn with_receiver(name: &str, body: NativeFn) -> NativeFn {
	let name: Arc<str> = name.into();
	Arc::new(move |args: &[Value]| {
		receiver_of(args, &name)?;
		body(args)
	})
}

#[cfg(test)]
mod tests;

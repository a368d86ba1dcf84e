//! Definition of external types in isolated namespaces.
//!
//! Resolution tests need throwaway types with specific visibility flags, nesting and
//! inheritance. [`TypeFactory`] owns one [`Namespace`] and registers [`TypeBuilder`] output in
//! it; the returned [`TypeRef`] is usable as a resolution root or as a lookup type.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::builtins;
use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::member::{FieldStorage, Member, MemberBody};
use crate::signature::Signature;
use crate::ty::{Flavor, Modifiers, Namespace, TypeData, TypeRef};
use crate::value::{Instance, Value};

/// Accumulates the shape of a type before it is defined.
pub struct TypeBuilder {
	name: Arc<str>,
	package: Arc<str>,
	modifiers: Modifiers,
	supertype: Option<TypeRef>,
	interfaces: Vec<TypeRef>,
	enclosing: Option<TypeRef>,
	flavor: Flavor,
	members: Vec<Member>,
	statics: Vec<(Arc<str>, Kind, Value)>,
}

impl TypeBuilder {
	/// Starts a public class; `qualified` is split at its last `.` into package and name.
	pub fn new(qualified: &str) -> Self {
		let (package, name) = match qualified.rsplit_once('.') {
			Some((package, name)) => (package, name),
			None => ("", qualified),
		};
		Self {
			name: name.into(),
			package: package.into(),
			modifiers: Modifiers::PUBLIC,
			supertype: None,
			interfaces: Vec::new(),
			enclosing: None,
			flavor: Flavor::Class,
			members: Vec::new(),
			statics: Vec::new(),
		}
	}

	/// Replaces the type's modifiers. Interface bits are kept when already set.
	pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
		let kept = self.modifiers & (Modifiers::INTERFACE | Modifiers::ABSTRACT);
		self.modifiers = modifiers | kept;
		self
	}

	pub fn supertype(mut self, supertype: &TypeRef) -> Self {
		self.supertype = Some(supertype.clone());
		self
	}

	pub fn implements(mut self, iface: &TypeRef) -> Self {
		self.interfaces.push(iface.clone());
		self
	}

	/// Nests the type inside `outer`; the simple name becomes `Outer$Name`.
	pub fn enclosing(mut self, outer: &TypeRef) -> Self {
		self.name = format!("{}${}", outer.name(), self.name).into();
		self.package = outer.package().into();
		self.enclosing = Some(outer.clone());
		self
	}

	pub fn interface(mut self) -> Self {
		self.flavor = Flavor::Interface;
		self.modifiers |= Modifiers::INTERFACE | Modifiers::ABSTRACT;
		self
	}

	/// Adds a static method with a native body.
	pub fn static_method<F>(mut self, name: &str, modifiers: Modifiers, sig: Signature, body: F) -> Self
	where
		F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		self.members.push(Member {
			name: name.into(),
			modifiers: modifiers | Modifiers::STATIC,
			body: MemberBody::Method { sig, body: Arc::new(body) },
		});
		self
	}

	/// Adds an instance method. `body` receives the receiver at index 0.
	pub fn method<F>(mut self, name: &str, modifiers: Modifiers, sig: Signature, body: F) -> Self
	where
		F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		self.members.push(Member {
			name: name.into(),
			modifiers: modifiers - Modifiers::STATIC,
			body: MemberBody::Method { sig, body: Arc::new(body) },
		});
		self
	}

	/// Adds a constructor taking `params` (its return kind is ignored).
	pub fn constructor<F>(mut self, modifiers: Modifiers, params: Signature, init: F) -> Self
	where
		F: Fn(&Instance, &[Value]) -> Result<()> + Send + Sync + 'static,
	{
		self.members.push(Member {
			name: "<init>".into(),
			modifiers: modifiers - Modifiers::STATIC,
			body: MemberBody::Constructor { params, init: Arc::new(init) },
		});
		self
	}

	/// Adds a static field holding `initial`.
	pub fn static_field(mut self, name: &str, modifiers: Modifiers, kind: Kind, initial: Value) -> Self {
		self.statics.push((name.into(), kind.clone(), initial.clone()));
		self.members.push(Member {
			name: name.into(),
			modifiers: modifiers | Modifiers::STATIC,
			body: MemberBody::Field {
				kind,
				storage: FieldStorage::Static(Arc::new(RwLock::new(initial))),
			},
		});
		self
	}

	/// Adds an instance field, zero-initialized per instance.
	pub fn field(mut self, name: &str, modifiers: Modifiers, kind: Kind) -> Self {
		self.members.push(Member {
			name: name.into(),
			modifiers: modifiers - Modifiers::STATIC,
			body: MemberBody::Field {
				kind,
				storage: FieldStorage::Instance,
			},
		});
		self
	}

	fn qualified_name(&self) -> String {
		if self.package.is_empty() {
			self.name.to_string()
		} else {
			format!("{}.{}", self.package, self.name)
		}
	}

	fn validate(&self) -> Result<()> {
		if let Some(sup) = &self.supertype {
			if sup.is_interface() {
				return Err(Error::IllegalArgument(format!("{} cannot extend interface {sup}", self.qualified_name())));
			}
			if sup.is_final() || sup.is_array() {
				return Err(Error::IllegalArgument(format!("{} cannot extend final {sup}", self.qualified_name())));
			}
		}
		if let Some(iface) = self.interfaces.iter().find(|i| !i.is_interface()) {
			return Err(Error::IllegalArgument(format!("{iface} is not an interface")));
		}
		for (name, kind, initial) in &self.statics {
			if !initial.conforms_to(kind) {
				return Err(Error::IllegalArgument(format!(
					"static field {name} of kind {kind} cannot hold {}",
					initial.describe()
				)));
			}
		}
		Ok(())
	}

	/// Builds the descriptor without validating or registering it.
	pub(crate) fn assemble(self, namespace: &Namespace) -> TypeRef {
		let supertype = match self.flavor {
			Flavor::Interface => None,
			_ => self.supertype.or_else(|| Some(builtins::object())),
		};
		TypeRef::assemble(TypeData {
			id: TypeRef::next_id(),
			name: self.name,
			package: self.package,
			namespace: namespace.clone(),
			modifiers: self.modifiers,
			supertype,
			interfaces: self.interfaces.into_boxed_slice(),
			enclosing: self.enclosing,
			flavor: self.flavor,
			members: self.members.into_boxed_slice(),
		})
	}

	/// Builds a root type with no supertype. Only the bootstrap object type uses this.
	pub(crate) fn assemble_root(self, namespace: &Namespace) -> TypeRef {
		TypeRef::assemble(TypeData {
			id: TypeRef::next_id(),
			name: self.name,
			package: self.package,
			namespace: namespace.clone(),
			modifiers: self.modifiers,
			supertype: None,
			interfaces: Box::new([]),
			enclosing: None,
			flavor: Flavor::Class,
			members: self.members.into_boxed_slice(),
		})
	}
}

/// Defines types in one namespace.
#[derive(Clone, Debug)]
pub struct TypeFactory {
	namespace: Namespace,
}

impl TypeFactory {
	/// A factory over a fresh namespace whose parent is bootstrap.
	pub fn isolated(label: &str) -> Self {
		Self {
			namespace: Namespace::isolated(label),
		}
	}

	pub fn in_namespace(namespace: Namespace) -> Self {
		Self { namespace }
	}

	/// A factory over a fresh namespace delegating to this factory's namespace.
	pub fn child(&self, label: &str) -> Self {
		Self {
			namespace: self.namespace.child(label),
		}
	}

	pub fn namespace(&self) -> &Namespace {
		&self.namespace
	}

	/// Validates and registers a type.
	pub fn define(&self, builder: TypeBuilder) -> Result<TypeRef> {
		builder.validate()?;
		let qualified = builder.qualified_name();
		if self.namespace.find_local(&qualified).is_some() {
			return Err(Error::IllegalArgument(format!(
				"{qualified} is already defined in {}",
				self.namespace.label()
			)));
		}
		let ty = builder.assemble(&self.namespace);
		if !self.namespace.register(&ty) {
			return Err(Error::IllegalArgument(format!(
				"{qualified} is already defined in {}",
				self.namespace.label()
			)));
		}
		trace!(ty = %ty, namespace = self.namespace.label(), "linkage.type.define");
		Ok(ty)
	}
}

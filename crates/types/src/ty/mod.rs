//! The type universe: namespaces, type descriptors and the subtype relation.
//!
//! # Mental model
//!
//! * A [`Namespace`] is an isolated loading scope with an optional parent. Lookups delegate to
//!   the parent first, mirroring hierarchical loaders.
//! * A [`TypeRef`] is an identity-compared handle to an immutable [`TypeData`]. Two types with
//!   the same qualified name in different namespaces are distinct.
//! * Two types are in the same *package* only when their package names match and their
//!   namespaces belong to one loading family (same namespace, or one an ancestor of the other).
//!
//! Namespaces hold their types weakly; a type lives as long as something references it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::kind::Kind;
use crate::member::Member;

bitflags::bitflags! {
	/// Declaration modifiers for types and members.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Modifiers: u32 {
		const PUBLIC = 0x0001;
		const PRIVATE = 0x0002;
		const PROTECTED = 0x0004;
		const STATIC = 0x0008;
		const FINAL = 0x0010;
		const INTERFACE = 0x0200;
		const ABSTRACT = 0x0400;
	}
}

/// Declared visibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
	Public,
	Protected,
	Package,
	Private,
}

impl Modifiers {
	/// Returns the declared visibility; no visibility bit means package-private.
	pub const fn visibility(self) -> Visibility {
		if self.contains(Self::PUBLIC) {
			Visibility::Public
		} else if self.contains(Self::PRIVATE) {
			Visibility::Private
		} else if self.contains(Self::PROTECTED) {
			Visibility::Protected
		} else {
			Visibility::Package
		}
	}

	pub const fn is_static(self) -> bool {
		self.contains(Self::STATIC)
	}
}

static NEXT_NAMESPACE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

static BOOTSTRAP: LazyLock<Namespace> = LazyLock::new(|| Namespace::create("bootstrap", None));

/// An isolated loading scope.
#[derive(Clone)]
pub struct Namespace(Arc<NamespaceData>);

struct NamespaceData {
	id: u64,
	label: Arc<str>,
	parent: Option<Namespace>,
	types: RwLock<FxHashMap<Arc<str>, Weak<TypeData>>>,
}

impl Namespace {
	fn create(label: &str, parent: Option<Namespace>) -> Self {
		Self(Arc::new(NamespaceData {
			id: NEXT_NAMESPACE_ID.fetch_add(1, Ordering::Relaxed),
			label: label.into(),
			parent,
			types: RwLock::new(FxHashMap::default()),
		}))
	}

	/// The root namespace holding builtin types.
	pub fn bootstrap() -> Self {
		BOOTSTRAP.clone()
	}

	/// Creates a namespace delegating to bootstrap only.
	pub fn isolated(label: &str) -> Self {
		Self::create(label, Some(Self::bootstrap()))
	}

	/// Creates a namespace delegating to `self`.
	pub fn child(&self, label: &str) -> Self {
		Self::create(label, Some(self.clone()))
	}

	pub fn id(&self) -> u64 {
		self.0.id
	}

	pub fn label(&self) -> &str {
		&self.0.label
	}

	pub fn parent(&self) -> Option<&Namespace> {
		self.0.parent.as_ref()
	}

	/// Returns true when `self` is a strict ancestor of `other`.
	pub fn is_ancestor_of(&self, other: &Namespace) -> bool {
		let mut cursor = other.parent();
		while let Some(ns) = cursor {
			if ns == self {
				return true;
			}
			cursor = ns.parent();
		}
		false
	}

	/// Same namespace, or one delegates (transitively) to the other.
	pub fn same_family(&self, other: &Namespace) -> bool {
		self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
	}

	/// Resolves a qualified type name, delegating to the parent first.
	pub fn find(&self, qualified: &str) -> Option<TypeRef> {
		if let Some(found) = self.parent().and_then(|p| p.find(qualified)) {
			return Some(found);
		}
		self.find_local(qualified)
	}

	/// Resolves a qualified name defined directly in this namespace.
	pub fn find_local(&self, qualified: &str) -> Option<TypeRef> {
		self.0.types.read().get(qualified).and_then(Weak::upgrade).map(TypeRef)
	}

	pub(crate) fn register(&self, ty: &TypeRef) -> bool {
		let name: Arc<str> = ty.qualified_name().into();
		let mut types = self.0.types.write();
		if types.get(&name).is_some_and(|existing| existing.strong_count() > 0) {
			return false;
		}
		types.insert(name, Arc::downgrade(&ty.0));
		true
	}
}

impl PartialEq for Namespace {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Namespace {}

impl fmt::Debug for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Namespace({}#{})", self.0.label, self.0.id)
	}
}

/// Structural category of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flavor {
	Class,
	Interface,
	/// Array with the given component kind.
	Array(Kind),
}

/// Immutable type descriptor.
pub struct TypeData {
	pub(crate) id: u64,
	pub(crate) name: Arc<str>,
	pub(crate) package: Arc<str>,
	pub(crate) namespace: Namespace,
	pub(crate) modifiers: Modifiers,
	pub(crate) supertype: Option<TypeRef>,
	pub(crate) interfaces: Box<[TypeRef]>,
	pub(crate) enclosing: Option<TypeRef>,
	pub(crate) flavor: Flavor,
	pub(crate) members: Box<[Member]>,
}

/// Identity-compared reference to a type.
#[derive(Clone)]
pub struct TypeRef(pub(crate) Arc<TypeData>);

impl TypeRef {
	pub(crate) fn assemble(data: TypeData) -> Self {
		Self(Arc::new(data))
	}

	pub(crate) fn next_id() -> u64 {
		NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed)
	}

	pub fn id(&self) -> u64 {
		self.0.id
	}

	/// Simple name; nested types are rendered `Outer$Inner`.
	pub fn name(&self) -> &str {
		&self.0.name
	}

	pub fn package(&self) -> &str {
		&self.0.package
	}

	/// `package.Name`, or just `Name` in the unnamed package.
	pub fn qualified_name(&self) -> String {
		if self.0.package.is_empty() {
			self.0.name.to_string()
		} else {
			format!("{}.{}", self.0.package, self.0.name)
		}
	}

	pub fn namespace(&self) -> &Namespace {
		&self.0.namespace
	}

	pub fn modifiers(&self) -> Modifiers {
		self.0.modifiers
	}

	pub fn supertype(&self) -> Option<&TypeRef> {
		self.0.supertype.as_ref()
	}

	pub fn interfaces(&self) -> &[TypeRef] {
		&self.0.interfaces
	}

	pub fn enclosing(&self) -> Option<&TypeRef> {
		self.0.enclosing.as_ref()
	}

	pub fn flavor(&self) -> &Flavor {
		&self.0.flavor
	}

	pub fn is_interface(&self) -> bool {
		matches!(self.0.flavor, Flavor::Interface)
	}

	pub fn is_array(&self) -> bool {
		matches!(self.0.flavor, Flavor::Array(_))
	}

	/// Component kind for array types.
	pub fn component(&self) -> Option<&Kind> {
		match &self.0.flavor {
			Flavor::Array(component) => Some(component),
			_ => None,
		}
	}

	pub fn is_final(&self) -> bool {
		self.0.modifiers.contains(Modifiers::FINAL)
	}

	/// Members declared directly on this type.
	pub fn members(&self) -> &[Member] {
		&self.0.members
	}

	/// Follows the enclosing chain to the top-level type.
	pub fn outermost(&self) -> TypeRef {
		let mut current = self.clone();
		while let Some(next) = current.enclosing().cloned() {
			current = next;
		}
		current
	}

	/// Both types share one outermost enclosing type.
	pub fn is_nestmate_of(&self, other: &TypeRef) -> bool {
		self.outermost() == other.outermost()
	}

	/// Same package name within one loading family.
	pub fn same_package(&self, other: &TypeRef) -> bool {
		if self == other {
			return true;
		}
		self.package() == other.package() && self.namespace().same_family(other.namespace())
	}

	/// True when a value of type `other` may be stored in a slot of type `self`.
	pub fn is_assignable_from(&self, other: &TypeRef) -> bool {
		if self == other {
			return true;
		}
		if self.supertype().is_none() && !self.is_interface() && !self.is_array() {
			// Only the root type has no supertype.
			return true;
		}
		if let (Flavor::Array(to), Flavor::Array(from)) = (self.flavor(), other.flavor()) {
			return match (to, from) {
				(Kind::Ref(to), Kind::Ref(from)) => to.is_assignable_from(from),
				(to, from) => to == from,
			};
		}
		if let Some(sup) = other.supertype() {
			if self.is_assignable_from(sup) {
				return true;
			}
		}
		other.interfaces().iter().any(|iface| self.is_assignable_from(iface))
	}

	/// Inverse of [`TypeRef::is_assignable_from`].
	pub fn is_subtype_of(&self, other: &TypeRef) -> bool {
		other.is_assignable_from(self)
	}

	/// Iterates `self` followed by every supertype up to the root.
	pub fn ancestry(&self) -> impl Iterator<Item = TypeRef> {
		std::iter::successors(Some(self.clone()), |ty| ty.supertype().cloned())
	}

	/// Finds a member declared on this type or inherited from a supertype.
	pub fn find_member(&self, pred: impl Fn(&Member) -> bool) -> Option<(TypeRef, Member)> {
		for ty in self.ancestry() {
			if let Some(member) = ty.members().iter().find(|m| pred(m)) {
				return Some((ty.clone(), member.clone()));
			}
		}
		None
	}
}

impl PartialEq for TypeRef {
	fn eq(&self, other: &Self) -> bool {
		self.0.id == other.0.id
	}
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.id.hash(state);
	}
}

impl fmt::Display for TypeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.qualified_name())
	}
}

impl fmt::Debug for TypeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.qualified_name(), self.0.namespace.label())
	}
}

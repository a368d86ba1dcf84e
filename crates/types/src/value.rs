//! Runtime values flowing through handles.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builtins;
use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::member::MemberBody;
use crate::ty::TypeRef;

/// A runtime object outside the builtin object model (handles, cells).
pub trait OpaqueObject: Any + Send + Sync + fmt::Debug {
	/// Runtime type reported for conformance checks.
	fn type_of(&self) -> TypeRef;

	fn as_any(&self) -> &dyn Any;

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// One argument or result.
#[derive(Clone)]
pub enum Value {
	/// Result of a void-returning handle.
	Void,
	Null,
	Boolean(bool),
	Byte(i8),
	Short(i16),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	Object(Object),
}

/// Non-null reference payloads.
#[derive(Clone)]
pub enum Object {
	/// A primitive value in its canonical wrapper.
	Boxed(Box<Value>),
	Str(Arc<str>),
	Array(Array),
	Instance(Arc<Instance>),
	Condition(Arc<Condition>),
	Opaque(Arc<dyn OpaqueObject>),
}

impl Object {
	pub fn type_of(&self) -> TypeRef {
		match self {
			Self::Boxed(inner) => inner.kind().wrapper(),
			Self::Str(_) => builtins::string(),
			Self::Array(array) => array.ty.clone(),
			Self::Instance(instance) => instance.ty.clone(),
			Self::Condition(condition) => condition.ty.clone(),
			Self::Opaque(opaque) => opaque.type_of(),
		}
	}

	fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Boxed(a), Self::Boxed(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Array(a), Self::Array(b)) => a.ty == b.ty && Arc::ptr_eq(&a.elements, &b.elements),
			(Self::Instance(a), Self::Instance(b)) => Arc::ptr_eq(a, b),
			(Self::Condition(a), Self::Condition(b)) => Arc::ptr_eq(a, b),
			(Self::Opaque(a), Self::Opaque(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
			_ => false,
		}
	}
}

impl Value {
	/// A string reference.
	pub fn str(s: &str) -> Self {
		Self::Object(Object::Str(s.into()))
	}

	/// An array of `component` holding `elements`; each element must conform.
	pub fn array(component: Kind, elements: Vec<Value>) -> Result<Self> {
		Ok(Self::Object(Object::Array(Array::new(component, elements)?)))
	}

	/// Wraps an opaque runtime object.
	pub fn opaque<T: OpaqueObject>(object: T) -> Self {
		Self::Object(Object::Opaque(Arc::new(object)))
	}

	/// Kind of this value; references report their runtime type, null reports `Object`.
	pub fn kind(&self) -> Kind {
		match self {
			Self::Void => Kind::Void,
			Self::Null => Kind::object(),
			Self::Boolean(_) => Kind::Boolean,
			Self::Byte(_) => Kind::Byte,
			Self::Short(_) => Kind::Short,
			Self::Int(_) => Kind::Int,
			Self::Long(_) => Kind::Long,
			Self::Float(_) => Kind::Float,
			Self::Double(_) => Kind::Double,
			Self::Object(object) => Kind::Ref(object.type_of()),
		}
	}

	/// Runtime type of a non-null reference.
	pub fn type_of(&self) -> Option<TypeRef> {
		match self {
			Self::Object(object) => Some(object.type_of()),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn is_void(&self) -> bool {
		matches!(self, Self::Void)
	}

	/// Dynamic check that this value may occupy a slot of `kind`.
	pub fn conforms_to(&self, kind: &Kind) -> bool {
		match (self, kind) {
			(Self::Void, Kind::Void)
			| (Self::Boolean(_), Kind::Boolean)
			| (Self::Byte(_), Kind::Byte)
			| (Self::Short(_), Kind::Short)
			| (Self::Int(_), Kind::Int)
			| (Self::Long(_), Kind::Long)
			| (Self::Float(_), Kind::Float)
			| (Self::Double(_), Kind::Double)
			| (Self::Null, Kind::Ref(_)) => true,
			(Self::Object(object), Kind::Ref(ty)) => ty.is_assignable_from(&object.type_of()),
			_ => false,
		}
	}

	/// Boxes primitives; references and void are returned unchanged.
	pub fn boxed(self) -> Self {
		match self {
			Self::Void | Self::Null | Self::Object(_) => self,
			prim => Self::Object(Object::Boxed(Box::new(prim))),
		}
	}

	/// The primitive inside a wrapper object.
	pub fn unboxed(&self) -> Option<Value> {
		match self {
			Self::Object(Object::Boxed(inner)) => Some((**inner).clone()),
			_ => None,
		}
	}

	/// Human-readable description used in failure messages.
	pub fn describe(&self) -> String {
		match self {
			Self::Void => "void".into(),
			Self::Null => "null".into(),
			Self::Boolean(v) => format!("boolean {v}"),
			Self::Byte(v) => format!("byte {v}"),
			Self::Short(v) => format!("short {v}"),
			Self::Int(v) => format!("int {v}"),
			Self::Long(v) => format!("long {v}"),
			Self::Float(v) => format!("float {v}"),
			Self::Double(v) => format!("double {v}"),
			Self::Object(Object::Boxed(inner)) => format!("{} {}", inner.kind().wrapper(), inner.describe()),
			Self::Object(Object::Str(s)) => format!("rt.String {s:?}"),
			Self::Object(Object::Condition(c)) => c.to_string(),
			Self::Object(object) => object.type_of().qualified_name(),
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Boolean(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i32> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_long(&self) -> Option<i64> {
		match self {
			Self::Long(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_double(&self) -> Option<f64> {
		match self {
			Self::Double(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Object(Object::Str(s)) => Some(s),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&Array> {
		match self {
			Self::Object(Object::Array(array)) => Some(array),
			_ => None,
		}
	}

	pub fn as_instance(&self) -> Option<&Arc<Instance>> {
		match self {
			Self::Object(Object::Instance(instance)) => Some(instance),
			_ => None,
		}
	}

	pub fn as_condition(&self) -> Option<&Arc<Condition>> {
		match self {
			Self::Object(Object::Condition(condition)) => Some(condition),
			_ => None,
		}
	}

	/// Downcasts an opaque object.
	pub fn as_opaque<T: OpaqueObject>(&self) -> Option<&T> {
		match self {
			Self::Object(Object::Opaque(opaque)) => opaque.as_any().downcast_ref::<T>(),
			_ => None,
		}
	}

	/// Downcasts an opaque object, sharing its allocation.
	pub fn opaque_arc<T: OpaqueObject>(&self) -> Option<Arc<T>> {
		match self {
			Self::Object(Object::Opaque(opaque)) => opaque.clone().into_any().downcast::<T>().ok(),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Void, Self::Void) | (Self::Null, Self::Null) => true,
			(Self::Boolean(a), Self::Boolean(b)) => a == b,
			(Self::Byte(a), Self::Byte(b)) => a == b,
			(Self::Short(a), Self::Short(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Long(a), Self::Long(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
			(Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
			(Self::Object(a), Self::Object(b)) => a.same(b),
			_ => false,
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.describe())
	}
}

macro_rules! value_from {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(v: $ty) -> Self {
					Self::$variant(v)
				}
			}
		)*
	};
}

value_from!(bool => Boolean, i8 => Byte, i16 => Short, i32 => Int, i64 => Long, f32 => Float, f64 => Double);

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::str(s)
	}
}

/// An immutable element snapshot.
#[derive(Clone)]
pub struct Array {
	ty: TypeRef,
	elements: Arc<[Value]>,
}

impl Array {
	pub fn new(component: Kind, elements: Vec<Value>) -> Result<Self> {
		let ty = builtins::array_of(component.clone());
		if let Some(bad) = elements.iter().find(|e| !e.conforms_to(&component)) {
			return Err(Error::class_cast(bad, &component));
		}
		Ok(Self {
			ty,
			elements: elements.into(),
		})
	}

	pub fn type_of(&self) -> &TypeRef {
		&self.ty
	}

	pub fn component(&self) -> Kind {
		self.ty.component().cloned().unwrap_or_else(Kind::object)
	}

	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	pub fn elements(&self) -> &[Value] {
		&self.elements
	}

	/// Bounds-checked element read.
	pub fn get(&self, index: i64) -> Result<Value> {
		usize::try_from(index)
			.ok()
			.and_then(|i| self.elements.get(i))
			.cloned()
			.ok_or(Error::IndexOutOfBounds {
				index,
				len: self.elements.len(),
			})
	}
}

/// An instance of a defined type.
pub struct Instance {
	ty: TypeRef,
	fields: RwLock<FxHashMap<(u64, Arc<str>), Value>>,
}

impl Instance {
	/// Allocates an instance with every declared instance field zeroed.
	pub fn allocate(ty: &TypeRef) -> Arc<Self> {
		let mut fields = FxHashMap::default();
		for declaring in ty.ancestry() {
			for member in declaring.members() {
				if let MemberBody::Field { kind, .. } = &member.body {
					if !member.is_static() {
						fields.insert((declaring.id(), member.name.clone()), kind.zero());
					}
				}
			}
		}
		Arc::new(Self {
			ty: ty.clone(),
			fields: RwLock::new(fields),
		})
	}

	pub fn type_of(&self) -> &TypeRef {
		&self.ty
	}

	/// Reads the field `name` declared on `declaring`.
	pub fn get(&self, declaring: &TypeRef, name: &str) -> Option<Value> {
		self.fields.read().get(&(declaring.id(), Arc::from(name))).cloned()
	}

	/// Writes the field `name` declared on `declaring`; unknown fields are rejected.
	pub fn set(&self, declaring: &TypeRef, name: &str, value: Value) -> Result<()> {
		let mut fields = self.fields.write();
		match fields.get_mut(&(declaring.id(), Arc::from(name))) {
			Some(slot) => {
				*slot = value;
				Ok(())
			}
			None => Err(Error::not_found("field", format!("{declaring}.{name}"))),
		}
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance").field("ty", &self.ty).finish_non_exhaustive()
	}
}

/// A raised condition. Travels as [`Error::Raised`] and is caught as a reference value.
#[derive(Debug)]
pub struct Condition {
	ty: TypeRef,
	message: Arc<str>,
	origin: Option<Error>,
}

impl Condition {
	pub fn new(ty: TypeRef, message: impl Into<Arc<str>>) -> Self {
		Self {
			ty,
			message: message.into(),
			origin: None,
		}
	}

	/// A condition standing in for a runtime failure, which it remembers.
	pub fn with_origin(ty: TypeRef, message: impl Into<Arc<str>>, origin: Error) -> Self {
		Self {
			ty,
			message: message.into(),
			origin: Some(origin),
		}
	}

	pub fn type_of(&self) -> &TypeRef {
		&self.ty
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn origin(&self) -> Option<&Error> {
		self.origin.as_ref()
	}

	/// Wraps this condition as a reference value.
	pub fn into_value(self) -> Value {
		Value::Object(Object::Condition(Arc::new(self)))
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.ty, self.message)
	}
}

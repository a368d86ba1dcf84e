//! Parameter and return kinds.

use std::fmt;

use crate::builtins;
use crate::ty::TypeRef;
use crate::value::Value;

/// One slot of a calling convention.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Kind {
	Void,
	Boolean,
	Byte,
	Short,
	Int,
	Long,
	Float,
	Double,
	Ref(TypeRef),
}

/// Primitive kinds in widening order, boolean excluded.
const NUMERIC_RANK: [Kind; 6] = [Kind::Byte, Kind::Short, Kind::Int, Kind::Long, Kind::Float, Kind::Double];

impl Kind {
	/// Every primitive kind, void excluded.
	pub const PRIMITIVES: [Kind; 7] = [
		Kind::Boolean,
		Kind::Byte,
		Kind::Short,
		Kind::Int,
		Kind::Long,
		Kind::Float,
		Kind::Double,
	];

	/// The root reference kind.
	pub fn object() -> Self {
		Self::Ref(builtins::object())
	}

	pub fn string() -> Self {
		Self::Ref(builtins::string())
	}

	/// Reference kind for an array whose components are `component`.
	pub fn array_of(component: Kind) -> Self {
		Self::Ref(builtins::array_of(component))
	}

	pub fn is_void(&self) -> bool {
		matches!(self, Self::Void)
	}

	pub fn is_ref(&self) -> bool {
		matches!(self, Self::Ref(_))
	}

	pub fn is_primitive(&self) -> bool {
		!self.is_void() && !self.is_ref()
	}

	pub fn is_numeric(&self) -> bool {
		self.numeric_rank().is_some()
	}

	pub fn as_ref_type(&self) -> Option<&TypeRef> {
		match self {
			Self::Ref(ty) => Some(ty),
			_ => None,
		}
	}

	/// Argument slots consumed by this kind.
	pub fn slot_count(&self) -> usize {
		match self {
			Self::Void => 0,
			Self::Long | Self::Double => 2,
			_ => 1,
		}
	}

	fn numeric_rank(&self) -> Option<usize> {
		NUMERIC_RANK.iter().position(|k| k == self)
	}

	/// Widening primitive conversion (or identity) from `self` to `to`.
	pub fn widens_to(&self, to: &Kind) -> bool {
		if self == to {
			return self.is_primitive();
		}
		match (self.numeric_rank(), to.numeric_rank()) {
			(Some(from), Some(to)) => from < to,
			_ => false,
		}
	}

	/// Canonical box type; reference kinds map to their own type.
	pub fn wrapper(&self) -> TypeRef {
		match self {
			Self::Void => builtins::void_box(),
			Self::Boolean => builtins::boolean_box(),
			Self::Byte => builtins::byte_box(),
			Self::Short => builtins::short_box(),
			Self::Int => builtins::integer_box(),
			Self::Long => builtins::long_box(),
			Self::Float => builtins::float_box(),
			Self::Double => builtins::double_box(),
			Self::Ref(ty) => ty.clone(),
		}
	}

	/// Primitive kind boxed by `ty`, if `ty` is a wrapper type.
	pub fn unwrapped(ty: &TypeRef) -> Option<Kind> {
		Self::PRIMITIVES.into_iter().find(|k| &k.wrapper() == ty)
	}

	/// Reference kinds are kept; primitives become their box type.
	pub fn boxed(&self) -> Kind {
		match self {
			Self::Void | Self::Ref(_) => self.clone(),
			prim => Self::Ref(prim.wrapper()),
		}
	}

	/// Box types become their primitive; anything else is kept.
	pub fn unboxed(&self) -> Kind {
		match self {
			Self::Ref(ty) => Self::unwrapped(ty).unwrap_or_else(|| self.clone()),
			other => other.clone(),
		}
	}

	/// Default value for a slot of this kind.
	pub fn zero(&self) -> Value {
		match self {
			Self::Void => Value::Void,
			Self::Boolean => Value::Boolean(false),
			Self::Byte => Value::Byte(0),
			Self::Short => Value::Short(0),
			Self::Int => Value::Int(0),
			Self::Long => Value::Long(0),
			Self::Float => Value::Float(0.0),
			Self::Double => Value::Double(0.0),
			Self::Ref(_) => Value::Null,
		}
	}

	/// Descriptor fragment, `I` or `Lrt/String;` or `[J`.
	pub fn descriptor(&self) -> String {
		match self {
			Self::Void => "V".into(),
			Self::Boolean => "Z".into(),
			Self::Byte => "B".into(),
			Self::Short => "S".into(),
			Self::Int => "I".into(),
			Self::Long => "J".into(),
			Self::Float => "F".into(),
			Self::Double => "D".into(),
			Self::Ref(ty) => match ty.component() {
				Some(component) => format!("[{}", component.descriptor()),
				None => format!("L{};", ty.qualified_name().replace('.', "/")),
			},
		}
	}

	fn keyword(&self) -> &'static str {
		match self {
			Self::Void => "void",
			Self::Boolean => "boolean",
			Self::Byte => "byte",
			Self::Short => "short",
			Self::Int => "int",
			Self::Long => "long",
			Self::Float => "float",
			Self::Double => "double",
			Self::Ref(_) => "ref",
		}
	}
}

impl From<TypeRef> for Kind {
	fn from(ty: TypeRef) -> Self {
		Self::Ref(ty)
	}
}

impl fmt::Display for Kind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ref(ty) => write!(f, "{ty}"),
			prim => f.write_str(prim.keyword()),
		}
	}
}

impl fmt::Debug for Kind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

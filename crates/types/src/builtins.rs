//! Builtin types of the bootstrap namespace, package `rt`.
//!
//! The table is built once on first use and registered in [`Namespace::bootstrap`]. Array
//! types are interned per component kind and live for the rest of the process.

use std::sync::LazyLock;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::factory::TypeBuilder;
use crate::kind::Kind;
use crate::ty::{Flavor, Modifiers, Namespace, TypeData, TypeRef};

struct Builtins {
	object: TypeRef,
	string: TypeRef,
	number: TypeRef,
	boolean_box: TypeRef,
	byte_box: TypeRef,
	short_box: TypeRef,
	integer_box: TypeRef,
	long_box: TypeRef,
	float_box: TypeRef,
	double_box: TypeRef,
	void_box: TypeRef,
	throwable: TypeRef,
	exception: TypeRef,
	runtime_exception: TypeRef,
	class_cast: TypeRef,
	null_pointer: TypeRef,
	illegal_argument: TypeRef,
	wrong_signature: TypeRef,
	illegal_state: TypeRef,
	unsupported_operation: TypeRef,
	index_out_of_bounds: TypeRef,
	illegal_access: TypeRef,
	not_found: TypeRef,
	handle: TypeRef,
	call_cell: TypeRef,
	constant_cell: TypeRef,
	mutable_cell: TypeRef,
	volatile_cell: TypeRef,
}

const FINAL: Modifiers = Modifiers::PUBLIC.union(Modifiers::FINAL);
const ABSTRACT: Modifiers = Modifiers::PUBLIC.union(Modifiers::ABSTRACT);

static BUILTINS: LazyLock<Builtins> = LazyLock::new(|| {
	let ns = Namespace::bootstrap();
	let def = |name: &str, modifiers: Modifiers, sup: &TypeRef| {
		let ty = TypeBuilder::new(name).modifiers(modifiers).supertype(sup).assemble(&ns);
		ns.register(&ty);
		ty
	};

	let object = TypeBuilder::new("rt.Object").assemble_root(&ns);
	ns.register(&object);
	let number = def("rt.Number", ABSTRACT, &object);
	let throwable = def("rt.Throwable", Modifiers::PUBLIC, &object);
	let exception = def("rt.Exception", Modifiers::PUBLIC, &throwable);
	let runtime_exception = def("rt.RuntimeException", Modifiers::PUBLIC, &exception);
	let call_cell = def("rt.CallCell", ABSTRACT, &object);

	Builtins {
		string: def("rt.String", FINAL, &object),
		boolean_box: def("rt.Boolean", FINAL, &object),
		byte_box: def("rt.Byte", FINAL, &number),
		short_box: def("rt.Short", FINAL, &number),
		integer_box: def("rt.Integer", FINAL, &number),
		long_box: def("rt.Long", FINAL, &number),
		float_box: def("rt.Float", FINAL, &number),
		double_box: def("rt.Double", FINAL, &number),
		void_box: def("rt.Void", FINAL, &object),
		class_cast: def("rt.ClassCastException", Modifiers::PUBLIC, &runtime_exception),
		null_pointer: def("rt.NullPointerException", Modifiers::PUBLIC, &runtime_exception),
		illegal_argument: def("rt.IllegalArgumentException", Modifiers::PUBLIC, &runtime_exception),
		wrong_signature: def("rt.WrongSignatureException", Modifiers::PUBLIC, &runtime_exception),
		illegal_state: def("rt.IllegalStateException", Modifiers::PUBLIC, &runtime_exception),
		unsupported_operation: def("rt.UnsupportedOperationException", Modifiers::PUBLIC, &runtime_exception),
		index_out_of_bounds: def("rt.IndexOutOfBoundsException", Modifiers::PUBLIC, &runtime_exception),
		illegal_access: def("rt.IllegalAccessException", Modifiers::PUBLIC, &exception),
		not_found: def("rt.NotFoundException", Modifiers::PUBLIC, &exception),
		handle: def("rt.Handle", ABSTRACT, &object),
		constant_cell: def("rt.ConstantCell", FINAL, &call_cell),
		mutable_cell: def("rt.MutableCell", FINAL, &call_cell),
		volatile_cell: def("rt.VolatileCell", FINAL, &call_cell),
		object,
		number,
		throwable,
		exception,
		runtime_exception,
		call_cell,
	}
});

static ARRAYS: LazyLock<Mutex<FxHashMap<Kind, TypeRef>>> = LazyLock::new(|| Mutex::new(FxHashMap::default()));

macro_rules! accessors {
	($($name:ident),* $(,)?) => {
		$(
			pub fn $name() -> TypeRef {
				BUILTINS.$name.clone()
			}
		)*
	};
}

accessors!(
	object,
	string,
	number,
	boolean_box,
	byte_box,
	short_box,
	integer_box,
	long_box,
	float_box,
	double_box,
	void_box,
	throwable,
	exception,
	runtime_exception,
	class_cast,
	null_pointer,
	illegal_argument,
	wrong_signature,
	illegal_state,
	unsupported_operation,
	index_out_of_bounds,
	illegal_access,
	not_found,
	handle,
	call_cell,
	constant_cell,
	mutable_cell,
	volatile_cell,
);

/// Interned array type with the given component kind. A void component maps to the void box.
pub fn array_of(component: Kind) -> TypeRef {
	let component = match component {
		Kind::Void => Kind::Ref(void_box()),
		other => other,
	};
	let root = object();
	let mut arrays = ARRAYS.lock();
	if let Some(existing) = arrays.get(&component) {
		return existing.clone();
	}
	let (name, package, namespace, visibility) = match &component {
		Kind::Ref(ty) => (
			format!("{}[]", ty.name()),
			ty.package().to_string(),
			ty.namespace().clone(),
			ty.modifiers() & (Modifiers::PUBLIC | Modifiers::PRIVATE | Modifiers::PROTECTED),
		),
		prim => (format!("{prim}[]"), String::new(), Namespace::bootstrap(), Modifiers::PUBLIC),
	};
	let enclosing = component.as_ref_type().and_then(|ty| ty.enclosing().cloned());
	let ty = TypeRef::assemble(TypeData {
		id: TypeRef::next_id(),
		name: name.into(),
		package: package.into(),
		namespace,
		modifiers: visibility | Modifiers::FINAL | Modifiers::ABSTRACT,
		supertype: Some(root),
		interfaces: Box::new([]),
		enclosing,
		flavor: Flavor::Array(component.clone()),
		members: Box::new([]),
	});
	arrays.insert(component, ty.clone());
	ty
}

/// Resolves a builtin (or array-of-builtin) type by qualified name.
pub fn by_name(qualified: &str) -> Option<TypeRef> {
	LazyLock::force(&BUILTINS);
	resolve_in(&Namespace::bootstrap(), qualified)
}

/// Resolves a qualified name in `namespace`, including primitive and `[]` array names.
pub fn resolve_in(namespace: &Namespace, qualified: &str) -> Option<TypeRef> {
	LazyLock::force(&BUILTINS);
	if let Some(component) = qualified.strip_suffix("[]") {
		let kind = primitive_named(component).or_else(|| resolve_in(namespace, component).map(Kind::Ref))?;
		return Some(array_of(kind));
	}
	namespace.find(qualified)
}

/// Primitive kind for a keyword such as `int`.
pub fn primitive_named(name: &str) -> Option<Kind> {
	Kind::PRIMITIVES.into_iter().find(|k| k.to_string() == name)
}

use pretty_assertions::assert_eq;

use super::*;
use crate::fixture::{World, sig, world};
use crate::modes::LookupModes;

fn strings() -> Signature {
	sig(Kind::string(), [])
}

fn new_instance(ty: &TypeRef) -> Value {
	AccessContext::full(ty)
		.find_constructor(ty, &sig(Kind::Void, []))
		.unwrap()
		.call(&[])
		.unwrap()
}

fn count_of(w: &World, instance: &Value) -> Value {
	AccessContext::full(&w.base)
		.find_getter(&w.base, "count", &Kind::Int)
		.unwrap()
		.call(std::slice::from_ref(instance))
		.unwrap()
}

#[test]
fn test_find_static() {
	let w = world();
	let twice = AccessContext::public_lookup()
		.find_static(&w.base, "twice", &sig(Kind::Int, [Kind::Int]))
		.unwrap();
	assert_eq!(twice.signature(), &sig(Kind::Int, [Kind::Int]));
	assert_eq!(twice.call(&[Value::Int(4)]).unwrap(), Value::Int(8));

	let helper_sig = sig(Kind::Int, []);
	let helper = AccessContext::full(&w.sibling).find_static(&w.base, "helper", &helper_sig).unwrap();
	assert_eq!(helper.call(&[]).unwrap(), Value::Int(7));
	assert!(matches!(
		AccessContext::full(&w.derived).find_static(&w.base, "helper", &helper_sig),
		Err(Error::IllegalAccess(_))
	));
}

#[test]
fn test_missing_symbols_are_not_access_failures() {
	let w = world();
	let derived = AccessContext::full(&w.derived);
	assert!(matches!(
		derived.find_static(&w.hidden, "ping", &strings()),
		Err(Error::IllegalAccess(_))
	));
	assert!(matches!(
		derived.find_static(&w.hidden, "pong", &strings()),
		Err(Error::NotFound { what: "method", .. })
	));
	assert!(matches!(
		derived.find_static(&w.base, "twice", &sig(Kind::Long, [Kind::Long])),
		Err(Error::NotFound { .. })
	));
}

#[test]
fn test_static_and_instance_kinds_must_match() {
	let w = world();
	let full = AccessContext::full(&w.base);
	assert!(matches!(full.find_static(&w.base, "greet", &strings()), Err(Error::IllegalAccess(_))));
	assert!(matches!(
		full.find_virtual(&w.base, "twice", &sig(Kind::Int, [Kind::Int])),
		Err(Error::IllegalAccess(_))
	));
}

#[test]
fn test_find_virtual_dispatches_on_runtime_type() {
	let w = world();
	let greet = AccessContext::public_lookup().find_virtual(&w.base, "greet", &strings()).unwrap();
	assert_eq!(greet.signature(), &sig(Kind::string(), [Kind::Ref(w.base.clone())]));
	assert_eq!(greet.call(&[new_instance(&w.base)]).unwrap(), Value::str("base"));
	assert_eq!(greet.call(&[new_instance(&w.derived)]).unwrap(), Value::str("derived"));
	assert!(matches!(greet.call(&[Value::Null]), Err(Error::NullPointer(_))));
}

#[test]
fn test_private_methods_do_not_dispatch() {
	let w = world();
	let whisper = AccessContext::full(&w.base).find_virtual(&w.base, "whisper", &strings()).unwrap();
	assert_eq!(whisper.call(&[new_instance(&w.derived)]).unwrap(), Value::str("base-private"));
	assert!(AccessContext::full(&w.inner).find_virtual(&w.base, "whisper", &strings()).is_ok());
	assert!(matches!(
		AccessContext::full(&w.sibling).find_virtual(&w.base, "whisper", &strings()),
		Err(Error::IllegalAccess(_))
	));
}

#[test]
fn test_protected_method_receiver_is_restricted() {
	let w = world();
	let hook = AccessContext::full(&w.derived).find_virtual(&w.base, "hook", &strings()).unwrap();
	assert_eq!(hook.signature(), &sig(Kind::string(), [Kind::Ref(w.derived.clone())]));
	assert_eq!(hook.call(&[new_instance(&w.derived)]).unwrap(), Value::str("derived-hook"));
	assert!(matches!(hook.call(&[new_instance(&w.base)]), Err(Error::WrongSignature(_))));

	let same_package = AccessContext::full(&w.sibling).find_virtual(&w.base, "hook", &strings()).unwrap();
	assert_eq!(same_package.signature(), &sig(Kind::string(), [Kind::Ref(w.base.clone())]));
	assert!(matches!(
		AccessContext::full(&w.stranger).find_virtual(&w.base, "hook", &strings()),
		Err(Error::IllegalAccess(_))
	));
}

#[test]
fn test_interface_methods_dispatch_to_implementations() {
	let w = world();
	let area = AccessContext::public_lookup()
		.find_virtual(&w.shape, "area", &sig(Kind::Int, []))
		.unwrap();
	assert_eq!(area.call(&[new_instance(&w.square)]).unwrap(), Value::Int(4));
	let via_class = AccessContext::public_lookup()
		.find_virtual(&w.square, "area", &sig(Kind::Int, []))
		.unwrap();
	assert_eq!(via_class.call(&[new_instance(&w.square)]).unwrap(), Value::Int(4));
}

#[test]
fn test_find_special_skips_dispatch() {
	let w = world();
	let full = AccessContext::full(&w.derived);
	let special = full.find_special(&w.base, "greet", &strings(), &w.derived).unwrap();
	assert_eq!(special.signature(), &sig(Kind::string(), [Kind::Ref(w.derived.clone())]));
	assert_eq!(special.call(&[new_instance(&w.derived)]).unwrap(), Value::str("base"));

	let hook = full.find_special(&w.base, "hook", &strings(), &w.derived).unwrap();
	assert_eq!(hook.call(&[new_instance(&w.derived)]).unwrap(), Value::str("base-hook"));
}

#[test]
fn test_find_special_requirements() {
	let w = world();
	let full = AccessContext::full(&w.derived);
	assert!(matches!(
		full.find_special(&w.base, "greet", &strings(), &w.stranger),
		Err(Error::IllegalAccess(_))
	));
	let weakened = full.drop_lookup_mode(LookupModes::PRIVATE).unwrap();
	assert!(matches!(
		weakened.find_special(&w.base, "greet", &strings(), &w.derived),
		Err(Error::IllegalAccess(_))
	));
	assert!(matches!(
		AccessContext::full(&w.stranger).find_special(&w.base, "greet", &strings(), &w.stranger),
		Err(Error::IllegalAccess(_))
	));
}

#[test]
fn test_find_constructor() {
	let w = world();
	let make = AccessContext::full(&w.sibling)
		.find_constructor(&w.base, &sig(Kind::Void, [Kind::Int]))
		.unwrap();
	assert_eq!(make.signature(), &sig(Kind::Ref(w.base.clone()), [Kind::Int]));
	let first = make.call(&[Value::Int(5)]).unwrap();
	let second = make.call(&[Value::Int(6)]).unwrap();
	assert_eq!(first.type_of(), Some(w.base.clone()));
	assert_ne!(first, second);
	assert_eq!(count_of(&w, &first), Value::Int(5));
	assert_eq!(count_of(&w, &second), Value::Int(6));
}

#[test]
fn test_constructor_failures() {
	let w = world();
	let sibling = AccessContext::full(&w.sibling);
	assert!(matches!(
		sibling.find_constructor(&w.base, &sig(Kind::Int, [Kind::Int])),
		Err(Error::NotFound { what: "constructor", .. })
	));
	assert!(matches!(
		sibling.find_constructor(&w.base, &sig(Kind::Void, [Kind::Long])),
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		sibling.find_constructor(&w.template, &sig(Kind::Void, [])),
		Err(Error::IllegalAccess(_))
	));
	// Protected constructors only reach their own package.
	assert!(sibling.find_constructor(&w.base, &sig(Kind::Void, [])).is_ok());
	assert!(matches!(
		AccessContext::full(&w.derived).find_constructor(&w.base, &sig(Kind::Void, [])),
		Err(Error::IllegalAccess(_))
	));
}

#[test]
fn test_instance_fields() {
	let w = world();
	let full = AccessContext::full(&w.base);
	let set = full.find_setter(&w.base, "secret", &Kind::Int).unwrap();
	let get = full.find_getter(&w.base, "secret", &Kind::Int).unwrap();
	assert_eq!(set.signature(), &sig(Kind::Void, [Kind::Ref(w.base.clone()), Kind::Int]));
	let instance = new_instance(&w.derived);
	assert_eq!(get.call(std::slice::from_ref(&instance)).unwrap(), Value::Int(0));
	set.call(&[instance.clone(), Value::Int(42)]).unwrap();
	assert_eq!(get.call(&[instance]).unwrap(), Value::Int(42));

	assert!(matches!(get.call(&[Value::Null]), Err(Error::NullPointer(_))));
	assert!(matches!(
		AccessContext::full(&w.sibling).find_getter(&w.base, "secret", &Kind::Int),
		Err(Error::IllegalAccess(_))
	));
	assert!(matches!(
		full.find_getter(&w.base, "secret", &Kind::Long),
		Err(Error::NotFound { what: "field", .. })
	));
}

#[test]
fn test_field_kind_and_finality_checks() {
	let w = world();
	let full = AccessContext::full(&w.base);
	assert!(full.find_getter(&w.base, "id", &Kind::Int).is_ok());
	assert!(matches!(full.find_setter(&w.base, "id", &Kind::Int), Err(Error::IllegalAccess(_))));
	assert!(matches!(full.find_getter(&w.base, "LIMIT", &Kind::Int), Err(Error::IllegalAccess(_))));
	assert!(matches!(
		full.find_static_getter(&w.base, "count", &Kind::Int),
		Err(Error::IllegalAccess(_))
	));
	assert!(matches!(
		full.find_static_setter(&w.base, "LIMIT", &Kind::Int),
		Err(Error::IllegalAccess(_))
	));
}

#[test]
fn test_static_fields() {
	let w = world();
	let public = AccessContext::public_lookup();
	let limit = public.find_static_getter(&w.base, "LIMIT", &Kind::Int).unwrap();
	assert_eq!(limit.signature(), &sig(Kind::Int, []));
	assert_eq!(limit.call(&[]).unwrap(), Value::Int(10));

	let set_total = public.find_static_setter(&w.base, "total", &Kind::Long).unwrap();
	let get_total = public.find_static_getter(&w.base, "total", &Kind::Long).unwrap();
	set_total.call(&[Value::Long(5)]).unwrap();
	assert_eq!(get_total.call(&[]).unwrap(), Value::Long(5));
}

#[test]
fn test_protected_fields_across_packages() {
	let w = world();
	let from_derived = AccessContext::full(&w.derived)
		.find_getter(&w.base, "count", &Kind::Int)
		.unwrap();
	assert_eq!(from_derived.signature(), &sig(Kind::Int, [Kind::Ref(w.derived.clone())]));
	assert_eq!(from_derived.call(&[new_instance(&w.derived)]).unwrap(), Value::Int(0));

	let from_base = AccessContext::full(&w.base);
	assert!(matches!(
		from_base.find_getter(&w.derived, "extra", &Kind::Int),
		Err(Error::IllegalAccess(_))
	));
	let own = from_base.find_getter(&w.derived, "count", &Kind::Int).unwrap();
	assert_eq!(own.signature(), &sig(Kind::Int, [Kind::Ref(w.derived.clone())]));
}

#[test]
fn test_find_class() {
	let w = world();
	let base = AccessContext::full(&w.base);
	assert_eq!(base.find_class("p.Hidden").unwrap(), w.hidden);
	assert_eq!(base.find_class("rt.String").unwrap(), builtins::string());
	assert!(matches!(
		AccessContext::full(&w.derived).find_class("p.Hidden"),
		Err(Error::IllegalAccess(_))
	));
	assert!(matches!(base.find_class("p.Nope"), Err(Error::NotFound { what: "type", .. })));
	assert!(matches!(base.find_class("p.Foreign"), Err(Error::NotFound { .. })));
	assert!(matches!(
		AccessContext::public_lookup().find_class("p.Base"),
		Err(Error::NotFound { .. })
	));
	assert_eq!(w.factory.namespace().find("p.Base"), Some(w.base.clone()));
}

#[test]
fn test_bind_receiver() {
	let w = world();
	let public = AccessContext::public_lookup();
	let bound = public.bind(&new_instance(&w.derived), "greet", &strings()).unwrap();
	assert_eq!(bound.signature(), &strings());
	assert_eq!(bound.call(&[]).unwrap(), Value::str("derived"));
	assert!(matches!(public.bind(&Value::Null, "greet", &strings()), Err(Error::NullPointer(_))));
	assert!(matches!(
		public.bind(&Value::Int(1), "greet", &strings()),
		Err(Error::IllegalArgument(_))
	));
}

#[test]
fn test_weakened_context_resolves_nothing() {
	let w = world();
	let weakened = AccessContext::full(&w.derived).in_type(&w.hidden);
	assert!(matches!(
		weakened.find_static(&w.base, "twice", &sig(Kind::Int, [Kind::Int])),
		Err(Error::IllegalAccess(_))
	));
	assert!(matches!(weakened.find_class("p.Base"), Err(Error::IllegalAccess(_))));
}

#[test]
fn test_body_failures_propagate() {
	let w = world();
	let fail = AccessContext::public_lookup().find_virtual(&w.base, "fail", &strings()).unwrap();
	assert!(matches!(fail.call(&[new_instance(&w.derived)]), Err(Error::IllegalState(_))));
}

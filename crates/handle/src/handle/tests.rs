use linkage_types::{builtins, RuntimeConfig};
use pretty_assertions::assert_eq;

use super::*;

fn add() -> Handle {
	let sig = Signature::new(Kind::Int, [Kind::Int, Kind::Int]).unwrap();
	Handle::native("add", sig, |args| Ok(Value::Int(args[0].as_int().unwrap() + args[1].as_int().unwrap())))
}

#[test]
fn test_exact_invocation_requires_equal_signature() {
	let h = add();
	assert_eq!(h.call(&[Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));

	let other = Signature::new(Kind::Long, [Kind::Int, Kind::Int]).unwrap();
	assert!(matches!(
		h.invoke_exact(&other, &[Value::Int(2), Value::Int(3)]),
		Err(Error::WrongSignature(_))
	));
}

#[test]
fn test_exact_invocation_checks_arguments() {
	let h = add();
	assert!(matches!(h.call(&[Value::Int(1)]), Err(Error::WrongSignature(_))));
	assert!(matches!(
		h.call(&[Value::Int(1), Value::Long(2)]),
		Err(Error::WrongSignature(_))
	));
	assert!(matches!(h.call(&[Value::Int(1), Value::Null]), Err(Error::WrongSignature(_))));
}

#[test]
fn test_generic_invocation_adapts() {
	let h = add();
	let wide = Signature::new(Kind::Double, [Kind::Byte, Kind::Short]).unwrap();
	assert_eq!(h.invoke(&wide, &[Value::Byte(1), Value::Short(2)]).unwrap(), Value::Double(3.0));

	let out = h.invoke_with_arguments(&[Value::Int(4), Value::Int(5)]).unwrap();
	assert_eq!(out, Value::Int(9).boxed());
	assert!(matches!(
		h.invoke_with_arguments(&[Value::Int(4), Value::Null]),
		Err(Error::NullPointer(_))
	));
}

#[test]
fn test_handle_round_trips_through_values() {
	let h = add();
	let value = h.to_value();
	assert_eq!(value.type_of(), Some(builtins::handle()));
	assert_eq!(Handle::from_value(&value).unwrap(), h);
	assert!(matches!(Handle::from_value(&Value::Null), Err(Error::NullPointer(_))));
	assert!(matches!(Handle::from_value(&Value::str("h")), Err(Error::ClassCast { .. })));
	assert_eq!(Value::from(h.clone()), value);
}

#[test]
fn test_debug_names_form_and_signature() {
	assert_eq!(format!("{:?}", add()), "Handle(int,int)int[add]");
	let id = Handle::new(Signature::new(Kind::Long, [Kind::Long]).unwrap(), Form::Identity);
	assert_eq!(format!("{id:?}"), "Handle(long)long[identity]");
}

#[test]
fn test_body_errors_propagate() {
	let failing = Handle::native("fail", Signature::new(Kind::Void, []).unwrap(), |_| {
		Err(Error::IllegalState("failed".into()))
	});
	assert!(matches!(failing.call(&[]), Err(Error::IllegalState(_))));
}

#[test]
fn test_runtime_config_defaults_enable_argument_checks() {
	let config = RuntimeConfig::default();
	assert!(config.check_exact_arguments);
	assert!(!config.trace_invocations);
	assert!(config::current().max_slots >= add().signature().slot_count());
}

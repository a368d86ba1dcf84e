use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use linkage_types::{Condition, Value};
use pretty_assertions::assert_eq;

use super::*;
use crate::basic::{constant, throw_exception};
use crate::binder::drop_arguments;

fn sig(ret: Kind, params: impl IntoIterator<Item = Kind>) -> Signature {
	Signature::new(ret, params).unwrap()
}

fn counting(name: &'static str, counter: Arc<AtomicUsize>) -> Handle {
	Handle::native(name, sig(Kind::string(), [Kind::Int, Kind::string()]), move |args| {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(Value::str(&format!("{name}:{}", args[0].as_int().unwrap())))
	})
}

fn is_positive() -> Handle {
	Handle::native("positive", sig(Kind::Boolean, [Kind::Int]), |args| {
		Ok(Value::Boolean(args[0].as_int().unwrap() > 0))
	})
}

#[test]
fn test_guard_invokes_exactly_one_branch() {
	let yes_calls = Arc::new(AtomicUsize::new(0));
	let no_calls = Arc::new(AtomicUsize::new(0));
	let guard = guard_with_test(
		&is_positive(),
		&counting("yes", yes_calls.clone()),
		&counting("no", no_calls.clone()),
	)
	.unwrap();

	assert_eq!(guard.call(&[Value::Int(3), Value::str("s")]).unwrap(), Value::str("yes:3"));
	assert_eq!(guard.call(&[Value::Int(-1), Value::str("s")]).unwrap(), Value::str("no:-1"));
	assert_eq!(guard.call(&[Value::Int(0), Value::str("s")]).unwrap(), Value::str("no:0"));
	assert_eq!(yes_calls.load(Ordering::SeqCst), 1);
	assert_eq!(no_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_guard_test_failure_selects_no_branch() {
	let calls = Arc::new(AtomicUsize::new(0));
	let failing = Handle::native("failing", sig(Kind::Boolean, []), |_| Err(Error::IllegalState("test".into())));
	let guard = guard_with_test(&failing, &counting("a", calls.clone()), &counting("b", calls.clone())).unwrap();
	assert!(matches!(guard.call(&[Value::Int(1), Value::Null]), Err(Error::IllegalState(_))));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_guard_shape_errors() {
	let calls = Arc::new(AtomicUsize::new(0));
	let branch = counting("a", calls);
	let other = constant(Kind::string(), Value::str("x")).unwrap();
	assert!(guard_with_test(&is_positive(), &branch, &other).is_err());

	let not_boolean = Handle::native("n", sig(Kind::Int, [Kind::Int]), |_| Ok(Value::Int(1)));
	assert!(guard_with_test(&not_boolean, &branch, &branch).is_err());

	let not_prefix = Handle::native("n", sig(Kind::Boolean, [Kind::string()]), |_| Ok(Value::Boolean(true)));
	assert!(guard_with_test(&not_prefix, &branch, &branch).is_err());
}

fn failing_target(error: fn() -> Error) -> Handle {
	Handle::native("fails", sig(Kind::string(), [Kind::string(), Kind::Int]), move |args| {
		if args[1].as_int() == Some(0) {
			Err(error())
		} else {
			Ok(Value::str("ok"))
		}
	})
}

fn recovering_handler() -> Handle {
	Handle::native(
		"recover",
		sig(Kind::string(), [Kind::Ref(builtins::runtime_exception()), Kind::string()]),
		|args| {
			let condition = args[0].as_condition().unwrap();
			Ok(Value::str(&format!("{}/{}", condition.type_of().name(), args[1].as_str().unwrap())))
		},
	)
}

#[test]
fn test_catch_handles_subtype_and_passes_leading_arguments() {
	let caught = catch_exception(
		&failing_target(|| Error::IllegalState("bad".into())),
		&builtins::runtime_exception(),
		&recovering_handler(),
	)
	.unwrap();
	assert_eq!(caught.call(&[Value::str("arg"), Value::Int(1)]).unwrap(), Value::str("ok"));
	assert_eq!(
		caught.call(&[Value::str("arg"), Value::Int(0)]).unwrap(),
		Value::str("IllegalStateException/arg")
	);
}

#[test]
fn test_catch_propagates_unrelated_conditions() {
	let caught = catch_exception(
		&failing_target(|| Error::IllegalAccess("nope".into())),
		&builtins::runtime_exception(),
		&recovering_handler(),
	)
	.unwrap();
	assert!(matches!(caught.call(&[Value::str("a"), Value::Int(0)]), Err(Error::IllegalAccess(_))));
}

#[test]
fn test_catch_rethrow_preserves_error_variant() {
	let rethrow = throw_exception(Kind::string(), &builtins::runtime_exception()).unwrap();
	let rethrow = drop_arguments(&rethrow, 1, &[Kind::string()]).unwrap();
	let caught = catch_exception(
		&failing_target(|| Error::IndexOutOfBounds { index: 9, len: 1 }),
		&builtins::runtime_exception(),
		&rethrow,
	)
	.unwrap();
	assert!(matches!(
		caught.call(&[Value::str("a"), Value::Int(0)]),
		Err(Error::IndexOutOfBounds { index: 9, len: 1 })
	));
}

#[test]
fn test_catch_user_condition() {
	let raising = Handle::native("raise", sig(Kind::Int, []), |_| {
		Err(Error::Raised(Arc::new(Condition::new(builtins::illegal_argument(), "user"))))
	});
	let handler = Handle::native("h", sig(Kind::Int, [Kind::Ref(builtins::throwable())]), |args| {
		Ok(Value::Int(args[0].as_condition().unwrap().message().len() as i32))
	});
	let caught = catch_exception(&raising, &builtins::exception(), &handler).unwrap();
	assert_eq!(caught.call(&[]).unwrap(), Value::Int(4));
}

#[test]
fn test_catch_shape_errors() {
	let target = failing_target(|| Error::IllegalState("x".into()));
	assert!(catch_exception(&target, &builtins::string(), &recovering_handler()).is_err());
	assert!(catch_exception(&target, &builtins::throwable(), &recovering_handler()).is_err());

	let wrong_ret = Handle::native("h", sig(Kind::Int, [Kind::Ref(builtins::throwable())]), |_| Ok(Value::Int(0)));
	assert!(catch_exception(&target, &builtins::exception(), &wrong_ret).is_err());

	let wrong_rest = Handle::native(
		"h",
		sig(Kind::string(), [Kind::Ref(builtins::throwable()), Kind::Int]),
		|_| Ok(Value::Null),
	);
	assert!(catch_exception(&target, &builtins::exception(), &wrong_rest).is_err());
}

#[test]
fn test_try_finally_sees_result_and_replaces_it() {
	let target = Handle::native("double", sig(Kind::Int, [Kind::Int]), |args| {
		let n = args[0].as_int().unwrap();
		if n < 0 {
			Err(Error::IllegalArgument("negative".into()))
		} else {
			Ok(Value::Int(n * 2))
		}
	});
	let cleanups = Arc::new(AtomicUsize::new(0));
	let seen = cleanups.clone();
	let cleanup = Handle::native(
		"cleanup",
		sig(Kind::Int, [Kind::Ref(builtins::throwable()), Kind::Int, Kind::Int]),
		move |args| {
			seen.fetch_add(1, Ordering::SeqCst);
			Ok(Value::Int(args[1].as_int().unwrap() + args[2].as_int().unwrap()))
		},
	);
	let wrapped = try_finally(&target, &cleanup).unwrap();
	assert_eq!(wrapped.call(&[Value::Int(5)]).unwrap(), Value::Int(15));
	assert!(matches!(wrapped.call(&[Value::Int(-1)]), Err(Error::IllegalArgument(_))));
	assert_eq!(cleanups.load(Ordering::SeqCst), 2);
}

#[test]
fn test_try_finally_void_target_receives_null_condition() {
	let target = Handle::native("noop", sig(Kind::Void, [Kind::string()]), |_| Ok(Value::Void));
	let cleanup = Handle::native("cleanup", sig(Kind::Void, [Kind::Ref(builtins::throwable())]), |args| {
		assert!(args[0].is_null());
		Ok(Value::Void)
	});
	let wrapped = try_finally(&target, &cleanup).unwrap();
	assert_eq!(wrapped.call(&[Value::str("x")]).unwrap(), Value::Void);
}

#[test]
fn test_try_finally_cleanup_failure_wins() {
	let target = Handle::native("fails", sig(Kind::Void, []), |_| Err(Error::IllegalState("first".into())));
	let cleanup = Handle::native("cleanup", sig(Kind::Void, [Kind::Ref(builtins::throwable())]), |_| {
		Err(Error::UnsupportedOperation("second".into()))
	});
	let wrapped = try_finally(&target, &cleanup).unwrap();
	assert!(matches!(wrapped.call(&[]), Err(Error::UnsupportedOperation(_))));
}

#[test]
fn test_try_finally_shape_errors() {
	let target = Handle::native("t", sig(Kind::Int, [Kind::Int]), |_| Ok(Value::Int(0)));
	let no_result = Handle::native("c", sig(Kind::Int, [Kind::Ref(builtins::throwable())]), |_| Ok(Value::Int(0)));
	assert!(try_finally(&target, &no_result).is_err());

	let narrow = Handle::native(
		"c",
		sig(Kind::Int, [Kind::Ref(builtins::runtime_exception()), Kind::Int]),
		|_| Ok(Value::Int(0)),
	);
	assert!(try_finally(&target, &narrow).is_err());
}

//! A small type universe shared by the unit tests.
//!
//! Packages `p` and `q` live in one namespace; `p.Foreign` lives in an unrelated one.

use linkage_types::{Error, Instance, Kind, Modifiers, Signature, TypeBuilder, TypeFactory, TypeRef, Value};

pub(crate) struct World {
	pub factory: TypeFactory,
	/// `public class p.Base`
	pub base: TypeRef,
	/// `private class p.Base$Inner`
	pub inner: TypeRef,
	/// `class p.Hidden`
	pub hidden: TypeRef,
	/// `public class p.Sibling`
	pub sibling: TypeRef,
	/// `public class q.Derived extends p.Base`
	pub derived: TypeRef,
	/// `public class q.Stranger`
	pub stranger: TypeRef,
	/// `public interface p.Shape`
	pub shape: TypeRef,
	/// `public class p.Square implements p.Shape`
	pub square: TypeRef,
	/// `public abstract class p.Template`
	pub template: TypeRef,
	/// `public class p.Foreign` in another namespace
	pub foreign: TypeRef,
}

pub(crate) fn sig(ret: Kind, params: impl IntoIterator<Item = Kind>) -> Signature {
	Signature::new(ret, params).unwrap()
}

/// The ancestor of `instance`'s type named `qualified`.
fn declaring(instance: &Instance, qualified: &str) -> TypeRef {
	instance
		.type_of()
		.ancestry()
		.find(|ty| ty.qualified_name() == qualified)
		.unwrap()
}

fn text(s: &'static str) -> impl Fn(&[Value]) -> linkage_types::Result<Value> + Send + Sync + 'static {
	move |_: &[Value]| Ok(Value::str(s))
}

pub(crate) fn world() -> World {
	let factory = TypeFactory::isolated("app");
	let strings = sig(Kind::string(), []);
	let base = factory
		.define(
			TypeBuilder::new("p.Base")
				.constructor(Modifiers::PUBLIC, sig(Kind::Void, [Kind::Int]), |instance, args| {
					instance.set(&declaring(instance, "p.Base"), "count", args[0].clone())
				})
				.constructor(Modifiers::PROTECTED, sig(Kind::Void, []), |_, _| Ok(()))
				.method("greet", Modifiers::PUBLIC, strings.clone(), text("base"))
				.method("hook", Modifiers::PROTECTED, strings.clone(), text("base-hook"))
				.method("whisper", Modifiers::PRIVATE, strings.clone(), text("base-private"))
				.method("fail", Modifiers::PUBLIC, strings.clone(), |_| {
					Err(Error::IllegalState("base failure".into()))
				})
				.field("count", Modifiers::PROTECTED, Kind::Int)
				.field("secret", Modifiers::PRIVATE, Kind::Int)
				.field("id", Modifiers::PUBLIC | Modifiers::FINAL, Kind::Int)
				.static_method("helper", Modifiers::empty(), sig(Kind::Int, []), |_| Ok(Value::Int(7)))
				.static_method("twice", Modifiers::PUBLIC, sig(Kind::Int, [Kind::Int]), |args| {
					Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
				})
				.static_method("stamp", Modifiers::PROTECTED, strings.clone(), text("stamp"))
				.static_field("LIMIT", Modifiers::PUBLIC | Modifiers::FINAL, Kind::Int, Value::Int(10))
				.static_field("total", Modifiers::PUBLIC, Kind::Long, Value::Long(0)),
		)
		.unwrap();
	let inner = factory
		.define(
			TypeBuilder::new("Inner")
				.enclosing(&base)
				.modifiers(Modifiers::PRIVATE)
				.method("peek", Modifiers::PRIVATE, sig(Kind::Int, []), |_| Ok(Value::Int(1))),
		)
		.unwrap();
	let hidden = factory
		.define(
			TypeBuilder::new("p.Hidden")
				.modifiers(Modifiers::empty())
				.static_method("ping", Modifiers::PUBLIC, strings.clone(), text("hidden")),
		)
		.unwrap();
	let sibling = factory.define(TypeBuilder::new("p.Sibling")).unwrap();
	let derived = factory
		.define(
			TypeBuilder::new("q.Derived")
				.supertype(&base)
				.constructor(Modifiers::PUBLIC, sig(Kind::Void, []), |_, _| Ok(()))
				.method("greet", Modifiers::PUBLIC, strings.clone(), text("derived"))
				.method("hook", Modifiers::PROTECTED, strings.clone(), text("derived-hook"))
				.method("whisper", Modifiers::PUBLIC, strings.clone(), text("derived-public"))
				.field("extra", Modifiers::PROTECTED, Kind::Int),
		)
		.unwrap();
	let stranger = factory.define(TypeBuilder::new("q.Stranger")).unwrap();
	let shape = factory
		.define(
			TypeBuilder::new("p.Shape")
				.interface()
				.method("area", Modifiers::PUBLIC, sig(Kind::Int, []), |_| Ok(Value::Int(0))),
		)
		.unwrap();
	let square = factory
		.define(
			TypeBuilder::new("p.Square")
				.implements(&shape)
				.constructor(Modifiers::PUBLIC, sig(Kind::Void, []), |_, _| Ok(()))
				.method("area", Modifiers::PUBLIC, sig(Kind::Int, []), |_| Ok(Value::Int(4))),
		)
		.unwrap();
	let template = factory
		.define(
			TypeBuilder::new("p.Template")
				.modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
				.constructor(Modifiers::PUBLIC, sig(Kind::Void, []), |_, _| Ok(())),
		)
		.unwrap();
	let other = TypeFactory::isolated("other");
	let foreign = other
		.define(TypeBuilder::new("p.Foreign").static_method("ping", Modifiers::PUBLIC, strings, text("foreign")))
		.unwrap();
	World {
		factory,
		base,
		inner,
		hidden,
		sibling,
		derived,
		stranger,
		shape,
		square,
		template,
		foreign,
	}
}

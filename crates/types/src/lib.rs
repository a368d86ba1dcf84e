//! Core value model for dynamic invocation.
//!
//! Every handle in the runtime is described by a [`Signature`]: an ordered list of parameter
//! [`Kind`]s plus one return kind. Reference kinds point into the type universe ([`TypeRef`]),
//! which is populated by builtin types and by [`TypeFactory`] for externally defined types.
//!
//! The [`convert`] module holds the conversion algebra shared by every signature-changing
//! adapter. All failures surface as [`Error`].

pub mod builtins;
pub mod config;
pub mod convert;
pub mod error;
pub mod factory;
pub mod kind;
pub mod member;
pub mod signature;
pub mod ty;
pub mod value;

pub use config::{ConfigError, RuntimeConfig};
pub use convert::{AdaptPlan, Mode, Step};
pub use error::{Error, Result};
pub use factory::{TypeBuilder, TypeFactory};
pub use kind::Kind;
pub use member::{FieldStorage, InitFn, Member, MemberBody, NativeFn};
pub use signature::Signature;
pub use ty::{Flavor, Modifiers, Namespace, TypeRef, Visibility};
pub use value::{Array, Condition, Instance, Object, OpaqueObject, Value};

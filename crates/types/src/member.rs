//! Members declared on defined types.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::kind::Kind;
use crate::signature::Signature;
use crate::ty::Modifiers;
use crate::value::{Instance, Value};

/// Native body of a method. Instance methods receive the receiver as the first argument.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Initializer run on a freshly allocated instance.
pub type InitFn = Arc<dyn Fn(&Instance, &[Value]) -> Result<()> + Send + Sync>;

/// Backing storage of a field.
#[derive(Clone)]
pub enum FieldStorage {
	/// One shared cell for the declaring type.
	Static(Arc<RwLock<Value>>),
	/// One slot per instance, keyed by declaring type and field name.
	Instance,
}

/// What a member is.
#[derive(Clone)]
pub enum MemberBody {
	/// `sig` excludes the receiver for instance methods.
	Method { sig: Signature, body: NativeFn },
	/// `params` has a void return; the produced handle returns the declaring type.
	Constructor { params: Signature, init: InitFn },
	Field { kind: Kind, storage: FieldStorage },
}

/// A named member with modifiers.
#[derive(Clone)]
pub struct Member {
	pub name: Arc<str>,
	pub modifiers: Modifiers,
	pub body: MemberBody,
}

impl Member {
	pub fn is_static(&self) -> bool {
		self.modifiers.is_static()
	}

	pub fn is_method(&self) -> bool {
		matches!(self.body, MemberBody::Method { .. })
	}

	pub fn is_constructor(&self) -> bool {
		matches!(self.body, MemberBody::Constructor { .. })
	}

	pub fn is_field(&self) -> bool {
		matches!(self.body, MemberBody::Field { .. })
	}

	/// Method signature, if this member is a method.
	pub fn method_signature(&self) -> Option<&Signature> {
		match &self.body {
			MemberBody::Method { sig, .. } => Some(sig),
			_ => None,
		}
	}

	/// Field kind, if this member is a field.
	pub fn field_kind(&self) -> Option<&Kind> {
		match &self.body {
			MemberBody::Field { kind, .. } => Some(kind),
			_ => None,
		}
	}
}

impl fmt::Debug for Member {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let shape = match &self.body {
			MemberBody::Method { sig, .. } => format!("method {sig}"),
			MemberBody::Constructor { params, .. } => format!("constructor {params}"),
			MemberBody::Field { kind, .. } => format!("field {kind}"),
		};
		f.debug_struct("Member")
			.field("name", &self.name)
			.field("modifiers", &self.modifiers)
			.field("shape", &shape)
			.finish()
	}
}

//! Lookup contexts: a lookup type plus the modes it may exercise.
//!
//! # Lifecycle
//!
//! A context starts either as [`AccessContext::full`] for a type (everything that type may
//! touch) or as [`AccessContext::public_lookup`]. [`AccessContext::in_type`] and
//! [`AccessContext::drop_lookup_mode`] derive weaker contexts; nothing derives a stronger one
//! except [`AccessContext::private_lookup_in`], which requires the caller to hold private
//! access already.
//!
//! Contexts are immutable values and freely shared across threads.

use std::fmt;

use linkage_types::{Error, Result, TypeRef, builtins};
use tracing::{debug, warn};

use crate::lattice;
use crate::modes::LookupModes;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessContext {
	lookup_type: TypeRef,
	modes: LookupModes,
}

impl AccessContext {
	/// Every mode on `lookup_type`.
	pub fn full(lookup_type: &TypeRef) -> Self {
		Self {
			lookup_type: lookup_type.clone(),
			modes: LookupModes::FULL,
		}
	}

	/// Public members of public types only.
	pub fn public_lookup() -> Self {
		Self {
			lookup_type: builtins::object(),
			modes: LookupModes::PUBLIC,
		}
	}

	pub fn lookup_type(&self) -> &TypeRef {
		&self.lookup_type
	}

	pub fn lookup_modes(&self) -> LookupModes {
		self.modes
	}

	pub fn has_private_access(&self) -> bool {
		self.modes.contains(LookupModes::PRIVATE)
	}

	/// The same caller's view from `target`.
	///
	/// Moving to the lookup type itself returns an equal context; any other move keeps only
	/// the modes both types justify.
	pub fn in_type(&self, target: &TypeRef) -> Self {
		let modes = lattice::narrow(&self.lookup_type, self.modes, target);
		if modes != self.modes {
			debug!(from = %self.lookup_type, to = %target, %modes, "linkage.access.narrow");
		}
		if modes.is_empty() && !self.modes.is_empty() {
			warn!(from = %self.lookup_type, to = %target, "linkage.access.no_access");
		}
		Self {
			lookup_type: target.clone(),
			modes,
		}
	}

	/// A full context on `target`, granted to callers that hold private access.
	pub fn private_lookup_in(target: &TypeRef, caller: &AccessContext) -> Result<Self> {
		if target.is_array() {
			return Err(Error::IllegalArgument(format!("{target} is an array type")));
		}
		if !caller.has_private_access() {
			return Err(Error::IllegalAccess(format!("{caller} lacks private access")));
		}
		debug!(caller = %caller, target = %target, "linkage.access.private_lookup");
		Ok(Self::full(target))
	}

	/// This context without `mode`; see [`lattice::drop_mode`].
	pub fn drop_lookup_mode(&self, mode: LookupModes) -> Result<Self> {
		Ok(Self {
			lookup_type: self.lookup_type.clone(),
			modes: lattice::drop_mode(self.modes, mode)?,
		})
	}

	pub(crate) fn can_access_type(&self, target: &TypeRef) -> bool {
		lattice::can_access_type(&self.lookup_type, self.modes, target)
	}

	pub(crate) fn check_type(&self, target: &TypeRef) -> Result<()> {
		if self.can_access_type(target) {
			Ok(())
		} else {
			Err(Error::IllegalAccess(format!("{target} is not accessible from {self}")))
		}
	}
}

impl fmt::Display for AccessContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.modes == LookupModes::FULL {
			write!(f, "{}", self.lookup_type)
		} else {
			write!(f, "{}/{}", self.lookup_type, self.modes)
		}
	}
}

impl fmt::Debug for AccessContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "AccessContext({self})")
	}
}

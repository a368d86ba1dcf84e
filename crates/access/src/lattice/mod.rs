//! Permission rules as pure functions of types and mode bits.
//!
//! # Mental model
//!
//! * A lookup type plus a [`LookupModes`] set decides what may be resolved.
//! * Type access comes first: a member of an inaccessible type is inaccessible.
//! * Member access then follows the member's declared visibility:
//!   * public members need nothing more;
//!   * private members need [`LookupModes::PRIVATE`] and a nestmate lookup type;
//!   * package members need [`LookupModes::PACKAGE`] and the same package;
//!   * protected members are reachable from the same package, or by inheritance when the
//!     context holds [`LookupModes::PROTECTED`] and the lookup type is a class.
//!
//! # Invariants
//!
//! * [`narrow`] never adds a mode, except that moving to the lookup type itself is a no-op.
//! * [`drop_mode`] never adds a mode and always clears [`LookupModes::PROTECTED`].

use linkage_types::{Error, Kind, Modifiers, Result, TypeRef, Visibility};

use crate::modes::LookupModes;

/// Modes a context for `lookup` keeps when it moves to `target`.
pub fn narrow(lookup: &TypeRef, modes: LookupModes, target: &TypeRef) -> LookupModes {
	if lookup == target {
		return modes;
	}
	let same_package = lookup.same_package(target);
	let mut narrowed = modes;
	if !same_package {
		narrowed -= LookupModes::PACKAGE | LookupModes::PROTECTED;
	}
	if narrowed.contains(LookupModes::PRIVATE) && lookup.outermost() != target.outermost() {
		narrowed -= LookupModes::PRIVATE | LookupModes::PROTECTED;
	}
	match target.modifiers().visibility() {
		Visibility::Public | Visibility::Protected => {
			if lookup.namespace() != target.namespace() {
				narrowed -= LookupModes::PACKAGE | LookupModes::PRIVATE | LookupModes::PROTECTED;
			}
			narrowed
		}
		Visibility::Package | Visibility::Private => {
			if same_package && modes.contains(LookupModes::PACKAGE) {
				narrowed
			} else {
				LookupModes::NO_ACCESS
			}
		}
	}
}

/// Modes left after giving up `drop`.
///
/// `drop` must name exactly one mode. Dropping [`LookupModes::PACKAGE`] also drops
/// [`LookupModes::PRIVATE`], dropping [`LookupModes::PUBLIC`] drops everything, and
/// [`LookupModes::PROTECTED`] is dropped in every case.
pub fn drop_mode(modes: LookupModes, drop: LookupModes) -> Result<LookupModes> {
	if !drop.is_single() {
		return Err(Error::IllegalArgument(format!("cannot drop lookup mode {drop}")));
	}
	let mut remaining = modes - LookupModes::PROTECTED;
	if drop == LookupModes::PRIVATE {
		remaining -= LookupModes::PRIVATE;
	} else if drop == LookupModes::PACKAGE {
		remaining -= LookupModes::PACKAGE | LookupModes::PRIVATE;
	} else if drop == LookupModes::PUBLIC {
		remaining = LookupModes::NO_ACCESS;
	}
	Ok(remaining)
}

/// True when `target` itself is visible to a context for `lookup`.
pub fn can_access_type(lookup: &TypeRef, modes: LookupModes, target: &TypeRef) -> bool {
	if modes.is_empty() {
		return false;
	}
	if let Some(component) = target.component() {
		return match component {
			Kind::Ref(inner) => can_access_type(lookup, modes, inner),
			_ => true,
		};
	}
	if lookup == target {
		return true;
	}
	match target.modifiers().visibility() {
		Visibility::Public => true,
		Visibility::Protected => !lookup.is_interface(),
		Visibility::Package | Visibility::Private => {
			modes.intersects(LookupModes::PACKAGE | LookupModes::PRIVATE) && lookup.same_package(target)
		}
	}
}

/// True when a member with `member_mods` declared on `declaring` is visible.
///
/// `protected_bound` restricts inherited protected access further: when set, the lookup type
/// must also be assignable from it. Special invocation passes its caller here.
pub fn can_access_member(
	lookup: &TypeRef,
	modes: LookupModes,
	declaring: &TypeRef,
	member_mods: Modifiers,
	protected_bound: Option<&TypeRef>,
) -> bool {
	if !can_access_type(lookup, modes, declaring) {
		return false;
	}
	match member_mods.visibility() {
		Visibility::Public => true,
		Visibility::Private => {
			modes.contains(LookupModes::PRIVATE) && (declaring == lookup || declaring.is_nestmate_of(lookup))
		}
		Visibility::Package => modes.contains(LookupModes::PACKAGE) && declaring.same_package(lookup),
		Visibility::Protected => {
			if modes == LookupModes::PUBLIC {
				return false;
			}
			if declaring.is_array() {
				return true;
			}
			if modes.intersects(LookupModes::PACKAGE_OR_PROTECTED) && declaring.same_package(lookup) {
				return true;
			}
			if lookup.is_interface() || !modes.contains(LookupModes::PROTECTED) {
				return false;
			}
			if !declaring.is_assignable_from(lookup) {
				return false;
			}
			protected_bound.is_none_or(|bound| lookup.is_assignable_from(bound))
		}
	}
}

/// True when an instance member reached through inheritance must take the lookup type as its
/// receiver instead of the declaring type.
pub fn restricts_receiver(lookup: &TypeRef, declaring: &TypeRef, member_mods: Modifiers) -> bool {
	!member_mods.is_static()
		&& member_mods.visibility() == Visibility::Protected
		&& declaring != lookup
		&& declaring.is_assignable_from(lookup)
		&& !declaring.same_package(lookup)
}

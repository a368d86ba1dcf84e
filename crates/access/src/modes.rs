use std::fmt;

bitflags::bitflags! {
	/// Permission bits held by an [`AccessContext`](crate::AccessContext).
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct LookupModes: u32 {
		const PUBLIC = 0x01;
		const PRIVATE = 0x02;
		const PROTECTED = 0x04;
		const PACKAGE = 0x08;
	}
}

impl LookupModes {
	/// Every mode; held by a context created for its own lookup type.
	pub const FULL: Self = Self::all();

	/// No mode at all. A context in this state resolves nothing.
	pub const NO_ACCESS: Self = Self::empty();

	/// Modes that grant same-package access to protected members.
	pub(crate) const PACKAGE_OR_PROTECTED: Self = Self::PACKAGE.union(Self::PROTECTED);

	/// True when exactly one mode bit is set.
	pub const fn is_single(self) -> bool {
		self.bits().count_ones() == 1
	}
}

impl fmt::Display for LookupModes {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_empty() {
			return f.write_str("noaccess");
		}
		for (i, (name, _)) in self.iter_names().enumerate() {
			if i > 0 {
				f.write_str(",")?;
			}
			f.write_str(&name.to_ascii_lowercase())?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn test_display_lists_modes() {
		assert_eq!(LookupModes::NO_ACCESS.to_string(), "noaccess");
		assert_eq!(LookupModes::PUBLIC.to_string(), "public");
		assert_eq!(LookupModes::FULL.to_string(), "public,private,protected,package");
	}

	#[test]
	fn test_single_mode() {
		assert!(LookupModes::PACKAGE.is_single());
		assert!(!LookupModes::FULL.is_single());
		assert!(!LookupModes::NO_ACCESS.is_single());
	}
}

//! One-way invalidation flags for guarded dispatch.
//!
//! A token starts valid. [`InvalidationToken::invalidate_all`] flips tokens to invalid, never
//! back, and bumps a process-wide generation counter. Handles built with
//! [`InvalidationToken::guard_with_test`] select their valid branch until the token flips, then
//! select the fallback on every later call from every thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use linkage_types::{Error, Result};
use tracing::debug;

use crate::handle::{Form, Handle};

static GENERATION: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Default)]
pub struct InvalidationToken(Arc<AtomicBool>);

impl InvalidationToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn has_been_invalidated(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}

	/// Dispatches to `valid` while this token holds, and to `fallback` afterwards.
	///
	/// Both handles must share one signature.
	pub fn guard_with_test(&self, valid: &Handle, fallback: &Handle) -> Result<Handle> {
		if valid.signature() != fallback.signature() {
			return Err(Error::IllegalArgument(format!(
				"guarded handles differ: {} and {}",
				valid.signature(),
				fallback.signature()
			)));
		}
		Ok(Handle::new(
			valid.signature().clone(),
			Form::Switch {
				token: self.clone(),
				valid: valid.clone(),
				fallback: fallback.clone(),
			},
		))
	}

	/// Invalidates every token in `tokens`.
	///
	/// When this returns, every thread observes the tokens as invalidated.
	pub fn invalidate_all(tokens: &[&InvalidationToken]) {
		if tokens.is_empty() {
			return;
		}
		for token in tokens {
			token.0.store(true, Ordering::Release);
		}
		let generation = GENERATION.fetch_add(1, Ordering::SeqCst) + 1;
		std::sync::atomic::fence(Ordering::SeqCst);
		debug!(tokens = tokens.len(), generation, "linkage.token.invalidate");
	}

	/// Number of [`InvalidationToken::invalidate_all`] calls that invalidated anything.
	pub fn generation() -> u64 {
		GENERATION.load(Ordering::SeqCst)
	}
}

impl fmt::Debug for InvalidationToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InvalidationToken")
			.field("invalidated", &self.has_been_invalidated())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::thread;

	use linkage_types::{Kind, Value};

	use super::*;
	use crate::basic::constant;

	fn constant_int(n: i32) -> Handle {
		constant(Kind::Int, Value::Int(n)).unwrap()
	}

	#[test]
	fn test_guard_switches_once_and_for_all() {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();
		let token = InvalidationToken::new();
		let guarded = token.guard_with_test(&constant_int(1), &constant_int(2)).unwrap();
		assert_eq!(guarded.call(&[]).unwrap(), Value::Int(1));

		let before = InvalidationToken::generation();
		InvalidationToken::invalidate_all(&[&token]);
		assert!(token.has_been_invalidated());
		assert!(InvalidationToken::generation() > before);
		assert_eq!(guarded.call(&[]).unwrap(), Value::Int(2));

		InvalidationToken::invalidate_all(&[&token]);
		assert_eq!(guarded.call(&[]).unwrap(), Value::Int(2));
	}

	#[test]
	fn test_invalidation_is_per_token() {
		let a = InvalidationToken::new();
		let b = InvalidationToken::new();
		InvalidationToken::invalidate_all(&[&a]);
		assert!(a.has_been_invalidated());
		assert!(!b.has_been_invalidated());
		assert!(!InvalidationToken::new().has_been_invalidated());
	}

	#[test]
	fn test_guard_requires_matching_signatures() {
		let token = InvalidationToken::new();
		let long = constant(Kind::Long, Value::Long(1)).unwrap();
		assert!(matches!(
			token.guard_with_test(&constant_int(1), &long),
			Err(Error::IllegalArgument(_))
		));
	}

	#[test]
	fn test_invalidation_seen_from_other_threads() {
		let token = InvalidationToken::new();
		let guarded = token.guard_with_test(&constant_int(1), &constant_int(2)).unwrap();
		let invalidator = {
			let token = token.clone();
			thread::spawn(move || InvalidationToken::invalidate_all(&[&token]))
		};
		invalidator.join().unwrap();
		let readers: Vec<_> = (0..4)
			.map(|_| {
				let guarded = guarded.clone();
				thread::spawn(move || guarded.call(&[]).unwrap())
			})
			.collect();
		for reader in readers {
			assert_eq!(reader.join().unwrap(), Value::Int(2));
		}
	}
}

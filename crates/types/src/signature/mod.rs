//! Interned calling-convention descriptors.
//!
//! # Invariants
//!
//! - Structurally equal signatures share one allocation, so equality is usually a pointer
//!   comparison. Structural comparison remains the fallback.
//! - No parameter is `void`, and the parameter slot total never exceeds
//!   [`RuntimeConfig::max_slots`](crate::RuntimeConfig::max_slots).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::builtins;
use crate::config;
use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::ty::Namespace;

type Params = SmallVec<[Kind; 4]>;

#[derive(PartialEq, Eq, Hash)]
struct SigData {
	ret: Kind,
	params: Params,
}

static INTERNER: LazyLock<Mutex<FxHashSet<Arc<SigData>>>> = LazyLock::new(|| Mutex::new(FxHashSet::default()));

/// Ordered parameter kinds plus one return kind.
#[derive(Clone)]
pub struct Signature(Arc<SigData>);

impl Signature {
	/// Builds and interns a signature.
	///
	/// # Errors
	///
	/// [`Error::IllegalArgument`] for a `void` parameter or too many slots.
	pub fn new(ret: Kind, params: impl IntoIterator<Item = Kind>) -> Result<Self> {
		let params: Params = params.into_iter().collect();
		if let Some(i) = params.iter().position(Kind::is_void) {
			return Err(Error::IllegalArgument(format!("parameter {i} is void")));
		}
		let slots: usize = params.iter().map(Kind::slot_count).sum();
		let max = config::current().max_slots;
		if slots > max {
			return Err(Error::IllegalArgument(format!("{slots} argument slots exceed the limit of {max}")));
		}
		Ok(Self::intern(SigData { ret, params }))
	}

	fn intern(data: SigData) -> Self {
		let mut interner = INTERNER.lock();
		if let Some(existing) = interner.get(&data) {
			return Self(existing.clone());
		}
		let data = Arc::new(data);
		interner.insert(data.clone());
		Self(data)
	}

	/// `arity` object parameters returning object.
	pub fn generic(arity: usize) -> Result<Self> {
		Self::new(Kind::object(), std::iter::repeat_n(Kind::object(), arity))
	}

	pub fn ret(&self) -> &Kind {
		&self.0.ret
	}

	pub fn params(&self) -> &[Kind] {
		&self.0.params
	}

	pub fn param(&self, index: usize) -> Option<&Kind> {
		self.0.params.get(index)
	}

	pub fn arity(&self) -> usize {
		self.0.params.len()
	}

	/// Argument slots, counting `long` and `double` twice.
	pub fn slot_count(&self) -> usize {
		self.0.params.iter().map(Kind::slot_count).sum()
	}

	pub fn change_return(&self, ret: Kind) -> Self {
		Self::intern(SigData {
			ret,
			params: self.0.params.clone(),
		})
	}

	pub fn change_param(&self, index: usize, kind: Kind) -> Result<Self> {
		self.check_index(index, self.arity().saturating_sub(1))?;
		let mut params = self.0.params.clone();
		params[index] = kind;
		Self::new(self.ret().clone(), params)
	}

	/// Inserts `kinds` before position `pos`.
	pub fn insert_params(&self, pos: usize, kinds: &[Kind]) -> Result<Self> {
		self.check_index(pos, self.arity())?;
		let mut params = self.0.params.clone();
		params.insert_many(pos, kinds.iter().cloned());
		Self::new(self.ret().clone(), params)
	}

	pub fn append_params(&self, kinds: &[Kind]) -> Result<Self> {
		self.insert_params(self.arity(), kinds)
	}

	/// Removes parameters `start..end`.
	pub fn drop_params(&self, start: usize, end: usize) -> Result<Self> {
		if start > end || end > self.arity() {
			return Err(Error::IllegalArgument(format!(
				"cannot drop {start}..{end} from {self}"
			)));
		}
		let params = self.0.params[..start].iter().chain(&self.0.params[end..]).cloned();
		Self::new(self.ret().clone(), params)
	}

	/// The first `keep` parameters with the same return kind.
	pub fn leading(&self, keep: usize) -> Result<Self> {
		self.drop_params(keep.min(self.arity()), self.arity())
	}

	/// Every reference kind becomes `Object`.
	pub fn erase(&self) -> Self {
		let erase = |k: &Kind| if k.is_ref() { Kind::object() } else { k.clone() };
		self.map(erase, erase)
	}

	/// Every kind becomes `Object`, except a void return.
	pub fn to_generic(&self) -> Self {
		let ret = if self.ret().is_void() { Kind::Void } else { Kind::object() };
		Self::intern(SigData {
			ret,
			params: std::iter::repeat_n(Kind::object(), self.arity()).collect(),
		})
	}

	/// Primitives become their wrappers; a void return becomes the void box.
	pub fn wrap(&self) -> Self {
		self.map(
			|k| match k {
				Kind::Void => Kind::Ref(builtins::void_box()),
				other => other.boxed(),
			},
			Kind::boxed,
		)
	}

	/// Wrappers become their primitives; the void box return becomes void.
	pub fn unwrap(&self) -> Self {
		let void_box = builtins::void_box();
		self.map(
			|k| match k {
				Kind::Ref(ty) if *ty == void_box => Kind::Void,
				other => other.unboxed(),
			},
			Kind::unboxed,
		)
	}

	pub fn has_primitives(&self) -> bool {
		self.ret().is_primitive() || self.params().iter().any(Kind::is_primitive)
	}

	fn map(&self, ret: impl Fn(&Kind) -> Kind, param: impl Fn(&Kind) -> Kind) -> Self {
		Self::intern(SigData {
			ret: ret(self.ret()),
			params: self.0.params.iter().map(param).collect(),
		})
	}

	fn check_index(&self, index: usize, max: usize) -> Result<()> {
		if index > max {
			return Err(Error::IllegalArgument(format!("index {index} out of range for {self}")));
		}
		Ok(())
	}

	/// Descriptor form, e.g. `(ILrt/String;)V`.
	pub fn to_descriptor(&self) -> String {
		let mut out = String::from("(");
		for param in self.params() {
			out.push_str(&param.descriptor());
		}
		out.push(')');
		out.push_str(&self.ret().descriptor());
		out
	}

	/// Parses a descriptor, resolving reference names in `namespace`.
	pub fn from_descriptor(descriptor: &str, namespace: &Namespace) -> Result<Self> {
		let malformed = || Error::IllegalArgument(format!("malformed descriptor {descriptor:?}"));
		let body = descriptor.strip_prefix('(').ok_or_else(malformed)?;
		let (params_src, ret_src) = body.split_once(')').ok_or_else(malformed)?;

		let mut params = Vec::new();
		let mut rest = params_src;
		while !rest.is_empty() {
			let (kind, tail) = parse_kind(rest, namespace, descriptor)?;
			params.push(kind);
			rest = tail;
		}
		let (ret, tail) = parse_kind(ret_src, namespace, descriptor)?;
		if !tail.is_empty() {
			return Err(malformed());
		}
		Self::new(ret, params)
	}
}

fn parse_kind<'a>(src: &'a str, namespace: &Namespace, whole: &str) -> Result<(Kind, &'a str)> {
	let malformed = || Error::IllegalArgument(format!("malformed descriptor {whole:?}"));
	let mut chars = src.chars();
	let head = chars.next().ok_or_else(malformed)?;
	let rest = chars.as_str();
	let kind = match head {
		'V' => Kind::Void,
		'Z' => Kind::Boolean,
		'B' => Kind::Byte,
		'S' => Kind::Short,
		'I' => Kind::Int,
		'J' => Kind::Long,
		'F' => Kind::Float,
		'D' => Kind::Double,
		'[' => {
			let (component, tail) = parse_kind(rest, namespace, whole)?;
			if component.is_void() {
				return Err(malformed());
			}
			return Ok((Kind::array_of(component), tail));
		}
		'L' => {
			let (name, tail) = rest.split_once(';').ok_or_else(malformed)?;
			let qualified = name.replace('/', ".");
			let ty = builtins::resolve_in(namespace, &qualified).ok_or_else(|| Error::not_found("type", qualified))?;
			return Ok((Kind::Ref(ty), tail));
		}
		_ => return Err(malformed()),
	};
	Ok((kind, rest))
}

impl PartialEq for Signature {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
	}
}

impl Eq for Signature {}

impl Hash for Signature {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.hash(state);
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("(")?;
		for (i, param) in self.params().iter().enumerate() {
			if i > 0 {
				f.write_str(",")?;
			}
			write!(f, "{param}")?;
		}
		write!(f, "){}", self.ret())
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

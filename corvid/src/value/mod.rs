//! The dynamic value container and its supporting machinery.

pub mod ty;

mod any;
mod ext;
mod holder;
mod obj;
mod pool;
mod token;

pub use any::Any;
pub use ext::Namespace;
pub use holder::ObjHolder;
pub use obj::{Authority, Status};
pub use pool::{Pool, BUFFER_SIZE};
pub use token::TypeToken;

pub(crate) use obj::{AnyObj, Obj};

use crate::Result;
use ty::{Integer, Text};

pub type Typename = &'static str;
pub trait NamedType {
	const TYPENAME: Typename;
}

/// The capability surface a concrete type must provide before it can live
/// inside an [`Any`].
///
/// Every operation the container performs uniformly on erased values bottoms
/// out in one of these methods. Only [`compare`](Self::compare),
/// [`to_text`](Self::to_text), and [`hash`](Self::hash) are mandatory; the
/// rest have defaults that decline.
///
/// For plain data types the [`AnyData` derive](cvm_macros) delegates to the
/// type's own `PartialEq`, `Debug`, and `Hash` impls.
pub trait AnyData: NamedType + Clone + 'static {
	/// Judges two payloads of this concrete type equal.
	///
	/// Containers holding different concrete types never compare equal, so
	/// implementations only ever see their own type.
	fn compare(&self, other: &Self) -> bool;

	/// The integral projection of this payload.
	///
	/// # Errors
	/// Returns [`ErrorKind::ConversionFailed`](crate::ErrorKind::ConversionFailed)
	/// for types without an integral projection, which is the default.
	fn to_integer(&self) -> Result<Integer> {
		Err(crate::ErrorKind::ConversionFailed { from: Self::TYPENAME, into: Integer::TYPENAME }
			.into())
	}

	/// The textual projection of this payload.
	fn to_text(&self) -> Text;

	/// Hashes the payload.
	///
	/// Must agree with [`compare`](Self::compare): payloads that compare equal
	/// must hash equal. [`hash_of`] covers types that already implement
	/// [`std::hash::Hash`].
	fn hash(&self) -> u64;

	/// Severs sharing inside a composite payload.
	///
	/// Scalar types have nothing to sever; the default does nothing.
	fn detach(&mut self) {}

	/// The extension namespace shared by all values of this type, or `None`
	/// for types that decline extensions.
	fn ext() -> Option<Namespace> {
		None
	}
}

/// Hashes `value` with the standard library's default hasher.
#[must_use]
pub fn hash_of<T: std::hash::Hash + ?Sized>(value: &T) -> u64 {
	use std::hash::Hasher;

	let mut hasher = std::collections::hash_map::DefaultHasher::new();
	value.hash(&mut hasher);
	hasher.finish()
}

/// The hash an empty container reports, ie the hash of the null pointer.
#[must_use]
pub(crate) fn null_hash() -> u64 {
	hash_of(&std::ptr::null::<()>())
}

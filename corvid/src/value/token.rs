//! Stable identification of payload types.

use crate::value::ty::Text;
use crate::value::{hash_of, AnyData, NamedType, Typename};
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A stable, orderable token identifying a registered payload type.
///
/// Tokens are handed out in registration order and never reused: within one
/// process two tokens are equal iff they identify the same concrete type, and
/// their ordering never changes. Index 0 is reserved for the void type an
/// empty container reports.
///
/// `TypeToken` is itself a payload type, so type information can be stored in
/// an [`Any`](crate::Any) and compared, ordered, and hashed like any other
/// value.
///
/// # Examples
/// ```
/// # use corvid::{value::ty::Integer, TypeToken};
/// let token = TypeToken::of::<Integer>();
///
/// assert_eq!(token, TypeToken::of::<Integer>());
/// assert_eq!(token.name(), "Integer");
/// assert_ne!(token, TypeToken::VOID);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeToken(u32);

struct Registry {
	tokens: HashMap<TypeId, TypeToken>,
	names: Vec<Typename>,
}

// Tokens are process-wide even though pools are per-thread: an index printed
// on one thread must name the same type on every other.
static REGISTRY: Lazy<Mutex<Registry>> =
	Lazy::new(|| Mutex::new(Registry { tokens: HashMap::new(), names: vec!["Void"] }));

fn registry() -> MutexGuard<'static, Registry> {
	REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TypeToken {
	/// The token of the void type, ie what an empty container reports.
	pub const VOID: Self = Self(0);

	/// The token for the payload type `T`, registering `T` on first use.
	#[must_use]
	pub fn of<T: AnyData>() -> Self {
		let mut registry = registry();

		if let Some(&token) = registry.tokens.get(&TypeId::of::<T>()) {
			return token;
		}

		let token = Self(registry.names.len() as u32);
		registry.names.push(T::TYPENAME);
		registry.tokens.insert(TypeId::of::<T>(), token);

		debug!(target: "token", index = token.0, name = T::TYPENAME, "registered payload type");

		token
	}

	/// The registered name of the type this token identifies.
	#[must_use]
	pub fn name(self) -> Typename {
		registry().names[self.0 as usize]
	}

	/// The registration index backing this token.
	#[must_use]
	pub const fn index(self) -> u32 {
		self.0
	}
}

impl NamedType for TypeToken {
	const TYPENAME: Typename = "Type";
}

impl AnyData for TypeToken {
	fn compare(&self, other: &Self) -> bool {
		self == other
	}

	fn to_text(&self) -> Text {
		Text::from(self.name())
	}

	fn hash(&self) -> u64 {
		hash_of(self)
	}
}

impl From<TypeToken> for crate::Any {
	fn from(token: TypeToken) -> Self {
		Self::make(token)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::ty::{Boolean, Integer};

	#[test]
	fn void_owns_index_zero() {
		assert_eq!(TypeToken::VOID.index(), 0);
		assert_eq!(TypeToken::VOID.name(), "Void");
	}

	#[test]
	fn registration_is_stable() {
		let first = TypeToken::of::<Integer>();
		let second = TypeToken::of::<Integer>();

		assert_eq!(first, second);
		assert_eq!(first.name(), "Integer");
		assert_ne!(first, TypeToken::VOID);
	}

	#[test]
	fn distinct_types_order_consistently() {
		let a = TypeToken::of::<Integer>();
		let b = TypeToken::of::<Boolean>();

		assert_ne!(a, b);
		assert_eq!(a < b, b > a);
		assert_eq!(a < b, TypeToken::of::<Integer>() < TypeToken::of::<Boolean>());
	}

	#[test]
	fn tokens_are_value_like_payloads() {
		let a = crate::Any::from(TypeToken::of::<Integer>());
		let b = crate::Any::from(TypeToken::of::<Integer>());

		assert_eq!(a, b);
		assert_eq!(a.to_text(), "Integer");
		assert_eq!(a.type_name(), "Type");
	}
}

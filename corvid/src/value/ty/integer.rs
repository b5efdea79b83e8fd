//! The signed integer payload.

use crate::value::ty::Text;
use crate::value::{hash_of, AnyData, NamedType, Namespace, Typename};
use crate::{Any, Result};

/// The integer payload type, a 64-bit signed machine word.
pub type Integer = i64;

impl NamedType for Integer {
	const TYPENAME: Typename = "Integer";
}

impl AnyData for Integer {
	fn compare(&self, other: &Self) -> bool {
		self == other
	}

	fn to_integer(&self) -> Result<Integer> {
		Ok(*self)
	}

	fn to_text(&self) -> Text {
		self.to_string()
	}

	fn hash(&self) -> u64 {
		hash_of(self)
	}

	fn ext() -> Option<Namespace> {
		thread_local! {
			static EXT: Namespace = {
				let space = Namespace::new();
				space.set("min", Any::make_constant(Integer::MIN));
				space.set("max", Any::make_constant(Integer::MAX));
				space
			};
		}

		Some(EXT.with(Clone::clone))
	}
}

impl From<Integer> for Any {
	fn from(value: Integer) -> Self {
		Self::make(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_in_decimal() {
		assert_eq!(Any::from(12_i64).to_text(), "12");
		assert_eq!(Any::from(-3_i64).to_text(), "-3");
	}

	#[test]
	fn converts_to_itself() {
		assert_eq!(Any::from(12_i64).to_integer().unwrap(), 12);
	}

	#[test]
	fn publishes_its_bounds() {
		let ext = Any::from(1_i64).get_ext().unwrap();

		assert_eq!(ext.get("min").unwrap().const_val::<Integer>().unwrap(), &Integer::MIN);
		assert_eq!(ext.get("max").unwrap().const_val::<Integer>().unwrap(), &Integer::MAX);
		assert!(ext.get("max").unwrap().is_constant());
	}

	#[test]
	fn the_extension_namespace_is_shared() {
		let first = Any::from(1_i64).get_ext().unwrap();
		let second = Any::from(2_i64).get_ext().unwrap();

		assert!(first.ptr_eq(&second));

		first.set("answer", Any::make(42_i64));
		assert!(second.contains("answer"));
	}
}

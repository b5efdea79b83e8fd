//! The two-valued truth payload.

use crate::value::ty::{Integer, Text};
use crate::value::{hash_of, AnyData, NamedType, Typename};
use crate::{Any, Result};

/// The boolean payload type.
pub type Boolean = bool;

impl NamedType for Boolean {
	const TYPENAME: Typename = "Boolean";
}

impl AnyData for Boolean {
	fn compare(&self, other: &Self) -> bool {
		self == other
	}

	fn to_integer(&self) -> Result<Integer> {
		Ok(Integer::from(*self))
	}

	fn to_text(&self) -> Text {
		Text::from(if *self { "true" } else { "false" })
	}

	fn hash(&self) -> u64 {
		hash_of(self)
	}
}

impl From<Boolean> for Any {
	fn from(value: Boolean) -> Self {
		Self::make(value)
	}
}

//! The single character payload.

use crate::value::ty::{Integer, Text};
use crate::value::{hash_of, AnyData, NamedType, Typename};
use crate::{Any, Result};

/// The character payload type, one Unicode scalar value.
pub type Character = char;

impl NamedType for Character {
	const TYPENAME: Typename = "Character";
}

impl AnyData for Character {
	fn compare(&self, other: &Self) -> bool {
		self == other
	}

	fn to_integer(&self) -> Result<Integer> {
		Ok(Integer::from(u32::from(*self)))
	}

	fn to_text(&self) -> Text {
		Text::from(*self)
	}

	fn hash(&self) -> u64 {
		hash_of(self)
	}
}

impl From<Character> for Any {
	fn from(value: Character) -> Self {
		Self::make(value)
	}
}

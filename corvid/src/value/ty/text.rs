//! The string payload.

use crate::value::{hash_of, AnyData, NamedType, Typename};
use crate::Any;

/// The text payload type, an owned UTF-8 string.
pub type Text = String;

impl NamedType for Text {
	const TYPENAME: Typename = "Text";
}

impl AnyData for Text {
	fn compare(&self, other: &Self) -> bool {
		self == other
	}

	fn to_text(&self) -> Text {
		self.clone()
	}

	fn hash(&self) -> u64 {
		hash_of(self)
	}
}

impl From<Text> for Any {
	fn from(value: Text) -> Self {
		Self::make(value)
	}
}

/// Borrowed literals collapse into owned [`Text`]; the runtime carries no
/// separate character-array payload.
impl From<&str> for Any {
	fn from(value: &str) -> Self {
		Self::make(Text::from(value))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn literals_collapse_into_text() {
		let literal = Any::from("carrion");
		let owned = Any::from(Text::from("carrion"));

		assert_eq!(literal.type_name(), "Text");
		assert_eq!(literal, owned);
		assert_eq!(literal.hash_value(), owned.hash_value());
	}

	#[test]
	fn renders_without_quoting() {
		assert_eq!(Any::from("caw").to_text(), "caw");
		assert_eq!(format!("{}", Any::from("caw")), "caw");
	}

	#[test]
	fn declines_integer_conversion() {
		assert_matches!(
			Any::from("12").to_integer().unwrap_err().kind(),
			crate::ErrorKind::ConversionFailed { from: "Text", into: "Integer" }
		);
	}
}

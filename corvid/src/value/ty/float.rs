//! The double-precision float payload.

use crate::value::ty::{Integer, Text};
use crate::value::{hash_of, AnyData, NamedType, Namespace, Typename};
use crate::{Any, ErrorKind, Result};
use num_traits::ToPrimitive;

/// The floating-point payload type.
pub type Float = f64;

impl NamedType for Float {
	const TYPENAME: Typename = "Float";
}

impl AnyData for Float {
	fn compare(&self, other: &Self) -> bool {
		self == other
	}

	fn to_integer(&self) -> Result<Integer> {
		self.to_i64().ok_or_else(|| {
			ErrorKind::ConversionFailed { from: Self::TYPENAME, into: Integer::TYPENAME }.into()
		})
	}

	fn to_text(&self) -> Text {
		self.to_string()
	}

	fn hash(&self) -> u64 {
		// Both zeroes collapse onto one bit pattern, so floats that compare
		// equal hash alike.
		let normalized = if *self == 0.0 { 0.0 } else { *self };

		hash_of(&normalized.to_bits())
	}

	fn ext() -> Option<Namespace> {
		thread_local! {
			static EXT: Namespace = {
				let space = Namespace::new();
				space.set("epsilon", Any::make_constant(Float::EPSILON));
				space.set("max", Any::make_constant(Float::MAX));
				space
			};
		}

		Some(EXT.with(Clone::clone))
	}
}

impl From<Float> for Any {
	fn from(value: Float) -> Self {
		Self::make(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truncates_into_integers() {
		assert_eq!(Any::from(12.75).to_integer().unwrap(), 12);
		assert_eq!(Any::from(-0.5).to_integer().unwrap(), 0);
	}

	#[test]
	fn refuses_unrepresentable_conversions() {
		assert_matches!(
			Any::from(Float::NAN).to_integer().unwrap_err().kind(),
			crate::ErrorKind::ConversionFailed { from: "Float", into: "Integer" }
		);
		assert_matches!(
			Any::from(Float::INFINITY).to_integer().unwrap_err().kind(),
			crate::ErrorKind::ConversionFailed { from: "Float", into: "Integer" }
		);
	}

	#[test]
	fn signed_zeroes_hash_alike() {
		assert_eq!(Any::from(0.0), Any::from(-0.0));
		assert_eq!(hash_of(&Any::from(0.0)), hash_of(&Any::from(-0.0)));
	}

	#[test]
	fn publishes_its_bounds() {
		let ext = Any::from(1.0).get_ext().unwrap();

		assert_eq!(ext.get("max").unwrap().const_val::<Float>().unwrap(), &Float::MAX);
		assert!(ext.contains("epsilon"));
	}
}

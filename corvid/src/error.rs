use crate::value::Typename;
use std::fmt::{self, Display, Formatter};

/// An error raised by a container operation.
///
/// Containers provide the strong guarantee: when an operation returns an
/// `Error`, the container is left exactly as it was before the call.
#[derive(Debug)]
#[must_use]
pub struct Error {
	kind: ErrorKind,
}

/// Type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Possible errors that can be raised by container operations.
#[derive(Debug)]
#[must_use]
#[non_exhaustive]
pub enum ErrorKind {
	/// An `expected` type was required but a `given` was stored.
	TypeMismatch {
		expected: Typename,
		given: Typename,
	},

	/// Typed access was attempted on an empty container.
	NullAccess,

	/// Mutable access was attempted on a constant value.
	ConstantWrite(Typename),

	/// An in-place assignment touched a value whose authority is elevated.
	AuthorityLocked,

	/// [`protect`](crate::Any::protect) was called on an already-elevated value.
	AuthorityDowngrade,

	/// [`share_object`](crate::Any::share_object) was called on an empty container.
	NullShare,

	/// The type stored in the container provides no extension namespace.
	ExtensionUnsupported(Typename),

	/// An in-place swap touched a value whose authority is elevated.
	SwapLocked,

	/// The projection of a `from` value into an `into` value failed.
	ConversionFailed {
		from: Typename,
		into: Typename,
	},

	/// Catch-all for failures without a dedicated kind yet.
	Message(String),
}

impl Error {
	/// The kind of error this is.
	pub const fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// Consumes `self`, yielding the [`ErrorKind`].
	pub fn into_kind(self) -> ErrorKind {
		self.kind
	}
}

impl ErrorKind {
	/// The diagnostic code the corvid interpreter historically printed for
	/// this error, if it had one.
	#[must_use]
	pub const fn code(&self) -> Option<&'static str> {
		match self {
			Self::NullAccess => Some("E0005"),
			Self::TypeMismatch { .. } => Some("E0006"),
			Self::AuthorityLocked => Some("E000J"),
			Self::ConstantWrite(_) => Some("E000K"),
			_ => None,
		}
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		if f.alternate() {
			if let Some(code) = self.kind.code() {
				return write!(f, "error[{code}]: {}", self.kind);
			}
		}

		Display::fmt(&self.kind, f)
	}
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		match self {
			Self::TypeMismatch { expected, given } => {
				write!(f, "invalid type {given:?}, expected {expected:?}")
			}
			Self::NullAccess => write!(f, "accessed the value of an empty container"),
			Self::ConstantWrite(typename) => {
				write!(f, "cannot modify a constant value of type {typename:?}")
			}
			Self::AuthorityLocked => write!(f, "cannot reassign a protected value in place"),
			Self::AuthorityDowngrade => write!(f, "cannot lower the protection of a value"),
			Self::NullShare => write!(f, "cannot export an object from an empty container"),
			Self::ExtensionUnsupported(typename) => {
				write!(f, "type {typename:?} provides no extension namespace")
			}
			Self::SwapLocked => write!(f, "cannot swap protected values in place"),
			Self::ConversionFailed { from, into } => {
				write!(f, "conversion from {from:?} to {into:?} failed")
			}
			Self::Message(msg) => f.write_str(msg),
		}
	}
}

impl From<String> for ErrorKind {
	fn from(msg: String) -> Self {
		Self::Message(msg)
	}
}

impl From<String> for Error {
	fn from(msg: String) -> Self {
		ErrorKind::from(msg).into()
	}
}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Self {
		Self { kind }
	}
}

impl std::error::Error for Error {
	fn cause(&self) -> Option<&(dyn std::error::Error)> {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn diagnostic_codes_match_the_historic_table() {
		assert_eq!(ErrorKind::NullAccess.code(), Some("E0005"));
		assert_eq!(
			ErrorKind::TypeMismatch { expected: "Integer", given: "Text" }.code(),
			Some("E0006")
		);
		assert_eq!(ErrorKind::AuthorityLocked.code(), Some("E000J"));
		assert_eq!(ErrorKind::ConstantWrite("Integer").code(), Some("E000K"));

		assert_eq!(ErrorKind::AuthorityDowngrade.code(), None);
		assert_eq!(ErrorKind::NullShare.code(), None);
		assert_eq!(ErrorKind::SwapLocked.code(), None);
	}

	#[test]
	fn display_includes_code_in_alternate_form() {
		let err = Error::from(ErrorKind::NullAccess);
		assert_eq!(format!("{err:#}"), "error[E0005]: accessed the value of an empty container");
		assert_eq!(format!("{err}"), "accessed the value of an empty container");
	}

	#[test]
	fn message_errors_convert_from_strings() {
		let err = Error::from(String::from("oops"));
		assert_matches!(err.kind(), ErrorKind::Message(msg) if msg == "oops");
		assert_matches!(err.into_kind(), ErrorKind::Message(msg) if msg == "oops");
	}
}

//! External custody of exported payload instances.

use crate::value::obj::{AnyObj, Status};
use crate::value::ty::Text;
use crate::value::{AnyData, Obj, Typename};
use std::fmt::{self, Debug, Formatter};
use std::ptr::NonNull;

/// A claim on one payload instance, living outside any container.
///
/// Holders come from [`Any::share_object`](crate::Any::share_object). The
/// instance they point at is kept alive by the deposit protocol: the
/// exporting container's release parks it instead of destroying it, and
/// from then on the holder is its sole owner. A holder never destroys its
/// instance on its own; custody ends only through [`replace`](Self::replace)
/// (or by re-entering a container via
/// [`Any::from_deposit`](crate::Any::from_deposit)), so an instance parked
/// in a forgotten holder stays allocated for the life of the thread.
pub struct ObjHolder {
	instance: NonNull<dyn AnyObj>,
}

impl ObjHolder {
	pub(crate) fn new(instance: NonNull<dyn AnyObj>) -> Self {
		Self { instance }
	}

	pub(crate) fn instance(&self) -> NonNull<dyn AnyObj> {
		self.instance
	}

	/// The current liveness marker of the held instance.
	///
	/// [`Status::Deposit`] means a container still shares custody;
	/// [`Status::Normal`] means the holder owns the instance outright.
	#[must_use]
	pub fn status(&self) -> Status {
		unsafe { self.instance.as_ref() }.header().status()
	}

	/// The held payload's type name.
	#[must_use]
	pub fn type_name(&self) -> Typename {
		unsafe { self.instance.as_ref() }.type_name()
	}

	/// Renders the held payload as text.
	#[must_use]
	pub fn to_text(&self) -> Text {
		unsafe { self.instance.as_ref() }.to_text()
	}

	/// Ends custody of the current instance and adopts a fresh one built
	/// from `value`.
	///
	/// A still-deposited instance is handed back to its containers; one the
	/// holder owned outright is destroyed.
	///
	/// # Safety
	/// The current instance must still be live, and nothing else may refer
	/// to it afterwards unless it was still deposited.
	pub unsafe fn replace<T: AnyData>(&mut self, value: T) {
		let old = std::mem::replace(&mut self.instance, Obj::alloc(value));
		let header = old.as_ref().header();

		if header.status() == Status::Deposit {
			// A container still shares custody; hand the instance back.
			header.set_status(Status::Normal);
			return;
		}

		debug!(target: "holder", ty = old.as_ref().type_name(), "destroying a released instance");
		(*old.as_ptr()).kill();
	}
}

impl Debug for ObjHolder {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "ObjHolder({:p}: {})", self.instance.as_ptr().cast::<()>(), self.type_name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Any;

	#[test]
	fn holders_observe_the_instance() {
		let exported = Any::make(12_i64);
		let mut holder = exported.share_object().unwrap();

		assert_eq!(holder.status(), Status::Deposit);
		assert_eq!(holder.type_name(), "Integer");
		assert_eq!(holder.to_text(), "12");

		unsafe { holder.replace(0_i64) };
	}

	#[test]
	fn replace_hands_deposited_instances_back() {
		let exported = Any::make(12_i64);
		let mut holder = exported.share_object().unwrap();

		unsafe { holder.replace(1_i64) };

		// The old instance went back to its container untouched.
		assert_eq!(exported.const_val::<i64>().unwrap(), &12);
		assert!(!exported.is_rvalue());
		assert_eq!(holder.status(), Status::Normal);
		assert_eq!(holder.to_text(), "1");
	}

	#[test]
	fn debug_names_the_held_type() {
		let exported = Any::make(12_i64);
		let mut holder = exported.share_object().unwrap();

		assert!(format!("{holder:?}").contains("Integer"));

		unsafe { holder.replace(0_i64) };
	}
}

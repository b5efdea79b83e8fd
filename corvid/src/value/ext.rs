//! Named extension members attached to payload types.

use crate::Any;
use hashbrown::HashMap;
use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// A shared bag of named values.
///
/// Cloning a `Namespace` shares its storage, so members added through one
/// handle are visible through every other. Payload types expose one via
/// [`AnyData::ext`](crate::AnyData::ext) to publish their companion
/// constants and routines.
#[derive(Clone, Default)]
pub struct Namespace {
	members: Rc<RefCell<HashMap<String, Any>>>,
}

impl Namespace {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Looks up `name`, handing back a new reference to the stored value.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<Any> {
		self.members.borrow().get(name).cloned()
	}

	pub fn set(&self, name: impl Into<String>, value: Any) {
		self.members.borrow_mut().insert(name.into(), value);
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.members.borrow().contains_key(name)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.members.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.members.borrow().is_empty()
	}

	/// Whether two handles share the same storage.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.members, &other.members)
	}
}

impl Debug for Namespace {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("Namespace")?;
		f.debug_set().entries(self.members.borrow().keys()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn members_are_shared_across_clones() {
		let space = Namespace::new();
		let alias = space.clone();

		space.set("lo", Any::make(1_i64));
		alias.set("hi", Any::make(2_i64));

		assert!(space.ptr_eq(&alias));
		assert_eq!(space.len(), 2);
		assert!(alias.contains("lo"));
		assert_eq!(space.get("hi").unwrap().const_val::<i64>().unwrap(), &2);
	}

	#[test]
	fn lookups_share_the_stored_value() {
		let space = Namespace::new();
		space.set("pivot", Any::make(12_i64));

		let first = space.get("pivot").unwrap();
		let second = space.get("pivot").unwrap();

		assert!(first.ptr_eq(&second).unwrap());
	}

	#[test]
	fn missing_members_are_none() {
		let space = Namespace::new();

		assert!(space.get("nothing").is_none());
		assert!(space.is_empty());
	}
}

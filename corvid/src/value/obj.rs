//! Typed instances and the erased capability surface over them.

use crate::value::ty::{Integer, Text};
use crate::value::{AnyData, Namespace, Pool, TypeToken, Typename};
use crate::Result;
use std::cell::Cell;
use std::ptr::NonNull;

/// The write-protection level of a value.
///
/// Authority only ever rises: `Normal < Protect < Constant`, and `Constant`
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Authority {
	/// Freely writable.
	Normal,
	/// Shielded from in-place reassignment and swapping.
	Protect,
	/// Shielded from every mutation.
	Constant,
}

/// The liveness/intent marker of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
	/// Owned and live.
	Normal,
	/// Declared an rvalue temporary; the next consumer may steal the payload
	/// instead of copying it.
	Recycle,
	/// Referenced by an [`ObjHolder`](crate::ObjHolder); release parks the
	/// instance instead of destroying it.
	Deposit,
	/// Reserved for external liveness tracing. The container neither sets nor
	/// clears this.
	Reachable,
}

/// The status and authority cells sitting in front of every payload.
pub(crate) struct ObjHeader {
	status: Cell<Status>,
	authority: Cell<Authority>,
}

impl ObjHeader {
	fn new() -> Self {
		Self { status: Cell::new(Status::Normal), authority: Cell::new(Authority::Normal) }
	}

	pub(crate) fn status(&self) -> Status {
		self.status.get()
	}

	pub(crate) fn set_status(&self, status: Status) {
		self.status.set(status);
	}

	pub(crate) fn authority(&self) -> Authority {
		self.authority.get()
	}

	pub(crate) fn set_authority(&self, authority: Authority) {
		self.authority.set(authority);
	}
}

/// A typed instance: one payload of concrete type `T` behind its header.
pub(crate) struct Obj<T: AnyData> {
	header: ObjHeader,
	data: T,
}

impl<T: AnyData> Obj<T> {
	pub(crate) fn new(data: T) -> Self {
		Self { header: ObjHeader::new(), data }
	}

	/// Moves `value` into a fresh instance allocated from this thread's pool
	/// for `T`, already erased.
	pub(crate) fn alloc(value: T) -> NonNull<dyn AnyObj> {
		Pool::with(|pool| pool.alloc(Self::new(value)))
	}
}

/// The object-safe erasure of [`Obj`]: what proxies actually point at.
///
/// Implemented once, blanket, for every `Obj<T: AnyData>`; the methods vector
/// each capability down to the payload's [`AnyData`] impl.
pub(crate) trait AnyObj {
	fn header(&self) -> &ObjHeader;

	fn token(&self) -> TypeToken;

	fn type_name(&self) -> Typename;

	fn as_any(&self) -> &dyn std::any::Any;

	fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

	/// A brand-new instance carrying a copy of the payload, allocated from
	/// the payload type's pool with default status and authority.
	fn duplicate(&self) -> NonNull<dyn AnyObj>;

	/// Payload equality; `false` whenever `other` holds a different type.
	fn compare(&self, other: &dyn AnyObj) -> bool;

	fn to_integer(&self) -> Result<Integer>;

	fn to_text(&self) -> Text;

	fn hash(&self) -> u64;

	fn detach(&mut self);

	fn ext(&self) -> Option<Namespace>;

	/// Destroys this instance, returning its block to the payload type's
	/// pool.
	///
	/// # Safety
	/// The instance must have been allocated from this thread's pool for its
	/// payload type, and nothing may touch it afterwards.
	unsafe fn kill(&mut self);
}

sa::assert_obj_safe!(AnyObj);

impl<T: AnyData> AnyObj for Obj<T> {
	fn header(&self) -> &ObjHeader {
		&self.header
	}

	fn token(&self) -> TypeToken {
		TypeToken::of::<T>()
	}

	fn type_name(&self) -> Typename {
		T::TYPENAME
	}

	fn as_any(&self) -> &dyn std::any::Any {
		&self.data
	}

	fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
		&mut self.data
	}

	fn duplicate(&self) -> NonNull<dyn AnyObj> {
		Obj::alloc(self.data.clone())
	}

	fn compare(&self, other: &dyn AnyObj) -> bool {
		other.as_any().downcast_ref::<T>().map_or(false, |data| self.data.compare(data))
	}

	fn to_integer(&self) -> Result<Integer> {
		self.data.to_integer()
	}

	fn to_text(&self) -> Text {
		self.data.to_text()
	}

	fn hash(&self) -> u64 {
		self.data.hash()
	}

	fn detach(&mut self) {
		self.data.detach();
	}

	fn ext(&self) -> Option<Namespace> {
		T::ext()
	}

	unsafe fn kill(&mut self) {
		let block = NonNull::from(self);

		// A missing registry means the thread is tearing down; destroy the
		// block directly instead.
		if Pool::try_with(|pool| pool.free(block)).is_none() {
			Pool::release_direct(block);
		}
	}
}

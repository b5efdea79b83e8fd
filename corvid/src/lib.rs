#![allow(
	// TODOS:
	clippy::missing_safety_doc,
	clippy::missing_errors_doc,
	clippy::missing_panics_doc,

	// Things that could be issues but aren't
	clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss,

	// Simply my coding style
	clippy::module_name_repetitions,
)]

extern crate static_assertions as sa;

#[macro_use]
extern crate tracing;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

extern crate cvm_macros;

mod error;

pub mod value;

pub use error::{Error, ErrorKind, Result};
pub use value::{Any, AnyData, NamedType, ObjHolder, TypeToken};

// Allocated blocks are released via `std::alloc::dealloc` with the same
// layout. Aborts via `handle_alloc_error` on exhaustion.
#[allow(clippy::unusual_byte_groupings)]
unsafe fn alloc<T>(layout: std::alloc::Layout) -> std::ptr::NonNull<T> {
	debug_assert!(std::alloc::Layout::new::<T>().align() <= layout.align());
	debug_assert!(std::alloc::Layout::new::<T>().size() <= layout.size());

	let ptr = std::alloc::alloc(layout).cast::<T>();

	if ptr.is_null() || (ptr as u64 <= 0b111_111) {
		std::alloc::handle_alloc_error(layout);
	}

	std::ptr::NonNull::new_unchecked(ptr)
}

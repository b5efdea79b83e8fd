//! Per-type pooled allocation.

use std::alloc::Layout;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

/// Number of freed blocks each pool caches for reuse.
pub const BUFFER_SIZE: usize = 64;

/// A slab allocator handing out stable heap blocks for values of type `E`.
///
/// Values created and destroyed at interpreter speed would otherwise hammer
/// the global allocator; a pool keeps up to [`BUFFER_SIZE`] freed blocks
/// around so the common churn is two `Vec` operations. Pools are confined to
/// the thread that created them: every type gets one pool per thread, reached
/// through [`with`](Self::with).
///
/// The `pool-bypass` cargo feature turns the cache off so that tools looking
/// for stale-block reuse (which the cache would otherwise mask) see every
/// free immediately.
///
/// # Examples
/// ```
/// # use corvid::value::Pool;
/// let block = Pool::with(|pool: &Pool<i64>| pool.alloc(12));
///
/// assert_eq!(unsafe { *block.as_ref() }, 12);
///
/// Pool::with(|pool: &Pool<i64>| unsafe { pool.free(block) });
/// ```
pub struct Pool<E> {
	free: RefCell<Vec<NonNull<E>>>,
}

sa::assert_not_impl_any!(Pool<u8>: Send, Sync);

thread_local! {
	static POOLS: RefCell<hashbrown::HashMap<TypeId, Rc<dyn Any>>> =
		RefCell::new(hashbrown::HashMap::new());
}

impl<E: 'static> Pool<E> {
	/// Runs `f` with the calling thread's pool for `E`, creating the pool on
	/// first use.
	///
	/// # Panics
	/// Panics if the thread's pool registry has already been torn down; see
	/// [`try_with`](Self::try_with).
	pub fn with<R>(f: impl FnOnce(&Self) -> R) -> R {
		match Self::try_with(f) {
			Some(result) => result,
			None => panic!("pool registry used during thread teardown"),
		}
	}

	/// Like [`with`](Self::with), but returns `None` once the thread's pool
	/// registry has been torn down.
	///
	/// Destructors running at thread exit release blocks through this,
	/// falling back to [`release_direct`](Self::release_direct) when the
	/// registry is gone.
	pub fn try_with<R>(f: impl FnOnce(&Self) -> R) -> Option<R> {
		let pool = POOLS
			.try_with(|pools| {
				pools
					.borrow_mut()
					.entry(TypeId::of::<E>())
					.or_insert_with(|| Rc::new(Self::new()) as Rc<dyn Any>)
					.clone()
			})
			.ok()?;

		let pool = pool
			.downcast::<Self>()
			.unwrap_or_else(|_| unreachable!("pool registry entry holds a foreign pool type"));

		Some(f(&pool))
	}
}

impl<E> Pool<E> {
	fn new() -> Self {
		Self { free: RefCell::new(Vec::new()) }
	}

	/// Moves `value` into a pooled block, reusing a cached block when one is
	/// available.
	pub fn alloc(&self, value: E) -> NonNull<E> {
		let recycled =
			if cfg!(feature = "pool-bypass") { None } else { self.free.borrow_mut().pop() };

		let block = recycled.unwrap_or_else(|| {
			trace!(target: "pool", ty = std::any::type_name::<E>(), "allocating a fresh block");
			unsafe { crate::alloc(Layout::new::<E>()) }
		});

		unsafe { block.as_ptr().write(value) };

		block
	}

	/// Destroys the value in `block`, then caches the block for reuse or
	/// returns it to the global allocator when the cache is full.
	///
	/// # Safety
	/// `block` must have come from [`alloc`](Self::alloc) on this thread's
	/// pool for `E`, must not have been freed since, and no reference into it
	/// may outlive this call.
	pub unsafe fn free(&self, block: NonNull<E>) {
		// Destroy before touching the free-list: destructors of composite
		// values may reenter this very pool.
		block.as_ptr().drop_in_place();

		let mut free = self.free.borrow_mut();

		if free.len() < BUFFER_SIZE && !cfg!(feature = "pool-bypass") {
			free.push(block);
		} else {
			trace!(target: "pool", ty = std::any::type_name::<E>(), "returning a block");
			std::alloc::dealloc(block.as_ptr().cast(), Layout::new::<E>());
		}
	}

	/// Destroys `block` without consulting the registry, for release paths
	/// that run after the registry itself is gone.
	///
	/// # Safety
	/// Same contract as [`free`](Self::free).
	pub(crate) unsafe fn release_direct(block: NonNull<E>) {
		block.as_ptr().drop_in_place();
		std::alloc::dealloc(block.as_ptr().cast(), Layout::new::<E>());
	}
}

impl<E> Drop for Pool<E> {
	fn drop(&mut self) {
		// Cached blocks hold no live values; plain deallocation suffices.
		for block in self.free.get_mut().drain(..) {
			unsafe { std::alloc::dealloc(block.as_ptr().cast(), Layout::new::<E>()) };
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;

	#[test]
	#[cfg_attr(feature = "pool-bypass", ignore)]
	fn freed_blocks_are_reused() {
		Pool::with(|pool: &Pool<u64>| {
			let first = pool.alloc(1);
			unsafe { pool.free(first) };

			let second = pool.alloc(2);
			assert_eq!(first, second);

			unsafe { pool.free(second) };
		});
	}

	#[test]
	fn the_same_pool_serves_the_whole_thread() {
		let block = Pool::with(|pool: &Pool<u64>| {
			let block = pool.alloc(3);
			unsafe { pool.free(block) };
			block
		});

		if cfg!(feature = "pool-bypass") {
			return;
		}

		let again = Pool::with(|pool: &Pool<u64>| {
			let again = pool.alloc(4);
			unsafe { pool.free(again) };
			again
		});

		assert_eq!(block, again);
	}

	#[test]
	#[cfg_attr(feature = "pool-bypass", ignore)]
	fn the_cache_never_exceeds_its_buffer() {
		Pool::with(|pool: &Pool<u32>| {
			let blocks: Vec<_> = (0..BUFFER_SIZE as u32 + 16).map(|n| pool.alloc(n)).collect();

			for block in blocks {
				unsafe { pool.free(block) };
			}

			assert_eq!(pool.free.borrow().len(), BUFFER_SIZE);
		});
	}

	#[test]
	fn freeing_runs_destructors() {
		struct Tally<'a>(&'a Cell<usize>);

		impl Drop for Tally<'_> {
			fn drop(&mut self) {
				self.0.set(self.0.get() + 1);
			}
		}

		let drops = Cell::new(0);

		// A stack-local pool: `Tally` borrows, so it can't go in the registry.
		let pool = Pool::new();
		let block = pool.alloc(Tally(&drops));

		assert_eq!(drops.get(), 0);
		unsafe { pool.free(block) };
		assert_eq!(drops.get(), 1);
	}

	#[test]
	fn distinct_element_types_get_distinct_pools() {
		let a = Pool::with(|pool: &Pool<u64>| pool.alloc(5));
		let b = Pool::with(|pool: &Pool<i32>| pool.alloc(5));

		assert_ne!(a.as_ptr().cast::<u8>(), b.as_ptr().cast::<u8>());

		Pool::with(|pool: &Pool<u64>| unsafe { pool.free(a) });
		Pool::with(|pool: &Pool<i32>| unsafe { pool.free(b) });
	}
}

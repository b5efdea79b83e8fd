//! The dynamic value container and its reference-counting proxy.

use crate::value::ty::{Integer, Text};
use crate::value::{
	null_hash, AnyData, AnyObj, Authority, Namespace, Obj, ObjHolder, Pool, Status, TypeToken,
	Typename,
};
use crate::{ErrorKind, Result};
use std::cell::Cell;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ptr::NonNull;

/// The shared indirection every non-null [`Any`] points through.
///
/// A proxy owns one erased instance and counts the handles referring to it.
/// The count is unsynchronized, which is what keeps [`Any`] out of `Send`
/// and `Sync`.
pub(crate) struct Proxy {
	refcount: Cell<usize>,
	instance: NonNull<dyn AnyObj>,
}

impl Proxy {
	fn alloc(refcount: usize, instance: NonNull<dyn AnyObj>) -> NonNull<Self> {
		Pool::with(|pool| pool.alloc(Self { refcount: Cell::new(refcount), instance }))
	}

	fn alloc_with_authority(
		authority: Authority,
		refcount: usize,
		instance: NonNull<dyn AnyObj>,
	) -> NonNull<Self> {
		unsafe { instance.as_ref() }.header().set_authority(authority);
		Self::alloc(refcount, instance)
	}
}

impl Drop for Proxy {
	fn drop(&mut self) {
		let instance = unsafe { self.instance.as_ref() };

		if instance.header().status() == Status::Deposit {
			// A holder still claims the instance; park it there instead of
			// destroying it.
			instance.header().set_status(Status::Normal);
			trace!(target: "proxy", ty = instance.type_name(), "parked a deposited instance");
			return;
		}

		unsafe { (*self.instance.as_ptr()).kill() };
	}
}

/// A dynamically typed, reference-counted value.
///
/// `Any` is the universal currency of the corvid runtime: every variable,
/// argument, and literal is carried in one. Copying a handle with [`Clone`]
/// is cheap and shares the payload; the first checked write through
/// [`val`](Self::val) detaches the handle onto a private copy, so plain
/// handles behave like values. The `*_raw` operations skip the detach and
/// work through the shared proxy instead, which is why they are `unsafe`.
pub struct Any {
	proxy: Option<NonNull<Proxy>>,
}

sa::assert_eq_size!(Any, *const ());
sa::assert_not_impl_any!(Any: Send, Sync);

/// Instances take part in identity by data address only; vtable addresses
/// are not stable across codegen units.
fn data_ptr(instance: NonNull<dyn AnyObj + '_>) -> *const () {
	instance.as_ptr() as *const ()
}

impl Any {
	/// The empty container.
	#[must_use]
	pub const fn null() -> Self {
		Self { proxy: None }
	}

	/// Boxes `value` into a fresh, freely writable container.
	///
	/// # Examples
	/// ```
	/// use corvid::Any;
	///
	/// let greeting = Any::make(String::from("salve"));
	///
	/// assert_eq!(greeting.to_text(), "salve");
	/// assert_eq!(greeting.type_name(), "Text");
	/// ```
	#[must_use]
	pub fn make<T: AnyData>(value: T) -> Self {
		Self { proxy: Some(Proxy::alloc(1, Obj::alloc(value))) }
	}

	/// Boxes `value` shielded from in-place reassignment and swapping.
	#[must_use]
	pub fn make_protect<T: AnyData>(value: T) -> Self {
		Self {
			proxy: Some(Proxy::alloc_with_authority(Authority::Protect, 1, Obj::alloc(value))),
		}
	}

	/// Boxes `value` shielded from every mutation.
	#[must_use]
	pub fn make_constant<T: AnyData>(value: T) -> Self {
		Self {
			proxy: Some(Proxy::alloc_with_authority(Authority::Constant, 1, Obj::alloc(value))),
		}
	}

	/// Wraps the instance adopted by `holder` in a new container, marking
	/// it deposited again so the holder keeps its claim.
	///
	/// The deposit marker is consumed by a single release: the first proxy
	/// to let go of the instance parks it, and any further owner will
	/// destroy it. Spreading one held instance across several containers
	/// therefore shortens the holder's claim.
	///
	/// # Safety
	/// `holder`'s instance must still be live, meaning no
	/// [`replace`](ObjHolder::replace) has let go of it and every container
	/// release so far parked it rather than destroying it.
	#[must_use]
	pub unsafe fn from_deposit(holder: &ObjHolder) -> Self {
		holder.instance().as_ref().header().set_status(Status::Deposit);

		Self { proxy: Some(Proxy::alloc(1, holder.instance())) }
	}

	fn proxy(&self) -> Option<&Proxy> {
		self.proxy.map(|proxy| unsafe { proxy.as_ref() })
	}

	fn instance(&self) -> Option<&dyn AnyObj> {
		self.proxy().map(|proxy| unsafe { proxy.instance.as_ref() })
	}

	fn instance_mut(&mut self) -> Option<&mut dyn AnyObj> {
		self.proxy.map(|proxy| unsafe { &mut *(*proxy.as_ptr()).instance.as_ptr() })
	}

	fn instance_ptr(&self) -> Option<NonNull<dyn AnyObj>> {
		self.proxy().map(|proxy| proxy.instance)
	}

	fn refcount(&self) -> usize {
		self.proxy().map_or(0, |proxy| proxy.refcount.get())
	}

	fn shares_proxy(&self, other: &Self) -> bool {
		matches!((self.proxy, other.proxy), (Some(mine), Some(theirs)) if mine == theirs)
	}

	/// Drops this handle's claim on its proxy, destroying the proxy when
	/// the claim was the last one.
	fn release(&mut self) {
		let proxy = match self.proxy.take() {
			Some(proxy) => proxy,
			None => return,
		};

		let count = unsafe { proxy.as_ref() }.refcount.get();

		if count > 1 {
			unsafe { proxy.as_ref() }.refcount.set(count - 1);
			return;
		}

		if Pool::try_with(|pool| unsafe { pool.free(proxy) }).is_none() {
			// The registry is gone mid-teardown; destroy directly.
			unsafe { Pool::release_direct(proxy) };
		}
	}

	fn check_access<T: AnyData>(&self, writing: bool) -> Result<()> {
		let instance = match self.instance() {
			Some(instance) => instance,
			None => return Err(ErrorKind::NullAccess.into()),
		};

		if !instance.as_any().is::<T>() {
			return Err(ErrorKind::TypeMismatch {
				expected: T::TYPENAME,
				given: instance.type_name(),
			}
			.into());
		}

		if writing && instance.header().authority() == Authority::Constant {
			return Err(ErrorKind::ConstantWrite(instance.type_name()).into());
		}

		Ok(())
	}

	/// Swaps a fresh instance into this handle's proxy and destroys the
	/// outgoing one, leaving the refcount untouched.
	///
	/// # Safety
	/// The proxy must exist, and nothing may still refer to the outgoing
	/// instance: no payload borrows and no holder adopted from it.
	unsafe fn replace_instance(&mut self, instance: NonNull<dyn AnyObj>) {
		let proxy = match self.proxy {
			Some(proxy) => proxy,
			None => unreachable!("replaced the instance of an empty container"),
		};

		let old = std::mem::replace(&mut (*proxy.as_ptr()).instance, instance);
		(*old.as_ptr()).kill();
	}

	/// Detaches this handle onto a private copy of its payload.
	///
	/// The copy starts with default status and authority; empty handles are
	/// left alone. Detaching is unconditional even for a uniquely held
	/// value, since a unique proxy can still share its instance with a
	/// holder.
	pub fn unshare(&mut self) {
		let duplicate = match self.instance() {
			Some(instance) => {
				trace!(target: "any", ty = instance.type_name(), "detaching for copy-on-write");
				instance.duplicate()
			}
			None => return,
		};

		self.release();
		self.proxy = Some(Proxy::alloc(1, duplicate));
	}

	/// Grants checked mutable access to the payload.
	///
	/// The handle detaches onto a private copy first, so the returned
	/// borrow can never be observed through another handle or holder.
	///
	/// # Errors
	/// Returns [`ErrorKind::NullAccess`] on an empty container,
	/// [`ErrorKind::TypeMismatch`] when the payload is not a `T`, and
	/// [`ErrorKind::ConstantWrite`] on a constant.
	///
	/// # Examples
	/// ```
	/// use corvid::Any;
	///
	/// let mut count = Any::make(12_i64);
	/// *count.val::<i64>()? += 1;
	///
	/// assert_eq!(count.const_val::<i64>()?, &13);
	/// # corvid::Result::<()>::Ok(())
	/// ```
	pub fn val<T: AnyData>(&mut self) -> Result<&mut T> {
		self.check_access::<T>(true)?;
		self.unshare();

		// Freshly duplicated, so this handle is the only route to the
		// instance.
		let instance = match self.instance_mut() {
			Some(instance) => instance,
			None => unreachable!("detaching lost the instance"),
		};

		match instance.as_any_mut().downcast_mut::<T>() {
			Some(data) => Ok(data),
			None => unreachable!("access checks let a foreign type through"),
		}
	}

	/// Grants checked mutable access without detaching: writes land in the
	/// shared instance and are visible through every handle on the proxy.
	///
	/// # Safety
	/// No other borrow of this payload may be live while the returned
	/// borrow is, through any handle or holder sharing the instance.
	///
	/// # Errors
	/// Same conditions as [`val`](Self::val).
	pub unsafe fn val_raw<T: AnyData>(&mut self) -> Result<&mut T> {
		self.check_access::<T>(true)?;

		let instance = match self.instance_mut() {
			Some(instance) => instance,
			None => unreachable!("the access checks passed on an empty container"),
		};

		match instance.as_any_mut().downcast_mut::<T>() {
			Some(data) => Ok(data),
			None => unreachable!("access checks let a foreign type through"),
		}
	}

	/// Grants checked shared access to the payload.
	///
	/// Constants are readable; only the null and type checks apply here.
	///
	/// # Errors
	/// Returns [`ErrorKind::NullAccess`] on an empty container and
	/// [`ErrorKind::TypeMismatch`] when the payload is not a `T`.
	pub fn const_val<T: AnyData>(&self) -> Result<&T> {
		self.check_access::<T>(false)?;

		let instance = match self.instance() {
			Some(instance) => instance,
			None => unreachable!("the access checks passed on an empty container"),
		};

		match instance.as_any().downcast_ref::<T>() {
			Some(data) => Ok(data),
			None => unreachable!("access checks let a foreign type through"),
		}
	}

	/// Replaces this handle's value with a copy of `other`'s.
	///
	/// The copy lands in a fresh proxy, so handles that shared with either
	/// side are unaffected. Assigning between handles that share one proxy
	/// is a no-op, and assigning an empty `other` empties `self`. Authority
	/// is not consulted: rebinding a handle is not a write to its old
	/// payload.
	pub fn assign(&mut self, other: &Self) {
		if self.shares_proxy(other) {
			return;
		}

		self.release();

		if let Some(instance) = other.instance() {
			self.proxy = Some(Proxy::alloc(1, instance.duplicate()));
		}
	}

	/// Replaces the payload in place with a copy of `other`'s, through this
	/// handle's existing proxy.
	///
	/// Handles sharing the proxy observe the new value. When either side is
	/// empty the operation degrades to [`assign`](Self::assign), and a pair
	/// sharing one proxy is left untouched.
	///
	/// # Errors
	/// Returns [`ErrorKind::AuthorityLocked`] unless both sides are freely
	/// writable.
	///
	/// # Safety
	/// Nothing may still refer to this handle's current instance: no
	/// payload borrows through any sharing handle and no holder adopted
	/// from it.
	pub unsafe fn assign_raw(&mut self, other: &Self) -> Result<()> {
		if self.shares_proxy(other) {
			return Ok(());
		}

		let (mine, theirs) = match (self.instance(), other.instance()) {
			(Some(mine), Some(theirs)) => (mine, theirs),
			_ => {
				self.assign(other);
				return Ok(());
			}
		};

		if mine.header().authority() != Authority::Normal
			|| theirs.header().authority() != Authority::Normal
		{
			return Err(ErrorKind::AuthorityLocked.into());
		}

		debug!(target: "any", ty = theirs.type_name(), "raw-assigning through a live proxy");

		let duplicate = theirs.duplicate();
		self.replace_instance(duplicate);

		Ok(())
	}

	/// Replaces this handle's value with `value` in a fresh proxy.
	pub fn assign_value<T: AnyData>(&mut self, value: T) {
		self.release();
		self.proxy = Some(Proxy::alloc(1, Obj::alloc(value)));
	}

	/// Replaces the payload in place with `value`, through this handle's
	/// existing proxy. Degrades to [`assign_value`](Self::assign_value) on
	/// an empty handle.
	///
	/// # Errors
	/// Returns [`ErrorKind::AuthorityLocked`] unless the handle is freely
	/// writable.
	///
	/// # Safety
	/// Same contract as [`assign_raw`](Self::assign_raw).
	pub unsafe fn assign_value_raw<T: AnyData>(&mut self, value: T) -> Result<()> {
		let authority = match self.instance() {
			Some(instance) => instance.header().authority(),
			None => {
				self.assign_value(value);
				return Ok(());
			}
		};

		if authority != Authority::Normal {
			return Err(ErrorKind::AuthorityLocked.into());
		}

		self.replace_instance(Obj::alloc(value));

		Ok(())
	}

	/// Exchanges the proxies of two handles. Status and authority ride
	/// along with each payload.
	pub fn swap(&mut self, other: &mut Self) {
		std::mem::swap(&mut self.proxy, &mut other.proxy);
	}

	/// Exchanges the payload instances underneath two proxies, leaving the
	/// proxies, and every handle sharing them, in place.
	///
	/// When either side is empty the operation degrades to
	/// [`swap`](Self::swap). A pair sharing one proxy answers to the same
	/// authority check but is otherwise left untouched.
	///
	/// # Errors
	/// Returns [`ErrorKind::SwapLocked`] unless both sides are freely
	/// writable.
	///
	/// # Safety
	/// No payload borrow may be live through any handle sharing either
	/// proxy. The instances change owners, so a borrow taken through one
	/// side could outlive its payload under the other.
	pub unsafe fn swap_raw(&mut self, other: &mut Self) -> Result<()> {
		match (self.proxy, other.proxy) {
			(Some(mine), Some(theirs)) => {
				let locked = (*mine.as_ptr()).instance.as_ref().header().authority()
					!= Authority::Normal
					|| (*theirs.as_ptr()).instance.as_ref().header().authority()
						!= Authority::Normal;

				if locked {
					return Err(ErrorKind::SwapLocked.into());
				}

				// Swapping a proxy's instance with itself would alias, and
				// changes nothing anyway.
				if mine != theirs {
					std::mem::swap(
						&mut (*mine.as_ptr()).instance,
						&mut (*theirs.as_ptr()).instance,
					);
				}

				Ok(())
			}
			_ => {
				self.swap(other);
				Ok(())
			}
		}
	}

	/// Raises the payload's authority to [`Authority::Protect`]. Empty
	/// handles are left alone.
	///
	/// # Errors
	/// Returns [`ErrorKind::AuthorityDowngrade`] when the authority was
	/// already raised; `protect` is not idempotent.
	pub fn protect(&self) -> Result<()> {
		if let Some(instance) = self.instance() {
			if instance.header().authority() != Authority::Normal {
				return Err(ErrorKind::AuthorityDowngrade.into());
			}

			instance.header().set_authority(Authority::Protect);
		}

		Ok(())
	}

	/// Raises the payload's authority to [`Authority::Constant`], the
	/// terminal level. Empty handles are left alone.
	pub fn constant(&self) {
		if let Some(instance) = self.instance() {
			instance.header().set_authority(Authority::Constant);
		}
	}

	/// The payload's current authority level. Empty handles report
	/// [`Authority::Normal`].
	#[must_use]
	pub fn authority(&self) -> Authority {
		self.instance()
			.map_or(Authority::Normal, |instance| instance.header().authority())
	}

	/// Whether the payload's authority is raised at all.
	#[must_use]
	pub fn is_protect(&self) -> bool {
		self.authority() != Authority::Normal
	}

	/// Whether the payload is a constant.
	#[must_use]
	pub fn is_constant(&self) -> bool {
		self.authority() == Authority::Constant
	}

	/// Marks a uniquely held, plain value as a recyclable temporary and
	/// resets its authority.
	///
	/// The marker invites the next consumer to steal the payload instead
	/// of copying it; reading a marked value stays legal. Shared,
	/// deposited, and already-marked values are left alone.
	pub fn try_move(&self) {
		if self.refcount() != 1 {
			return;
		}

		if let Some(instance) = self.instance() {
			if instance.header().status() == Status::Normal {
				instance.header().set_authority(Authority::Normal);
				instance.header().set_status(Status::Recycle);
			}
		}
	}

	/// Sets or clears the recyclable-temporary marker, leaving deposited
	/// values alone.
	pub fn mark_as_rvalue(&self, rvalue: bool) {
		if let Some(instance) = self.instance() {
			if instance.header().status() != Status::Deposit {
				instance
					.header()
					.set_status(if rvalue { Status::Recycle } else { Status::Normal });
			}
		}
	}

	/// Whether the payload is marked as a recyclable temporary.
	#[must_use]
	pub fn is_rvalue(&self) -> bool {
		self.instance().map_or(false, |instance| instance.header().status() == Status::Recycle)
	}

	/// Exports the payload instance for holding outside any container.
	///
	/// The instance is marked deposited: the last sharing handle to release
	/// it parks it instead of destroying it, leaving the returned holder
	/// its sole owner until [`ObjHolder::replace`] lets go.
	///
	/// # Errors
	/// Returns [`ErrorKind::NullShare`] on an empty container.
	pub fn share_object(&self) -> Result<ObjHolder> {
		let proxy = match self.proxy() {
			Some(proxy) => proxy,
			None => return Err(ErrorKind::NullShare.into()),
		};

		let instance = unsafe { proxy.instance.as_ref() };
		instance.header().set_status(Status::Deposit);
		debug!(target: "any", ty = instance.type_name(), "deposited an instance for external holding");

		Ok(ObjHolder::new(proxy.instance))
	}

	/// Asks the payload to sever its ties to other values.
	///
	/// # Safety
	/// Same contract as [`val_raw`](Self::val_raw): the payload is mutated
	/// in place, visibly through every sharing handle.
	pub unsafe fn detach(&mut self) {
		if let Some(instance) = self.instance_mut() {
			instance.detach();
		}
	}

	/// Whether this container is empty.
	#[must_use]
	pub fn is_null(&self) -> bool {
		self.proxy.is_none()
	}

	/// The registered token of the payload type, [`TypeToken::VOID`] for
	/// an empty container.
	#[must_use]
	pub fn type_token(&self) -> TypeToken {
		self.instance().map_or(TypeToken::VOID, |instance| instance.token())
	}

	/// The payload type's name, `"Void"` for an empty container.
	#[must_use]
	pub fn type_name(&self) -> Typename {
		self.instance().map_or(TypeToken::VOID.name(), |instance| instance.type_name())
	}

	/// Whether the payload is a `T`.
	#[must_use]
	pub fn is_a<T: AnyData>(&self) -> bool {
		self.instance().map_or(false, |instance| instance.as_any().is::<T>())
	}

	/// Renders the payload as text, `"Null"` for an empty container.
	#[must_use]
	pub fn to_text(&self) -> Text {
		self.instance().map_or_else(|| Text::from("Null"), |instance| instance.to_text())
	}

	/// Converts the payload to an integer; an empty container converts to
	/// zero.
	///
	/// # Errors
	/// Returns [`ErrorKind::ConversionFailed`] when the payload type
	/// declines the conversion.
	pub fn to_integer(&self) -> Result<Integer> {
		self.instance().map_or(Ok(0), |instance| instance.to_integer())
	}

	/// The payload's hash; every empty container hashes alike.
	#[must_use]
	pub fn hash_value(&self) -> u64 {
		self.instance().map_or_else(null_hash, |instance| instance.hash())
	}

	/// The extension namespace published by the payload's type.
	///
	/// # Errors
	/// Returns [`ErrorKind::ExtensionUnsupported`] when the type publishes
	/// none, and for empty containers.
	pub fn get_ext(&self) -> Result<Namespace> {
		let instance = match self.instance() {
			Some(instance) => instance,
			None => return Err(ErrorKind::ExtensionUnsupported(TypeToken::VOID.name()).into()),
		};

		instance.ext().ok_or_else(|| ErrorKind::ExtensionUnsupported(instance.type_name()).into())
	}

	/// Whether two handles refer to the very same payload instance.
	///
	/// # Errors
	/// Returns [`ErrorKind::NullAccess`] when either handle is empty.
	pub fn ptr_eq(&self, other: &Self) -> Result<bool> {
		match (self.instance_ptr(), other.instance_ptr()) {
			(Some(mine), Some(theirs)) => Ok(data_ptr(mine) == data_ptr(theirs)),
			_ => Err(ErrorKind::NullAccess.into()),
		}
	}

	/// Whether this handle's payload is the instance adopted by `holder`.
	///
	/// # Errors
	/// Returns [`ErrorKind::NullAccess`] when this handle is empty.
	pub fn ptr_eq_holder(&self, holder: &ObjHolder) -> Result<bool> {
		match self.instance_ptr() {
			Some(mine) => Ok(data_ptr(mine) == data_ptr(holder.instance())),
			None => Err(ErrorKind::NullAccess.into()),
		}
	}
}

impl Default for Any {
	fn default() -> Self {
		Self::null()
	}
}

impl Drop for Any {
	fn drop(&mut self) {
		self.release();
	}
}

impl Clone for Any {
	/// Copying a handle shares the payload; the next checked write through
	/// either copy detaches first.
	fn clone(&self) -> Self {
		if let Some(proxy) = self.proxy() {
			proxy.refcount.set(proxy.refcount.get() + 1);
		}

		Self { proxy: self.proxy }
	}
}

/// Two empty containers are equal, and an empty one never equals a full
/// one. Payloads are compared by identity first and
/// [`compare`](AnyData::compare) second, so a handle always equals one
/// sharing its instance even when payload equality is non-reflexive, as
/// with floating-point NaN.
impl PartialEq for Any {
	fn eq(&self, other: &Self) -> bool {
		match (self.instance(), other.instance()) {
			(Some(mine), Some(theirs)) => {
				data_ptr(NonNull::from(mine)) == data_ptr(NonNull::from(theirs))
					|| mine.compare(theirs)
			}
			(None, None) => true,
			_ => false,
		}
	}
}

impl Eq for Any {}

impl Hash for Any {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u64(self.hash_value());
	}
}

impl Display for Any {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_text())
	}
}

impl Debug for Any {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let instance = match self.instance() {
			Some(instance) => instance,
			None => return f.write_str("Any(Null)"),
		};

		if f.alternate() {
			f.debug_struct("Any")
				.field("type", &instance.type_name())
				.field("authority", &instance.header().authority())
				.field("status", &instance.header().status())
				.field("refcount", &self.refcount())
				.field("value", &instance.to_text())
				.finish()
		} else {
			write!(f, "Any({})", instance.to_text())
		}
	}
}

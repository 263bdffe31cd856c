use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Shared handle compared by address, so one callback registers once.
pub(crate) struct ArcAddr<T: ?Sized> {
	ptr: Arc<T>,
}

impl<T: ?Sized> ArcAddr<T> {
	pub fn new(ptr: Arc<T>) -> Self {
		ArcAddr { ptr }
	}

	pub fn arc(&self) -> Arc<T> {
		self.ptr.clone()
	}
}

impl<T: ?Sized> Deref for ArcAddr<T> {
	type Target = Arc<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for ArcAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.ptr), Arc::as_ptr(&other.ptr))
	}
}

impl<T: ?Sized> Eq for ArcAddr<T> {}

pub(crate) struct WeakAddr<T: ?Sized> {
	ptr: Weak<T>,
}

impl<T: ?Sized> WeakAddr<T> {
	pub fn new(ptr: &Arc<T>) -> Self {
		WeakAddr {
			ptr: Arc::downgrade(ptr),
		}
	}
}

impl<T: ?Sized> Deref for WeakAddr<T> {
	type Target = Weak<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for WeakAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::addr_eq(Weak::as_ptr(&self.ptr), Weak::as_ptr(&other.ptr))
	}
}

impl<T: ?Sized> Eq for WeakAddr<T> {}

use std::sync::Arc;

use crate::value::{Edge, Observable, ValueBody};
use crate::{Data, Error, Result, Value};

impl<T: Data> ValueBody<T> {
	/// Adds the edge `self -> target`, pulls the value of `target` into
	/// `self` and from then on keeps both in sync. When `writable` is
	/// `false` only `target` pushes.
	pub(crate) fn link_to(self: &Arc<Self>, target: &Arc<ValueBody<T>>, writable: bool) -> Result<()> {
		if !self.graph.same(&target.graph) {
			return Err(Error::ForeignGraph);
		}

		self.graph.batch(|| {
			self.graph.add_edge(self.id, target.id)?;
			if let Err(error) = self.set(target.get()) {
				self.graph.remove_node(self.id);
				return Err(error);
			}

			self.inner.lock().link = Some(Edge {
				target: target.clone(),
				writable,
			});
			target.inner.lock().linked_by.push(Arc::downgrade(self));

			tracing::debug!(from = ?self.id, to = ?target.id, writable, "linked");
			Ok(())
		})
	}

	/// Both sides keep their current value.
	pub(crate) fn unlink_from(self: &Arc<Self>, target: &Arc<ValueBody<T>>) -> Result<()> {
		if !self.graph.same(&target.graph) {
			return Err(Error::NotLinked);
		}

		let _guard = self.graph.lock();
		self.graph.remove_edge(self.id, target.id)?;
		self.inner.lock().link = None;
		target
			.inner
			.lock()
			.linked_by
			.retain(|linked| !std::ptr::eq(linked.as_ptr(), Arc::as_ptr(self)));

		tracing::debug!(from = ?self.id, to = ?target.id, "unlinked");
		Ok(())
	}
}

impl<T: Data> Value<T> {
	/// Links this value to `other`: this value takes the value of `other`
	/// right away, after which a change on either side is pushed into the
	/// other one.
	///
	/// Fails with [`Error::SelfLink`], [`Error::AlreadyLinked`] if this
	/// value already links to another one, or [`Error::Cycle`] if following
	/// the links of `other` leads back here.
	pub fn link(&self, other: &Value<T>) -> Result<()> {
		self.body.link_to(&other.body, true)
	}

	/// Like [`Value::link`], but changes of this value are not pushed
	/// into the read-only `other`.
	pub fn link_observable(&self, other: &Observable<T>) -> Result<()> {
		self.body.link_to(&other.body, false)
	}

	pub fn unlink(&self, other: &Value<T>) -> Result<()> {
		self.body.unlink_from(&other.body)
	}

	pub fn unlink_observable(&self, other: &Observable<T>) -> Result<()> {
		self.body.unlink_from(&other.body)
	}
}

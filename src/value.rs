use std::fmt::Debug;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::addr::ArcAddr;
use crate::graph::NodeId;
use crate::observer::{Observer, Observers, Registration};
use crate::{Data, Derived, Error, Graph, Notify, Result, State};

pub(crate) type ValidatorFn<T> = dyn Fn(Option<&T>) -> Result<(), String> + Send + Sync;

/// Pre-commit guard. Returning `Err` rejects the value with [`Error::Invalid`].
pub type Validator<T> = Arc<ValidatorFn<T>>;

/// A mutable, observable slot.
///
/// Cloning a `Value` yields another handle to the same slot.
pub struct Value<T: Data> {
	pub(crate) body: Arc<ValueBody<T>>,
}

impl<T: Data> Clone for Value<T> {
	fn clone(&self) -> Self {
		Value {
			body: self.body.clone(),
		}
	}
}

pub(crate) struct ValueBody<T: Data> {
	pub(crate) id: NodeId,
	pub(crate) graph: Graph,
	pub(crate) inner: Mutex<ValueInner<T>>,
	locked: OnceLock<State>,
}

pub(crate) struct ValueInner<T: Data> {
	pub(crate) value: Option<T>,
	pub(crate) default: Option<T>,
	pub(crate) notify: Notify,
	pub(crate) validators: SmallVec<[ArcAddr<ValidatorFn<T>>; 2]>,
	pub(crate) link: Option<Edge<T>>,
	pub(crate) linked_by: SmallVec<[Weak<ValueBody<T>>; 1]>,
	pub(crate) observers: Observers<T>,
	pub(crate) derived: SmallVec<[Weak<dyn Derived<T>>; 2]>,
}

/// Outgoing link. The target always pushes into the owner of the edge,
/// the owner pushes into the target only when it is `writable`.
pub(crate) struct Edge<T: Data> {
	pub(crate) target: Arc<ValueBody<T>>,
	pub(crate) writable: bool,
}

type Targets<T> = SmallVec<[Arc<ValueBody<T>>; 2]>;

impl<T: Data> ValueInner<T> {
	fn substitute(&self, value: Option<T>) -> Option<T> {
		value.or_else(|| self.default.clone())
	}

	fn is_unchanged(&self, value: &Option<T>) -> bool {
		self.notify == Notify::Changed && self.value == *value
	}

	fn push_targets(&mut self, from: Option<NodeId>) -> Targets<T> {
		let mut targets = Targets::new();
		if let Some(edge) = &self.link {
			if edge.writable && Some(edge.target.id) != from {
				targets.push(edge.target.clone());
			}
		}
		self.linked_by.retain(|linked| match linked.upgrade() {
			Some(linked) => {
				if Some(linked.id) != from {
					targets.push(linked);
				}
				true
			}
			None => false,
		});
		targets
	}

	fn derived(&mut self) -> SmallVec<[Arc<dyn Derived<T>>; 2]> {
		let mut derived = SmallVec::new();
		self.derived.retain(|item| match item.upgrade() {
			Some(item) => {
				derived.push(item);
				true
			}
			None => false,
		});
		derived
	}
}

impl<T: Data> ValueBody<T> {
	pub(crate) fn new(graph: &Graph, value: Option<T>, default: Option<T>, notify: Notify) -> Arc<Self> {
		let value = value.or_else(|| default.clone());
		Arc::new(ValueBody {
			id: graph.next_id(),
			graph: graph.clone(),
			inner: Mutex::new(ValueInner {
				value,
				default,
				notify,
				validators: SmallVec::new(),
				link: None,
				linked_by: SmallVec::new(),
				observers: Observers::default(),
				derived: SmallVec::new(),
			}),
			locked: OnceLock::new(),
		})
	}

	pub(crate) fn get(&self) -> Option<T> {
		let _guard = self.graph.lock();
		self.inner.lock().value.clone()
	}

	pub(crate) fn locked(&self) -> &State {
		self.locked.get_or_init(|| State::new(&self.graph, false))
	}

	fn is_locked(&self) -> bool {
		self.locked.get().is_some_and(State::is)
	}

	pub(crate) fn set(self: &Arc<Self>, value: Option<T>) -> Result<()> {
		self.graph.transaction(|| {
			self.check(&value, None)?;
			self.commit(value, None)
		})
	}

	/// Validates `value` here and in every link partner it would be
	/// pushed into, without committing anything.
	fn check(&self, value: &Option<T>, from: Option<NodeId>) -> Result<()> {
		let (candidate, validators, targets) = {
			let mut inner = self.inner.lock();
			let candidate = inner.substitute(value.clone());
			if inner.is_unchanged(&candidate) {
				return Ok(());
			}
			let validators: SmallVec<[Validator<T>; 2]> =
				inner.validators.iter().map(ArcAddr::arc).collect();
			(candidate, validators, inner.push_targets(from))
		};

		if self.is_locked() {
			tracing::debug!(node = ?self.id, "rejected, value is locked");
			return Err(Error::Locked);
		}

		for validator in &validators {
			validator(candidate.as_ref()).map_err(|reason| {
				tracing::debug!(node = ?self.id, %reason, "rejected by validator");
				Error::Invalid(reason)
			})?;
		}

		for target in targets {
			target.check(&candidate, Some(self.id))?;
		}

		Ok(())
	}

	/// Checks and commits a value computed from other nodes.
	pub(crate) fn propagate(self: &Arc<Self>, value: Option<T>) -> Result<()> {
		self.check(&value, None)?;
		self.commit(value, None)
	}

	/// Commits without validation, then cascades into link partners and
	/// derived nodes. Listeners are queued on the running batch, the
	/// previous value is recorded so a failing cascade can be undone.
	pub(crate) fn commit(self: &Arc<Self>, value: Option<T>, from: Option<NodeId>) -> Result<()> {
		let (previous, current, targets, derived) = {
			let mut inner = self.inner.lock();
			let value = inner.substitute(value);
			if inner.is_unchanged(&value) {
				return Ok(());
			}
			let previous = std::mem::replace(&mut inner.value, value.clone());
			(previous, value, inner.push_targets(from), inner.derived())
		};

		tracing::trace!(node = ?self.id, "committed");

		let this = self.clone();
		let restored = previous.clone();
		self.graph.record(Box::new(move || {
			tracing::trace!(node = ?this.id, "rolled back");
			this.inner.lock().value = restored;
		}));

		let this = self.clone();
		let (before, after) = (previous.clone(), current.clone());
		self.graph
			.enqueue(Box::new(move || this.dispatch(before.as_ref(), after.as_ref())));

		for target in targets {
			target.commit(current.clone(), Some(self.id))?;
		}

		for item in derived {
			item.changed(previous.as_ref(), current.as_ref())?;
		}

		Ok(())
	}

	fn dispatch(&self, previous: Option<&T>, value: Option<&T>) {
		let callbacks = self.inner.lock().observers.snapshot();
		for callback in &callbacks {
			callback.call(previous, value);
		}
	}

	pub(crate) fn add_validator(&self, validator: &Validator<T>) -> Result<bool> {
		let _guard = self.graph.lock();
		let entry = ArcAddr::new(validator.clone());
		let current = {
			let inner = self.inner.lock();
			if inner.validators.contains(&entry) {
				return Ok(false);
			}
			inner.value.clone()
		};

		validator(current.as_ref()).map_err(Error::Invalid)?;
		self.inner.lock().validators.push(entry);
		Ok(true)
	}

	pub(crate) fn remove_validator(&self, validator: &Validator<T>) -> bool {
		let entry = ArcAddr::new(validator.clone());
		let mut inner = self.inner.lock();
		match inner.validators.iter().position(|item| *item == entry) {
			Some(index) => {
				inner.validators.remove(index);
				true
			}
			None => false,
		}
	}

	fn validate(&self, value: Option<&T>) -> Result<()> {
		let validators: SmallVec<[Validator<T>; 2]> = {
			let inner = self.inner.lock();
			inner.validators.iter().map(ArcAddr::arc).collect()
		};
		for validator in &validators {
			validator(value).map_err(Error::Invalid)?;
		}
		Ok(())
	}

	pub(crate) fn observe(&self, registration: Registration<T>) -> bool {
		self.inner.lock().observers.add(registration)
	}

	pub(crate) fn unobserve(&self, registration: &Registration<T>) -> bool {
		self.inner.lock().observers.remove(registration)
	}

	pub(crate) fn add_derived(&self, derived: Weak<dyn Derived<T>>) {
		self.inner.lock().derived.push(derived);
	}
}

impl<T: Data> Drop for ValueBody<T> {
	fn drop(&mut self) {
		self.graph.remove_node(self.id);
	}
}

impl<T: Data> Value<T> {
	pub(crate) fn new(graph: &Graph, value: Option<T>, default: Option<T>) -> Self {
		Value {
			body: ValueBody::new(graph, value, default, Notify::Changed),
		}
	}

	pub fn get(&self) -> Option<T> {
		self.body.get()
	}

	pub fn get_or_fail(&self) -> Result<T> {
		self.get().ok_or(Error::NotPresent)
	}

	pub fn is(&self, value: &T) -> bool {
		self.get().as_ref() == Some(value)
	}

	pub fn is_null(&self) -> bool {
		self.get().is_none()
	}

	/// `false` for values with a default to fall back on.
	pub fn is_nullable(&self) -> bool {
		self.body.inner.lock().default.is_none()
	}

	/// Sets the value, `None` meaning absent (or the default, if any).
	///
	/// The value is checked against the lock and the validators of this
	/// value and of every linked value it would reach before anything is
	/// committed. Should anything derived from it fail later on, such as
	/// a negation, a combination or a group member, the whole set is
	/// undone, so a failed set leaves every value untouched.
	pub fn set(&self, value: impl Into<Option<T>>) -> Result<()> {
		self.body.set(value.into())
	}

	pub fn clear(&self) -> Result<()> {
		self.body.set(None)
	}

	/// Replaces the value with the result of `func` applied to the current one.
	pub fn map(&self, func: impl FnOnce(Option<T>) -> Option<T>) -> Result<()> {
		self.body.graph.transaction(|| self.body.set(func(self.body.get())))
	}

	/// While the returned state is active every changing set fails with [`Error::Locked`].
	pub fn locked(&self) -> State {
		self.body.locked().clone()
	}

	/// Adds `validator` after checking the current value against it.
	/// Returns `false` if it was already present.
	pub fn add_validator(&self, validator: &Validator<T>) -> Result<bool> {
		self.body.add_validator(validator)
	}

	pub fn remove_validator(&self, validator: &Validator<T>) -> bool {
		self.body.remove_validator(validator)
	}

	/// Runs the validators of this value against `value` without setting it.
	pub fn validate(&self, value: Option<&T>) -> Result<()> {
		self.body.validate(value)
	}

	pub fn observer(&self) -> Observer<T> {
		Observer::new(self.body.clone())
	}

	pub fn observable(&self) -> Observable<T> {
		Observable {
			body: self.body.clone(),
		}
	}

	pub fn graph(&self) -> &Graph {
		&self.body.graph
	}
}

impl<T: Data + Debug> Debug for Value<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Value").field(&self.get()).finish()
	}
}

/// Read-only view of a [`Value`]. Linking to it propagates one way only.
pub struct Observable<T: Data> {
	pub(crate) body: Arc<ValueBody<T>>,
}

impl<T: Data> Clone for Observable<T> {
	fn clone(&self) -> Self {
		Observable {
			body: self.body.clone(),
		}
	}
}

impl<T: Data> Observable<T> {
	pub fn get(&self) -> Option<T> {
		self.body.get()
	}

	pub fn get_or_fail(&self) -> Result<T> {
		self.get().ok_or(Error::NotPresent)
	}

	pub fn is(&self, value: &T) -> bool {
		self.get().as_ref() == Some(value)
	}

	pub fn is_null(&self) -> bool {
		self.get().is_none()
	}

	pub fn is_nullable(&self) -> bool {
		self.body.inner.lock().default.is_none()
	}

	pub fn observer(&self) -> Observer<T> {
		Observer::new(self.body.clone())
	}
}

impl<T: Data + Debug> Debug for Observable<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Observable").field(&self.get()).finish()
	}
}

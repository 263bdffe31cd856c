use std::fmt::Debug;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::addr::{ArcAddr, WeakAddr};
use crate::value::ValueBody;
use crate::Data;

pub(crate) type ListenerFn = dyn Fn() + Send + Sync;
pub(crate) type ConsumerFn<T> = dyn Fn(Option<&T>) + Send + Sync;
pub(crate) type ChangeFn<T> = dyn Fn(Option<&T>, Option<&T>) + Send + Sync;

/// Called without arguments whenever a value is set.
pub type Listener = Arc<ListenerFn>;

/// Called with the committed value whenever a value is set.
pub type Consumer<T> = Arc<ConsumerFn<T>>;

/// Called with the previous and the committed value whenever a value is set.
pub type ChangeConsumer<T> = Arc<ChangeFn<T>>;

pub fn listener(func: impl Fn() + Send + Sync + 'static) -> Listener {
	Arc::new(func)
}

pub fn consumer<T: Data>(func: impl Fn(Option<&T>) + Send + Sync + 'static) -> Consumer<T> {
	Arc::new(func)
}

pub fn change_consumer<T: Data>(
	func: impl Fn(Option<&T>, Option<&T>) + Send + Sync + 'static,
) -> ChangeConsumer<T> {
	Arc::new(func)
}

pub(crate) enum Registration<T> {
	Listener(ArcAddr<ListenerFn>),
	Consumer(ArcAddr<ConsumerFn<T>>),
	Change(ArcAddr<ChangeFn<T>>),
	WeakListener(WeakAddr<ListenerFn>),
	WeakConsumer(WeakAddr<ConsumerFn<T>>),
	WeakChange(WeakAddr<ChangeFn<T>>),
}

impl<T> PartialEq for Registration<T> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Registration::Listener(a), Registration::Listener(b)) => a == b,
			(Registration::Consumer(a), Registration::Consumer(b)) => a == b,
			(Registration::WeakListener(a), Registration::WeakListener(b)) => a == b,
			(Registration::WeakConsumer(a), Registration::WeakConsumer(b)) => a == b,
			(Registration::Change(a), Registration::Change(b)) => a == b,
			(Registration::WeakChange(a), Registration::WeakChange(b)) => a == b,
			_ => false,
		}
	}
}

pub(crate) enum Callback<T> {
	Run(Listener),
	Consume(Consumer<T>),
	Change(ChangeConsumer<T>),
}

impl<T> Callback<T> {
	pub fn call(&self, previous: Option<&T>, value: Option<&T>) {
		match self {
			Callback::Run(listener) => listener(),
			Callback::Consume(consumer) => consumer(value),
			Callback::Change(change) => change(previous, value),
		}
	}
}

/// Registrations of one value, dispatched in registration order
/// regardless of their kind.
pub(crate) struct Observers<T> {
	entries: SmallVec<[Registration<T>; 4]>,
}

impl<T> Default for Observers<T> {
	fn default() -> Self {
		Observers {
			entries: SmallVec::new(),
		}
	}
}

impl<T> Observers<T> {
	pub fn add(&mut self, registration: Registration<T>) -> bool {
		if self.entries.contains(&registration) {
			return false;
		}

		self.entries.push(registration);
		true
	}

	pub fn remove(&mut self, registration: &Registration<T>) -> bool {
		match self.entries.iter().position(|entry| entry == registration) {
			Some(index) => {
				self.entries.remove(index);
				true
			}
			None => false,
		}
	}

	/// Collects live callbacks, pruning weak registrations whose
	/// referent is gone.
	pub fn snapshot(&mut self) -> SmallVec<[Callback<T>; 4]> {
		let mut callbacks = SmallVec::new();
		self.entries.retain(|entry| match entry {
			Registration::Listener(listener) => {
				callbacks.push(Callback::Run(listener.arc()));
				true
			}
			Registration::Consumer(consumer) => {
				callbacks.push(Callback::Consume(consumer.arc()));
				true
			}
			Registration::Change(change) => {
				callbacks.push(Callback::Change(change.arc()));
				true
			}
			Registration::WeakListener(listener) => match listener.upgrade() {
				Some(listener) => {
					callbacks.push(Callback::Run(listener));
					true
				}
				None => false,
			},
			Registration::WeakConsumer(consumer) => match consumer.upgrade() {
				Some(consumer) => {
					callbacks.push(Callback::Consume(consumer));
					true
				}
				None => false,
			},
			Registration::WeakChange(change) => match change.upgrade() {
				Some(change) => {
					callbacks.push(Callback::Change(change));
					true
				}
				None => false,
			},
		});
		callbacks
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}
}

/// Subscription side of a value. Cloning is cheap, every clone
/// refers to the same registrations.
pub struct Observer<T: Data> {
	body: Arc<ValueBody<T>>,
}

impl<T: Data> Clone for Observer<T> {
	fn clone(&self) -> Self {
		Observer {
			body: self.body.clone(),
		}
	}
}

impl<T: Data> Observer<T> {
	pub(crate) fn new(body: Arc<ValueBody<T>>) -> Self {
		Observer { body }
	}

	/// Returns `false` if `listener` was already registered.
	pub fn add_listener(&self, listener: &Listener) -> bool {
		self.body
			.observe(Registration::Listener(ArcAddr::new(listener.clone())))
	}

	pub fn remove_listener(&self, listener: &Listener) -> bool {
		self.body
			.unobserve(&Registration::Listener(ArcAddr::new(listener.clone())))
	}

	pub fn add_consumer(&self, consumer: &Consumer<T>) -> bool {
		self.body
			.observe(Registration::Consumer(ArcAddr::new(consumer.clone())))
	}

	pub fn remove_consumer(&self, consumer: &Consumer<T>) -> bool {
		self.body
			.unobserve(&Registration::Consumer(ArcAddr::new(consumer.clone())))
	}

	/// Registers `listener` without keeping it alive. Once every other
	/// handle to it is dropped it is skipped and forgotten.
	pub fn add_weak_listener(&self, listener: &Listener) -> bool {
		self.body
			.observe(Registration::WeakListener(WeakAddr::new(listener)))
	}

	pub fn remove_weak_listener(&self, listener: &Listener) -> bool {
		self.body
			.unobserve(&Registration::WeakListener(WeakAddr::new(listener)))
	}

	pub fn add_weak_consumer(&self, consumer: &Consumer<T>) -> bool {
		self.body
			.observe(Registration::WeakConsumer(WeakAddr::new(consumer)))
	}

	pub fn remove_weak_consumer(&self, consumer: &Consumer<T>) -> bool {
		self.body
			.unobserve(&Registration::WeakConsumer(WeakAddr::new(consumer)))
	}

	/// Registers `change`, called with the previous and the committed value.
	pub fn add_change_consumer(&self, change: &ChangeConsumer<T>) -> bool {
		self.body
			.observe(Registration::Change(ArcAddr::new(change.clone())))
	}

	pub fn remove_change_consumer(&self, change: &ChangeConsumer<T>) -> bool {
		self.body
			.unobserve(&Registration::Change(ArcAddr::new(change.clone())))
	}

	pub fn add_weak_change_consumer(&self, change: &ChangeConsumer<T>) -> bool {
		self.body
			.observe(Registration::WeakChange(WeakAddr::new(change)))
	}

	pub fn remove_weak_change_consumer(&self, change: &ChangeConsumer<T>) -> bool {
		self.body
			.unobserve(&Registration::WeakChange(WeakAddr::new(change)))
	}

	/// Registers `func` for as long as the returned guard lives.
	pub fn subscribe(&self, func: impl Fn() + Send + Sync + 'static) -> Subscription {
		let listener = listener(func);
		self.add_weak_listener(&listener);
		Subscription {
			_callback: Box::new(listener),
		}
	}

	pub fn subscribe_consumer(&self, func: impl Fn(Option<&T>) + Send + Sync + 'static) -> Subscription {
		let consumer = consumer(func);
		self.add_weak_consumer(&consumer);
		Subscription {
			_callback: Box::new(consumer),
		}
	}

	pub fn subscribe_change(
		&self,
		func: impl Fn(Option<&T>, Option<&T>) + Send + Sync + 'static,
	) -> Subscription {
		let change = change_consumer(func);
		self.add_weak_change_consumer(&change);
		Subscription {
			_callback: Box::new(change),
		}
	}

	/// Number of registrations, including weak ones not yet pruned.
	pub fn len(&self) -> usize {
		self.body.inner.lock().observers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Keeps a subscribed callback alive. Dropping it unregisters the callback.
#[must_use = "dropping a subscription unregisters its callback"]
pub struct Subscription {
	_callback: Box<dyn Send + Sync>,
}

impl Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription").finish_non_exhaustive()
	}
}

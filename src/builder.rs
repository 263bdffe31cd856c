use std::sync::Arc;

use crate::addr::{ArcAddr, WeakAddr};
use crate::observer::{Consumer, Listener, Registration};
use crate::value::{Observable, ValueBody};
use crate::{change_consumer, consumer, listener, Data, Graph, Notify, Result, State, Validator, Value};

/// Configures a [`Value`] before it is created.
///
/// Listeners of every kind are dispatched in the order they were added here.
pub struct ValueBuilder<T: Data> {
	graph: Graph,
	value: Option<T>,
	default: Option<T>,
	notify: Notify,
	locked: bool,
	validators: Vec<Validator<T>>,
	link: Option<(Arc<ValueBody<T>>, bool)>,
	observers: Vec<Registration<T>>,
}

impl<T: Data> ValueBuilder<T> {
	pub(crate) fn new(graph: &Graph) -> Self {
		ValueBuilder {
			graph: graph.clone(),
			value: None,
			default: None,
			notify: Notify::default(),
			locked: false,
			validators: Vec::new(),
			link: None,
			observers: Vec::new(),
		}
	}

	pub fn value(mut self, value: T) -> Self {
		self.value = Some(value);
		self
	}

	pub fn nullable(mut self) -> Self {
		self.default = None;
		self
	}

	pub fn non_null(mut self, default: T) -> Self {
		self.default = Some(default);
		self
	}

	pub fn notify(mut self, notify: Notify) -> Self {
		self.notify = notify;
		self
	}

	/// Applied once the value is otherwise fully built.
	pub fn locked(mut self, locked: bool) -> Self {
		self.locked = locked;
		self
	}

	pub fn validator(mut self, validator: impl Fn(Option<&T>) -> Result<(), String> + Send + Sync + 'static) -> Self {
		self.validators.push(Arc::new(validator));
		self
	}

	pub fn link(mut self, other: &Value<T>) -> Self {
		self.link = Some((other.body.clone(), true));
		self
	}

	pub fn link_observable(mut self, other: &Observable<T>) -> Self {
		self.link = Some((other.body.clone(), false));
		self
	}

	pub fn listener(mut self, func: impl Fn() + Send + Sync + 'static) -> Self {
		self.observers
			.push(Registration::Listener(ArcAddr::new(listener(func))));
		self
	}

	pub fn consumer(mut self, func: impl Fn(Option<&T>) + Send + Sync + 'static) -> Self {
		self.observers
			.push(Registration::Consumer(ArcAddr::new(consumer(func))));
		self
	}

	/// Registers `func`, called with the previous and the committed value.
	pub fn change_consumer(
		mut self,
		func: impl Fn(Option<&T>, Option<&T>) + Send + Sync + 'static,
	) -> Self {
		self.observers
			.push(Registration::Change(ArcAddr::new(change_consumer(func))));
		self
	}

	pub fn weak_listener(mut self, listener: &Listener) -> Self {
		self.observers
			.push(Registration::WeakListener(WeakAddr::new(listener)));
		self
	}

	pub fn weak_consumer(mut self, consumer: &Consumer<T>) -> Self {
		self.observers
			.push(Registration::WeakConsumer(WeakAddr::new(consumer)));
		self
	}

	/// Calls `listener` on every set whose committed value matches `predicate`.
	pub fn when(
		self,
		predicate: impl Fn(Option<&T>) -> bool + Send + Sync + 'static,
		listener: impl Fn() + Send + Sync + 'static,
	) -> Self {
		self.consumer(move |value| {
			if predicate(value) {
				listener()
			}
		})
	}

	/// Calls `listener` on every set that commits `value`.
	pub fn when_equal(self, value: T, listener: impl Fn() + Send + Sync + 'static) -> Self {
		self.when(move |current| current == Some(&value), listener)
	}

	/// Like [`ValueBuilder::when`], passing the committed value on to `consumer`.
	pub fn when_consumer(
		self,
		predicate: impl Fn(Option<&T>) -> bool + Send + Sync + 'static,
		consumer: impl Fn(Option<&T>) + Send + Sync + 'static,
	) -> Self {
		self.consumer(move |value| {
			if predicate(value) {
				consumer(value)
			}
		})
	}

	pub fn when_equal_consumer(
		self,
		value: T,
		consumer: impl Fn(Option<&T>) + Send + Sync + 'static,
	) -> Self {
		self.when_consumer(move |current| current == Some(&value), consumer)
	}

	/// Fails if the initial value is rejected by a validator or
	/// the link can not be established.
	pub fn build(self) -> Result<Value<T>> {
		let body = ValueBody::new(&self.graph, self.value, self.default, self.notify);
		for validator in &self.validators {
			body.add_validator(validator)?;
		}
		if let Some((target, writable)) = &self.link {
			body.link_to(target, *writable)?;
		}
		{
			let mut inner = body.inner.lock();
			for registration in self.observers {
				inner.observers.add(registration);
			}
		}
		if self.locked {
			body.locked().set(true)?;
		}

		Ok(Value { body })
	}
}

impl ValueBuilder<bool> {
	/// Builds a [`State`], defaulting to `false` unless configured otherwise.
	pub fn build_state(mut self) -> Result<State> {
		if self.default.is_none() {
			self.default = Some(false);
		}
		Ok(State::from_value(self.build()?))
	}
}

use std::any::Any;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock, Weak};

use crate::value::ValueBody;
use crate::{Derived, Graph, Notify, Observer, Result, Validator, Value};

/// A boolean [`Value`] that is never absent, `false` by default.
#[derive(Clone)]
pub struct State {
	pub(crate) body: Arc<StateBody>,
}

pub(crate) struct StateBody {
	pub(crate) value: Value<bool>,
	not: OnceLock<Value<bool>>,
}

impl StateBody {
	fn is(&self) -> bool {
		self.value.get().unwrap_or(false)
	}

	/// The negation, created on first use and committed together
	/// with this state from then on.
	fn not_node(self: &Arc<Self>) -> &Value<bool> {
		let graph = self.value.graph();
		let _guard = graph.lock();
		self.not.get_or_init(|| {
			let notify = self.value.body.inner.lock().notify;
			let not = Value {
				body: ValueBody::new(graph, Some(!self.is()), Some(true), notify),
			};
			self.value
				.body
				.add_derived(Arc::downgrade(self) as Weak<dyn Derived<bool>>);
			not
		})
	}
}

impl Derived<bool> for StateBody {
	fn changed(&self, _: Option<&bool>, current: Option<&bool>) -> Result<()> {
		match self.not.get() {
			Some(not) => not.body.propagate(current.map(|value| !value)),
			None => Ok(()),
		}
	}
}

impl State {
	pub(crate) fn new(graph: &Graph, value: bool) -> Self {
		State::from_value(Value {
			body: ValueBody::new(graph, Some(value), Some(false), Notify::Changed),
		})
	}

	pub(crate) fn from_value(value: Value<bool>) -> Self {
		State {
			body: Arc::new(StateBody {
				value,
				not: OnceLock::new(),
			}),
		}
	}

	pub fn is(&self) -> bool {
		self.body.is()
	}

	pub fn set(&self, value: bool) -> Result<()> {
		self.body.value.set(value)
	}

	pub fn toggle(&self) -> Result<()> {
		self.body.value.map(|value| Some(!value.unwrap_or(false)))
	}

	/// Sets the state to its default.
	pub fn clear(&self) -> Result<()> {
		self.body.value.clear()
	}

	/// Read-only negation of this state. Every call returns the same node.
	pub fn not(&self) -> ObservableState {
		self.observable().not()
	}

	pub fn observable(&self) -> ObservableState {
		ObservableState {
			body: self.body.clone(),
			negated: false,
			anchor: None,
		}
	}

	pub fn observer(&self) -> Observer<bool> {
		self.body.value.observer()
	}

	pub fn locked(&self) -> State {
		self.body.value.locked()
	}

	pub fn add_validator(&self, validator: &Validator<bool>) -> Result<bool> {
		self.body.value.add_validator(validator)
	}

	pub fn remove_validator(&self, validator: &Validator<bool>) -> bool {
		self.body.value.remove_validator(validator)
	}

	pub fn link(&self, other: &State) -> Result<()> {
		self.body.value.link(&other.body.value)
	}

	/// One-way link, `other` pushes into this state.
	pub fn link_observable(&self, other: &ObservableState) -> Result<()> {
		self.body.value.body.link_to(&other.node().body, false)
	}

	pub fn unlink(&self, other: &State) -> Result<()> {
		self.body.value.unlink(&other.body.value)
	}

	pub fn unlink_observable(&self, other: &ObservableState) -> Result<()> {
		self.body.value.body.unlink_from(&other.node().body)
	}

	pub fn as_value(&self) -> &Value<bool> {
		&self.body.value
	}

	pub fn graph(&self) -> &Graph {
		self.body.value.graph()
	}
}

impl PartialEq for State {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.body, &other.body)
	}
}

impl Eq for State {}

impl Debug for State {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("State").field(&self.is()).finish()
	}
}

/// Read-only view of a state, possibly negated.
///
/// Views handed out by a [`Combination`](crate::Combination) keep the
/// combination alive.
#[derive(Clone)]
pub struct ObservableState {
	body: Arc<StateBody>,
	negated: bool,
	anchor: Option<Arc<dyn Any + Send + Sync>>,
}

impl ObservableState {
	pub(crate) fn anchored(state: &State, anchor: Arc<dyn Any + Send + Sync>) -> Self {
		ObservableState {
			body: state.body.clone(),
			negated: false,
			anchor: Some(anchor),
		}
	}

	pub fn is(&self) -> bool {
		self.body.is() != self.negated
	}

	pub fn not(&self) -> ObservableState {
		ObservableState {
			body: self.body.clone(),
			negated: !self.negated,
			anchor: self.anchor.clone(),
		}
	}

	pub fn observer(&self) -> Observer<bool> {
		self.node().observer()
	}

	pub fn graph(&self) -> &Graph {
		self.body.value.graph()
	}

	pub(crate) fn node(&self) -> &Value<bool> {
		if self.negated {
			self.body.not_node()
		} else {
			&self.body.value
		}
	}
}

impl PartialEq for ObservableState {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.body, &other.body) && self.negated == other.negated
	}
}

impl Eq for ObservableState {}

impl From<State> for ObservableState {
	fn from(state: State) -> Self {
		state.observable()
	}
}

impl From<&State> for ObservableState {
	fn from(state: &State) -> Self {
		state.observable()
	}
}

impl From<&ObservableState> for ObservableState {
	fn from(state: &ObservableState) -> Self {
		state.clone()
	}
}

impl Debug for ObservableState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ObservableState")
			.field("is", &self.is())
			.field("negated", &self.negated)
			.finish()
	}
}

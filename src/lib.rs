//! Observable values that validate, link, combine and group.
//!
//! Everything lives in a [`Graph`]. A [`Value`] is a mutable slot with
//! listeners, validators and an optional link to another value, a [`State`]
//! is a boolean value, a [`Combination`] derives a state from other states
//! and a [`Group`] keeps at most one of its states active.
//!
//! Every mutation is one critical section on the graph: the new value and
//! everything derived from it is committed first, listeners run afterwards.

pub mod macros;

mod addr;
mod batch;
mod builder;
mod combination;
mod error;
mod graph;
mod group;
mod link;
mod observer;
mod state;
mod value;
mod values;

pub use builder::ValueBuilder;
pub use combination::{Combination, Conjunction};
pub use error::{Error, Result};
pub use graph::Graph;
pub use group::Group;
pub use observer::{
	change_consumer, consumer, listener, ChangeConsumer, Consumer, Listener, Observer, Subscription,
};
pub use state::{ObservableState, State};
pub use value::{Observable, Validator, Value};
pub use values::{Kind, ValueCollection};

/// Anything that can be held by a [`Value`].
pub trait Data: Clone + PartialEq + Send + Sync + 'static {}

impl<T> Data for T where T: Clone + PartialEq + Send + Sync + 'static {}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum Notify {
	/// Notify only when the new value differs from the current one.
	#[default]
	Changed,
	/// Notify on every set, even if the value is equal.
	Set,
}

pub(crate) trait Derived<T>: Send + Sync + 'static {
	/// Called once `previous` has been replaced by `current`,
	/// before any listener of the changed value runs.
	fn changed(&self, previous: Option<&T>, current: Option<&T>) -> Result<()>;
}

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{Derived, Error, Graph, Result, State};

/// Keeps at most one of its member states active.
///
/// Activating a member deactivates the others and remembers the one it
/// replaced. Deactivating the active member brings that one back, or,
/// if nothing was remembered, activates the member added after it.
/// The group only reacts while it is alive.
#[derive(Clone)]
pub struct Group {
	body: Arc<GroupBody>,
}

struct GroupBody {
	graph: Graph,
	inner: Mutex<GroupInner>,
}

struct GroupInner {
	members: Vec<Arc<Member>>,
	previous: Option<usize>,
	phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Idle,
	/// Deactivating the other members of a newly active one.
	Cascading,
}

struct Member {
	index: usize,
	state: State,
	group: Weak<GroupBody>,
}

impl Derived<bool> for Member {
	fn changed(&self, previous: Option<&bool>, current: Option<&bool>) -> Result<()> {
		let active = current.copied().unwrap_or(false);
		if previous.copied().unwrap_or(false) == active {
			return Ok(());
		}

		match self.group.upgrade() {
			Some(group) => group.member_changed(self.index, active),
			None => Ok(()),
		}
	}
}

impl GroupBody {
	fn states(&self) -> Vec<State> {
		let inner = self.inner.lock();
		inner
			.members
			.iter()
			.map(|member| member.state.clone())
			.collect()
	}

	fn member_changed(self: &Arc<Self>, index: usize, active: bool) -> Result<()> {
		if self.inner.lock().phase == Phase::Cascading {
			return Ok(());
		}

		if active {
			self.activated(index)
		} else {
			self.deactivated(index)
		}
	}

	/// Keeps `previous` across a rolled back cascade.
	fn remember(self: &Arc<Self>, previous: Option<usize>) {
		let restored = {
			let mut inner = self.inner.lock();
			std::mem::replace(&mut inner.previous, previous)
		};
		let body = self.clone();
		self.graph
			.record(Box::new(move || body.inner.lock().previous = restored));
	}

	fn activated(self: &Arc<Self>, index: usize) -> Result<()> {
		let states = self.states();
		let active: Vec<usize> = states
			.iter()
			.enumerate()
			.filter(|(other, state)| *other != index && state.is())
			.map(|(other, _)| other)
			.collect();

		self.inner.lock().phase = Phase::Cascading;
		let result = active.iter().try_for_each(|other| states[*other].set(false));

		self.inner.lock().phase = Phase::Idle;
		self.remember(match active.as_slice() {
			[previous] => Some(*previous),
			_ => None,
		});
		tracing::trace!(index, deactivated = active.len(), "member activated");
		result
	}

	fn deactivated(self: &Arc<Self>, index: usize) -> Result<()> {
		let states = self.states();
		let previous = self.inner.lock().previous;
		self.remember(None);
		let previous = previous.filter(|previous| *previous != index);

		tracing::trace!(index, ?previous, "member deactivated");
		match previous {
			Some(previous) => states[previous].set(true),
			None if states.len() > 1 => states[(index + 1) % states.len()].set(true),
			None => Ok(()),
		}
	}
}

impl Group {
	pub(crate) fn new(graph: &Graph) -> Self {
		Group {
			body: Arc::new(GroupBody {
				graph: graph.clone(),
				inner: Mutex::new(GroupInner {
					members: Vec::new(),
					previous: None,
					phase: Phase::Idle,
				}),
			}),
		}
	}

	/// Adds `state` unless it already is a member. An active newcomer
	/// deactivates the current members, if that fails it is not added.
	pub fn add(&self, state: &State) -> Result<()> {
		if !state.graph().same(&self.body.graph) {
			return Err(Error::ForeignGraph);
		}

		self.body.graph.transaction(|| {
			let member = {
				let mut inner = self.body.inner.lock();
				if inner.members.iter().any(|member| member.state == *state) {
					return Ok(());
				}
				let member = Arc::new(Member {
					index: inner.members.len(),
					state: state.clone(),
					group: Arc::downgrade(&self.body),
				});
				inner.members.push(member.clone());
				member
			};
			let body = self.body.clone();
			self.body.graph.record(Box::new(move || {
				body.inner.lock().members.pop();
			}));

			state
				.as_value()
				.body
				.add_derived(Arc::downgrade(&member) as Weak<dyn Derived<bool>>);

			if state.is() {
				self.body.activated(member.index)?;
			}
			Ok(())
		})
	}

	pub fn add_all<'a>(&self, states: impl IntoIterator<Item = &'a State>) -> Result<()> {
		self.body
			.graph
			.transaction(|| states.into_iter().try_for_each(|state| self.add(state)))
	}

	pub fn members(&self) -> Vec<State> {
		self.body.states()
	}

	pub fn active(&self) -> Option<State> {
		self.body.states().into_iter().find(State::is)
	}

	/// The member deactivated by the latest activation, if exactly one was.
	pub fn previous(&self) -> Option<State> {
		let inner = self.body.inner.lock();
		inner
			.previous
			.map(|index| inner.members[index].state.clone())
	}
}

impl Debug for Group {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = self.body.inner.lock();
		f.debug_struct("Group")
			.field("members", &inner.members.len())
			.field("previous", &inner.previous)
			.field("phase", &inner.phase)
			.finish()
	}
}

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fxhash::FxHashMap;
use parking_lot::{Mutex, ReentrantMutexGuard};

use crate::batch::{Batch, BatchLock, Pending};
use crate::combination::{Combination, Conjunction};
use crate::group::Group;
use crate::state::{ObservableState, State};
use crate::value::Value;
use crate::values::{Kind, ValueCollection};
use crate::{Data, Error, Result, ValueBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u64);

/// Factory and registry for values, states, combinations and groups.
///
/// A graph owns the lock every mutation runs under and the link edges
/// between its values. Values of different graphs never interact.
#[derive(Clone, Default)]
pub struct Graph {
	body: Arc<GraphBody>,
}

#[derive(Default)]
struct GraphBody {
	batch: BatchLock,
	edges: Mutex<FxHashMap<NodeId, NodeId>>,
	next_id: AtomicU64,
}

impl Graph {
	pub fn new() -> Self {
		Graph::default()
	}

	/// A nullable value, initially absent.
	pub fn value<T: Data>(&self) -> Value<T> {
		Value::new(self, None, None)
	}

	pub fn nullable<T: Data>(&self, value: T) -> Value<T> {
		Value::new(self, Some(value), None)
	}

	/// A value that falls back to `default` whenever it would become absent.
	pub fn non_null<T: Data>(&self, default: T) -> Value<T> {
		Value::new(self, None, Some(default))
	}

	pub fn builder<T: Data>(&self) -> ValueBuilder<T> {
		ValueBuilder::new(self)
	}

	pub fn state(&self) -> State {
		State::new(self, false)
	}

	pub fn state_of(&self, value: bool) -> State {
		State::new(self, value)
	}

	pub fn and<I>(&self, sources: I) -> Result<Combination>
	where
		I: IntoIterator,
		I::Item: Into<ObservableState>,
	{
		self.combination(Conjunction::And, sources)
	}

	pub fn or<I>(&self, sources: I) -> Result<Combination>
	where
		I: IntoIterator,
		I::Item: Into<ObservableState>,
	{
		self.combination(Conjunction::Or, sources)
	}

	pub fn combination<I>(&self, conjunction: Conjunction, sources: I) -> Result<Combination>
	where
		I: IntoIterator,
		I::Item: Into<ObservableState>,
	{
		Combination::new(self, conjunction, sources.into_iter().map(Into::into).collect())
	}

	pub fn group<'a>(&self, states: impl IntoIterator<Item = &'a State>) -> Result<Group> {
		let group = Group::new(self);
		group.add_all(states)?;
		Ok(group)
	}

	pub fn value_list<T: Data>(&self) -> ValueCollection<T> {
		ValueCollection::new(self, Kind::List, Vec::new())
	}

	pub fn value_list_of<T: Data>(&self, values: impl IntoIterator<Item = T>) -> ValueCollection<T> {
		ValueCollection::new(self, Kind::List, values.into_iter().collect())
	}

	pub fn value_set<T: Data>(&self) -> ValueCollection<T> {
		ValueCollection::new(self, Kind::Set, Vec::new())
	}

	pub fn value_set_of<T: Data>(&self, values: impl IntoIterator<Item = T>) -> ValueCollection<T> {
		ValueCollection::new(self, Kind::Set, values.into_iter().collect())
	}

	/// Runs `func` as one critical section. Listeners of everything
	/// set inside run once the outermost batch returns.
	pub fn batch<R>(&self, func: impl FnOnce() -> R) -> R {
		self.body.batch.batch(func)
	}

	pub fn in_batch(&self) -> bool {
		self.body.batch.in_batch()
	}

	pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, std::cell::RefCell<Batch>> {
		self.body.batch.lock()
	}

	pub(crate) fn enqueue(&self, pending: Pending) {
		self.body.batch.enqueue(pending)
	}

	/// Runs `func` as a batch that is undone as a whole if it fails.
	pub(crate) fn transaction<R>(&self, func: impl FnOnce() -> Result<R>) -> Result<R> {
		self.body.batch.transaction(func)
	}

	pub(crate) fn record(&self, undo: Pending) {
		self.body.batch.record(undo)
	}

	pub(crate) fn same(&self, other: &Graph) -> bool {
		Arc::ptr_eq(&self.body, &other.body)
	}

	pub(crate) fn next_id(&self) -> NodeId {
		NodeId(self.body.next_id.fetch_add(1, Ordering::Relaxed))
	}

	/// Adds the edge `from -> to`, refusing anything that would give
	/// `from` a second outgoing edge or close a cycle.
	pub(crate) fn add_edge(&self, from: NodeId, to: NodeId) -> Result<()> {
		if from == to {
			return Err(Error::SelfLink);
		}

		let mut edges = self.body.edges.lock();
		if edges.contains_key(&from) {
			return Err(Error::AlreadyLinked);
		}

		let mut next = Some(to);
		while let Some(node) = next {
			if node == from {
				return Err(Error::Cycle);
			}
			next = edges.get(&node).copied();
		}

		edges.insert(from, to);
		Ok(())
	}

	pub(crate) fn remove_edge(&self, from: NodeId, to: NodeId) -> Result<()> {
		let mut edges = self.body.edges.lock();
		match edges.get(&from) {
			Some(target) if *target == to => {
				edges.remove(&from);
				Ok(())
			}
			_ => Err(Error::NotLinked),
		}
	}

	pub(crate) fn remove_node(&self, id: NodeId) {
		self.body.edges.lock().remove(&id);
	}
}

impl Debug for Graph {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Graph")
			.field("edges", &self.body.edges.lock().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_self_and_second_edges() {
		let graph = Graph::new();
		let (a, b, c) = (graph.next_id(), graph.next_id(), graph.next_id());

		assert_eq!(graph.add_edge(a, a), Err(Error::SelfLink));
		assert_eq!(graph.add_edge(a, b), Ok(()));
		assert_eq!(graph.add_edge(a, c), Err(Error::AlreadyLinked));
	}

	#[test]
	fn rejects_cycles_without_touching_edges() {
		let graph = Graph::new();
		let (a, b, c) = (graph.next_id(), graph.next_id(), graph.next_id());

		graph.add_edge(a, b).unwrap();
		graph.add_edge(b, c).unwrap();
		assert_eq!(graph.add_edge(c, a), Err(Error::Cycle));

		assert_eq!(graph.remove_edge(a, b), Ok(()));
		assert_eq!(graph.remove_edge(b, c), Ok(()));
		assert_eq!(graph.remove_edge(c, a), Err(Error::NotLinked));
	}

	#[test]
	fn removing_a_node_frees_its_edge() {
		let graph = Graph::new();
		let (a, b) = (graph.next_id(), graph.next_id());

		graph.add_edge(a, b).unwrap();
		graph.remove_node(a);
		assert_eq!(graph.remove_edge(a, b), Err(Error::NotLinked));
		assert_eq!(graph.add_edge(b, a), Ok(()));
	}
}

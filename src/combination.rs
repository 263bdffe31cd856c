use std::fmt::Debug;
use std::sync::{Arc, Weak};

use crate::state::{ObservableState, State};
use crate::{Derived, Error, Graph, Observer, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
	And,
	Or,
}

/// A state derived from a fixed list of sources.
///
/// `And` is active when every source is, `Or` when at least one is.
/// Both are inactive without sources. Listeners are notified once
/// per flip of the combined value.
#[derive(Clone)]
pub struct Combination {
	body: Arc<CombinationBody>,
}

struct CombinationBody {
	conjunction: Conjunction,
	sources: Vec<ObservableState>,
	state: State,
}

fn calculate(conjunction: Conjunction, sources: &[ObservableState]) -> bool {
	if sources.is_empty() {
		return false;
	}

	match conjunction {
		Conjunction::And => sources.iter().all(ObservableState::is),
		Conjunction::Or => sources.iter().any(ObservableState::is),
	}
}

impl Derived<bool> for CombinationBody {
	fn changed(&self, _: Option<&bool>, _: Option<&bool>) -> Result<()> {
		let value = calculate(self.conjunction, &self.sources);
		tracing::trace!(conjunction = ?self.conjunction, value, "recomputed");
		self.state.as_value().body.propagate(Some(value))
	}
}

impl Combination {
	pub(crate) fn new(graph: &Graph, conjunction: Conjunction, sources: Vec<ObservableState>) -> Result<Self> {
		if sources.iter().any(|source| !source.graph().same(graph)) {
			return Err(Error::ForeignGraph);
		}

		let _guard = graph.lock();
		let state = State::new(graph, calculate(conjunction, &sources));
		let body = Arc::new(CombinationBody {
			conjunction,
			sources,
			state,
		});
		for source in &body.sources {
			source
				.node()
				.body
				.add_derived(Arc::downgrade(&body) as Weak<dyn Derived<bool>>);
		}

		Ok(Combination { body })
	}

	pub fn conjunction(&self) -> Conjunction {
		self.body.conjunction
	}

	pub fn sources(&self) -> &[ObservableState] {
		&self.body.sources
	}

	pub fn is(&self) -> bool {
		self.body.state.is()
	}

	pub fn not(&self) -> ObservableState {
		self.observable().not()
	}

	pub fn observable(&self) -> ObservableState {
		ObservableState::anchored(&self.body.state, self.body.clone())
	}

	pub fn observer(&self) -> Observer<bool> {
		self.body.state.observer()
	}
}

impl From<&Combination> for ObservableState {
	fn from(combination: &Combination) -> Self {
		combination.observable()
	}
}

impl From<Combination> for ObservableState {
	fn from(combination: Combination) -> Self {
		combination.observable()
	}
}

impl Debug for Combination {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Combination")
			.field("conjunction", &self.body.conjunction)
			.field("sources", &self.body.sources.len())
			.field("is", &self.is())
			.finish()
	}
}

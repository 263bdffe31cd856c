use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use observe_value::{Conjunction, Error, Graph, State};


use mock::Spy;

#[test]
fn and_flips_once() {
	mock::tracing();
	let graph = Graph::new();
	let a = graph.state_of(true);
	let b = graph.state();

	let and = graph.and([&a, &b]).unwrap();
	assert!(!and.is());
	assert_eq!(and.conjunction(), Conjunction::And);
	assert_eq!(and.sources().len(), 2);

	let mock = mock::SharedMock::new();
	let _subscription = and.observer().subscribe({
		let mock = mock.clone();
		move || mock.get().notified()
	});
	mock.get().expect_notified().times(1).return_const(());

	b.set(true).unwrap();
	assert!(and.is());
	b.set(true).unwrap();

	mock.get().checkpoint();
}

#[test]
fn truth_tables() {
	let graph = Graph::new();
	let a = graph.state();
	let b = graph.state();
	let and = graph.and([&a, &b]).unwrap();
	let or = graph.or([&a, &b]).unwrap();

	for (x, y) in [(false, false), (false, true), (true, false), (true, true)] {
		a.set(x).unwrap();
		b.set(y).unwrap();
		assert_eq!(and.is(), x && y, "{} and {}", x, y);
		assert_eq!(or.is(), x || y, "{} or {}", x, y);
		assert_eq!(and.not().is(), !(x && y));
	}
}

#[test]
fn empty_combinations_are_inactive() {
	let graph = Graph::new();
	assert!(!graph.and(Vec::<State>::new()).unwrap().is());
	assert!(!graph.or(Vec::<State>::new()).unwrap().is());
}

#[test]
fn initial_value_is_computed() {
	let graph = Graph::new();
	let a = graph.state_of(true);
	let b = graph.state_of(true);

	let and = graph
		.combination(Conjunction::And, [&a, &b])
		.unwrap();
	assert!(and.is());
	assert!(!and.not().is());
}

#[test]
fn negation_notifies_after_the_combination() {
	let graph = Graph::new();
	let a = graph.state();
	let or = graph.or([&a]).unwrap();
	let not = or.not();
	let count = Arc::new(AtomicUsize::new(0));

	let _or = or.observer().subscribe({
		let count = count.clone();
		move || {
			assert_eq!(count.fetch_add(1, Ordering::SeqCst) % 2, 0);
		}
	});
	let _not = not.observer().subscribe({
		let count = count.clone();
		move || {
			assert_eq!(count.fetch_add(1, Ordering::SeqCst) % 2, 1);
		}
	});

	a.set(true).unwrap();
	assert!(!not.is());
	a.set(false).unwrap();
	assert!(not.is());
	assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[test]
fn negated_and_nested_sources() {
	let graph = Graph::new();
	let a = graph.state();
	let b = graph.state();
	let c = graph.state();

	// a and not b
	let only_a = graph.and([a.observable(), b.not()]).unwrap();
	// (a and not b) or c
	let any = graph.or([only_a.observable(), c.observable()]).unwrap();

	a.set(true).unwrap();
	assert!(only_a.is());
	assert!(any.is());

	b.set(true).unwrap();
	assert!(!only_a.is());
	assert!(!any.is());

	c.set(true).unwrap();
	assert!(any.is());
}

#[test]
fn same_state_twice() {
	let graph = Graph::new();
	let a = graph.state();
	let never = graph.and([a.observable(), a.not()]).unwrap();
	let always = graph.or([a.observable(), a.not()]).unwrap();

	for value in [true, false, true] {
		a.set(value).unwrap();
		assert!(!never.is());
		assert!(always.is());
	}
}

#[test]
fn facets_keep_the_combination_alive() {
	let graph = Graph::new();
	let a = graph.state();
	let b = graph.state();

	let facet = graph.and([&a, &b]).unwrap().not();
	assert!(facet.is());

	a.set(true).unwrap();
	b.set(true).unwrap();
	assert!(!facet.is());
}

#[test]
fn dropped_combination_stops_reacting() {
	let graph = Graph::new();
	let a = graph.state();
	drop(graph.or([&a]).unwrap());

	a.set(true).unwrap();
	assert!(a.is());
}

#[test]
fn states_of_other_graphs_are_rejected() {
	let graph = Graph::new();
	let other = Graph::new();
	let a = graph.state();
	let b = other.state();

	assert_eq!(graph.and([&a, &b]).err(), Some(Error::ForeignGraph));
}

#[test]
fn rejected_combination_push_undoes_the_set() {
	let graph = Graph::new();
	let a = graph.state_of(true);
	let b = graph.state();
	let and = graph.and([&a, &b]).unwrap();

	let guard = graph
		.builder::<bool>()
		.validator(|value| match value {
			Some(true) => Err(String::from("guarded")),
			_ => Ok(()),
		})
		.build_state()
		.unwrap();
	guard.link_observable(&and.observable()).unwrap();

	assert_eq!(b.set(true), Err(Error::Invalid(String::from("guarded"))));
	assert!(!b.is());
	assert!(!and.is());
	assert!(and.not().is());
	assert!(!guard.is());

	a.set(false).unwrap();
	b.set(true).unwrap();
	assert!(!and.is());
}

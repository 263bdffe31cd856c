use std::sync::Arc;

use observe_value::{Error, Graph, Notify, Validator};
use parking_lot::Mutex;


use mock::Spy;

#[test]
fn state_defaults_to_false() {
	let graph = Graph::new();
	let state = graph.state();
	assert!(!state.is());
	assert!(graph.state_of(true).is());

	state.toggle().unwrap();
	assert!(state.is());
	state.toggle().unwrap();
	assert!(!state.is());

	state.set(true).unwrap();
	state.clear().unwrap();
	assert!(!state.is());
	assert_eq!(state.as_value().get(), Some(false));
}

#[test]
fn negation_follows_its_state() {
	let graph = Graph::new();
	let state = graph.state();
	let not = state.not();
	assert!(not.is());

	state.set(true).unwrap();
	assert!(!not.is());
	assert!(state.is() != not.is());

	assert_eq!(state.not(), not);
	assert_eq!(not.not(), state.observable());
	assert_eq!(not.not().not(), not);
}

#[test]
fn negation_notifies_once_per_flip_after_its_state() {
	let graph = Graph::new();
	let state = graph.state();
	let order = Arc::new(Mutex::new(Vec::new()));

	let _state = state.observer().subscribe_consumer({
		let order = order.clone();
		move |value| order.lock().push(("state", value.copied()))
	});
	let _not = state.not().observer().subscribe_consumer({
		let order = order.clone();
		move |value| order.lock().push(("not", value.copied()))
	});

	state.set(true).unwrap();
	state.set(true).unwrap();
	state.set(false).unwrap();

	assert_eq!(
		*order.lock(),
		vec![
			("state", Some(true)),
			("not", Some(false)),
			("state", Some(false)),
			("not", Some(true)),
		]
	);
}

#[test]
fn observable_facet_reads_and_observes() {
	let graph = Graph::new();
	let state = graph.state();
	let observable = state.observable();

	let mock = mock::SharedMock::new();
	let _subscription = observable.observer().subscribe({
		let mock = mock.clone();
		move || mock.get().notified()
	});
	mock.get().expect_notified().times(1).return_const(());

	state.set(true).unwrap();
	assert!(observable.is());

	mock.get().checkpoint();
}

#[test]
fn linked_states() {
	let graph = Graph::new();
	let a = graph.state();
	let b = graph.state_of(true);

	a.link(&b).unwrap();
	assert!(a.is());

	a.set(false).unwrap();
	assert!(!b.is());
	assert_eq!(a.link(&b), Err(Error::AlreadyLinked));

	a.unlink(&b).unwrap();
	a.set(true).unwrap();
	assert!(!b.is());
}

#[test]
fn state_linked_to_a_negation() {
	let graph = Graph::new();
	let source = graph.state();
	let inverse = graph.state();

	inverse.link_observable(&source.not()).unwrap();
	assert!(inverse.is());

	source.set(true).unwrap();
	assert!(!inverse.is());

	// Nothing is pushed back into the negation.
	inverse.set(true).unwrap();
	assert!(source.is());
	assert!(!source.not().is());

	inverse.unlink_observable(&source.not()).unwrap();
	source.set(false).unwrap();
	assert!(inverse.is());
}

#[test]
fn locked_state() {
	let graph = Graph::new();
	let state = graph.builder::<bool>().locked(true).build_state().unwrap();
	assert!(!state.is());

	assert_eq!(state.set(true), Err(Error::Locked));
	assert_eq!(state.toggle(), Err(Error::Locked));

	state.locked().set(false).unwrap();
	state.toggle().unwrap();
	assert!(state.is());
}

#[test]
fn state_validators() {
	let graph = Graph::new();
	let state = graph.state();
	let never: Validator<bool> = Arc::new(|value: Option<&bool>| match value {
		Some(true) => Err(String::from("never true")),
		_ => Ok(()),
	});

	assert_eq!(state.add_validator(&never), Ok(true));
	assert_eq!(
		state.set(true),
		Err(Error::Invalid(String::from("never true")))
	);
	assert!(!state.is());
	assert!(state.not().is());

	assert!(state.remove_validator(&never));
	state.set(true).unwrap();
	assert!(!state.not().is());
}

#[test]
fn builder_state_uses_the_builder_surface() {
	let graph = Graph::new();
	let mock = mock::SharedMock::new();

	let state = graph
		.builder::<bool>()
		.value(true)
		.when_equal(false, {
			let mock = mock.clone();
			move || mock.get().named("off")
		})
		.build_state()
		.unwrap();
	assert!(state.is());

	mock.get()
		.expect_named()
		.withf(|name| name == "off")
		.times(1)
		.return_const(());
	state.toggle().unwrap();
	state.toggle().unwrap();

	mock.get().checkpoint();
}

#[test]
fn rejected_negation_push_undoes_the_set() {
	let graph = Graph::new();
	let a = graph.state();
	let b = graph
		.builder::<bool>()
		.value(true)
		.validator(|value| match value {
			Some(false) => Err(String::from("no")),
			_ => Ok(()),
		})
		.build_state()
		.unwrap();
	b.link_observable(&a.not()).unwrap();
	assert!(b.is());

	let mock = mock::SharedMock::new();
	let _a = a.observer().subscribe({
		let mock = mock.clone();
		move || mock.get().named("a")
	});
	let _not = a.not().observer().subscribe({
		let mock = mock.clone();
		move || mock.get().named("not")
	});
	mock.get().expect_named().times(0).return_const(());

	assert_eq!(a.set(true), Err(Error::Invalid(String::from("no"))));
	assert!(!a.is());
	assert!(a.not().is());
	assert!(b.is());

	mock.get().checkpoint();
}

#[test]
fn negation_follows_the_notify_policy() {
	let graph = Graph::new();
	let state = graph
		.builder::<bool>()
		.notify(Notify::Set)
		.build_state()
		.unwrap();

	let mock = mock::SharedMock::new();
	let _not = state.not().observer().subscribe({
		let mock = mock.clone();
		move || mock.get().notified()
	});
	mock.get().expect_notified().times(2).return_const(());

	state.set(true).unwrap();
	state.set(true).unwrap();
	assert!(!state.not().is());

	mock.get().checkpoint();
}

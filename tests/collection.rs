use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use observe_value::{Graph, Kind, Subscription, ValueCollection};
use parking_lot::Mutex;


fn count(values: &ValueCollection<i64>) -> (Arc<AtomicUsize>, Subscription) {
	let count = Arc::new(AtomicUsize::new(0));
	let subscription = values.observer().subscribe({
		let count = count.clone();
		move || {
			count.fetch_add(1, Ordering::SeqCst);
		}
	});
	(count, subscription)
}

#[test]
fn list_mutators_report_changes() {
	mock::tracing();
	let graph = Graph::new();
	let list = graph.value_list::<i64>();
	assert_eq!(list.kind(), Kind::List);
	assert!(list.is_empty());
	let (count, _subscription) = count(&list);

	assert_eq!(list.add(1), Ok(true));
	assert_eq!(list.add(1), Ok(true));
	assert_eq!(list.get(), vec![1, 1]);

	assert_eq!(list.add_all([3, 2]), Ok(true));
	assert_eq!(list.len(), 4);
	assert!(list.contains(&3));
	assert_eq!(count.load(Ordering::SeqCst), 3);

	assert_eq!(list.remove(&1), Ok(true));
	assert_eq!(list.get(), vec![1, 3, 2]);
	assert_eq!(list.remove(&7), Ok(false));
	assert_eq!(count.load(Ordering::SeqCst), 4);

	assert_eq!(list.sort(), Ok(true));
	assert_eq!(list.get(), vec![1, 2, 3]);
	assert_eq!(list.sort(), Ok(false));
	assert_eq!(list.sort_by(|a, b| b.cmp(a)), Ok(true));
	assert_eq!(list.get(), vec![3, 2, 1]);
	assert_eq!(count.load(Ordering::SeqCst), 6);

	assert_eq!(list.remove_all(&[1, 3]), Ok(true));
	assert_eq!(list.get(), vec![2]);

	assert_eq!(list.clear(), Ok(true));
	assert_eq!(list.clear(), Ok(false));
	assert_eq!(count.load(Ordering::SeqCst), 8);
}

#[test]
fn bulk_mutators_notify_once() {
	let graph = Graph::new();
	let list = graph.value_list_of([5, 4, 3]);
	let (count, _subscription) = count(&list);

	list.set([1, 2, 3, 4, 5]).unwrap();
	list.remove_all(&[1, 2, 3]).unwrap();
	list.add_all([9, 8, 7]).unwrap();
	list.sort().unwrap();

	assert_eq!(list.get(), vec![4, 5, 7, 8, 9]);
	assert_eq!(count.load(Ordering::SeqCst), 4);

	assert_eq!(list.set([4, 5, 7, 8, 9]), Ok(false));
	assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[test]
fn sets_keep_insertion_order_without_duplicates() {
	let graph = Graph::new();
	let set = graph.value_set_of([3, 1, 3, 2]);
	assert_eq!(set.kind(), Kind::Set);
	assert_eq!(set.get(), vec![3, 1, 2]);

	assert_eq!(set.add(1), Ok(false));
	assert_eq!(set.add_all([2, 4, 4]), Ok(true));
	assert_eq!(set.get(), vec![3, 1, 2, 4]);

	assert_eq!(set.set([5, 5, 6]), Ok(true));
	assert_eq!(set.get(), vec![5, 6]);
	assert!(graph.value_set::<i64>().is_empty());
}

#[test]
fn scalar_view_follows_the_first_element() {
	let graph = Graph::new();
	let list = graph.value_list_of([4, 5]);
	let value = list.value();
	assert_eq!(value.get(), Some(4));

	list.remove(&4).unwrap();
	assert_eq!(value.get(), Some(5));

	list.clear().unwrap();
	assert!(value.is_null());

	list.add(7).unwrap();
	assert_eq!(value.get(), Some(7));
}

#[test]
fn setting_the_scalar_view_replaces_the_collection() {
	let graph = Graph::new();
	let list = graph.value_list_of([1, 2, 3]);
	let (count, _subscription) = count(&list);

	list.value().set(9).unwrap();
	assert_eq!(list.get(), vec![9]);

	list.value().clear().unwrap();
	assert!(list.is_empty());
	assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn scalar_view_notifies_on_its_own_changes() {
	let graph = Graph::new();
	let list = graph.value_list::<i64>();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let _subscription = list.value().observer().subscribe_consumer({
		let seen = seen.clone();
		move |value| seen.lock().push(value.copied())
	});

	list.add(1).unwrap();
	list.add(2).unwrap();
	list.remove(&1).unwrap();
	list.clear().unwrap();

	assert_eq!(*seen.lock(), vec![Some(1), Some(2), None]);
}

#[test]
fn consumers_see_the_whole_collection() {
	let graph = Graph::new();
	let list = graph.value_list::<String>();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let _subscription = list.observer().subscribe_consumer({
		let seen = seen.clone();
		move |values: Option<&Vec<String>>| {
			seen.lock().push(values.cloned().unwrap_or_default())
		}
	});

	list.add_all([String::from("a"), String::from("b")]).unwrap();
	assert_eq!(
		list.observable().get(),
		Some(vec![String::from("a"), String::from("b")])
	);
	assert_eq!(*seen.lock(), vec![vec![String::from("a"), String::from("b")]]);
}

#[test]
fn rejected_scalar_view_keeps_the_collection() {
	let graph = Graph::new();
	let list = graph.value_list::<i64>();
	let small: observe_value::Validator<i64> = Arc::new(|value: Option<&i64>| match value {
		Some(value) if *value > 10 => Err(String::from("big")),
		_ => Ok(()),
	});
	list.value().add_validator(&small).unwrap();
	let (count, _subscription) = count(&list);

	assert_eq!(
		list.add(42),
		Err(observe_value::Error::Invalid(String::from("big")))
	);
	assert!(list.is_empty());
	assert!(list.value().is_null());
	assert_eq!(count.load(Ordering::SeqCst), 0);

	assert_eq!(list.add_all([1, 42]), Ok(true));
	assert_eq!(list.get(), vec![1, 42]);
	assert_eq!(list.value().get(), Some(1));
}

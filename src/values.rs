use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use crate::value::ValueBody;
use crate::{Data, Derived, Graph, Notify, Observable, Observer, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
	/// Ordered, duplicates allowed.
	List,
	/// Insertion ordered, without duplicates.
	Set,
}

/// An observable collection with a scalar view of its first element.
///
/// Every mutator notifies at most once and reports whether the
/// collection changed. Setting the scalar view replaces the collection
/// with that single element, clearing it empties the collection.
#[derive(Clone)]
pub struct ValueCollection<T: Data> {
	body: Arc<CollectionBody<T>>,
}

struct CollectionBody<T: Data> {
	kind: Kind,
	mirror: Arc<Mirror<T>>,
	_hooks: (Arc<ValuesChanged<T>>, Arc<ValueChanged<T>>),
}

/// Keeps the collection and its scalar view in step, without
/// bouncing a change back to where it came from.
struct Mirror<T: Data> {
	values: Value<Vec<T>>,
	value: Value<T>,
	syncing: AtomicBool,
}

impl<T: Data> Mirror<T> {
	fn guarded(&self, func: impl FnOnce() -> Result<()>) -> Result<()> {
		if self.syncing.swap(true, AtomicOrdering::AcqRel) {
			return Ok(());
		}
		let result = func();
		self.syncing.store(false, AtomicOrdering::Release);
		result
	}
}

struct ValuesChanged<T: Data>(Arc<Mirror<T>>);

impl<T: Data> Derived<Vec<T>> for ValuesChanged<T> {
	fn changed(&self, _: Option<&Vec<T>>, current: Option<&Vec<T>>) -> Result<()> {
		let first = current.and_then(|values| values.first().cloned());
		self.0.guarded(|| self.0.value.set(first))
	}
}

struct ValueChanged<T: Data>(Arc<Mirror<T>>);

impl<T: Data> Derived<T> for ValueChanged<T> {
	fn changed(&self, _: Option<&T>, current: Option<&T>) -> Result<()> {
		let values: Vec<T> = current.cloned().into_iter().collect();
		self.0.guarded(|| self.0.values.set(values))
	}
}

fn insert<T: PartialEq>(kind: Kind, values: &mut Vec<T>, value: T) {
	if kind == Kind::List || !values.contains(&value) {
		values.push(value);
	}
}

impl<T: Data> ValueCollection<T> {
	pub(crate) fn new(graph: &Graph, kind: Kind, initial: Vec<T>) -> Self {
		let mut values = Vec::with_capacity(initial.len());
		for value in initial {
			insert(kind, &mut values, value);
		}
		let first = values.first().cloned();

		let mirror = Arc::new(Mirror {
			values: Value {
				body: ValueBody::new(graph, Some(values), Some(Vec::new()), Notify::Changed),
			},
			value: Value {
				body: ValueBody::new(graph, first, None, Notify::Changed),
			},
			syncing: AtomicBool::new(false),
		});

		let values_changed = Arc::new(ValuesChanged(mirror.clone()));
		let value_changed = Arc::new(ValueChanged(mirror.clone()));
		mirror.values
			.body
			.add_derived(Arc::downgrade(&values_changed) as Weak<dyn Derived<Vec<T>>>);
		mirror.value
			.body
			.add_derived(Arc::downgrade(&value_changed) as Weak<dyn Derived<T>>);

		ValueCollection {
			body: Arc::new(CollectionBody {
				kind,
				mirror,
				_hooks: (values_changed, value_changed),
			}),
		}
	}

	pub fn kind(&self) -> Kind {
		self.body.kind
	}

	pub fn get(&self) -> Vec<T> {
		self.body.mirror.values.get().unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.get().len()
	}

	pub fn is_empty(&self) -> bool {
		self.get().is_empty()
	}

	pub fn contains(&self, value: &T) -> bool {
		self.get().contains(value)
	}

	pub fn add(&self, value: T) -> Result<bool> {
		let kind = self.body.kind;
		self.update(|values| insert(kind, values, value))
	}

	pub fn add_all(&self, values: impl IntoIterator<Item = T>) -> Result<bool> {
		let kind = self.body.kind;
		self.update(|current| {
			for value in values {
				insert(kind, current, value);
			}
		})
	}

	/// Removes the first occurrence of `value`.
	pub fn remove(&self, value: &T) -> Result<bool> {
		self.update(|values| {
			if let Some(index) = values.iter().position(|item| item == value) {
				values.remove(index);
			}
		})
	}

	/// Removes every occurrence of each of `values`.
	pub fn remove_all<'a>(&self, values: impl IntoIterator<Item = &'a T>) -> Result<bool> {
		let removed: Vec<&T> = values.into_iter().collect();
		self.update(|current| current.retain(|item| !removed.contains(&item)))
	}

	/// Replaces the whole collection.
	pub fn set(&self, values: impl IntoIterator<Item = T>) -> Result<bool> {
		let kind = self.body.kind;
		self.update(|current| {
			current.clear();
			for value in values {
				insert(kind, current, value);
			}
		})
	}

	pub fn clear(&self) -> Result<bool> {
		self.update(Vec::clear)
	}

	pub fn sort(&self) -> Result<bool>
	where
		T: Ord,
	{
		self.update(|values| values.sort())
	}

	pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) -> Result<bool> {
		self.update(|values| values.sort_by(compare))
	}

	/// Scalar view, holding the first element or nothing when empty.
	pub fn value(&self) -> Value<T> {
		self.body.mirror.value.clone()
	}

	pub fn observable(&self) -> Observable<Vec<T>> {
		self.body.mirror.values.observable()
	}

	pub fn observer(&self) -> Observer<Vec<T>> {
		self.body.mirror.values.observer()
	}

	fn update(&self, func: impl FnOnce(&mut Vec<T>)) -> Result<bool> {
		let values = &self.body.mirror.values;
		values.graph().batch(|| {
			let current = self.get();
			let mut next = current.clone();
			func(&mut next);
			if next == current {
				return Ok(false);
			}
			values.set(next)?;
			Ok(true)
		})
	}
}

impl<T: Data + Debug> Debug for ValueCollection<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ValueCollection")
			.field("kind", &self.body.kind)
			.field("values", &self.get())
			.finish()
	}
}

use std::cell::RefCell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

pub(crate) type Pending = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub(crate) struct Batch {
	depth: usize,
	pending: Vec<Pending>,
	/// Undo steps of the commits made since the outermost batch began.
	journal: Vec<Pending>,
}

/// The critical section of a graph. Reentrant, so listeners may
/// call back into the graph they are notified from.
#[derive(Default)]
pub(crate) struct BatchLock {
	lock: ReentrantMutex<RefCell<Batch>>,
}

impl BatchLock {
	pub fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<Batch>> {
		self.lock.lock()
	}

	pub fn in_batch(&self) -> bool {
		self.lock.lock().borrow().depth > 0
	}

	pub fn batch<R>(&self, func: impl FnOnce() -> R) -> R {
		let guard = self.lock.lock();
		guard.borrow_mut().depth += 1;
		let result = func();
		let (is_root, journal) = {
			let mut batch = guard.borrow_mut();
			batch.depth -= 1;
			if batch.depth == 0 {
				(true, std::mem::take(&mut batch.journal))
			} else {
				(false, Vec::new())
			}
		};
		drop(journal);
		if is_root {
			batch_run(&guard);
		}
		result
	}

	/// Runs `func` in a batch. If it fails, every commit it recorded is
	/// undone and the notifications it queued are dropped.
	pub fn transaction<R, E>(&self, func: impl FnOnce() -> Result<R, E>) -> Result<R, E> {
		self.batch(|| {
			let guard = self.lock.lock();
			let (pending, journal) = {
				let batch = guard.borrow();
				(batch.pending.len(), batch.journal.len())
			};

			let result = func();
			if result.is_err() {
				let (dropped, undo) = {
					let mut batch = guard.borrow_mut();
					(
						batch.pending.split_off(pending),
						batch.journal.split_off(journal),
					)
				};
				for step in undo.into_iter().rev() {
					step();
				}
				drop(dropped);
			}
			result
		})
	}

	pub fn record(&self, undo: Pending) {
		let guard = self.lock.lock();
		let mut batch = guard.borrow_mut();
		debug_assert!(batch.depth > 0, "commit recorded outside of a batch");
		batch.journal.push(undo);
	}

	pub fn enqueue(&self, pending: Pending) {
		let guard = self.lock.lock();
		let mut batch = guard.borrow_mut();
		debug_assert!(batch.depth > 0, "notification queued outside of a batch");
		batch.pending.push(pending);
	}
}

fn batch_run(batch: &RefCell<Batch>) {
	loop {
		let pending = std::mem::take(&mut batch.borrow_mut().pending);
		if pending.is_empty() {
			break;
		}

		for notify in pending {
			notify();
		}
	}
}

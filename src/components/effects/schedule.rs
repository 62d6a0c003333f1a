//! Virtual-time delayed-task queue.
//!
//! Every timer on the page is a task in one [`Scheduler`]. The host only moves
//! the clock forward; the scheduler hands back tasks in due order, advancing its
//! own notion of "now" to each task's due time so that work scheduled while
//! handling a task is measured from the moment that task was meant to fire.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Milliseconds on the scheduler clock.
pub type Millis = u64;

/// Shortest repeat interval a self-rescheduling timer may use. A zero delay
/// would keep a task due forever and starve the frame.
pub const MIN_INTERVAL: Millis = 1;

/// Handle for cancelling a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// A task together with how long to wait before running it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deferred<T> {
	pub delay: Millis,
	pub task: T,
}

impl<T> Deferred<T> {
	pub fn new(delay: Millis, task: T) -> Self {
		Self { delay, task }
	}

	/// Wrap the task in a wider task type.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Deferred<U> {
		Deferred {
			delay: self.delay,
			task: f(self.task),
		}
	}
}

/// Min-heap of pending tasks keyed by `(due, id)`.
///
/// Ids are handed out monotonically, so tasks due at the same instant run in
/// the order they were scheduled. Cancelled tasks are dropped from the task map
/// and their heap entries are skipped lazily.
#[derive(Debug)]
pub struct Scheduler<T> {
	now: Millis,
	next_id: u64,
	queue: BinaryHeap<Reverse<(Millis, TaskId)>>,
	tasks: HashMap<TaskId, T>,
}

impl<T> Default for Scheduler<T> {
	fn default() -> Self {
		Self {
			now: 0,
			next_id: 0,
			queue: BinaryHeap::new(),
			tasks: HashMap::new(),
		}
	}
}

impl<T> Scheduler<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Current scheduler time.
	pub fn now(&self) -> Millis {
		self.now
	}

	/// Number of tasks still waiting to run.
	pub fn pending(&self) -> usize {
		self.tasks.len()
	}

	pub fn schedule_in(&mut self, delay: Millis, task: T) -> TaskId {
		let id = TaskId(self.next_id);
		self.next_id += 1;
		self.queue.push(Reverse((self.now.saturating_add(delay), id)));
		self.tasks.insert(id, task);
		id
	}

	pub fn schedule(&mut self, deferred: Deferred<T>) -> TaskId {
		self.schedule_in(deferred.delay, deferred.task)
	}

	/// Returns false if the task already ran or was cancelled.
	pub fn cancel(&mut self, id: TaskId) -> bool {
		self.tasks.remove(&id).is_some()
	}

	/// Pop the earliest task due at or before `until`, moving the clock to its
	/// due time.
	pub fn pop_due(&mut self, until: Millis) -> Option<T> {
		while let Some(&Reverse((due, id))) = self.queue.peek() {
			if due > until {
				break;
			}
			self.queue.pop();
			if let Some(task) = self.tasks.remove(&id) {
				self.now = self.now.max(due);
				return Some(task);
			}
		}
		None
	}

	/// Push the clock and every pending task forward by `by`, keeping their
	/// relative timing. The skipped stretch never runs.
	pub fn skip(&mut self, by: Millis) {
		if by == 0 {
			return;
		}
		let tasks = &self.tasks;
		let shifted: BinaryHeap<_> = self
			.queue
			.drain()
			.filter(|Reverse((_, id))| tasks.contains_key(id))
			.map(|Reverse((due, id))| Reverse((due.saturating_add(by), id)))
			.collect();
		self.queue = shifted;
		self.now = self.now.saturating_add(by);
	}

	/// Move the clock to `until` once every due task has been drained.
	pub fn settle(&mut self, until: Millis) {
		self.now = self.now.max(until);
	}
}

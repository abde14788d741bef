//! The event queue. Any `O(log n)` insert/extract-min structure suffices —
//! the scheduler only needs push/pop-min/peek-min — so that choice is
//! exposed as a trait, with one implementation backed by a splay tree.

use crate::event::{Event, EventKey};
use crate::trees::splay_tree::SplayTree;

/// A priority structure keyed by `(time, seq)` giving efficient insert and
/// extract-min. Implementations are swappable without touching the
/// scheduler.
pub trait EventQueue {
	fn push(&mut self, event: Event);
	fn pop_min(&mut self) -> Option<Event>;
	fn peek_min_key(&self) -> Option<EventKey>;
	fn is_empty(&self) -> bool;
	fn len(&self) -> usize;
}

/// Splay-tree-backed event queue.
pub struct SplayEventQueue {
	tree: SplayTree<EventKey, Event>,
	len: usize,
}

impl SplayEventQueue {
	#[must_use]
	pub fn new() -> Self {
		Self { tree: SplayTree::new(), len: 0 }
	}
}

impl Default for SplayEventQueue {
	fn default() -> Self {
		Self::new()
	}
}

impl EventQueue for SplayEventQueue {
	fn push(&mut self, event: Event) {
		let key = event.key;
		self.tree.insert(key, event);
		self.len += 1;
	}

	fn pop_min(&mut self) -> Option<Event> {
		let (_, event) = self.tree.remove_min()?;
		self.len -= 1;
		Some(event)
	}

	fn peek_min_key(&self) -> Option<EventKey> {
		self.tree.get_min().map(|(k, _)| *k)
	}

	fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	fn len(&self) -> usize {
		self.len
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dispatch::RESUME_ORDINAL;
	use crate::event::ContId;

	fn dummy_event(time: u64, seq: u64) -> Event {
		Event {
			key: EventKey { time, seq },
			target: None,
			ordinal: RESUME_ORDINAL,
			args: Vec::new(),
			body_id: ContId(0),
			continuation: None,
			resume_payload: None,
			caller: None,
			signature: "<test>",
			backtrace: None,
		}
	}

	#[test]
	fn pops_in_ascending_time_then_seq_order() {
		let mut q = SplayEventQueue::new();
		q.push(dummy_event(5, 0));
		q.push(dummy_event(1, 2));
		q.push(dummy_event(1, 1));
		q.push(dummy_event(3, 0));

		let order: Vec<_> = std::iter::from_fn(|| q.pop_min()).map(|e| (e.key.time, e.key.seq)).collect();
		assert_eq!(order, vec![(1, 1), (1, 2), (3, 0), (5, 0)]);
	}

	#[test]
	fn peek_does_not_remove() {
		let mut q = SplayEventQueue::new();
		q.push(dummy_event(2, 0));
		assert_eq!(q.peek_min_key(), Some(EventKey { time: 2, seq: 0 }));
		assert_eq!(q.len(), 1);
	}

	#[test]
	fn empty_queue_pops_none() {
		let mut q = SplayEventQueue::new();
		assert!(q.is_empty());
		assert!(q.pop_min().is_none());
	}
}

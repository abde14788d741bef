//! The event record.

use crate::dispatch::{Entity, RESUME_ORDINAL};
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a user entity. Entities are owned by user code; the
/// kernel only ever holds a borrowed/shared reference inside events. Not
/// `Send`/`Sync` — the scheduler is single-threaded by design.
pub type EntityRef = Rc<dyn Entity>;

/// Identifies a parked continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContId(pub u64);

/// `(time, seq)` — the event queue's ordering key. Tuple `Ord` gives
/// exactly the ascending `(time, seq)` lexicographic order dispatch
/// requires, with `seq` breaking same-time ties FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKey {
	pub time: u64,
	pub seq: u64,
}

/// A scheduled invocation, or a resumption of a previously parked
/// continuation.
pub struct Event {
	pub key: EventKey,
	/// `None` only for the synthetic resume events (sleep timers,
	/// `post_continuing` completions, channel rendezvous) — those act
	/// directly on a [`ContId`], never through `Entity::invoke`.
	pub target: Option<EntityRef>,
	pub ordinal: u32,
	pub args: Vec<Value>,
	/// The id the dispatched body runs under: for an invocation, the id
	/// minted when this event was enqueued (so callers that parked on
	/// `post_continuing` register under the very id the body will later
	/// run as); for a resume, simply echoes `continuation`.
	pub body_id: ContId,
	/// Present iff this event is a resumption: which parked continuation
	/// to feed `resume_payload` into.
	pub continuation: Option<ContId>,
	/// Type-erased payload delivered to a resumed continuation. Only
	/// meaningful when `continuation.is_some()`.
	pub resume_payload: Option<Box<dyn Any>>,
	/// Set iff `track_event_sources` is enabled: the event whose body
	/// posted this one. Diagnostics only — must never affect ordering.
	pub caller: Option<Rc<Event>>,
	pub signature: &'static str,
	/// Captured creation-site backtrace when `debug_events` is enabled.
	pub backtrace: Option<std::backtrace::Backtrace>,
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("key", &self.key)
			.field("ordinal", &self.ordinal)
			.field("continuation", &self.continuation)
			.field("signature", &self.signature)
			.field("has_caller", &self.caller.is_some())
			.finish()
	}
}

impl Event {
	#[must_use]
	pub const fn is_resume(&self) -> bool {
		self.continuation.is_some()
	}

	pub(crate) fn resume(key: EventKey, continuation: ContId, payload: Box<dyn Any>, caller: Option<Rc<Event>>, debug: bool) -> Self {
		Self {
			key,
			target: None,
			ordinal: RESUME_ORDINAL,
			args: Vec::new(),
			body_id: continuation,
			continuation: Some(continuation),
			resume_payload: Some(payload),
			caller,
			signature: "<resume>",
			backtrace: if debug { Some(std::backtrace::Backtrace::capture()) } else { None },
		}
	}

	#[allow(clippy::too_many_arguments)]
	pub(crate) fn invocation(key: EventKey, body_id: ContId, target: EntityRef, ordinal: u32, args: Vec<Value>, signature: &'static str, caller: Option<Rc<Event>>, debug: bool) -> Self {
		Self {
			key,
			target: Some(target),
			ordinal,
			args,
			body_id,
			continuation: None,
			resume_payload: None,
			caller,
			signature,
			backtrace: if debug { Some(std::backtrace::Backtrace::capture()) } else { None },
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn event_key_orders_by_time_then_seq() {
		let a = EventKey { time: 1, seq: 5 };
		let b = EventKey { time: 1, seq: 6 };
		let c = EventKey { time: 2, seq: 0 };
		assert!(a < b);
		assert!(b < c);
	}

	#[test]
	fn resume_event_has_no_target() {
		let e = Event::resume(EventKey { time: 0, seq: 0 }, ContId(1), Box::new(()), None, false);
		assert!(e.target.is_none());
		assert!(e.is_resume());
		assert_eq!(e.ordinal, RESUME_ORDINAL);
	}
}

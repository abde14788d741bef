//! The scheduler core. Owns the virtual clock and the event queue, and
//! implements the single dispatch loop: pop the
//! earliest event, advance the clock to its time, hand it to the right
//! entity (or resume the right parked continuation), and repeat.
//!
//! Single-threaded and reentrant-unsafe by design: at most one
//! event body is ever executing, and `run()` refuses to be called while
//! already running.

use crate::clock::VirtualClock;
use crate::config::SchedulerConfig;
use crate::continuation::{ParkedBody, WakeRequest};
use crate::dispatch::BoxEventFuture;
use crate::error::KernelError;
use crate::event::{ContId, EntityRef, Event, EventKey};
use crate::queue::{EventQueue, SplayEventQueue};
use crate::report::Report;
use crate::value::Value;
use futures::task::noop_waker;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::task::{Context as TaskContext, Poll};
use tracing::{debug, trace, warn};

/// The outcome of a completed `run()` call, none of which are errors: queue
/// exhaustion, the configured end time, and a requested stop are all
/// ordinary ways for a run to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
	QueueExhausted,
	EndTimeReached,
	EndedByRequest,
}

enum StepOutcome {
	Dispatched,
	QueueExhausted,
	EndTimeReached,
	EndedByRequest,
}

struct Inner {
	clock: VirtualClock,
	start_time: u64,
	end_time: u64,
	running: bool,
	seq_counter: u64,
	next_cont_id: u64,
	queue: Box<dyn EventQueue>,
	current: Option<Rc<Event>>,
	parked: HashMap<ContId, ParkedBody>,
	/// Maps a callee's continuation id to the caller waiting on its
	/// completion (see `post_continuing`).
	body_callers: HashMap<ContId, ContId>,
	pending_wake: Option<WakeRequest>,
	resume_payload: Option<Box<dyn Any>>,
	spectrum: HashMap<&'static str, u64>,
	total_events: u64,
	track_spectrum: bool,
	track_event_sources: bool,
	debug_events: bool,
	end_requested: bool,
	name: String,
}

impl Inner {
	fn next_seq(&mut self) -> u64 {
		let seq = self.seq_counter;
		self.seq_counter += 1;
		seq
	}

	fn next_cont_id(&mut self) -> ContId {
		let id = self.next_cont_id;
		self.next_cont_id += 1;
		ContId(id)
	}
}

/// The scheduler. Held behind `Rc` so it can be
/// installed as the thread's ambient "current" controller ([`crate::context`])
/// while entity bodies hold their own clones.
pub struct Scheduler {
	inner: RefCell<Inner>,
}

impl Scheduler {
	/// Builds a fresh scheduler from `config`. Does not install it as the
	/// ambient current controller — call [`crate::context::install_as_current`]
	/// separately.
	#[must_use]
	pub fn new(config: SchedulerConfig) -> Rc<Self> {
		let inner = Inner {
			clock: VirtualClock::new(config.start_time),
			start_time: config.start_time,
			end_time: config.end_time,
			running: false,
			seq_counter: 0,
			next_cont_id: 0,
			queue: Box::new(SplayEventQueue::new()),
			current: None,
			parked: HashMap::new(),
			body_callers: HashMap::new(),
			pending_wake: None,
			resume_payload: None,
			spectrum: HashMap::new(),
			total_events: 0,
			track_spectrum: config.track_spectrum,
			track_event_sources: config.track_event_sources,
			debug_events: config.debug_events,
			end_requested: false,
			name: config.name,
		};
		Rc::new(Self { inner: RefCell::new(inner) })
	}

	#[must_use]
	pub fn now(&self) -> u64 {
		self.inner.borrow().clock.now()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.inner.borrow().queue.is_empty()
	}

	#[must_use]
	pub fn pending_count(&self) -> usize {
		let inner = self.inner.borrow();
		inner.queue.len() + inner.parked.len()
	}

	/// The virtual time of the next queued event, if any. Used by
	/// [`crate::controller::RealTimeController`] to pace wall-clock sleeps.
	#[must_use]
	pub fn peek_next_time(&self) -> Option<u64> {
		self.inner.borrow().queue.peek_min_key().map(|k| k.time)
	}

	/// The event currently being dispatched, if any. `None` outside of a
	/// `run()`/`step_one()` call.
	#[must_use]
	pub fn current_event(&self) -> Option<Rc<Event>> {
		self.inner.borrow().current.clone()
	}

	/// Swaps in `new_caller` as the "current" event for the duration of the
	/// caller's choosing, returning whatever was current before. Paired
	/// calls let channel rendezvous attribute a resumed party's `caller` to
	/// its rendezvous partner rather than whatever last posted an event
	/// (used by channel rendezvous).
	pub fn swap_caller(&self, new_caller: Option<Rc<Event>>) -> Option<Rc<Event>> {
		std::mem::replace(&mut self.inner.borrow_mut().current, new_caller)
	}

	/// Requests that `run()`/`step_one()` stop after the event currently in
	/// flight finishes. Idempotent.
	pub fn end_simulation(&self) {
		debug!(scheduler = %self.inner.borrow().name, "end_simulation requested");
		self.inner.borrow_mut().end_requested = true;
	}

	pub(crate) fn check_not_ended(&self) -> Result<(), KernelError> {
		if self.inner.borrow().end_requested {
			Err(KernelError::EndedByRequest)
		} else {
			Ok(())
		}
	}

	pub(crate) fn set_pending_wake(&self, req: WakeRequest) {
		self.inner.borrow_mut().pending_wake = Some(req);
	}

	pub(crate) fn take_resume_payload<T: 'static>(&self) -> Result<T, KernelError> {
		let boxed = self
			.inner
			.borrow_mut()
			.resume_payload
			.take()
			.ok_or_else(|| KernelError::ContinuationMisuse("resume point reached with no pending payload".into()))?;
		boxed.downcast::<T>().map(|b| *b).map_err(|_| KernelError::ContinuationMisuse("resume payload type mismatch".into()))
	}

	/// Schedules an immediate (current-time) resume of `cont_id` carrying
	/// `payload`. Used by channel rendezvous to wake the partner it just
	/// matched with.
	pub(crate) fn resume_now(&self, cont_id: ContId, payload: Box<dyn Any>) {
		let now = self.inner.borrow().clock.now();
		self.enqueue_resume(cont_id, now, payload);
	}

	fn enqueue_resume(&self, cont_id: ContId, time: u64, payload: Box<dyn Any>) {
		let mut inner = self.inner.borrow_mut();
		let seq = inner.next_seq();
		let caller = if inner.track_event_sources { inner.current.clone() } else { None };
		let debug = inner.debug_events;
		let event = Event::resume(EventKey { time, seq }, cont_id, payload, caller, debug);
		inner.queue.push(event);
	}

	fn enqueue_invocation(&self, time: u64, target: EntityRef, ordinal: u32, args: Vec<Value>, caller: Option<Rc<Event>>) -> Result<ContId, KernelError> {
		let mut inner = self.inner.borrow_mut();
		let now = inner.clock.now();
		if time < now {
			return Err(KernelError::ClockReversal { current: now, attempted: time });
		}
		let seq = inner.next_seq();
		let body_id = inner.next_cont_id();
		let signature = target.signature_for(ordinal);
		let debug = inner.debug_events;
		let event = Event::invocation(EventKey { time, seq }, body_id, target, ordinal, args, signature, caller, debug);
		inner.queue.push(event);
		Ok(body_id)
	}

	/// Posts a fire-and-forget invocation of `target`, scheduled at `time`
	/// (defaulting to the current time).
	///
	/// # Errors
	/// [`KernelError::ClockReversal`] if `time` precedes the current clock,
	/// or [`KernelError::EndedByRequest`] if the run has already been asked
	/// to end.
	pub fn post_event(&self, time: Option<u64>, target: EntityRef, ordinal: u32, args: Vec<Value>) -> Result<(), KernelError> {
		self.check_not_ended()?;
		let now = self.inner.borrow().clock.now();
		let t = time.unwrap_or(now);
		let caller = if self.inner.borrow().track_event_sources { self.inner.borrow().current.clone() } else { None };
		self.enqueue_invocation(t, target, ordinal, args, caller).map(|_| ())
	}

	fn drive(&self, mut fut: BoxEventFuture, body_id: ContId) -> Result<(), KernelError> {
		let waker = noop_waker();
		let mut cx = TaskContext::from_waker(&waker);
		match fut.as_mut().poll(&mut cx) {
			Poll::Ready(result) => self.on_body_complete(body_id, result),
			Poll::Pending => {
				let req = self
					.inner
					.borrow_mut()
					.pending_wake
					.take()
					.ok_or_else(|| KernelError::ContinuationMisuse("future returned Pending without registering a wake request".into()))?;
				self.inner.borrow_mut().parked.insert(body_id, fut);
				self.handle_wake_request(body_id, req)
			}
		}
	}

	fn on_body_complete(&self, body_id: ContId, result: Result<Value, KernelError>) -> Result<(), KernelError> {
		let waiting_caller = self.inner.borrow_mut().body_callers.remove(&body_id);
		match waiting_caller {
			Some(caller_id) => {
				self.resume_now(caller_id, Box::new(result) as Box<dyn Any>);
				Ok(())
			}
			None => result.map(|_| ()),
		}
	}

	fn handle_wake_request(&self, body_id: ContId, req: WakeRequest) -> Result<(), KernelError> {
		match req {
			WakeRequest::After(duration) => {
				let now = self.inner.borrow().clock.now();
				self.enqueue_resume(body_id, now.saturating_add(duration), Box::new(Ok::<(), KernelError>(())) as Box<dyn Any>);
				Ok(())
			}
			WakeRequest::AwaitEntity { target, ordinal, args } => {
				let now = self.inner.borrow().clock.now();
				let inner = self.inner.borrow();
				let caller = if inner.track_event_sources { inner.current.clone() } else { None };
				drop(inner);
				let callee_id = self.enqueue_invocation(now, target, ordinal, args, caller)?;
				self.inner.borrow_mut().body_callers.insert(callee_id, body_id);
				Ok(())
			}
			WakeRequest::Park(register) => {
				register(body_id);
				Ok(())
			}
		}
	}

	fn dispatch_invocation(&self, event_rc: &Rc<Event>) -> Result<(), KernelError> {
		let target = event_rc.target.clone().expect("invocation events always carry a target");
		let body_id = event_rc.body_id;
		let fut = target.invoke(event_rc.ordinal, event_rc.args.clone());
		self.drive(fut, body_id)
	}

	fn dispatch_resume(&self, body_id: ContId) -> Result<(), KernelError> {
		let fut = self
			.inner
			.borrow_mut()
			.parked
			.remove(&body_id)
			.ok_or_else(|| KernelError::ContinuationMisuse(format!("resume of unknown or already-finished continuation {body_id:?}")))?;
		self.drive(fut, body_id)
	}

	/// Performs one pop-advance-dispatch cycle. Returns what the loop should
	/// do next.
	fn step_internal(&self) -> Result<StepOutcome, KernelError> {
		if self.inner.borrow().end_requested {
			return Ok(StepOutcome::EndedByRequest);
		}
		let next_key = self.inner.borrow().queue.peek_min_key();
		let Some(key) = next_key else {
			return Ok(StepOutcome::QueueExhausted);
		};
		if key.time > self.inner.borrow().end_time {
			return Ok(StepOutcome::EndTimeReached);
		}

		let mut event = {
			let mut inner = self.inner.borrow_mut();
			let event = inner.queue.pop_min().expect("peek_min_key guaranteed a pop");
			inner.clock.advance_to(event.key.time)?;
			inner.total_events += 1;
			if inner.track_spectrum {
				*inner.spectrum.entry(event.signature).or_insert(0) += 1;
			}
			event
		};
		trace!(time = event.key.time, seq = event.key.seq, signature = event.signature, "dispatching event");

		let continuation = event.continuation;
		let resume_payload = event.resume_payload.take();
		if let Some(payload) = resume_payload {
			self.inner.borrow_mut().resume_payload = Some(payload);
		}

		let event_rc = Rc::new(event);
		self.inner.borrow_mut().current = Some(Rc::clone(&event_rc));

		let result = match continuation {
			Some(body_id) => self.dispatch_resume(body_id),
			None => self.dispatch_invocation(&event_rc),
		};

		self.inner.borrow_mut().current = None;
		result?;

		Ok(StepOutcome::Dispatched)
	}

	/// Runs the event loop until the queue is empty, the configured end time
	/// is reached, or a stop is requested.
	///
	/// # Errors
	/// [`KernelError::SchedulerReentered`] if called while already running,
	/// or whatever fatal error a fire-and-forget event body raises.
	pub fn run(&self) -> Result<RunOutcome, KernelError> {
		{
			let mut inner = self.inner.borrow_mut();
			if inner.running {
				return Err(KernelError::SchedulerReentered);
			}
			inner.running = true;
		}
		let outcome = loop {
			match self.step_internal() {
				Ok(StepOutcome::Dispatched) => continue,
				Ok(StepOutcome::QueueExhausted) => break Ok(RunOutcome::QueueExhausted),
				Ok(StepOutcome::EndTimeReached) => break Ok(RunOutcome::EndTimeReached),
				Ok(StepOutcome::EndedByRequest) => break Ok(RunOutcome::EndedByRequest),
				Err(e) => break Err(e),
			}
		};
		self.inner.borrow_mut().running = false;
		match &outcome {
			Ok(o) => debug!(scheduler = %self.inner.borrow().name, ?o, total_events = self.inner.borrow().total_events, "run finished"),
			Err(_) => warn!(scheduler = %self.inner.borrow().name, "run aborted by error"),
		}
		outcome
	}

	/// Performs a single pop-advance-dispatch cycle, for stepping
	/// controllers. Returns `true` if the queue may still
	/// have work.
	///
	/// # Errors
	/// [`KernelError::SchedulerReentered`] if called while `run()` is active
	/// on this scheduler, or whatever fatal error the dispatched body raises.
	pub fn step_one(&self) -> Result<bool, KernelError> {
		{
			let mut inner = self.inner.borrow_mut();
			if inner.running {
				return Err(KernelError::SchedulerReentered);
			}
			inner.running = true;
		}
		let outcome = self.step_internal();
		self.inner.borrow_mut().running = false;
		match outcome? {
			StepOutcome::Dispatched => Ok(!self.inner.borrow().queue.is_empty()),
			StepOutcome::QueueExhausted | StepOutcome::EndTimeReached | StepOutcome::EndedByRequest => Ok(false),
		}
	}

	/// Computes which terminal outcome currently applies, for controllers
	/// that drive the loop step by step via [`Scheduler::step_one`] rather
	/// than [`Scheduler::run`].
	#[must_use]
	pub fn current_outcome(&self) -> RunOutcome {
		let inner = self.inner.borrow();
		if inner.end_requested {
			RunOutcome::EndedByRequest
		} else if inner.queue.is_empty() {
			RunOutcome::QueueExhausted
		} else {
			RunOutcome::EndTimeReached
		}
	}

	/// Snapshots current statistics into a [`Report`].
	#[must_use]
	pub fn report(&self) -> Report {
		let inner = self.inner.borrow();
		let spectrum = if inner.track_spectrum {
			inner.spectrum.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
		} else {
			HashMap::new()
		};
		Report::new(inner.name.clone(), inner.start_time, inner.clock.now(), inner.total_events, spectrum)
	}
}

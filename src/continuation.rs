//! The continuation service. A blocking body is an ordinary Rust
//! `async fn`; the compiler already lowers it into the state machine a
//! blocking body needs. What is left for us to build is the bridge
//! between that state machine and the event queue: a leaf future that, on
//! its first poll, tells the scheduler what it is waiting for and returns
//! `Pending`, and on its second poll, picks up whatever payload the
//! scheduler left for it and returns `Ready`.
//!
//! Re-polling is driven entirely by the scheduler re-dispatching a resume
//! [`Event`](crate::event::Event) from its own queue, never by a waker
//! notification — the [`Waker`](futures::task::noop_waker) handed to
//! `Future::poll` is a pure no-op.

use crate::context;
use crate::dispatch::BoxEventFuture;
use crate::error::KernelError;
use crate::event::EntityRef;
use crate::value::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

/// What a body asked for when its leaf future returned `Pending`. The
/// scheduler only learns the continuation's own [`ContId`](crate::event::ContId)
/// at this point (it is minted lazily, on first suspension), so anything a
/// leaf future needs to register under that id — a channel wait queue entry,
/// say — is deferred into the `Park` closure below.
pub(crate) enum WakeRequest {
	/// `sleep(d)`: resume `d` ticks after the current time.
	After(u64),
	/// `post_continuing(target, ordinal, args)`: post the callee now and
	/// resume this body when it completes.
	AwaitEntity { target: EntityRef, ordinal: u32, args: Vec<Value> },
	/// A structure-specific wait (currently: rendezvous channels) that needs
	/// to record the continuation's id once it exists.
	Park(Box<dyn FnOnce(crate::event::ContId)>),
}

/// The future returned by [`crate::sleep`].
pub struct SleepFuture {
	state: SleepState,
}

enum SleepState {
	NotStarted(u64),
	Parked,
}

impl SleepFuture {
	pub(crate) const fn new(duration: u64) -> Self {
		Self { state: SleepState::NotStarted(duration) }
	}
}

impl Future for SleepFuture {
	type Output = Result<(), KernelError>;

	fn poll(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		match std::mem::replace(&mut this.state, SleepState::Parked) {
			SleepState::NotStarted(duration) => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				if let Err(e) = sched.check_not_ended() {
					return Poll::Ready(Err(e));
				}
				sched.set_pending_wake(WakeRequest::After(duration));
				Poll::Pending
			}
			SleepState::Parked => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				Poll::Ready(sched.take_resume_payload::<Result<(), KernelError>>().and_then(|r| r))
			}
		}
	}
}

/// The future returned by [`crate::post_continuing`].
pub struct PostContinuingFuture {
	state: CallState,
}

enum CallState {
	NotStarted { target: EntityRef, ordinal: u32, args: Vec<Value> },
	Parked,
}

impl PostContinuingFuture {
	pub(crate) const fn new(target: EntityRef, ordinal: u32, args: Vec<Value>) -> Self {
		Self { state: CallState::NotStarted { target, ordinal, args } }
	}
}

impl Future for PostContinuingFuture {
	type Output = Result<Value, KernelError>;

	fn poll(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		match std::mem::replace(&mut this.state, CallState::Parked) {
			CallState::NotStarted { target, ordinal, args } => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				if let Err(e) = sched.check_not_ended() {
					return Poll::Ready(Err(e));
				}
				sched.set_pending_wake(WakeRequest::AwaitEntity { target, ordinal, args });
				Poll::Pending
			}
			CallState::Parked => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				Poll::Ready(sched.take_resume_payload::<Result<Value, KernelError>>().and_then(|r| r))
			}
		}
	}
}

/// A parked body, boxed uniformly regardless of how deep its `.await` chain
/// runs — it is always, ultimately, an entity's top-level invocation future.
pub(crate) type ParkedBody = BoxEventFuture;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sleep_future_starts_unparked() {
		let f = SleepFuture::new(5);
		assert!(matches!(f.state, SleepState::NotStarted(5)));
	}
}

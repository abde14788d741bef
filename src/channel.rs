//! The rendezvous channel. Unbuffered: `put` only completes once a
//! matching `take` has accepted the value (and vice versa). Whichever side
//! arrives second observes the other waiting and completes immediately;
//! whichever arrives first parks.

use crate::context;
use crate::error::KernelError;
use crate::event::ContId;
use crate::continuation::WakeRequest;
use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context as TaskContext, Poll};

struct Inner<T> {
	waiting_senders: VecDeque<(ContId, T)>,
	waiting_receivers: VecDeque<ContId>,
}

impl<T> Default for Inner<T> {
	fn default() -> Self {
		Self { waiting_senders: VecDeque::new(), waiting_receivers: VecDeque::new() }
	}
}

/// A rendezvous channel. Cheaply cloneable — every clone refers
/// to the same underlying wait queues, matching how user code typically
/// shares one channel handle between producer and consumer entities.
pub struct Channel<T> {
	inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Channel<T> {
	fn clone(&self) -> Self {
		Self { inner: Rc::clone(&self.inner) }
	}
}

impl<T> Default for Channel<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: 'static> Channel<T> {
	#[must_use]
	pub fn new() -> Self {
		Self { inner: Rc::new(RefCell::new(Inner::default())) }
	}

	/// Blocks until a corresponding `take()` accepts `value`.
	pub fn put(&self, value: T) -> PutFuture<T> {
		PutFuture { channel: Rc::clone(&self.inner), state: PutState::NotStarted(Some(value)) }
	}

	/// Blocks until a corresponding `put()` offers a value.
	pub fn take(&self) -> TakeFuture<T> {
		TakeFuture { channel: Rc::clone(&self.inner), state: TakeState::NotStarted }
	}
}

pub struct PutFuture<T> {
	channel: Rc<RefCell<Inner<T>>>,
	state: PutState<T>,
}

enum PutState<T> {
	NotStarted(Option<T>),
	Parked,
}

impl<T: 'static> Future for PutFuture<T> {
	type Output = Result<(), KernelError>;

	fn poll(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		match &mut this.state {
			PutState::NotStarted(value) => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				if let Err(e) = sched.check_not_ended() {
					return Poll::Ready(Err(e));
				}
				let receiver = this.channel.borrow_mut().waiting_receivers.pop_front();
				if let Some(receiver_id) = receiver {
					let value = value.take().expect("PutFuture polled again after completing its first poll");
					sched.resume_now(receiver_id, Box::new(value) as Box<dyn Any>);
					return Poll::Ready(Ok(()));
				}
				let value = value.take().expect("PutFuture polled again after completing its first poll");
				let channel = Rc::clone(&this.channel);
				sched.set_pending_wake(WakeRequest::Park(Box::new(move |cont_id| {
					channel.borrow_mut().waiting_senders.push_back((cont_id, value));
				})));
				this.state = PutState::Parked;
				Poll::Pending
			}
			PutState::Parked => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				Poll::Ready(sched.take_resume_payload::<()>())
			}
		}
	}
}

pub struct TakeFuture<T> {
	channel: Rc<RefCell<Inner<T>>>,
	state: TakeState,
}

enum TakeState {
	NotStarted,
	Parked,
}

impl<T: 'static> Future for TakeFuture<T> {
	type Output = Result<T, KernelError>;

	fn poll(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		match this.state {
			TakeState::NotStarted => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				if let Err(e) = sched.check_not_ended() {
					return Poll::Ready(Err(e));
				}
				let sender = this.channel.borrow_mut().waiting_senders.pop_front();
				if let Some((sender_id, value)) = sender {
					sched.resume_now(sender_id, Box::new(()) as Box<dyn Any>);
					return Poll::Ready(Ok(value));
				}
				let channel = Rc::clone(&this.channel);
				sched.set_pending_wake(WakeRequest::Park(Box::new(move |cont_id| {
					channel.borrow_mut().waiting_receivers.push_back(cont_id);
				})));
				this.state = TakeState::Parked;
				Poll::Pending
			}
			TakeState::Parked => {
				let sched = match context::current() {
					Ok(s) => s,
					Err(e) => return Poll::Ready(Err(e)),
				};
				Poll::Ready(sched.take_resume_payload::<T>())
			}
		}
	}
}

/// Free-function convenience mirroring [`Channel::new`].
#[must_use]
pub fn make_channel<T: 'static>() -> Channel<T> {
	Channel::new()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_channel_has_empty_wait_queues() {
		let chan: Channel<i64> = Channel::new();
		assert!(chan.inner.borrow().waiting_senders.is_empty());
		assert!(chan.inner.borrow().waiting_receivers.is_empty());
	}

	#[test]
	fn clone_shares_the_same_wait_queues() {
		let a: Channel<i64> = Channel::new();
		let b = a.clone();
		a.inner.borrow_mut().waiting_receivers.push_back(ContId(1));
		assert_eq!(b.inner.borrow().waiting_receivers.len(), 1);
	}
}

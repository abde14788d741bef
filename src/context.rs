//! Ambient time-API context. Exactly one [`Scheduler`] may be installed
//! as "current" per OS thread at a time; entity bodies reach it
//! through the free functions below rather than threading a handle through
//! every call, mirroring how the original system's kernel primitives were
//! always reached through a thread-local "current controller".

use crate::error::KernelError;
use crate::event::EntityRef;
use crate::scheduler::Scheduler;
use crate::value::Value;
use crate::{channel, continuation};
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
	static CURRENT: RefCell<Option<Rc<Scheduler>>> = const { RefCell::new(None) };
}

/// Installs `sched` as this thread's ambient scheduler.
///
/// # Errors
/// Returns [`KernelError::ControllerAlreadyInstalled`] if one is already
/// installed — at most one controller may be current at a time.
pub fn install_as_current(sched: &Rc<Scheduler>) -> Result<(), KernelError> {
	CURRENT.with(|cell| {
		let mut slot = cell.borrow_mut();
		if slot.is_some() {
			return Err(KernelError::ControllerAlreadyInstalled);
		}
		*slot = Some(Rc::clone(sched));
		Ok(())
	})
}

/// Clears this thread's ambient scheduler, if any.
pub fn clear_current() {
	CURRENT.with(|cell| {
		*cell.borrow_mut() = None;
	});
}

/// # Errors
/// Returns [`KernelError::NoAmbientController`] if nothing is installed.
pub fn current() -> Result<Rc<Scheduler>, KernelError> {
	CURRENT.with(|cell| cell.borrow().clone()).ok_or(KernelError::NoAmbientController)
}

/// Current virtual time of the ambient scheduler.
///
/// # Errors
/// Returns [`KernelError::NoAmbientController`] if none is installed.
pub fn now() -> Result<u64, KernelError> {
	Ok(current()?.now())
}

/// Suspends the calling body for `duration` virtual ticks.
pub fn sleep(duration: u64) -> continuation::SleepFuture {
	continuation::SleepFuture::new(duration)
}

/// Posts a fire-and-forget invocation, scheduled at `time` (or "now" if
/// `None`).
///
/// # Errors
/// Returns [`KernelError::NoAmbientController`], [`KernelError::ClockReversal`]
/// if `time` precedes the current clock, or [`KernelError::EndedByRequest`]
/// if the simulation has already been asked to end.
pub fn post_event(time: Option<u64>, target: EntityRef, ordinal: u32, args: Vec<Value>) -> Result<(), KernelError> {
	current()?.post_event(time, target, ordinal, args)
}

/// Posts `target`'s invocation now and suspends the caller until it
/// completes, yielding its return value.
pub fn post_continuing(target: EntityRef, ordinal: u32, args: Vec<Value>) -> continuation::PostContinuingFuture {
	continuation::PostContinuingFuture::new(target, ordinal, args)
}

/// Requests that the ambient scheduler's run loop stop after the current
/// event finishes.
///
/// # Errors
/// Returns [`KernelError::NoAmbientController`] if none is installed.
pub fn end_simulation() -> Result<(), KernelError> {
	current()?.end_simulation();
	Ok(())
}

/// Creates a new unbuffered rendezvous channel.
#[must_use]
pub fn make_channel<T: 'static>() -> channel::Channel<T> {
	channel::make_channel()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SchedulerConfig;

	#[test]
	fn install_then_clear_round_trips() {
		clear_current();
		assert!(matches!(current(), Err(KernelError::NoAmbientController)));

		let sched = Scheduler::new(SchedulerConfig::test());
		install_as_current(&sched).unwrap();
		assert_eq!(now().unwrap(), 0);

		let err = install_as_current(&sched).unwrap_err();
		assert!(matches!(err, KernelError::ControllerAlreadyInstalled));

		clear_current();
		assert!(matches!(current(), Err(KernelError::NoAmbientController)));
	}
}

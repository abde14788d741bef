//! Controller variants. The scheduler itself only knows how to pop and
//! dispatch one event; these wrappers decide the cadence at which it does
//! so: as fast as possible, one event at a time, or paced to
//! wall-clock time.

use crate::error::KernelError;
use crate::scheduler::{RunOutcome, Scheduler};
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// Runs one event per call, for interactive/debugger-driven stepping.
pub struct SteppingController {
	scheduler: Rc<Scheduler>,
}

impl SteppingController {
	#[must_use]
	pub const fn new(scheduler: Rc<Scheduler>) -> Self {
		Self { scheduler }
	}

	/// Dispatches exactly one event. Returns `true` if more work may remain.
	///
	/// # Errors
	/// Propagates whatever [`Scheduler::step_one`] returns.
	pub fn step(&self) -> Result<bool, KernelError> {
		self.scheduler.step_one()
	}

	#[must_use]
	pub fn scheduler(&self) -> &Rc<Scheduler> {
		&self.scheduler
	}
}

/// Paces virtual time against wall-clock time: before dispatching the next
/// event, sleeps for `(event.time - now) * ticks_to_seconds`. Otherwise
/// behaves exactly like [`Scheduler::run`]: the real-time variant sleeps
/// the wall clock to match the virtual one; no other semantics change.
pub struct RealTimeController {
	scheduler: Rc<Scheduler>,
	ticks_to_seconds: f64,
}

impl RealTimeController {
	#[must_use]
	pub const fn new(scheduler: Rc<Scheduler>, ticks_to_seconds: f64) -> Self {
		Self { scheduler, ticks_to_seconds }
	}

	/// Runs to completion, pacing virtual-time advances against the wall
	/// clock.
	///
	/// # Errors
	/// Propagates whatever [`Scheduler::step_one`] returns.
	pub fn run(&self) -> Result<RunOutcome, KernelError> {
		loop {
			let now = self.scheduler.now();
			if let Some(wait) = self.wait_for_next_event(now) {
				trace!(?wait, "real-time controller sleeping before next event");
				std::thread::sleep(wait);
			}
			let more = self.scheduler.step_one()?;
			if !more {
				return Ok(self.final_outcome());
			}
		}
	}

	fn wait_for_next_event(&self, now: u64) -> Option<Duration> {
		let next_time = self.scheduler.peek_next_time()?;
		let delta = next_time.saturating_sub(now);
		if delta == 0 {
			return None;
		}
		#[allow(clippy::cast_precision_loss)]
		let seconds = delta as f64 * self.ticks_to_seconds;
		Some(Duration::from_secs_f64(seconds.max(0.0)))
	}

	fn final_outcome(&self) -> RunOutcome {
		self.scheduler.current_outcome()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SchedulerConfig;
	use crate::dispatch::{BoxEventFuture, Entity};
	use crate::event::EntityRef;
	use crate::value::Value;

	struct Noop;
	impl Entity for Noop {
		fn invoke(&self, _ordinal: u32, _args: Vec<Value>) -> BoxEventFuture {
			Box::pin(async move { Ok(Value::Unit) })
		}
		fn signature_for(&self, _ordinal: u32) -> &'static str {
			"Noop.tick"
		}
	}

	#[test]
	fn stepping_controller_reports_no_more_work_once_drained() {
		let sched = Scheduler::new(SchedulerConfig::test());
		let entity: EntityRef = Rc::new(Noop);
		sched.post_event(None, entity, 0, vec![]).unwrap();
		let controller = SteppingController::new(sched);
		assert!(!controller.step().unwrap());
	}

	#[test]
	fn real_time_controller_runs_to_exhaustion() {
		let sched = Scheduler::new(SchedulerConfig::test());
		let entity: EntityRef = Rc::new(Noop);
		sched.post_event(Some(0), entity, 0, vec![]).unwrap();
		let controller = RealTimeController::new(sched, 0.0);
		assert_eq!(controller.run().unwrap(), RunOutcome::QueueExhausted);
	}
}

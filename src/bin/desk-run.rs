//! Demo/debugging binary: runs a small self-recursive "ping" simulation and
//! prints the resulting report as JSON. Not part of the library surface —
//! a thin `clap` + `tracing` + `tokio` shell over the synchronous kernel.

use clap::Parser;
use simkernel::dispatch::{BoxEventFuture, Entity};
use simkernel::value::Value;
use simkernel::{context, controller::RealTimeController, SchedulerConfig, Scheduler};
use std::rc::Rc;
use tracing::info;

/// Posts itself `remaining - 1` more times, one virtual tick apart, then
/// stops — a minimal self-recursive simulation entity.
struct Ping {
	period: u64,
}

impl Entity for Ping {
	fn invoke(&self, ordinal: u32, args: Vec<Value>) -> BoxEventFuture {
		let period = self.period;
		Box::pin(async move {
			if ordinal != 0 {
				return Err(simkernel::KernelError::UnknownOrdinal { signature: "Ping.tick", ordinal });
			}
			let remaining = args.first().and_then(Value::as_uint).unwrap_or(0);
			let now = context::now()?;
			info!(now, remaining, "ping");
			if remaining > 0 {
				let me: simkernel::EntityRef = Rc::new(Ping { period });
				context::post_event(Some(now + period), me, 0, vec![Value::from(remaining - 1)])?;
			}
			Ok(Value::Unit)
		})
	}

	fn signature_for(&self, _ordinal: u32) -> &'static str {
		"Ping.tick"
	}
}

fn run_demo(config: SchedulerConfig) -> simkernel::KernelResult<String> {
	tracing_subscriber::fmt::init();

	let sched = Scheduler::new(config);
	context::install_as_current(&sched)?;

	let entity: simkernel::EntityRef = Rc::new(Ping { period: 1 });
	sched.post_event(Some(0), entity, 0, vec![Value::from(9u64)])?;

	let controller = RealTimeController::new(Rc::clone(&sched), 0.05);
	controller.run()?;

	let report = sched.report();
	context::clear_current();
	Ok(report.to_json()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let config = SchedulerConfig::parse();
	let json = tokio::task::spawn_blocking(move || run_demo(config)).await?.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
	println!("{json}");
	Ok(())
}

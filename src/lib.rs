//! A virtual-time discrete-event simulation kernel.
//!
//! The building blocks are a monotonic [`clock::VirtualClock`], a priority
//! [`queue::EventQueue`] of [`event::Event`]s, user-defined [`dispatch::Entity`]
//! types reached only through stable integer ordinals, and a
//! [`scheduler::Scheduler`] that drives the three together. Event bodies are
//! ordinary `async fn`s: `.await`ing [`sleep`], [`post_continuing`], or a
//! [`channel::Channel`]'s `put`/`take` suspends the body and hands control
//! back to the scheduler, which resumes it later via the same event queue
//! everything else goes through.
//!
//! ```ignore
//! use simkernel::{config::SchedulerConfig, context, scheduler::Scheduler};
//!
//! let sched = Scheduler::new(SchedulerConfig::default());
//! context::install_as_current(&sched)?;
//! sched.post_event(Some(0), my_entity, 0, vec![])?;
//! sched.run()?;
//! println!("{}", sched.report());
//! ```

pub mod channel;
pub mod clock;
pub mod config;
pub mod context;
pub mod continuation;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod queue;
pub mod report;
pub mod scheduler;
pub mod trees;
pub mod value;

pub use channel::{make_channel, Channel};
pub use clock::VirtualClock;
pub use config::SchedulerConfig;
pub use context::{end_simulation, now, post_continuing, post_event, sleep};
pub use controller::{RealTimeController, SteppingController};
pub use dispatch::{BoxEventFuture, DispatchTable, Entity, RESUME_ORDINAL};
pub use error::{KernelError, KernelResult};
pub use event::{ContId, EntityRef, Event, EventKey};
pub use queue::{EventQueue, SplayEventQueue};
pub use report::Report;
pub use scheduler::{RunOutcome, Scheduler};
pub use value::Value;

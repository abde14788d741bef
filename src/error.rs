use thiserror::Error;

/// Every fatal or propagated failure the kernel can produce.
///
/// `EndedByRequest` is not a failure in the usual sense — it is the terminal
/// signal `end_simulation()` raises so `run()` can report a normal,
/// requested stop rather than an exhausted queue. It still flows through
/// this enum because it has to cross the same `Result` plumbing as genuine
/// failures when it escapes a blocking `post_continuing` chain.
#[derive(Error, Debug)]
pub enum KernelError {
	#[error("clock reversal: attempted to advance to {attempted} from {current}")]
	ClockReversal { current: u64, attempted: u64 },

	#[error("scheduler is already running (run() invoked reentrantly)")]
	SchedulerReentered,

	#[error("a controller is already installed as the ambient current controller")]
	ControllerAlreadyInstalled,

	#[error("continuation misuse: {0}")]
	ContinuationMisuse(String),

	#[error("unknown ordinal {ordinal} for entity {signature}")]
	UnknownOrdinal { signature: &'static str, ordinal: u32 },

	#[error("event body raised an error: {0}")]
	UserEventError(String),

	#[error("no ambient scheduler installed: call install_as_current() first")]
	NoAmbientController,

	#[error("report serialization failed: {0}")]
	ReportSerialization(#[from] serde_json::Error),

	#[error("simulation ended by request")]
	EndedByRequest,
}

pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clock_reversal_message_carries_both_times() {
		let err = KernelError::ClockReversal { current: 10, attempted: 4 };
		assert!(err.to_string().contains('4'));
		assert!(err.to_string().contains("10"));
	}

	#[test]
	fn unknown_ordinal_is_fatal_and_descriptive() {
		let err = KernelError::UnknownOrdinal { signature: "Widget", ordinal: 7 };
		let msg = err.to_string();
		assert!(msg.contains("Widget"));
		assert!(msg.contains('7'));
	}
}

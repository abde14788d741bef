use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct SchedulerConfig {
	#[arg(long, env = "SIM_NAME", default_value = "simulation", help = "Name attached to the run's report")]
	pub name: String,

	#[arg(long, env = "SIM_START_TIME", default_value = "0", help = "Virtual clock value at the start of the run")]
	pub start_time: u64,

	#[arg(long, env = "SIM_END_TIME", default_value_t = u64::MAX, help = "Virtual time at which the run stops regardless of queue contents")]
	pub end_time: u64,

	#[arg(long, env = "SIM_TRACK_SPECTRUM", default_value_t = true, help = "Maintain per-signature dispatch counts")]
	pub track_spectrum: bool,

	#[arg(long, env = "SIM_TRACK_EVENT_SOURCES", default_value_t = false, help = "Record which event caused each posted event (diagnostics only)")]
	pub track_event_sources: bool,

	#[arg(long, env = "SIM_DEBUG_EVENTS", default_value_t = false, help = "Capture a creation-site backtrace on every event")]
	pub debug_events: bool,
}

impl SchedulerConfig {
	#[must_use]
	pub fn new() -> Self {
		Self::parse()
	}
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			name: "simulation".to_string(),
			start_time: 0,
			end_time: u64::MAX,
			track_spectrum: true,
			track_event_sources: false,
			debug_events: false,
		}
	}
}

#[cfg(test)]
impl SchedulerConfig {
	pub fn test() -> Self {
		Self { name: "test".to_string(), track_event_sources: true, ..Self::default() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config_has_no_end_time_bound() {
		let config = SchedulerConfig::default();
		assert_eq!(config.start_time, 0);
		assert_eq!(config.end_time, u64::MAX);
		assert!(config.track_spectrum);
		assert!(!config.track_event_sources);
	}

	#[test]
	fn config_parser_reads_flags() {
		let args = vec!["program", "--name", "rush-hour", "--start-time", "10", "--end-time", "1000", "--track-event-sources"];
		let config = SchedulerConfig::try_parse_from(args).unwrap();
		assert_eq!(config.name, "rush-hour");
		assert_eq!(config.start_time, 10);
		assert_eq!(config.end_time, 1000);
		assert!(config.track_event_sources);
	}
}

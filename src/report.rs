//! End-of-run summary. Printed as plain text for humans and also exposed
//! as JSON so it can be consumed by tooling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::KernelError;

/// A snapshot of scheduler statistics taken after a `run()` call returns.
///
/// `duration` is derived (`end_time - start_time`), not independently
/// settable — it is computed in [`Report::new`] rather than left for
/// callers to recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
	pub name: String,
	pub start_time: u64,
	pub end_time: u64,
	pub duration: u64,
	pub total_events: u64,
	/// Per-signature dispatch counts; empty when `track_spectrum` was off.
	pub spectrum: HashMap<String, u64>,
}

impl Report {
	#[must_use]
	pub const fn new(name: String, start_time: u64, end_time: u64, total_events: u64, spectrum: HashMap<String, u64>) -> Self {
		Self { name, start_time, duration: end_time.saturating_sub(start_time), end_time, total_events, spectrum }
	}

	/// # Errors
	/// Returns [`KernelError::ReportSerialization`] if serialization fails,
	/// which in practice only happens under allocator failure.
	pub fn to_json(&self) -> Result<String, KernelError> {
		serde_json::to_string_pretty(self).map_err(KernelError::ReportSerialization)
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "simulation \"{}\"", self.name)?;
		writeln!(f, "  virtual time:  {} -> {} (duration {})", self.start_time, self.end_time, self.duration)?;
		writeln!(f, "  total events:  {}", self.total_events)?;
		if self.spectrum.is_empty() {
			return write!(f, "  spectrum:      (not tracked)");
		}
		writeln!(f, "  spectrum:")?;
		let mut entries: Vec<_> = self.spectrum.iter().collect();
		entries.sort_by(|a, b| a.0.cmp(b.0));
		for (i, (signature, count)) in entries.iter().enumerate() {
			if i + 1 == entries.len() {
				write!(f, "    {signature}: {count}")?;
			} else {
				writeln!(f, "    {signature}: {count}")?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Report {
		let mut spectrum = HashMap::new();
		spectrum.insert("Widget.arrive".to_string(), 3);
		Report::new("t".to_string(), 0, 10, 3, spectrum)
	}

	#[test]
	fn json_round_trips_through_serde() {
		let report = sample();
		let json = report.to_json().unwrap();
		let back: Report = serde_json::from_str(&json).unwrap();
		assert_eq!(back.total_events, 3);
		assert_eq!(back.duration, 10);
		assert_eq!(back.spectrum.get("Widget.arrive"), Some(&3));
	}

	#[test]
	fn duration_is_end_minus_start() {
		let report = Report::new("t".to_string(), 5, 17, 0, HashMap::new());
		assert_eq!(report.duration, 12);
	}

	#[test]
	fn text_mentions_every_tracked_signature() {
		let text = sample().to_string();
		assert!(text.contains("Widget.arrive: 3"));
	}
}

//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default quiet period after an edit before a request is issued.
pub const DEFAULT_EDIT_DEBOUNCE: Duration = Duration::from_millis(120);

/// Default quiet period after a cursor move before an idle request is issued.
pub const DEFAULT_IDLE_DEBOUNCE: Duration = Duration::from_millis(750);

/// Default upper bound on time spent in flight before a request is treated as
/// failed and any late response as stale.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of accepted/rejected edits retained per document.
pub const DEFAULT_HISTORY_CAP: usize = 32;

/// Tuning for the engine's per-document state machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Quiet period after an edit before a request is issued.
	pub edit_debounce: Duration,
	/// Quiet period after a cursor move before an idle request is issued.
	pub idle_debounce: Duration,
	/// Upper bound on time spent in flight.
	pub request_timeout: Duration,
	/// Accepted/rejected edits retained per document, oldest evicted first.
	pub history_cap: usize,
	/// Treat whitespace-only differences as no difference when diffing.
	pub ignore_whitespace: bool,
	/// Context assembly tuning.
	pub context: ContextConfig,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			edit_debounce: DEFAULT_EDIT_DEBOUNCE,
			idle_debounce: DEFAULT_IDLE_DEBOUNCE,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			history_cap: DEFAULT_HISTORY_CAP,
			ignore_whitespace: false,
			context: ContextConfig::default(),
		}
	}
}

impl EngineConfig {
	/// Validates the configuration.
	///
	/// This is the only hard failure surface of the engine; everything past
	/// construction is absorbed into state transitions.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.edit_debounce.is_zero() || self.idle_debounce.is_zero() {
			return Err(ConfigError::ZeroDebounce);
		}
		if self.request_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		if self.history_cap == 0 {
			return Err(ConfigError::ZeroHistoryCap);
		}
		if self.context.window_lines == 0 {
			return Err(ConfigError::EmptyContextWindow);
		}
		if self.context.max_entries > self.history_cap {
			return Err(ConfigError::ContextExceedsHistory {
				requested: self.context.max_entries,
				cap: self.history_cap,
			});
		}
		Ok(())
	}
}

/// Tuning for [`PredictionContext`](crate::PredictionContext) assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
	/// Include history and selection in assembled contexts. When off, captured
	/// selections are dropped and new ones are not recorded.
	pub enabled: bool,
	/// Most-recent history entries included per request.
	pub max_entries: usize,
	/// Lines of surrounding text included on each side of the cursor.
	pub window_lines: usize,
}

impl Default for ContextConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			max_entries: 8,
			window_lines: 64,
		}
	}
}

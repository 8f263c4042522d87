//! Setup-time error types.
//!
//! Steady-state per-document failures (transport errors, stale responses,
//! empty diffs, misplaced user operations) never surface as errors; they are
//! absorbed into state transitions and logged. Only configuration problems
//! are reported upward, and only at construction time.

use thiserror::Error;

/// Errors from validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	/// A debounce delay was zero.
	#[error("debounce delay must be non-zero")]
	ZeroDebounce,

	/// The in-flight request timeout was zero.
	#[error("request timeout must be non-zero")]
	ZeroTimeout,

	/// The history ring would hold nothing.
	#[error("history capacity must be at least 1")]
	ZeroHistoryCap,

	/// The context excerpt window spans no lines.
	#[error("context window must span at least one line")]
	EmptyContextWindow,

	/// More history entries were requested per context than are retained.
	#[error("context history ({requested}) exceeds history capacity ({cap})")]
	ContextExceedsHistory {
		/// Entries requested per assembled context.
		requested: usize,
		/// Configured history ring capacity.
		cap: usize,
	},
}

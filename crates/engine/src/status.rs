//! Read-only diagnostics snapshot.

use serde::Serialize;

/// Point-in-time view of one document's engine state, for status lines and
/// health checks. Produced by [`Engine::status`](crate::Engine::status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
	/// The engine has been constructed and not shut down.
	pub initialized: bool,
	/// A prediction is currently visible for the document.
	pub has_prediction: bool,
	/// A baseline snapshot has been captured.
	pub has_baseline: bool,
	/// A transport request is outstanding.
	pub in_flight: bool,
	/// A request-issue snapshot is held.
	pub has_pending_snapshot: bool,
	/// History entries retained for the document.
	pub history_len: usize,
	/// Documents tracked engine-wide.
	pub tracked_documents: usize,
}

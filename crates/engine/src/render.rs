//! Render boundary: the engine decides what is visible, the host draws it.

use augur_diff::Hunk;

use crate::store::DocumentId;

/// Receives show/clear notifications for prediction hunks.
pub trait RenderSink: Send + Sync {
	/// A prediction became visible, or a partial accept reduced it.
	fn show(&self, doc: DocumentId, hunks: &[Hunk]);

	/// The prediction for `doc` was hidden or consumed.
	fn clear(&self, doc: DocumentId);
}

/// Sink that draws nothing, for headless hosts and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRender;

impl RenderSink for NullRender {
	fn show(&self, _doc: DocumentId, _hunks: &[Hunk]) {}

	fn clear(&self, _doc: DocumentId) {}
}

//! Events posted back onto the engine's queue by spawned work.

use crate::debounce::TimerClass;
use crate::store::DocumentId;
use crate::transport::{PredictionResponse, TransportError};

/// A completion reported by a timer or transport task.
///
/// Handlers never run inside the task that produced the event; the host
/// drains these through [`Engine::pump`](crate::Engine::pump) or
/// [`Engine::tick`](crate::Engine::tick).
#[derive(Debug)]
pub(crate) enum EngineEvent {
	/// A debounce timer elapsed.
	TimerFired {
		doc: DocumentId,
		class: TimerClass,
		generation: u64,
	},
	/// A transport call resolved.
	Response {
		doc: DocumentId,
		seq: u64,
		result: Result<PredictionResponse, TransportError>,
	},
}

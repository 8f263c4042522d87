//! Edit-prediction engine for editor-integrated completion.
//!
//! For each open document the engine runs a small state machine that decides
//! when to ask a backend for a suggested rewrite, tracks the asynchronous
//! request, diffs the suggestion against a captured baseline, and lets the
//! host accept, partially accept, reject, or clear the resulting hunks.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐ change/cursor ┌──────────────┐ fire  ┌───────────────────┐
//! │    Host    │──────────────▶│   Debounce   │──────▶│  Request issue:   │
//! │  (editor)  │               │  Scheduler   │ event │ context + transport│
//! └────────────┘               └──────────────┘       └───────────────────┘
//!        ▲                                                      │ response
//!        │ show/clear         ┌──────────────┐   hunks          ▼
//!        └────────────────────│  RenderSink  │◀────────── diff vs baseline
//!                             └──────────────┘
//! ```
//!
//! All engine logic runs on the host's task queue: the [`Engine`] is driven
//! through `&mut self` entry points, and the only spawned work (debounce
//! timers, transport calls) reports back by posting events onto an internal
//! channel drained by [`Engine::pump`] or [`Engine::tick`]. No two engine
//! operations ever run concurrently, so document state needs no locks.
//!
//! Per document, triggers are totally ordered and carry a monotonically
//! increasing sequence number; a response whose sequence is behind the latest
//! trigger is discarded rather than reconciled, trading lost suggestions for
//! correctness.

mod config;
mod context;
mod debounce;
mod engine;
mod error;
mod events;
mod render;
mod status;
mod store;
mod transport;

pub use augur_diff::{DiffOptions, Hunk, HunkKind};
pub use config::{ContextConfig, EngineConfig};
pub use context::{PredictionContext, SelectionContext};
pub use engine::{AppliedEdit, Engine};
pub use error::ConfigError;
pub use render::{NullRender, RenderSink};
pub use status::EngineStatus;
pub use store::{
	CursorPosition, DocumentId, EditKind, HistoryEntry, RequestStatus, SelectionCapture,
};
pub use transport::{PredictionRequest, PredictionResponse, Transport, TransportError};

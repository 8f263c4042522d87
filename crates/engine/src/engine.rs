//! Request lifecycle state machine.
//!
//! Owns the per-document transitions `Idle → Debouncing → InFlight →
//! ShowingPrediction → Idle`, with cancellation reachable from `Debouncing`
//! and `InFlight` at any time.
//!
//! # Single-flight and staleness
//!
//! Each document has at most one outstanding transport call. Every trigger
//! bumps the document's sequence number; when a response arrives it must
//! match the recorded in-flight sequence or it is dropped. A trigger landing
//! while a request is in flight cancels that request and starts a fresh
//! debounce window, so coalesced bursts still issue exactly one call.
//!
//! # Error recovery
//!
//! Transport failures, stale responses, and empty diffs all resolve to
//! `Idle`; nothing is retried here. The next trigger event is the retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use augur_diff::{DiffOptions, Hunk};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::context;
use crate::debounce::{DebounceScheduler, TimerClass};
use crate::error::ConfigError;
use crate::events::EngineEvent;
use crate::render::RenderSink;
use crate::status::EngineStatus;
use crate::store::{
	Baseline, CursorPosition, DocumentId, DocumentState, DocumentStore, EditKind, HistoryEntry,
	RequestStatus, SelectionCapture,
};
use crate::transport::{PredictionRequest, PredictionResponse, Transport, TransportError};

/// Result of an accept, for the host to mirror into the real buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
	/// Full document text after the accepted hunks.
	pub new_text: String,
	/// The hunks that were applied.
	pub hunks: Vec<Hunk>,
	/// Engine-side document version after the edit.
	pub version: u64,
}

/// An outstanding transport call for one document.
struct InFlight {
	seq: u64,
	cancel: CancellationToken,
	issued_at: Instant,
}

/// The prediction engine.
///
/// Constructed once by the host and driven through `&mut self` entry points
/// on a single task queue; timers and transport calls report back through an
/// internal event channel drained by [`pump`](Self::pump) or
/// [`tick`](Self::tick). No hidden global state.
pub struct Engine {
	config: EngineConfig,
	store: DocumentStore,
	scheduler: DebounceScheduler,
	transport: Arc<dyn Transport>,
	render: Arc<dyn RenderSink>,
	in_flight: HashMap<DocumentId, InFlight>,
	events_tx: mpsc::UnboundedSender<EngineEvent>,
	events_rx: mpsc::UnboundedReceiver<EngineEvent>,
	shut_down: bool,
}

impl std::fmt::Debug for Engine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Engine")
			.field("documents", &self.store.len())
			.field("in_flight", &self.in_flight.len())
			.field("shut_down", &self.shut_down)
			.finish_non_exhaustive()
	}
}

enum TriggerAction {
	Ignore,
	Rearm { seq: u64 },
	Arm { seq: u64, cancel_in_flight: bool },
}

impl Engine {
	/// Creates an engine.
	///
	/// The only operation that can fail; steady-state problems are absorbed
	/// into state transitions after this point.
	pub fn new(
		config: EngineConfig,
		transport: Arc<dyn Transport>,
		render: Arc<dyn RenderSink>,
	) -> Result<Self, ConfigError> {
		config.validate()?;
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		Ok(Self {
			config,
			store: DocumentStore::default(),
			scheduler: DebounceScheduler::new(events_tx.clone()),
			transport,
			render,
			in_flight: HashMap::new(),
			events_tx,
			events_rx,
			shut_down: false,
		})
	}

	/// Cancels all work, destroys all document state, and stops accepting
	/// entry points and events.
	pub fn shutdown(&mut self) {
		if self.shut_down {
			return;
		}
		for doc in self.store.ids() {
			self.scheduler.cancel(doc, TimerClass::Edit);
			self.scheduler.cancel(doc, TimerClass::Idle);
			self.cancel_in_flight(doc);
			if let Some(state) = self.store.remove(doc)
				&& state.status == RequestStatus::ShowingPrediction
			{
				self.render.clear(doc);
			}
		}
		self.shut_down = true;
		debug!("engine shut down");
	}

	// ---- Event pump -------------------------------------------------------

	/// Handles every event that is already queued, without waiting.
	pub fn pump(&mut self) {
		while let Ok(event) = self.events_rx.try_recv() {
			self.handle_event(event);
		}
	}

	/// Waits for one event and handles it. Returns false once the engine can
	/// no longer receive events.
	pub async fn tick(&mut self) -> bool {
		let Some(event) = self.events_rx.recv().await else {
			return false;
		};
		self.handle_event(event);
		true
	}

	/// True when queued events await [`pump`](Self::pump).
	pub fn has_pending_events(&self) -> bool {
		!self.events_rx.is_empty()
	}

	pub(crate) fn handle_event(&mut self, event: EngineEvent) {
		if self.shut_down {
			return;
		}
		match event {
			EngineEvent::TimerFired {
				doc,
				class,
				generation,
			} => self.on_timer(doc, class, generation),
			EngineEvent::Response { doc, seq, result } => self.on_response(doc, seq, result),
		}
	}

	// ---- Host notifications ----------------------------------------------

	/// The document entered an editable session; captures the baseline.
	pub fn on_enter_editing(&mut self, doc: DocumentId, text: &str) {
		if self.shut_down {
			return;
		}
		let state = self.store.ensure(doc);
		state.current = text.to_string();
		state.version += 1;
		state.baseline = Some(Baseline {
			text: state.current.clone(),
			version: state.version,
		});
		debug!(doc = ?doc, version = state.version, "baseline captured");
	}

	/// The document content changed.
	pub fn on_document_changed(&mut self, doc: DocumentId, text: &str, cursor: CursorPosition) {
		if self.shut_down {
			return;
		}
		let engine_caused = {
			let state = self.store.ensure(doc);
			state.current = text.to_string();
			state.version += 1;
			state.cursor = cursor;
			std::mem::take(&mut state.suppress_next_trigger)
		};
		self.scheduler.cancel(doc, TimerClass::Idle);
		if engine_caused {
			trace!(doc = ?doc, "engine-caused change, trigger suppressed");
			return;
		}
		self.trigger(doc);
	}

	/// The cursor moved without an edit; re-arms the idle timer.
	pub fn on_cursor_moved(&mut self, doc: DocumentId, cursor: CursorPosition) {
		if self.shut_down {
			return;
		}
		let arm_idle = {
			let state = self.store.ensure(doc);
			state.cursor = cursor;
			state.status == RequestStatus::Idle && !state.suppressed
		};
		self.scheduler.cancel(doc, TimerClass::Idle);
		if arm_idle {
			self.scheduler
				.schedule(doc, TimerClass::Idle, self.config.idle_debounce);
		}
	}

	/// The editable session ended; discards prediction and baseline on every
	/// exit path, buffer switches included.
	pub fn on_leave_editing(&mut self, doc: DocumentId) {
		if self.shut_down {
			return;
		}
		self.scheduler.cancel(doc, TimerClass::Edit);
		self.scheduler.cancel(doc, TimerClass::Idle);
		self.cancel_in_flight(doc);
		let was_showing = {
			let Some(state) = self.store.get_mut(doc) else {
				return;
			};
			let was_showing = state.status == RequestStatus::ShowingPrediction;
			state.active_hunks.clear();
			state.pending_snapshot = None;
			state.baseline = None;
			state.suppress_next_trigger = false;
			state.status = RequestStatus::Idle;
			was_showing
		};
		if was_showing {
			self.render.clear(doc);
		}
		debug!(doc = ?doc, "editing session left");
	}

	/// The document closed; destroys its state.
	pub fn on_document_closed(&mut self, doc: DocumentId) {
		if self.shut_down {
			return;
		}
		self.scheduler.cancel(doc, TimerClass::Edit);
		self.scheduler.cancel(doc, TimerClass::Idle);
		self.cancel_in_flight(doc);
		if let Some(state) = self.store.remove(doc) {
			if state.status == RequestStatus::ShowingPrediction {
				self.render.clear(doc);
			}
			debug!(doc = ?doc, "document state destroyed");
		}
	}

	/// Stores a selection capture for the context assembler. Overwrites any
	/// earlier capture; dropped entirely when context features are disabled.
	pub fn on_selection_captured(&mut self, doc: DocumentId, capture: SelectionCapture) {
		if self.shut_down {
			return;
		}
		if !self.config.context.enabled {
			trace!(doc = ?doc, "selection capture dropped, context disabled");
			return;
		}
		self.store.ensure(doc).selection = Some(capture);
	}

	/// Records the host's file identity for the document.
	pub fn set_document_path(&mut self, doc: DocumentId, path: impl Into<std::path::PathBuf>) {
		if self.shut_down {
			return;
		}
		self.store.ensure(doc).path = Some(path.into());
	}

	/// Host capability input: while set, triggers for the document are
	/// ignored (e.g. a third-party completion UI is open).
	pub fn set_suppressed(&mut self, doc: DocumentId, suppressed: bool) {
		if self.shut_down {
			return;
		}
		self.store.ensure(doc).suppressed = suppressed;
	}

	// ---- User operations --------------------------------------------------

	/// True when a prediction is visible for the document.
	pub fn has_prediction(&self, doc: DocumentId) -> bool {
		self.store
			.get(doc)
			.is_some_and(|state| state.status == RequestStatus::ShowingPrediction)
	}

	/// Current state-machine position for the document, if tracked.
	pub fn request_status(&self, doc: DocumentId) -> Option<RequestStatus> {
		self.store.get(doc).map(|state| state.status)
	}

	/// Diagnostics snapshot for the document.
	pub fn status(&self, doc: DocumentId) -> EngineStatus {
		let state = self.store.get(doc);
		EngineStatus {
			initialized: !self.shut_down,
			has_prediction: state.is_some_and(|s| s.status == RequestStatus::ShowingPrediction),
			has_baseline: state.is_some_and(|s| s.baseline.is_some()),
			in_flight: self.in_flight.contains_key(&doc),
			has_pending_snapshot: state.is_some_and(|s| s.pending_snapshot.is_some()),
			history_len: state.map_or(0, |s| s.history.len()),
			tracked_documents: self.store.len(),
		}
	}

	/// Applies the whole visible prediction. No-op unless one is showing.
	pub fn accept(&mut self, doc: DocumentId) -> Option<AppliedEdit> {
		if self.shut_down {
			return None;
		}
		let cap = self.config.history_cap;
		let Some(state) = self.store.get_mut(doc) else {
			return None;
		};
		if state.status != RequestStatus::ShowingPrediction || state.active_hunks.is_empty() {
			trace!(doc = ?doc, status = ?state.status, "accept ignored");
			return None;
		}
		let hunks = std::mem::take(&mut state.active_hunks);
		let Some(new_text) = apply_to_baseline(state, &hunks) else {
			state.status = RequestStatus::Idle;
			state.pending_snapshot = None;
			self.render.clear(doc);
			return None;
		};
		state.current = new_text.clone();
		state.version += 1;
		if let Some(baseline) = state.baseline.as_mut() {
			baseline.text = new_text.clone();
			baseline.version = state.version;
		}
		state.push_history(
			HistoryEntry {
				kind: EditKind::Accepted,
				hunks: hunks.clone(),
				at: Instant::now(),
			},
			cap,
		);
		state.suppress_next_trigger = true;
		state.pending_snapshot = None;
		state.status = RequestStatus::Idle;
		let version = state.version;
		self.render.clear(doc);
		debug!(doc = ?doc, version, hunks = hunks.len(), "prediction accepted");
		Some(AppliedEdit {
			new_text,
			hunks,
			version,
		})
	}

	/// Applies only the first hunk of the visible prediction, keeping the
	/// rest showing. Repeating until no hunks remain is equivalent to one
	/// [`accept`](Self::accept).
	pub fn accept_line(&mut self, doc: DocumentId) -> Option<AppliedEdit> {
		if self.shut_down {
			return None;
		}
		let cap = self.config.history_cap;
		let Some(state) = self.store.get_mut(doc) else {
			return None;
		};
		if state.status != RequestStatus::ShowingPrediction || state.active_hunks.is_empty() {
			trace!(doc = ?doc, status = ?state.status, "accept_line ignored");
			return None;
		}
		let first = state.active_hunks.remove(0);
		let Some(new_text) = apply_to_baseline(state, std::slice::from_ref(&first)) else {
			state.active_hunks.clear();
			state.status = RequestStatus::Idle;
			state.pending_snapshot = None;
			self.render.clear(doc);
			return None;
		};
		// The applied content becomes the new diff reference; the remaining
		// hunks rebase onto it with a plain line shift.
		let delta = first.line_delta();
		for hunk in &mut state.active_hunks {
			hunk.shift(delta);
		}
		state.current = new_text.clone();
		state.version += 1;
		if let Some(baseline) = state.baseline.as_mut() {
			baseline.text = new_text.clone();
			baseline.version = state.version;
		}
		state.push_history(
			HistoryEntry {
				kind: EditKind::Accepted,
				hunks: vec![first.clone()],
				at: Instant::now(),
			},
			cap,
		);
		state.suppress_next_trigger = true;
		let version = state.version;
		let remaining = state.active_hunks.len();
		if remaining == 0 {
			state.status = RequestStatus::Idle;
			state.pending_snapshot = None;
			self.render.clear(doc);
		} else {
			self.render.show(doc, &state.active_hunks);
		}
		debug!(doc = ?doc, version, remaining, "prediction hunk accepted");
		Some(AppliedEdit {
			new_text,
			hunks: vec![first],
			version,
		})
	}

	/// Discards the visible prediction and records the rejection in history.
	pub fn reject(&mut self, doc: DocumentId) {
		self.dismiss(doc, true);
	}

	/// Discards the visible prediction without recording anything.
	pub fn clear(&mut self, doc: DocumentId) {
		self.dismiss(doc, false);
	}

	/// Cancels pending and in-flight work for the document.
	///
	/// Safe and idempotent in any state; a visible prediction stays visible
	/// (use [`clear`](Self::clear) for that).
	pub fn cancel(&mut self, doc: DocumentId) {
		if self.shut_down {
			return;
		}
		self.scheduler.cancel(doc, TimerClass::Edit);
		self.scheduler.cancel(doc, TimerClass::Idle);
		self.cancel_in_flight(doc);
		if let Some(state) = self.store.get_mut(doc)
			&& matches!(
				state.status,
				RequestStatus::Debouncing | RequestStatus::InFlight
			) {
			state.status = RequestStatus::Idle;
			state.pending_snapshot = None;
			debug!(doc = ?doc, "pending work cancelled");
		}
	}

	/// Alias of [`cancel`](Self::cancel) for hosts that name the operation
	/// after the prefetch it kills.
	pub fn cancel_prefetch(&mut self, doc: DocumentId) {
		self.cancel(doc);
	}

	/// Bypasses the debounce and issues a request immediately. Only acts
	/// from `Idle`; a no-op while a prediction is showing or in flight.
	pub fn trigger_now(&mut self, doc: DocumentId) {
		if self.shut_down {
			return;
		}
		self.fire_immediate(doc);
	}

	// ---- State machine internals -----------------------------------------

	fn trigger(&mut self, doc: DocumentId) {
		let action = {
			let Some(state) = self.store.get_mut(doc) else {
				return;
			};
			if state.suppressed {
				trace!(doc = ?doc, "trigger ignored, document suppressed");
				return;
			}
			match state.status {
				RequestStatus::ShowingPrediction => TriggerAction::Ignore,
				RequestStatus::Debouncing => {
					state.latest_seq += 1;
					TriggerAction::Rearm {
						seq: state.latest_seq,
					}
				}
				RequestStatus::Idle | RequestStatus::InFlight => {
					state.latest_seq += 1;
					let cancel_in_flight = state.status == RequestStatus::InFlight;
					state.status = RequestStatus::Debouncing;
					state.pending_snapshot = None;
					TriggerAction::Arm {
						seq: state.latest_seq,
						cancel_in_flight,
					}
				}
			}
		};
		match action {
			TriggerAction::Ignore => {
				trace!(doc = ?doc, "trigger ignored, prediction visible");
			}
			TriggerAction::Rearm { seq } => {
				self.scheduler
					.schedule(doc, TimerClass::Edit, self.config.edit_debounce);
				trace!(doc = ?doc, seq, "debounce restarted");
			}
			TriggerAction::Arm {
				seq,
				cancel_in_flight,
			} => {
				if cancel_in_flight {
					self.cancel_in_flight(doc);
				}
				self.scheduler
					.schedule(doc, TimerClass::Edit, self.config.edit_debounce);
				debug!(doc = ?doc, seq, "debounce armed");
			}
		}
	}

	fn on_timer(&mut self, doc: DocumentId, class: TimerClass, generation: u64) {
		if !self.scheduler.take_if_current(doc, class, generation) {
			trace!(doc = ?doc, class = ?class, generation, "stale timer fire ignored");
			return;
		}
		let Some(status) = self.store.get(doc).map(|state| state.status) else {
			return;
		};
		match class {
			TimerClass::Edit if status == RequestStatus::Debouncing => self.issue_request(doc),
			TimerClass::Idle if status == RequestStatus::Idle => self.fire_immediate(doc),
			_ => {
				trace!(doc = ?doc, class = ?class, status = ?status, "timer fire ignored in current state");
			}
		}
	}

	fn fire_immediate(&mut self, doc: DocumentId) {
		{
			let Some(state) = self.store.get_mut(doc) else {
				trace!(doc = ?doc, "immediate trigger for untracked document ignored");
				return;
			};
			if state.suppressed || state.status != RequestStatus::Idle {
				trace!(doc = ?doc, status = ?state.status, "immediate trigger ignored");
				return;
			}
			state.latest_seq += 1;
		}
		self.scheduler.cancel(doc, TimerClass::Idle);
		self.issue_request(doc);
	}

	fn issue_request(&mut self, doc: DocumentId) {
		let timeout = self.config.request_timeout;
		let context_config = self.config.context.clone();
		let request = {
			let Some(state) = self.store.get_mut(doc) else {
				return;
			};
			if state.suppressed {
				state.status = RequestStatus::Idle;
				return;
			}
			if state.baseline.is_none() {
				state.baseline = Some(Baseline {
					text: state.current.clone(),
					version: state.version,
				});
				debug!(doc = ?doc, version = state.version, "baseline captured lazily");
			}
			state.pending_snapshot = Some(state.current.clone());
			state.status = RequestStatus::InFlight;
			PredictionRequest {
				document: doc,
				seq: state.latest_seq,
				snapshot_version: state.version,
				context: context::assemble(state, &context_config),
			}
		};

		let cancel = CancellationToken::new();
		self.in_flight.insert(
			doc,
			InFlight {
				seq: request.seq,
				cancel: cancel.clone(),
				issued_at: Instant::now(),
			},
		);
		debug!(doc = ?doc, seq = request.seq, "prediction request issued");

		let transport = Arc::clone(&self.transport);
		let events = self.events_tx.clone();
		tokio::spawn(async move {
			let seq = request.seq;
			let result = match tokio::time::timeout(timeout, transport.predict(&request, cancel))
				.await
			{
				Ok(result) => result,
				Err(_) => Err(TransportError::Timeout),
			};
			let _ = events.send(EngineEvent::Response {
				doc: request.document,
				seq,
				result,
			});
		});
	}

	fn on_response(
		&mut self,
		doc: DocumentId,
		seq: u64,
		result: Result<PredictionResponse, TransportError>,
	) {
		let Some(in_flight) = self.in_flight.get(&doc) else {
			trace!(doc = ?doc, seq, "response without in-flight record discarded");
			return;
		};
		if in_flight.seq != seq {
			trace!(doc = ?doc, seq, current = in_flight.seq, "stale response discarded");
			return;
		}
		let elapsed_ms = in_flight.issued_at.elapsed().as_millis() as u64;
		self.in_flight.remove(&doc);

		let Some(state) = self.store.get_mut(doc) else {
			return;
		};
		if state.status != RequestStatus::InFlight {
			trace!(doc = ?doc, seq, status = ?state.status, "response ignored in current state");
			return;
		}
		if seq < state.latest_seq {
			trace!(doc = ?doc, seq, latest = state.latest_seq, "superseded response discarded");
			state.status = RequestStatus::Idle;
			state.pending_snapshot = None;
			return;
		}
		state.pending_snapshot = None;
		match result {
			Err(error) => {
				warn!(doc = ?doc, seq, elapsed_ms, %error, "prediction request failed");
				state.status = RequestStatus::Idle;
			}
			Ok(response) => {
				let Some(baseline) = state.baseline.as_ref() else {
					debug!(doc = ?doc, seq, "response without baseline discarded");
					state.status = RequestStatus::Idle;
					return;
				};
				let options = DiffOptions {
					ignore_whitespace: self.config.ignore_whitespace,
				};
				let hunks = augur_diff::diff(&baseline.text, &response.text, &options);
				if hunks.is_empty() {
					debug!(doc = ?doc, seq, elapsed_ms, "candidate matches baseline, nothing to show");
					state.status = RequestStatus::Idle;
				} else {
					debug!(doc = ?doc, seq, elapsed_ms, hunks = hunks.len(), "prediction ready");
					state.active_hunks = hunks;
					state.status = RequestStatus::ShowingPrediction;
					self.render.show(doc, &state.active_hunks);
				}
			}
		}
	}

	fn dismiss(&mut self, doc: DocumentId, record_rejection: bool) {
		if self.shut_down {
			return;
		}
		let cap = self.config.history_cap;
		let Some(state) = self.store.get_mut(doc) else {
			return;
		};
		if state.status != RequestStatus::ShowingPrediction {
			trace!(doc = ?doc, status = ?state.status, "dismiss ignored");
			return;
		}
		let hunks = std::mem::take(&mut state.active_hunks);
		if record_rejection {
			state.push_history(
				HistoryEntry {
					kind: EditKind::Rejected,
					hunks,
					at: Instant::now(),
				},
				cap,
			);
		}
		state.pending_snapshot = None;
		state.status = RequestStatus::Idle;
		self.render.clear(doc);
		debug!(doc = ?doc, rejected = record_rejection, "prediction dismissed");
	}

	fn cancel_in_flight(&mut self, doc: DocumentId) {
		if let Some(in_flight) = self.in_flight.remove(&doc) {
			in_flight.cancel.cancel();
			debug!(doc = ?doc, seq = in_flight.seq, "in-flight request cancelled");
		}
	}

	#[cfg(test)]
	pub(crate) fn debounce_generation(
		&self,
		doc: DocumentId,
		class: TimerClass,
	) -> Option<u64> {
		self.scheduler.armed_generation(doc, class)
	}
}

fn apply_to_baseline(state: &DocumentState, hunks: &[Hunk]) -> Option<String> {
	let baseline = state.baseline.as_ref()?;
	match augur_diff::apply(&baseline.text, hunks) {
		Ok(text) => Some(text),
		Err(error) => {
			warn!(%error, "failed to apply prediction hunks");
			None
		}
	}
}

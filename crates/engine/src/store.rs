//! Per-document prediction state.
//!
//! One [`DocumentState`] exists per open document, created on first activity
//! and destroyed on close. The store is owned by the engine and only touched
//! from engine methods on the host's task queue, so it carries no locks.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::Instant;

use augur_diff::Hunk;
use serde::{Deserialize, Serialize};

/// Stable identifier for an open document, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

/// Cursor location in a document, zero-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
	/// Line index.
	pub line: usize,
	/// Column index within the line.
	pub column: usize,
}

/// Where a document's state machine currently is. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
	/// Nothing scheduled or shown.
	Idle,
	/// An edit timer is armed; further triggers re-arm it.
	Debouncing,
	/// A transport request is outstanding.
	InFlight,
	/// Hunks are visible; triggers are ignored until they are consumed.
	ShowingPrediction,
}

/// Snapshot a prediction is diffed against.
#[derive(Debug, Clone)]
pub struct Baseline {
	/// Captured text.
	pub text: String,
	/// Document version at capture time.
	pub version: u64,
}

/// Whether a past prediction was taken or turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
	/// The hunks were applied to the document.
	Accepted,
	/// The hunks were discarded by the user.
	Rejected,
}

/// A past accepted or rejected prediction, kept as request context.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
	/// How the prediction was resolved.
	pub kind: EditKind,
	/// The hunks involved.
	pub hunks: Vec<Hunk>,
	/// When the resolution happened.
	pub at: Instant,
}

/// Last captured selection region, fed to the context assembler.
#[derive(Debug, Clone)]
pub struct SelectionCapture {
	/// File the selection came from.
	pub path: PathBuf,
	/// First selected line, zero-based.
	pub start_line: usize,
	/// One past the last selected line.
	pub end_line: usize,
	/// The selected line contents.
	pub lines: Vec<String>,
	/// When the capture happened.
	pub captured_at: Instant,
}

/// Prediction state for a single document.
#[derive(Debug)]
pub struct DocumentState {
	pub(crate) baseline: Option<Baseline>,
	/// Engine-side mirror of the live document (full-sync model).
	pub(crate) current: String,
	pub(crate) version: u64,
	pub(crate) path: Option<PathBuf>,
	pub(crate) cursor: CursorPosition,
	/// Bounded, most-recent-last; oldest evicted first.
	pub(crate) history: VecDeque<HistoryEntry>,
	pub(crate) selection: Option<SelectionCapture>,
	/// Document content at request issue time.
	pub(crate) pending_snapshot: Option<String>,
	pub(crate) status: RequestStatus,
	/// Hunks of the visible prediction, empty otherwise.
	pub(crate) active_hunks: Vec<Hunk>,
	/// One-shot: the next change notification is engine-caused.
	pub(crate) suppress_next_trigger: bool,
	/// Host-driven: an external completion UI is open, do not compete.
	pub(crate) suppressed: bool,
	/// Latest trigger sequence number; responses behind it are stale.
	pub(crate) latest_seq: u64,
}

impl DocumentState {
	fn new() -> Self {
		Self {
			baseline: None,
			current: String::new(),
			version: 0,
			path: None,
			cursor: CursorPosition::default(),
			history: VecDeque::new(),
			selection: None,
			pending_snapshot: None,
			status: RequestStatus::Idle,
			active_hunks: Vec::new(),
			suppress_next_trigger: false,
			suppressed: false,
			latest_seq: 0,
		}
	}

	/// Appends a history entry, evicting the oldest past `cap`.
	pub(crate) fn push_history(&mut self, entry: HistoryEntry, cap: usize) {
		self.history.push_back(entry);
		while self.history.len() > cap {
			self.history.pop_front();
		}
	}
}

/// All per-document records, keyed by [`DocumentId`].
#[derive(Debug, Default)]
pub(crate) struct DocumentStore {
	documents: HashMap<DocumentId, DocumentState>,
}

impl DocumentStore {
	pub(crate) fn ensure(&mut self, id: DocumentId) -> &mut DocumentState {
		self.documents.entry(id).or_insert_with(DocumentState::new)
	}

	pub(crate) fn get(&self, id: DocumentId) -> Option<&DocumentState> {
		self.documents.get(&id)
	}

	pub(crate) fn get_mut(&mut self, id: DocumentId) -> Option<&mut DocumentState> {
		self.documents.get_mut(&id)
	}

	pub(crate) fn remove(&mut self, id: DocumentId) -> Option<DocumentState> {
		self.documents.remove(&id)
	}

	pub(crate) fn len(&self) -> usize {
		self.documents.len()
	}

	pub(crate) fn ids(&self) -> Vec<DocumentId> {
		self.documents.keys().copied().collect()
	}
}

//! Request payload assembly.
//!
//! A [`PredictionContext`] carries everything the backend sees: a windowed
//! excerpt of the live text around the cursor, a compact rendering of recent
//! accepted/rejected edits, and the last captured selection when context
//! features are enabled.

use std::path::PathBuf;

use augur_diff::{Hunk, HunkKind};
use serde::{Deserialize, Serialize};

use crate::config::ContextConfig;
use crate::store::{CursorPosition, DocumentState, EditKind, HistoryEntry};

/// Assembled payload for one prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionContext {
	/// File identity, when the host provided one.
	pub path: Option<PathBuf>,
	/// Cursor location at issue time.
	pub cursor: CursorPosition,
	/// Text window around the cursor.
	pub excerpt: String,
	/// Recent edit history, oldest first, capped by configuration.
	pub recent_edits: Vec<String>,
	/// Last captured selection, if still valid and enabled.
	pub selection: Option<SelectionContext>,
}

/// Selection slice included in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionContext {
	/// File the selection came from.
	pub path: PathBuf,
	/// First selected line, zero-based.
	pub start_line: usize,
	/// One past the last selected line.
	pub end_line: usize,
	/// Selected text.
	pub text: String,
}

pub(crate) fn assemble(state: &DocumentState, config: &ContextConfig) -> PredictionContext {
	let recent_edits = if config.enabled {
		let mut entries: Vec<&HistoryEntry> =
			state.history.iter().rev().take(config.max_entries).collect();
		entries.reverse();
		entries.into_iter().map(render_entry).collect()
	} else {
		Vec::new()
	};

	let selection = if config.enabled {
		state.selection.as_ref().map(|capture| SelectionContext {
			path: capture.path.clone(),
			start_line: capture.start_line,
			end_line: capture.end_line,
			text: capture.lines.join("\n"),
		})
	} else {
		None
	};

	PredictionContext {
		path: state.path.clone(),
		cursor: state.cursor,
		excerpt: cursor_excerpt(&state.current, state.cursor.line, config.window_lines),
		recent_edits,
		selection,
	}
}

/// Extracts `window` lines on each side of `line`, clamped to the document.
fn cursor_excerpt(text: &str, line: usize, window: usize) -> String {
	let lines: Vec<&str> = text.split_inclusive('\n').collect();
	if lines.is_empty() {
		return String::new();
	}
	let line = line.min(lines.len() - 1);
	let start = line.saturating_sub(window);
	let end = (line + window + 1).min(lines.len());
	lines[start..end].concat()
}

fn render_entry(entry: &HistoryEntry) -> String {
	let mut out = String::from(match entry.kind {
		EditKind::Accepted => "accepted",
		EditKind::Rejected => "rejected",
	});
	for hunk in &entry.hunks {
		out.push(' ');
		out.push_str(&hunk_tag(hunk));
	}
	out
}

fn hunk_tag(hunk: &Hunk) -> String {
	match hunk.kind {
		HunkKind::Insert => format!("+{}", hunk.start_line),
		HunkKind::Delete => format!("-{}..{}", hunk.start_line, hunk.end_line),
		HunkKind::Replace => format!("~{}..{}", hunk.start_line, hunk.end_line),
	}
}

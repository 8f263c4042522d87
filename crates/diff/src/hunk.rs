//! Hunk model and application against a baseline snapshot.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of change a hunk describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunkKind {
	/// New lines inserted before `start_line`; the baseline range is empty.
	Insert,
	/// Baseline lines `start_line..end_line` removed.
	Delete,
	/// Baseline lines `start_line..end_line` replaced with `text`.
	Replace,
}

/// A minimal contiguous change region in baseline line coordinates.
///
/// Hunks produced for one prediction are non-overlapping and sorted by
/// position. Line ranges are zero-based and end-exclusive; `text` carries the
/// exact replacement bytes, including line terminators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
	/// What this hunk does to the baseline range.
	pub kind: HunkKind,
	/// First baseline line covered. For inserts, the insertion point.
	pub start_line: usize,
	/// One past the last baseline line covered. Equals `start_line` for inserts.
	pub end_line: usize,
	/// Replacement content for insert/replace; empty for deletes.
	pub text: String,
}

impl Hunk {
	/// Lines this hunk adds minus the lines it removes from the baseline.
	pub fn line_delta(&self) -> isize {
		count_lines(&self.text) as isize - (self.end_line - self.start_line) as isize
	}

	/// Shifts the baseline range by `delta` lines.
	///
	/// Used to rebase the remaining hunks after an earlier hunk of the same
	/// prediction has been applied.
	pub fn shift(&mut self, delta: isize) {
		debug_assert!(self.start_line as isize + delta >= 0);
		self.start_line = (self.start_line as isize + delta) as usize;
		self.end_line = (self.end_line as isize + delta) as usize;
	}
}

fn count_lines(text: &str) -> usize {
	text.split_inclusive('\n').count()
}

/// Errors from applying hunks to a baseline they do not fit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
	/// A hunk's range extends past the end of the baseline.
	#[error("hunk {index} out of bounds: lines {start}..{end} beyond {len}")]
	OutOfBounds {
		/// Index of the offending hunk.
		index: usize,
		/// Start of the offending range.
		start: usize,
		/// End of the offending range.
		end: usize,
		/// Number of lines in the baseline.
		len: usize,
	},
	/// A hunk starts before the end of its predecessor, or its range is inverted.
	#[error("hunk {index} overlaps its predecessor or is inverted at line {start}")]
	OutOfOrder {
		/// Index of the offending hunk.
		index: usize,
		/// Start of the offending range.
		start: usize,
	},
}

/// Applies `hunks` (sorted, non-overlapping, baseline coordinates) to
/// `baseline`, producing the changed text.
///
/// For hunks produced by [`diff`](crate::diff), the result is exactly the
/// candidate the diff was computed from.
pub fn apply(baseline: &str, hunks: &[Hunk]) -> Result<String, ApplyError> {
	let lines: Vec<&str> = baseline.split_inclusive('\n').collect();
	let mut out = String::with_capacity(baseline.len());
	let mut cursor = 0usize;

	for (index, hunk) in hunks.iter().enumerate() {
		if hunk.end_line < hunk.start_line || hunk.start_line < cursor {
			return Err(ApplyError::OutOfOrder {
				index,
				start: hunk.start_line,
			});
		}
		if hunk.end_line > lines.len() {
			return Err(ApplyError::OutOfBounds {
				index,
				start: hunk.start_line,
				end: hunk.end_line,
				len: lines.len(),
			});
		}

		for line in &lines[cursor..hunk.start_line] {
			out.push_str(line);
		}
		out.push_str(&hunk.text);
		cursor = hunk.end_line;
	}

	for line in &lines[cursor..] {
		out.push_str(line);
	}

	Ok(out)
}

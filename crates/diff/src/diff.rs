//! LCS line diff with prefix/suffix trimming.

use crate::hunk::{Hunk, HunkKind};

/// Options controlling line comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
	/// Treat lines that differ only in whitespace as equal.
	///
	/// Matched lines keep their baseline form, so the round-trip law
	/// (`apply(a, diff(a, b)) == b`) only holds when this is off.
	pub ignore_whitespace: bool,
}

/// Cap on the LCS table size. Above this the divergent region is emitted as
/// one coarse replace instead of a minimal alignment; prediction excerpts stay
/// far below it.
const MAX_LCS_CELLS: usize = 16_000_000;

/// Computes the ordered, non-overlapping hunks that turn `baseline` into
/// `candidate`.
///
/// Identical inputs yield an empty list. Adjacent deletions and insertions at
/// the same position are collapsed into a single replace.
pub fn diff(baseline: &str, candidate: &str, options: &DiffOptions) -> Vec<Hunk> {
	let old: Vec<&str> = baseline.split_inclusive('\n').collect();
	let new: Vec<&str> = candidate.split_inclusive('\n').collect();

	let prefix = common_prefix(&old, &new, options);
	let suffix = common_suffix(&old[prefix..], &new[prefix..], options);

	let old_mid = &old[prefix..old.len() - suffix];
	let new_mid = &new[prefix..new.len() - suffix];

	if old_mid.is_empty() && new_mid.is_empty() {
		return Vec::new();
	}

	align(old_mid, new_mid, prefix, options)
}

fn lines_equal(a: &str, b: &str, options: &DiffOptions) -> bool {
	if options.ignore_whitespace {
		a.split_whitespace().eq(b.split_whitespace())
	} else {
		a == b
	}
}

fn common_prefix(old: &[&str], new: &[&str], options: &DiffOptions) -> usize {
	old.iter()
		.zip(new.iter())
		.take_while(|(a, b)| lines_equal(a, b, options))
		.count()
}

fn common_suffix(old: &[&str], new: &[&str], options: &DiffOptions) -> usize {
	old.iter()
		.rev()
		.zip(new.iter().rev())
		.take_while(|(a, b)| lines_equal(a, b, options))
		.count()
}

/// A pending run of divergent lines, flushed into one hunk at the next match.
///
/// Between two matched lines the deleted baseline lines are contiguous and the
/// inserted candidate lines are contiguous, so one `(range, text)` pair is
/// enough regardless of the order the walk discovered them in.
struct Run {
	start: usize,
	end: usize,
	text: String,
}

impl Run {
	fn open(at: usize) -> Self {
		Self {
			start: at,
			end: at,
			text: String::new(),
		}
	}

	fn into_hunk(self) -> Hunk {
		let kind = if self.start == self.end {
			HunkKind::Insert
		} else if self.text.is_empty() {
			HunkKind::Delete
		} else {
			HunkKind::Replace
		};
		Hunk {
			kind,
			start_line: self.start,
			end_line: self.end,
			text: self.text,
		}
	}
}

fn align(old: &[&str], new: &[&str], offset: usize, options: &DiffOptions) -> Vec<Hunk> {
	let n = old.len();
	let m = new.len();

	if n.saturating_mul(m) > MAX_LCS_CELLS {
		let mut text = String::new();
		for line in new {
			text.push_str(line);
		}
		let run = Run {
			start: offset,
			end: offset + n,
			text,
		};
		return vec![run.into_hunk()];
	}

	// lcs[i * (m + 1) + j] = LCS length of old[i..] and new[j..].
	let width = m + 1;
	let mut lcs = vec![0u32; (n + 1) * width];
	for i in (0..n).rev() {
		for j in (0..m).rev() {
			lcs[i * width + j] = if lines_equal(old[i], new[j], options) {
				lcs[(i + 1) * width + j + 1] + 1
			} else {
				lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
			};
		}
	}

	let mut hunks = Vec::new();
	let mut run: Option<Run> = None;
	let mut i = 0;
	let mut j = 0;

	while i < n && j < m {
		if lines_equal(old[i], new[j], options) {
			if let Some(run) = run.take() {
				hunks.push(run.into_hunk());
			}
			i += 1;
			j += 1;
		} else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
			run.get_or_insert_with(|| Run::open(offset + i)).end = offset + i + 1;
			i += 1;
		} else {
			run.get_or_insert_with(|| Run::open(offset + i))
				.text
				.push_str(new[j]);
			j += 1;
		}
	}
	while i < n {
		run.get_or_insert_with(|| Run::open(offset + i)).end = offset + i + 1;
		i += 1;
	}
	while j < m {
		run.get_or_insert_with(|| Run::open(offset + i))
			.text
			.push_str(new[j]);
		j += 1;
	}
	if let Some(run) = run {
		hunks.push(run.into_hunk());
	}

	hunks
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::hunk::apply;

	fn plain(baseline: &str, candidate: &str) -> Vec<Hunk> {
		diff(baseline, candidate, &DiffOptions::default())
	}

	fn assert_round_trip(baseline: &str, candidate: &str) {
		let hunks = plain(baseline, candidate);
		assert_eq!(
			apply(baseline, &hunks).unwrap(),
			candidate,
			"round trip failed for {baseline:?} -> {candidate:?}",
		);
	}

	#[test]
	fn identical_inputs_yield_no_hunks() {
		assert_eq!(plain("a\nb\n", "a\nb\n"), vec![]);
		assert_eq!(plain("", ""), vec![]);
	}

	#[test]
	fn single_line_replace() {
		let hunks = plain("a\nb\nc\n", "a\nX\nc\n");
		assert_eq!(
			hunks,
			vec![Hunk {
				kind: HunkKind::Replace,
				start_line: 1,
				end_line: 2,
				text: "X\n".to_string(),
			}]
		);
	}

	#[test]
	fn pure_insertion_at_eof() {
		let hunks = plain("a\nb\n", "a\nb\nc\n");
		assert_eq!(
			hunks,
			vec![Hunk {
				kind: HunkKind::Insert,
				start_line: 2,
				end_line: 2,
				text: "c\n".to_string(),
			}]
		);
	}

	#[test]
	fn deletion_of_interior_lines() {
		let hunks = plain("a\nb\nc\nd\n", "a\nd\n");
		assert_eq!(
			hunks,
			vec![Hunk {
				kind: HunkKind::Delete,
				start_line: 1,
				end_line: 3,
				text: String::new(),
			}]
		);
	}

	#[test]
	fn delete_and_insert_collapse_into_replace() {
		// "b" and "c" are gone, "X" and "Y" appear in their place.
		let hunks = plain("a\nb\nc\nd\n", "a\nX\nY\nd\n");
		assert_eq!(hunks.len(), 1);
		assert_eq!(hunks[0].kind, HunkKind::Replace);
		assert_eq!((hunks[0].start_line, hunks[0].end_line), (1, 3));
		assert_eq!(hunks[0].text, "X\nY\n");
	}

	#[test]
	fn separate_changes_yield_separate_hunks() {
		let hunks = plain("a\nb\nc\nd\ne\n", "a\nB\nc\nd\nE\n");
		assert_eq!(hunks.len(), 2);
		assert_eq!((hunks[0].start_line, hunks[0].end_line), (1, 2));
		assert_eq!((hunks[1].start_line, hunks[1].end_line), (4, 5));
	}

	#[test]
	fn missing_trailing_newline_is_a_real_difference() {
		let hunks = plain("a\nb\n", "a\nb");
		assert_eq!(
			hunks,
			vec![Hunk {
				kind: HunkKind::Replace,
				start_line: 1,
				end_line: 2,
				text: "b".to_string(),
			}]
		);
		assert_round_trip("a\nb\n", "a\nb");
	}

	#[test]
	fn whitespace_differences_are_real_by_default() {
		let hunks = plain("a\n  b\n", "a\nb\n");
		assert_eq!(hunks.len(), 1);
		assert_eq!(hunks[0].kind, HunkKind::Replace);
	}

	#[test]
	fn whitespace_differences_ignored_on_request() {
		let options = DiffOptions {
			ignore_whitespace: true,
		};
		assert_eq!(diff("a\n  b\n", "a\nb  \n", &options), vec![]);
	}

	#[test]
	fn empty_baseline_becomes_one_insert() {
		let hunks = plain("", "a\nb\n");
		assert_eq!(
			hunks,
			vec![Hunk {
				kind: HunkKind::Insert,
				start_line: 0,
				end_line: 0,
				text: "a\nb\n".to_string(),
			}]
		);
	}

	#[test]
	fn empty_candidate_becomes_one_delete() {
		let hunks = plain("a\nb\n", "");
		assert_eq!(
			hunks,
			vec![Hunk {
				kind: HunkKind::Delete,
				start_line: 0,
				end_line: 2,
				text: String::new(),
			}]
		);
	}

	#[test]
	fn earliest_match_is_anchored() {
		// Both alignments of the repeated "a" are minimal; the first one wins,
		// so the insertion lands after the anchored line.
		let hunks = plain("a\n", "a\na\n");
		assert_eq!(
			hunks,
			vec![Hunk {
				kind: HunkKind::Insert,
				start_line: 1,
				end_line: 1,
				text: "a\n".to_string(),
			}]
		);
	}

	#[test]
	fn identical_inputs_give_identical_output() {
		let a = "fn main() {\n\tprintln!(\"hi\");\n}\n";
		let b = "fn main() {\n\tprintln!(\"hello\");\n\tprintln!(\"hi\");\n}\n";
		assert_eq!(plain(a, b), plain(a, b));
	}

	#[test]
	fn round_trip_over_small_sequences() {
		// Every pair of line sequences up to length three over {a, b}.
		let mut inputs = vec![String::new()];
		for len in 1..=3 {
			for bits in 0..(1 << len) {
				let mut text = String::new();
				for bit in 0..len {
					text.push_str(if (bits >> bit) & 1 == 0 { "a\n" } else { "b\n" });
				}
				inputs.push(text);
			}
		}
		for baseline in &inputs {
			for candidate in &inputs {
				assert_round_trip(baseline, candidate);
			}
		}
	}

	#[test]
	fn round_trip_on_interleaved_changes() {
		assert_round_trip("a\nb\nc\nd\ne\nf\n", "b\nx\nc\ne\ny\n");
		assert_round_trip("one\ntwo\nthree\n", "zero\none\nthree\nfour");
		assert_round_trip("x\n", "y\nx\nz\n");
	}
}

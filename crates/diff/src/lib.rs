//! Line-based diffing between a baseline snapshot and a candidate rewrite.
//!
//! The prediction engine captures a document snapshot (the *baseline*), asks a
//! backend for a rewritten version (the *candidate*), and needs the difference
//! between the two as an ordered list of [`Hunk`]s it can show, apply whole,
//! or apply one hunk at a time.
//!
//! # Design
//!
//! Diffing works on lines split with `split_inclusive('\n')`, so reassembling
//! matched and replaced lines is byte-exact with no trailing-newline special
//! cases. Alignment is a longest-common-subsequence over the line sequences
//! with common prefix/suffix trimming; adjacent delete+insert runs collapse
//! into a single replace.
//!
//! Determinism: identical inputs always produce an identical hunk sequence.
//! Where several minimal alignments exist, the earliest matching line is
//! anchored and deletions are emitted before insertions.

mod diff;
mod hunk;

pub use diff::{DiffOptions, diff};
pub use hunk::{ApplyError, Hunk, HunkKind, apply};

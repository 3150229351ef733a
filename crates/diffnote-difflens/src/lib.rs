//! Diff parsing and diff-scoped finding matching.
//!
//! Turns unified diffs into the new-file line ranges a commit changed
//! ([`hunk::HunkRange`], [`parser::FileDiff`]) and maps analysis findings
//! onto them ([`matcher::IssueDiffMatcher`]).

pub mod hunk;
pub mod matcher;
pub mod parser;

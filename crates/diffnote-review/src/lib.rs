//! Publishing orchestration for diffnote.
//!
//! Fetches a commit's diff through a [`store::CommitStore`], scopes findings
//! to the changed lines, posts them as commit annotations with a severity
//! summary, and reports a pass/fail build status.

pub mod dedup;
pub mod gate;
pub mod gitlab;
pub mod local;
pub mod markdown;
pub mod pipeline;
pub mod publisher;
pub mod report;
pub mod severity;
pub mod store;

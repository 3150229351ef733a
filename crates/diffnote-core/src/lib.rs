//! Core types, configuration, and error handling for diffnote.
//!
//! This crate provides the shared foundation used by the other diffnote crates:
//! - [`DiffnoteError`] and [`StoreError`]: error taxonomy using `thiserror`
//! - [`DiffnoteConfig`]: configuration loaded from `.diffnote.toml`
//! - Shared types: [`Severity`], [`Finding`], [`ExistingAnnotation`],
//!   [`RawDiff`], [`CommitState`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{DiffnoteConfig, GitLabConfig, ReviewConfig, TokenType};
pub use error::{DiffnoteError, StoreError};
pub use types::{CommitState, ExistingAnnotation, Finding, OutputFormat, RawDiff, Severity};

/// A convenience `Result` type for diffnote operations.
pub type Result<T> = std::result::Result<T, DiffnoteError>;

//! `yt-export` backs up a YouTrack project to a local directory tree,
//! one folder per issue with its content and attachments.

/// Runtime configuration loading and validation.
pub mod config;
/// The fetch-and-export loop and attachment downloads.
pub mod export;
/// Logging helpers used throughout the crate.
pub mod logging;
/// Flat-text rendering of issue content.
pub mod render;
/// Filesystem-safe folder name derivation.
pub mod sanitize;
/// YouTrack API client and issue data models.
pub mod youtrack;

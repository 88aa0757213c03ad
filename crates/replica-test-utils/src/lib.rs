//! Shared test utilities for the replica workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: real git repositories built with the git CLI, plus a git-annex availability check
//! - [`origin`]: [`OriginRepo`] builder for a published replica with history

pub mod git;
pub mod origin;

pub use origin::OriginRepo;

//! Error taxonomy.
//!
//! Only `close()` returns a typed error: a double-close is a condition a
//! driver retrying an incremental build might actually hit and want to
//! observe, not necessarily a bug by itself. Every other phase violation
//! (a query run against an open world) is an `assert!` — the caller has no
//! business recovering from it. This crate has no CLI layer so it pulls in
//! neither `anyhow` nor `thiserror`.

use std::fmt;

/// Errors surfaced by the open/closed phase transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WorldError {
    /// `close()` was called on a world that is already closed.
    AlreadyClosed,
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyClosed => write!(f, "world is already closed"),
        }
    }
}

impl std::error::Error for WorldError {}

//! # Error taxonomy
//!
//! Three families, one per layer:
//!
//! - [`FetchError`]: a source could not hand back content. Never fatal for a run.
//! - [`ExtractError`]: content arrived but did not yield a valid draw. Never fatal.
//! - [`StoreError`]: the persisted dataset is missing, unreadable or violates its
//!   invariants. Always fatal; the run aborts before any fetch.

use std::path::PathBuf;

use crate::draw::FetchTarget;

/// Failure reported by a [`DrawSource`](crate::source::DrawSource).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport level failure: connect error, timeout, non-success HTTP status,
    /// unreadable body. Transient by nature.
    #[error("{source_name} unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },
    /// The source answered, and the answer says the round does not exist yet.
    #[error("{source_name} has not published {target}")]
    NotPublished {
        source_name: &'static str,
        target: FetchTarget,
    },
    /// The source cannot serve this kind of target at all.
    #[error("{source_name} does not support {target}")]
    Unsupported {
        source_name: &'static str,
        target: FetchTarget,
    },
}

impl FetchError {
    pub fn unavailable(source_name: &'static str, reason: impl std::fmt::Display) -> Self {
        FetchError::Unavailable {
            source_name,
            reason: reason.to_string(),
        }
    }

    /// True when the failure says nothing about whether the round exists.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Unavailable { .. })
    }
}

/// Failure to turn raw content into a [`DrawRecord`](crate::draw::DrawRecord).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("payload is not readable: {0}")]
    Malformed(String),
    #[error("payload status is {0:?}, expected \"success\"")]
    BadStatus(Option<String>),
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    #[error("round must be positive, got {0}")]
    InvalidRound(i64),
    #[error("expected 6 distinct numbers in 1..=45, got {0:?}")]
    InvalidNumbers(Vec<i64>),
    #[error("bonus {0} is outside 1..=45 or repeats a main number")]
    InvalidBonus(i64),
    #[error("invalid draw date {0:?}")]
    InvalidDate(String),
    #[error("no extraction strategy matched")]
    NoStrategyMatched,
}

/// Fatal dataset store failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("dataset file {0} does not exist")]
    Missing(PathBuf),
    #[error("failed to read dataset file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to write dataset file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

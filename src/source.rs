//! # Draw Source Trait
//!
//! A `DrawSource` wraps one upstream data source behind a uniform contract:
//! fetch raw content for a [`FetchTarget`], then extract a [`DrawRecord`] from it.
//!
//! ## Contract
//!
//! - `fetch` performs at most one outbound request, bounded by the adapter's
//!   timeout, and never panics on transport problems. Everything that goes
//!   wrong on the wire comes back as [`FetchError::Unavailable`].
//! - `extract` is pure. It never touches the network, which keeps every
//!   parsing rule testable against captured payloads.
//!
//! ## Adding a Source
//!
//! 1. Implement `DrawSource` for the new adapter
//! 2. Put the parsing rules in `crate::extract`
//! 3. Hand the adapter to the `Reconciler`

use async_trait::async_trait;
use log::debug;

use crate::draw::{DrawRecord, FetchTarget};
use crate::error::{ExtractError, FetchError};

/// Body returned by a source, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent {
    pub body: String,
}

impl RawContent {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// Why a single attempt at a target produced no record.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{source_name}: {error}")]
    Extract {
        source_name: &'static str,
        error: ExtractError,
    },
}

impl AttemptError {
    /// True when the failure is a transport problem rather than an answer.
    pub fn is_transient(&self) -> bool {
        match self {
            AttemptError::Fetch(e) => e.is_transient(),
            AttemptError::Extract { .. } => false,
        }
    }
}

/// The trait every upstream adapter implements.
///
/// Adapters must be `Send + Sync` so they can live behind `Box<dyn DrawSource>`
/// inside the reconciler.
#[async_trait]
pub trait DrawSource: Send + Sync {
    /// Short name used in logs and progress output.
    fn name(&self) -> &'static str;

    /// Whether this source can answer `target` at all.
    fn supports(&self, target: FetchTarget) -> bool;

    /// Performs one request for `target`.
    async fn fetch(&self, target: FetchTarget) -> Result<RawContent, FetchError>;

    /// Parses content previously returned by [`fetch`](Self::fetch).
    fn extract(&self, raw: &RawContent) -> Result<DrawRecord, ExtractError>;

    /// Fetch followed by extract. Also rejects a record for a different round
    /// than the one asked for.
    async fn fetch_record(&self, target: FetchTarget) -> Result<DrawRecord, AttemptError> {
        if !self.supports(target) {
            return Err(FetchError::Unsupported {
                source_name: self.name(),
                target,
            }
            .into());
        }

        let raw = self.fetch(target).await?;
        let record = self.extract(&raw).map_err(|error| AttemptError::Extract {
            source_name: self.name(),
            error,
        })?;

        if let FetchTarget::Round(expected) = target {
            if record.round() != expected {
                debug!(
                    "{} answered round {} when asked for {}",
                    self.name(),
                    record.round(),
                    expected
                );
                return Err(AttemptError::Extract {
                    source_name: self.name(),
                    error: ExtractError::InvalidRound(i64::from(record.round())),
                });
            }
        }

        Ok(record)
    }
}

//! # Lotto Sync
//!
//! Keeps a local JSON history of weekly lottery draws up to date.
//!
//! ## Overview
//!
//! A run loads the stored history, works out which rounds are missing after
//! the stored cursor, fetches them from upstream sources in priority order,
//! and persists the merged history once at the end. Nothing is written when
//! nothing new was found.
//!
//! ## Architecture
//!
//! ### Extraction Layer
//! Pure functions turning raw source content into validated [`DrawRecord`]s:
//! a JSON payload reader for the official API and an ordered list of markup
//! strategies for the search page.
//!
//! ### Source Layer
//! [`DrawSource`] adapters wrapping one upstream each. Transport problems come
//! back as values, never as panics or fatal errors.
//!
//! ### Reconciliation Layer
//! [`Reconciler`] decides which rounds to ask for and when to stop.
//!
//! ### Storage Layer
//! [`DatasetStore`] loads and atomically replaces the JSON file.

// Core Types
/// Draw records and fetch targets
pub mod draw;
/// Round to date arithmetic
pub mod calendar;
/// Error taxonomy
pub mod error;

// Extraction & Sources
/// Record extractors for API payloads and markup
pub mod extract;
/// Trait for upstream adapters
pub mod source;
/// Upstream adapters (official API, search page)
pub mod sources;

// Orchestration & Storage
/// Gap-fill reconciliation
pub mod reconciler;
/// Persisted dataset
pub mod store;
/// Number statistics over the dataset
pub mod stats;

// Settings & Configuration
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use draw::{Bonus, DrawRecord, FetchTarget, Round};
pub use reconciler::{Reconciler, SyncReport};
pub use settings::Settings;
pub use source::DrawSource;
pub use store::{Dataset, DatasetStore};

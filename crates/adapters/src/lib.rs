//! # knowledge-search-adapters
//!
//! Adapter implementations for ports (embedding, vector store, logging,
//! telemetry). This crate depends on `ports`, `domain`, `config`, and `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

/// External embedding adapters.
pub mod embedding;

pub mod logger;
pub mod telemetry;
pub mod vector_store;

pub use logger::{TracingLogger, parse_log_level};
pub use telemetry::{InMemoryTelemetry, NoopTelemetry};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

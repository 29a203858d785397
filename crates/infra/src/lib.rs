//! # knowledge-search-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

/// Config rendering helpers used by the server binary.
pub mod config_check;
/// Infra error aliases.
pub mod error;
/// Adapter construction from config.
pub mod factory;
/// Service wiring and collection bootstrap.
pub mod runtime;

pub use config_check::load_effective_config_json;
pub use error::{InfraError, InfraResult};
pub use factory::{SERVICE_NAME, build_embedding_port, build_logger, build_vector_store_port};
pub use runtime::{BootstrapSummary, SearchRuntime};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

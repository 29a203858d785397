//! # knowledge-search-server
//!
//! HTTP surface of the search service: routes, error mapping, and request
//! middleware. The binary in `main.rs` handles flags, logging, and startup.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod error;
pub mod middleware;
pub mod routes;

pub use error::{ApiError, status_for};
pub use middleware::REQUEST_ID_HEADER;
pub use routes::{AppState, router};

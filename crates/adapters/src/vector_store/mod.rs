//! Vector store adapters.

mod error;

#[cfg(feature = "qdrant-rest")]
mod qdrant;

pub use error::{QdrantErrorContext, map_rest_error};

#[cfg(feature = "qdrant-rest")]
pub use error::map_rest_transport_error;
#[cfg(feature = "qdrant-rest")]
pub use qdrant::{QdrantRestConfig, QdrantRestVectorStore};

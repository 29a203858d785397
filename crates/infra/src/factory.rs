//! Adapter construction from validated config.

use crate::InfraResult;
use knowledge_search_adapters::embedding::openai::{HttpEmbedding, HttpEmbeddingConfig};
use knowledge_search_adapters::vector_store::{QdrantRestConfig, QdrantRestVectorStore};
use knowledge_search_adapters::{TracingLogger, parse_log_level};
use knowledge_search_config::ValidatedSearchConfig;
use knowledge_search_ports::{EmbeddingPort, LogFields, VectorStorePort};
use serde_json::Value;
use std::sync::Arc;

/// Service label attached to every log event.
pub const SERVICE_NAME: &str = "knowledge-search";

/// Build the embedding port from `embedding.*`.
pub fn build_embedding_port(config: &ValidatedSearchConfig) -> InfraResult<Arc<dyn EmbeddingPort>> {
    let adapter_config = HttpEmbeddingConfig::from_embedding_config(&config.as_ref().embedding);
    let adapter = HttpEmbedding::new(&adapter_config)
        .map_err(|error| error.with_metadata("base_url", adapter_config.base_url.to_string()))?;
    Ok(Arc::new(adapter))
}

/// Build the vector store port from `vectorStore.*`.
pub fn build_vector_store_port(
    config: &ValidatedSearchConfig,
) -> InfraResult<Arc<dyn VectorStorePort>> {
    let mut adapter_config =
        QdrantRestConfig::from_vector_store_config(&config.as_ref().vector_store);
    adapter_config.timeout_ms = duration_ms(config.vector_store_timeout());
    let adapter = QdrantRestVectorStore::new(&adapter_config)?;
    Ok(Arc::new(adapter))
}

/// Logger honoring `logging.level`, tagged with the service name.
#[must_use]
pub fn build_logger(config: &ValidatedSearchConfig) -> TracingLogger {
    let mut base = LogFields::new();
    base.insert("service".into(), Value::from(SERVICE_NAME));
    TracingLogger::new()
        .with_base_fields(base)
        .with_min_level(parse_log_level(&config.as_ref().logging.level))
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_search_config::SearchServiceConfig;
    use knowledge_search_ports::LogLevel;
    use knowledge_search_shared::ErrorEnvelope;

    fn config() -> InfraResult<ValidatedSearchConfig> {
        SearchServiceConfig::default()
            .validate_and_normalize()
            .map_err(ErrorEnvelope::from)
    }

    #[test]
    fn default_config_builds_both_ports() -> InfraResult<()> {
        let config = config()?;

        let embedding = build_embedding_port(&config)?;
        let store = build_vector_store_port(&config)?;

        assert_eq!(embedding.model_info().dimension, config.as_ref().embedding.dimension);
        assert_eq!(store.info().provider.as_ref(), "qdrant");
        assert_eq!(
            store.info().endpoint.as_ref(),
            config.as_ref().vector_store.url.trim_end_matches('/')
        );
        Ok(())
    }

    #[test]
    fn logger_uses_configured_level() -> InfraResult<()> {
        let mut raw = SearchServiceConfig::default();
        raw.logging.level = "warn".into();
        let config = raw.validate_and_normalize().map_err(ErrorEnvelope::from)?;

        assert_eq!(build_logger(&config).min_level(), LogLevel::Warn);
        Ok(())
    }
}

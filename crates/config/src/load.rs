//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{ConfigEnv, LogFormat, SearchServiceConfig, ValidatedSearchConfig, apply_env_overrides};
use knowledge_search_shared::{ErrorClass, ErrorCode, ErrorEnvelope, SecretString};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`ConfigEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`SearchServiceConfig::default()`)
pub fn load_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &ConfigEnv,
) -> Result<ValidatedSearchConfig, ErrorEnvelope> {
    let mut config = match config_json {
        None => SearchServiceConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };

    if let Some(input) = overrides_json {
        parse_overrides_json(input)?.apply(&mut config);
    }

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

/// Load the config from an optional file path (`.json` or `.toml`).
pub fn load_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &ConfigEnv,
) -> Result<ValidatedSearchConfig, ErrorEnvelope> {
    let mut config = match config_path {
        None => SearchServiceConfig::default(),
        Some(path) => {
            let config_text = read_config_file(path)?;
            let format = detect_config_format(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };

    if let Some(input) = overrides_json {
        parse_overrides_json(input)?.apply(&mut config);
    }

    apply_env_overrides(config, env)
}

/// Load the config from std env and an optional file path.
pub fn load_config_std_env(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<ValidatedSearchConfig, ErrorEnvelope> {
    let env = ConfigEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_config_from_path(config_path, overrides_json, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
///
/// Secrets render as `[REDACTED]`.
pub fn to_pretty_json(config: &SearchServiceConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &SearchServiceConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<SearchServiceConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<ConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ConfigOverrides {
    version: Option<u32>,
    vector_store: VectorStoreOverrides,
    embedding: EmbeddingOverrides,
    search: SearchOverrides,
    collections: CollectionsOverrides,
    server: ServerOverrides,
    logging: LoggingOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct VectorStoreOverrides {
    url: Option<Box<str>>,
    api_key: Option<SecretString>,
    timeout_ms: Option<u64>,
    vector_size: Option<u32>,
    distance: Option<Box<str>>,
    hnsw: HnswOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct HnswOverrides {
    m: Option<u32>,
    ef_construct: Option<u32>,
    full_scan_threshold: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct EmbeddingOverrides {
    base_url: Option<Box<str>>,
    model: Option<Box<str>>,
    api_key: Option<SecretString>,
    dimension: Option<u32>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct SearchOverrides {
    default_limit: Option<u32>,
    max_limit: Option<u32>,
    default_score_threshold: Option<f32>,
    over_fetch_factor: Option<u32>,
    per_collection_timeout_ms: Option<u64>,
    max_concurrency: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct CollectionsOverrides {
    global_principles: Option<Box<str>>,
    unified_index: Option<Box<str>>,
    bootstrap_on_start: Option<bool>,
    projects: Option<Vec<Box<str>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ServerOverrides {
    host: Option<Box<str>>,
    port: Option<u16>,
    cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct LoggingOverrides {
    level: Option<Box<str>>,
    format: Option<LogFormat>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut SearchServiceConfig) {
        set(&mut config.version, self.version);

        let store = self.vector_store;
        set(&mut config.vector_store.url, store.url);
        set_some(&mut config.vector_store.api_key, store.api_key);
        set(&mut config.vector_store.timeout_ms, store.timeout_ms);
        set(&mut config.vector_store.vector_size, store.vector_size);
        set(&mut config.vector_store.distance, store.distance);
        set(&mut config.vector_store.hnsw.m, store.hnsw.m);
        set(&mut config.vector_store.hnsw.ef_construct, store.hnsw.ef_construct);
        set(
            &mut config.vector_store.hnsw.full_scan_threshold,
            store.hnsw.full_scan_threshold,
        );

        let embedding = self.embedding;
        set(&mut config.embedding.base_url, embedding.base_url);
        set(&mut config.embedding.model, embedding.model);
        set_some(&mut config.embedding.api_key, embedding.api_key);
        set(&mut config.embedding.dimension, embedding.dimension);
        set(&mut config.embedding.timeout_ms, embedding.timeout_ms);

        let search = self.search;
        set(&mut config.search.default_limit, search.default_limit);
        set(&mut config.search.max_limit, search.max_limit);
        set(
            &mut config.search.default_score_threshold,
            search.default_score_threshold,
        );
        set(&mut config.search.over_fetch_factor, search.over_fetch_factor);
        set(
            &mut config.search.per_collection_timeout_ms,
            search.per_collection_timeout_ms,
        );
        set(&mut config.search.max_concurrency, search.max_concurrency);

        let collections = self.collections;
        set(
            &mut config.collections.global_principles,
            collections.global_principles,
        );
        set(&mut config.collections.unified_index, collections.unified_index);
        set(
            &mut config.collections.bootstrap_on_start,
            collections.bootstrap_on_start,
        );
        set(&mut config.collections.projects, collections.projects);

        set(&mut config.server.host, self.server.host);
        set(&mut config.server.port, self.server.port);
        set(&mut config.server.cors_enabled, self.server.cors_enabled);

        set(&mut config.logging.level, self.logging.level);
        set(&mut config.logging.format, self.logging.format);
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn set_some<T>(field: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *field = value;
    }
}

//! Environment variable parsing and env-to-config merging.
//!
//! This module keeps env parsing:
//! - strict (invalid values fail fast)
//! - compatible (legacy unprefixed names are accepted as aliases)
//! - safe (secret values are redacted in error metadata)

use crate::schema::{LogFormat, SearchServiceConfig, ValidatedSearchConfig};
use knowledge_search_shared::{ErrorCode, ErrorEnvelope, REDACTED_VALUE, SecretString, is_secret_key};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Env var: full vector store URL.
pub const ENV_VECTOR_STORE_URL: &str = "KS_VECTOR_STORE_URL";
/// Env var: vector store host (composed with the port into the URL).
pub const ENV_QDRANT_HOST: &str = "KS_QDRANT_HOST";
/// Env var: vector store host (alias).
pub const ENV_QDRANT_HOST_ALIAS: &str = "QDRANT_HOST";
/// Env var: vector store port.
pub const ENV_QDRANT_PORT: &str = "KS_QDRANT_PORT";
/// Env var: vector store port (alias).
pub const ENV_QDRANT_PORT_ALIAS: &str = "QDRANT_PORT";
/// Env var: vector store API key (secret).
pub const ENV_QDRANT_API_AUTH: &str = "KS_QDRANT_API_KEY";
/// Env var: vector store API key (alias).
pub const ENV_QDRANT_API_AUTH_ALIAS: &str = "QDRANT_API_KEY";
/// Env var: vector store timeout in milliseconds.
pub const ENV_VECTOR_STORE_TIMEOUT_MS: &str = "KS_VECTOR_STORE_TIMEOUT_MS";

/// Env var: embedding base URL.
pub const ENV_EMBEDDING_BASE_URL: &str = "KS_EMBEDDING_BASE_URL";
/// Env var: embedding model.
pub const ENV_EMBEDDING_MODEL: &str = "KS_EMBEDDING_MODEL";
/// Env var: embedding model (alias).
pub const ENV_EMBEDDING_MODEL_ALIAS: &str = "EMBEDDING_MODEL";
/// Env var: embedding API key (secret).
pub const ENV_EMBEDDING_API_AUTH: &str = "KS_EMBEDDING_API_KEY";
/// Env var: embedding dimension; also sets `vectorStore.vectorSize`.
pub const ENV_EMBEDDING_DIMENSION: &str = "KS_EMBEDDING_DIMENSION";

/// Env var: per-collection over-fetch factor.
pub const ENV_SEARCH_OVER_FETCH_FACTOR: &str = "KS_SEARCH_OVER_FETCH_FACTOR";
/// Env var: per-collection search timeout in milliseconds.
pub const ENV_SEARCH_TIMEOUT_MS: &str = "KS_SEARCH_TIMEOUT_MS";
/// Env var: maximum per-collection searches in flight.
pub const ENV_SEARCH_MAX_CONCURRENCY: &str = "KS_SEARCH_MAX_CONCURRENCY";

/// Env var: HTTP bind host.
pub const ENV_API_HOST: &str = "KS_API_HOST";
/// Env var: HTTP bind host (alias).
pub const ENV_API_HOST_ALIAS: &str = "API_HOST";
/// Env var: HTTP bind port.
pub const ENV_API_PORT: &str = "KS_API_PORT";
/// Env var: HTTP bind port (alias).
pub const ENV_API_PORT_ALIAS: &str = "API_PORT";

/// Env var: log level.
pub const ENV_LOG_LEVEL: &str = "KS_LOG_LEVEL";
/// Env var: log level (alias).
pub const ENV_LOG_LEVEL_ALIAS: &str = "LOG_LEVEL";
/// Env var: log format (`json` | `pretty`).
pub const ENV_LOG_FORMAT: &str = "KS_LOG_FORMAT";

/// Env var: create collections before serving.
pub const ENV_BOOTSTRAP_ON_START: &str = "KS_BOOTSTRAP_ON_START";

const ALL_VARS: [&str; 24] = [
    ENV_VECTOR_STORE_URL,
    ENV_QDRANT_HOST,
    ENV_QDRANT_HOST_ALIAS,
    ENV_QDRANT_PORT,
    ENV_QDRANT_PORT_ALIAS,
    ENV_QDRANT_API_AUTH,
    ENV_QDRANT_API_AUTH_ALIAS,
    ENV_VECTOR_STORE_TIMEOUT_MS,
    ENV_EMBEDDING_BASE_URL,
    ENV_EMBEDDING_MODEL,
    ENV_EMBEDDING_MODEL_ALIAS,
    ENV_EMBEDDING_API_AUTH,
    ENV_EMBEDDING_DIMENSION,
    ENV_SEARCH_OVER_FETCH_FACTOR,
    ENV_SEARCH_TIMEOUT_MS,
    ENV_SEARCH_MAX_CONCURRENCY,
    ENV_API_HOST,
    ENV_API_HOST_ALIAS,
    ENV_API_PORT,
    ENV_API_PORT_ALIAS,
    ENV_LOG_LEVEL,
    ENV_LOG_LEVEL_ALIAS,
    ENV_LOG_FORMAT,
    ENV_BOOTSTRAP_ON_START,
];

/// Typed env-derived overrides for `SearchServiceConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigEnv {
    /// Override for `vectorStore.url`.
    pub vector_store_url: Option<Box<str>>,
    /// Host replacing the one in `vectorStore.url`.
    pub qdrant_host: Option<Box<str>>,
    /// Port replacing the one in `vectorStore.url`.
    pub qdrant_port: Option<u16>,
    /// Secret: vector store API key.
    pub qdrant_api_key: Option<SecretString>,
    /// Override for `vectorStore.timeoutMs`.
    pub vector_store_timeout_ms: Option<u64>,
    /// Override for `embedding.baseUrl`.
    pub embedding_base_url: Option<Box<str>>,
    /// Override for `embedding.model`.
    pub embedding_model: Option<Box<str>>,
    /// Secret: embedding API key.
    pub embedding_api_key: Option<SecretString>,
    /// Override for `embedding.dimension` and `vectorStore.vectorSize`.
    pub embedding_dimension: Option<u32>,
    /// Override for `search.overFetchFactor`.
    pub search_over_fetch_factor: Option<u32>,
    /// Override for `search.perCollectionTimeoutMs`.
    pub search_timeout_ms: Option<u64>,
    /// Override for `search.maxConcurrency`.
    pub search_max_concurrency: Option<u32>,
    /// Override for `server.host`.
    pub api_host: Option<Box<str>>,
    /// Override for `server.port`.
    pub api_port: Option<u16>,
    /// Override for `logging.level`.
    pub log_level: Option<Box<str>>,
    /// Override for `logging.format`.
    pub log_format: Option<LogFormat>,
    /// Override for `collections.bootstrapOnStart`.
    pub bootstrap_on_start: Option<bool>,
}

impl ConfigEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            vector_store_url: parse_optional_url_string(map, ENV_VECTOR_STORE_URL)?,
            qdrant_host: parse_optional_trimmed_string_any(
                map,
                &[ENV_QDRANT_HOST, ENV_QDRANT_HOST_ALIAS],
            )?,
            qdrant_port: parse_optional_u16_any(map, &[ENV_QDRANT_PORT, ENV_QDRANT_PORT_ALIAS])?,
            qdrant_api_key: parse_optional_secret_any(
                map,
                &[ENV_QDRANT_API_AUTH, ENV_QDRANT_API_AUTH_ALIAS],
            )?,
            vector_store_timeout_ms: parse_optional_u64(map, ENV_VECTOR_STORE_TIMEOUT_MS)?,
            embedding_base_url: parse_optional_url_string(map, ENV_EMBEDDING_BASE_URL)?,
            embedding_model: parse_optional_trimmed_string_any(
                map,
                &[ENV_EMBEDDING_MODEL, ENV_EMBEDDING_MODEL_ALIAS],
            )?,
            embedding_api_key: parse_optional_secret_any(map, &[ENV_EMBEDDING_API_AUTH])?,
            embedding_dimension: parse_optional_u32(map, ENV_EMBEDDING_DIMENSION)?,
            search_over_fetch_factor: parse_optional_u32(map, ENV_SEARCH_OVER_FETCH_FACTOR)?,
            search_timeout_ms: parse_optional_u64(map, ENV_SEARCH_TIMEOUT_MS)?,
            search_max_concurrency: parse_optional_u32(map, ENV_SEARCH_MAX_CONCURRENCY)?,
            api_host: parse_optional_trimmed_string_any(map, &[ENV_API_HOST, ENV_API_HOST_ALIAS])?,
            api_port: parse_optional_u16_any(map, &[ENV_API_PORT, ENV_API_PORT_ALIAS])?,
            log_level: parse_optional_trimmed_string_any(
                map,
                &[ENV_LOG_LEVEL, ENV_LOG_LEVEL_ALIAS],
            )?,
            log_format: parse_optional_log_format(map, ENV_LOG_FORMAT)?,
            bootstrap_on_start: parse_optional_bool(map, ENV_BOOTSTRAP_ON_START)?,
        })
    }

    /// Parse env overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ALL_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
///
/// `KS_VECTOR_STORE_URL` replaces the URL outright; otherwise the host and
/// port variables patch the configured URL.
pub fn apply_env_overrides(
    base: SearchServiceConfig,
    env: &ConfigEnv,
) -> Result<ValidatedSearchConfig, ErrorEnvelope> {
    let mut config = base;

    if let Some(url) = env.vector_store_url.as_deref() {
        config.vector_store.url = url.into();
    } else if env.qdrant_host.is_some() || env.qdrant_port.is_some() {
        config.vector_store.url =
            compose_store_url(&config.vector_store.url, env.qdrant_host.as_deref(), env.qdrant_port)?;
    }
    set_clone(&mut config.vector_store.api_key, env.qdrant_api_key.as_ref());
    set_copy(&mut config.vector_store.timeout_ms, env.vector_store_timeout_ms);

    set_box_str(&mut config.embedding.base_url, env.embedding_base_url.as_deref());
    set_box_str(&mut config.embedding.model, env.embedding_model.as_deref());
    set_clone(&mut config.embedding.api_key, env.embedding_api_key.as_ref());
    if let Some(dimension) = env.embedding_dimension {
        config.embedding.dimension = dimension;
        config.vector_store.vector_size = dimension;
    }

    set_copy(&mut config.search.over_fetch_factor, env.search_over_fetch_factor);
    set_copy(&mut config.search.per_collection_timeout_ms, env.search_timeout_ms);
    set_copy(&mut config.search.max_concurrency, env.search_max_concurrency);

    set_box_str(&mut config.server.host, env.api_host.as_deref());
    set_copy(&mut config.server.port, env.api_port);
    set_box_str(&mut config.logging.level, env.log_level.as_deref());
    set_copy(&mut config.logging.format, env.log_format);
    set_copy(&mut config.collections.bootstrap_on_start, env.bootstrap_on_start);

    config.validate_and_normalize().map_err(Into::into)
}

fn compose_store_url(
    base: &str,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<Box<str>, ErrorEnvelope> {
    let invalid = |reason: &str| {
        ErrorEnvelope::expected(
            ErrorCode::new("env", "invalid_url"),
            format!("cannot compose vector store URL: {reason}"),
        )
        .with_metadata("env_var", ENV_QDRANT_HOST)
    };

    let mut url = Url::parse(base).map_err(|error| invalid(&error.to_string()))?;
    if let Some(host) = host {
        url.set_host(Some(host))
            .map_err(|error| invalid(&error.to_string()))?;
    }
    if let Some(port) = port {
        url.set_port(Some(port))
            .map_err(|()| invalid("URL cannot carry a port"))?;
    }
    Ok(url.as_str().trim_end_matches('/').into())
}

fn set_copy<T: Copy>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn set_box_str(field: &mut Box<str>, value: Option<&str>) {
    if let Some(value) = value {
        *field = value.into();
    }
}

fn set_clone<T: Clone>(field: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *field = Some(value.clone());
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    #[error("{var} must be non-empty")]
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    #[error("{var} must be non-empty")]
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    #[error("{var} must be a boolean")]
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    #[error("{var} must be an integer")]
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    #[error("{var} must be an http(s) URL")]
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    #[error("{var} has an unsupported value")]
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => "empty_env_var",
            Self::InvalidBool { .. } => "invalid_bool",
            Self::InvalidInt { .. } => "invalid_int",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::InvalidEnum { .. } => "invalid_enum",
        };
        ErrorCode::new("env", code)
    }
}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value }
            | EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
        }
    }
}

fn first_present<'a>(
    map: &BTreeMap<String, String>,
    vars: &[&'a str],
) -> Option<&'a str> {
    vars.iter().copied().find(|var| map.contains_key(*var))
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_trimmed_string_any(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
) -> Result<Option<Box<str>>, EnvParseError> {
    first_present(map, vars).map_or(Ok(None), |var| parse_optional_trimmed_string(map, var))
}

fn parse_optional_secret_any(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(var) = first_present(map, vars) else {
        return Ok(None);
    };
    let trimmed = map.get(var).map(|raw| raw.trim()).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }
    Ok(Some(SecretString::new(trimmed.to_owned())))
}

fn parse_optional_number<T: std::str::FromStr>(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    parse_optional_number(map, var)
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    parse_optional_number(map, var)
}

fn parse_optional_u16_any(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
) -> Result<Option<u16>, EnvParseError> {
    first_present(map, vars).map_or(Ok(None), |var| parse_optional_number(map, var))
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: raw.clone(),
        }),
    }
}

fn parse_optional_log_format(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<LogFormat>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    LogFormat::parse(raw)
        .map(Some)
        .ok_or_else(|| EnvParseError::InvalidEnum {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_url_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    let parsed = Url::parse(trimmed).map_err(|_| EnvParseError::InvalidUrl {
        var,
        value: raw.clone(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(EnvParseError::InvalidUrl {
            var,
            value: raw.clone(),
        });
    }

    Ok(Some(parsed.as_str().trim_end_matches('/').into()))
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED_VALUE.to_string()
    } else {
        value.to_string()
    }
}

//! Integration tests for parsing config fixtures.

use knowledge_search_config::{
    ConfigEnv, LogFormat, load_config_from_path, parse_config_json, parse_config_toml,
};
use knowledge_search_domain::DistanceMetric;
use knowledge_search_shared::ErrorCode;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    Ok(fs::read_to_string(fixture_path(relative))?)
}

#[test]
fn parses_valid_toml_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("service.valid.toml")?;
    let config = parse_config_toml(&contents)?;

    assert_eq!(config.vector_store.url.as_ref(), "http://qdrant.internal:6333");
    assert_eq!(config.collection_spec().dimension, 1024);
    assert_eq!(config.collection_spec().distance, DistanceMetric::Cosine);
    assert_eq!(config.collection_spec().index.m, 32);
    assert_eq!(config.search.over_fetch_factor, 3);
    assert_eq!(config.per_collection_timeout().as_millis(), 5000);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(!config.server.cors_applies());

    let projects: Vec<&str> = config
        .bootstrap_projects()
        .iter()
        .map(AsRef::as_ref)
        .collect();
    assert_eq!(projects, vec!["alpha", "beta"]);
    Ok(())
}

#[test]
fn dimension_mismatch_fixture_is_rejected() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("service.invalid-dimension.json")?;
    let error = parse_config_json(&contents)
        .err()
        .ok_or_else(|| std::io::Error::other("expected dimension mismatch"))?;
    assert_eq!(error.code, ErrorCode::new("config", "dimension_mismatch"));
    Ok(())
}

#[test]
fn loads_toml_by_extension() -> Result<(), Box<dyn Error>> {
    let config = load_config_from_path(
        Some(&fixture_path("service.valid.toml")),
        None,
        &ConfigEnv::default(),
    )?;
    assert_eq!(config.server.port, 9100);
    Ok(())
}

//! Effective config rendering for the server's `--print-config` flag.

use crate::InfraResult;
use knowledge_search_config::{ConfigEnv, load_config_from_path, to_pretty_json};
use knowledge_search_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config, returning deterministic pretty JSON.
///
/// Secrets render redacted.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let env = ConfigEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let config = load_config_from_path(config_path, overrides_json, &env)?;
    to_pretty_json(config.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_show_up_redacted() -> InfraResult<()> {
        let mut env = BTreeMap::new();
        env.insert("KS_QDRANT_API_KEY".to_owned(), "super-secret".to_owned()); // pragma: allowlist secret
        env.insert("KS_API_PORT".to_owned(), "9100".to_owned());

        let rendered = load_effective_config_json(&env, None, None)?;

        assert!(rendered.contains("9100"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let mut env = BTreeMap::new();
        env.insert("KS_API_PORT".to_owned(), "not-a-port".to_owned());

        assert!(load_effective_config_json(&env, None, None).is_err());
    }
}

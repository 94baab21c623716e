use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `storage.object-store-path`
pub const ENV_OBJECT_STORE_PATH: &str = "HARVEST_OBJECT_STORE_PATH";

/// Environment variable overriding `storage.document-store-path`
pub const ENV_DOCUMENT_STORE_PATH: &str = "HARVEST_DOCUMENT_STORE_PATH";

/// Loads and parses a configuration file from the given path
///
/// Storage locations may be overridden from the environment before the
/// configuration is validated, so a bad override fails here and not halfway
/// through a run.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Applies storage overrides using the given variable lookup
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_OBJECT_STORE_PATH) {
        tracing::debug!("Object store path overridden from {}", ENV_OBJECT_STORE_PATH);
        config.storage.object_store_path = path;
    }

    if let Some(path) = lookup(ENV_DOCUMENT_STORE_PATH) {
        tracing::debug!(
            "Document store path overridden from {}",
            ENV_DOCUMENT_STORE_PATH
        );
        config.storage.document_store_path = path;
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so captures and records can be traced back to the
/// configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

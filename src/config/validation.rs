use crate::config::types::{Config, CrawlerConfig, ExtractionConfig, SiteConfig, StorageConfig};
use crate::url::{extract_domain, is_domain_allowed};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_extraction_config(&config.extraction)?;
    Ok(())
}

/// Validates the site name, which becomes an object key segment
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    if config.name.contains('/') || config.name.contains("..") {
        return Err(ConfigError::Validation(format!(
            "site name must be a single key segment, got '{}'",
            config.name
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.allowed_domains.is_empty() {
        return Err(ConfigError::Validation(
            "allowed-domains must contain at least one domain".to_string(),
        ));
    }

    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "seeds must contain at least one URL".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }

        let host = extract_domain(&url)
            .ok_or_else(|| ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", seed)))?;

        if !is_domain_allowed(&host, &config.allowed_domains) {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' is outside allowed-domains",
                seed
            )));
        }
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 256 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 256, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage locations
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.object_store_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "object-store-path cannot be empty".to_string(),
        ));
    }

    if config.document_store_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "document-store-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates extraction selectors and filters
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.title_selector,
        &config.description_selector,
        &config.text_selector,
        &config.payload_selector,
    ] {
        Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.clone(),
            message: e.to_string(),
        })?;
    }

    if config.payload_keys.iter().any(|key| key.is_empty()) {
        return Err(ConfigError::Validation(
            "payload-keys cannot contain empty keys".to_string(),
        ));
    }

    if config.invalid_pages.iter().any(|page| page.is_empty()) {
        return Err(ConfigError::Validation(
            "invalid-pages cannot contain empty substrings".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)
    } else {
        validate_domain_string(pattern)
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

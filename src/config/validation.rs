use crate::config::types::{Config, FetcherConfig, OutputConfig, SeedConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_seed_config(&config.seeds)?;
    Ok(())
}

/// Validates paper API access configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    validate_http_url("api-base-url", &config.api_base_url)?;
    validate_http_url("search-url", &config.search_url)?;

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.cooldown_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "cooldown-ms must be <= 60000ms, got {}ms",
            config.cooldown_ms
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed sources
fn validate_seed_config(config: &SeedConfig) -> Result<(), ConfigError> {
    if config.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed source (titles, titles-dir or ids) is required".to_string(),
        ));
    }

    if let Some(title) = config.titles.iter().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "seed titles cannot be blank, got '{}'",
            title
        )));
    }

    if config.ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "seed ids cannot be blank".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a URL parses and uses an HTTP scheme
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use an HTTP(S) scheme",
            field, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("api-base-url", "https://api.semanticscholar.org/v1").is_ok());
        assert!(validate_http_url("api-base-url", "http://127.0.0.1:8080").is_ok());

        assert!(validate_http_url("api-base-url", "not a url").is_err());
        assert!(validate_http_url("api-base-url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_validate_fetcher_limits() {
        let mut config = FetcherConfig::default();
        assert!(validate_fetcher_config(&config).is_ok());

        config.cooldown_ms = 0;
        assert!(validate_fetcher_config(&config).is_ok());

        config.cooldown_ms = 120_000;
        assert!(validate_fetcher_config(&config).is_err());

        config.cooldown_ms = 500;
        config.max_retries = 11;
        assert!(validate_fetcher_config(&config).is_err());
    }

    #[test]
    fn test_validate_seed_sources() {
        let mut seeds = SeedConfig::default();
        assert!(validate_seed_config(&seeds).is_err());

        seeds.titles = vec!["Attention Is All You Need".to_string()];
        assert!(validate_seed_config(&seeds).is_ok());

        seeds.titles.push("   ".to_string());
        assert!(validate_seed_config(&seeds).is_err());
    }
}

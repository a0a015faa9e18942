use crate::config::types::{
    Config, DiscoveryConfig, ExtractionConfig, HttpConfig, OutputConfig, SinkConfig, SinkKind,
    SiteConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_http_config(&config.http)?;
    validate_discovery_config(&config.discovery)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    validate_sink_config(&config.sink)?;
    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &config.base_url {
        validate_http_url("base-url", base_url)?;
    }
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if !(10..=120).contains(&config.timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 10 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs == 0 || config.connect_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be between 1 and timeout-secs ({}), got {}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_category_pages < 1 {
        return Err(ConfigError::Validation(
            "max-category-pages must be >= 1".to_string(),
        ));
    }

    if config.empty_page_limit < 1 {
        return Err(ConfigError::Validation(
            "empty-page-limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch-size must be >= 1".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) cannot exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.urls_path.is_empty() {
        return Err(ConfigError::Validation(
            "urls-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_sink_config(config: &SinkConfig) -> Result<(), ConfigError> {
    match config.kind {
        SinkKind::Http => validate_http_url("endpoint", &config.endpoint)?,
        SinkKind::Sqlite => {
            if config.database_path.is_empty() {
                return Err(ConfigError::Validation(
                    "database-path cannot be empty for the sqlite sink".to_string(),
                ));
            }
        }
    }

    if config.secret_env.is_empty() {
        return Err(ConfigError::Validation(
            "secret-env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

use crate::config::types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, UserAgentConfig, MAX_DELAY_SECONDS,
};
use crate::url::parse_base_url;
use crate::ConfigError;
use url::Url;

/// Upper bound for concurrent image downloads per page
const MAX_IMAGE_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_filter_config(&config.filter)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let start_url = config.start_url.as_deref().ok_or_else(|| {
        ConfigError::Validation("a start URL is required".to_string())
    })?;

    parse_base_url(start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "start URL '{}' must be an http:// or https:// URL: {}",
            start_url, e
        ))
    })?;

    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if !config.delay_seconds.is_finite() || config.delay_seconds <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay_seconds must be a positive number, got {}",
            config.delay_seconds
        )));
    }

    if config.delay_seconds > MAX_DELAY_SECONDS {
        return Err(ConfigError::Validation(format!(
            "delay_seconds must be at most {}, got {}",
            MAX_DELAY_SECONDS, config.delay_seconds
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.head_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "head_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.image_workers < 1 || config.image_workers > MAX_IMAGE_WORKERS {
        return Err(ConfigError::Validation(format!(
            "image_workers must be between 1 and {}, got {}",
            MAX_IMAGE_WORKERS, config.image_workers
        )));
    }

    Ok(())
}

/// Validates image filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if config.hash_prefix_bytes < 1 {
        return Err(ConfigError::Validation(
            "hash_prefix_bytes must be >= 1".to_string(),
        ));
    }

    for ext in &config.excluded_extensions {
        let trimmed = ext.trim_start_matches('.');
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "excluded extension '{}' must be alphanumeric",
                ext
            )));
        }
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

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
///
/// The directory may not exist yet (it is created at crawl start), but an
/// existing non-directory path is rejected before any network activity.
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.directory.exists() && !config.directory.is_dir() {
        return Err(ConfigError::Validation(format!(
            "output path '{}' exists and is not a directory",
            config.directory.display()
        )));
    }

    if let Some(summary) = &config.summary_path {
        if summary.is_dir() {
            return Err(ConfigError::Validation(format!(
                "summary path '{}' is a directory",
                summary.display()
            )));
        }
    }

    Ok(())
}

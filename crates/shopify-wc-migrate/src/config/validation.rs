//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.store_url.is_empty() {
        return Err(MigrateError::Config("source.store_url is required".into()));
    }
    if !is_http_url(&config.source.store_url) {
        return Err(MigrateError::Config(format!(
            "source.store_url must start with http:// or https://, got '{}'",
            config.source.store_url
        )));
    }
    if config.source.access_token.is_empty() {
        return Err(MigrateError::Config(
            "source.access_token is required".into(),
        ));
    }

    // Target validation
    if config.target.url.is_empty() {
        return Err(MigrateError::Config("target.url is required".into()));
    }
    if !is_http_url(&config.target.url) {
        return Err(MigrateError::Config(format!(
            "target.url must start with http:// or https://, got '{}'",
            config.target.url
        )));
    }
    if config.target.consumer_key.is_empty() {
        return Err(MigrateError::Config("target.consumer_key is required".into()));
    }
    if config.target.consumer_secret.is_empty() {
        return Err(MigrateError::Config(
            "target.consumer_secret is required".into(),
        ));
    }

    // Cannot migrate a store onto itself
    if config.source.store_url.trim_end_matches('/') == config.target.url.trim_end_matches('/') {
        return Err(MigrateError::Config(
            "source and target cannot be the same store".into(),
        ));
    }

    // Migration tuning bounds
    if config.migration.page_size == 0 || config.migration.page_size > 250 {
        return Err(MigrateError::Config(format!(
            "migration.page_size must be 1..=250, got {}",
            config.migration.page_size
        )));
    }
    if config.migration.workers == 0 {
        return Err(MigrateError::Config(
            "migration.workers must be at least 1".into(),
        ));
    }
    if config.migration.correlation_file.is_empty() {
        return Err(MigrateError::Config(
            "migration.correlation_file is required".into(),
        ));
    }

    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SourceConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                store_url: "https://demo.myshopify.com".to_string(),
                access_token: "shpat_test".to_string(),
                api_version: "2023-10".to_string(),
            },
            target: TargetConfig {
                url: "https://shop.example.com".to_string(),
                consumer_key: "ck_test".to_string(),
                consumer_secret: "cs_test".to_string(),
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_source_url() {
        let mut config = valid_config();
        config.source.store_url = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_non_http_source_url() {
        let mut config = valid_config();
        config.source.store_url = "ftp://demo.myshopify.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_target_credentials() {
        let mut config = valid_config();
        config.target.consumer_secret = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_same_store_rejected() {
        let mut config = valid_config();
        config.target.url = "https://demo.myshopify.com/".to_string();
        config.source.store_url = "https://demo.myshopify.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = valid_config();
        config.migration.page_size = 0;
        assert!(validate(&config).is_err());
        config.migration.page_size = 251;
        assert!(validate(&config).is_err());
        config.migration.page_size = 250;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.migration.workers = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_source_config_debug_redacts_token() {
        let config = valid_config();
        let debug_output = format!("{:?}", config.source);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_test"));
    }

    #[test]
    fn test_target_config_debug_redacts_secret() {
        let config = valid_config();
        let debug_output = format!("{:?}", config.target);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("cs_test"));
    }
}

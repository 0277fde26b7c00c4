//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source store configuration (Shopify).
    pub source: SourceConfig,

    /// Target store configuration (WooCommerce).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source store (Shopify Admin API) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Store URL, e.g. "https://example.myshopify.com".
    pub store_url: String,

    /// Admin API access token (sent as X-Shopify-Access-Token).
    pub access_token: String,

    /// Admin API version (default: "2023-10").
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("store_url", &self.store_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Target store (WooCommerce REST API) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Site URL, e.g. "https://shop.example.com".
    pub url: String,

    /// REST API consumer key.
    pub consumer_key: String,

    /// REST API consumer secret.
    pub consumer_secret: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("url", &self.url)
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Entities fetched per source page (1..=250).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Concurrent write workers per phase.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Delay between API requests, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Maximum retry attempts for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Path to the correlation store file.
    #[serde(default = "default_correlation_file")]
    pub correlation_file: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            workers: default_workers(),
            request_delay_ms: default_request_delay_ms(),
            max_retries: default_max_retries(),
            correlation_file: default_correlation_file(),
        }
    }
}

fn default_api_version() -> String {
    "2023-10".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_workers() -> usize {
    4
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_correlation_file() -> String {
    "correlation.json".to_string()
}

//! Shopify Admin API client.

use super::{Page, SourceApi};
use crate::config::{MigrationConfig, SourceConfig};
use crate::entities::source::{
    SourceCategory, SourceCoupon, SourceCustomer, SourceOrder, SourcePage, SourceProduct,
};
use crate::error::Result;
use crate::transport::{next_page_cursor, Auth, RestClient, RetryPolicy};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Collections live on two endpoints; the composite cursor tracks which
/// one a page came from so pagination stays restartable.
const SMART_PREFIX: &str = "smart:";
const CUSTOM_PREFIX: &str = "custom:";

/// Rate-limited client for the Shopify Admin REST API.
pub struct ShopifyClient {
    rest: RestClient,
}

impl ShopifyClient {
    pub fn new(source: &SourceConfig, migration: &MigrationConfig) -> Result<Self> {
        let base_url = format!(
            "{}/admin/api/{}/",
            source.store_url.trim_end_matches('/'),
            source.api_version
        );
        let rest = RestClient::new(
            &base_url,
            Auth::Header {
                name: "X-Shopify-Access-Token",
                token: source.access_token.clone(),
            },
            Duration::from_millis(migration.request_delay_ms),
            RetryPolicy {
                max_retries: migration.max_retries,
                base_delay: Duration::from_secs(1),
            },
        )?;
        Ok(Self { rest })
    }

    /// Fetch one page of a resource. Shopify rejects filters alongside a
    /// `page_info` cursor, so extra query params only apply to page one.
    async fn fetch_resource<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resource: &str,
        cursor: Option<String>,
        limit: usize,
        extra: &[(&str, String)],
    ) -> Result<Page<T>> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        match cursor {
            Some(cursor) => query.push(("page_info", cursor)),
            None => query.extend(extra.iter().cloned()),
        }

        let (body, headers) = self.rest.get_json(endpoint, &query).await?;
        let raw = body
            .get(resource)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let items: Vec<T> = serde_json::from_value(raw)?;
        debug!("Fetched {} {} from source", items.len(), resource);

        Ok(Page {
            items,
            next_cursor: next_page_cursor(&headers),
        })
    }
}

#[async_trait]
impl SourceApi for ShopifyClient {
    /// Custom collections first, then smart collections, as one logical
    /// paginated resource.
    async fn fetch_categories(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceCategory>> {
        let (endpoint, resource, inner, in_smart) = match cursor.as_deref() {
            Some(c) if c.starts_with(SMART_PREFIX) => (
                "smart_collections.json",
                "smart_collections",
                c.strip_prefix(SMART_PREFIX).filter(|s| !s.is_empty()),
                true,
            ),
            Some(c) => (
                "custom_collections.json",
                "custom_collections",
                c.strip_prefix(CUSTOM_PREFIX),
                false,
            ),
            None => ("custom_collections.json", "custom_collections", None, false),
        };

        let page: Page<SourceCategory> = self
            .fetch_resource(
                endpoint,
                resource,
                inner.map(str::to_string),
                limit,
                &[],
            )
            .await?;

        let next_cursor = match (page.next_cursor, in_smart) {
            (Some(c), true) => Some(format!("{}{}", SMART_PREFIX, c)),
            (Some(c), false) => Some(format!("{}{}", CUSTOM_PREFIX, c)),
            // Custom collections exhausted: switch to the smart endpoint.
            (None, false) => Some(SMART_PREFIX.to_string()),
            (None, true) => None,
        };

        Ok(Page {
            items: page.items,
            next_cursor,
        })
    }

    async fn fetch_products(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceProduct>> {
        self.fetch_resource("products.json", "products", cursor, limit, &[])
            .await
    }

    async fn fetch_customers(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceCustomer>> {
        self.fetch_resource("customers.json", "customers", cursor, limit, &[])
            .await
    }

    async fn fetch_orders(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceOrder>> {
        self.fetch_resource(
            "orders.json",
            "orders",
            cursor,
            limit,
            &[("status", "any".to_string())],
        )
        .await
    }

    async fn fetch_coupons(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceCoupon>> {
        self.fetch_resource("discount_codes.json", "discount_codes", cursor, limit, &[])
            .await
    }

    async fn fetch_pages(&self, cursor: Option<String>, limit: usize) -> Result<Page<SourcePage>> {
        self.fetch_resource("pages.json", "pages", cursor, limit, &[])
            .await
    }

    async fn ping(&self) -> Result<()> {
        self.rest.get_json("shop.json", &[]).await?;
        Ok(())
    }
}

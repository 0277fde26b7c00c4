//! WooCommerce REST API client.
//!
//! Products are written in two steps: the product shell first, then one
//! request per variation under `products/{id}/variations`, so each created
//! variation id can be correlated back to its source variant.

use super::{TargetApi, WrittenProduct};
use crate::config::{MigrationConfig, TargetConfig};
use crate::entities::target::{
    TargetCategory, TargetCoupon, TargetCustomer, TargetOrder, TargetPage, TargetProduct,
};
use crate::error::{MigrateError, Result};
use crate::transport::{Auth, RestClient, RetryPolicy};
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Rate-limited client for the WooCommerce (and WordPress pages) REST API.
pub struct WooClient {
    wc: RestClient,
    wp: RestClient,
}

impl WooClient {
    pub fn new(target: &TargetConfig, migration: &MigrationConfig) -> Result<Self> {
        let auth = Auth::Basic {
            user: target.consumer_key.clone(),
            password: target.consumer_secret.clone(),
        };
        let delay = Duration::from_millis(migration.request_delay_ms);
        let policy = RetryPolicy {
            max_retries: migration.max_retries,
            base_delay: Duration::from_secs(1),
        };
        let base = target.url.trim_end_matches('/');

        Ok(Self {
            wc: RestClient::new(
                &format!("{}/wp-json/wc/v3/", base),
                auth.clone(),
                delay,
                policy.clone(),
            )?,
            wp: RestClient::new(&format!("{}/wp-json/wp/v2/", base), auth, delay, policy)?,
        })
    }

    async fn write<T: Serialize>(
        &self,
        client: &RestClient,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<Value> {
        let body = serde_json::to_value(payload)?;
        debug!("{} {}", method, path);
        client.send_json(method, path, &body).await
    }

    async fn write_variations(
        &self,
        product_id: &str,
        product: &TargetProduct,
    ) -> Result<Vec<(String, String)>> {
        let mut variations = Vec::with_capacity(product.variations.len());
        for variation in &product.variations {
            let path = format!("products/{}/variations", product_id);
            let body = self.write(&self.wc, Method::POST, &path, variation).await?;
            variations.push((variation.source_variant_id.clone(), extract_id(&body)?));
        }
        Ok(variations)
    }
}

/// Pull the numeric `id` out of a write response.
fn extract_id(body: &Value) -> Result<String> {
    match body.get("id") {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(MigrateError::rejected(
            200,
            format!("write response carried no id: {}", body),
        )),
    }
}

#[async_trait]
impl TargetApi for WooClient {
    async fn create_category(&self, category: &TargetCategory) -> Result<String> {
        let body = self
            .write(&self.wc, Method::POST, "products/categories", category)
            .await?;
        extract_id(&body)
    }

    async fn update_category(&self, target_id: &str, category: &TargetCategory) -> Result<String> {
        let path = format!("products/categories/{}", target_id);
        let body = self.write(&self.wc, Method::PUT, &path, category).await?;
        extract_id(&body)
    }

    async fn create_product(&self, product: &TargetProduct) -> Result<WrittenProduct> {
        let body = self.write(&self.wc, Method::POST, "products", product).await?;
        let product_id = extract_id(&body)?;
        let variations = self.write_variations(&product_id, product).await?;
        Ok(WrittenProduct {
            product_id,
            variations,
        })
    }

    async fn update_product(
        &self,
        target_id: &str,
        product: &TargetProduct,
    ) -> Result<WrittenProduct> {
        let path = format!("products/{}", target_id);
        let body = self.write(&self.wc, Method::PUT, &path, product).await?;
        let product_id = extract_id(&body)?;
        let variations = self.write_variations(&product_id, product).await?;
        Ok(WrittenProduct {
            product_id,
            variations,
        })
    }

    async fn create_customer(&self, customer: &TargetCustomer) -> Result<String> {
        let body = self.write(&self.wc, Method::POST, "customers", customer).await?;
        extract_id(&body)
    }

    async fn update_customer(&self, target_id: &str, customer: &TargetCustomer) -> Result<String> {
        let path = format!("customers/{}", target_id);
        let body = self.write(&self.wc, Method::PUT, &path, customer).await?;
        extract_id(&body)
    }

    async fn create_order(&self, order: &TargetOrder) -> Result<String> {
        let body = self.write(&self.wc, Method::POST, "orders", order).await?;
        extract_id(&body)
    }

    async fn update_order(&self, target_id: &str, order: &TargetOrder) -> Result<String> {
        let path = format!("orders/{}", target_id);
        let body = self.write(&self.wc, Method::PUT, &path, order).await?;
        extract_id(&body)
    }

    async fn create_coupon(&self, coupon: &TargetCoupon) -> Result<String> {
        let body = self.write(&self.wc, Method::POST, "coupons", coupon).await?;
        extract_id(&body)
    }

    async fn update_coupon(&self, target_id: &str, coupon: &TargetCoupon) -> Result<String> {
        let path = format!("coupons/{}", target_id);
        let body = self.write(&self.wc, Method::PUT, &path, coupon).await?;
        extract_id(&body)
    }

    async fn create_page(&self, page: &TargetPage) -> Result<String> {
        let body = self.write(&self.wp, Method::POST, "pages", page).await?;
        extract_id(&body)
    }

    async fn update_page(&self, target_id: &str, page: &TargetPage) -> Result<String> {
        let path = format!("pages/{}", target_id);
        let body = self.write(&self.wp, Method::PUT, &path, page).await?;
        extract_id(&body)
    }

    async fn ping(&self) -> Result<()> {
        self.wc.get_json("system_status", &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_id_from_number_and_string() {
        assert_eq!(extract_id(&json!({"id": 42})).unwrap(), "42");
        assert_eq!(extract_id(&json!({"id": "42"})).unwrap(), "42");
        assert!(extract_id(&json!({"name": "x"})).is_err());
        assert!(extract_id(&json!({"id": ""})).is_err());
    }
}

//! REST client for the inventory/catalog service.
//!
//! Uses `reqwest` for HTTP. Product records are cached with `moka`; stock
//! records are never cached because every cart mutation must validate
//! against a fresh read.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rocket_cart_core::{ProductId, ProductRecord, StockRecord};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{Inventory, InventoryError};
use crate::config::InventoryConfig;

const MAX_CACHED_PRODUCTS: u64 = 1000;

/// Client for the inventory REST service.
///
/// Cheap to clone; clones share the HTTP connection pool and the product
/// cache.
#[derive(Clone)]
pub struct InventoryClient {
    inner: Arc<InventoryClientInner>,
}

struct InventoryClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Option<Cache<ProductId, ProductRecord>>,
}

impl InventoryClient {
    /// Create a new inventory client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let mut headers = HeaderMap::new();
        if let Some(bearer) = config.bearer() {
            let mut value = HeaderValue::from_str(&bearer).map_err(|e| InventoryError::Api {
                status: 0,
                message: format!("Invalid API token format: {e}"),
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.lookup_timeout)
            .build()?;

        let products = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_PRODUCTS)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(InventoryClientInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// GET `{base_url}/{collection}/{id}`, mapping 404 to `None`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: ProductId,
    ) -> Result<Option<T>, InventoryError> {
        let url = self
            .inner
            .base_url
            .join(&format!("{collection}/{id}"))
            .map_err(|e| InventoryError::Api {
                status: 0,
                message: format!("Invalid lookup URL: {e}"),
            })?;

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(collection, "Lookup returned 404");
            return Ok(None);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(InventoryError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Inventory service returned non-success status"
            );
            return Err(InventoryError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        match serde_json::from_str(&body) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse inventory response"
                );
                Err(InventoryError::Parse(e))
            }
        }
    }
}

/// A record whose id disagrees with the one asked for is a malformed
/// response, not a match.
fn check_id(requested: ProductId, returned: ProductId) -> Result<(), InventoryError> {
    if requested == returned {
        Ok(())
    } else {
        Err(InventoryError::Api {
            status: 200,
            message: format!("requested product {requested}, service returned {returned}"),
        })
    }
}

#[async_trait]
impl Inventory for InventoryClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>, InventoryError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(Some(product));
        }

        let Some(product) = self.fetch::<ProductRecord>("products", id).await? else {
            return Ok(None);
        };
        check_id(id, product.id)?;

        if let Some(cache) = &self.inner.products {
            cache.insert(id, product.clone()).await;
        }

        Ok(Some(product))
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_stock(&self, id: ProductId) -> Result<Option<StockRecord>, InventoryError> {
        let stock = self.fetch::<StockRecord>("stock", id).await?;
        if let Some(record) = &stock {
            check_id(id, record.id)?;
        }
        Ok(stock)
    }

    async fn refresh(&self) {
        if let Some(cache) = &self.inner.products {
            cache.invalidate_all();
            debug!("Product cache invalidated");
        }
    }
}

//! Huerta backend REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for stock - no local sync, direct
//!   REST calls with `reqwest`
//! - Catalog browsing reads go through a `moka` cache (5-minute TTL)
//! - Stock snapshots bypass every cache: they exist to catch drift between
//!   the cart and the backend, and serving them stale would reintroduce
//!   exactly that drift

pub mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, instrument};

use huerta_core::{OrderId, UserId};

use crate::config::StorefrontConfig;
use crate::models::{CurrentUser, OrderReceipt, OrderSubmission, Product, StockSnapshot};
use types::{OrderResponse, PayloadError, WireProduct, WireUser};

const CATALOG_CACHE_KEY: &str = "products";
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Errors that can occur when talking to the Huerta backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an unexpected status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Truncated response body for diagnostics.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload deserialized but failed boundary validation.
    #[error("Malformed payload: {0}")]
    Payload(#[from] PayloadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend declined the order.
    #[error("Order rejected: {message}")]
    OrderRejected {
        /// Backend-provided reason.
        message: String,
    },
}

// =============================================================================
// StoreBackend
// =============================================================================

/// Backend operations the cart and checkout flows depend on.
///
/// [`BackendClient`] is the production implementation; tests substitute an
/// in-memory fake so checkout scenarios run without a network.
pub trait StoreBackend {
    /// Fetch a fresh stock snapshot, bypassing all caches.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    fn fetch_stock_snapshot(&self) -> impl Future<Output = Result<StockSnapshot, ApiError>> + Send;

    /// List the catalog for browsing. Implementations may serve cached data.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is malformed.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the user does not exist.
    fn get_user(&self, user_id: UserId)
    -> impl Future<Output = Result<CurrentUser, ApiError>> + Send;

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::OrderRejected`] when the backend declines the
    /// order, and transport or payload errors otherwise.
    fn submit_order(
        &self,
        submission: &OrderSubmission,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send;
}

// =============================================================================
// BackendClient
// =============================================================================

/// HTTP client for the Huerta backend.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    catalog_cache: Cache<String, Arc<Vec<Product>>>,
}

impl BackendClient {
    /// Create a new backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let catalog_cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_base_url.clone(),
                bearer_token: config
                    .api_token
                    .as_ref()
                    .map(|t| t.expose_secret().to_string()),
                catalog_cache,
            }),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET a JSON payload from the backend.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self.authorize(self.inner.client.get(&url)).send().await?;
        let status = response.status();

        // Body as text first for better diagnostics on bad payloads
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path,
                body = %snippet(&body),
                "backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %snippet(&body),
                "failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Fetch and boundary-parse the full product list, uncached.
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        let wire: Vec<WireProduct> = self.get_json("/products").await?;
        let products = wire
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }
}

impl StoreBackend for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_stock_snapshot(&self) -> Result<StockSnapshot, ApiError> {
        let products = self.fetch_products().await?;
        debug!(products = products.len(), "stock snapshot fetched");
        Ok(StockSnapshot::from_products(&products))
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(products) = self.inner.catalog_cache.get(CATALOG_CACHE_KEY).await {
            debug!("catalog cache hit");
            return Ok(products.as_ref().clone());
        }

        let products = self.fetch_products().await?;
        self.inner
            .catalog_cache
            .insert(CATALOG_CACHE_KEY.to_string(), Arc::new(products.clone()))
            .await;
        Ok(products)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get_user(&self, user_id: UserId) -> Result<CurrentUser, ApiError> {
        let wire: WireUser = match self.get_json(&format!("/users/{user_id}")).await {
            Err(ApiError::Status { status: 404, .. }) => {
                return Err(ApiError::NotFound(format!("user {user_id}")));
            }
            other => other?,
        };
        Ok(CurrentUser::try_from(wire)?)
    }

    #[instrument(
        skip(self, submission),
        fields(user_id = %submission.user_id, lines = submission.lines.len(), total = %submission.total)
    )]
    async fn submit_order(&self, submission: &OrderSubmission) -> Result<OrderReceipt, ApiError> {
        let url = format!("{}/orders", self.inner.base_url);
        let response = self
            .authorize(self.inner.client.post(&url))
            .json(submission)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // Rejections may ride on error statuses with a plain message body,
        // so try the order-response shape before falling back to a status
        // error.
        match serde_json::from_str::<OrderResponse>(&body) {
            Ok(parsed) if parsed.success && status.is_success() => {
                let order_id = parsed.order_id.ok_or(PayloadError::MissingOrderId)?;
                debug!(order_id, "order accepted");
                Ok(OrderReceipt {
                    order_id: OrderId::new(order_id),
                })
            }
            Ok(parsed) if !parsed.success => Err(ApiError::OrderRejected {
                message: parsed
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            }),
            Ok(_) => Err(ApiError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            }),
            Err(e) if status.is_success() => Err(ApiError::Parse(e)),
            Err(_) => Err(ApiError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            }),
        }
    }
}

/// Truncate a response body for logs and error messages.
fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

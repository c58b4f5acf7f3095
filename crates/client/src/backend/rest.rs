//! HTTP implementation of the row API client.
//!
//! Speaks the managed backend's REST row surface: reads are `GET` with
//! `column=eq.value` filters, writes are `POST`/`PATCH`/`DELETE` with
//! `Prefer: return=minimal`. Product lookups are cached with `moka`
//! (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use shophub_core::{CartLine, Notification, NotificationId, Product, ProductId, Role, UserId};

use crate::config::ClientConfig;

use super::rows::{CartUpsertRow, IdentityResponse, RoleRow, WishlistInsertRow};
use super::{Backend, BackendError};

/// How many notifications one history fetch pulls; older history stays
/// server-side until asked for.
const NOTIFICATION_FETCH_LIMIT: u32 = 50;

/// Client for the managed backend's row API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestBackendInner>,
}

struct RestBackendInner {
    http: reqwest::Client,
    rest_endpoint: String,
    auth_endpoint: String,
    anon_key: String,
    access_token: Option<String>,
    product_cache: Cache<String, Vec<Product>>,
}

impl RestBackend {
    /// Create a new row API client.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let product_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let base = config.backend_url.as_str().trim_end_matches('/').to_string();

        Self {
            inner: Arc::new(RestBackendInner {
                http: reqwest::Client::new(),
                rest_endpoint: format!("{base}/rest/v1"),
                auth_endpoint: format!("{base}/auth/v1"),
                anon_key: config.anon_key().to_string(),
                access_token: config.access_token().map(str::to_string),
                product_cache,
            }),
        }
    }

    /// Build a request with the API key and bearer credentials attached.
    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let bearer = self
            .inner
            .access_token
            .as_deref()
            .unwrap_or(&self.inner.anon_key);
        self.inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.inner.rest_endpoint, table)
    }

    /// Map a response's status to an error, or pass it through.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %message.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        Ok(response)
    }

    /// Execute a filtered read and deserialize the row set.
    async fn read_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .request(reqwest::Method::GET, self.table_url(table))
            .query(query)
            .send()
            .await?;
        let response = Self::check(response).await?;

        // Read the body as text first for better parse-error diagnostics
        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                tracing::error!(
                    table,
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse row API response"
                );
                Err(BackendError::Parse(e))
            }
        }
    }

    /// Execute a write request, discarding the (minimal) response body.
    async fn write(&self, request: reqwest::RequestBuilder) -> Result<(), BackendError> {
        let response = request.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Backend for RestBackend {
    #[instrument(skip(self))]
    async fn fetch_identity(&self) -> Result<Option<UserId>, BackendError> {
        // Without a user token there is nobody to resolve.
        if self.inner.access_token.is_none() {
            return Ok(None);
        }

        let url = format!("{}/user", self.inner.auth_endpoint);
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = match Self::check(response).await {
            Ok(response) => response,
            // An expired or revoked token means "signed out", not a failure.
            Err(BackendError::Unauthorized) => return Ok(None),
            Err(e) => return Err(e),
        };

        let identity: IdentityResponse = response.json().await?;
        Ok(Some(UserId::new(identity.id)))
    }

    #[instrument(skip(self))]
    async fn fetch_role(&self, user: UserId) -> Result<Role, BackendError> {
        let rows: Vec<RoleRow> = self
            .read_rows(
                "user_roles",
                &[
                    ("user_id", format!("eq.{user}")),
                    ("select", "role".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        // Accounts created before role rows existed default to customer.
        Ok(rows.into_iter().next().map_or_else(
            || {
                debug!(%user, "No role row, defaulting to customer");
                Role::Customer
            },
            |row| row.role,
        ))
    }

    #[instrument(skip(self))]
    async fn fetch_cart(&self, user: UserId) -> Result<Vec<CartLine>, BackendError> {
        self.read_rows(
            "cart_items",
            &[
                ("user_id", format!("eq.{user}")),
                ("select", "*".to_string()),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self, line), fields(product = %line.product_id))]
    async fn upsert_cart_line(&self, user: UserId, line: &CartLine) -> Result<(), BackendError> {
        let row = CartUpsertRow::new(user, line);
        self.write(
            self.request(reqwest::Method::POST, self.table_url("cart_items"))
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&[row]),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_cart_line(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<(), BackendError> {
        self.write(
            self.request(reqwest::Method::DELETE, self.table_url("cart_items"))
                .query(&[
                    ("user_id", format!("eq.{user}")),
                    ("product_id", format!("eq.{product}")),
                ])
                .header("Prefer", "return=minimal"),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self, user: UserId) -> Result<(), BackendError> {
        self.write(
            self.request(reqwest::Method::DELETE, self.table_url("cart_items"))
                .query(&[("user_id", format!("eq.{user}"))])
                .header("Prefer", "return=minimal"),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn fetch_notifications(&self, user: UserId) -> Result<Vec<Notification>, BackendError> {
        self.read_rows(
            "notifications",
            &[
                ("user_id", format!("eq.{user}")),
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", NOTIFICATION_FETCH_LIMIT.to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn mark_notification_read(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<(), BackendError> {
        self.write(
            self.request(reqwest::Method::PATCH, self.table_url("notifications"))
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("user_id", format!("eq.{user}")),
                ])
                .header("Prefer", "return=minimal")
                .json(&serde_json::json!({ "is_read": true })),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn mark_all_notifications_read(&self, user: UserId) -> Result<(), BackendError> {
        self.write(
            self.request(reqwest::Method::PATCH, self.table_url("notifications"))
                .query(&[
                    ("user_id", format!("eq.{user}")),
                    ("is_read", "eq.false".to_string()),
                ])
                .header("Prefer", "return=minimal")
                .json(&serde_json::json!({ "is_read": true })),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn fetch_wishlist(&self, user: UserId) -> Result<Vec<Product>, BackendError> {
        self.read_rows(
            "wishlist_items",
            &[
                ("user_id", format!("eq.{user}")),
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self, product), fields(product = %product.id))]
    async fn add_wishlist_item(
        &self,
        user: UserId,
        product: &Product,
    ) -> Result<(), BackendError> {
        let row = WishlistInsertRow::new(user, product);
        self.write(
            self.request(reqwest::Method::POST, self.table_url("wishlist_items"))
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&[row]),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn remove_wishlist_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<(), BackendError> {
        self.write(
            self.request(reqwest::Method::DELETE, self.table_url("wishlist_items"))
                .query(&[
                    ("user_id", format!("eq.{user}")),
                    ("product_id", format!("eq.{product}")),
                ])
                .header("Prefer", "return=minimal"),
        )
        .await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn fetch_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, BackendError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sorted: Vec<String> = ids.iter().map(ToString::to_string).collect();
        sorted.sort_unstable();
        let id_list = sorted.join(",");
        let cache_key = format!("products:{id_list}");

        // Check cache
        if let Some(products) = self.inner.product_cache.get(&cache_key).await {
            debug!("Cache hit for product lookup");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .read_rows(
                "products",
                &[
                    ("id", format!("in.({id_list})")),
                    ("select", "*".to_string()),
                ],
            )
            .await?;

        self.inner
            .product_cache
            .insert(cache_key, products.clone())
            .await;
        Ok(products)
    }
}

//! Storefront REST API client.
//!
//! [`CommerceApi`] is the seam the stores talk through; [`RestClient`] is
//! its `reqwest` implementation. Catalog reads are cached with `moka`
//! (5-minute TTL by default). Cart and wishlist reads are never cached.

mod cache;
mod conversions;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use souk_core::{CartLine, Email, Product, ProductId, WishlistEntry};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{ClientError, Result};
use crate::session::Session;

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_auth, convert_cart_line, convert_order, convert_product, convert_toggle,
    convert_wishlist_entry,
};
use types::{
    AuthGrant, CartItemBody, Listing, LoginBody, OrderReceipt, OrderRequest, ProductEnvelope,
    ProductQuery, RawAuth, RawEntry, RawErrorBody, RawOrder, RawProduct, RawToggle,
    RegisterBody, ToggleOutcome, WishlistToggleBody,
};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Remote operations the storefront depends on.
///
/// Every method maps to one HTTP call. Cart and wishlist methods require a
/// signed-in session and fail with [`ClientError::Unauthenticated`] without
/// touching the network when there is none.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// `GET /cart`
    async fn fetch_cart(&self) -> Result<Vec<CartLine>>;

    /// `POST /cart`; sets the line's quantity.
    async fn put_cart_item(&self, product_id: &ProductId, quantity: u32) -> Result<()>;

    /// `DELETE /cart/{productId}`
    async fn delete_cart_item(&self, product_id: &ProductId) -> Result<()>;

    /// `DELETE /cart`
    async fn delete_cart(&self) -> Result<()>;

    /// `GET /wishlist`
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistEntry>>;

    /// `POST /wishlist/toggle`
    async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<ToggleOutcome>;

    /// `POST /auth/login`
    async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthGrant>;

    /// `POST /auth/register`
    async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthGrant>;

    /// `GET /products`
    async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>>;

    /// `GET /products/{id}`
    async fn product(&self, product_id: &ProductId) -> Result<Product>;

    /// `POST /orders`
    async fn create_order(&self, order: &OrderRequest) -> Result<OrderReceipt>;

    /// Forget any cached catalog responses.
    fn invalidate_products(&self) {}
}

// =============================================================================
// RestClient
// =============================================================================

/// `reqwest`-backed [`CommerceApi`].
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
    cache: Cache<CacheKey, CacheValue>,
}

impl RestClient {
    /// Create a client for the API at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: Arc<Session>) -> Result<Self> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .user_agent(concat!("souk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base_url: config.base_url.clone(),
                session,
                cache,
            }),
        })
    }

    /// Resolve an endpoint below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request that must carry the shopper's bearer token.
    fn authed(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self
            .inner
            .session
            .bearer_token()
            .ok_or(ClientError::Unauthenticated)?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .bearer_auth(token.expose_secret()))
    }

    /// Start a request that carries the bearer token only if signed in.
    fn public(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.inner.client.request(method, url);
        match self.inner.session.bearer_token() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let request_id = Uuid::new_v4().to_string();
        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ClientError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                request_id = %request_id,
                body = %body.chars().take(500).collect::<String>(),
                "Storefront API returned non-success status"
            );
            let message = serde_json::from_str::<RawErrorBody>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// Send a request and decode its JSON body.
    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ClientError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl CommerceApi for RestClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<CartLine>> {
        let request = self.authed(Method::GET, self.endpoint(&["cart"])?)?;
        let listing: Listing<RawEntry> = self.execute_json(request).await?;
        Ok(listing
            .into_items()
            .into_iter()
            .filter_map(convert_cart_line)
            .collect())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn put_cart_item(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let request = self
            .authed(Method::POST, self.endpoint(&["cart"])?)?
            .json(&CartItemBody {
                product_id,
                quantity,
            });
        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn delete_cart_item(&self, product_id: &ProductId) -> Result<()> {
        let url = self.endpoint(&["cart", product_id.as_str()])?;
        self.execute(self.authed(Method::DELETE, url)?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_cart(&self) -> Result<()> {
        let url = self.endpoint(&["cart"])?;
        self.execute(self.authed(Method::DELETE, url)?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistEntry>> {
        let request = self.authed(Method::GET, self.endpoint(&["wishlist"])?)?;
        let listing: Listing<RawEntry> = self.execute_json(request).await?;
        Ok(listing
            .into_items()
            .into_iter()
            .filter_map(convert_wishlist_entry)
            .collect())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<ToggleOutcome> {
        let request = self
            .authed(Method::POST, self.endpoint(&["wishlist", "toggle"])?)?
            .json(&WishlistToggleBody { product_id });
        let raw: RawToggle = self.execute_json(request).await?;
        convert_toggle(raw)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthGrant> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["auth", "login"])?)
            .json(&LoginBody {
                email: email.as_str(),
                password: password.expose_secret(),
            });
        let raw: RawAuth = self.execute_json(request).await?;
        convert_auth(raw)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthGrant> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["auth", "register"])?)
            .json(&RegisterBody {
                name,
                email: email.as_str(),
                password: password.expose_secret(),
            });
        let raw: RawAuth = self.execute_json(request).await?;
        convert_auth(raw)
    }

    #[instrument(skip(self))]
    async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        // Only unfiltered listings are cached
        let cache_key = CacheKey::listing(query);
        if let Some(key) = &cache_key
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint(&["products"])?;
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let listing: Listing<RawProduct> =
            self.execute_json(self.public(Method::GET, url)).await?;
        let products: Vec<Product> = listing
            .into_items()
            .into_iter()
            .filter_map(convert_product)
            .collect();

        if let Some(key) = cache_key {
            self.inner
                .cache
                .insert(key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn product(&self, product_id: &ProductId) -> Result<Product> {
        let cache_key = CacheKey::Product(product_id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", product_id.as_str()])?;
        let envelope: ProductEnvelope = match self.execute_json(self.public(Method::GET, url)).await
        {
            Err(ClientError::Api { status: 404, .. }) => {
                return Err(ClientError::NotFound(format!("Product {product_id}")));
            }
            other => other?,
        };

        let raw = match envelope {
            ProductEnvelope::Wrapped { product } | ProductEnvelope::Bare(product) => product,
        };
        let product = convert_product(raw)
            .ok_or_else(|| ClientError::NotFound(format!("Product {product_id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self, order), fields(items = order.order_items.len()))]
    async fn create_order(&self, order: &OrderRequest) -> Result<OrderReceipt> {
        let request = self
            .authed(Method::POST, self.endpoint(&["orders"])?)?
            .json(order);
        let raw: RawOrder = self.execute_json(request).await?;
        convert_order(raw)
    }

    fn invalidate_products(&self) {
        self.inner.cache.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::MockServer;
    use serde_json::json;
    use souk_core::{Price, User, UserId};

    use super::*;
    use crate::api::types::WishlistAction;
    use crate::storage::Storage;

    fn signed_in_session() -> Arc<Session> {
        let session = Session::anonymous(Storage::memory());
        session.establish(AuthGrant {
            token: SecretString::from("jwt-abc"),
            user: User {
                id: UserId::new("u1"),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: None,
            },
        });
        Arc::new(session)
    }

    fn client(server: &MockServer, session: Arc<Session>) -> RestClient {
        let config = ApiConfig::new(&server.url("/api")).unwrap();
        RestClient::new(&config, session).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_cart_sends_bearer_and_request_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/cart")
                    .header("authorization", "Bearer jwt-abc")
                    .header_exists(REQUEST_ID_HEADER);
                then.status(200).json_body(json!({
                    "items": [{
                        "product": { "_id": "p1", "name": "Mug", "price": 20, "countInStock": 5 },
                        "quantity": 2
                    }]
                }));
            })
            .await;

        let lines = client(&server, signed_in_session())
            .fetch_cart()
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price, Price::from_cents(2000));
    }

    #[tokio::test]
    async fn test_cart_calls_fail_fast_without_session() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST").path("/api/cart");
                then.status(200).json_body(json!({}));
            })
            .await;

        let api = client(&server, Arc::new(Session::anonymous(Storage::memory())));
        let result = api.put_cart_item(&ProductId::new("p1"), 1).await;

        assert!(matches!(result, Err(ClientError::Unauthenticated)));
        assert_eq!(mock.calls_async().await, 0);
    }

    #[tokio::test]
    async fn test_put_and_delete_cart_paths() {
        let server = MockServer::start_async().await;
        let put = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/api/cart")
                    .json_body(json!({ "productId": "p1", "quantity": 3 }));
                then.status(201).json_body(json!({ "message": "ok" }));
            })
            .await;
        let delete_line = server
            .mock_async(|when, then| {
                when.method("DELETE").path("/api/cart/p1");
                then.status(204);
            })
            .await;
        let delete_all = server
            .mock_async(|when, then| {
                when.method("DELETE").path("/api/cart");
                then.status(200);
            })
            .await;

        let api = client(&server, signed_in_session());
        api.put_cart_item(&ProductId::new("p1"), 3).await.unwrap();
        api.delete_cart_item(&ProductId::new("p1")).await.unwrap();
        api.delete_cart().await.unwrap();

        put.assert_async().await;
        delete_line.assert_async().await;
        delete_all.assert_async().await;
    }

    #[tokio::test]
    async fn test_toggle_wishlist_reads_declared_action() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/api/wishlist/toggle")
                    .json_body(json!({ "productId": "p9" }));
                then.status(200)
                    .json_body(json!({ "action": "removed", "message": "Removed!" }));
            })
            .await;

        let outcome = client(&server, signed_in_session())
            .toggle_wishlist(&ProductId::new("p9"))
            .await
            .unwrap();

        assert_eq!(outcome.action, WishlistAction::Removed);
        assert_eq!(outcome.message(), "Removed!");
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/auth/login");
                then.status(401).json_body(json!({ "message": "Invalid credentials" }));
            })
            .await;

        let api = client(&server, Arc::new(Session::anonymous(Storage::memory())));
        let email = Email::parse("ada@example.com").unwrap();
        let err = api
            .login(&email, &SecretString::from("wrong"))
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/wishlist");
                then.status(429).header("Retry-After", "7");
            })
            .await;

        let err = client(&server, signed_in_session())
            .fetch_wishlist()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RateLimited(7)));
    }

    #[tokio::test]
    async fn test_product_cached_within_ttl() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET").path("/api/products/p1");
                then.status(200).json_body(json!({
                    "product": { "_id": "p1", "name": "Mug", "price": 20 }
                }));
            })
            .await;

        let api = client(&server, Arc::new(Session::anonymous(Storage::memory())));
        let first = api.product(&ProductId::new("p1")).await.unwrap();
        let second = api.product(&ProductId::new("p1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.calls_async().await, 1);

        api.invalidate_products();
        api.product(&ProductId::new("p1")).await.unwrap();
        assert_eq!(mock.calls_async().await, 2);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/products/nope");
                then.status(404).json_body(json!({ "error": "no such product" }));
            })
            .await;

        let api = client(&server, Arc::new(Session::anonymous(Storage::memory())));
        let err = api.product(&ProductId::new("nope")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_queries_bypass_cache() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/products")
                    .query_param("search", "mug");
                then.status(200).json_body(json!({
                    "products": [{ "id": 7, "name": "Mug", "price": "9.99" }]
                }));
            })
            .await;

        let api = client(&server, Arc::new(Session::anonymous(Storage::memory())));
        let query = ProductQuery {
            search: Some("mug".to_string()),
            ..ProductQuery::default()
        };
        let products = api.products(&query).await.unwrap();
        api.products(&query).await.unwrap();

        assert_eq!(products[0].id, ProductId::new("7"));
        assert_eq!(mock.calls_async().await, 2);
    }
}

//! In-memory `CommerceApi` for store and container tests.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use secrecy::SecretString;
use souk_core::{
    CartLine, Email, OrderId, Price, Product, ProductId, User, UserId, WishlistEntry,
};
use tokio::sync::Notify;

use crate::api::CommerceApi;
use crate::api::types::{
    AuthGrant, OrderReceipt, OrderRequest, ProductQuery, ToggleOutcome, WishlistAction,
};
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::storage::Storage;

/// A catalog product with a list price in cents.
pub fn product(id: &str, cents: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: String::new(),
        image: Some(format!("{id}.jpg")),
        category: None,
        price: Price::from_cents(cents),
        discount_price: None,
        stock,
    }
}

/// A session with `u1` signed in.
pub fn signed_in(storage: Storage) -> Arc<Session> {
    let session = Session::anonymous(storage);
    session.establish(AuthGrant {
        token: SecretString::from("fake-token"),
        user: User {
            id: UserId::new("u1"),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: None,
        },
    });
    Arc::new(session)
}

/// A session with nobody signed in.
pub fn signed_out() -> Arc<Session> {
    Arc::new(Session::anonymous(Storage::memory()))
}

#[derive(Default)]
struct FakeState {
    catalog: BTreeMap<ProductId, Product>,
    cart: BTreeMap<ProductId, u32>,
    wishlist: Vec<ProductId>,
    orders: Vec<OrderRequest>,
    calls: Vec<String>,
}

/// Remote backend double.
///
/// Behaves like a well-mannered API: `POST /cart` sets a quantity, the
/// toggle endpoint flips membership and reports which way it went.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    gate_cart_fetch: AtomicBool,
    gate_wishlist_fetch: AtomicBool,
    /// Notified when a gated fetch starts.
    pub fetch_started: Notify,
    /// Releases a gated fetch.
    pub fetch_release: Notify,
}

impl FakeApi {
    pub fn with_catalog(products: impl IntoIterator<Item = Product>) -> Arc<Self> {
        let api = Self::default();
        api.state().catalog = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Arc::new(api)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: impl Into<String>) {
        self.state().calls.push(call.into());
    }

    fn write_guard(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 500,
                message: "write failed".to_string(),
            });
        }
        Ok(())
    }

    fn read_guard(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 503,
                message: "read failed".to_string(),
            });
        }
        Ok(())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make cart fetches wait for `fetch_release`.
    pub fn gate_cart_fetch(&self, gate: bool) {
        self.gate_cart_fetch.store(gate, Ordering::SeqCst);
    }

    /// Make wishlist fetches wait for `fetch_release`.
    pub fn gate_wishlist_fetch(&self, gate: bool) {
        self.gate_wishlist_fetch.store(gate, Ordering::SeqCst);
    }

    async fn pass_gate(&self, gate: &AtomicBool) {
        if gate.load(Ordering::SeqCst) {
            self.fetch_started.notify_one();
            self.fetch_release.notified().await;
        }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Seed the remote cart directly, bypassing the API.
    pub fn seed_cart(&self, product_id: &str, quantity: u32) {
        self.state().cart.insert(ProductId::new(product_id), quantity);
    }

    /// Seed the remote wishlist directly.
    pub fn seed_wishlist(&self, product_id: &str) {
        self.state().wishlist.push(ProductId::new(product_id));
    }

    /// Orders received so far.
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.state().orders.clone()
    }

    fn remote_cart(&self) -> Vec<CartLine> {
        let state = self.state();
        state
            .cart
            .iter()
            .filter_map(|(id, quantity)| {
                let product = state.catalog.get(id)?;
                Some(CartLine {
                    product_id: id.clone(),
                    name: product.name.clone(),
                    image: product.image.clone(),
                    unit_price: product.effective_price(),
                    stock_available: product.stock,
                    quantity: *quantity,
                })
            })
            .collect()
    }

    fn grant(email: &Email, name: &str) -> AuthGrant {
        AuthGrant {
            token: SecretString::from(format!("token-for-{email}")),
            user: User {
                id: UserId::new("u1"),
                name: name.to_string(),
                email: email.to_string(),
                role: None,
            },
        }
    }
}

#[async_trait]
impl CommerceApi for FakeApi {
    async fn fetch_cart(&self) -> Result<Vec<CartLine>> {
        self.record("GET /cart");
        self.pass_gate(&self.gate_cart_fetch).await;
        self.read_guard()?;
        Ok(self.remote_cart())
    }

    async fn put_cart_item(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        self.record(format!("POST /cart {product_id} {quantity}"));
        self.write_guard()?;
        let mut state = self.state();
        if !state.catalog.contains_key(product_id) {
            return Err(ClientError::Api {
                status: 404,
                message: "Product not found".to_string(),
            });
        }
        state.cart.insert(product_id.clone(), quantity);
        Ok(())
    }

    async fn delete_cart_item(&self, product_id: &ProductId) -> Result<()> {
        self.record(format!("DELETE /cart/{product_id}"));
        self.write_guard()?;
        self.state().cart.remove(product_id);
        Ok(())
    }

    async fn delete_cart(&self) -> Result<()> {
        self.record("DELETE /cart");
        self.write_guard()?;
        self.state().cart.clear();
        Ok(())
    }

    async fn fetch_wishlist(&self) -> Result<Vec<WishlistEntry>> {
        self.record("GET /wishlist");
        self.pass_gate(&self.gate_wishlist_fetch).await;
        self.read_guard()?;
        let state = self.state();
        Ok(state
            .wishlist
            .iter()
            .filter_map(|id| state.catalog.get(id))
            .map(|product| WishlistEntry {
                product_id: product.id.clone(),
                name: product.name.clone(),
                image: product.image.clone(),
                price: product.price,
                discount_price: product.discount_price,
                stock_available: product.stock,
            })
            .collect())
    }

    async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<ToggleOutcome> {
        self.record(format!("POST /wishlist/toggle {product_id}"));
        self.write_guard()?;
        let mut state = self.state();
        let action = if let Some(pos) = state.wishlist.iter().position(|id| id == product_id) {
            state.wishlist.remove(pos);
            WishlistAction::Removed
        } else {
            state.wishlist.push(product_id.clone());
            WishlistAction::Added
        };
        Ok(ToggleOutcome {
            action,
            message: None,
        })
    }

    async fn login(&self, email: &Email, _password: &SecretString) -> Result<AuthGrant> {
        self.record(format!("POST /auth/login {email}"));
        self.write_guard()?;
        Ok(Self::grant(email, "Ada"))
    }

    async fn register(
        &self,
        name: &str,
        email: &Email,
        _password: &SecretString,
    ) -> Result<AuthGrant> {
        self.record(format!("POST /auth/register {email}"));
        self.write_guard()?;
        Ok(Self::grant(email, name))
    }

    async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.record("GET /products");
        self.read_guard()?;
        let search = query.search.as_deref().map(str::to_lowercase);
        Ok(self
            .state()
            .catalog
            .values()
            .filter(|p| {
                search
                    .as_deref()
                    .is_none_or(|s| p.name.to_lowercase().contains(s))
            })
            .cloned()
            .collect())
    }

    async fn product(&self, product_id: &ProductId) -> Result<Product> {
        self.record(format!("GET /products/{product_id}"));
        self.read_guard()?;
        self.state()
            .catalog
            .get(product_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("Product {product_id}")))
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<OrderReceipt> {
        self.record("POST /orders");
        self.write_guard()?;
        let mut state = self.state();
        state.orders.push(order.clone());
        Ok(OrderReceipt {
            id: OrderId::new(format!("order-{}", state.orders.len())),
            total: Some(Price::new(order.total_price)),
            created_at: None,
        })
    }
}

//! Application container shared by every front end.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use souk_core::{Email, PricingPolicy, Product, ProductId, User};
use tracing::{info, instrument};

use crate::api::types::{AuthGrant, OrderReceipt, ProductQuery};
use crate::api::{CommerceApi, RestClient};
use crate::checkout::CheckoutReview;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::preferences::Preferences;
use crate::session::Session;
use crate::storage::Storage;
use crate::stores::{CartStore, WishlistStore};

/// The storefront client.
///
/// Cheaply cloneable via `Arc`; every clone shares one session, one cart
/// and one wishlist.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    api: Arc<dyn CommerceApi>,
    session: Arc<Session>,
    pricing: PricingPolicy,
    cart: CartStore,
    wishlist: WishlistStore,
    preferences: Preferences,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("session", &self.inner.session)
            .field("pricing", &self.inner.pricing)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build a storefront talking to the configured REST API, with state
    /// persisted under `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the
    /// HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let storage = Storage::file(&config.state_dir)?;
        let session = Arc::new(Session::load(storage.clone()));
        let api = Arc::new(RestClient::new(&config.api, session.clone())?);
        Ok(Self::with_parts(config.pricing, storage, session, api))
    }

    /// Assemble a storefront from explicit parts.
    #[must_use]
    pub fn with_parts(
        pricing: PricingPolicy,
        storage: Storage,
        session: Arc<Session>,
        api: Arc<dyn CommerceApi>,
    ) -> Self {
        let cart = CartStore::new(api.clone(), session.clone(), storage.clone(), pricing);
        let wishlist = WishlistStore::new(api.clone(), session.clone());
        let preferences = Preferences::load(storage);

        Self {
            inner: Arc::new(StorefrontInner {
                api,
                session,
                pricing,
                cart,
                wishlist,
                preferences,
            }),
        }
    }

    /// Load the cart and wishlist for a restored session.
    pub async fn start(&self) {
        if let Some(user) = self.inner.session.user() {
            set_sentry_user(&user.id, Some(&user.email));
            self.refresh().await;
        }
    }

    /// Refetch the cart and wishlist together.
    pub async fn refresh(&self) {
        tokio::join!(
            self.inner.cart.fetch_cart(),
            self.inner.wishlist.fetch_wishlist()
        );
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.inner.preferences
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn pricing(&self) -> &PricingPolicy {
        &self.inner.pricing
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.session.user()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in and load the shopper's cart and wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a malformed email or empty
    /// password, or the remote error if sign-in is refused.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User> {
        let email = parse_email(email)?;
        require_password(password)?;

        let grant = self.inner.api.login(&email, password).await?;
        Ok(self.adopt(grant).await)
    }

    /// Create an account, then continue as with [`Self::login`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a blank name, malformed email
    /// or empty password, or the remote error if registration is refused.
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &SecretString) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("Please enter your name".to_string()));
        }
        let email = parse_email(email)?;
        require_password(password)?;

        let grant = self.inner.api.register(name, &email, password).await?;
        Ok(self.adopt(grant).await)
    }

    async fn adopt(&self, grant: AuthGrant) -> User {
        let session = self.inner.session.establish(grant);
        set_sentry_user(&session.user.id, Some(&session.user.email));
        add_breadcrumb("auth", "Signed in", None);
        info!(user_id = %session.user.id, "Signed in");

        self.refresh().await;
        session.user
    }

    /// Sign out and drop every trace of the shopper from this device.
    ///
    /// Purely local; the API keeps no server-side session to revoke.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.inner.session.end();
        tokio::join!(self.inner.cart.reset(), self.inner.wishlist.reset());
        clear_sentry_user();
        add_breadcrumb("auth", "Signed out", None);
        info!("Signed out");
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List catalog products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.inner.api.products(query).await
    }

    /// Fetch one catalog product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if it does not exist, or another
    /// error if the API request fails.
    pub async fn product(&self, product_id: &ProductId) -> Result<Product> {
        self.inner.api.product(product_id).await
    }

    /// Forget cached catalog responses.
    pub fn invalidate_products(&self) {
        self.inner.api.invalidate_products();
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Snapshot the cart, checkout selections and price breakdown.
    pub async fn checkout_review(&self) -> CheckoutReview {
        self.inner.cart.review().await
    }

    /// Place an order for the current cart.
    ///
    /// See [`CartStore::place_order`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` without a session,
    /// `ClientError::Validation` if the review is incomplete, or the remote
    /// error if the order is refused.
    pub async fn place_order(&self) -> Result<OrderReceipt> {
        self.inner.cart.place_order().await
    }
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| ClientError::Validation(e.to_string()))
}

fn require_password(password: &SecretString) -> Result<()> {
    if password.expose_secret().is_empty() {
        return Err(ClientError::Validation("Please enter a password".to_string()));
    }
    Ok(())
}

//! Cart store.
//!
//! Also holds the checkout selections (shipping address and payment
//! method), which live next to the cart because clearing the cart clears
//! them too.

use std::sync::Arc;

use souk_core::{
    CartLine, PaymentMethod, PriceBreakdown, PricingPolicy, ProductId, ShippingAddress,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::api::CommerceApi;
use crate::api::types::OrderReceipt;
use crate::checkout::CheckoutReview;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::session::Session;
use crate::storage::{Storage, keys};

#[derive(Debug, Default)]
struct CartState {
    lines: Vec<CartLine>,
    shipping_address: Option<ShippingAddress>,
    payment_method: Option<PaymentMethod>,
}

/// Local view of the signed-in shopper's cart.
pub struct CartStore {
    api: Arc<dyn CommerceApi>,
    session: Arc<Session>,
    storage: Storage,
    pricing: PricingPolicy,
    state: RwLock<CartState>,
    /// Held from a remote write through its resync.
    mutation: Mutex<()>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty cart, restoring saved checkout selections.
    #[must_use]
    pub fn new(
        api: Arc<dyn CommerceApi>,
        session: Arc<Session>,
        storage: Storage,
        pricing: PricingPolicy,
    ) -> Self {
        let state = CartState {
            lines: Vec::new(),
            shipping_address: storage.load_or_none(keys::SHIPPING_ADDRESS),
            payment_method: storage.load_or_none(keys::PAYMENT_METHOD),
        };
        Self {
            api,
            session,
            storage,
            pricing,
            state: RwLock::new(state),
            mutation: Mutex::new(()),
        }
    }

    // =========================================================================
    // Remote sync
    // =========================================================================

    /// Replace local lines with the remote cart.
    ///
    /// Does nothing for guests. Failures are logged and the previous lines
    /// are kept.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) {
        if !self.session.is_authenticated() {
            debug!("Skipping cart fetch for guest");
            return;
        }
        let _guard = self.mutation.lock().await;
        self.resync().await;
    }

    /// Refetch without taking the mutation lock; callers hold it.
    async fn resync(&self) {
        match self.api.fetch_cart().await {
            Ok(lines) => {
                debug!(lines = lines.len(), "Cart synced");
                self.state.write().await.lines = lines;
            }
            Err(e) => warn!(error = %e, "Failed to fetch cart, keeping previous state"),
        }
    }

    /// Set a product's quantity in the remote cart, then resync.
    ///
    /// Nothing is inserted locally before the server confirms.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` without a session,
    /// `ClientError::Validation` for a zero quantity, or the remote error if
    /// the write fails (local state is then untouched).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        if !self.session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }
        if quantity == 0 {
            return Err(ClientError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let _guard = self.mutation.lock().await;
        if let Err(e) = self.api.put_cart_item(product_id, quantity).await {
            warn!(error = %e, "Failed to add to cart");
            return Err(e);
        }

        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.resync().await;
        Ok(())
    }

    /// Change a line's quantity, clamped to `[1, stock_available]`.
    ///
    /// Returns the quantity actually requested from the server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the product is not in the cart,
    /// `ClientError::Validation` if it is out of stock, or whatever
    /// [`Self::add_to_cart`] returns.
    pub async fn update_quantity(&self, product_id: &ProductId, requested: u32) -> Result<u32> {
        let line = self
            .line(product_id)
            .await
            .ok_or_else(|| ClientError::NotFound(format!("Cart item {product_id}")))?;

        let quantity = line.clamp_quantity(requested).ok_or_else(|| {
            ClientError::Validation(format!("{} is out of stock", line.name))
        })?;

        self.add_to_cart(product_id, quantity).await?;
        Ok(quantity)
    }

    /// Remove a line remotely, then resync whatever happened.
    ///
    /// Failures are logged, never returned.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) {
        if !self.session.is_authenticated() {
            warn!("Ignoring cart removal for guest");
            return;
        }

        let _guard = self.mutation.lock().await;
        match self.api.delete_cart_item(product_id).await {
            Ok(()) => add_breadcrumb(
                "cart",
                "Removed from cart",
                Some(&[("product_id", product_id.as_str())]),
            ),
            Err(e) => warn!(error = %e, "Failed to remove cart item"),
        }
        self.resync().await;
    }

    /// Empty the remote cart.
    ///
    /// On success local lines are emptied at once, the saved shipping
    /// address and payment method are forgotten, and a resync follows.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` without a session, or the
    /// remote error; local state is then untouched.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }

        let _guard = self.mutation.lock().await;
        self.clear_locked().await
    }

    async fn clear_locked(&self) -> Result<()> {
        self.api.delete_cart().await?;

        {
            let mut state = self.state.write().await;
            state.lines.clear();
            state.shipping_address = None;
            state.payment_method = None;
        }
        self.remove_checkout_keys();

        add_breadcrumb("cart", "Cleared cart", None);
        self.resync().await;
        Ok(())
    }

    /// Place an order for the cart and clear it.
    ///
    /// The cart is resynced first so the order prices what the server
    /// holds. Other cart mutations wait until the order is placed and the
    /// cart cleared. A failed clear after a placed order is only logged.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` without a session,
    /// `ClientError::Validation` if the review is incomplete, or the remote
    /// error if the order is refused.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<OrderReceipt> {
        if !self.session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }

        let _guard = self.mutation.lock().await;
        self.resync().await;
        let order = self.review().await.to_order_request()?;

        let receipt = self.api.create_order(&order).await?;
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", receipt.id.as_str())]));
        info!(order_id = %receipt.id, total = %order.total_price, "Order placed");

        if let Err(e) = self.clear_locked().await {
            warn!(error = %e, order_id = %receipt.id, "Order placed but cart could not be cleared");
        }
        Ok(receipt)
    }

    // =========================================================================
    // Checkout selections
    // =========================================================================

    /// Remember the shipping address for checkout.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if it cannot be persisted; the
    /// address is still kept for this process.
    pub async fn save_shipping_address(&self, address: ShippingAddress) -> Result<()> {
        let persisted = self.storage.save(keys::SHIPPING_ADDRESS, &address);
        self.state.write().await.shipping_address = Some(address);
        Ok(persisted?)
    }

    /// Remember the payment method for checkout.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if it cannot be persisted; the
    /// method is still kept for this process.
    pub async fn save_payment_method(&self, method: PaymentMethod) -> Result<()> {
        let persisted = self.storage.save(keys::PAYMENT_METHOD, &method);
        self.state.write().await.payment_method = Some(method);
        Ok(persisted?)
    }

    pub async fn shipping_address(&self) -> Option<ShippingAddress> {
        self.state.read().await.shipping_address.clone()
    }

    pub async fn payment_method(&self) -> Option<PaymentMethod> {
        self.state.read().await.payment_method
    }

    /// Drop the saved shipping address and payment method.
    pub async fn forget_checkout_details(&self) {
        {
            let mut state = self.state.write().await;
            state.shipping_address = None;
            state.payment_method = None;
        }
        self.remove_checkout_keys();
    }

    fn remove_checkout_keys(&self) {
        for key in [keys::SHIPPING_ADDRESS, keys::PAYMENT_METHOD] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove checkout selection");
            }
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Snapshot of the current lines.
    pub async fn lines(&self) -> Vec<CartLine> {
        self.state.read().await.lines.clone()
    }

    pub async fn line(&self, product_id: &ProductId) -> Option<CartLine> {
        self.state
            .read()
            .await
            .lines
            .iter()
            .find(|line| &line.product_id == product_id)
            .cloned()
    }

    /// Total number of units across all lines, saturating at `u32::MAX`.
    pub async fn item_count(&self) -> u32 {
        self.state
            .read()
            .await
            .lines
            .iter()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.lines.is_empty()
    }

    /// Price breakdown of the current lines.
    pub async fn summary(&self) -> PriceBreakdown {
        self.pricing.price(&self.state.read().await.lines)
    }

    /// Lines, checkout selections and breakdown from a single read.
    pub async fn review(&self) -> CheckoutReview {
        let state = self.state.read().await;
        CheckoutReview {
            breakdown: self.pricing.price(&state.lines),
            lines: state.lines.clone(),
            shipping_address: state.shipping_address.clone(),
            payment_method: state.payment_method,
        }
    }

    #[must_use]
    pub const fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Drop all local state after sign-out.
    pub async fn reset(&self) {
        let _guard = self.mutation.lock().await;
        self.state.write().await.lines.clear();
        self.forget_checkout_details().await;
    }
}

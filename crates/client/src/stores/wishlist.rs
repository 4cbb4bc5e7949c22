//! Wishlist store.

use std::sync::Arc;

use souk_core::{ProductId, WishlistEntry};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::api::CommerceApi;
use crate::api::types::ToggleOutcome;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::session::Session;

/// Local view of the signed-in shopper's wishlist.
pub struct WishlistStore {
    api: Arc<dyn CommerceApi>,
    session: Arc<Session>,
    entries: RwLock<Vec<WishlistEntry>>,
    mutation: Mutex<()>,
}

impl std::fmt::Debug for WishlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistStore").finish_non_exhaustive()
    }
}

impl WishlistStore {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: Arc<Session>) -> Self {
        Self {
            api,
            session,
            entries: RwLock::new(Vec::new()),
            mutation: Mutex::new(()),
        }
    }

    /// Replace local entries with the remote wishlist.
    ///
    /// Does nothing for guests; failures keep the previous entries.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist(&self) {
        if !self.session.is_authenticated() {
            debug!("Skipping wishlist fetch for guest");
            return;
        }
        let _guard = self.mutation.lock().await;
        self.resync().await;
    }

    async fn resync(&self) {
        match self.api.fetch_wishlist().await {
            Ok(entries) => {
                debug!(entries = entries.len(), "Wishlist synced");
                *self.entries.write().await = entries;
            }
            Err(e) => warn!(error = %e, "Failed to fetch wishlist, keeping previous state"),
        }
    }

    /// Flip a product's wishlist membership.
    ///
    /// The server decides and reports whether the product was added or
    /// removed; the wishlist is then refetched either way. A failed toggle
    /// also refetches, since the server may have applied it before the
    /// response went wrong.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` without a session, or the
    /// remote error if the toggle fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<ToggleOutcome> {
        if !self.session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }

        let _guard = self.mutation.lock().await;
        let outcome = match self.api.toggle_wishlist(product_id).await {
            Ok(outcome) => outcome,
            Err(ClientError::Unauthenticated) => return Err(ClientError::Unauthenticated),
            Err(e) => {
                warn!(error = %e, "Failed to toggle wishlist");
                self.resync().await;
                return Err(e);
            }
        };

        add_breadcrumb(
            "wishlist",
            outcome.message(),
            Some(&[("product_id", product_id.as_str())]),
        );
        self.resync().await;
        Ok(outcome)
    }

    /// Whether `product_id` is in the local wishlist.
    pub async fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|entry| &entry.product_id == product_id)
    }

    /// Snapshot of the current entries.
    pub async fn entries(&self) -> Vec<WishlistEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop all local state after sign-out.
    pub async fn reset(&self) {
        let _guard = self.mutation.lock().await;
        self.entries.write().await.clear();
    }
}

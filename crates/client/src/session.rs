//! Signed-in session state.
//!
//! Mirrors the record the auth endpoints hand back: a bearer token and the
//! user it belongs to. The record is persisted under [`keys::SESSION`] so a
//! restart resumes where the shopper left off.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use souk_core::User;
use tracing::{debug, warn};

use crate::api::types::AuthGrant;
use crate::storage::{Storage, keys};

/// An authenticated shopper.
#[derive(Clone)]
pub struct AuthSession {
    pub token: SecretString,
    pub user: User,
    pub signed_in_at: DateTime<Utc>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .field("signed_in_at", &self.signed_in_at)
            .finish()
    }
}

/// On-disk form of [`AuthSession`].
#[derive(Serialize, Deserialize)]
struct StoredSession {
    token: String,
    user: User,
    signed_in_at: DateTime<Utc>,
}

impl From<&AuthSession> for StoredSession {
    fn from(session: &AuthSession) -> Self {
        Self {
            token: session.token.expose_secret().to_string(),
            user: session.user.clone(),
            signed_in_at: session.signed_in_at,
        }
    }
}

impl From<StoredSession> for AuthSession {
    fn from(stored: StoredSession) -> Self {
        Self {
            token: stored.token.into(),
            user: stored.user,
            signed_in_at: stored.signed_in_at,
        }
    }
}

/// The current session, shared by the API client and both stores.
///
/// Lookups are synchronous and never held across an `.await`.
#[derive(Debug)]
pub struct Session {
    storage: Storage,
    current: RwLock<Option<AuthSession>>,
}

impl Session {
    /// Restore the session persisted in `storage`, if any.
    #[must_use]
    pub fn load(storage: Storage) -> Self {
        let current = storage
            .load_or_none::<StoredSession>(keys::SESSION)
            .map(AuthSession::from);
        if let Some(session) = &current {
            debug!(user_id = %session.user.id, "Restored session");
        }
        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    /// A session with nobody signed in and nothing persisted.
    #[must_use]
    pub fn anonymous(storage: Storage) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
        }
    }

    /// Whether a shopper is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Token to send as `Authorization: Bearer`.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.read().as_ref().map(|session| session.token.clone())
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().as_ref().map(|session| session.user.clone())
    }

    /// Adopt freshly issued credentials and persist them.
    ///
    /// The in-memory session is replaced even if persisting fails; the
    /// shopper stays signed in until the process exits.
    pub fn establish(&self, grant: AuthGrant) -> AuthSession {
        let session = AuthSession {
            token: grant.token,
            user: grant.user,
            signed_in_at: Utc::now(),
        };
        if let Err(e) = self
            .storage
            .save(keys::SESSION, &StoredSession::from(&session))
        {
            warn!(error = %e, "Failed to persist session");
        }
        *self.write() = Some(session.clone());
        session
    }

    /// Drop the session in memory and on disk.
    pub fn end(&self) {
        *self.write() = None;
        if let Err(e) = self.storage.remove(keys::SESSION) {
            warn!(error = %e, "Failed to remove persisted session");
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<AuthSession>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<AuthSession>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

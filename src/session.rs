//! Session store: the single source of truth for who is logged in.
//!
//! DESIGN
//! ======
//! `SessionStore` is an explicit context object shared through `Arc`; the
//! only writers are `login` and `logoff`, and both replace the whole
//! `Identity` at once. The lock is never held across an `.await`, and
//! storage is only rehydrated or cleared while holding it for writing.
//!
//! The snapshot lives under two storage keys: `identity` (the JSON
//! principal) and `session` (the cookie to replay). `remember` picks the
//! storage tier; see `storage::Retention`.
//!
//! ERROR HANDLING
//! ==============
//! Login failures propagate untouched. Storage failures are logged and
//! never fail a login or logoff: the in-memory session stays correct for
//! the life of the process. Logoff clears local state whatever the
//! backend answers.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, RwLock};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::net::api::AuthApi;
use crate::net::types::{Registration, User};
use crate::storage::{Retention, TieredStorage};

pub const IDENTITY_KEY: &str = "identity";
pub const SESSION_COOKIE_KEY: &str = "session";

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    storage: TieredStorage,
    current: RwLock<Identity>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: TieredStorage) -> Self {
        Self { api, storage, current: RwLock::new(Identity::anonymous()) }
    }

    /// Authenticate, then make the returned principal the current one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the credentials are rejected,
    /// or any other `ApiError` from the request. The current identity is
    /// left as it was.
    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Result<Identity, ApiError> {
        let outcome = self
            .api
            .login(email, password, remember)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "login rejected"))?;

        let retention = Retention::from_remember(remember);
        self.api.set_session_cookie(outcome.session_cookie.clone());
        self.persist(retention, &outcome.identity, outcome.session_cookie.as_deref());
        self.replace(outcome.identity.clone());

        tracing::info!(user_id = outcome.identity.user_id, ?retention, "logged in");
        Ok(outcome.identity)
    }

    /// Current principal, rehydrating from storage when nothing is loaded.
    /// Returns the anonymous identity when there is no usable snapshot.
    #[must_use]
    pub fn identity(&self) -> Identity {
        {
            let current = self
                .current
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if current.is_authenticated() {
                return current.clone();
            }
        }

        // Re-check under the write lock: a logoff may have finished while
        // this reader waited, and its cleared storage must win.
        let mut current = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if current.is_authenticated() {
            return current.clone();
        }
        match self.rehydrate() {
            Some(restored) => {
                *current = restored.clone();
                restored
            }
            None => Identity::anonymous(),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity().is_authenticated()
    }

    /// Call the logout endpoint, then drop the session locally.
    ///
    /// Local state (memory and both storage tiers) is cleared before this
    /// returns, whether or not the backend call succeeded.
    ///
    /// # Errors
    ///
    /// Returns the logout request's error, for reporting only.
    pub async fn logoff(&self) -> Result<(), ApiError> {
        // Restores the cookie so the backend can end the right session.
        let previous = self.identity();

        let result = self.api.logout().await;

        {
            // Storage is cleared under the write lock so no reader can
            // rehydrate the old snapshot in between.
            let mut current = self
                .current
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for key in [IDENTITY_KEY, SESSION_COOKIE_KEY] {
                if let Err(e) = self.storage.clear(key) {
                    tracing::warn!(key, error = %e, "failed to clear stored session");
                }
            }
            self.api.set_session_cookie(None);
            *current = Identity::anonymous();
        }

        match &result {
            Ok(()) => tracing::info!(user_id = previous.user_id, "logged off"),
            Err(e) => tracing::warn!(user_id = previous.user_id, error = %e, "logout request failed; local session cleared"),
        }
        result
    }

    /// Create an account. Does not log the new user in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Conflict` when the email is taken.
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let user = self
            .api
            .register(registration)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "registration rejected"))?;
        tracing::info!(user_id = user.user_id, "registered");
        Ok(user)
    }

    fn replace(&self, identity: Identity) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = identity;
    }

    fn persist(&self, retention: Retention, identity: &Identity, cookie: Option<&str>) {
        let raw = match serde_json::to_string(identity) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize identity");
                return;
            }
        };
        if let Err(e) = self.storage.save(retention, IDENTITY_KEY, &raw) {
            tracing::warn!(?retention, error = %e, "failed to store identity");
        }

        let stored = match cookie {
            Some(cookie) => self.storage.save(retention, SESSION_COOKIE_KEY, cookie),
            None => self.storage.clear(SESSION_COOKIE_KEY),
        };
        if let Err(e) = stored {
            tracing::warn!(?retention, error = %e, "failed to store session cookie");
        }
    }

    fn rehydrate(&self) -> Option<Identity> {
        let raw = self.storage.load(IDENTITY_KEY)?;
        let identity: Identity = match serde_json::from_str(&raw) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored identity");
                return None;
            }
        };
        if !identity.is_authenticated() {
            return None;
        }

        self.api.set_session_cookie(self.storage.load(SESSION_COOKIE_KEY));
        tracing::debug!(user_id = identity.user_id, "identity restored from storage");
        Some(identity)
    }
}

//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};

use crate::error::ApiError;
use crate::identity::{Identity, Role};
use crate::net::api::{AuthApi, LoginOutcome};
use crate::net::types::{Registration, User};
use crate::session::SessionStore;
use crate::storage::TieredStorage;

/// Backend that accepts exactly one password and answers with `identity`.
pub(crate) struct FakeBackend {
    password: String,
    identity: Identity,
    cookie: Mutex<Option<String>>,
}

impl FakeBackend {
    pub(crate) fn new(password: &str, identity: Identity) -> Self {
        Self { password: password.to_owned(), identity, cookie: Mutex::new(None) }
    }
}

#[async_trait::async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, _email: &str, password: &str, _remember: bool) -> Result<LoginOutcome, ApiError> {
        if password != self.password {
            return Err(ApiError::Unauthorized);
        }
        Ok(LoginOutcome { identity: self.identity.clone(), session_cookie: Some("JSESSIONID=fake".into()) })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        Ok(User { user_id: 100, email: registration.email.clone(), ..User::default() })
    }

    fn set_session_cookie(&self, cookie: Option<String>) {
        *self.cookie.lock().unwrap() = cookie;
    }
}

pub(crate) fn identity(user_id: i64, role: Option<Role>) -> Identity {
    Identity { user_id, role, ..Identity::default() }
}

/// In-memory session store backed by a `FakeBackend` accepting `"secret"`.
pub(crate) fn session_for(identity: Identity) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(Arc::new(FakeBackend::new("secret", identity)), TieredStorage::in_memory()))
}

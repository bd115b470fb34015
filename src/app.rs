//! Application context wiring.
//!
//! DESIGN
//! ======
//! `App` builds the shared pieces once and hands them out explicitly: the
//! REST client, the session store on top of it, and the navigator that
//! guards every view. Nothing here is global; tests build an `App` over
//! in-memory storage.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::navigation::{Navigation, Navigator};
use crate::net::api::ApiClient;
use crate::routes::Route;
use crate::session::SessionStore;
use crate::storage::TieredStorage;

pub struct App {
    pub config: ClientConfig,
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
    pub navigator: Navigator,
}

impl App {
    /// Wire an app that keeps its session snapshot on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let storage = TieredStorage::on_disk(config.session_dir(), config.persistent_dir());
        Self::with_storage(config, storage)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: ClientConfig, storage: TieredStorage) -> Result<Self, ApiError> {
        let api = Arc::new(ApiClient::new(&config)?);
        let session = Arc::new(SessionStore::new(api.clone(), storage));
        let navigator = Navigator::new(session.clone());
        Ok(Self { config, api, session, navigator })
    }

    /// Enter `route` as the current principal.
    ///
    /// # Errors
    ///
    /// Returns the navigation that happened instead when the guard
    /// redirected.
    pub fn enter(&self, route: Route) -> Result<Identity, Navigation> {
        let navigation = self.navigator.navigate_to(route);
        if navigation.reached(route) {
            Ok(self.session.identity())
        } else {
            Err(navigation)
        }
    }
}

//! Guarded navigation between views.
//!
//! The navigator resolves a path against the route table, asks the guard,
//! follows redirects, and remembers where the user ended up. Unknown paths
//! go to the login view, as does anything that cannot be settled within
//! `MAX_REDIRECTS` hops.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::sync::{Arc, Mutex};

use crate::guard::{Decision, Guard};
use crate::routes::Route;
use crate::session::SessionStore;

const MAX_REDIRECTS: usize = 1;

/// Where a navigation attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: String,
    pub location: Route,
    pub redirected: bool,
}

impl Navigation {
    /// True when the user landed on what they asked for.
    #[must_use]
    pub fn reached(&self, route: Route) -> bool {
        !self.redirected && self.location == route
    }
}

pub struct Navigator {
    guard: Guard,
    location: Mutex<Route>,
}

impl Navigator {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { guard: Guard::new(session), location: Mutex::new(Route::Login) }
    }

    #[must_use]
    pub fn location(&self) -> Route {
        *self
            .location
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Navigate by path; `/` and unknown paths redirect to the login view.
    pub fn navigate(&self, path: &str) -> Navigation {
        match Route::from_path(path) {
            Some(route) => self.enter(path.to_owned(), route),
            None => {
                tracing::debug!(path, "unknown path");
                let mut navigation = self.enter(path.to_owned(), Route::Login);
                navigation.redirected = true;
                navigation
            }
        }
    }

    pub fn navigate_to(&self, route: Route) -> Navigation {
        self.enter(route.path().to_owned(), route)
    }

    /// Where to go right after a successful login.
    pub fn after_login(&self) -> Navigation {
        self.navigate_to(Route::Home)
    }

    fn enter(&self, requested: String, route: Route) -> Navigation {
        let mut target = route;
        let mut redirected = false;
        let mut hops = 0;

        let location = loop {
            match self.guard.check(target) {
                Decision::Allow => break target,
                Decision::Redirect(next) if hops < MAX_REDIRECTS && next != target => {
                    redirected = true;
                    hops += 1;
                    target = next;
                }
                Decision::Redirect(_) => {
                    redirected = true;
                    break Route::Login;
                }
            }
        };

        *self
            .location
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = location;
        if redirected {
            tracing::info!(requested = %requested, %location, "redirected");
        }
        Navigation { requested, location, redirected }
    }
}

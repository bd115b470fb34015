//! Route authorization guard.
//!
//! `authorize` is the whole policy and is pure. `Guard` only adds the read
//! of the current identity from the session store; it never writes to it.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use crate::identity::{Identity, Role};
use crate::routes::{Protection, Route};
use crate::session::SessionStore;

/// Outcome of a navigation attempt. A redirect is a normal answer, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Route),
}

/// Where a principal with `role` lands by default.
#[must_use]
pub fn landing_route(role: Option<&Role>) -> Route {
    match role {
        Some(Role::User) => Route::Home,
        Some(Role::Admin) => Route::Admin,
        Some(Role::Other(_)) | None => Route::Login,
    }
}

/// Decide whether `identity` may enter `route`.
#[must_use]
pub fn authorize(identity: &Identity, route: Route) -> Decision {
    let required = match route.protection() {
        Protection::Public => return Decision::Allow,
        Protection::Protected { role } => role.as_ref(),
    };

    if !identity.is_authenticated() {
        return Decision::Redirect(Route::Login);
    }

    match required {
        Some(required) if identity.role.as_ref() != Some(required) => {
            Decision::Redirect(landing_route(identity.role.as_ref()))
        }
        _ => Decision::Allow,
    }
}

/// Applies [`authorize`] to whoever the session store says is logged in.
#[derive(Clone)]
pub struct Guard {
    session: Arc<SessionStore>,
}

impl Guard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn check(&self, route: Route) -> Decision {
        let identity = self.session.identity();
        let decision = authorize(&identity, route);
        if let Decision::Redirect(target) = decision {
            tracing::debug!(user_id = identity.user_id, %route, %target, "navigation denied");
        }
        decision
    }
}

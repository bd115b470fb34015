//! Declarative route table.
//!
//! Every view the client can enter is listed once in `ROUTES`, together
//! with its protection. The guard reads this table; it never inspects
//! paths itself.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use std::fmt;

use crate::identity::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Home,
    Transfer,
    Profile,
    Contact,
    Admin,
    AdminUsers,
    AdminTransactions,
    AdminBankTransfers,
}

/// Who may enter a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protection {
    /// Reachable without a session.
    Public,
    /// Needs a session; `role`, when set, must equal the principal's role.
    Protected { role: Option<Role> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub route: Route,
    pub path: &'static str,
    pub title: &'static str,
    pub protection: Protection,
}

const fn spec(route: Route, path: &'static str, title: &'static str, protection: Protection) -> RouteSpec {
    RouteSpec { route, path, title, protection }
}

const USER_ONLY: Protection = Protection::Protected { role: Some(Role::User) };
const ADMIN_ONLY: Protection = Protection::Protected { role: Some(Role::Admin) };

/// Indexed by `Route` discriminant.
pub static ROUTES: [RouteSpec; 10] = [
    spec(Route::Login, "/login", "Log in", Protection::Public),
    spec(Route::Register, "/register", "Register", Protection::Public),
    spec(Route::Home, "/home", "Home", USER_ONLY),
    spec(Route::Transfer, "/home/transfer", "Transfer", USER_ONLY),
    spec(Route::Profile, "/home/profile", "Profile", USER_ONLY),
    spec(Route::Contact, "/home/contact", "Contact", USER_ONLY),
    spec(Route::Admin, "/home/admin", "Admin", ADMIN_ONLY),
    spec(Route::AdminUsers, "/home/admin/users", "Users", ADMIN_ONLY),
    spec(Route::AdminTransactions, "/home/admin/transactions", "Transactions", ADMIN_ONLY),
    spec(Route::AdminBankTransfers, "/home/admin/banktransfers", "Bank transfers", ADMIN_ONLY),
];

impl Route {
    #[must_use]
    pub fn spec(self) -> &'static RouteSpec {
        &ROUTES[self as usize]
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        self.spec().path
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        self.spec().title
    }

    #[must_use]
    pub fn protection(self) -> &'static Protection {
        &self.spec().protection
    }

    /// Match a path against the table. Trailing slashes, query strings and
    /// fragments are ignored. Unknown paths (including `/`) yield `None`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = path.trim_end_matches('/');
        let path = path.strip_prefix('/').unwrap_or(path);
        ROUTES
            .iter()
            .find(|spec| spec.path.strip_prefix('/') == Some(path))
            .map(|spec| spec.route)
    }

    /// Ancestors from the outermost down to this route, e.g.
    /// `/home/admin/users` gives Home, Admin, Users.
    #[must_use]
    pub fn breadcrumbs(self) -> Vec<Self> {
        let own = self.path();
        let mut trail: Vec<&RouteSpec> = ROUTES
            .iter()
            .filter(|spec| {
                own == spec.path
                    || own
                        .strip_prefix(spec.path)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .collect();
        trail.sort_by_key(|spec| spec.path.len());
        trail.into_iter().map(|spec| spec.route).collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

//! # paymybuddy
//!
//! Client for the PayMyBuddy payments backend: who is logged in, which
//! views they may enter, and typed access to the REST API.
//!
//! The core is the [`session::SessionStore`] (login, logoff, the durable
//! identity snapshot) and the [`guard`] that every navigation passes
//! through. [`app::App`] wires them together for the `paymybuddy` CLI.

pub mod app;
pub mod config;
pub mod error;
pub mod fees;
pub mod guard;
pub mod identity;
pub mod navigation;
pub mod net;
pub mod routes;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;

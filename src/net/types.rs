//! Wire types shared with the PayMyBuddy REST API.
//!
//! Field names follow the backend's camelCase DTOs. Response types carry
//! everything the server fills in (dates, names, balances) and serialize it
//! back out for display; request bodies are separate `*Request`/`*Update`
//! types holding only what the client may send.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

// =============================================================================
// USERS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub user_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub wallet: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
}

/// Body of `PUT /users`. Balance and registration date are server-owned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub user_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    /// Only sent when changing it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            email: user.email.clone(),
            password: None,
        }
    }
}

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// CONNECTIONS
// =============================================================================

/// A buddy the user can send money to. `email` is only sent when adding one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Connection {
    pub connection_id: i64,
    pub firstname: String,
    pub lastname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Connection {
    #[must_use]
    pub fn by_email(email: impl Into<String>) -> Self {
        Self { email: Some(email.into()), ..Self::default() }
    }
}

// =============================================================================
// BANK ACCOUNTS & TRANSFERS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankAccount {
    pub bank_account_id: i64,
    pub title: String,
    pub iban: String,
    pub bic: String,
    pub balance: f64,
    pub user_id: i64,
}

/// Money moved between the wallet and one of the user's bank accounts.
/// `income == true` credits the wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankTransfer {
    pub user_id: i64,
    pub bank_account_id: i64,
    pub amount: f64,
    #[serde(alias = "isIncome")]
    pub income: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body of `POST /banktransfers`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransferRequest {
    pub user_id: i64,
    pub bank_account_id: i64,
    pub amount: f64,
    pub income: bool,
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub emitter_id: i64,
    pub receiver_id: i64,
    pub description: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitter_firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitter_lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_lastname: Option<String>,
}

/// Body of `POST /transactions`. `receiver_id` is a connection id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub emitter_id: i64,
    pub receiver_id: i64,
    pub description: String,
    pub amount: f64,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Spring Data page envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    /// Wrap a bare list as a single page.
    #[must_use]
    pub fn single(content: Vec<T>) -> Self {
        let len = content.len();
        Self {
            content,
            total_pages: u32::from(len > 0),
            total_elements: len as u64,
            number: 0,
            size: u32::try_from(len).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages
    }
}

/// Some list endpoints answer with a bare array, others with a page.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum PageOrList<T> {
    List(Vec<T>),
    Page(Page<T>),
}

impl<T> From<PageOrList<T>> for Page<T> {
    fn from(value: PageOrList<T>) -> Self {
        match value {
            PageOrList::List(items) => Page::single(items),
            PageOrList::Page(page) => page,
        }
    }
}

/// Zero-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 5;

    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size: size.max(1) }
    }

    pub(crate) fn query(self, newest_first: bool) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if newest_first {
            query.push(("sort", "date,desc".to_owned()));
        }
        query
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

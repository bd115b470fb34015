//! REST client for the PayMyBuddy backend.
//!
//! DESIGN
//! ======
//! One `reqwest::Client` per `ApiClient`. Authentication is HTTP Basic on
//! `GET /login`; the backend answers with a session cookie that every later
//! request replays. The cookie is held here and handed to the session store
//! so it can be persisted next to the identity.
//!
//! ERROR HANDLING
//! ==============
//! Non-success statuses become `ApiError` variants via
//! `ApiError::from_status`. Nothing is retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::types::{
    BankAccount, BankTransfer, BankTransferRequest, Connection, Page, PageOrList, PageRequest, Registration, Transaction,
    TransactionRequest, User, UserUpdate,
};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::identity::Identity;

const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

// =============================================================================
// AUTH SEAM
// =============================================================================

/// Successful login: the principal plus the cookie to replay.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub session_cookie: Option<String>,
}

/// Authentication endpoints used by the session store.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /login?remember=` with Basic credentials.
    async fn login(&self, email: &str, password: &str, remember: bool) -> Result<LoginOutcome, ApiError>;

    /// `GET /logout`.
    async fn logout(&self) -> Result<(), ApiError>;

    /// `POST /register`.
    async fn register(&self, registration: &Registration) -> Result<User, ApiError>;

    /// Replace the cookie replayed on authenticated requests.
    fn set_session_cookie(&self, cookie: Option<String>);
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session_cookie: RwLock<Option<String>>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), session_cookie: RwLock::new(None) })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.session_cookie
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .http
            .request(method, url)
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1);
        match self.session_cookie() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// `GET /users`: every user, admin only.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn users(&self, page: PageRequest) -> Result<Page<User>, ApiError> {
        let builder = self.request(Method::GET, "/users").query(&page.query(false));
        send_json(builder).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn user(&self, user_id: i64) -> Result<User, ApiError> {
        send_json(self.request(Method::GET, &format!("/users/{user_id}"))).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn update_user(&self, user: &UserUpdate) -> Result<User, ApiError> {
        send_json(self.request(Method::PUT, "/users").json(user)).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        send_empty(self.request(Method::DELETE, &format!("/users/{user_id}"))).await
    }

    /// `PUT /users/{id}/enable`: admin only.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn set_user_enabled(&self, user_id: i64, enabled: bool) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/users/{user_id}/enable"))
            .query(&[("value", enabled)]);
        send_empty(builder).await
    }

    // -------------------------------------------------------------------------
    // Connections
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn connections(&self, user_id: i64, page: PageRequest) -> Result<Page<Connection>, ApiError> {
        let builder = self
            .request(Method::GET, &format!("/users/{user_id}/connections"))
            .query(&page.query(false));
        send_page(builder).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn add_connection(&self, user_id: i64, email: &str) -> Result<Connection, ApiError> {
        let builder = self
            .request(Method::POST, &format!("/users/{user_id}/connections/"))
            .json(&Connection::by_email(email));
        send_json(builder).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn delete_connection(&self, user_id: i64, connection_id: i64) -> Result<(), ApiError> {
        send_empty(self.request(Method::DELETE, &format!("/users/{user_id}/connections/{connection_id}"))).await
    }

    // -------------------------------------------------------------------------
    // Bank accounts
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn bank_accounts(&self, user_id: i64, page: PageRequest) -> Result<Page<BankAccount>, ApiError> {
        let builder = self
            .request(Method::GET, &format!("/users/{user_id}/bankaccounts"))
            .query(&page.query(false));
        send_page(builder).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn add_bank_account(&self, user_id: i64, account: &BankAccount) -> Result<BankAccount, ApiError> {
        send_json(self.request(Method::POST, &format!("/users/{user_id}/bankaccounts/")).json(account)).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn delete_bank_account(&self, user_id: i64, bank_account_id: i64) -> Result<(), ApiError> {
        send_empty(self.request(Method::DELETE, &format!("/users/{user_id}/bankaccounts/{bank_account_id}"))).await
    }

    // -------------------------------------------------------------------------
    // Bank transfers
    // -------------------------------------------------------------------------

    /// `GET /banktransfers`: every transfer, admin only, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn all_bank_transfers(&self, page: PageRequest) -> Result<Page<BankTransfer>, ApiError> {
        send_json(self.request(Method::GET, "/banktransfers").query(&page.query(true))).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn bank_transfers(&self, user_id: i64, page: PageRequest) -> Result<Page<BankTransfer>, ApiError> {
        let builder = self
            .request(Method::GET, "/banktransfers/user")
            .query(&[("id", user_id)])
            .query(&page.query(true));
        send_json(builder).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn request_bank_transfer(&self, transfer: &BankTransferRequest) -> Result<BankTransfer, ApiError> {
        send_json(self.request(Method::POST, "/banktransfers").json(transfer)).await
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    /// `GET /transactions`: every transaction, admin only, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn all_transactions(&self, page: PageRequest) -> Result<Page<Transaction>, ApiError> {
        send_json(self.request(Method::GET, "/transactions").query(&page.query(true))).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn transactions(&self, user_id: i64, page: PageRequest) -> Result<Page<Transaction>, ApiError> {
        let builder = self
            .request(Method::GET, "/transactions/user")
            .query(&[("id", user_id)])
            .query(&page.query(true));
        send_json(builder).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn request_transaction(&self, transaction: &TransactionRequest) -> Result<Transaction, ApiError> {
        send_json(self.request(Method::POST, "/transactions").json(transaction)).await
    }
}

#[async_trait::async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str, remember: bool) -> Result<LoginOutcome, ApiError> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("remember", remember)])
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
            .basic_auth(email, Some(password))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let session_cookie = session_cookie_from(&response);
        let identity: Identity = read_json(response).await?;
        Ok(LoginOutcome { identity, session_cookie })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let result = send_empty(self.request(Method::GET, "/logout")).await;
        self.set_session_cookie(None);
        result
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let url = format!("{}/register", self.base_url);
        let builder = self
            .http
            .post(url)
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
            .json(registration);
        send_json(builder).await
    }

    fn set_session_cookie(&self, cookie: Option<String>) {
        *self
            .session_cookie
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = cookie;
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
    builder.send().await.map_err(|e| ApiError::Request(e.to_string()))
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    read_json(send(builder).await?).await
}

async fn send_page<T: DeserializeOwned>(builder: RequestBuilder) -> Result<Page<T>, ApiError> {
    let raw: PageOrList<T> = send_json(builder).await?;
    Ok(raw.into())
}

async fn send_empty(builder: RequestBuilder) -> Result<(), ApiError> {
    let response = send(builder).await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "request rejected");
    Err(ApiError::from_status(status.as_u16(), body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;

    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "request rejected");
        return Err(ApiError::from_status(status.as_u16(), text));
    }

    parse_body(&text)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Collapse `Set-Cookie` headers into a `Cookie` header value, keeping only
/// the `name=value` pairs and dropping cookies the server is deleting.
fn session_cookie_from(response: &Response) -> Option<String> {
    let pairs: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(cookie_pair)
        .collect();
    if pairs.is_empty() { None } else { Some(pairs.join("; ")) }
}

fn cookie_pair(set_cookie: &str) -> Option<&str> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name.is_empty() || value.is_empty() {
        return None;
    }
    let expired = set_cookie
        .split(';')
        .skip(1)
        .any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));
    if expired { None } else { Some(pair) }
}

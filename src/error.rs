//! Error taxonomy for calls against the PayMyBuddy backend.
//!
//! ERROR HANDLING
//! ==============
//! Status codes the backend uses deliberately (401, 403, 404, 409, 422) get
//! their own variants so callers can branch on them; everything else is
//! `Unknown`. Transport and decode failures are kept apart from HTTP
//! statuses. Nothing here is retried.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::collections::BTreeMap;

/// Errors produced by [`crate::net::api::ApiClient`] and the session store.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Credentials rejected, or the session is gone (401).
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed (403).
    #[error("forbidden")]
    Forbidden,

    /// The resource does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate resource or rejected business operation (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Payload failed server-side validation (422), keyed by field.
    #[error("validation failed: {}", describe_fields(.0))]
    Validation(BTreeMap<String, String>),

    /// Any other non-success status.
    #[error("unexpected response: status {status}")]
    Unknown { status: u16, body: String },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Request(String),

    /// A success response body could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Map a non-success status and its body to a variant.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound(body),
            409 => Self::Conflict(body),
            422 => match serde_json::from_str::<BTreeMap<String, String>>(&body) {
                Ok(fields) => Self::Validation(fields),
                Err(_) => Self::Unknown { status, body },
            },
            _ => Self::Unknown { status, body },
        }
    }

    /// Message shown to a user whose login attempt failed.
    #[must_use]
    pub fn login_message(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Wrong email or password, please try again.",
            _ => "An error occured, please try again.",
        }
    }
}

fn describe_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join(", ")
}

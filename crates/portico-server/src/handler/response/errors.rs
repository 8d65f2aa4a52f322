use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Tracing target for rendered error responses.
const TRACING_TARGET: &str = "portico_server::handler::response";

/// The failure envelope `{"errors": [..]}` plus its status code.
///
/// Only `errors` is serialized. When no explicit errors are attached the
/// default message of the response is sent as the single entry.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// Caller-facing messages.
    pub errors: Vec<Cow<'a, str>>,

    /// The error name/type identifier
    #[serde(skip)]
    pub name: Cow<'a, str>,
    /// Default caller-facing message
    #[serde(skip)]
    pub message: Cow<'a, str>,
    /// Internal context for debugging, not exposed to the client
    #[serde(skip)]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    pub const BAD_REQUEST: Self =
        Self::new("bad_request", "invalid request", StatusCode::BAD_REQUEST);
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "internal server error",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const MALFORMED_AUTH_TOKEN: Self = Self::new(
        "malformed_auth_token",
        "invalid or expired token",
        StatusCode::UNAUTHORIZED,
    );
    pub const MISSING_AUTH_TOKEN: Self = Self::new(
        "missing_auth_token",
        "authentication required",
        StatusCode::UNAUTHORIZED,
    );
    pub const NOT_FOUND: Self = Self::new("not_found", "resource not found", StatusCode::NOT_FOUND);

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            errors: Vec::new(),
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            context: None,
            status,
        }
    }

    /// Replaces the default message with explicit errors.
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = Cow<'a, str>>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Attaches context to the error response.
    /// If context already exists, it merges them with a separator.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    fn into_response(mut self) -> Response {
        if self.errors.is_empty() {
            self.errors.push(self.message.clone());
        }

        if self.status.is_server_error() {
            tracing::error!(
                target: TRACING_TARGET,
                status = %self.status,
                name = %self.name,
                context = ?self.context,
                "HTTP error response",
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET,
                status = %self.status,
                name = %self.name,
                context = ?self.context,
                "HTTP error response",
            );
        }

        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_message_fills_empty_envelope() {
        let response = ErrorResponse::NOT_FOUND;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.errors.is_empty());
        assert_eq!(response.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn only_errors_are_serialized() {
        let response = ErrorResponse::BAD_REQUEST
            .with_errors([Cow::Borrowed("first"), Cow::Borrowed("second")])
            .with_context("internal detail");

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "errors": ["first", "second"] }));
    }
}

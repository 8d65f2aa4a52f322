//! JSON extractor with envelope-shaped rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json as AxumJson, Request};
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::handler::{Error, ErrorKind};

/// Tracing target for JSON extraction.
const TRACING_TARGET: &str = "portico_server::extract::json";

/// Drop-in replacement for [`axum::Json`] whose rejection is an [`Error`].
///
/// [`axum::Json`]: AxumJson
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extractor = <AxumJson<T> as FromRequest<S>>::from_request(req, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            rejection = %rejection.body_text(),
            "JSON body rejected",
        );

        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!(
                "request body does not match the expected shape: {}",
                sanitize_error_message(&err.body_text())
            ),
            JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON".to_owned(),
            JsonRejection::MissingJsonContentType(_) => {
                "expected request with `Content-Type: application/json`".to_owned()
            }
            JsonRejection::BytesRejection(_) => "failed to read request body".to_owned(),
            _ => "invalid JSON request body".to_owned(),
        };

        ErrorKind::BadRequest
            .with_message(message)
            .with_context("json body")
    }
}

/// Strips the axum prefix and any Rust type paths from serde messages.
fn sanitize_error_message(message: &str) -> String {
    let message = message
        .strip_prefix("Failed to deserialize the JSON body into the target type: ")
        .unwrap_or(message);

    message
        .split_whitespace()
        .filter(|word| !word.contains("::"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_prefix_and_paths() {
        let message = "Failed to deserialize the JSON body into the target type: \
                       email: invalid type: integer `1`, expected a string at line 1 column 10";
        let sanitized = sanitize_error_message(message);
        assert!(sanitized.starts_with("email: invalid type"));

        let sanitized = sanitize_error_message("expected portico_core::validation::LoginRequest");
        assert_eq!(sanitized, "expected");
    }
}

//! HTTP error handling with a builder for dynamic error responses.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portico_core::flow::AuthError;

use crate::handler::response::ErrorResponse;

/// The error type for HTTP handlers.
///
/// Carries one or more caller-facing messages and an optional internal
/// context that is logged but never sent.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    context: Option<Cow<'a, str>>,
    messages: Vec<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            messages: Vec::new(),
        }
    }
}

impl<'a> Error<'a> {
    /// Attaches internal context to the error.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Adds a caller-facing message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Adds several caller-facing messages.
    pub fn with_messages<I, M>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Cow<'a, str>>,
    {
        self.messages.extend(messages.into_iter().map(Into::into));
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    #[inline]
    pub fn messages(&self) -> &[Cow<'a, str>] {
        &self.messages
    }

    /// Converts this error into a static version by cloning borrowed data.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
            messages: self
                .messages
                .into_iter()
                .map(|m| Cow::Owned(m.into_owned()))
                .collect(),
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();

        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("status", &response.status)
            .field("messages", &self.messages);

        if let Some(ref context) = self.context {
            debug_struct.field("context", context);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();
        write!(f, "{} ({})", response.name, response.status)?;

        if !self.messages.is_empty() {
            write!(f, ": {}", self.messages.join("; "))?;
        }

        if let Some(ref context) = self.context {
            write!(f, " - {}", context)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let mut response = self.kind.response();

        if !self.messages.is_empty() {
            response = response.with_errors(self.messages);
        }

        if let Some(context) = self.context {
            response = response.with_context(context);
        }

        response.into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<AuthError> for Error<'static> {
    fn from(error: AuthError) -> Self {
        let context = error.kind().as_str();
        ErrorKind::BadRequest
            .with_context(context)
            .with_messages(error.into_errors())
    }
}

/// A specialized [`Result`] type for HTTP handlers.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// HTTP error kinds, each tied to a status code and a default message.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400 Bad Request
    BadRequest,
    /// 401 Unauthorized, no bearer token
    MissingAuthToken,
    /// 401 Unauthorized, bearer token failed verification
    MalformedAuthToken,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the default response of this error kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::MissingAuthToken => ErrorResponse::MISSING_AUTH_TOKEN,
            Self::MalformedAuthToken => ErrorResponse::MALFORMED_AUTH_TOKEN,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.response().name.as_ref())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use portico_core::flow::AuthErrorKind;

    use super::*;

    #[test]
    fn default_http_error() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_builder_chaining() {
        let error = ErrorKind::BadRequest
            .with_message("first")
            .with_message("second")
            .with_context("request body");

        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.messages(), ["first", "second"]);
        assert_eq!(error.context(), Some("request body"));
    }

    #[test]
    fn std_fmt_display() {
        let error = ErrorKind::NotFound
            .with_message("no such route")
            .with_context("GET /nope");

        let display = error.to_string();
        assert!(display.contains("not_found"));
        assert!(display.contains("404"));
        assert!(display.contains("no such route"));
        assert!(display.contains("GET /nope"));
    }

    #[test]
    fn auth_errors_are_bad_requests() {
        let error = Error::from(portico_core::flow::AuthError::locked_out());
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.context(), Some(AuthErrorKind::LockedOut.as_str()));
        assert_eq!(error.kind().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_kinds_map_to_401() {
        assert_eq!(ErrorKind::MissingAuthToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::MalformedAuthToken.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn error_into_static() {
        let message = String::from("owned message");
        let error = ErrorKind::BadRequest.with_message(message.as_str());
        let error = error.into_static();
        drop(message);
        assert_eq!(error.messages(), ["owned message"]);
    }
}

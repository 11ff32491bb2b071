//! Unified error type.
//!
//! Every failure a handler can produce, and every failure the dispatcher
//! produces on its own, is one variant of [`Error`]. Each variant carries its
//! HTTP status and whether it is *quiet*, i.e. never written to the error log.

use thiserror::Error;

/// A boxed error from application code that has no dedicated variant.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by bitty's fallible operations and by handlers.
///
/// Handlers return `Err(Error::…)` to short-circuit into the error pipeline:
///
/// ```rust
/// use bitty::{Error, Request};
///
/// async fn admin(req: Request) -> Result<&'static str, Error> {
///     if req.header("x-admin").is_none() {
///         return Err(Error::forbidden("admins only"));
///     }
///     Ok("welcome")
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// 404. Also produced when no route matches.
    #[error("not found: {0}")]
    NotFound(String),

    /// 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 500, raised on purpose by application code.
    #[error("application error: {0}")]
    App(String),

    /// 302 to the carried URL.
    #[error("redirect to {0}")]
    Redirect(String),

    /// 400. The inbound request could not be turned into a [`Request`](crate::Request).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Registration-time failure: unsupported method or an invalid pattern.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The body's declared content type cannot be parsed into form params.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// A cookie name or value that would corrupt the `Set-Cookie` header.
    #[error("invalid cookie: {0}")]
    InvalidCookie(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure raised by application code.
    #[error("{0}")]
    Fault(#[from] BoxError),

    /// A handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl Error {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn app(msg: impl Into<String>) -> Self {
        Self::App(msg.into())
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect(url.into())
    }

    /// Wraps any error as an unexpected fault, for use with `map_err`.
    pub fn fault(e: impl Into<BoxError>) -> Self {
        Self::Fault(e.into())
    }

    /// The HTTP status this error resolves to.
    ///
    /// Only the application errors declare their own status; everything
    /// else is an unexpected fault and resolves to 500.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Forbidden(_) => 403,
            Self::Redirect(_) => 302,
            Self::BadRequest(_) => 400,
            Self::App(_)
            | Self::Configuration(_)
            | Self::UnsupportedMediaType(_)
            | Self::InvalidCookie(_)
            | Self::Io(_)
            | Self::Fault(_)
            | Self::Panic(_) => 500,
        }
    }

    /// Quiet errors are expected control flow and skip the error log.
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Redirect(_))
    }

    /// The redirect target, if this is a redirect.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect(url) => Some(url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_errors_declare_their_status() {
        assert_eq!(Error::not_found("x").status(), 404);
        assert_eq!(Error::forbidden("x").status(), 403);
        assert_eq!(Error::app("x").status(), 500);
        assert_eq!(Error::redirect("/x").status(), 302);
    }

    #[test]
    fn unexpected_faults_are_500() {
        let io = Error::from(std::io::Error::other("disk"));
        assert_eq!(io.status(), 500);
        assert_eq!(Error::fault("boom").status(), 500);
        assert_eq!(Error::UnsupportedMediaType("text/csv".into()).status(), 500);
    }

    #[test]
    fn only_not_found_and_redirect_are_quiet() {
        assert!(Error::not_found("x").is_quiet());
        assert!(Error::redirect("/").is_quiet());
        assert!(!Error::forbidden("x").is_quiet());
        assert!(!Error::Panic("x".into()).is_quiet());
    }

    #[test]
    fn redirect_exposes_location() {
        assert_eq!(Error::redirect("/target").location(), Some("/target"));
        assert_eq!(Error::app("x").location(), None);
    }
}

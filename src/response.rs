//! Outgoing HTTP response type and the conversion traits handlers use.
//!
//! A handler either builds a [`Response`] itself or returns something
//! [`IntoResponse`] (a `String`, a `&'static str`, bytes, a [`Status`]) and
//! lets the dispatcher wrap it with the defaults: `200 OK`, `text/html`.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use tracing::warn;

use crate::cookie::Cookie;
use crate::error::Error;
use crate::signed::Signer;
use crate::status::{self, IntoStatus, Status};

pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Lifetime of cookies set by [`Response::set_trusted_cookie`] when callers
/// have no opinion.
pub const DEFAULT_TRUSTED_COOKIE_EXPIRES_DAYS: i64 = 30;

/// An outgoing HTTP response.
///
/// ```rust
/// use bitty::{Cookie, Response, Status};
///
/// let mut res = Response::new(r#"{"foo":"bar"}"#)
///     .with_status(Status::Created)
///     .with_content_type("application/json")
///     .with_header("X-Powered-By", "bitty");
/// res.add_header("Vary", "Accept");
/// res.set_cookie(Cookie::new("foo", "bar"))?;
///
/// let wire = res.serialize();
/// assert_eq!(wire.status_line, "201 Created");
/// # Ok::<(), bitty::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    status: u16,
    content_type: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie>,
    body: Bytes,
}

/// A response flattened to what goes on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Serialized {
    /// e.g. `"404 Not Found"`.
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    /// `200 OK`, `text/html; charset=utf-8`.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok.code(),
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: body.into(),
        }
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(body.into()).with_content_type("text/plain; charset=utf-8")
    }

    /// `200 OK`, `application/json`. Pass bytes from your serialiser.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::new(body).with_content_type("application/json")
    }

    /// Response with no body.
    pub fn empty(status: impl IntoStatus) -> Self {
        Self::new(Bytes::new()).with_status(status)
    }

    pub fn with_status(mut self, status: impl IntoStatus) -> Self {
        self.status = status.into_status();
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        content_type.clone_into(&mut self.content_type);
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.add_header(key, value);
        self
    }

    pub fn with_headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (k, v) in headers {
            self.add_header(k, v);
        }
        self
    }

    /// Appends a header; earlier values with the same name are kept.
    ///
    /// `Content-Type` is the exception: it replaces the response's single
    /// content type.
    pub fn add_header(&mut self, key: &str, value: &str) -> &mut Self {
        if key.eq_ignore_ascii_case("content-type") {
            value.clone_into(&mut self.content_type);
        } else {
            self.headers.push((key.to_owned(), value.to_owned()));
        }
        self
    }

    /// Stores a `Set-Cookie` directive.
    ///
    /// Fails with [`Error::InvalidCookie`] if the name, value or an attribute
    /// contains control characters; the cookie is then not stored.
    pub fn set_cookie(&mut self, cookie: Cookie) -> Result<&mut Self, Error> {
        cookie.validate()?;
        self.cookies.push(cookie);
        Ok(self)
    }

    /// Signs `value` with `signer` and stores it as a cookie expiring in
    /// `expires_days` days. Read it back with
    /// [`Request::trusted_cookie`](crate::Request::trusted_cookie).
    pub fn set_trusted_cookie(
        &mut self,
        signer: &Signer,
        name: &str,
        value: &str,
        expires_days: i64,
    ) -> Result<&mut Self, Error> {
        let token = signer.sign(name, value.as_bytes());
        self.set_cookie(Cookie::new(name, token).expires_days(expires_days))
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn content_type(&self) -> &str { &self.content_type }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn cookies(&self) -> &[Cookie] { &self.cookies }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive lookup among the accumulated headers.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status line, then `Content-Type`, the accumulated headers in order,
    /// and one `Set-Cookie` per cookie.
    pub fn serialize(self) -> Serialized {
        let reason = status::reason(self.status);
        let status_line = if reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {reason}", self.status)
        };

        let mut headers = Vec::with_capacity(1 + self.headers.len() + self.cookies.len());
        headers.push(("Content-Type".to_owned(), self.content_type));
        headers.extend(self.headers);
        headers.extend(self.cookies.iter().map(|c| ("Set-Cookie".to_owned(), c.to_string())));

        Serialized { status_line, headers, body: self.body }
    }

    /// Converts into the `http` crate's response for hyper.
    ///
    /// Headers that are not valid on the wire are dropped with a warning; an
    /// out-of-range status becomes 500.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.status).unwrap_or_else(|_| {
            warn!(status = self.status, "invalid status code, sending 500");
            StatusCode::INTERNAL_SERVER_ERROR
        });
        let wire = self.serialize();

        let mut res = http::Response::new(Full::new(wire.body));
        *res.status_mut() = status;
        let headers = res.headers_mut();
        for (name, value) in &wire.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "dropping header that is invalid on the wire"),
            }
        }
        res
    }
}

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::new(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::new(self) }
}

impl IntoResponse for Vec<u8> {
    fn into_response(self) -> Response { Response::new(self) }
}

impl IntoResponse for Bytes {
    fn into_response(self) -> Response { Response::new(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NoContent`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::empty(self) }
}

impl IntoResponse for () {
    fn into_response(self) -> Response { Response::new(Bytes::new()) }
}

/// What a handler may return: anything [`IntoResponse`], or a `Result` whose
/// error routes the request into the error pipeline.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Response, Error>;
}

impl<T: IntoResponse> IntoOutcome for T {
    fn into_outcome(self) -> Result<Response, Error> {
        Ok(self.into_response())
    }
}

impl<T: IntoResponse, E: Into<Error>> IntoOutcome for Result<T, E> {
    fn into_outcome(self) -> Result<Response, Error> {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

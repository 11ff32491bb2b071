//! Incoming HTTP request type.
//!
//! A [`Request`] is built once per inbound call from the transport's
//! `http::Request`. Path, query, headers and cookies are parsed up front. The
//! body stream is read lazily on first access to [`Request::body`] or
//! [`Request::form`] and never again: both results are cached.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::HeaderMap;
use http_body::Body;
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use mime::Mime;
use tokio::sync::OnceCell;

use crate::cookie::parse_cookie_header;
use crate::error::{BoxError, Error};
use crate::method::Method;
use crate::multipart::{self, FormField};
use crate::params::Params;
use crate::router::normalize_path;
use crate::signed::Signer;

/// Max age used by [`Request::trusted_cookie`] when callers have no opinion.
pub const DEFAULT_TRUSTED_COOKIE_MAX_AGE_DAYS: u32 = 31;

type BodyStream = UnsyncBoxBody<Bytes, BoxError>;

/// An incoming HTTP request.
///
/// Cloning is cheap: clones share the parsed fields and the cached body.
#[derive(Clone)]
pub struct Request {
    inner: Arc<Inner>,
    params: HashMap<String, String>,
}

struct Inner {
    method: String,
    path: String,
    query_string: String,
    query: Params,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    /// `None` when no `content-length` was sent.
    declared_length: Option<u64>,
    remote_addr: Option<SocketAddr>,
    signer: Arc<Signer>,
    stream: Mutex<Option<BodyStream>>,
    body: OnceCell<Bytes>,
    form: OnceCell<Params<FormField>>,
}

impl Request {
    /// Builds the request model from the transport's request.
    ///
    /// Fails with [`Error::BadRequest`] when the path does not percent-decode
    /// to UTF-8 or the query string is malformed.
    pub fn from_http<B>(req: http::Request<B>, signer: Arc<Signer>) -> Result<Self, Error>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();

        let path = urlencoding::decode(parts.uri.path())
            .map_err(|e| Error::BadRequest(format!("path is not valid UTF-8: {e}")))?;
        let path = normalize_path(&path);

        let query_string = parts.uri.query().unwrap_or_default().to_owned();
        let query = Params::parse_urlencoded(&query_string)?;

        // A malformed length counts as zero.
        let declared_length = parts.headers.get(http::header::CONTENT_LENGTH).map(|v| {
            v.to_str().ok().and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
        });

        let cookies = parse_cookie_header(&parts.headers);
        let stream = body.map_err(Into::<BoxError>::into).boxed_unsync();

        Ok(Self {
            inner: Arc::new(Inner {
                method: parts.method.as_str().to_ascii_uppercase(),
                path,
                query_string,
                query,
                cookies,
                declared_length,
                remote_addr: parts.extensions.get::<SocketAddr>().copied(),
                headers: parts.headers,
                signer,
                stream: Mutex::new(Some(stream)),
                body: OnceCell::new(),
                form: OnceCell::new(),
            }),
            params: HashMap::new(),
        })
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Uppercase method name, e.g. `"GET"`.
    pub fn method(&self) -> &str { &self.inner.method }

    /// Percent-decoded path, always ending in exactly one `/`.
    pub fn path(&self) -> &str { &self.inner.path }

    /// The raw, undecoded query string (without the `?`).
    pub fn query_string(&self) -> &str { &self.inner.query_string }

    pub fn query(&self) -> &Params { &self.inner.query }
    pub fn headers(&self) -> &HeaderMap { &self.inner.headers }
    pub fn cookies(&self) -> &HashMap<String, String> { &self.inner.cookies }

    /// Declared body length; 0 when absent or malformed.
    pub fn content_length(&self) -> u64 {
        self.inner.declared_length.unwrap_or(0)
    }

    /// Peer address, when the transport recorded one.
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.inner.remote_addr }

    /// The signer trusted cookies are verified and set with.
    pub fn signer(&self) -> &Signer { &self.inner.signer }

    /// Case-insensitive header lookup. Returns the first value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name)?.to_str().ok()
    }

    /// Every value of a repeated header, in arrival order.
    pub fn header_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner.headers.get_all(name).iter().filter_map(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// `true` for requests sent with `X-Requested-With: XMLHttpRequest`.
    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with")
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
    }

    /// Returns a named capture from the matched route pattern.
    ///
    /// For a route `/users/(?P<id>\d+)`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.inner.cookies.get(name).map(String::as_str)
    }

    /// Reads and verifies a cookie set with
    /// [`Response::set_trusted_cookie`](crate::Response::set_trusted_cookie).
    ///
    /// `None` when the cookie is absent, malformed, mis-signed, older than
    /// `max_age_days`, or not valid UTF-8.
    pub fn trusted_cookie(&self, name: &str, max_age_days: u32) -> Option<String> {
        let token = self.cookie(name)?;
        let payload = self.inner.signer.verify(name, token, max_age_days)?;
        String::from_utf8(payload).ok()
    }

    /// The request body, read from the transport on first call and cached.
    ///
    /// With a `content-length` header the body is cut to that length; a
    /// malformed length reads as an empty body.
    pub async fn body(&self) -> Result<&Bytes, Error> {
        self.inner.body.get_or_try_init(|| self.read_body()).await
    }

    /// Form params of a `POST` or `PUT` body, parsed once on first call.
    ///
    /// Bodies without a content type are treated as urlencoded. Other
    /// methods always yield an empty form.
    pub async fn form(&self) -> Result<&Params<FormField>, Error> {
        self.inner.form.get_or_try_init(|| self.parse_form()).await
    }

    async fn read_body(&self) -> Result<Bytes, Error> {
        if self.inner.declared_length == Some(0) {
            return Ok(Bytes::new());
        }

        let stream = match self.inner.stream.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        // Empty only after an earlier read failed or was cancelled midway.
        let Some(stream) = stream else {
            return Err(Error::fault("request body was lost by an earlier failed read"));
        };

        let mut bytes = stream.collect().await.map_err(Error::Fault)?.to_bytes();
        if let Some(limit) = self.inner.declared_length {
            bytes.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(bytes)
    }

    async fn parse_form(&self) -> Result<Params<FormField>, Error> {
        let has_form = self.method().parse::<Method>().is_ok_and(Method::has_form_body);
        if !has_form {
            return Ok(Params::new());
        }

        let body = self.body().await?;
        let Some(content_type) = self.content_type() else {
            return urlencoded_form(body);
        };

        let unsupported = || Error::UnsupportedMediaType(content_type.to_owned());
        let mime: Mime = content_type.parse().map_err(|_| unsupported())?;

        if mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED {
            urlencoded_form(body)
        } else if mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA {
            let boundary = mime.get_param(mime::BOUNDARY).ok_or_else(unsupported)?;
            Ok(multipart::parse(body, boundary.as_str())?.into_iter().collect())
        } else {
            Err(unsupported())
        }
    }
}

fn urlencoded_form(body: &Bytes) -> Result<Params<FormField>, Error> {
    let text = String::from_utf8_lossy(body);
    let params = Params::parse_urlencoded(&text)?;
    Ok(params
        .iter()
        .flat_map(|(k, v)| v.as_slice().iter().map(move |s| (k.to_owned(), FormField::Text(s.clone()))))
        .collect())
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.inner.method)
            .field("path", &self.inner.path)
            .field("query", &self.inner.query_string)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

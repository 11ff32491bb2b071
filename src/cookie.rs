//! Cookies: `Set-Cookie` directives going out, the `Cookie` header coming in.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use http::HeaderMap;

use crate::error::Error;

const MAX_EXPIRY_DAYS: i64 = 3_650_000;

/// A `Set-Cookie` directive, built fluently and stored with
/// [`Response::set_cookie`](crate::Response::set_cookie).
///
/// ```rust
/// use bitty::{Cookie, Response};
///
/// let mut res = Response::new("Check your cookies.");
/// res.set_cookie(Cookie::new("session", "abc").expires_days(7).attr("HttpOnly", None))?;
/// # Ok::<(), bitty::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Cookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: String,
    expires: Option<DateTime<Utc>>,
    max_age: Option<i64>,
    attrs: Vec<(String, Option<String>)>,
}

impl Cookie {
    /// A cookie scoped to path `/` with no expiry (a session cookie).
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: "/".to_owned(),
            expires: None,
            max_age: None,
            attrs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn value(&self) -> &str { &self.value }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    /// Expires `days` days from now.
    pub fn expires_days(self, days: i64) -> Self {
        let days = days.clamp(-MAX_EXPIRY_DAYS, MAX_EXPIRY_DAYS);
        self.expires(Utc::now() + TimeDelta::days(days))
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Appends an extra attribute: `attr("SameSite", Some("Lax"))` or the
    /// flag form `attr("Secure", None)`.
    pub fn attr(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.attrs.push((name.into(), value.map(str::to_owned)));
        self
    }

    /// Rejects anything that would break out of the `Set-Cookie` line.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty()
            || self.name.chars().any(|c| c.is_control() || c.is_whitespace() || "=;,".contains(c))
        {
            return Err(Error::InvalidCookie(format!("illegal cookie name {:?}", self.name)));
        }
        if self.value.chars().any(|c| c.is_control() || c == ';') {
            return Err(Error::InvalidCookie(format!(
                "illegal value for cookie `{}`: {:?}",
                self.name, self.value
            )));
        }

        let attr_values = self.domain.iter()
            .chain(std::iter::once(&self.path))
            .chain(self.attrs.iter().map(|(k, _)| k))
            .chain(self.attrs.iter().filter_map(|(_, v)| v.as_ref()));
        for text in attr_values {
            if text.chars().any(|c| c.is_control() || c == ';') {
                return Err(Error::InvalidCookie(format!(
                    "illegal attribute for cookie `{}`: {text:?}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Renders the `Set-Cookie` header value.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        write!(f, "; Path={}", self.path)?;
        if let Some(at) = &self.expires {
            write!(f, "; Expires={}", at.format("%a, %d %b %Y %H:%M:%S GMT"))?;
        }
        if let Some(secs) = self.max_age {
            write!(f, "; Max-Age={secs}")?;
        }
        for (name, value) in &self.attrs {
            match value {
                Some(v) => write!(f, "; {name}={v}")?,
                None => write!(f, "; {name}")?,
            }
        }
        Ok(())
    }
}

/// Parses every `Cookie` header into name → value. The first occurrence of a
/// name wins; surrounding double quotes are stripped from values.
pub(crate) fn parse_cookie_header(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for header in headers.get_all(http::header::COOKIE) {
        let Ok(header) = header.to_str() else { continue };
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else { continue };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            cookies.entry(name.to_owned()).or_insert_with(|| value.to_owned());
        }
    }

    cookies
}

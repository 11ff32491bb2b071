//! HTTP method as a typed enum.
//!
//! Only the four methods that carry a route table exist. Any other method
//! string is rejected at registration time with [`Error::Configuration`] and
//! resolves to `404 Not Found` at request time.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A routable HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get    => "GET",
            Self::Post   => "POST",
            Self::Put    => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Methods whose body is parsed into form params.
    pub fn has_form_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

/// Parses a method name. Lowercase input is accepted and uppercased.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET"    => Ok(Self::Get),
            "POST"   => Ok(Self::Post),
            "PUT"    => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _        => Err(Error::Configuration(format!("unsupported HTTP method `{s}`"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

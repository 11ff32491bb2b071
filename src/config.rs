//! Runtime configuration: where to listen and how to sign cookies.

use std::fmt;

use crate::error::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration knobs read by the [`Dispatcher`](crate::Dispatcher) and the
/// [`Server`](crate::Server).
///
/// Without a `cookie_secret` the dispatcher generates a random one at startup
/// and keeps it for the life of the process; trusted cookies then do not
/// survive a restart.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cookie_secret: Option<String>,
}

impl Config {
    /// Reads `BITTY_HOST`, `BITTY_PORT` and `BITTY_COOKIE_SECRET`, falling
    /// back to the defaults for unset variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(host) = lookup("BITTY_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("BITTY_PORT") {
            config.port = port
                .parse()
                .map_err(|e| Error::Configuration(format!("BITTY_PORT `{port}`: {e}")))?;
        }
        config.cookie_secret = lookup("BITTY_COOKIE_SECRET").filter(|s| !s.is_empty());
        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_cookie_secret(mut self, secret: impl Into<String>) -> Self {
        self.cookie_secret = Some(secret.into());
        self
    }

    /// `host:port`, suitable for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.to_owned(), port: DEFAULT_PORT, cookie_secret: None }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cookie_secret", &self.cookie_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr(), "localhost:8080");
        assert_eq!(config.cookie_secret, None);
    }

    #[test]
    fn reads_every_knob() {
        let config = Config::from_lookup(lookup(&[
            ("BITTY_HOST", "0.0.0.0"),
            ("BITTY_PORT", "3000"),
            ("BITTY_COOKIE_SECRET", "MySeCrEtCoOkIe"),
        ]))
        .unwrap();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.cookie_secret.as_deref(), Some("MySeCrEtCoOkIe"));
    }

    #[test]
    fn bad_port_is_a_configuration_error() {
        let err = Config::from_lookup(lookup(&[("BITTY_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn debug_redacts_the_secret() {
        let config = Config::default().with_cookie_secret("hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}

//! Ordered request router.
//!
//! One bucket per HTTP method, each an ordered list of regex patterns. Lookup
//! walks the bucket front to back and the first pattern that matches the whole
//! normalized path wins. There is no specificity ranking: register narrow
//! routes before broad ones.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;

/// The application router.
///
/// Build it once at startup and hand it to the
/// [`Dispatcher`](crate::Dispatcher). Patterns are regular expressions with
/// named groups; every named group that matches becomes a
/// [`Request::param`](crate::Request::param).
///
/// ```rust
/// # use bitty::{Error, Request, Router};
/// # async fn index(_: Request) -> &'static str { "Indexed!" }
/// # async fn greet(_: Request) -> &'static str { "Hello!" }
/// let app = Router::new()
///     .get("/", index)?
///     .get(r"/hello/(?P<name>\w+)", greet)?
///     .route("DELETE", "/users/(?P<id>\\d+)", index)?;
/// # Ok::<(), Error>(())
/// ```
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

struct Route {
    pattern: String,
    matcher: Regex,
    handler: BoxedHandler,
}

/// The handler selected for one request, with its captured path params.
pub(crate) struct RouteMatch {
    pub(crate) pattern: String,
    pub(crate) handler: BoxedHandler,
    pub(crate) params: HashMap<String, String>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Method::ALL.into_iter().map(|m| (m, Vec::new())).collect(),
        }
    }

    /// Appends a route to `method`'s bucket. Returns `self` for chaining.
    ///
    /// Fails with [`Error::Configuration`] if `pattern` is not a valid regex.
    pub fn on(mut self, method: Method, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        let matcher = compile(pattern)?;
        self.routes.entry(method).or_default().push(Route {
            pattern: pattern.to_owned(),
            matcher,
            handler: handler.into_boxed_handler(),
        });
        Ok(self)
    }

    /// Like [`on`](Router::on) with the method given by name.
    ///
    /// Fails with [`Error::Configuration`] for methods without a bucket.
    pub fn route(self, method: &str, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.on(method.parse()?, pattern, handler)
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.on(Method::Get, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.on(Method::Post, pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.on(Method::Put, pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.on(Method::Delete, pattern, handler)
    }

    /// Finds the first route in `method`'s bucket matching `path`.
    ///
    /// Fails with [`Error::NotFound`] for unsupported methods and unmatched paths.
    pub(crate) fn lookup(&self, method: &str, path: &str) -> Result<RouteMatch, Error> {
        let bucket = method
            .parse::<Method>()
            .ok()
            .and_then(|m| self.routes.get(&m))
            .ok_or_else(|| {
                Error::not_found(format!("the HTTP request method `{method}` is not supported"))
            })?;

        let path = normalize_path(path);
        bucket
            .iter()
            .find_map(|route| {
                let captures = route.matcher.captures(&path)?;
                let params = route.matcher
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        captures.name(name).map(|m| (name.to_owned(), m.as_str().to_owned()))
                    })
                    .collect();
                Some(RouteMatch {
                    pattern: route.pattern.clone(),
                    handler: Arc::clone(&route.handler),
                    params,
                })
            })
            .ok_or_else(|| Error::not_found(format!("no route for {method} {path}")))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for method in Method::ALL {
            let patterns: Vec<&str> = self.routes[&method].iter().map(|r| r.pattern.as_str()).collect();
            map.entry(&method, &patterns);
        }
        map.finish()
    }
}

/// Forces exactly one trailing `/`: `"/foo"`, `"/foo/"` and `"/foo//"` all
/// become `"/foo/"`, and `""` becomes `"/"`.
pub fn normalize_path(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

/// Anchors `pattern` to the whole normalized path. A caller's own `^` / `$`
/// are dropped first so they are not doubled. The body is grouped so a
/// top-level alternation is anchored on every branch, and the trailing `/` is
/// shared by all of them.
fn compile(pattern: &str) -> Result<Regex, Error> {
    let body = pattern.strip_prefix('^').unwrap_or(pattern);
    let body = body.strip_suffix('$').unwrap_or(body);
    Regex::new(&format!("^(?:{})/$", trim_trailing_slashes(body)))
        .map_err(|e| Error::Configuration(format!("invalid route pattern `{pattern}`: {e}")))
}

/// Strips trailing `/` and `\/` so the slash appended by [`compile`] is the
/// only one.
fn trim_trailing_slashes(mut body: &str) -> &str {
    loop {
        if let Some(rest) = body.strip_suffix(r"\/") {
            body = rest;
        } else if let Some(rest) = body.strip_suffix('/') {
            body = rest;
        } else {
            return body;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    async fn noop(_req: Request) -> &'static str { "" }

    #[test]
    fn normalization_is_idempotent() {
        assert_eq!(normalize_path("/x"), "/x/");
        assert_eq!(normalize_path("/x/"), "/x/");
        assert_eq!(normalize_path(&normalize_path("/x")), "/x/");
        assert_eq!(normalize_path("/x//"), "/x/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn trailing_slash_is_optional() {
        let router = Router::new().get("/hello", noop).unwrap();
        assert!(router.lookup("GET", "/hello").is_ok());
        assert!(router.lookup("GET", "/hello/").is_ok());
        assert!(router.lookup("GET", "/hello/there").is_err());
    }

    #[test]
    fn captures_named_groups() {
        let router = Router::new().get(r"/hello/(?P<name>\w+)/", noop).unwrap();
        let matched = router.lookup("GET", "/hello/world").unwrap();
        assert_eq!(matched.params["name"], "world");
        assert_eq!(matched.params.len(), 1);
    }

    #[test]
    fn unmatched_optional_groups_are_absent() {
        let router = Router::new().get(r"/a(?:/(?P<x>\d+))?", noop).unwrap();
        assert!(router.lookup("GET", "/a").unwrap().params.is_empty());
        assert_eq!(router.lookup("GET", "/a/7").unwrap().params["x"], "7");
    }

    #[test]
    fn first_registered_match_wins() {
        let router = Router::new()
            .get("/a/(?P<x>.+)", noop).unwrap()
            .get("/a/fixed", noop).unwrap();
        let matched = router.lookup("GET", "/a/fixed").unwrap();
        assert_eq!(matched.pattern, "/a/(?P<x>.+)");
        assert_eq!(matched.params["x"], "fixed");
    }

    #[test]
    fn narrow_before_broad_is_not_shadowed() {
        let router = Router::new()
            .get("/a/fixed", noop).unwrap()
            .get("/a/(?P<x>.+)", noop).unwrap();
        assert_eq!(router.lookup("GET", "/a/fixed").unwrap().pattern, "/a/fixed");
        assert_eq!(router.lookup("GET", "/a/other").unwrap().params["x"], "other");
    }

    #[test]
    fn patterns_are_anchored() {
        let router = Router::new().get("/b", noop).unwrap();
        assert!(router.lookup("GET", "/ab").is_err());
        assert!(router.lookup("GET", "/b/c").is_err());

        let router = Router::new().get("^/c$", noop).unwrap();
        assert!(router.lookup("GET", "/c").is_ok());
    }

    #[test]
    fn alternation_is_anchored_on_every_branch() {
        let router = Router::new().get("/a|/b", noop).unwrap();
        assert!(router.lookup("GET", "/a").is_ok());
        assert!(router.lookup("GET", "/b/").is_ok());
        assert!(router.lookup("GET", "/abc/def").is_err());
        assert!(router.lookup("GET", "/ab").is_err());
        assert!(router.lookup("GET", "/x/b").is_err());
    }

    #[test]
    fn escaped_trailing_slash_is_normalized() {
        let router = Router::new().get(r"/x\/", noop).unwrap();
        assert!(router.lookup("GET", "/x").is_ok());
        assert!(router.lookup("GET", "/x/").is_ok());
    }

    #[test]
    fn methods_have_separate_buckets() {
        let router = Router::new()
            .post("/thing", noop).unwrap()
            .route("put", "/thing", noop).unwrap();
        assert!(router.lookup("POST", "/thing").is_ok());
        assert!(router.lookup("PUT", "/thing").is_ok());
        assert!(matches!(router.lookup("GET", "/thing"), Err(Error::NotFound(_))));
        assert!(matches!(router.lookup("PATCH", "/thing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn registration_errors_are_configuration_errors() {
        assert!(matches!(Router::new().route("PATCH", "/", noop), Err(Error::Configuration(_))));
        assert!(matches!(Router::new().get("/(unclosed", noop), Err(Error::Configuration(_))));
    }
}

//! Request dispatch and the error pipeline.
//!
//! ```text
//! Received ──build──▶ RequestBuilt ──lookup──▶ RouteMatched ──handler──▶ HandlerRun ──▶ ResponseReady
//!     │                    │                        │
//!     └────────────────────┴────────────────────────┴──▶ error: status → error handler → Response
//! ```
//!
//! Every failure, whether an [`Error`] returned by a handler, a missing route,
//! or a panic, is resolved here into a response. Nothing escapes to the
//! transport.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use http_body::Body;
use http_body_util::Full;
use rand::RngCore;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{BoxError, Error};
use crate::handler::{BoxedErrorHandler, ErrorHandler};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::signed::Signer;
use crate::status::{self, IntoStatus, Status};

/// The last state a request reached before it failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stage {
    Received,
    RequestBuilt,
    RouteMatched,
}

/// Turns inbound requests into responses.
///
/// Built once at startup from a [`Router`] and a [`Config`]; shared
/// read-only across every request afterwards.
///
/// ```rust
/// use bitty::{Config, Dispatcher, Error, Request, Response, Router};
///
/// fn not_found(_req: Option<&Request>, _err: &Error) -> Response {
///     Response::text("nothing to see here")
/// }
///
/// # async fn hello(_: Request) -> &'static str { "hi" }
/// let app = Dispatcher::new(Router::new().get("/", hello)?, &Config::default())
///     .on_error(404, not_found);
/// # Ok::<(), Error>(())
/// ```
pub struct Dispatcher {
    router: Router,
    error_handlers: HashMap<u16, BoxedErrorHandler>,
    signer: Arc<Signer>,
}

impl Dispatcher {
    /// A dispatcher whose cookie secret comes from `config`, or is generated
    /// from the thread-local RNG when the config has none.
    pub fn new(router: Router, config: &Config) -> Self {
        Self::with_rng(router, config, &mut rand::thread_rng())
    }

    /// Like [`new`](Dispatcher::new) with the secret-generating RNG supplied.
    pub fn with_rng(router: Router, config: &Config, rng: &mut impl RngCore) -> Self {
        let signer = match &config.cookie_secret {
            Some(secret) => Signer::new(secret.as_bytes()),
            None => {
                info!("no cookie secret configured, generated one for this process");
                Signer::generate(rng)
            }
        };
        Self { router, error_handlers: HashMap::new(), signer: Arc::new(signer) }
    }

    /// Registers the handler for errors resolving to `status`, replacing the
    /// built-in one.
    ///
    /// A plain value returned by the handler is sent with `status`; a
    /// [`Response`] with a status other than 200 keeps its own. If the handler
    /// fails or panics the built-in 500 response is sent instead.
    pub fn on_error(mut self, status: impl IntoStatus, handler: impl ErrorHandler) -> Self {
        self.error_handlers.insert(status.into_status(), handler.into_boxed_error_handler());
        self
    }

    pub fn router(&self) -> &Router { &self.router }
    pub fn signer(&self) -> &Signer { &self.signer }

    /// Produces the wire-ready response for `req`. Never fails.
    pub async fn dispatch<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        self.handle(req).await.into_http()
    }

    /// Like [`dispatch`](Dispatcher::dispatch), returning the response model.
    pub async fn handle<B>(&self, req: http::Request<B>) -> Response
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let request = match Request::from_http(req, Arc::clone(&self.signer)) {
            Ok(request) => request,
            Err(e) => return self.resolve_error(None, e, Stage::Received),
        };

        let matched = match self.router.lookup(request.method(), request.path()) {
            Ok(matched) => matched,
            Err(e) => return self.resolve_error(Some(&request), e, Stage::RequestBuilt),
        };
        let request = request.with_params(matched.params);

        let handler = matched.handler;
        let call = {
            let request = request.clone();
            async move { handler.call(request).await }
        };

        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(response)) => {
                debug!(
                    method = request.method(),
                    path = request.path(),
                    route = %matched.pattern,
                    status = response.status(),
                    "request handled",
                );
                response
            }
            Ok(Err(e)) => self.resolve_error(Some(&request), e, Stage::RouteMatched),
            Err(panic) => {
                let e = Error::Panic(panic_message(panic.as_ref()));
                self.resolve_error(Some(&request), e, Stage::RouteMatched)
            }
        }
    }

    fn resolve_error(&self, req: Option<&Request>, err: Error, stage: Stage) -> Response {
        let status = err.status();
        let method = req.map(Request::method);
        let path = req.map(Request::path);

        if err.is_quiet() {
            debug!(status, ?stage, method, path, error = %err, "request ended early");
        } else {
            error!(status, ?stage, method, path, error = %err, details = ?err, "request failed");
        }

        let Some(handler) = self.error_handlers.get(&status) else {
            return builtin(status, &err);
        };

        match std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(req, &err))) {
            Ok(Ok(response)) if response.status() == Status::Ok.code() => response.with_status(status),
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(status, error = %e, details = ?e, "error handler failed");
                builtin(Status::InternalServerError.code(), &e)
            }
            Err(panic) => {
                error!(status, panic = %panic_message(panic.as_ref()), "error handler panicked");
                builtin(Status::InternalServerError.code(), &err)
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statuses: Vec<&u16> = self.error_handlers.keys().collect();
        statuses.sort();
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("error_handlers", &statuses)
            .finish_non_exhaustive()
    }
}

/// The minimal response for `status` when no handler is registered for it:
/// the reason phrase as plain text, or for a redirect an empty body and a
/// `Location` header.
fn builtin(status: u16, err: &Error) -> Response {
    if let (302, Some(location)) = (status, err.location()) {
        return Response::empty(status)
            .with_content_type("text/plain; charset=utf-8")
            .with_header("Location", location);
    }

    let reason = match status::reason(status) {
        "" => "Error",
        reason => reason,
    };
    Response::text(reason).with_status(status)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

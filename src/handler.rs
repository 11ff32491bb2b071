//! Handler traits and type erasure.
//!
//! # How handlers are stored
//!
//! The router holds handlers of many concrete types in one `Vec` per method,
//! so each is erased behind a trait object:
//!
//! ```text
//! async fn hello(req: Request) -> Result<String, Error> { … }   ← user writes this
//!        ↓ router.get("/", hello)
//! hello.into_boxed_handler()                                   ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                                   ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time                           ← one vtable dispatch
//!        ↓
//! Box::pin(async { hello(req).await.into_outcome() })          ← Result<Response, Error>
//! ```
//!
//! Error handlers follow the same pattern but are synchronous: they only
//! turn an [`Error`] into a [`Response`] and never touch the body stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoOutcome, Response};

/// A heap-allocated, type-erased handler future.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased route handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

#[doc(hidden)]
pub trait ErasedErrorHandler {
    fn call(&self, req: Option<&Request>, err: &Error) -> Result<Response, Error>;
}

#[doc(hidden)]
pub type BoxedErrorHandler = Arc<dyn ErasedErrorHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any `async fn` (or
/// closure returning a future) of the shape:
///
/// ```text
/// async fn name(req: Request) -> impl IntoOutcome
/// ```
///
/// i.e. returning a [`Response`], anything [`IntoResponse`](crate::IntoResponse),
/// or a `Result` of those with an error convertible into [`Error`].
pub trait Handler: private::SealedHandler + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// Implemented for every valid error handler:
///
/// ```text
/// fn name(req: Option<&Request>, err: &Error) -> impl IntoOutcome
/// ```
///
/// `req` is `None` when the failure happened while building the request.
pub trait ErrorHandler: private::SealedErrorHandler + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_error_handler(self) -> BoxedErrorHandler;
}

mod private {
    pub trait SealedHandler {}
    pub trait SealedErrorHandler {}
}

impl<F, Fut, R> private::SealedHandler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

impl<F, R> private::SealedErrorHandler for F
where
    F: Fn(Option<&Request>, &Error) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
}

impl<F, R> ErrorHandler for F
where
    F: Fn(Option<&Request>, &Error) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_boxed_error_handler(self) -> BoxedErrorHandler {
        Arc::new(FnErrorHandler(self))
    }
}

/// Bridges a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

struct FnErrorHandler<F>(F);

impl<F, R> ErasedErrorHandler for FnErrorHandler<F>
where
    F: Fn(Option<&Request>, &Error) -> R + Send + Sync,
    R: IntoOutcome,
{
    fn call(&self, req: Option<&Request>, err: &Error) -> Result<Response, Error> {
        (self.0)(req, err).into_outcome()
    }
}

//! # bitty
//!
//! The itty-bitty HTTP toolkit: regex routes, a request model, a response
//! model, and signed cookies. Nothing more.
//!
//! ## The contract
//!
//! Register handlers on a [`Router`], one ordered list per method. For each
//! inbound request the [`Dispatcher`] picks the first route whose pattern
//! matches the whole path, runs it, and turns whatever it returns into a
//! response. Every failure, whether a returned [`Error`], a missing route, or
//! a panicking handler, goes through one error pipeline that maps it to a
//! status code and to a handler you may override per status.
//!
//! What is left to the transport: sockets, TLS, body-size limits, static
//! files. [`Server`] is a thin hyper adapter; any transport that produces an
//! `http::Request` can call [`Dispatcher::dispatch`] instead.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bitty::{Config, Dispatcher, Error, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let config = Config::from_env()?;
//!     let app = Router::new()
//!         .get(r"/hello/(?P<name>\w+)", greet)?
//!         .post("/login", login)?;
//!
//!     Server::from_config(&config)
//!         .serve(Dispatcher::new(app, &config))
//!         .await
//! }
//!
//! async fn greet(req: Request) -> String {
//!     format!("Hello {}!", req.param("name").unwrap_or("world"))
//! }
//!
//! async fn login(req: Request) -> Result<Response, Error> {
//!     let form = req.form().await?;
//!     let Some(user) = form.get("user").and_then(|f| f.as_text()) else {
//!         return Err(Error::forbidden("who are you?"));
//!     };
//!     let mut res = Response::new("welcome");
//!     res.set_trusted_cookie(req.signer(), "user", user, 30)?;
//!     Ok(res)
//! }
//! ```

mod config;
mod cookie;
mod dispatcher;
mod error;
mod handler;
mod method;
mod multipart;
mod params;
mod request;
mod response;
mod router;
mod server;
mod signed;

pub mod status;

pub use config::Config;
pub use cookie::Cookie;
pub use dispatcher::Dispatcher;
pub use error::{BoxError, Error};
pub use handler::{ErrorHandler, Handler};
pub use method::Method;
pub use multipart::{FormField, UploadedFile};
pub use params::{Params, Value};
pub use request::{DEFAULT_TRUSTED_COOKIE_MAX_AGE_DAYS, Request};
pub use response::{
    DEFAULT_CONTENT_TYPE, DEFAULT_TRUSTED_COOKIE_EXPIRES_DAYS, IntoOutcome, IntoResponse, Response,
    Serialized,
};
pub use router::{Router, normalize_path};
pub use server::Server;
pub use signed::Signer;
pub use status::{IntoStatus, Status};

//! Minimal bitty app: captures, forms, uploads, cookies, errors.
//!
//! Run with:
//!   RUST_LOG=debug BITTY_COOKIE_SECRET=MySeCrEtCoOkIe cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8080/hello/world
//!   curl 'http://localhost:8080/test_get?foo=1&foo=2'
//!   curl -X POST -d foo=bar http://localhost:8080/test_post
//!   curl -F myfile=@Cargo.toml http://localhost:8080/test_upload
//!   curl -c jar http://localhost:8080/send && curl -b jar http://localhost:8080/receive
//!   curl -i http://localhost:8080/test_redirect
//!   curl -i http://localhost:8080/test_500

use bitty::{
    Config, Cookie, Dispatcher, Error, FormField, Request, Response, Router, Server, Status,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let app = Router::new()
        .get("/", index)?
        .get(r"/hello/(?P<name>\w+)", greet)?
        .get("/ct", content_type)?
        .get("/json", json)?
        .get("/test_get", test_get)?
        .post("/test_post", test_post)?
        .put("/test_put", test_post)?
        .post("/test_upload", test_upload)?
        .delete("/test_delete", test_delete)?
        .get("/send", send_cookies)?
        .get("/receive", receive_cookies)?
        .get("/test_403", test_403)?
        .get("/test_404", test_404)?
        .get("/test_500", test_500)?
        .get("/test_redirect", test_redirect)?;

    let dispatcher = Dispatcher::new(app, &config).on_error(500, my_great_500);

    Server::from_config(&config).serve(dispatcher).await
}

async fn index(_req: Request) -> &'static str {
    "Indexed!"
}

async fn greet(req: Request) -> String {
    format!("Hello {}!", req.param("name").unwrap_or(", world"))
}

async fn content_type(_req: Request) -> Response {
    Response::new("Check your Content-Type headers.").with_content_type("text/plain")
}

async fn json(_req: Request) -> Response {
    Response::json(r#"{"foo": "bar", "moof": 123}"#)
}

async fn test_get(req: Request) -> String {
    let foo = req.query().get("foo").map_or("not specified", String::as_str);
    format!("'foo' is: {foo}")
}

async fn test_post(req: Request) -> Result<String, Error> {
    let form = req.form().await?;
    let foo = form.get("foo").and_then(FormField::as_text).unwrap_or("not specified");
    Ok(format!("'foo' is: {foo}"))
}

async fn test_upload(req: Request) -> Result<String, Error> {
    let form = req.form().await?;
    Ok(match form.get("myfile").and_then(FormField::as_file) {
        Some(file) => format!("got {} ({} bytes)", file.filename(), file.data().len()),
        None => "no file uploaded".to_owned(),
    })
}

async fn test_delete(req: Request) -> String {
    format!("Method received was {}.", req.method())
}

async fn send_cookies(req: Request) -> Result<Response, Error> {
    let mut res = Response::new("Check your cookies.");
    res.set_cookie(Cookie::new("session", "asdfjlasdfjsdfkjgsdfogd").attr("HttpOnly", None))?;
    res.set_trusted_cookie(req.signer(), "foo", "bar", 30)?;
    Ok(res)
}

async fn receive_cookies(req: Request) -> Response {
    let trusted = req.trusted_cookie("foo", 31);
    Response::text(format!("cookies: {:?}\ntrusted foo: {trusted:?}", req.cookies()))
}

async fn test_403(_req: Request) -> Result<&'static str, Error> {
    Err(Error::forbidden("No soup for you!"))
}

async fn test_404(_req: Request) -> Result<&'static str, Error> {
    Err(Error::not_found("Not here, sorry."))
}

async fn test_500(_req: Request) -> Result<&'static str, Error> {
    Err(Error::app("Oops."))
}

async fn test_redirect(_req: Request) -> Result<&'static str, Error> {
    Err(Error::redirect("/hello/redirected"))
}

fn my_great_500(_req: Option<&Request>, err: &Error) -> Response {
    let html = format!(
        "<html><head><title>Application Error! OH NOES!</title></head>\
         <body><h1>OH NOES!</h1><p>Yep, you broke it.</p><p>Exception: {err}</p></body></html>"
    );
    Response::new(html).with_status(Status::InternalServerError)
}

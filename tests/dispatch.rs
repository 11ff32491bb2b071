//! End-to-end dispatch: raw `http::Request` in, wire-ready `http::Response` out.

use bitty::{
    Config, Cookie, Dispatcher, Error, FormField, Request, Response, Router, Status, Value,
};
use http::StatusCode;
use http_body_util::BodyExt;

async fn index(_req: Request) -> &'static str {
    "Indexed!"
}

async fn greet(req: Request) -> String {
    format!("Hello {}!", req.param("name").unwrap_or(", world"))
}

async fn content_type(_req: Request) -> Response {
    Response::new("Check your Content-Type headers.").with_content_type("text/plain")
}

async fn query(req: Request) -> String {
    match req.query().value("foo") {
        Some(Value::One(v)) => format!("one:{v}"),
        Some(Value::Many(vs)) => format!("many:{}", vs.join(",")),
        None => "not specified".to_owned(),
    }
}

async fn post_form(req: Request) -> Result<String, Error> {
    let form = req.form().await?;
    let foo = form.get("foo").and_then(FormField::as_text).unwrap_or("not specified");
    Ok(format!("'foo' is: {foo}"))
}

async fn upload(req: Request) -> Result<String, Error> {
    let form = req.form().await?;
    let file = form
        .get("myfile")
        .and_then(FormField::as_file)
        .ok_or_else(|| Error::app("no file"))?;
    Ok(format!("{} ({} bytes)", file.filename(), file.data().len()))
}

async fn method_echo(req: Request) -> String {
    format!("Method received was {}.", req.method())
}

async fn redirect(_req: Request) -> Result<&'static str, Error> {
    Err(Error::redirect("/target"))
}

async fn forbidden(_req: Request) -> Result<&'static str, Error> {
    Err(Error::forbidden("No soup for you!"))
}

async fn send_cookies(req: Request) -> Result<Response, Error> {
    let mut res = Response::new("Check your cookies.");
    res.set_cookie(Cookie::new("plain", "bar"))?;
    res.set_trusted_cookie(req.signer(), "foo", "bar", 30)?;
    Ok(res)
}

async fn receive_cookie(req: Request) -> String {
    format!("{:?}", req.trusted_cookie("foo", 31))
}

async fn bad_cookie(_req: Request) -> Result<Response, Error> {
    let mut res = Response::new("never sent");
    res.set_cookie(Cookie::new("foo", "multi\nline"))?;
    Ok(res)
}

fn app() -> Dispatcher {
    let router = Router::new()
        .get("/", index).unwrap()
        .get(r"/hello/(?P<name>\w+)/", greet).unwrap()
        .get("/ct", content_type).unwrap()
        .get("/test_get", query).unwrap()
        .post("/test_post", post_form).unwrap()
        .put("/test_put", post_form).unwrap()
        .post("/test_upload", upload).unwrap()
        .delete("/test_delete", method_echo).unwrap()
        .get("/test_redirect", redirect).unwrap()
        .get("/test_403", forbidden).unwrap()
        .get("/send", send_cookies).unwrap()
        .get("/receive", receive_cookie).unwrap()
        .get("/bad_cookie", bad_cookie).unwrap();
    Dispatcher::new(router, &Config::default().with_cookie_secret("MySeCrEtCoOkIe"))
}

struct Reply {
    status: StatusCode,
    headers: http::HeaderMap,
    body: String,
}

async fn send(app: &Dispatcher, req: http::Request<String>) -> Reply {
    let res = app.dispatch(req).await;
    let (parts, body) = res.into_parts();
    let body = body.collect().await.unwrap().to_bytes();
    Reply {
        status: parts.status,
        headers: parts.headers,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}

fn get(uri: &str) -> http::Request<String> {
    http::Request::get(uri).body(String::new()).unwrap()
}

fn with_body(method: &str, uri: &str, content_type: &str, body: &str) -> http::Request<String> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", content_type)
        .header("content-length", body.len().to_string())
        .body(body.to_owned())
        .unwrap()
}

#[tokio::test]
async fn index_and_captures() {
    let app = app();

    let reply = send(&app, get("/")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "Indexed!");
    assert_eq!(reply.headers["content-type"], "text/html; charset=utf-8");

    let reply = send(&app, get("/hello/world")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "Hello world!");
}

#[tokio::test]
async fn explicit_response_keeps_its_content_type() {
    let reply = send(&app(), get("/ct")).await;
    assert_eq!(reply.headers["content-type"], "text/plain");
}

#[tokio::test]
async fn query_shapes() {
    let app = app();
    assert_eq!(send(&app, get("/test_get?foo=1")).await.body, "one:1");
    assert_eq!(send(&app, get("/test_get?foo=1&foo=2")).await.body, "many:1,2");
    assert_eq!(send(&app, get("/test_get")).await.body, "not specified");
}

#[tokio::test]
async fn post_and_put_forms() {
    let app = app();
    let form = "application/x-www-form-urlencoded";

    let reply = send(&app, with_body("POST", "/test_post", form, "foo=bar")).await;
    assert_eq!(reply.body, "'foo' is: bar");

    let reply = send(&app, with_body("PUT", "/test_put", form, "foo=baz+qux")).await;
    assert_eq!(reply.body, "'foo' is: baz qux");

    let reply = send(&app, with_body("DELETE", "/test_delete", "text/plain", "")).await;
    assert_eq!(reply.body, "Method received was DELETE.");
}

#[tokio::test]
async fn multipart_upload() {
    let body = "--boundary42\r\n\
        Content-Disposition: form-data; name=\"myfile\"; filename=\"hello.txt\"\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        hello world\r\n\
        --boundary42--\r\n";
    let req = with_body("POST", "/test_upload", "multipart/form-data; boundary=boundary42", body);
    let reply = send(&app(), req).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "hello.txt (11 bytes)");
}

#[tokio::test]
async fn unsupported_form_encoding_is_a_fault() {
    let req = with_body("POST", "/test_post", "application/json", r#"{"foo":"bar"}"#);
    let reply = send(&app(), req).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body, "Internal Server Error");
}

#[tokio::test]
async fn not_found_default_and_custom() {
    let reply = send(&app(), get("/missing")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "Not Found");

    let app = app().on_error(404, |_req: Option<&Request>, _err: &Error| {
        Response::new("<h1>Nothing here</h1>")
    });
    let reply = send(&app, get("/missing")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "<h1>Nothing here</h1>");
}

#[tokio::test]
async fn unsupported_method_is_not_found() {
    let req = http::Request::builder().method("PATCH").uri("/").body(String::new()).unwrap();
    assert_eq!(send(&app(), req).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn redirect_sets_location_with_empty_body() {
    let reply = send(&app(), get("/test_redirect")).await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(reply.headers["location"], "/target");
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn forbidden_uses_custom_handler() {
    let app = app().on_error(Status::Forbidden, |_req: Option<&Request>, err: &Error| {
        format!("denied: {err}")
    });
    let reply = send(&app, get("/test_403")).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body, "denied: forbidden: No soup for you!");
}

#[tokio::test]
async fn trusted_cookie_round_trip() {
    let app = app();

    let reply = send(&app, get("/send")).await;
    let set_cookies: Vec<&str> = reply
        .headers
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(set_cookies.len(), 2);
    assert_eq!(set_cookies[0], "plain=bar; Path=/");

    let trusted = set_cookies[1].split(';').next().unwrap();
    let req = http::Request::get("/receive")
        .header("cookie", trusted)
        .body(String::new())
        .unwrap();
    assert_eq!(send(&app, req).await.body, r#"Some("bar")"#);

    let tampered = format!("{}x", trusted);
    let req = http::Request::get("/receive")
        .header("cookie", tampered)
        .body(String::new())
        .unwrap();
    assert_eq!(send(&app, req).await.body, "None");
}

#[tokio::test]
async fn cookie_with_newline_is_never_sent() {
    let reply = send(&app(), get("/bad_cookie")).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.headers.get("set-cookie").is_none());
    assert_ne!(reply.body, "never sent");
}

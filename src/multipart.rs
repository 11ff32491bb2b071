//! `multipart/form-data` bodies.
//!
//! The whole body is already buffered by the time a form is parsed, so parts
//! are sliced out of the shared [`Bytes`] without copying. Part headers are
//! parsed with `httparse`, the same way a request head would be.

use bytes::Bytes;

use crate::error::Error;

const MAX_PART_HEADERS: usize = 16;

/// A file field of a multipart form.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    /// The client-supplied file name. May be empty when no file was chosen.
    pub fn filename(&self) -> &str { &self.filename }
    pub fn content_type(&self) -> Option<&str> { self.content_type.as_deref() }
    pub fn data(&self) -> &Bytes { &self.data }
}

/// One form value: plain text, or an uploaded file.
#[derive(Clone, Debug, PartialEq)]
pub enum FormField {
    Text(String),
    File(UploadedFile),
}

impl FormField {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(f) => Some(f),
            Self::Text(_) => None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.as_file().map(UploadedFile::filename)
    }
}

/// Splits `body` on `boundary` into named fields, in body order.
pub(crate) fn parse(body: &Bytes, boundary: &str) -> Result<Vec<(String, FormField)>, Error> {
    let delimiter = format!("--{boundary}").into_bytes();
    let separator = [b"\r\n".as_slice(), &delimiter].concat();

    let mut pos = find(body, &delimiter, 0)
        .ok_or_else(|| malformed("missing opening boundary"))?
        + delimiter.len();

    let mut fields = Vec::new();
    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            return Ok(fields);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(malformed("boundary not followed by CRLF"));
        }
        let start = pos + 2;
        let end = find(body, &separator, start).ok_or_else(|| malformed("unterminated part"))?;

        if let Some(field) = parse_part(body.slice(start..end))? {
            fields.push(field);
        }
        pos = end + separator.len();
    }
}

fn parse_part(part: Bytes) -> Result<Option<(String, FormField)>, Error> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_PART_HEADERS];
    let (header_len, headers) = match httparse::parse_headers(&part, &mut headers) {
        Ok(httparse::Status::Complete(parsed)) => parsed,
        Ok(httparse::Status::Partial) => return Err(malformed("incomplete part headers")),
        Err(e) => return Err(malformed(&format!("invalid part headers: {e}"))),
    };

    let header = |name: &str| {
        headers.iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| String::from_utf8_lossy(h.value).into_owned())
    };

    let Some(disposition) = header("content-disposition") else {
        return Ok(None);
    };
    let Some(name) = disposition_param(&disposition, "name") else {
        return Ok(None);
    };

    let data = part.slice(header_len..);
    let field = match disposition_param(&disposition, "filename") {
        Some(filename) => FormField::File(UploadedFile {
            filename,
            content_type: header("content-type"),
            data,
        }),
        None => FormField::Text(String::from_utf8_lossy(&data).into_owned()),
    };
    Ok(Some((name, field)))
}

/// `form-data; name="foo"; filename="a.txt"` → the unquoted value of `key`.
fn disposition_param(disposition: &str, key: &str) -> Option<String> {
    disposition.split(';').skip(1).find_map(|param| {
        let (k, v) = param.trim().split_once('=')?;
        if !k.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        let v = v.trim();
        let v = v.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(v);
        Some(v.to_owned())
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack.get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn malformed(reason: &str) -> Error {
    Error::BadRequest(format!("malformed multipart body: {reason}"))
}

//! HTTP status codes and the fixed reason-phrase table.
//!
//! ```rust
//! use bitty::{Response, Status};
//!
//! let created = Response::new("made it").with_status(Status::Created);
//! assert_eq!(created.status(), 201);
//! assert_eq!(bitty::status::reason(418), "I'm a Teapot");
//! ```

macro_rules! statuses {
    ($( $variant:ident = $code:literal, $phrase:literal; )+) => {
        /// Registered HTTP status codes.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Status {
            $( $variant, )+
        }

        impl Status {
            pub fn code(self) -> u16 {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            /// Looks up a known status by numeric code.
            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        /// Reason phrase for `code`; empty for codes outside the table.
        pub fn reason(code: u16) -> &'static str {
            match code {
                $( $code => $phrase, )+
                _ => "",
            }
        }
    };
}

statuses! {
    Continue                      = 100, "Continue";
    SwitchingProtocols            = 101, "Switching Protocols";
    Ok                            = 200, "OK";
    Created                       = 201, "Created";
    Accepted                      = 202, "Accepted";
    NonAuthoritativeInformation   = 203, "Non-Authoritative Information";
    NoContent                     = 204, "No Content";
    ResetContent                  = 205, "Reset Content";
    PartialContent                = 206, "Partial Content";
    MultipleChoices               = 300, "Multiple Choices";
    MovedPermanently              = 301, "Moved Permanently";
    Found                         = 302, "Found";
    SeeOther                      = 303, "See Other";
    NotModified                   = 304, "Not Modified";
    UseProxy                      = 305, "Use Proxy";
    TemporaryRedirect             = 307, "Temporary Redirect";
    PermanentRedirect             = 308, "Permanent Redirect";
    BadRequest                    = 400, "Bad Request";
    Unauthorized                  = 401, "Unauthorized";
    PaymentRequired               = 402, "Payment Required";
    Forbidden                     = 403, "Forbidden";
    NotFound                      = 404, "Not Found";
    MethodNotAllowed              = 405, "Method Not Allowed";
    NotAcceptable                 = 406, "Not Acceptable";
    ProxyAuthenticationRequired   = 407, "Proxy Authentication Required";
    RequestTimeout                = 408, "Request Timeout";
    Conflict                      = 409, "Conflict";
    Gone                          = 410, "Gone";
    LengthRequired                = 411, "Length Required";
    PreconditionFailed            = 412, "Precondition Failed";
    ContentTooLarge               = 413, "Content Too Large";
    UriTooLong                    = 414, "URI Too Long";
    UnsupportedMediaType          = 415, "Unsupported Media Type";
    RangeNotSatisfiable           = 416, "Range Not Satisfiable";
    ExpectationFailed             = 417, "Expectation Failed";
    ImATeapot                     = 418, "I'm a Teapot";
    UnprocessableContent          = 422, "Unprocessable Content";
    TooManyRequests               = 429, "Too Many Requests";
    InternalServerError           = 500, "Internal Server Error";
    NotImplemented                = 501, "Not Implemented";
    BadGateway                    = 502, "Bad Gateway";
    ServiceUnavailable            = 503, "Service Unavailable";
    GatewayTimeout                = 504, "Gateway Timeout";
    HttpVersionNotSupported       = 505, "HTTP Version Not Supported";
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

/// A status accepted by the builder APIs: a [`Status`] or a bare code such as
/// `404`. Unregistered codes pass through unchanged.
pub trait IntoStatus {
    fn into_status(self) -> u16;
}

impl IntoStatus for u16 {
    fn into_status(self) -> u16 {
        self
    }
}

impl IntoStatus for Status {
    fn into_status(self) -> u16 {
        self.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_phrases_line_up() {
        assert_eq!(Status::Found.code(), 302);
        assert_eq!(reason(302), "Found");
        assert_eq!(reason(404), "Not Found");
        assert_eq!(Status::from_code(403), Some(Status::Forbidden));
    }

    #[test]
    fn literals_and_variants_are_both_statuses() {
        fn code(status: impl IntoStatus) -> u16 {
            status.into_status()
        }
        assert_eq!(code(404), 404);
        assert_eq!(code(299), 299);
        assert_eq!(code(Status::NotFound), 404);
    }

    #[test]
    fn unknown_code_has_empty_phrase() {
        assert_eq!(reason(299), "");
        assert_eq!(Status::from_code(299), None);
    }
}

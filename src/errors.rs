use crate::{http::query, http::types::Version};
use std::{error, fmt, io};

#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    InvalidMethod,

    InvalidUrl,
    #[allow(dead_code)]
    Query(query::Error),

    InvalidVersion,
    UnsupportedVersion,

    InvalidHeader,
    TooManyHeaders,
    InvalidContentLength,

    BodyTooLarge,
    #[allow(dead_code)]
    BodyMismatch {
        expected: usize,
        available: usize,
    },
    #[allow(dead_code)]
    UnexpectedBody(usize),

    ServiceUnavailable,
    Io(IoError),
}

// Pre-baked byte responses per error kind, keyed on (json_errors, version).
// The body matches the router's uniform `{isSucceed,message,data?}` envelope so a client
// never has to special-case a parse-error reply differently from a routed one.
macro_rules! http_errors {
    ($($name:ident: $status_code:expr, $len:literal => $msg:literal; )*) => {
        pub(crate) const fn as_http(
            &self,
            version: Version,
            json: bool,
        ) -> &'static [u8] {
            match (json, self, version) { $(
                (true, Self::$name { .. }, Version::Http11) => concat!(
                    "HTTP/1.1 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: ", $len, "\r\n",
                    "content-type: application/json;charset=UTF-8\r\n",
                    "\r\n",
                    "{\"isSucceed\":false,\"message\":\"", $msg, "\"}"
                ),
                (false, Self::$name { .. }, Version::Http11) => concat!(
                    "HTTP/1.1 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: 0\r\n\r\n",
                ),
                (true, Self::$name { .. }, Version::Http10) => concat!(
                    "HTTP/1.0 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: ", $len, "\r\n",
                    "content-type: application/json;charset=UTF-8\r\n",
                    "\r\n",
                    "{\"isSucceed\":false,\"message\":\"", $msg, "\"}"
                ),
                (false, Self::$name { .. }, Version::Http10) => concat!(
                    "HTTP/1.0 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: 0\r\n\r\n",
                ),
            )* }.as_bytes()
        }
    };
}

impl ErrorKind {
    http_errors! {
        InvalidMethod: "400 Bad Request", "51" => "Invalid HTTP method";
        InvalidUrl: "400 Bad Request", "50" => "Invalid URL format";
        Query: "400 Bad Request", "52" => "Invalid query string";

        InvalidVersion: "400 Bad Request", "52" => "Invalid HTTP version";
        UnsupportedVersion: "505 HTTP Version Not Supported", "58" => "HTTP version not supported";

        InvalidHeader: "400 Bad Request", "53" => "Invalid header format";
        TooManyHeaders: "431 Request Header Fields Too Large", "48" => "Too many headers";
        InvalidContentLength: "400 Bad Request", "54" => "Invalid Content-Length";

        BodyTooLarge: "413 Payload Too Large", "54" => "Request body too large";
        BodyMismatch: "400 Bad Request", "52" => "Body length mismatch";
        UnexpectedBody: "400 Bad Request", "55" => "Unexpected request body";

        ServiceUnavailable: "503 Service Unavailable", "63" => "Service temporarily unavailable";
        Io: "503 Service Unavailable", "50" => "I/O error occurred";
    }
}

impl error::Error for ErrorKind {}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<query::Error> for ErrorKind {
    fn from(err: query::Error) -> Self {
        ErrorKind::Query(err)
    }
}
impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

/// Fallible setup-path errors: binding a listener, loading TLS credentials, or builder misuse
/// that a host embedding this crate should be able to handle with ordinary `Result` rather than
/// a panic (panics are reserved for programmer error during a single process's own startup,
/// e.g. `ServerBuilder::build()` called without a listener).
#[derive(Debug)]
pub enum ConfigError {
    /// The listener could not be bound (address in use, permission denied, bad path, ...).
    Bind(io::Error),
    /// TLS credential material (certificate chain, private key, CA list) could not be parsed.
    InvalidTlsCredentials(String),
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ConfigError::Bind(err) => Some(err),
            ConfigError::InvalidTlsCredentials(_) => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Bind(err) => write!(f, "failed to bind listener: {err}"),
            ConfigError::InvalidTlsCredentials(msg) => {
                write!(f, "invalid TLS credentials: {msg}")
            }
        }
    }
}

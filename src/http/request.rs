use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use url::Url;

/// Header map shared by requests and responses.
///
/// Names are stored exactly as received; inserting an existing name
/// overwrites the previous value.
pub type Headers = HashMap<String, String>;

/// Base used to turn origin-form targets (`/path?query`) into absolute URLs.
pub const LOCAL_BASE: &str = "http://localhost";

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// TRACE - Loop the request back
    TRACE,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// CONNECT - Establish a tunnel
    CONNECT,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method, ignoring ASCII case.
    ///
    /// # Example
    ///
    /// ```
    /// # use libhttp::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("patch"), Some(Method::PATCH));
    /// assert_eq!(Method::from_str("FOO"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        const ALL: [Method; 9] = [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::HEAD,
            Method::TRACE,
            Method::OPTIONS,
            Method::CONNECT,
            Method::PATCH,
        ];

        ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::TRACE => "TRACE",
            Method::OPTIONS => "OPTIONS",
            Method::CONNECT => "CONNECT",
            Method::PATCH => "PATCH",
        }
    }

    /// Methods whose requests may carry a body announced by `Content-Length`.
    pub fn allows_body(&self) -> bool {
        matches!(self, Method::POST | Method::PUT | Method::PATCH)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two protocol versions this server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// Accepts only the literal tokens `HTTP/1.0` and `HTTP/1.1`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the connection a request arrived on. Carries no ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ConnectionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Represents a parsed HTTP request from a client.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Absolute request URL; origin-form targets are resolved against `http://localhost`
    pub uri: Url,
    pub version: Version,
    /// Request headers as key-value pairs
    pub headers: Headers,
    /// Request body for POST/PUT/PATCH requests
    pub body: Vec<u8>,
    pub connection: ConnectionId,
}

/// Turns a request-target into an absolute URL.
///
/// Origin-form targets (`/a/b?c`) are prefixed with [`LOCAL_BASE`], never
/// resolved against it, so `//x/y` stays a path on `localhost`. The
/// asterisk-form (`*`) becomes `http://localhost/*`. Anything else must
/// already be an absolute URL.
pub fn normalize_target(target: &str) -> Result<Url, url::ParseError> {
    if target.starts_with('/') {
        Url::parse(&format!("{LOCAL_BASE}{target}"))
    } else if target == "*" {
        Url::parse(&format!("{LOCAL_BASE}/*"))
    } else {
        Url::parse(target)
    }
}

/// Builder for constructing Request objects.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    version: Version,
    headers: Headers,
    body: Vec<u8>,
    connection: ConnectionId,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Request-target in either origin-form or absolute-form.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn connection(mut self, connection: ConnectionId) -> Self {
        self.connection = connection;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let target = self.target.ok_or("target missing")?;
        let uri = normalize_target(&target).map_err(|_| "invalid target")?;

        Ok(Request {
            method: self.method.ok_or("method missing")?,
            uri,
            version: self.version,
            headers: self.headers,
            body: self.body,
            connection: self.connection,
        })
    }
}

impl Request {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, uri: Url, version: Version, connection: ConnectionId) -> Self {
        Self {
            method,
            uri,
            version,
            headers: Headers::new(),
            body: Vec::new(),
            connection,
        }
    }

    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves a header value, comparing names case-insensitively.
    pub fn header_ignore_case(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Raw `Content-Length` value, if the client sent one.
    pub fn content_length(&self) -> Option<&str> {
        self.header_ignore_case("Content-Length")
    }

    /// Whether a body follows the header section.
    ///
    /// Only POST, PUT and PATCH with a `Content-Length` header carry one.
    pub fn expects_body(&self) -> bool {
        self.method.allows_body() && self.content_length().is_some()
    }

    /// Path plus query, as it would appear on the request line.
    pub fn path_and_query(&self) -> String {
        match self.uri.query() {
            Some(q) => format!("{}?{}", self.uri.path(), q),
            None => self.uri.path().to_string(),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

use libhttp::http::request::{
    ConnectionId, Headers, Method, Request, RequestBuilder, Version, normalize_target,
};

fn request(method: Method, headers: Headers) -> Request {
    Request {
        method,
        uri: normalize_target("/").unwrap(),
        version: Version::Http11,
        headers,
        body: vec![],
        connection: ConnectionId(1),
    }
}

#[test]
fn test_request_header_retrieval() {
    let mut headers = Headers::new();
    headers.insert("Host".to_string(), "example.com".to_string());
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    let req = request(Method::GET, headers);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("host"), None);
    assert_eq!(req.header_ignore_case("host"), Some("example.com"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_expects_body() {
    let mut headers = Headers::new();
    headers.insert("Content-Length".to_string(), "42".to_string());

    for method in [Method::POST, Method::PUT, Method::PATCH] {
        assert!(request(method, headers.clone()).expects_body());
    }
    for method in [Method::GET, Method::DELETE, Method::HEAD, Method::TRACE] {
        assert!(!request(method, headers.clone()).expects_body());
    }
    assert!(!request(Method::POST, Headers::new()).expects_body());
}

#[test]
fn test_request_content_length_raw() {
    let mut headers = Headers::new();
    headers.insert("CONTENT-LENGTH".to_string(), "not-a-number".to_string());

    let req = request(Method::POST, headers);

    assert_eq!(req.content_length(), Some("not-a-number"));
}

#[test]
fn test_method_from_str() {
    let methods = [
        ("GET", Method::GET),
        ("post", Method::POST),
        ("Put", Method::PUT),
        ("DELETE", Method::DELETE),
        ("HEAD", Method::HEAD),
        ("TRACE", Method::TRACE),
        ("OPTIONS", Method::OPTIONS),
        ("connect", Method::CONNECT),
        ("PATCH", Method::PATCH),
    ];

    for (raw, expected) in methods {
        assert_eq!(Method::from_str(raw), Some(expected));
        assert_eq!(expected.to_string(), raw.to_ascii_uppercase());
    }
    assert_eq!(Method::from_str("BREW"), None);
    assert_eq!(Method::from_str(""), None);
}

#[test]
fn test_version_tokens() {
    assert_eq!(Version::from_token("HTTP/1.0"), Some(Version::Http10));
    assert_eq!(Version::from_token("HTTP/1.1"), Some(Version::Http11));
    assert_eq!(Version::from_token("http/1.1"), None);
    assert_eq!(Version::from_token("HTTP/2"), None);
    assert_eq!(Version::Http10.to_string(), "HTTP/1.0");
}

#[test]
fn test_normalize_target() {
    assert_eq!(normalize_target("/").unwrap().as_str(), "http://localhost/");
    assert_eq!(
        normalize_target("/a/b?c=d").unwrap().as_str(),
        "http://localhost/a/b?c=d"
    );
    assert_eq!(
        normalize_target("https://example.org/x").unwrap().as_str(),
        "https://example.org/x"
    );
    assert_eq!(normalize_target("*").unwrap().as_str(), "http://localhost/*");
    assert!(normalize_target("not a url").is_err());
}

#[test]
fn test_normalize_target_keeps_double_slash_path() {
    let uri = normalize_target("//evil.example/secret").unwrap();

    assert_eq!(uri.as_str(), "http://localhost//evil.example/secret");
    assert_eq!(uri.host_str(), Some("localhost"));
    assert_eq!(uri.path(), "//evil.example/secret");
}

#[test]
fn test_request_builder() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .target("/api?x=1")
        .version(Version::Http10)
        .header("Content-Length", "2")
        .body(b"hi".to_vec())
        .connection(ConnectionId(9))
        .build()
        .unwrap();

    assert_eq!(req.path_and_query(), "/api?x=1");
    assert_eq!(req.version, Version::Http10);
    assert_eq!(req.body_text(), "hi");
    assert_eq!(req.connection, ConnectionId(9));
}

#[test]
fn test_request_builder_missing_fields() {
    assert!(RequestBuilder::new().target("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_connection_ids_are_unique() {
    let a = ConnectionId::next();
    let b = ConnectionId::next();

    assert_ne!(a, b);
}

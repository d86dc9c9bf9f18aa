use std::path::{Path, PathBuf};

use async_trait::async_trait;
use percent_encoding::percent_decode_str;

use crate::config::StaticFilesConfig;
use crate::http::handler::Handler;
use crate::http::mime;
use crate::http::producer::FileProducer;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Answers every request with a fixed greeting.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloHandler;

#[async_trait]
impl Handler for HelloHandler {
    async fn handle(&self, request: &Request) -> Response {
        let mut response = Response::ok("Hello from libhttp\n");
        response.version = request.version;
        response
    }
}

/// Serves files below a root directory. Directory paths map to the index
/// file.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index: String,
}

impl StaticFiles {
    pub fn new(config: &StaticFilesConfig) -> Self {
        Self {
            root: config.root.clone(),
            index: config.index.clone(),
        }
    }

    /// Maps a URL path onto the file system.
    ///
    /// Segments are percent-decoded before use. A decoded segment that is
    /// `.` or `..`, contains a path separator or a NUL, or is not UTF-8
    /// refuses the whole path.
    pub fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in url_path.split('/').filter(|s| !s.is_empty()) {
            let segment = percent_decode_str(segment).decode_utf8().ok()?;
            if segment == "." || segment == ".." || segment.contains(['/', '\\', '\0']) {
                return None;
            }
            path.push(segment.as_ref());
        }
        if url_path.ends_with('/') {
            path.push(&self.index);
        }
        Some(path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Handler for StaticFiles {
    async fn handle(&self, request: &Request) -> Response {
        if !matches!(request.method, Method::GET | Method::HEAD) {
            let mut response = Response::error(StatusCode::MethodNotAllowed);
            response.headers.insert("Allow".to_string(), "GET, HEAD".to_string());
            return response;
        }

        let Some(path) = self.resolve(request.uri.path()) else {
            return Response::error(StatusCode::Forbidden);
        };

        let producer = match FileProducer::open(&path).await {
            Ok(producer) => producer,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "File not served");
                return Response::not_found();
            }
        };

        let builder = ResponseBuilder::new(StatusCode::Ok).version(request.version);
        if request.method == Method::HEAD {
            // explicit headers win over the empty producer's Content-Length
            builder
                .header("Content-Length", producer.content_length().to_string())
                .header("Content-Type", mime::from_path(&path))
                .build()
        } else {
            builder.producer(producer).build()
        }
    }
}

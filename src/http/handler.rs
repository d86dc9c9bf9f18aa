use async_trait::async_trait;

use crate::http::request::Request;
use crate::http::response::Response;

/// Application hook: turns a parsed request into a response.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &Request) -> Response;
}

/// Adapts a plain function or closure into a [`Handler`].
#[derive(Debug, Clone)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    async fn handle(&self, request: &Request) -> Response {
        (self.f)(request)
    }
}

pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    HandlerFn { f }
}

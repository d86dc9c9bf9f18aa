//! libhttp - minimal HTTP/1.x server engine
//!
//! Incremental request parsing and streaming response writing over any
//! tokio byte stream.

pub mod config;
pub mod http;
pub mod server;

//! HTTP/1.x protocol engine.
//!
//! Every connection serves exactly one request and is closed afterwards.
//!
//! # Architecture
//!
//! - **`parser`**: Incremental state machine turning bytes into a [`Request`](request::Request)
//! - **`reader`**: Drives socket reads into the parser and yields one [`ReadEvent`](reader::ReadEvent)
//! - **`writer`**: Serializes the response head and streams the body from a producer
//! - **`producer`**: The body producer contract plus buffer and file producers
//! - **`connection`**: Wires reader, handler and writer for one connection
//! - **`request`** / **`response`**: The request and response data model
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Example
//!
//! ```ignore
//! use libhttp::config::ReaderConfig;
//! use libhttp::http::connection::Connection;
//! use libhttp::http::handler::make_handler;
//! use libhttp::http::response::Response;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let handler = make_handler(|req| Response::ok(format!("you asked for {}\n", req.uri)));
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let conn = Connection::new(socket, ReaderConfig::default());
//!         conn.run(&handler).await?;
//!     }
//! }
//! ```

pub mod connection;
pub mod handler;
pub mod mime;
pub mod parser;
pub mod producer;
pub mod reader;
pub mod request;
pub mod response;
pub mod writer;

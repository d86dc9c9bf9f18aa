use std::io;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::producer::BodyProducer;
use crate::http::request::{ConnectionId, Headers, Request};
use crate::http::response::Response;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = "libHTTP/1.0";

/// Headers the writer always sets itself.
const SYSTEM_HEADERS: [&str; 2] = ["Server", "Connection"];

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("response already started on this writer")]
    AlreadyStarted,

    #[error("connection already closed")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("body producer failed: {0}")]
    Producer(#[source] io::Error),
}

/// Fills in producer headers the response doesn't set and drops any
/// caller-supplied `Server` / `Connection` headers.
pub fn prepare_headers(headers: &mut Headers, producer: &dyn BodyProducer) {
    if let Some(extra) = producer.additional_headers() {
        for (name, value) in extra {
            headers.entry(name).or_insert(value);
        }
    }
    headers.retain(|name, _| {
        !SYSTEM_HEADERS
            .iter()
            .any(|system| system.eq_ignore_ascii_case(name))
    });
}

/// Status line, system headers, remaining headers and the blank line.
pub fn serialize_head(response: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        response.version,
        response.status.as_u16(),
        response.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    buf.extend_from_slice(format!("Server: {SERVER_NAME}\r\n").as_bytes());
    buf.extend_from_slice(b"Connection: Close\r\n");

    // Headers
    for (k, v) in &response.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes one response and closes the connection.
///
/// The body is pulled from the response's producer one chunk at a time; the
/// next chunk is only requested after the previous one was written.
pub struct ResponseWriter<S> {
    stream: Option<S>,
    producer: Option<Box<dyn BodyProducer>>,
    started: bool,
    connection: ConnectionId,
}

impl<S> ResponseWriter<S>
where
    S: AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            producer: None,
            started: false,
            connection: ConnectionId::default(),
        }
    }

    /// Sends `response` and closes the connection, whatever the result.
    ///
    /// `request` is the request being answered, if one was parsed far enough
    /// to exist; it is passed to the producer on connect. Errors are
    /// returned for logging only: by the time this returns the connection is
    /// already closed. A writer answers once; later calls disconnect the
    /// rejected response's producer and return [`WriteError::AlreadyStarted`].
    pub async fn start(
        &mut self,
        request: Option<&Request>,
        mut response: Response,
    ) -> Result<(), WriteError> {
        if self.started {
            response.producer.disconnect().await;
            return Err(WriteError::AlreadyStarted);
        }
        self.started = true;
        if let Some(request) = request {
            self.connection = request.connection;
        }

        let result = self.send(request, response).await;
        if let Err(e) = &result {
            tracing::debug!(connection = %self.connection, error = %e, "Response aborted");
        }
        self.close().await;
        result
    }

    async fn send(
        &mut self,
        request: Option<&Request>,
        mut response: Response,
    ) -> Result<(), WriteError> {
        prepare_headers(&mut response.headers, &*response.producer);
        let head = serialize_head(&response);
        let status = response.status;

        let producer = self.producer.insert(response.producer);
        let stream = self.stream.as_mut().ok_or(WriteError::Closed)?;

        stream.write_all(&head).await?;
        tracing::trace!(
            connection = %self.connection,
            status = status.as_u16(),
            bytes = head.len(),
            "Response head sent"
        );

        if !producer.is_connected() {
            producer
                .connect(request)
                .await
                .map_err(WriteError::Producer)?;
        }

        let mut body_len = 0usize;
        loop {
            match producer.read_chunk().await.map_err(WriteError::Producer)? {
                Some(chunk) if !chunk.is_empty() => {
                    stream.write_all(&chunk).await?;
                    body_len += chunk.len();
                    tracing::trace!(
                        connection = %self.connection,
                        bytes = chunk.len(),
                        "Body chunk sent"
                    );
                }
                _ => break,
            }
        }
        stream.flush().await?;

        tracing::debug!(
            connection = %self.connection,
            status = status.as_u16(),
            body_len,
            "Response sent"
        );
        Ok(())
    }

    /// Releases the producer, then shuts down and drops the connection.
    /// Further calls do nothing.
    pub async fn close(&mut self) {
        if let Some(mut producer) = self.producer.take() {
            producer.disconnect().await;
        }
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::trace!(connection = %self.connection, error = %e, "Shutdown failed");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

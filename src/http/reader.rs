use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ReaderConfig;
use crate::http::parser::{ParseError, ParseOutcome, RequestParser};
use crate::http::request::{ConnectionId, Request};
use crate::http::response::StatusCode;

/// The single outcome of reading one request from a connection.
#[derive(Debug)]
pub enum ReadEvent {
    /// The request was parsed successfully.
    Complete(Request),
    /// The client broke the protocol. The reader does not answer; writing
    /// an error response with `status` is up to the caller.
    HttpError {
        status: StatusCode,
        error: ParseError,
        request: Option<Request>,
    },
    /// The peer went away or the transport failed before a request was
    /// complete. Nothing should be written back.
    ConnectionLost,
}

/// Reads and parses exactly one request from a connection.
///
/// The reader owns the stream while it runs and gives it back together with
/// the outcome, so a reader can only ever produce one event.
#[derive(Debug)]
pub struct RequestReader<S> {
    stream: S,
    parser: RequestParser,
    read_buffer: Vec<u8>,
    connection: ConnectionId,
}

impl<S> RequestReader<S>
where
    S: AsyncRead + Unpin,
{
    pub fn new(stream: S, connection: ConnectionId) -> Self {
        Self::with_config(stream, connection, &ReaderConfig::default())
    }

    pub fn with_config(stream: S, connection: ConnectionId, config: &ReaderConfig) -> Self {
        Self {
            stream,
            parser: RequestParser::new(connection, config),
            read_buffer: vec![0; config.read_buffer_size.max(1)],
            connection,
        }
    }

    /// Reads until the request is complete, rejected, or the connection
    /// drops, then hands the stream back.
    pub async fn read(mut self) -> (ReadEvent, S) {
        let event = self.read_event().await;
        (event, self.stream)
    }

    async fn read_event(&mut self) -> ReadEvent {
        loop {
            // The buffer is only reused after the previous read has returned
            // and its bytes were copied into the parser.
            let n = match self.stream.read(&mut self.read_buffer).await {
                Ok(0) => {
                    tracing::debug!(
                        connection = %self.connection,
                        state = self.parser.state(),
                        "Peer closed connection before request completed"
                    );
                    return ReadEvent::ConnectionLost;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(
                        connection = %self.connection,
                        error = %e,
                        "Read failed"
                    );
                    return ReadEvent::ConnectionLost;
                }
            };

            tracing::trace!(
                connection = %self.connection,
                bytes = n,
                "Read from connection"
            );

            match self.parser.feed(&self.read_buffer[..n]) {
                None => continue,
                Some(ParseOutcome::Complete(request)) => {
                    tracing::debug!(
                        connection = %self.connection,
                        method = %request.method,
                        uri = %request.uri,
                        "Request received"
                    );
                    return ReadEvent::Complete(request);
                }
                Some(ParseOutcome::Failed { error, request }) => {
                    let status = error.status();
                    tracing::warn!(
                        connection = %self.connection,
                        status = status.as_u16(),
                        error = %error,
                        "Malformed request"
                    );
                    return ReadEvent::HttpError {
                        status,
                        error,
                        request,
                    };
                }
            }
        }
    }
}

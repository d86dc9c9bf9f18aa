//! Incremental request parsing.
//!
//! [`RequestParser`] accepts bytes in whatever pieces the transport delivers
//! and walks `InitialLine -> Headers -> Body`. Lines end at `\n`; the
//! trailing `\r` (and any other surrounding whitespace) is trimmed. The
//! parser never moves backwards, and after a protocol error it ignores all
//! further input.

use bytes::BytesMut;
use thiserror::Error;

use crate::config::ReaderConfig;
use crate::http::request::{ConnectionId, Method, Request, Version, normalize_target};
use crate::http::response::StatusCode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("unknown method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid request target: {0:?}")]
    InvalidUri(String),

    #[error("unsupported http version: {0:?}")]
    InvalidVersion(String),

    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),

    #[error("request head is not valid utf-8")]
    InvalidEncoding,

    #[error("request head exceeds {max} bytes")]
    HeadTooLarge { max: usize },

    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    #[error("body of {length} bytes exceeds the limit of {max}")]
    BodyTooLarge { length: usize, max: usize },
}

impl ParseError {
    /// Status code to answer the client with.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::HeadTooLarge { .. } => StatusCode::RequestHeaderFieldsTooLarge,
            ParseError::BodyTooLarge { .. } => StatusCode::PayloadTooLarge,
            _ => StatusCode::BadRequest,
        }
    }
}

/// Terminal result of parsing one request.
#[derive(Debug)]
pub enum ParseOutcome {
    Complete(Request),
    /// `request` holds what was parsed before the error, or `None` if the
    /// request line itself was rejected.
    Failed {
        error: ParseError,
        request: Option<Request>,
    },
}

#[derive(Debug)]
enum State {
    InitialLine,
    Headers(Request),
    Body { request: Request, remaining: usize },
    Complete,
    Failed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::InitialLine => "initial-line",
            State::Headers(_) => "headers",
            State::Body { .. } => "body",
            State::Complete => "complete",
            State::Failed => "failed",
        }
    }
}

/// Line-oriented state machine for a single request.
#[derive(Debug)]
pub struct RequestParser {
    state: State,
    buffer: BytesMut,
    // bytes at the front of `buffer` already searched for a line feed
    scanned: usize,
    head_size: usize,
    max_head_size: usize,
    max_body_size: usize,
    connection: ConnectionId,
}

impl RequestParser {
    pub fn new(connection: ConnectionId, config: &ReaderConfig) -> Self {
        Self {
            state: State::InitialLine,
            buffer: BytesMut::with_capacity(config.read_buffer_size),
            scanned: 0,
            head_size: 0,
            max_head_size: config.max_head_size,
            max_body_size: config.max_body_size,
            connection,
        }
    }

    /// Name of the current state, for diagnostics.
    pub fn state(&self) -> &'static str {
        self.state.name()
    }

    /// True once an outcome has been returned; later input is ignored.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Complete | State::Failed)
    }

    /// Appends `bytes` and advances as far as the buffered input allows.
    ///
    /// Returns `Some` exactly once per parser, on the call that completes
    /// or rejects the request.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<ParseOutcome> {
        if self.is_finished() {
            return None;
        }
        self.buffer.extend_from_slice(bytes);
        self.advance()
    }

    fn advance(&mut self) -> Option<ParseOutcome> {
        loop {
            match std::mem::replace(&mut self.state, State::Failed) {
                State::InitialLine => {
                    let Some(line) = self.next_line() else {
                        self.state = State::InitialLine;
                        return self.check_head_size(None);
                    };
                    match self.parse_initial_line(&line) {
                        Ok(request) => {
                            tracing::trace!(
                                connection = %self.connection,
                                method = %request.method,
                                uri = %request.uri,
                                "Request line parsed"
                            );
                            self.state = State::Headers(request);
                        }
                        Err(e) => return Some(self.fail(e, None)),
                    }
                }

                State::Headers(mut request) => {
                    let Some(line) = self.next_line() else {
                        return self.check_head_size(Some(request));
                    };
                    match parse_header_line(&line) {
                        Ok(Some((name, value))) => {
                            request.headers.insert(name, value);
                            self.state = State::Headers(request);
                        }
                        Ok(None) => match self.body_length(&request) {
                            Ok(Some(length)) if length > 0 => {
                                tracing::trace!(
                                    connection = %self.connection,
                                    length,
                                    "Headers parsed, reading body"
                                );
                                request.body.reserve(length);
                                self.state = State::Body {
                                    request,
                                    remaining: length,
                                };
                            }
                            Ok(_) => {
                                self.state = State::Complete;
                                return Some(ParseOutcome::Complete(request));
                            }
                            Err(e) => return Some(self.fail(e, Some(request))),
                        },
                        Err(e) => return Some(self.fail(e, Some(request))),
                    }
                }

                State::Body {
                    mut request,
                    remaining,
                } => {
                    let take = remaining.min(self.buffer.len());
                    request.body.extend_from_slice(&self.buffer.split_to(take));
                    let remaining = remaining - take;

                    if remaining == 0 {
                        self.buffer.clear();
                        self.state = State::Complete;
                        return Some(ParseOutcome::Complete(request));
                    }
                    self.state = State::Body { request, remaining };
                    return None;
                }

                terminal @ (State::Complete | State::Failed) => {
                    self.state = terminal;
                    return None;
                }
            }
        }
    }

    /// Splits off the next `\n`-terminated line, resuming the search where
    /// the previous call stopped.
    fn next_line(&mut self) -> Option<BytesMut> {
        match self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(pos) => {
                let line = self.buffer.split_to(self.scanned + pos + 1);
                self.scanned = 0;
                self.head_size += line.len();
                Some(line)
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Called while waiting for a head line; rejects heads that keep
    /// growing past the limit. Restores the headers state otherwise.
    fn check_head_size(&mut self, request: Option<Request>) -> Option<ParseOutcome> {
        if self.head_size + self.buffer.len() > self.max_head_size {
            let error = ParseError::HeadTooLarge {
                max: self.max_head_size,
            };
            return Some(self.fail(error, request));
        }
        if let Some(request) = request {
            self.state = State::Headers(request);
        }
        None
    }

    fn parse_initial_line(&self, raw: &[u8]) -> Result<Request, ParseError> {
        let line = decode_line(raw)?;

        let mut tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.len() < 3 {
            tokens = line.split('\t').filter(|t| !t.is_empty()).collect();
        }
        let &[method, target, version, ..] = tokens.as_slice() else {
            return Err(ParseError::MalformedRequestLine(line.to_string()));
        };

        let method =
            Method::from_str(method).ok_or_else(|| ParseError::InvalidMethod(method.to_string()))?;
        let uri = normalize_target(target).map_err(|_| ParseError::InvalidUri(target.to_string()))?;
        let version = Version::from_token(version)
            .ok_or_else(|| ParseError::InvalidVersion(version.to_string()))?;

        Ok(Request::new(method, uri, version, self.connection))
    }

    /// `Ok(None)` when no body follows the headers.
    fn body_length(&self, request: &Request) -> Result<Option<usize>, ParseError> {
        if !request.expects_body() {
            return Ok(None);
        }
        let raw = request.content_length().unwrap_or_default();
        let length: usize = raw
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?;

        if length > self.max_body_size {
            return Err(ParseError::BodyTooLarge {
                length,
                max: self.max_body_size,
            });
        }
        Ok(Some(length))
    }

    fn fail(&mut self, error: ParseError, request: Option<Request>) -> ParseOutcome {
        tracing::debug!(
            connection = %self.connection,
            error = %error,
            "Rejecting request"
        );
        self.state = State::Failed;
        self.buffer.clear();
        self.scanned = 0;
        ParseOutcome::Failed { error, request }
    }
}

fn decode_line(raw: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(raw)
        .map(str::trim)
        .map_err(|_| ParseError::InvalidEncoding)
}

/// `Ok(None)` marks the blank line that ends the header section.
fn parse_header_line(raw: &[u8]) -> Result<Option<(String, String)>, ParseError> {
    let line = decode_line(raw)?;
    if line.is_empty() {
        return Ok(None);
    }

    match line.split_once(':') {
        Some((name, value)) if !name.is_empty() => {
            Ok(Some((name.to_string(), value.trim().to_string())))
        }
        _ => Err(ParseError::InvalidHeader(line.to_string())),
    }
}

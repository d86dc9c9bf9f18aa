//! Response body producers.
//!
//! A [`BodyProducer`] hands the writer one chunk at a time until it runs
//! dry. The writer owns the producer for the whole response cycle and calls
//! [`BodyProducer::disconnect`] exactly once when the cycle ends, whether
//! the body was fully sent or the connection failed.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::http::mime;
use crate::http::request::{Headers, Request};

/// Default chunk size for file streaming
const FILE_CHUNK_SIZE: usize = 8192;

#[async_trait]
pub trait BodyProducer: Send {
    /// Whether [`connect`](Self::connect) has already run for this cycle.
    fn is_connected(&self) -> bool;

    /// Attaches the producer to the request being answered. Called at most
    /// once, before the first [`read_chunk`](Self::read_chunk). `request` is
    /// `None` when answering a request whose first line was rejected.
    async fn connect(&mut self, request: Option<&Request>) -> io::Result<()>;

    /// Headers merged into the response unless it already sets them.
    /// Queried once, before the status line is written.
    fn additional_headers(&self) -> Option<Headers> {
        None
    }

    /// Next chunk of the body. `None` or an empty chunk ends the body.
    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>>;

    /// Releases whatever the producer holds.
    async fn disconnect(&mut self);
}

/// Serves a fixed in-memory buffer as a single chunk.
#[derive(Debug, Clone, Default)]
pub struct BufferProducer {
    data: Bytes,
    sent: bool,
    connected: bool,
}

impl BufferProducer {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Bytes::from(data.into()),
            sent: false,
            connected: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl BodyProducer for BufferProducer {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self, _request: Option<&Request>) -> io::Result<()> {
        self.connected = true;
        Ok(())
    }

    fn additional_headers(&self) -> Option<Headers> {
        let mut headers = Headers::new();
        headers.insert("Content-Length".to_string(), self.data.len().to_string());
        Some(headers)
    }

    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.sent || self.data.is_empty() {
            return Ok(None);
        }
        self.sent = true;
        Ok(Some(self.data.clone()))
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }
}

/// Streams a file from disk in bounded chunks.
///
/// The file is opened on [`connect`](BodyProducer::connect) and closed on
/// [`disconnect`](BodyProducer::disconnect).
#[derive(Debug)]
pub struct FileProducer {
    path: PathBuf,
    len: u64,
    chunk_size: usize,
    file: Option<File>,
}

impl FileProducer {
    /// `len` is reported as `Content-Length`; it should come from the
    /// file's metadata.
    pub fn new(path: impl Into<PathBuf>, len: u64) -> Self {
        Self {
            path: path.into(),
            len,
            chunk_size: FILE_CHUNK_SIZE,
            file: None,
        }
    }

    /// Builds a producer from the file's current metadata.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
        }
        Ok(Self::new(path, meta.len()))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_length(&self) -> u64 {
        self.len
    }
}

#[async_trait]
impl BodyProducer for FileProducer {
    fn is_connected(&self) -> bool {
        self.file.is_some()
    }

    async fn connect(&mut self, request: Option<&Request>) -> io::Result<()> {
        tracing::trace!(
            connection = ?request.map(|r| r.connection),
            path = %self.path.display(),
            "Opening file body"
        );
        self.file = Some(File::open(&self.path).await?);
        Ok(())
    }

    fn additional_headers(&self) -> Option<Headers> {
        let mut headers = Headers::new();
        headers.insert("Content-Length".to_string(), self.len.to_string());
        headers.insert(
            "Content-Type".to_string(),
            mime::from_path(&self.path).to_string(),
        );
        Some(headers)
    }

    async fn read_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "file not opened"))?;

        let mut chunk = BytesMut::with_capacity(self.chunk_size);
        let n = file.read_buf(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(chunk.freeze()))
    }

    async fn disconnect(&mut self) {
        self.file = None;
    }
}

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ReaderConfig;
use crate::http::handler::Handler;
use crate::http::reader::{ReadEvent, RequestReader};
use crate::http::request::ConnectionId;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// One accepted connection: a single request, a single response, then close.
///
/// ```text
///   Reading ──Complete──▶ handler ──▶ Writing ──▶ Closed
///      │
///      ├──HttpError──▶ error response ──▶ Writing ──▶ Closed
///      └──ConnectionLost──────────────────────────▶ Closed
/// ```
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    id: ConnectionId,
    config: ReaderConfig,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: ReaderConfig) -> Self {
        Self {
            stream,
            id: ConnectionId::next(),
            config,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn run<H>(self, handler: &H) -> anyhow::Result<()>
    where
        H: Handler + ?Sized,
    {
        let reader = RequestReader::with_config(self.stream, self.id, &self.config);
        let (event, stream) = reader.read().await;

        let (request, response) = match event {
            ReadEvent::Complete(request) => {
                let response = handler.handle(&request).await;
                tracing::info!(
                    connection = %self.id,
                    method = %request.method,
                    uri = %request.uri,
                    status = response.status.as_u16(),
                    "Handled request"
                );
                (Some(request), response)
            }
            ReadEvent::HttpError { status, request, .. } => {
                let mut response = Response::error(status);
                if let Some(request) = &request {
                    response.version = request.version;
                }
                (request, response)
            }
            ReadEvent::ConnectionLost => return Ok(()),
        };

        let mut writer = ResponseWriter::new(stream);
        writer.start(request.as_ref(), response).await?;
        Ok(())
    }
}

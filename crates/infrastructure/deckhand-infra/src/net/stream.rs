use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ClientError;

/// What a streaming connection pushes into its consumer's queue.
///
/// The queue sender is dropped when the connection terminates, so a closed
/// queue means "no more frames".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Opened,
    Frame(String),
    Failed(String),
}

/// Handle on an open WebSocket connection.
///
/// The socket itself is driven by a background task; this handle only
/// enqueues outbound text and requests shutdown. Dropping the handle closes
/// the connection.
#[derive(Debug)]
pub struct StreamSession {
    outbound: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
}

impl StreamSession {
    pub fn send(&self, text: impl Into<String>) -> Result<(), ClientError> {
        if self.shutdown.is_cancelled() {
            return Err(ClientError::StreamClosed);
        }
        self.outbound
            .send(text.into())
            .map_err(|_| ClientError::StreamClosed)
    }

    /// Requests a graceful close. Safe to call more than once.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.outbound.is_closed()
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Connects, authenticates with `token` and starts forwarding frames to `events`.
pub(crate) async fn open(
    url: Url,
    token: String,
    events: mpsc::Sender<StreamEvent>,
) -> Result<StreamSession, ClientError> {
    debug!("opening stream {url}");
    let (socket, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
    let (mut sink, mut source) = socket.split();

    sink.send(Message::Text(token)).await?;
    let _ = events.send(StreamEvent::Opened).await;

    let shutdown = CancellationToken::new();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();

    let stop = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                out = outbound_rx.recv() => {
                    let Some(text) = out else {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("stream {url} write failed: {e}");
                        let _ = events.send(StreamEvent::Failed(e.to_string())).await;
                        break;
                    }
                }
                msg = source.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(StreamEvent::Frame(text)).await.is_err() {
                            // Nobody reads this stream any more.
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("stream {url} read failed: {e}");
                        let _ = events.send(StreamEvent::Failed(e.to_string())).await;
                        break;
                    }
                },
            }
        }
        debug!("stream {url} closed");
    });

    Ok(StreamSession { outbound, shutdown })
}

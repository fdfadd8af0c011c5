use std::sync::Arc;

use deckhand_config::FRAME_QUEUE_CAPACITY;
use deckhand_core::ContainerId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app_core::{DomainEvent, Emitter, RunId};
use crate::ports::{RemoteService, StreamEvent};
use crate::session::SessionGuard;
use crate::workflows::describe;

/// A running reader of one container's log stream.
pub struct LogSession {
    container_id: ContainerId,
    run_id: RunId,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl LogSession {
    pub fn spawn<R>(remote: Arc<R>, container_id: ContainerId, out: Emitter) -> Self
    where
        R: RemoteService + ?Sized,
    {
        let run_id: RunId = Uuid::new_v4();
        let token = CancellationToken::new();
        let handle = tokio::spawn(read_logs(
            remote,
            container_id.clone(),
            out,
            token.clone(),
            run_id,
        ));
        Self {
            container_id,
            run_id,
            token,
            handle,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancels the reader. The connection is closed by the time this returns.
    pub async fn close(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(run_id = %self.run_id, "log reader failed: {e}");
        }
    }
}

pub async fn read_logs<R>(
    remote: Arc<R>,
    container_id: ContainerId,
    out: Emitter,
    token: CancellationToken,
    run_id: RunId,
) where
    R: RemoteService + ?Sized,
{
    let (frames_tx, mut frames) = mpsc::channel(FRAME_QUEUE_CAPACITY);

    let opened = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        res = remote.stream_logs(&container_id, frames_tx) => res,
    };
    let mut session = match opened {
        Ok(handle) => SessionGuard::new("logs", handle),
        Err(e) => {
            warn!(%run_id, %container_id, "log stream failed to open: {}", describe(&e));
            out.put(DomainEvent::LogsClosed);
            return;
        }
    };
    debug!(%run_id, %container_id, "log stream open");

    let mut ended = false;
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = frames.recv() => next,
        };
        match next {
            Some(StreamEvent::Frame(line)) => out.put(DomainEvent::AddLog(line)),
            Some(StreamEvent::Opened) => {}
            Some(StreamEvent::Failed(reason)) => {
                warn!(%run_id, %container_id, "log stream failed: {reason}");
                ended = true;
                break;
            }
            None => {
                info!(%run_id, %container_id, "log stream ended");
                ended = true;
                break;
            }
        }
    }

    session.close();
    if ended {
        out.put(DomainEvent::LogsClosed);
    }
}

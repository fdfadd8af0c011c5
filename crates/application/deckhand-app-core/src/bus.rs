//! The long-lived bus reader.
//!
//! One task owns the bus connection. It forks a writer for subscription
//! commands and demultiplexes every inbound frame into an emission until it
//! is told to close or the connection ends. Either way the writer is stopped,
//! the connection is closed and `BusClosed` is emitted, in that order.

use std::sync::Arc;

use deckhand_config::{BUS_COMMAND_CAPACITY, FRAME_QUEUE_CAPACITY};
use deckhand_core::{BusCommand, BusFrame};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::app_core::{AppCommand, Batch, DomainEvent, Emission, Emitter, RunId};
use crate::ports::{RemoteService, SessionHandle, StreamEvent};
use crate::session::SessionGuard;
use crate::workflows::describe;

/// Kernel-side handle on a running bus reader.
pub struct BusHandle {
    run_id: RunId,
    token: CancellationToken,
    commands: mpsc::Sender<BusCommand>,
    handle: JoinHandle<()>,
}

impl BusHandle {
    pub fn spawn<R>(remote: Arc<R>, out: Emitter) -> Self
    where
        R: RemoteService + ?Sized,
    {
        let run_id: RunId = Uuid::new_v4();
        let token = CancellationToken::new();
        let (commands, commands_rx) = mpsc::channel(BUS_COMMAND_CAPACITY);

        let handle = tokio::spawn(read_bus(remote, out, token.clone(), commands_rx, run_id));
        Self {
            run_id,
            token,
            commands,
            handle,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Queues a subscription command. Returns false if it was dropped.
    pub fn send(&self, cmd: BusCommand) -> bool {
        match self.commands.try_send(cmd) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                warn!(run_id = %self.run_id, "bus command queue full, dropping {cmd:?}");
                false
            }
            Err(mpsc::error::TrySendError::Closed(cmd)) => {
                warn!(run_id = %self.run_id, "bus is closed, dropping {cmd:?}");
                false
            }
        }
    }

    /// Signals the reader and waits for its teardown to finish.
    pub async fn close(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(run_id = %self.run_id, "bus task failed: {e}");
        }
    }
}

/// The bus workflow: open, demultiplex until closed, tear down.
pub async fn read_bus<R>(
    remote: Arc<R>,
    out: Emitter,
    token: CancellationToken,
    commands: mpsc::Receiver<BusCommand>,
    run_id: RunId,
) where
    R: RemoteService + ?Sized,
{
    let (frames_tx, mut frames) = mpsc::channel(FRAME_QUEUE_CAPACITY);

    let opened = tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(%run_id, "bus closed while connecting");
            out.put(DomainEvent::BusClosed);
            return;
        }
        res = remote.stream_bus(frames_tx) => res,
    };
    let mut session = match opened {
        Ok(handle) => SessionGuard::new("bus", handle),
        Err(e) => {
            warn!(%run_id, "bus connection failed: {}", describe(&e));
            out.put(DomainEvent::BusClosed);
            return;
        }
    };

    let writer_stop = token.child_token();
    let writer = tokio::spawn(write_bus(session.writer(), commands, writer_stop.clone()));

    let mut acknowledged = false;
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(%run_id, "bus close requested");
                break;
            }
            next = frames.recv() => next,
        };

        match next {
            None => {
                info!(%run_id, "bus connection ended");
                break;
            }
            Some(StreamEvent::Failed(reason)) => {
                warn!(%run_id, "bus connection failed: {reason}");
                break;
            }
            Some(StreamEvent::Opened) => {
                if !acknowledged {
                    acknowledged = true;
                    out.put_all(opened_batch());
                }
            }
            Some(StreamEvent::Frame(raw)) => match BusFrame::parse(&raw) {
                BusFrame::Ready if !acknowledged => {
                    acknowledged = true;
                    out.put_all(opened_batch());
                }
                frame => {
                    if let Some(emission) = demux(frame) {
                        out.put(emission);
                    }
                }
            },
        }
    }

    writer_stop.cancel();
    if let Err(e) = writer.await {
        warn!(%run_id, "bus writer failed: {e}");
    }
    session.close();
    out.put(DomainEvent::BusClosed);
}

fn opened_batch() -> Batch {
    vec![DomainEvent::BusOpened.into(), AppCommand::OpenEvents.into()]
}

/// Maps one classified frame to what it triggers; `None` means ignored.
pub fn demux(frame: BusFrame) -> Option<Emission> {
    match frame {
        BusFrame::Event(_) => Some(AppCommand::FetchContainers.into()),
        BusFrame::Log { text, .. } => Some(DomainEvent::AddLog(text).into()),
        BusFrame::Stat { payload, .. } => Some(DomainEvent::AddStat(payload).into()),
        BusFrame::Ready => {
            trace!("repeated ready frame ignored");
            None
        }
        BusFrame::Malformed { channel, reason } => {
            warn!("dropping malformed {channel} frame: {reason}");
            None
        }
        BusFrame::Unknown { channel } => {
            debug!("ignoring frame on unknown channel {channel:?}");
            None
        }
    }
}

async fn write_bus(
    session: Arc<dyn SessionHandle>,
    mut commands: mpsc::Receiver<BusCommand>,
    stop: CancellationToken,
) {
    loop {
        let cmd = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            cmd = commands.recv() => cmd,
        };
        let Some(cmd) = cmd else { break };

        let frame = cmd.to_frame();
        trace!("bus <- {frame}");
        if let Err(e) = session.send(frame) {
            warn!("bus write failed: {}", describe(&e));
        }
    }
}

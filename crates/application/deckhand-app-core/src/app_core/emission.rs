use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::commands::{AppCommand, IntentKind};
use super::events::DomainEvent;

/// Identifies one workflow instance.
pub type RunId = Uuid;

/// One item a workflow hands back to the kernel: an outcome for the store or
/// a follow-up intent to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Event(DomainEvent),
    Command(AppCommand),
}

impl From<DomainEvent> for Emission {
    fn from(ev: DomainEvent) -> Self {
        Emission::Event(ev)
    }
}

impl From<AppCommand> for Emission {
    fn from(cmd: AppCommand) -> Self {
        Emission::Command(cmd)
    }
}

/// Emissions produced by a single workflow step, applied in order.
pub type Batch = Vec<Emission>;

/// The take-latest instance a batch was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub kind: IntentKind,
    pub run_id: RunId,
}

/// One message on the emission queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// `None` for the stream readers, which are not take-latest.
    pub origin: Option<Origin>,
    pub batch: Batch,
}

/// Sending half of the kernel's emission queue.
///
/// The queue is unbounded so emitting never suspends a workflow; a batch is
/// one message, so its items cannot interleave with another workflow's.
#[derive(Debug, Clone)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<Envelope>,
    origin: Option<Origin>,
}

impl Emitter {
    pub fn channel() -> (Emitter, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Emitter { tx, origin: None }, rx)
    }

    /// An emitter whose batches are stamped with `kind` and `run_id`.
    pub fn for_run(&self, kind: IntentKind, run_id: RunId) -> Emitter {
        Emitter {
            tx: self.tx.clone(),
            origin: Some(Origin { kind, run_id }),
        }
    }

    pub fn put(&self, emission: impl Into<Emission>) {
        self.put_all(vec![emission.into()]);
    }

    pub fn put_all(&self, batch: Batch) {
        if batch.is_empty() {
            return;
        }
        let envelope = Envelope {
            origin: self.origin,
            batch,
        };
        if self.tx.send(envelope).is_err() {
            debug!("kernel gone, emission dropped");
        }
    }
}

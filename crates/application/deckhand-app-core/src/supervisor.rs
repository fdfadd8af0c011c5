use std::collections::HashMap;
use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app_core::{IntentKind, RunId};

struct Slot {
    run_id: RunId,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// One slot per intent kind; starting a kind supersedes its running instance.
#[derive(Default)]
pub struct Supervisor {
    slots: HashMap<IntentKind, Slot>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the running instance of `kind`, waits until it has stopped,
    /// then spawns `work` in its place as `run_id`.
    pub async fn start_latest<F>(&mut self, kind: IntentKind, run_id: RunId, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel(kind).await;

        let token = CancellationToken::new();
        let stop = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = stop.cancelled() => debug!(%run_id, ?kind, "workflow cancelled"),
                _ = work => debug!(%run_id, ?kind, "workflow finished"),
            }
        });

        debug!(%run_id, ?kind, "workflow started");
        self.slots.insert(
            kind,
            Slot {
                run_id,
                token,
                handle,
            },
        );
    }

    /// Stops the instance of `kind`. Returns whether it was still running.
    pub async fn cancel(&mut self, kind: IntentKind) -> bool {
        let Some(slot) = self.slots.remove(&kind) else {
            return false;
        };

        let running = !slot.handle.is_finished();
        if running {
            info!(run_id = %slot.run_id, ?kind, "superseding unfinished workflow");
        }
        slot.token.cancel();
        if let Err(e) = slot.handle.await {
            warn!(run_id = %slot.run_id, ?kind, "workflow task failed: {e}");
        }
        running
    }

    pub async fn cancel_all(&mut self) {
        let kinds: Vec<IntentKind> = self.slots.keys().copied().collect();
        for kind in kinds {
            self.cancel(kind).await;
        }
    }

    pub fn is_running(&self, kind: IntentKind) -> bool {
        self.slots
            .get(&kind)
            .is_some_and(|slot| !slot.handle.is_finished())
    }

    pub fn current_run(&self, kind: IntentKind) -> Option<RunId> {
        self.slots.get(&kind).map(|slot| slot.run_id)
    }
}

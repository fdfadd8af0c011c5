use std::sync::Arc;

use deckhand_core::{BusCommand, ContainerId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app_core::{AppCommand, AppStore, Batch, DomainEvent, Emission, Emitter, Envelope, RunId};
use crate::bus::BusHandle;
use crate::logs::LogSession;
use crate::ports::RemoteService;
use crate::supervisor::Supervisor;
use crate::workflows;

/// Dispatches intents to workflows and folds their emissions into the store.
///
/// Workflows run as tasks on the caller's runtime and report back through a
/// single queue; `step`/`tick` drain it on the caller's task, so the store and
/// the follow-up dispatches are only ever touched from one place.
pub struct AppKernel<R: ?Sized> {
    pub store: AppStore,
    remote: Arc<R>,
    supervisor: Supervisor,
    bus: Option<BusHandle>,
    logs: Option<LogSession>,

    tx: Emitter,
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl<R> AppKernel<R>
where
    R: RemoteService + ?Sized,
{
    pub fn new(store: AppStore, remote: Arc<R>) -> Self {
        let (tx, rx) = Emitter::channel();
        Self {
            store,
            remote,
            supervisor: Supervisor::new(),
            bus: None,
            logs: None,
            tx,
            rx,
        }
    }

    pub async fn dispatch(&mut self, cmd: AppCommand) {
        debug!(?cmd, "dispatch");
        self.store.begin(&cmd);

        match cmd {
            AppCommand::OpenBus => self.open_bus(),
            AppCommand::CloseBus => self.close_bus().await,
            AppCommand::OpenEvents => self.write_bus(BusCommand::SubscribeEvents),
            AppCommand::OpenStats(id) => self.write_bus(BusCommand::SubscribeStats(id)),
            AppCommand::CloseStats(id) => self.write_bus(BusCommand::UnsubscribeStats(id)),
            AppCommand::OpenLogs(id) => self.open_logs(id).await,
            AppCommand::CloseLogs => self.close_logs().await,
            request => {
                let kind = request.kind();
                let run_id = RunId::new_v4();
                let out = self.tx.for_run(kind, run_id);
                if let Some(work) = workflows::workflow_for(&self.remote, request, out) {
                    self.supervisor.start_latest(kind, run_id, work).await;
                }
            }
        }
    }

    /// Waits for the next current batch, applies it and returns it. Batches
    /// of superseded runs are skipped.
    pub async fn step(&mut self) -> Option<Batch> {
        loop {
            let envelope = self.rx.recv().await?;
            if self.is_current(&envelope) {
                self.apply(&envelope.batch).await;
                return Some(envelope.batch);
            }
        }
    }

    /// Applies every current batch already queued. Returns how many there were.
    pub async fn tick(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            if self.is_current(&envelope) {
                self.apply(&envelope.batch).await;
                applied += 1;
            }
        }
        applied
    }

    /// Steps until an outcome matching `pred` has been applied.
    pub async fn run_until<F>(&mut self, mut pred: F) -> Option<DomainEvent>
    where
        F: FnMut(&DomainEvent) -> bool,
    {
        loop {
            let batch = self.step().await?;
            let hit = batch.into_iter().find_map(|emission| match emission {
                Emission::Event(ev) if pred(&ev) => Some(ev),
                _ => None,
            });
            if hit.is_some() {
                return hit;
            }
        }
    }

    /// Cancels all workflows and closes both streams. Outcomes still queued
    /// are applied; follow-up intents are not dispatched any more.
    pub async fn shutdown(&mut self) {
        // Sorted out while the slots still say which runs are current.
        let mut queued: Vec<Envelope> = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            if self.is_current(&envelope) {
                queued.push(envelope);
            }
        }

        self.supervisor.cancel_all().await;
        self.close_logs().await;
        self.close_bus().await;

        while let Ok(envelope) = self.rx.try_recv() {
            queued.push(envelope);
        }
        for envelope in queued {
            for emission in envelope.batch {
                if let Emission::Event(ev) = emission {
                    self.store.apply(ev);
                }
            }
        }
        info!("kernel shut down");
    }

    pub fn sender(&self) -> Emitter {
        self.tx.clone()
    }

    pub fn bus_is_open(&self) -> bool {
        self.bus.as_ref().is_some_and(BusHandle::is_running)
    }

    pub fn log_session(&self) -> Option<&str> {
        self.logs
            .as_ref()
            .filter(|session| session.is_running())
            .map(LogSession::container_id)
    }

    /// A take-latest batch counts only while its run holds the kind's slot.
    fn is_current(&self, envelope: &Envelope) -> bool {
        let Some(origin) = envelope.origin else {
            return true;
        };
        match self.supervisor.current_run(origin.kind) {
            Some(run_id) if run_id != origin.run_id => {
                debug!(
                    run_id = %origin.run_id,
                    kind = ?origin.kind,
                    "dropping superseded batch"
                );
                false
            }
            _ => true,
        }
    }

    async fn apply(&mut self, batch: &Batch) {
        for emission in batch {
            match emission {
                Emission::Event(ev) => self.store.apply(ev.clone()),
                Emission::Command(cmd) => self.dispatch(cmd.clone()).await,
            }
        }
    }

    fn open_bus(&mut self) {
        if self.bus_is_open() {
            debug!("bus already open");
            return;
        }
        let bus = BusHandle::spawn(self.remote.clone(), self.tx.clone());
        info!(run_id = %bus.run_id(), "bus opening");
        self.bus = Some(bus);
    }

    async fn close_bus(&mut self) {
        if let Some(bus) = self.bus.take() {
            bus.close().await;
        }
    }

    fn write_bus(&mut self, cmd: BusCommand) {
        match self.bus.as_ref().filter(|bus| bus.is_running()) {
            Some(bus) => {
                bus.send(cmd);
            }
            None => warn!("no bus open, dropping {cmd:?}"),
        }
    }

    async fn open_logs(&mut self, id: ContainerId) {
        self.close_logs().await;
        let session = LogSession::spawn(self.remote.clone(), id, self.tx.clone());
        info!(
            run_id = %session.run_id(),
            container_id = %session.container_id(),
            "log stream opening"
        );
        self.logs = Some(session);
    }

    async fn close_logs(&mut self) {
        if let Some(session) = self.logs.take() {
            session.close().await;
        }
    }
}

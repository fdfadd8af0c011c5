#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use deckhand_app_core::{Emission, Envelope, RemoteService, SessionHandle, StreamEvent};
use deckhand_core::{
    ContainerAction, ContainerDetail, ContainerSummary, HostInfo, ServiceSummary, SwarmInfo,
};
use tokio::sync::{mpsc, oneshot, Notify};

/// Connection double that counts how often it was closed.
#[derive(Clone, Default)]
pub struct FakeSession {
    closes: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl SessionHandle for FakeSession {
    fn send(&self, text: String) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripted remote service.
///
/// Every call is recorded. Calls succeed with canned data unless `fail_with`
/// is set. `authenticate` can be held on a gate per username; the gate's
/// value decides the outcome.
#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<String>>,
    called: Notify,
    fail_with: Mutex<Option<String>>,
    login_gates: Mutex<HashMap<String, oneshot::Receiver<Result<(), String>>>>,
    pub host: Mutex<HostInfo>,
    pub containers: Mutex<Vec<ContainerSummary>>,

    pub bus: FakeSession,
    bus_feed: Mutex<Option<mpsc::Sender<StreamEvent>>>,
    bus_opened: Notify,
    pub logs: FakeSession,
    logs_feed: Mutex<Option<mpsc::Sender<StreamEvent>>>,
    logs_opened: Notify,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let remote = Self::default();
        *remote.fail_with.lock().unwrap() = Some(message.to_string());
        Arc::new(remote)
    }

    pub fn swarm() -> Arc<Self> {
        let remote = Self::default();
        *remote.host.lock().unwrap() = HostInfo {
            swarm: Some(SwarmInfo {
                node_id: "node-1".into(),
                local_node_state: "active".into(),
            }),
            ..HostInfo::default()
        };
        Arc::new(remote)
    }

    pub fn gate_login(&self, username: &str) -> oneshot::Sender<Result<(), String>> {
        let (tx, rx) = oneshot::channel();
        self.login_gates
            .lock()
            .unwrap()
            .insert(username.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Waits until at least `n` calls were made.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.called.notified();
            if self.calls.lock().unwrap().len() >= n {
                return;
            }
            notified.await;
        }
    }

    /// Waits for the bus to be opened and hands over the only sender feeding
    /// it; dropping it ends the connection.
    pub async fn bus_feed(&self) -> mpsc::Sender<StreamEvent> {
        loop {
            let notified = self.bus_opened.notified();
            if let Some(feed) = self.bus_feed.lock().unwrap().take() {
                return feed;
            }
            notified.await;
        }
    }

    pub async fn logs_feed(&self) -> mpsc::Sender<StreamEvent> {
        loop {
            let notified = self.logs_opened.notified();
            if let Some(feed) = self.logs_feed.lock().unwrap().take() {
                return feed;
            }
            notified.await;
        }
    }

    fn record(&self, call: String) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        self.called.notify_waiters();
        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn authenticate(&self, username: &str, _password: &str) -> anyhow::Result<String> {
        self.record(format!("authenticate {username}"))?;
        let gate = self.login_gates.lock().unwrap().remove(username);
        if let Some(gate) = gate {
            match gate.await {
                Ok(Ok(())) => {}
                Ok(Err(message)) => return Err(anyhow!(message)),
                Err(_) => return Err(anyhow!("gate dropped")),
            }
        }
        Ok(format!("token-{username}"))
    }

    async fn authenticate_github(&self, state: &str, code: &str) -> anyhow::Result<String> {
        self.record(format!("authenticate_github {state} {code}"))?;
        Ok(format!("GitHub token-{code}"))
    }

    async fn revoke_auth(&self) -> anyhow::Result<()> {
        self.record("revoke_auth".into())
    }

    async fn list_containers(&self) -> anyhow::Result<Vec<ContainerSummary>> {
        self.record("list_containers".into())?;
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn get_container(&self, id: &str) -> anyhow::Result<ContainerDetail> {
        self.record(format!("get_container {id}"))?;
        Ok(ContainerDetail {
            id: id.to_string(),
            ..ContainerDetail::default()
        })
    }

    async fn perform_action(&self, action: ContainerAction, id: &str) -> anyhow::Result<()> {
        self.record(format!("perform_action {action} {id}"))
    }

    async fn create_container(&self, name: &str, _file: &str) -> anyhow::Result<()> {
        self.record(format!("create_container {name}"))
    }

    async fn host_info(&self) -> anyhow::Result<HostInfo> {
        self.record("host_info".into())?;
        Ok(self.host.lock().unwrap().clone())
    }

    async fn list_services(&self) -> anyhow::Result<Vec<ServiceSummary>> {
        self.record("list_services".into())?;
        Ok(Vec::new())
    }

    async fn stream_bus(
        &self,
        events: mpsc::Sender<StreamEvent>,
    ) -> anyhow::Result<Box<dyn SessionHandle>> {
        self.record("stream_bus".into())?;
        *self.bus_feed.lock().unwrap() = Some(events);
        self.bus_opened.notify_waiters();
        Ok(Box::new(self.bus.clone()))
    }

    async fn stream_logs(
        &self,
        id: &str,
        events: mpsc::Sender<StreamEvent>,
    ) -> anyhow::Result<Box<dyn SessionHandle>> {
        self.record(format!("stream_logs {id}"))?;
        *self.logs_feed.lock().unwrap() = Some(events);
        self.logs_opened.notify_waiters();
        Ok(Box::new(self.logs.clone()))
    }
}

pub fn frame(text: &str) -> StreamEvent {
    StreamEvent::Frame(text.to_string())
}

/// Flattens every batch already queued.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Vec<Emission> {
    let mut out = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        out.extend(envelope.batch);
    }
    out
}

/// Lets spawned tasks run until the runtime has nothing left to do now.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

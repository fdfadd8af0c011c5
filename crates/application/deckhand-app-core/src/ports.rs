use async_trait::async_trait;
use deckhand_core::{ContainerAction, ContainerDetail, ContainerSummary, HostInfo, ServiceSummary};
use tokio::sync::mpsc;

pub use deckhand_infra::StreamEvent;

/// Remote management API as seen by the workflows.
#[async_trait]
pub trait RemoteService: Send + Sync + 'static {
    async fn authenticate(&self, username: &str, password: &str) -> anyhow::Result<String>;
    /// Exchanges a GitHub OAuth redirect for a session token.
    async fn authenticate_github(&self, state: &str, code: &str) -> anyhow::Result<String>;
    async fn revoke_auth(&self) -> anyhow::Result<()>;

    async fn list_containers(&self) -> anyhow::Result<Vec<ContainerSummary>>;
    async fn get_container(&self, id: &str) -> anyhow::Result<ContainerDetail>;
    async fn perform_action(&self, action: ContainerAction, id: &str) -> anyhow::Result<()>;
    async fn create_container(&self, name: &str, file: &str) -> anyhow::Result<()>;

    async fn host_info(&self) -> anyhow::Result<HostInfo>;
    async fn list_services(&self) -> anyhow::Result<Vec<ServiceSummary>>;

    /// Opens the multiplexed bus. Inbound frames are pushed into `events`;
    /// the sender is dropped when the connection ends.
    async fn stream_bus(
        &self,
        events: mpsc::Sender<StreamEvent>,
    ) -> anyhow::Result<Box<dyn SessionHandle>>;

    async fn stream_logs(
        &self,
        id: &str,
        events: mpsc::Sender<StreamEvent>,
    ) -> anyhow::Result<Box<dyn SessionHandle>>;
}

/// An open streaming connection.
pub trait SessionHandle: Send + Sync {
    fn send(&self, text: String) -> anyhow::Result<()>;
    fn close(&self);
}

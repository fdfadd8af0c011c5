use async_trait::async_trait;
use deckhand_core::{ContainerAction, ContainerDetail, ContainerSummary, HostInfo, ServiceSummary};
use deckhand_infra::{DockerClient, StreamSession};
use tokio::sync::mpsc;

use crate::ports::{RemoteService, SessionHandle, StreamEvent};

#[async_trait]
impl RemoteService for DockerClient {
    async fn authenticate(&self, username: &str, password: &str) -> anyhow::Result<String> {
        Ok(DockerClient::authenticate(self, username, password).await?)
    }

    async fn authenticate_github(&self, state: &str, code: &str) -> anyhow::Result<String> {
        Ok(DockerClient::authenticate_github(self, state, code).await?)
    }

    async fn revoke_auth(&self) -> anyhow::Result<()> {
        Ok(DockerClient::revoke_auth(self).await?)
    }

    async fn list_containers(&self) -> anyhow::Result<Vec<ContainerSummary>> {
        Ok(DockerClient::list_containers(self).await?)
    }

    async fn get_container(&self, id: &str) -> anyhow::Result<ContainerDetail> {
        Ok(DockerClient::get_container(self, id).await?)
    }

    async fn perform_action(&self, action: ContainerAction, id: &str) -> anyhow::Result<()> {
        Ok(DockerClient::perform_action(self, action, id).await?)
    }

    async fn create_container(&self, name: &str, file: &str) -> anyhow::Result<()> {
        Ok(DockerClient::create_container(self, name, file).await?)
    }

    async fn host_info(&self) -> anyhow::Result<HostInfo> {
        Ok(DockerClient::host_info(self).await?)
    }

    async fn list_services(&self) -> anyhow::Result<Vec<ServiceSummary>> {
        Ok(DockerClient::list_services(self).await?)
    }

    async fn stream_bus(
        &self,
        events: mpsc::Sender<StreamEvent>,
    ) -> anyhow::Result<Box<dyn SessionHandle>> {
        let session = DockerClient::stream_bus(self, events).await?;
        Ok(Box::new(session))
    }

    async fn stream_logs(
        &self,
        id: &str,
        events: mpsc::Sender<StreamEvent>,
    ) -> anyhow::Result<Box<dyn SessionHandle>> {
        let session = DockerClient::stream_logs(self, id, events).await?;
        Ok(Box::new(session))
    }
}

impl SessionHandle for StreamSession {
    fn send(&self, text: String) -> anyhow::Result<()> {
        Ok(StreamSession::send(self, text)?)
    }

    fn close(&self) {
        StreamSession::close(self)
    }
}

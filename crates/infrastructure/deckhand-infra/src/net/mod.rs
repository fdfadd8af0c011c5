use deckhand_config::GITHUB_AUTH_SCHEME;
use deckhand_core::{ContainerAction, ContainerDetail, ContainerSummary, HostInfo, ServiceSummary};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info};

use crate::auth::{basic_token, TokenStore};
use crate::config::ClientConfig;
use crate::error::ClientError;

pub mod stream;

use stream::{StreamEvent, StreamSession};

/// Listing endpoints wrap their rows in a `results` envelope.
#[derive(Debug, Deserialize)]
struct Results<T> {
    results: Vec<T>,
}

/// Client for the container management API.
///
/// Clones share the HTTP connection pool and the token store, so a login
/// performed through one clone authenticates every other.
#[derive(Debug, Clone)]
pub struct DockerClient {
    http: Client,
    config: ClientConfig,
    auth: TokenStore,
}

impl DockerClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().build()?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: ClientConfig) -> Self {
        Self {
            http,
            config,
            auth: TokenStore::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.auth
    }

    /// Validates the credentials against the API and stores the resulting token.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let token = basic_token(username, password);
        let url = endpoint(&self.config.api_url, &["auth"], false)?;

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, &token)
            .send()
            .await?;
        check_status(resp).await?;

        self.auth.set(token.clone());
        info!("authenticated as {username}");
        Ok(token)
    }

    /// Trades the `state`/`code` pair of a GitHub OAuth redirect for an
    /// access token and stores it.
    pub async fn authenticate_github(
        &self,
        state: &str,
        code: &str,
    ) -> Result<String, ClientError> {
        let mut url = endpoint(&self.config.api_url, &["auth", "github"], false)?;
        url.query_pairs_mut()
            .append_pair("state", state)
            .append_pair("code", code);

        let resp = self.http.get(url).send().await?;
        let body = check_status(resp).await?.text().await?;
        let access_token = body.trim();
        if access_token.is_empty() {
            return Err(ClientError::EmptyToken);
        }

        let token = format!("{GITHUB_AUTH_SCHEME} {access_token}");
        self.auth.set(token.clone());
        info!("authenticated through GitHub");
        Ok(token)
    }

    pub async fn revoke_auth(&self) -> Result<(), ClientError> {
        self.auth.clear();
        info!("auth token dropped");
        Ok(())
    }

    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>, ClientError> {
        let url = endpoint(&self.config.api_url, &["containers"], false)?;
        let page: Results<ContainerSummary> = self.get_json(url).await?;
        Ok(page.results)
    }

    pub async fn get_container(&self, id: &str) -> Result<ContainerDetail, ClientError> {
        let url = endpoint(&self.config.api_url, &["containers", id], true)?;
        self.get_json(url).await
    }

    pub async fn perform_action(
        &self,
        action: ContainerAction,
        id: &str,
    ) -> Result<(), ClientError> {
        let token = self.token()?;
        let req = match action {
            ContainerAction::Start | ContainerAction::Stop | ContainerAction::Restart => {
                let segments = ["containers", id, action.as_str()];
                let url = endpoint(&self.config.api_url, &segments, false)?;
                self.http.post(url)
            }
            ContainerAction::Delete => {
                let url = endpoint(&self.config.api_url, &["containers", id], true)?;
                self.http.delete(url)
            }
            ContainerAction::Infos => {
                let url = endpoint(&self.config.api_url, &["containers", id], true)?;
                self.http.get(url)
            }
        };

        debug!(%action, id, "container action");
        let resp = req.header(AUTHORIZATION, token).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Deploys a compose file under the given project name.
    pub async fn create_container(
        &self,
        name: &str,
        compose_file: &str,
    ) -> Result<(), ClientError> {
        let token = self.token()?;
        let url = endpoint(&self.config.api_url, &["containers", name], true)?;
        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, token)
            .body(compose_file.to_string())
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn host_info(&self) -> Result<HostInfo, ClientError> {
        let url = endpoint(&self.config.api_url, &["info"], false)?;
        self.get_json(url).await
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceSummary>, ClientError> {
        let url = endpoint(&self.config.api_url, &["services"], false)?;
        let page: Results<ServiceSummary> = self.get_json(url).await?;
        Ok(page.results)
    }

    /// Opens the multiplexed bus carrying `events`, `logs` and `stats` frames.
    pub async fn stream_bus(
        &self,
        events: Sender<StreamEvent>,
    ) -> Result<StreamSession, ClientError> {
        let token = self.token()?;
        let url = endpoint(&self.config.ws_url, &["bus"], false)?;
        stream::open(url, token, events).await
    }

    /// Opens the dedicated log stream of one container.
    pub async fn stream_logs(
        &self,
        id: &str,
        events: Sender<StreamEvent>,
    ) -> Result<StreamSession, ClientError> {
        let token = self.token()?;
        let url = endpoint(&self.config.ws_url, &["containers", id, "logs"], false)?;
        stream::open(url, token, events).await
    }

    fn token(&self) -> Result<String, ClientError> {
        self.auth.get().ok_or(ClientError::NotAuthenticated)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let token = self.token()?;
        let resp = self.http.get(url).header(AUTHORIZATION, token).send().await?;
        let bytes = check_status(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Appends path segments to a base url, keeping any base path.
pub(crate) fn endpoint(
    base: &Url,
    segments: &[&str],
    trailing_slash: bool,
) -> Result<Url, ClientError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(base.to_string()))?;
        path.pop_if_empty();
        path.extend(segments);
        if trailing_slash {
            path.push("");
        }
    }
    Ok(url)
}

async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("request failed").to_string(),
        text => text.to_string(),
    };
    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

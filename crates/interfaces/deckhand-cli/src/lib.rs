pub mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use deckhand_app_core::{AppCommand, AppKernel, AppStore, Credentials};
use deckhand_config::{
    DEFAULT_API_URL, DEFAULT_WS_URL, ENV_API_URL, ENV_PASSWORD, ENV_USER, ENV_WS_URL,
};
use deckhand_infra::{ClientConfig, DockerClient};

pub type Kernel = AppKernel<DockerClient>;

/// Where the management API lives and who to log in as.
#[derive(Args, Clone)]
pub struct ConnectArgs {
    #[arg(long, env = ENV_API_URL, default_value = DEFAULT_API_URL)]
    pub api_url: String,
    #[arg(long, env = ENV_WS_URL, default_value = DEFAULT_WS_URL)]
    pub ws_url: String,
    #[arg(short, long, env = ENV_USER)]
    pub user: String,
    #[arg(short, long, env = ENV_PASSWORD, hide_env_values = true)]
    pub password: String,
}

/// Builds a kernel on a fresh client and logs in.
pub async fn connect(args: &ConnectArgs) -> anyhow::Result<Kernel> {
    let config = ClientConfig::new(&args.api_url, &args.ws_url)?;
    let client = DockerClient::new(config).context("Failed to build HTTP client")?;
    let mut kernel = AppKernel::new(AppStore::default(), Arc::new(client));

    commands::request(
        &mut kernel,
        AppCommand::Login(Credentials::new(&args.user, &args.password)),
    )
    .await
    .context("login failed")?;
    Ok(kernel)
}

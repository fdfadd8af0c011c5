use deckhand_config::{DEFAULT_API_URL, DEFAULT_WS_URL};
use reqwest::Url;

use crate::error::ClientError;

/// Endpoints of the management API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub ws_url: Url,
}

impl ClientConfig {
    pub fn new(api_url: &str, ws_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            api_url: parse_base(api_url)?,
            ws_url: parse_base(ws_url)?,
        })
    }

    pub fn defaults() -> Result<Self, ClientError> {
        Self::new(DEFAULT_API_URL, DEFAULT_WS_URL)
    }
}

fn parse_base(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl(format!("{raw}: not a base url")));
    }
    Ok(url)
}

use std::collections::HashMap;

use deckhand_core::{ContainerDetail, ContainerSummary, HostInfo, ServiceSummary};

use crate::app_core::IntentKind;

pub use deckhand_core::Route;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub route: Route,
    pub logged_in: bool,
    /// In-flight call-bearing intents.
    pub pending: HashMap<IntentKind, bool>,
    /// Message of the most recent failure outcome.
    pub error: Option<String>,

    pub containers: Vec<ContainerSummary>,
    pub container: Option<ContainerDetail>,
    pub info: Option<HostInfo>,
    pub services: Vec<ServiceSummary>,

    pub bus_open: bool,
    pub logs: Vec<String>,
    pub stats: Vec<serde_json::Value>,
}

impl AppState {
    pub fn is_pending(&self, kind: IntentKind) -> bool {
        self.pending.get(&kind).copied().unwrap_or(false)
    }
}

use deckhand_core::{ContainerDetail, ContainerSummary, HostInfo, Route, ServiceSummary};

use super::commands::IntentKind;

/// Outcomes produced by workflows and the stream readers.
///
/// Failure payloads are already rendered, human-readable messages.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    LoginSucceeded,
    LoginFailed(String),
    LogoutSucceeded,
    LogoutFailed(String),

    FetchContainersSucceeded(Vec<ContainerSummary>),
    FetchContainersFailed(String),
    FetchContainerSucceeded(ContainerDetail),
    FetchContainerFailed(String),
    ActionContainerSucceeded,
    ActionContainerFailed(String),
    ComposeSucceeded,
    ComposeFailed(String),

    InfoSucceeded(HostInfo),
    InfoFailed(String),
    FetchServicesSucceeded(Vec<ServiceSummary>),
    FetchServicesFailed(String),

    BusOpened,
    BusClosed,
    /// The log stream ended on its own; `CloseLogs` does not produce this.
    LogsClosed,
    AddLog(String),
    AddStat(serde_json::Value),

    RouteChanged(Route),
}

impl DomainEvent {
    /// The intent kind whose pending flag this outcome clears.
    pub fn settles(&self) -> Option<IntentKind> {
        use DomainEvent::*;
        let kind = match self {
            LoginSucceeded | LoginFailed(_) => IntentKind::Login,
            LogoutSucceeded | LogoutFailed(_) => IntentKind::Logout,
            FetchContainersSucceeded(_) | FetchContainersFailed(_) => IntentKind::FetchContainers,
            FetchContainerSucceeded(_) | FetchContainerFailed(_) => IntentKind::FetchContainer,
            ActionContainerSucceeded | ActionContainerFailed(_) => IntentKind::ActionContainer,
            ComposeSucceeded | ComposeFailed(_) => IntentKind::Compose,
            InfoSucceeded(_) | InfoFailed(_) => IntentKind::Info,
            FetchServicesSucceeded(_) | FetchServicesFailed(_) => IntentKind::FetchServices,
            BusOpened | BusClosed | LogsClosed | AddLog(_) | AddStat(_) | RouteChanged(_) => {
                return None
            }
        };
        Some(kind)
    }

    pub fn failure(&self) -> Option<&str> {
        use DomainEvent::*;
        match self {
            LoginFailed(reason)
            | LogoutFailed(reason)
            | FetchContainersFailed(reason)
            | FetchContainerFailed(reason)
            | ActionContainerFailed(reason)
            | ComposeFailed(reason)
            | InfoFailed(reason)
            | FetchServicesFailed(reason) => Some(reason),
            _ => None,
        }
    }
}

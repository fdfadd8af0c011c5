use std::fmt;

use deckhand_core::{ContainerAction, ContainerId};

/// Username and password for LOGIN. The password never shows up in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Intents accepted by the kernel, from the user or from other workflows.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    // Session
    Login(Credentials),
    /// Completes a GitHub OAuth redirect; `redirect` is where to go afterwards.
    GithubLogin {
        state: String,
        code: String,
        redirect: Option<String>,
    },
    Logout,

    // Containers
    FetchContainers,
    FetchContainer(ContainerId),
    ActionContainer {
        action: ContainerAction,
        id: ContainerId,
    },
    Compose {
        name: String,
        file: String,
    },

    // Host
    Info,
    FetchServices,

    // Bus
    OpenBus,
    CloseBus,
    OpenEvents,
    OpenStats(ContainerId),
    CloseStats(ContainerId),

    // Per-container log stream
    OpenLogs(ContainerId),
    CloseLogs,
}

impl AppCommand {
    pub fn kind(&self) -> IntentKind {
        match self {
            // Both login flows share one slot and one pending flag.
            AppCommand::Login(_) | AppCommand::GithubLogin { .. } => IntentKind::Login,
            AppCommand::Logout => IntentKind::Logout,
            AppCommand::FetchContainers => IntentKind::FetchContainers,
            AppCommand::FetchContainer(_) => IntentKind::FetchContainer,
            AppCommand::ActionContainer { .. } => IntentKind::ActionContainer,
            AppCommand::Compose { .. } => IntentKind::Compose,
            AppCommand::Info => IntentKind::Info,
            AppCommand::FetchServices => IntentKind::FetchServices,
            AppCommand::OpenBus => IntentKind::OpenBus,
            AppCommand::CloseBus => IntentKind::CloseBus,
            AppCommand::OpenEvents => IntentKind::OpenEvents,
            AppCommand::OpenStats(_) => IntentKind::OpenStats,
            AppCommand::CloseStats(_) => IntentKind::CloseStats,
            AppCommand::OpenLogs(_) => IntentKind::OpenLogs,
            AppCommand::CloseLogs => IntentKind::CloseLogs,
        }
    }
}

/// Payload-free discriminant of [`AppCommand`]; keys the pending map and the
/// supervisor slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Login,
    Logout,
    FetchContainers,
    FetchContainer,
    ActionContainer,
    Compose,
    Info,
    FetchServices,
    OpenBus,
    CloseBus,
    OpenEvents,
    OpenStats,
    CloseStats,
    OpenLogs,
    CloseLogs,
}

/// How the kernel runs an intent of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// One remote call; a newer intent of the same kind supersedes the running one.
    TakeLatest,
    /// Starts or stops the long-lived bus reader.
    Bus,
    /// Written to the open bus connection.
    BusWrite,
    /// Starts or stops the per-container log reader.
    LogSession,
}

impl IntentKind {
    pub fn policy(self) -> DispatchPolicy {
        match self {
            IntentKind::Login
            | IntentKind::Logout
            | IntentKind::FetchContainers
            | IntentKind::FetchContainer
            | IntentKind::ActionContainer
            | IntentKind::Compose
            | IntentKind::Info
            | IntentKind::FetchServices => DispatchPolicy::TakeLatest,
            IntentKind::OpenBus | IntentKind::CloseBus => DispatchPolicy::Bus,
            IntentKind::OpenEvents | IntentKind::OpenStats | IntentKind::CloseStats => {
                DispatchPolicy::BusWrite
            }
            IntentKind::OpenLogs | IntentKind::CloseLogs => DispatchPolicy::LogSession,
        }
    }

    /// Kinds that settle with exactly one `…Succeeded` or `…Failed` outcome.
    pub fn is_call_bearing(self) -> bool {
        self.policy() == DispatchPolicy::TakeLatest
    }
}

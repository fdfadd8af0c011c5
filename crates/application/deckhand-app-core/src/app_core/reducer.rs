use crate::domain::AppState;

use super::commands::AppCommand;
use super::events::DomainEvent;

/// Records an intent as it enters the kernel.
pub fn begin(mut state: AppState, cmd: &AppCommand) -> AppState {
    let kind = cmd.kind();
    if kind.is_call_bearing() {
        state.pending.insert(kind, true);
        state.error = None;
    }

    match cmd {
        AppCommand::OpenLogs(_) => state.logs.clear(),
        AppCommand::OpenStats(_) => state.stats.clear(),
        _ => {}
    }
    state
}

pub fn reduce(mut state: AppState, ev: DomainEvent) -> AppState {
    if let Some(kind) = ev.settles() {
        if let Some(flag) = state.pending.get_mut(&kind) {
            *flag = false;
        }
    }
    if let Some(reason) = ev.failure() {
        state.error = Some(reason.to_string());
    }

    match ev {
        DomainEvent::LoginSucceeded => state.logged_in = true,
        DomainEvent::LogoutSucceeded => {
            state.logged_in = false;
            state.containers.clear();
            state.container = None;
            state.info = None;
            state.services.clear();
        }

        DomainEvent::FetchContainersSucceeded(list) => state.containers = list,
        DomainEvent::FetchContainerSucceeded(detail) => state.container = Some(detail),
        DomainEvent::InfoSucceeded(info) => state.info = Some(info),
        DomainEvent::FetchServicesSucceeded(list) => state.services = list,

        DomainEvent::BusOpened => state.bus_open = true,
        DomainEvent::BusClosed => state.bus_open = false,
        DomainEvent::AddLog(line) => state.logs.push(line),
        DomainEvent::AddStat(stat) => state.stats.push(stat),

        DomainEvent::RouteChanged(route) => state.route = route,

        DomainEvent::LoginFailed(_)
        | DomainEvent::LogoutFailed(_)
        | DomainEvent::FetchContainersFailed(_)
        | DomainEvent::FetchContainerFailed(_)
        | DomainEvent::ActionContainerSucceeded
        | DomainEvent::ActionContainerFailed(_)
        | DomainEvent::ComposeSucceeded
        | DomainEvent::ComposeFailed(_)
        | DomainEvent::InfoFailed(_)
        | DomainEvent::FetchServicesFailed(_)
        | DomainEvent::LogsClosed => {}
    }
    state
}

//! Request/response workflows, one per call-bearing intent kind.
//!
//! Each workflow makes one remote call and emits its outcome, plus any
//! follow-up intents, as a single batch. Failures never escape: they are
//! rendered with their full context chain and carried by the `…Failed`
//! outcome.

use std::sync::Arc;

use deckhand_core::{ContainerAction, ContainerId, Route};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;

use crate::app_core::{AppCommand, Credentials, DomainEvent, Emitter};
use crate::ports::RemoteService;

/// Renders an error the way it is shown to the user.
pub fn describe(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

fn failure(kind: &str, err: anyhow::Error) -> String {
    let reason = describe(&err);
    warn!("{kind} failed: {reason}");
    reason
}

/// Builds the task for a take-latest intent; `None` for stream intents.
pub fn workflow_for<R>(
    remote: &Arc<R>,
    cmd: AppCommand,
    out: Emitter,
) -> Option<BoxFuture<'static, ()>>
where
    R: RemoteService + ?Sized,
{
    let remote = remote.clone();
    let task = match cmd {
        AppCommand::Login(credentials) => login(remote, credentials, out).boxed(),
        AppCommand::GithubLogin {
            state,
            code,
            redirect,
        } => github_login(remote, state, code, redirect, out).boxed(),
        AppCommand::Logout => logout(remote, out).boxed(),
        AppCommand::FetchContainers => fetch_containers(remote, out).boxed(),
        AppCommand::FetchContainer(id) => fetch_container(remote, id, out).boxed(),
        AppCommand::ActionContainer { action, id } => {
            action_container(remote, action, id, out).boxed()
        }
        AppCommand::Compose { name, file } => compose(remote, name, file, out).boxed(),
        AppCommand::Info => info(remote, out).boxed(),
        AppCommand::FetchServices => fetch_services(remote, out).boxed(),
        AppCommand::OpenBus
        | AppCommand::CloseBus
        | AppCommand::OpenEvents
        | AppCommand::OpenStats(_)
        | AppCommand::CloseStats(_)
        | AppCommand::OpenLogs(_)
        | AppCommand::CloseLogs => return None,
    };
    Some(task)
}

pub async fn login<R: RemoteService + ?Sized>(
    remote: Arc<R>,
    credentials: Credentials,
    out: Emitter,
) {
    match remote
        .authenticate(&credentials.username, &credentials.password)
        .await
    {
        Ok(_token) => out.put_all(vec![
            DomainEvent::LoginSucceeded.into(),
            DomainEvent::RouteChanged(Route::Containers).into(),
        ]),
        Err(e) => out.put(DomainEvent::LoginFailed(failure("login", e))),
    }
}

/// Finishes a GitHub OAuth round trip, then navigates to `redirect` when it
/// names a known route and to the container list otherwise.
pub async fn github_login<R: RemoteService + ?Sized>(
    remote: Arc<R>,
    state: String,
    code: String,
    redirect: Option<String>,
    out: Emitter,
) {
    match remote.authenticate_github(&state, &code).await {
        Ok(_token) => {
            let route = redirect
                .as_deref()
                .and_then(Route::from_path)
                .unwrap_or(Route::Containers);
            out.put_all(vec![
                DomainEvent::LoginSucceeded.into(),
                DomainEvent::RouteChanged(route).into(),
            ]);
        }
        Err(e) => out.put(DomainEvent::LoginFailed(failure("github login", e))),
    }
}

pub async fn logout<R: RemoteService + ?Sized>(remote: Arc<R>, out: Emitter) {
    match remote.revoke_auth().await {
        Ok(()) => out.put_all(vec![
            DomainEvent::LogoutSucceeded.into(),
            DomainEvent::RouteChanged(Route::Login).into(),
        ]),
        Err(e) => out.put(DomainEvent::LogoutFailed(failure("logout", e))),
    }
}

pub async fn fetch_containers<R: RemoteService + ?Sized>(remote: Arc<R>, out: Emitter) {
    match remote.list_containers().await {
        Ok(list) => out.put(DomainEvent::FetchContainersSucceeded(list)),
        Err(e) => {
            let reason = failure("container listing", e);
            out.put(DomainEvent::FetchContainersFailed(reason));
        }
    }
}

pub async fn fetch_container<R: RemoteService + ?Sized>(
    remote: Arc<R>,
    id: ContainerId,
    out: Emitter,
) {
    match remote.get_container(&id).await {
        Ok(detail) => out.put(DomainEvent::FetchContainerSucceeded(detail)),
        Err(e) => {
            let reason = failure("container inspection", e);
            out.put(DomainEvent::FetchContainerFailed(reason));
        }
    }
}

pub async fn action_container<R: RemoteService + ?Sized>(
    remote: Arc<R>,
    action: ContainerAction,
    id: ContainerId,
    out: Emitter,
) {
    if let Err(e) = remote.perform_action(action, &id).await {
        out.put(DomainEvent::ActionContainerFailed(failure(action.as_str(), e)));
        return;
    }

    if action.keeps_container() {
        out.put_all(vec![
            DomainEvent::ActionContainerSucceeded.into(),
            AppCommand::FetchContainer(id).into(),
        ]);
    } else {
        out.put_all(vec![
            DomainEvent::ActionContainerSucceeded.into(),
            AppCommand::FetchContainers.into(),
            DomainEvent::RouteChanged(Route::Containers).into(),
        ]);
    }
}

pub async fn compose<R: RemoteService + ?Sized>(
    remote: Arc<R>,
    name: String,
    file: String,
    out: Emitter,
) {
    match remote.create_container(&name, &file).await {
        Ok(()) => out.put_all(vec![
            DomainEvent::ComposeSucceeded.into(),
            AppCommand::FetchContainers.into(),
            DomainEvent::RouteChanged(Route::Containers).into(),
        ]),
        Err(e) => out.put(DomainEvent::ComposeFailed(failure("compose", e))),
    }
}

pub async fn info<R: RemoteService + ?Sized>(remote: Arc<R>, out: Emitter) {
    let info = match remote.host_info().await {
        Ok(info) => info,
        Err(e) => {
            out.put(DomainEvent::InfoFailed(failure("host info", e)));
            return;
        }
    };

    let swarm = info.is_swarm_member();
    let mut batch = vec![
        DomainEvent::InfoSucceeded(info).into(),
        AppCommand::OpenBus.into(),
        AppCommand::FetchContainers.into(),
    ];
    if swarm {
        batch.push(AppCommand::FetchServices.into());
    }
    out.put_all(batch);
}

pub async fn fetch_services<R: RemoteService + ?Sized>(remote: Arc<R>, out: Emitter) {
    match remote.list_services().await {
        Ok(list) => out.put(DomainEvent::FetchServicesSucceeded(list)),
        Err(e) => {
            let reason = failure("service listing", e);
            out.put(DomainEvent::FetchServicesFailed(reason));
        }
    }
}

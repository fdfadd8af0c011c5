use std::future::Future;

use anyhow::{bail, Context, Result};
use deckhand_app_core::{AppCommand, AppKernel, DomainEvent, Emission, IntentKind, RemoteService};
use deckhand_core::{
    ContainerAction, ContainerDetail, ContainerId, ContainerSummary, HostInfo, ServiceSummary,
};
use tracing::{info, warn};

/// Dispatches a call-bearing intent and waits for its outcome.
pub async fn request<R>(kernel: &mut AppKernel<R>, cmd: AppCommand) -> Result<DomainEvent>
where
    R: RemoteService + ?Sized,
{
    let kind = cmd.kind();
    kernel.dispatch(cmd).await;
    settle(kernel, kind).await
}

/// Steps the kernel until `kind` settles; a failure outcome becomes an error.
pub async fn settle<R>(kernel: &mut AppKernel<R>, kind: IntentKind) -> Result<DomainEvent>
where
    R: RemoteService + ?Sized,
{
    let ev = kernel
        .run_until(|ev| ev.settles() == Some(kind))
        .await
        .context("kernel stopped before the request settled")?;
    if let Some(reason) = ev.failure() {
        bail!("{reason}");
    }
    Ok(ev)
}

pub async fn list_containers<R>(kernel: &mut AppKernel<R>) -> Result<Vec<ContainerSummary>>
where
    R: RemoteService + ?Sized,
{
    match request(kernel, AppCommand::FetchContainers).await? {
        DomainEvent::FetchContainersSucceeded(list) => Ok(list),
        other => bail!("unexpected outcome {other:?}"),
    }
}

pub async fn inspect<R>(kernel: &mut AppKernel<R>, id: &str) -> Result<ContainerDetail>
where
    R: RemoteService + ?Sized,
{
    match request(kernel, AppCommand::FetchContainer(id.to_string())).await? {
        DomainEvent::FetchContainerSucceeded(detail) => Ok(detail),
        other => bail!("unexpected outcome {other:?}"),
    }
}

/// Runs a lifecycle action and returns the refreshed view: the container
/// itself, or the full listing after a delete.
pub async fn act<R>(
    kernel: &mut AppKernel<R>,
    action: ContainerAction,
    id: &str,
) -> Result<serde_json::Value>
where
    R: RemoteService + ?Sized,
{
    request(
        kernel,
        AppCommand::ActionContainer {
            action,
            id: id.to_string(),
        },
    )
    .await
    .with_context(|| format!("{action} {id}"))?;

    // The follow-up fetch was dispatched together with the outcome.
    let refreshed = if action.keeps_container() {
        settle(kernel, IntentKind::FetchContainer).await?
    } else {
        settle(kernel, IntentKind::FetchContainers).await?
    };
    let value = match refreshed {
        DomainEvent::FetchContainerSucceeded(detail) => serde_json::to_value(detail)?,
        DomainEvent::FetchContainersSucceeded(list) => serde_json::to_value(list)?,
        other => bail!("unexpected outcome {other:?}"),
    };
    Ok(value)
}

pub async fn compose<R>(
    kernel: &mut AppKernel<R>,
    name: &str,
    file: String,
) -> Result<Vec<ContainerSummary>>
where
    R: RemoteService + ?Sized,
{
    request(
        kernel,
        AppCommand::Compose {
            name: name.to_string(),
            file,
        },
    )
    .await
    .with_context(|| format!("compose {name}"))?;

    match settle(kernel, IntentKind::FetchContainers).await? {
        DomainEvent::FetchContainersSucceeded(list) => Ok(list),
        other => bail!("unexpected outcome {other:?}"),
    }
}

pub async fn host_info<R>(kernel: &mut AppKernel<R>) -> Result<HostInfo>
where
    R: RemoteService + ?Sized,
{
    match request(kernel, AppCommand::Info).await? {
        DomainEvent::InfoSucceeded(info) => Ok(info),
        other => bail!("unexpected outcome {other:?}"),
    }
}

pub async fn list_services<R>(kernel: &mut AppKernel<R>) -> Result<Vec<ServiceSummary>>
where
    R: RemoteService + ?Sized,
{
    match request(kernel, AppCommand::FetchServices).await? {
        DomainEvent::FetchServicesSucceeded(list) => Ok(list),
        other => bail!("unexpected outcome {other:?}"),
    }
}

/// Streams a container's log lines into `line` until `stop` resolves or the
/// stream ends.
pub async fn tail_logs<R, F>(
    kernel: &mut AppKernel<R>,
    id: &str,
    stop: F,
    mut line: impl FnMut(&str),
) -> Result<()>
where
    R: RemoteService + ?Sized,
    F: Future<Output = ()>,
{
    kernel.dispatch(AppCommand::OpenLogs(id.to_string())).await;
    tokio::pin!(stop);

    'outer: loop {
        let batch = tokio::select! {
            _ = &mut stop => break,
            batch = kernel.step() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };
        for emission in batch {
            match emission {
                Emission::Event(DomainEvent::AddLog(text)) => line(&text),
                Emission::Event(DomainEvent::LogsClosed) => {
                    warn!("log stream of {id} ended");
                    break 'outer;
                }
                _ => {}
            }
        }
    }

    kernel.dispatch(AppCommand::CloseLogs).await;
    Ok(())
}

/// Opens the bus through INFO and reports bus traffic until `stop`
/// resolves or the bus closes. `stats` containers are subscribed once the
/// bus is up.
pub async fn watch<R, F>(
    kernel: &mut AppKernel<R>,
    stats: &[ContainerId],
    stop: F,
    mut report: impl FnMut(&DomainEvent),
) -> Result<()>
where
    R: RemoteService + ?Sized,
    F: Future<Output = ()>,
{
    request(kernel, AppCommand::Info).await?;
    tokio::pin!(stop);

    'outer: loop {
        let batch = tokio::select! {
            _ = &mut stop => break,
            batch = kernel.step() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };
        for emission in batch {
            let Emission::Event(ev) = emission else {
                continue;
            };
            report(&ev);
            match ev {
                DomainEvent::BusOpened => {
                    for id in stats {
                        kernel.dispatch(AppCommand::OpenStats(id.clone())).await;
                    }
                }
                DomainEvent::BusClosed => {
                    info!("bus closed");
                    break 'outer;
                }
                _ => {}
            }
        }
    }

    if kernel.bus_is_open() {
        for id in stats {
            kernel.dispatch(AppCommand::CloseStats(id.clone())).await;
        }
    }
    kernel.dispatch(AppCommand::CloseBus).await;
    Ok(())
}

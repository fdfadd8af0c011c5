mod common;

use std::time::Duration;

use common::{frame, settle, FakeRemote};
use deckhand_app_core::{
    AppCommand, AppKernel, AppState, AppStore, Credentials, DomainEvent, Emission, IntentKind,
};
use deckhand_core::{ContainerAction, ContainerSummary, Route};

fn kernel(remote: std::sync::Arc<FakeRemote>) -> AppKernel<FakeRemote> {
    AppKernel::new(AppStore::new(AppState::default()), remote)
}

async fn step(k: &mut AppKernel<FakeRemote>) -> Vec<Emission> {
    tokio::time::timeout(Duration::from_secs(1), k.step())
        .await
        .expect("no emission arrived")
        .expect("emission queue closed")
}

#[tokio::test]
async fn superseded_login_never_reports() {
    let remote = FakeRemote::new();
    let release_first = remote.gate_login("first");
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::Login(Credentials::new("first", "pw")))
        .await;
    remote.wait_for_calls(1).await;

    k.dispatch(AppCommand::Login(Credentials::new("second", "pw")))
        .await;

    // The first call settling now has nobody to report to.
    let _ = release_first.send(Err("stale".into()));

    assert_eq!(
        step(&mut k).await,
        vec![
            Emission::Event(DomainEvent::LoginSucceeded),
            Emission::Event(DomainEvent::RouteChanged(Route::Containers)),
        ]
    );
    settle().await;
    assert_eq!(k.tick().await, 0);

    let state = k.store.state();
    assert!(state.logged_in);
    assert_eq!(state.error, None);
    assert!(!state.is_pending(IntentKind::Login));
    assert_eq!(
        remote.calls(),
        vec!["authenticate first", "authenticate second"]
    );
}

#[tokio::test]
async fn queued_outcome_of_a_superseded_login_is_dropped() {
    let remote = FakeRemote::new();
    let release_first = remote.gate_login("first");
    let release_second = remote.gate_login("second");
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::Login(Credentials::new("first", "pw")))
        .await;
    remote.wait_for_calls(1).await;
    release_first.send(Err("bad password".into())).unwrap();
    // The first login has settled; its failure waits in the queue.
    settle().await;

    k.dispatch(AppCommand::Login(Credentials::new("second", "pw")))
        .await;
    remote.wait_for_calls(2).await;

    assert_eq!(k.tick().await, 0);
    let state = k.store.state();
    assert!(state.is_pending(IntentKind::Login));
    assert_eq!(state.error, None);

    release_second.send(Ok(())).unwrap();
    assert_eq!(
        step(&mut k).await,
        vec![
            Emission::Event(DomainEvent::LoginSucceeded),
            Emission::Event(DomainEvent::RouteChanged(Route::Containers)),
        ]
    );
    let state = k.store.state();
    assert!(state.logged_in);
    assert!(!state.is_pending(IntentKind::Login));
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn github_login_supersedes_a_password_login() {
    let remote = FakeRemote::new();
    let _held = remote.gate_login("admin");
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::Login(Credentials::new("admin", "pw")))
        .await;
    remote.wait_for_calls(1).await;
    k.dispatch(AppCommand::GithubLogin {
        state: "xsrf".into(),
        code: "abc".into(),
        redirect: Some("/".into()),
    })
    .await;

    assert_eq!(
        step(&mut k).await,
        vec![
            Emission::Event(DomainEvent::LoginSucceeded),
            Emission::Event(DomainEvent::RouteChanged(Route::Containers)),
        ]
    );
    assert!(k.store.state().logged_in);
    assert!(!k.store.is_pending(IntentKind::Login));
    assert_eq!(
        remote.calls(),
        vec!["authenticate admin", "authenticate_github xsrf abc"]
    );
}

#[tokio::test]
async fn stop_action_refetches_the_container() {
    let remote = FakeRemote::new();
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::ActionContainer {
        action: ContainerAction::Stop,
        id: "c1".into(),
    })
    .await;
    assert!(k.store.is_pending(IntentKind::ActionContainer));

    assert_eq!(
        step(&mut k).await,
        vec![
            Emission::Event(DomainEvent::ActionContainerSucceeded),
            Emission::Command(AppCommand::FetchContainer("c1".into())),
        ]
    );
    assert!(!k.store.is_pending(IntentKind::ActionContainer));
    assert!(k.store.is_pending(IntentKind::FetchContainer));

    let batch = step(&mut k).await;
    assert!(matches!(
        batch.as_slice(),
        [Emission::Event(DomainEvent::FetchContainerSucceeded(detail))] if detail.id == "c1"
    ));
    assert!(!k.store.is_pending(IntentKind::FetchContainer));
    assert_eq!(
        k.store.state().container.map(|c| c.id),
        Some("c1".to_string())
    );
    assert_eq!(remote.calls(), vec!["perform_action stop c1", "get_container c1"]);
}

#[tokio::test]
async fn delete_action_refreshes_the_list() {
    let remote = FakeRemote::new();
    remote.containers.lock().unwrap().push(ContainerSummary {
        id: "c2".into(),
        ..ContainerSummary::default()
    });
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::ActionContainer {
        action: ContainerAction::Delete,
        id: "c1".into(),
    })
    .await;

    let found = tokio::time::timeout(
        Duration::from_secs(1),
        k.run_until(|ev| matches!(ev, DomainEvent::FetchContainersSucceeded(_))),
    )
    .await
    .unwrap();
    assert!(found.is_some());

    let state = k.store.state();
    assert_eq!(state.route, Route::Containers);
    assert_eq!(state.containers.len(), 1);
    assert_eq!(remote.calls(), vec!["perform_action delete c1", "list_containers"]);
}

#[tokio::test]
async fn failure_sets_the_error_banner() {
    let remote = FakeRemote::failing("HTTP 500: Internal Server Error");
    let mut k = kernel(remote);

    k.dispatch(AppCommand::FetchContainers).await;
    step(&mut k).await;

    let state = k.store.state();
    assert_eq!(
        state.error.as_deref(),
        Some("HTTP 500: Internal Server Error")
    );
    assert!(!state.is_pending(IntentKind::FetchContainers));
}

#[tokio::test]
async fn info_opens_the_bus_and_subscribes_to_events() {
    let remote = FakeRemote::swarm();
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::Info).await;
    step(&mut k).await;
    assert!(k.bus_is_open());

    let feed = remote.bus_feed().await;
    feed.send(frame("ready")).await.unwrap();

    let opened = tokio::time::timeout(
        Duration::from_secs(1),
        k.run_until(|ev| *ev == DomainEvent::BusOpened),
    )
    .await
    .unwrap();
    assert!(opened.is_some());
    settle().await;

    assert!(k.store.state().bus_open);
    assert_eq!(remote.bus.sent(), vec!["events start"]);

    let calls = remote.calls();
    assert!(calls.contains(&"list_containers".to_string()));
    assert!(calls.contains(&"list_services".to_string()));

    // A lifecycle event triggers a fresh listing.
    feed.send(frame("events die")).await.unwrap();
    let refreshed = tokio::time::timeout(
        Duration::from_secs(1),
        k.run_until(|ev| matches!(ev, DomainEvent::FetchContainersSucceeded(_))),
    )
    .await
    .unwrap();
    assert!(refreshed.is_some());

    k.dispatch(AppCommand::CloseBus).await;
    k.tick().await;
    assert!(!k.bus_is_open());
    assert!(!k.store.state().bus_open);
    assert_eq!(remote.bus.closes(), 1);
}

#[tokio::test]
async fn second_open_bus_is_ignored() {
    let remote = FakeRemote::new();
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::OpenBus).await;
    let _feed = remote.bus_feed().await;
    k.dispatch(AppCommand::OpenBus).await;
    settle().await;

    assert_eq!(
        remote.calls().iter().filter(|c| *c == "stream_bus").count(),
        1
    );
    k.shutdown().await;
    assert_eq!(remote.bus.closes(), 1);
}

#[tokio::test]
async fn bus_writes_without_a_bus_are_dropped() {
    let remote = FakeRemote::new();
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::OpenStats("c1".into())).await;
    k.dispatch(AppCommand::OpenEvents).await;
    settle().await;

    assert!(remote.calls().is_empty());
    assert!(remote.bus.sent().is_empty());
}

#[tokio::test]
async fn stats_subscription_round_trip() {
    let remote = FakeRemote::new();
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::OpenBus).await;
    let feed = remote.bus_feed().await;
    k.dispatch(AppCommand::OpenStats("c1".into())).await;
    feed.send(frame(r#"stats c1 {"cpu": 3}"#)).await.unwrap();
    settle().await;
    k.tick().await;
    k.dispatch(AppCommand::CloseStats("c1".into())).await;
    settle().await;

    assert_eq!(remote.bus.sent(), vec!["stats c1 start", "stats c1 stop"]);
    assert_eq!(k.store.state().stats, vec![serde_json::json!({ "cpu": 3 })]);
    k.shutdown().await;
}

#[tokio::test]
async fn reopening_logs_replaces_the_session() {
    let remote = FakeRemote::new();
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::OpenLogs("c1".into())).await;
    let feed = remote.logs_feed().await;
    feed.send(frame("from c1")).await.unwrap();
    settle().await;
    k.tick().await;
    assert_eq!(k.store.state().logs, vec!["from c1".to_string()]);

    k.dispatch(AppCommand::OpenLogs("c2".into())).await;
    assert_eq!(remote.logs.closes(), 1);
    assert!(k.store.state().logs.is_empty());

    let _feed = remote.logs_feed().await;
    assert_eq!(k.log_session(), Some("c2"));

    k.dispatch(AppCommand::CloseLogs).await;
    assert_eq!(remote.logs.closes(), 2);
    assert_eq!(k.log_session(), None);
}

#[tokio::test]
async fn shutdown_closes_everything_once() {
    let remote = FakeRemote::new();
    let _gate = remote.gate_login("slow");
    let mut k = kernel(remote.clone());

    k.dispatch(AppCommand::Login(Credentials::new("slow", "pw")))
        .await;
    k.dispatch(AppCommand::OpenBus).await;
    k.dispatch(AppCommand::OpenLogs("c1".into())).await;
    let _bus = remote.bus_feed().await;
    let _logs = remote.logs_feed().await;

    k.shutdown().await;

    assert_eq!(remote.bus.closes(), 1);
    assert_eq!(remote.logs.closes(), 1);
    assert!(!k.store.state().bus_open);
    settle().await;
    assert_eq!(k.tick().await, 0);
}

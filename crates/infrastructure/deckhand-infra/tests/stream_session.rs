use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use deckhand_infra::{basic_token, ClientConfig, ClientError, DockerClient, StreamEvent};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

#[derive(Clone, Default)]
struct Peer {
    received: Arc<Mutex<Vec<String>>>,
    closed: Arc<Notify>,
}

async fn upgrade(ws: WebSocketUpgrade, State(peer): State<Peer>) -> Response {
    ws.on_upgrade(move |socket| serve(socket, peer))
}

async fn serve(mut socket: WebSocket, peer: Peer) {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                peer.received.lock().unwrap().push(text.clone());
                if text.starts_with("Basic ") {
                    let _ = socket.send(Message::Text("ready".into())).await;
                    let _ = socket.send(Message::Text("logs c1 hello".into())).await;
                } else if text == "events start" {
                    let _ = socket.send(Message::Text("events x".into())).await;
                }
            }
            Message::Close(_) => {
                peer.closed.notify_one();
                break;
            }
            _ => {}
        }
    }
}

async fn start_bus_server() -> (SocketAddr, Peer) {
    let peer = Peer::default();
    let app = Router::new()
        .route("/ws/bus", get(upgrade))
        .route("/ws/containers/:id/logs", get(upgrade))
        .with_state(peer.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, peer)
}

fn logged_in_client(addr: SocketAddr) -> DockerClient {
    let cfg = ClientConfig::new(&format!("http://{addr}"), &format!("ws://{addr}/ws")).unwrap();
    let client = DockerClient::new(cfg).unwrap();
    client
        .token_store()
        .set(basic_token("admin", "password"));
    client
}

#[tokio::test]
async fn bus_authenticates_then_forwards_frames_both_ways() {
    let (addr, peer) = start_bus_server().await;
    let client = logged_in_client(addr);

    let (tx, mut rx) = mpsc::channel(16);
    let session = client.stream_bus(tx).await.unwrap();

    assert_eq!(rx.recv().await, Some(StreamEvent::Opened));
    assert_eq!(rx.recv().await, Some(StreamEvent::Frame("ready".into())));
    assert_eq!(
        rx.recv().await,
        Some(StreamEvent::Frame("logs c1 hello".into()))
    );

    session.send("events start").unwrap();
    assert_eq!(rx.recv().await, Some(StreamEvent::Frame("events x".into())));

    session.close();
    tokio::time::timeout(Duration::from_secs(5), peer.closed.notified())
        .await
        .expect("server should observe the close frame");

    // The connection task drops its sender once it stops.
    assert_eq!(
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap(),
        None
    );
    assert!(matches!(
        session.send("late"),
        Err(ClientError::StreamClosed)
    ));

    let received = peer.received.lock().unwrap().clone();
    assert_eq!(received[0], "Basic YWRtaW46cGFzc3dvcmQ=");
    assert_eq!(received[1], "events start");
}

#[tokio::test]
async fn dropping_the_session_closes_the_connection() {
    let (addr, peer) = start_bus_server().await;
    let client = logged_in_client(addr);

    let (tx, mut rx) = mpsc::channel(16);
    let session = client.stream_logs("c1", tx).await.unwrap();
    assert_eq!(rx.recv().await, Some(StreamEvent::Opened));

    drop(session);
    tokio::time::timeout(Duration::from_secs(5), peer.closed.notified())
        .await
        .expect("server should observe the close frame");
}

#[tokio::test]
async fn streaming_requires_login() {
    let cfg = ClientConfig::new("http://127.0.0.1:9", "ws://127.0.0.1:9").unwrap();
    let client = DockerClient::new(cfg).unwrap();
    let (tx, _rx) = mpsc::channel(1);
    assert!(matches!(
        client.stream_bus(tx).await,
        Err(ClientError::NotAuthenticated)
    ));
}

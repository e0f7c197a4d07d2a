use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::*;
use crate::connection::ConnectionPhase;
use crate::session::{SessionError, Snapshot};

/// Minimal backend: answers probes as active and tracks the mode.
async fn spawn_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let mut mode = "idle".to_string();
                while let Some(Ok(frame)) = ws.next().await {
                    let WsMessage::Text(text) = frame else {
                        continue;
                    };
                    let request: Value = serde_json::from_str(text.as_str()).unwrap();
                    let request_id = request["request_id"].clone();
                    let reply = match request["action"].as_str() {
                        Some("get_avatar_status") => {
                            json!({"request_id": request_id, "code": 0, "status": "active"})
                        }
                        Some("get_mode") => {
                            let modes = json!({"current_mode": mode, "all_modes": ["idle", "dance"]});
                            json!({"request_id": request_id, "code": 0, "message": modes.to_string()})
                        }
                        Some("switch_mode") => {
                            mode = request["parameters"].as_str().unwrap().to_string();
                            json!({
                                "request_id": request_id,
                                "code": 0,
                                "message": format!("Successfully switched to mode {mode}"),
                            })
                        }
                        _ => continue,
                    };
                    if ws.send(WsMessage::Text(reply.to_string().into())).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    format!("ws://{addr}")
}

/// Backend that answers nothing and instead pushes `count` mode-switch acks
/// as fast as it can, while still reading whatever the client sends.
async fn spawn_flooding_backend(count: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut write, mut read) = ws.split();
                tokio::spawn(async move { while let Some(Ok(_)) = read.next().await {} });

                let ack = json!({"code": 0, "message": "Successfully switched to mode Dance"}).to_string();
                for _ in 0..count {
                    if write.send(WsMessage::Text(ack.clone().into())).await.is_err() {
                        return;
                    }
                }
            });
        }
    });

    format!("ws://{addr}")
}

async fn wait_until<F>(rx: &mut tokio::sync::watch::Receiver<Snapshot>, pred: F) -> Snapshot
where
    F: FnMut(&Snapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for snapshot")
        .expect("session task stopped")
        .clone()
}

#[tokio::test]
async fn loads_and_learns_modes_from_backend() {
    let url = spawn_backend().await;
    let (client, mut rx) = AvatarClient::start(ClientOptions::new(url));

    let snap = wait_until(&mut rx, |s| s.loaded && s.current_mode.is_some()).await;
    assert_eq!(snap.connection, ConnectionPhase::Open);
    assert_eq!(snap.current_mode.as_deref(), Some("idle"));
    assert_eq!(snap.available_modes, vec!["idle", "dance"]);

    client.shutdown().await;
}

#[tokio::test]
async fn switch_mode_round_trip() {
    let url = spawn_backend().await;
    let (client, mut rx) = AvatarClient::start(ClientOptions::new(url));
    wait_until(&mut rx, |s| s.current_mode.as_deref() == Some("idle")).await;

    client.switch_mode("dance").await.unwrap();
    // The ack triggers a fresh get_mode, which reports the new mode.
    let snap = wait_until(&mut rx, |s| s.current_mode.as_deref() == Some("dance")).await;
    assert_eq!(snap.available_modes, vec!["idle", "dance"]);

    // Already there: accepted without a request.
    client.switch_mode("dance").await.unwrap();

    client.shutdown().await;
}

#[tokio::test]
async fn shutdown_tears_down_and_stops_handles() {
    let url = spawn_backend().await;
    let (client, mut rx) = AvatarClient::start(ClientOptions::new(url));
    wait_until(&mut rx, |s| s.connection == ConnectionPhase::Open).await;

    let handle = client.handle();
    client.shutdown().await;

    assert_eq!(handle.snapshot().connection, ConnectionPhase::TornDown);
    assert_eq!(
        handle.switch_mode("dance").await,
        Err(SessionError::ClientStopped)
    );
}

#[tokio::test]
async fn unreachable_backend_keeps_retrying() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let (client, mut rx) = AvatarClient::start(ClientOptions::new(format!("ws://{addr}")));

    let snap = wait_until(&mut rx, |s| s.connection == ConnectionPhase::Reconnecting).await;
    assert!(!snap.loaded);
    assert_eq!(
        client.switch_mode("dance").await,
        Err(SessionError::ChannelNotOpen)
    );

    client.shutdown().await;
}

#[tokio::test]
async fn publishing_flag_reaches_snapshot() {
    let url = spawn_backend().await;
    let mut options = ClientOptions::new(url);
    options.stream_credentials = true;
    let (client, mut rx) = AvatarClient::start(options);

    client.set_publishing(true).await.unwrap();
    let snap = wait_until(&mut rx, |s| s.publishing).await;
    assert_eq!(snap.scene(), crate::session::Scene::VideoStream);

    client.shutdown().await;
}

#[tokio::test]
async fn shutdown_completes_while_backend_floods_acks() {
    // Every ack makes the session queue a get_mode, far more than any
    // queue capacity between the session task and the socket task.
    let url = spawn_flooding_backend(200_000).await;
    let (client, mut rx) = AvatarClient::start(ClientOptions::new(url));
    wait_until(&mut rx, |s| s.connection == ConnectionPhase::Open).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let handle = client.handle();
    let stopped = tokio::time::timeout(Duration::from_secs(10), client.shutdown()).await;
    assert!(stopped.is_ok(), "session task did not stop under inbound load");
    assert_eq!(handle.snapshot().connection, ConnectionPhase::TornDown);
}

#[tokio::test]
async fn set_publishing_after_shutdown_reports_stopped() {
    let url = spawn_backend().await;
    let (client, _rx) = AvatarClient::start(ClientOptions::new(url));
    let handle = client.handle();
    client.shutdown().await;

    assert_eq!(
        handle.set_publishing(true).await,
        Err(SessionError::ClientStopped)
    );
}

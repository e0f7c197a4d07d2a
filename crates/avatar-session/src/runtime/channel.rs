//! One WebSocket channel: connect, pump frames both ways, report lifecycle.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::connection::ChannelId;
use crate::session::SessionEvent;

/// Run a single channel until it closes or its outbound sender is dropped.
///
/// Lifecycle is reported as [`SessionEvent`]s tagged with `channel`. Dropping
/// the sender half of `outbound_rx` closes the socket without reporting
/// anything, since the session already considers the channel gone.
pub(crate) async fn channel_task(
    channel: ChannelId,
    url: String,
    connect_timeout: Duration,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    info!(channel = %channel, url = %url, "Connecting to avatar backend");

    let ws_stream = match tokio::time::timeout(
        connect_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    )
    .await
    {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            let _ = event_tx
                .send(SessionEvent::ConnectFailed {
                    channel,
                    error: e.to_string(),
                })
                .await;
            return;
        }
        Err(_elapsed) => {
            let _ = event_tx
                .send(SessionEvent::ConnectFailed {
                    channel,
                    error: format!("timed out after {}s", connect_timeout.as_secs()),
                })
                .await;
            return;
        }
    };

    if event_tx
        .send(SessionEvent::ChannelOpened(channel))
        .await
        .is_err()
    {
        return;
    }

    let (mut ws_write, mut ws_read) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            frame = ws_read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let message = SessionEvent::Message {
                        channel,
                        text: text.as_str().to_string(),
                    };
                    if event_tx.send(message).await.is_err() {
                        return;
                    }
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    break frame
                        .map(|f| format!("{} {}", u16::from(f.code), f.reason.as_str()))
                        .unwrap_or_else(|| "closed by peer".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(channel = %channel, error = %e, "WebSocket error");
                    break e.to_string();
                }
                None => break "stream ended".to_string(),
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(json) => {
                    if let Err(e) = ws_write.send(WsMessage::Text(json.into())).await {
                        warn!(channel = %channel, error = %e, "Failed to send avatar message");
                        break e.to_string();
                    }
                }
                None => {
                    debug!(channel = %channel, "Closing avatar channel");
                    let _ = ws_write.send(WsMessage::Close(None)).await;
                    return;
                }
            },
        }
    };

    let _ = event_tx
        .send(SessionEvent::ChannelClosed { channel, reason })
        .await;
}

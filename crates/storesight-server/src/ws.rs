//! WebSocket fan-out of the annotated frame stream.
//!
//! Each viewer gets its own subscription to the frame broadcast; frames go
//! out as text messages carrying the base64 JPEG. There are no acks and no
//! per-viewer flow control: a viewer that cannot keep up skips to the live
//! edge when its subscription lags.

use std::sync::atomic::{AtomicI64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::metrics;
use crate::state::AppState;

static ACTIVE_VIEWERS: AtomicI64 = AtomicI64::new(0);

/// Upgrade handler for `GET /ws`.
///
/// Subscribes before the upgrade completes so the viewer misses at most
/// the frames broadcast during the handshake.
pub async fn ws_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let frames = state.frames.subscribe();
    let shutdown = state.shutdown.clone();

    ws.on_upgrade(move |socket| async move {
        let viewers = ACTIVE_VIEWERS.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_viewer_connection();
        metrics::set_active_viewers(viewers);
        info!("Stream viewer connected ({} active)", viewers);

        handle_stream_socket(socket, frames, shutdown).await;

        let viewers = ACTIVE_VIEWERS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_viewers(viewers);
        info!("Stream viewer disconnected ({} active)", viewers);
    })
}

/// Pump frames at one viewer until it disconnects or the server stops.
async fn handle_stream_socket(
    socket: WebSocket,
    mut frames: broadcast::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(encoded) => {
                    if sender.send(Message::Text(encoded)).await.is_err() {
                        break;
                    }
                    metrics::record_frame_streamed();
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Slow viewer: resume from the live edge.
                    debug!("Stream viewer lagged, skipped {} frames", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                // Viewers only ever close or ping; anything else is ignored.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }
}

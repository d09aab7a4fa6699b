use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use stackfall_core::{PlayerState, SessionId};
use stackfall_core::protocol::ServerMessage;

use crate::dispatch::{self, Dispatched};
use crate::error::DispatchError;
use crate::state::AppState;

/// Top-level WebSocket handler -- spawned per connection.
///
/// The select loop is the only place this session is mutated, so gravity
/// ticks and client intents are applied one at a time.
pub async fn handle_socket(state: Arc<AppState>, mut socket: WebSocket) {
    state.connection_count.fetch_add(1, Ordering::Relaxed);

    let id = state.allocate_session_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.registry.put(PlayerState::new(id), Some(tx.clone()));
    info!("Session {} connected", id);
    let _ = tx.send(ServerMessage::Welcome { session_id: id });

    let mut gravity = gravity_timer(state.config.gravity_interval);

    let mut message_count = 0u32;
    let mut rate_limit_window = Instant::now();
    let mut ended = false;

    loop {
        tokio::select! {
            // Outbound: forward queued ServerMessage to the WebSocket.
            Some(msg) = rx.recv() => {
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            _ = gravity.tick() => {
                let result = dispatch::handle_gravity(&state, id);
                if deliver(&state, &tx, id, result) {
                    ended = true;
                    break;
                }
            }
            // Inbound: read from the WebSocket.
            maybe_msg = socket.recv() => {
                match maybe_msg {
                    Some(Ok(Message::Text(text))) => {
                        let now = Instant::now();
                        if now.duration_since(rate_limit_window) > Duration::from_secs(1) {
                            rate_limit_window = now;
                            message_count = 0;
                        }
                        message_count += 1;
                        if message_count > state.config.rate_limit {
                            if message_count == state.config.rate_limit + 1 {
                                warn!("Session {} rate limited", id);
                            }
                            let _ = tx.send(ServerMessage::Error {
                                message: "Rate limited".into(),
                            });
                            continue;
                        }

                        let result = dispatch::parse_message(&text)
                            .and_then(|msg| dispatch::handle_message(&state, id, msg));
                        if deliver(&state, &tx, id, result) {
                            ended = true;
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        break;
                    }
                    _ => continue,
                }
            }
        }
    }

    if ended {
        // Flush the final GameOver before closing.
        while let Ok(msg) = rx.try_recv() {
            if send_json(&mut socket, &msg).await.is_err() {
                break;
            }
        }
        let _ = socket.send(Message::Close(None)).await;
    }

    if let Some(entry) = state.registry.remove(id) {
        info!(
            "Session {} disconnected with score {} (client reported {:?})",
            id, entry.player.score, entry.reported_score
        );
    } else {
        info!("Session {} closed", id);
    }
    state.connection_count.fetch_sub(1, Ordering::Relaxed);
}

/// First tick one period from now. A late tick pushes the next one back
/// instead of firing a burst.
fn gravity_timer(period: Duration) -> Interval {
    let mut gravity = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    gravity.set_missed_tick_behavior(MissedTickBehavior::Delay);
    gravity
}

async fn send_json(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to encode {:?}: {}", msg, e);
            Ok(())
        }
    }
}

/// Queue the results of a dispatch. Returns true when the session has ended.
fn deliver(
    state: &AppState,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    id: SessionId,
    result: Result<Dispatched, DispatchError>,
) -> bool {
    match result {
        Ok(out) => {
            for msg in out.replies {
                let _ = tx.send(msg);
            }
            if out.leaderboard_changed {
                dispatch::broadcast_leaderboard(state);
            }
            out.ended
        }
        Err(DispatchError::UnknownSession(_)) => {
            debug!("Ignoring message for missing session {}", id);
            false
        }
        Err(DispatchError::Invariant { score, .. }) => {
            let _ = tx.send(ServerMessage::GameOver { score });
            true
        }
        Err(e) => {
            let _ = tx.send(ServerMessage::Error {
                message: e.to_string(),
            });
            false
        }
    }
}

//! WebSocket handler for real-time streaming.
//!
//! Clients connect to `/ws` and receive dashboard changes, Event Grid
//! deliveries and feed snapshots as JSON [`StreamEvent`]s, plus a heartbeat
//! every 5 seconds. Text frames from the client are parsed as
//! [`ClientCommand`]s.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::events::{ClientCommand, StreamEvent};
use super::state::AppState;

const HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// WebSocket upgrade handler, GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut dashboard_rx = state.dashboard.subscribe();
    let mut grid_rx = state.event_grid.subscribe_events();
    let mut voting_rx = state.feeds.voting.watch();
    let mut model_rx = state.feeds.model.watch();
    let mut allocation_rx = state.feeds.allocation.watch();
    let mut system_rx = state.feeds.system.watch();

    debug!("WebSocket client connected");

    let welcome = StreamEvent::Connected {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };
    if sender
        .send(Message::Text(welcome.to_json().into()))
        .await
        .is_err()
    {
        return;
    }

    let mut heartbeat =
        tokio::time::interval(std::time::Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

    // Main loop: forward events, feed changes and heartbeats; handle client messages
    loop {
        let outgoing = tokio::select! {
            event = dashboard_rx.recv() => match event {
                Ok(event) => Some(StreamEvent::Dashboard(event)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging behind dashboard events");
                    None
                }
                Err(RecvError::Closed) => break,
            },
            event = grid_rx.recv() => match event {
                Ok(event) => Some(StreamEvent::GridEvent(event)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging behind Event Grid");
                    None
                }
                Err(RecvError::Closed) => break,
            },
            Some(data) = changed(&mut voting_rx) => Some(StreamEvent::VotingUpdate(data)),
            Some(data) = changed(&mut model_rx) => Some(StreamEvent::ModelUpdate(data)),
            Some(data) = changed(&mut allocation_rx) => Some(StreamEvent::AllocationUpdate(data)),
            Some(data) = changed(&mut system_rx) => Some(StreamEvent::SystemUpdate(data)),
            _ = heartbeat.tick() => Some(StreamEvent::Heartbeat {
                uptime_secs: state.start_time.elapsed().as_secs(),
                simulated_feeds: state.feeds.simulated_count(),
                event_grid_subscriptions: state.event_grid.list_subscriptions(None).len(),
                timestamp: Utc::now(),
            }),
            // Client message (ping/pong, close, or commands)
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                    None
                }
                Some(Ok(Message::Text(text))) => handle_client_message(&state, text.as_str()),
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                _ => None,
            },
        };

        if let Some(event) = outgoing {
            if sender
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    }

    debug!("WebSocket client disconnected");
}

/// Wait for the next snapshot change. Pends forever once the feed is gone.
async fn changed<T: Clone>(rx: &mut watch::Receiver<Option<T>>) -> Option<T> {
    if rx.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
    rx.borrow_and_update().clone()
}

/// Apply a client command. Returns a rejection event to send back, if any;
/// successful commands are reported through the regular change stream.
/// Refreshes run in their own task so the socket keeps streaming meanwhile.
fn handle_client_message(state: &AppState, text: &str) -> Option<StreamEvent> {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            debug!(error = %e, "Ignoring unrecognized WebSocket message");
            return None;
        }
    };
    let action = command.name();

    let outcome = match command {
        ClientCommand::Refresh { section } => {
            let dashboard = state.dashboard.clone();
            tokio::spawn(async move {
                dashboard.refresh_data(section).await;
            });
            Ok(())
        }
        ClientCommand::SetTab { tab } => {
            if veritas_core::is_valid_tab(&tab) {
                state.dashboard.set_active_tab(tab);
                Ok(())
            } else {
                Err(format!("unknown tab: {}", tab))
            }
        }
        ClientCommand::SubmitVote {
            proposal_id,
            support,
            weight,
        } => state
            .feeds
            .voting
            .submit_vote(&proposal_id, support, weight)
            .map_err(|e| e.to_string()),
        ClientCommand::SendCommand { command } => state
            .feeds
            .model
            .send_command(command)
            .map_err(|e| e.to_string()),
        ClientCommand::UpdateAllocations { weights } => state
            .feeds
            .allocation
            .update_allocations(weights)
            .map(|_| ())
            .map_err(|e| e.to_string()),
    };

    match outcome {
        Ok(()) => {
            debug!(action, "WebSocket command applied");
            None
        }
        Err(error) => {
            warn!(action, error = %error, "WebSocket command rejected");
            Some(StreamEvent::CommandRejected {
                action: action.to_string(),
                error,
                timestamp: Utc::now(),
            })
        }
    }
}

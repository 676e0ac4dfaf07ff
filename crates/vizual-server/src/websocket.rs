//! WebSocket boundary between the renderer and the graph controller

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use vizual_core::{InboundMessage, Locator, NoticeLevel, OutboundMessage, VizualError};

use crate::ServerState;

/// Handle WebSocket upgrade requests
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    info!("New WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before taking the snapshots so no update falls in between.
    let mut rx = state.updates_tx.subscribe();

    for message in [
        state.controller.graph_snapshot().await,
        state.controller.state_snapshot().await,
    ] {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize initial snapshot: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(json)).await.is_err() {
            warn!("Failed to send initial snapshot to WebSocket client");
            return;
        }
    }

    let mut connection = Connection::new(Arc::clone(&state));
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    debug!("Received WebSocket message: {}", text);
                    match InboundMessage::parse(&text) {
                        Ok(message) => connection.handle(message).await,
                        Err(e) => warn!("Failed to parse WebSocket message: {}", e),
                    }
                }
                Message::Close(_) => {
                    debug!("WebSocket client disconnected");
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        debug!("Failed to send message to WebSocket client");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Every graph update is a full snapshot; the next one catches up.
                    warn!("WebSocket client lagged behind by {} messages", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    info!("WebSocket connection closed");
}

/// Requests from one client.
///
/// Expansions and opens wait on the filesystem, a language service or the OS, so each
/// runs on its own task and a stalled one holds up nothing else. Other requests are
/// applied in arrival order. Dropping the connection aborts whatever is still pending.
pub struct Connection {
    state: Arc<ServerState>,
    pending: JoinSet<()>,
}

impl Connection {
    pub fn new(state: Arc<ServerState>) -> Self {
        Connection {
            state,
            pending: JoinSet::new(),
        }
    }

    pub async fn handle(&mut self, message: InboundMessage) {
        while self.pending.try_join_next().is_some() {}
        match message {
            InboundMessage::ExpandNode { .. } | InboundMessage::OpenNode { .. } => {
                let state = Arc::clone(&self.state);
                self.pending.spawn(async move { dispatch(&state, message).await });
            }
            message => dispatch(&self.state, message).await,
        }
    }

    /// Expansions and opens that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Apply one renderer request. Graph changes reach clients through the store listener;
/// explicit state changes are followed by a `state/update`, failures by a `notice`.
pub async fn dispatch(state: &ServerState, message: InboundMessage) {
    let controller = &state.controller;
    match message {
        InboundMessage::ExpandNode { node_id } => match controller.expand_node(&node_id).await {
            Ok(outcome) => {
                debug!("Expanded {}: {:?}", node_id, outcome);
                if let Some(notice) = outcome.notice() {
                    state.publish(&OutboundMessage::notice(NoticeLevel::Warning, notice));
                }
            }
            Err(e) => report(state, &e),
        },
        InboundMessage::CollapseNode { node_id } => {
            // Collapsing only hides children in the renderer.
            debug!("Collapse of {} acknowledged", node_id);
        }
        InboundMessage::OpenNode { node_id, ctrl_key } => {
            match controller.open_node(&node_id, ctrl_key).await {
                Ok(true) => {}
                Ok(false) => debug!("Nothing to open for {}", node_id),
                Err(e) => report(state, &e),
            }
        }
        InboundMessage::SetFilters { filters } => match controller.set_filters(filters).await {
            Ok(()) => publish_state(state).await,
            Err(e) => report(state, &e),
        },
        InboundMessage::SetColors { colors } => {
            controller.set_color_rules(colors).await;
            publish_state(state).await;
        }
        InboundMessage::SetRoot { path } => {
            match controller.set_root_path(Path::new(&path)).await {
                Ok(_) => publish_state(state).await,
                Err(e) => report(state, &e),
            }
        }
        InboundMessage::SetActiveMode { value } => {
            controller.set_active_mode(value).await;
            publish_state(state).await;
        }
        InboundMessage::FocusEditor { locator } => {
            state.host.focus(locator.as_deref().map(Locator::parse));
        }
        InboundMessage::SetBreakpoints { locators } => {
            state
                .host
                .set_breakpoints(locators.iter().map(|l| Locator::parse(l)).collect());
        }
    }
}

async fn publish_state(state: &ServerState) {
    let message = state.controller.state_snapshot().await;
    state.publish(&message);
}

fn report(state: &ServerState, error: &VizualError) {
    warn!("{}", error);
    let level = match error {
        VizualError::Io { .. } | VizualError::Resolution { .. } => NoticeLevel::Warning,
        _ => NoticeLevel::Error,
    };
    state.publish(&OutboundMessage::notice(level, error.to_string()));
}

//! HTTP + WebSocket server

pub mod controller;
pub mod handlers;
pub mod opener;
pub mod router;
pub mod websocket;


use std::sync::Arc;

use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vizual_core::{OutboundMessage, SharedStore, Subscription};
use vizual_debug::LocalHost;

pub use controller::GraphController;
pub use opener::{NodeOpener, OpenRequest, SystemOpener};
pub use router::create_router;

/// Buffered outbound messages per client before it starts lagging.
const UPDATE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7890,
        }
    }
}

/// State shared by every route.
pub struct ServerState {
    pub controller: GraphController,
    /// Driven by `editor/focus` and `breakpoints/set` messages.
    pub host: Arc<LocalHost>,
    /// Serialized [`OutboundMessage`]s for every connected client.
    pub updates_tx: broadcast::Sender<String>,
    _subscription: Subscription,
    forwarder: JoinHandle<()>,
}

impl ServerState {
    /// Store mutations are pushed to clients as `graph/update` snapshots.
    ///
    /// Unlike the store's own listeners, which run once per mutation, clients do not get
    /// one snapshot per notification: notifications that arrive while a snapshot is being
    /// built are merged, so a burst (one expansion adds many nodes) yields a single
    /// `graph/update` taken after the burst. Every snapshot is complete, so a client
    /// that sees fewer of them still ends in the same state.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(controller: GraphController, host: Arc<LocalHost>) -> Self {
        let (updates_tx, _) = broadcast::channel(UPDATE_CAPACITY);
        let changed = Arc::new(Notify::new());

        let signal = Arc::clone(&changed);
        let subscription = controller.on_update(move |_| signal.notify_one());
        let forwarder = tokio::spawn(forward_updates(
            controller.store().clone(),
            changed,
            updates_tx.clone(),
        ));

        ServerState {
            controller,
            host,
            updates_tx,
            _subscription: subscription,
            forwarder,
        }
    }

    /// Send a raw message to every connected client.
    pub fn broadcast(&self, msg: String) -> Result<usize, broadcast::error::SendError<String>> {
        self.updates_tx.send(msg)
    }

    pub fn publish(&self, message: &OutboundMessage) {
        match message.to_json() {
            Ok(json) => {
                let _ = self.broadcast(json);
            }
            Err(e) => warn!("Failed to serialize outbound message: {}", e),
        }
    }
}

impl Drop for ServerState {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

async fn forward_updates(store: SharedStore, changed: Arc<Notify>, tx: broadcast::Sender<String>) {
    loop {
        changed.notified().await;
        let message = OutboundMessage::graph_update(&*store.read().await);
        match message.to_json() {
            // No receivers just means no client is connected.
            Ok(json) => {
                let _ = tx.send(json);
            }
            Err(e) => warn!("Failed to serialize graph update: {}", e),
        }
    }
}

pub struct VizualServer {
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl VizualServer {
    pub fn new(state: ServerState, config: ServerConfig) -> Self {
        VizualServer {
            state: Arc::new(state),
            config,
        }
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Serve until the process is stopped.
    pub async fn start(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Listening on http://{}", listener.local_addr()?);

        let app = create_router(self.state);
        axum::serve(listener, app).await?;
        Ok(())
    }
}

//! Graph controller: one entry point over the store, both expanders and the debug tracker

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};
use vizual_core::{
    ColorRule, ExpandOutcome, FilterUpdate, GraphStore, Listeners, Locator, NodeId, NodeKind,
    OutboundMessage, PathFilter, Result, SharedStore, Subscription, VizualError, shared,
};
use vizual_debug::{DebugHost, DebugStateTracker, TrackerOptions};
use vizual_indexer::{DirectoryExpander, DirectoryLister, SymbolExpander, SymbolResolver};

use crate::opener::{NodeOpener, OpenRequest};

pub struct GraphController {
    store: SharedStore,
    listeners: Listeners,
    directories: DirectoryExpander,
    symbols: SymbolExpander,
    opener: Arc<dyn NodeOpener>,
    tracker: Mutex<Option<DebugStateTracker>>,
}

impl GraphController {
    pub fn new(
        store: GraphStore,
        lister: Arc<dyn DirectoryLister>,
        resolver: Arc<dyn SymbolResolver>,
        opener: Arc<dyn NodeOpener>,
    ) -> Self {
        let listeners = store.listeners();
        let store = shared(store);
        GraphController {
            directories: DirectoryExpander::new(store.clone(), lister),
            symbols: SymbolExpander::new(store.clone(), resolver),
            store,
            listeners,
            opener,
            tracker: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Create the root node for the store's current root.
    pub async fn initialize(&self) -> Result<NodeId> {
        self.directories.initialize_root().await
    }

    /// Folders go to the directory expander, files to the symbol expander.
    pub async fn expand_node(&self, id: &NodeId) -> Result<ExpandOutcome> {
        let kind = self.store.read().await.node(id).map(|node| node.kind);
        match kind {
            Some(NodeKind::Folder) => self.directories.expand_folder(id).await,
            Some(NodeKind::File) => self.symbols.expand_file(id).await,
            Some(_) => Ok(ExpandOutcome::Skipped),
            None => {
                debug!("Expand requested for unknown node {}", id);
                Ok(ExpandOutcome::Skipped)
            }
        }
    }

    /// Returns false when the node is unknown or has no locator.
    pub async fn open_node(&self, id: &NodeId, with_reveal: bool) -> Result<bool> {
        let request = {
            let store = self.store.read().await;
            let Some(node) = store.node(id) else {
                return Ok(false);
            };
            let Some(locator) = node.locator.clone() else {
                return Ok(false);
            };
            OpenRequest {
                locator,
                kind: node.kind,
                range: node.range,
                reveal: with_reveal,
            }
        };
        self.opener.open(request).await?;
        Ok(true)
    }

    /// Switch the graph to another folder. The graph is rebuilt from a single root node.
    pub async fn set_root_path(&self, path: &Path) -> Result<NodeId> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            VizualError::Configuration(format!("cannot use {} as root: {e}", path.display()))
        })?;
        if !metadata.is_dir() {
            return Err(VizualError::Configuration(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        let path = tokio::fs::canonicalize(path).await.map_err(|e| {
            VizualError::Configuration(format!("cannot use {} as root: {e}", path.display()))
        })?;

        info!("Switching root to {}", path.display());
        self.store.write().await.set_root(Locator::from_path(&path));
        self.initialize().await
    }

    /// Merge a partial filter update. Patterns are validated before anything changes.
    pub async fn set_filters(&self, update: FilterUpdate) -> Result<()> {
        let mut store = self.store.write().await;
        let mut merged = store.filters().clone();
        merged.merge(update.clone());
        PathFilter::new(&merged)?;
        store.set_filters(update);
        Ok(())
    }

    pub async fn set_color_rules(&self, rules: Vec<ColorRule>) {
        self.store.write().await.set_color_rules(rules);
    }

    pub async fn set_active_mode(&self, enabled: bool) {
        self.store.write().await.set_active_mode(enabled);
    }

    /// `callback` runs after every store mutation, with the store still locked.
    pub fn on_update<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GraphStore) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Start mirroring `host` into the graph, replacing any previous tracker.
    pub async fn attach_debugger(&self, host: Arc<dyn DebugHost>, options: TrackerOptions) {
        self.detach_debugger();
        let tracker = DebugStateTracker::attach(self.store.clone(), host, options).await;
        *self.tracker.lock().unwrap_or_else(PoisonError::into_inner) = Some(tracker);
    }

    pub fn is_debugger_attached(&self) -> bool {
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(DebugStateTracker::is_attached)
    }

    fn detach_debugger(&self) {
        let previous = self
            .tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut tracker) = previous {
            tracker.dispose();
        }
    }

    /// Stop the debug tracker. The graph itself is left as is.
    pub fn dispose(&self) {
        self.detach_debugger();
    }

    pub async fn graph_snapshot(&self) -> OutboundMessage {
        OutboundMessage::graph_update(&*self.store.read().await)
    }

    pub async fn state_snapshot(&self) -> OutboundMessage {
        OutboundMessage::state_update(&*self.store.read().await)
    }
}

impl Drop for GraphController {
    fn drop(&mut self) {
        self.dispose();
    }
}

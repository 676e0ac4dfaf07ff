//! Lazy folder expansion

use std::sync::Arc;

use tracing::{debug, info, warn};
use vizual_core::{
    EdgeKind, ExpandOutcome, GraphNode, Locator, NodeId, NodeKind, PathFilter, Result, SharedStore,
    VizualError,
};

use crate::source::DirectoryLister;

/// Populates folder nodes from a [`DirectoryLister`].
#[derive(Clone)]
pub struct DirectoryExpander {
    store: SharedStore,
    lister: Arc<dyn DirectoryLister>,
}

impl DirectoryExpander {
    pub fn new(store: SharedStore, lister: Arc<dyn DirectoryLister>) -> Self {
        DirectoryExpander { store, lister }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Add the root folder node for the store's current root.
    pub async fn initialize_root(&self) -> Result<NodeId> {
        let mut store = self.store.write().await;
        let root = store
            .root()
            .cloned()
            .ok_or_else(|| VizualError::Configuration("no root folder selected".to_string()))?;

        let mut label = root.file_name();
        if label.is_empty() {
            label = root.as_str().to_string();
        }
        let node = GraphNode::folder(root, label);
        let id = node.id.clone();
        store.add_node(node);

        info!("Graph initialized at {}", id);
        Ok(id)
    }

    /// Materialize the accepted entries of a folder as child nodes.
    ///
    /// A folder that stopped at the node limit is left `is_truncated` and may be expanded
    /// again to resume; children that already exist are kept as they are.
    pub async fn expand_folder(&self, id: &NodeId) -> Result<ExpandOutcome> {
        let (folder, root, filter) = {
            let store = self.store.read().await;
            let Some(node) = store.node(id) else {
                return Ok(ExpandOutcome::Skipped);
            };
            if node.kind != NodeKind::Folder || (node.is_expanded && !node.is_truncated) {
                return Ok(ExpandOutcome::Skipped);
            }
            if store.is_over_node_limit() {
                let max_nodes = store.filters().max_nodes;
                warn!("Node limit ({}) reached, not expanding {}", max_nodes, id);
                return Ok(ExpandOutcome::LimitReached { max_nodes });
            }
            let Some(folder) = node.locator.clone() else {
                return Ok(ExpandOutcome::Skipped);
            };
            let root = store
                .root()
                .cloned()
                .ok_or_else(|| VizualError::Configuration("no root folder selected".to_string()))?;
            (folder, root, PathFilter::new(store.filters())?)
        };

        let entries = self
            .lister
            .list(&folder)
            .await
            .map_err(|source| VizualError::Io {
                locator: folder.clone(),
                source,
            })?;

        let mut store = self.store.write().await;
        if !store.contains(id) {
            debug!("{} disappeared while listing, dropping result", id);
            return Ok(ExpandOutcome::Skipped);
        }

        let mut added = 0;
        let mut truncated = false;
        for entry in entries {
            let locator = folder.join(&entry.name);
            if !accepted(&filter, &locator, &root, entry.is_dir) {
                continue;
            }

            let child_id = NodeId::for_locator(&locator);
            if !store.contains(&child_id) {
                if store.is_over_node_limit() {
                    truncated = true;
                    break;
                }
                let node = if entry.is_dir {
                    GraphNode::folder(locator, entry.name)
                } else {
                    GraphNode::file(locator, entry.name)
                };
                store.add_node(node);
                added += 1;
            }
            store.add_edge(id, &child_id, EdgeKind::Contains)?;
        }

        if !truncated && store.children(id).is_empty() {
            store.mark_leaf(id);
            debug!("{} has no accepted entries", id);
            return Ok(ExpandOutcome::Leaf);
        }

        store.mark_expanded(id, truncated);
        if truncated {
            warn!(
                "Node limit ({}) reached while expanding {}",
                store.filters().max_nodes,
                id
            );
        }
        debug!("Expanded {}: {} new children", id, added);
        Ok(ExpandOutcome::Expanded { added, truncated })
    }
}

fn accepted(filter: &PathFilter, locator: &Locator, root: &Locator, is_dir: bool) -> bool {
    match locator.relative_to(root) {
        Some(relative) => filter.accepts(&relative, is_dir),
        None => false,
    }
}

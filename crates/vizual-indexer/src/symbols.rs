//! Lazy file expansion into a symbol subtree

use std::sync::Arc;

use tracing::{debug, warn};
use vizual_core::{
    EdgeKind, ExpandOutcome, GraphNode, GraphStore, Locator, NodeId, NodeKind, Result, SharedStore,
};

use crate::outline::{OutlineSymbol, SymbolResolver};

/// Populates file nodes from a [`SymbolResolver`].
#[derive(Clone)]
pub struct SymbolExpander {
    store: SharedStore,
    resolver: Arc<dyn SymbolResolver>,
}

impl SymbolExpander {
    pub fn new(store: SharedStore, resolver: Arc<dyn SymbolResolver>) -> Self {
        SymbolExpander { store, resolver }
    }

    /// Materialize the outline of a file, depth-first, until the node limit.
    ///
    /// Resolution failures are logged and turn the file into a leaf.
    pub async fn expand_file(&self, id: &NodeId) -> Result<ExpandOutcome> {
        let file = {
            let store = self.store.read().await;
            let Some(node) = store.node(id) else {
                return Ok(ExpandOutcome::Skipped);
            };
            if node.kind != NodeKind::File || (node.is_expanded && !node.is_truncated) {
                return Ok(ExpandOutcome::Skipped);
            }
            if store.is_over_node_limit() {
                let max_nodes = store.filters().max_nodes;
                warn!("Node limit ({}) reached, not expanding {}", max_nodes, id);
                return Ok(ExpandOutcome::LimitReached { max_nodes });
            }
            let Some(file) = node.locator.clone() else {
                return Ok(ExpandOutcome::Skipped);
            };
            file
        };

        let outline = match self.resolver.outline(&file).await {
            Ok(outline) => outline,
            Err(e) => {
                warn!("Symbol resolution failed: {}", e);
                Vec::new()
            }
        };

        let mut store = self.store.write().await;
        if !store.contains(id) {
            debug!("{} disappeared while resolving, dropping result", id);
            return Ok(ExpandOutcome::Skipped);
        }
        if outline.is_empty() {
            store.mark_leaf(id);
            return Ok(ExpandOutcome::Leaf);
        }

        let mut added = 0;
        let complete = materialize(&mut store, id, &file, "", &outline, &mut added)?;
        store.mark_expanded(id, !complete);

        debug!("Expanded {}: {} new symbols", id, added);
        Ok(ExpandOutcome::Expanded {
            added,
            truncated: !complete,
        })
    }
}

/// Add `symbols` under `parent`. Returns false if the node limit stopped the walk.
fn materialize(
    store: &mut GraphStore,
    parent: &NodeId,
    file: &Locator,
    prefix: &str,
    symbols: &[OutlineSymbol],
    added: &mut usize,
) -> Result<bool> {
    for symbol in symbols {
        let path = if prefix.is_empty() {
            symbol.name.clone()
        } else {
            format!("{prefix}.{}", symbol.name)
        };
        let node = GraphNode::symbol(
            file,
            &path,
            symbol.name.as_str(),
            symbol.kind.node_kind(),
            symbol.range,
            symbol.children.is_empty(),
        );
        let child_id = node.id.clone();

        if !store.contains(&child_id) {
            if store.is_over_node_limit() {
                return Ok(false);
            }
            store.add_node(node);
            *added += 1;
        }
        store.add_edge(parent, &child_id, EdgeKind::Contains)?;

        if !symbol.children.is_empty() {
            if !materialize(store, &child_id, file, &path, &symbol.children, added)? {
                return Ok(false);
            }
            store.mark_expanded(&child_id, false);
        }
    }
    Ok(true)
}

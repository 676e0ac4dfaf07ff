//! Graph store: petgraph::StableDiGraph keyed by string ids, plus change notification

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::error::{Result, VizualError};
use crate::model::*;

/// Store shared between the controller, the expanders and the debug tracker.
pub type SharedStore = Arc<tokio::sync::RwLock<GraphStore>>;

pub fn shared(store: GraphStore) -> SharedStore {
    Arc::new(tokio::sync::RwLock::new(store))
}

pub type Listener = Arc<dyn Fn(&GraphStore) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    entries: DashMap<u64, Listener>,
}

/// Change listeners of one store. Cloning yields a handle to the same registry, so
/// callers can subscribe without holding the store lock.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Registry>,
}

impl Listeners {
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GraphStore) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.insert(id, Arc::new(callback));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    // Cloned out first: a callback may drop its own subscription.
    fn snapshot(&self) -> Vec<Listener> {
        self.inner
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// Handle returned by [`Listeners::subscribe`]; unsubscribes on drop.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.entries.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// The code graph plus the configuration that shapes it.
///
/// Every mutator notifies all listeners synchronously, once per call.
pub struct GraphStore {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<EdgeId, EdgeIndex>,
    root: Option<Locator>,
    filters: FilterConfig,
    color_rules: Vec<ColorRule>,
    active_mode: bool,
    listeners: Listeners,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("root", &self.root)
            .field("node_count", &self.graph.node_count())
            .field("edge_count", &self.graph.edge_count())
            .field("max_nodes", &self.filters.max_nodes)
            .finish()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_filters(FilterConfig::default())
    }

    pub fn with_filters(filters: FilterConfig) -> Self {
        GraphStore {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            root: None,
            filters,
            color_rules: default_color_rules(),
            active_mode: false,
            listeners: Listeners::default(),
        }
    }

    // ── Topology ────────────────────────────────────────────

    /// Insert a node, replacing any node with the same id.
    pub fn add_node(&mut self, node: GraphNode) {
        match self.node_index.get(&node.id) {
            Some(&idx) => {
                if let Some(slot) = self.graph.node_weight_mut(idx) {
                    *slot = node;
                }
            }
            None => {
                let id = node.id.clone();
                let idx = self.graph.add_node(node);
                self.node_index.insert(id, idx);
            }
        }
        self.notify_update();
    }

    /// Insert (or re-assert) a containment-style edge between two existing nodes.
    pub fn add_edge(&mut self, from: &NodeId, to: &NodeId, kind: EdgeKind) -> Result<EdgeId> {
        let edge_id = EdgeId::between(from, to);
        let (Some(&source), Some(&target)) = (self.node_index.get(from), self.node_index.get(to))
        else {
            return Err(VizualError::MissingEndpoint(edge_id));
        };

        let edge = GraphEdge::new(from.clone(), to.clone(), kind);
        match self.edge_index.get(&edge_id) {
            Some(&idx) => {
                if let Some(slot) = self.graph.edge_weight_mut(idx) {
                    *slot = edge;
                }
            }
            None => {
                let idx = self.graph.add_edge(source, target, edge);
                self.edge_index.insert(edge_id.clone(), idx);
            }
        }
        self.notify_update();
        Ok(edge_id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        let idx = *self.node_index.get(id)?;
        self.graph.node_weight(idx)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx))
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph
            .edge_indices()
            .filter_map(move |idx| self.graph.edge_weight(idx))
    }

    /// Direct containment children, in insertion order.
    pub fn children(&self, id: &NodeId) -> Vec<&GraphNode> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        let mut targets: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|edge| edge.weight().kind == EdgeKind::Contains)
            .map(|edge| edge.target())
            .collect();
        targets.sort();
        targets
            .into_iter()
            .filter_map(|target| self.graph.node_weight(target))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Empty nodes and edges; root, filters, colors and mode are kept.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_index.clear();
        self.edge_index.clear();
        self.notify_update();
    }

    // ── Node flags ──────────────────────────────────────────

    /// Apply `f` to one node. Returns false (and does not notify) if it does not exist.
    pub fn update_node(&mut self, id: &NodeId, f: impl FnOnce(&mut GraphNode)) -> bool {
        let Some(node) = self
            .node_index
            .get(id)
            .and_then(|&idx| self.graph.node_weight_mut(idx))
        else {
            return false;
        };
        f(node);
        self.notify_update();
        true
    }

    /// Apply `f` to every node, then notify once.
    pub fn update_nodes(&mut self, mut f: impl FnMut(&mut GraphNode)) {
        for node in self.graph.node_weights_mut() {
            f(node);
        }
        self.notify_update();
    }

    pub fn set_node_expanded(&mut self, id: &NodeId, expanded: bool) -> bool {
        self.update_node(id, |node| node.is_expanded = expanded)
    }

    /// Record a finished expansion. `truncated` keeps the node eligible for resuming.
    pub fn mark_expanded(&mut self, id: &NodeId, truncated: bool) -> bool {
        self.update_node(id, |node| {
            node.is_expanded = true;
            node.is_truncated = truncated;
        })
    }

    /// The node has nothing to expand.
    pub fn mark_leaf(&mut self, id: &NodeId) -> bool {
        self.update_node(id, |node| {
            node.is_leaf = true;
            node.is_expanded = true;
            node.is_truncated = false;
        })
    }

    pub fn is_over_node_limit(&self) -> bool {
        self.node_count() >= self.filters.max_nodes
    }

    // ── Configuration ───────────────────────────────────────

    pub fn root(&self) -> Option<&Locator> {
        self.root.as_ref()
    }

    /// Switch to a new root. The graph is cleared.
    pub fn set_root(&mut self, root: Locator) {
        debug!("Graph root set to {}", root);
        self.root = Some(root);
        self.clear();
    }

    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    pub fn set_filters(&mut self, update: FilterUpdate) {
        self.filters.merge(update);
        self.notify_update();
    }

    pub fn color_rules(&self) -> &[ColorRule] {
        &self.color_rules
    }

    pub fn set_color_rules(&mut self, rules: Vec<ColorRule>) {
        self.color_rules = rules;
        self.notify_update();
    }

    pub fn active_mode(&self) -> bool {
        self.active_mode
    }

    pub fn set_active_mode(&mut self, enabled: bool) {
        self.active_mode = enabled;
        self.notify_update();
    }

    // ── Notification ────────────────────────────────────────

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GraphStore) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Handle to this store's listener registry.
    pub fn listeners(&self) -> Listeners {
        self.listeners.clone()
    }

    fn notify_update(&self) {
        for listener in self.listeners.snapshot() {
            listener(self);
        }
    }
}

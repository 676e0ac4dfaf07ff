//! JSON messages exchanged with the rendering layer

use serde::{Deserialize, Serialize};

use crate::model::{ColorRule, FilterConfig, FilterUpdate, GraphEdge, GraphNode, NodeId};
use crate::store::GraphStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMeta {
    pub node_count: usize,
    pub edge_count: usize,
    pub max_nodes: usize,
    pub over_limit: bool,
}

/// Messages pushed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "graph/update")]
    GraphUpdate {
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        meta: GraphMeta,
    },
    #[serde(rename = "state/update")]
    StateUpdate {
        filters: FilterConfig,
        colors: Vec<ColorRule>,
        root: Option<String>,
        #[serde(rename = "activeMode")]
        active_mode: bool,
    },
    #[serde(rename = "notice")]
    Notice { level: NoticeLevel, message: String },
}

impl OutboundMessage {
    pub fn graph_update(store: &GraphStore) -> Self {
        OutboundMessage::GraphUpdate {
            nodes: store.nodes().cloned().collect(),
            edges: store.edges().cloned().collect(),
            meta: GraphMeta {
                node_count: store.node_count(),
                edge_count: store.edge_count(),
                max_nodes: store.filters().max_nodes,
                over_limit: store.is_over_node_limit(),
            },
        }
    }

    pub fn state_update(store: &GraphStore) -> Self {
        OutboundMessage::StateUpdate {
            filters: store.filters().clone(),
            colors: store.color_rules().to_vec(),
            root: store.root().and_then(|root| root.to_path()).map(|path| path.display().to_string()),
            active_mode: store.active_mode(),
        }
    }

    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        OutboundMessage::Notice {
            level,
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Requests coming from the renderer (and, for `editor/focus` / `breakpoints/set`, from
/// whatever drives the local debug host).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "node/expand")]
    ExpandNode {
        #[serde(rename = "nodeId")]
        node_id: NodeId,
    },
    #[serde(rename = "node/collapse")]
    CollapseNode {
        #[serde(rename = "nodeId")]
        node_id: NodeId,
    },
    #[serde(rename = "node/open")]
    OpenNode {
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        #[serde(rename = "ctrlKey", default)]
        ctrl_key: bool,
    },
    #[serde(rename = "filters/set")]
    SetFilters { filters: FilterUpdate },
    #[serde(rename = "colors/set")]
    SetColors { colors: Vec<ColorRule> },
    #[serde(rename = "root/set")]
    SetRoot { path: String },
    #[serde(rename = "activeMode/set")]
    SetActiveMode { value: bool },
    #[serde(rename = "editor/focus")]
    FocusEditor {
        #[serde(default)]
        locator: Option<String>,
    },
    #[serde(rename = "breakpoints/set")]
    SetBreakpoints { locators: Vec<String> },
}

impl InboundMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

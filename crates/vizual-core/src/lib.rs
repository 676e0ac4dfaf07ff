//! Vizual core: graph data model, graph store, path filters and boundary protocol

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod protocol;
pub mod store;


#[cfg(test)]
pub mod test_utils;

pub use config::{CONFIG_FILE, VizualConfig, config_path, load_config};
pub use error::{Result, VizualError};
pub use filter::PathFilter;
pub use model::{
    ColorRule, EdgeId, EdgeKind, ExpandOutcome, FilterConfig, FilterUpdate, GraphEdge, GraphNode,
    Locator, NodeId, NodeKind, SourceRange, default_color_rules,
};
pub use protocol::{GraphMeta, InboundMessage, NoticeLevel, OutboundMessage};
pub use store::{GraphStore, Listeners, SharedStore, Subscription, shared};

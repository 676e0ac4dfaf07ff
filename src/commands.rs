//! CLI command implementations

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use vizual_core::{ExpandOutcome, FilterUpdate, GraphStore, Locator, NodeKind, load_config};
use vizual_debug::{LocalHost, TrackerOptions};
use vizual_indexer::{FsLister, TreeSitterResolver};
use vizual_server::{GraphController, ServerConfig, ServerState, SystemOpener, VizualServer};

/// Overrides for the `[filters]` section of `vizual.toml`.
#[derive(Debug, Clone, Default, Args)]
pub struct GraphOptions {
    /// Maximum number of nodes in the graph
    #[arg(long)]
    pub max_nodes: Option<usize>,

    /// Extra exclude glob (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
}

pub async fn serve(root: PathBuf, host: String, port: u16, options: GraphOptions) -> anyhow::Result<()> {
    let controller = build_controller(&root, &options).await?;
    controller.initialize().await?;
    let debug_host = Arc::new(LocalHost::new());
    controller
        .attach_debugger(debug_host.clone(), TrackerOptions::default())
        .await;

    tracing::info!("Starting Vizual server on {}:{}", host, port);
    let state = ServerState::new(controller, debug_host);
    let server = VizualServer::new(state, ServerConfig { host, port });
    server.start().await
}

pub async fn index(root: PathBuf, options: GraphOptions) -> anyhow::Result<()> {
    let controller = build_controller(&root, &options).await?;
    let root_id = controller.initialize().await?;

    let mut queue = VecDeque::from([root_id]);
    let mut truncated = false;
    while let Some(id) = queue.pop_front() {
        match controller.expand_node(&id).await? {
            ExpandOutcome::LimitReached { max_nodes } => {
                tracing::warn!("Stopped at the node limit ({})", max_nodes);
                truncated = true;
                break;
            }
            ExpandOutcome::Expanded { truncated: true, .. } => truncated = true,
            _ => {}
        }
        let store = controller.store().read().await;
        queue.extend(
            store
                .children(&id)
                .into_iter()
                .filter(|child| matches!(child.kind, NodeKind::Folder | NodeKind::File))
                .map(|child| child.id.clone()),
        );
    }

    let store = controller.store().read().await;
    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    for node in store.nodes() {
        *by_kind.entry(format!("{:?}", node.kind)).or_default() += 1;
    }

    tracing::info!(
        "Indexed {} nodes, {} edges{}",
        store.node_count(),
        store.edge_count(),
        if truncated { " (truncated)" } else { "" }
    );
    for (kind, count) in by_kind {
        println!("{kind:>12}  {count}");
    }
    Ok(())
}

/// Store configured from `vizual.toml` and the CLI, wrapped in a controller over the
/// real filesystem. The root node is not created yet.
async fn build_controller(root: &Path, options: &GraphOptions) -> anyhow::Result<GraphController> {
    let root = tokio::fs::canonicalize(root)
        .await
        .with_context(|| format!("cannot open root folder {}", root.display()))?;
    anyhow::ensure!(root.is_dir(), "{} is not a directory", root.display());
    tracing::info!("Graph root: {}", root.display());

    let config = load_config(&root)?;
    let mut store = GraphStore::with_filters(config.filters);
    store.set_color_rules(config.colors);
    store.set_active_mode(config.active_mode);

    let mut exclude = store.filters().exclude_patterns.clone();
    exclude.extend(options.exclude.iter().cloned());
    store.set_filters(FilterUpdate {
        exclude_patterns: Some(exclude),
        max_nodes: options.max_nodes,
        ..FilterUpdate::default()
    });
    store.set_root(Locator::from_path(&root));

    let controller = GraphController::new(
        store,
        Arc::new(FsLister),
        Arc::new(TreeSitterResolver::new()),
        Arc::new(SystemOpener),
    );
    // validates the merged patterns
    controller.set_filters(FilterUpdate::default()).await?;
    Ok(controller)
}

//! Integration tests for Vizual
//!
//! These tests run the full stack on a real folder: filesystem listing, tree-sitter
//! outlines, the debug overlay and the renderer boundary.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use vizual_core::{
    ExpandOutcome, FilterConfig, GraphStore, InboundMessage, Locator, NodeId, NodeKind,
};
use vizual_debug::{DebugSession, LocalHost, StackFrame, TrackerOptions};
use vizual_indexer::{FsLister, TreeSitterResolver};
use vizual_server::websocket::dispatch;
use vizual_server::{GraphController, ServerState, SystemOpener};

const MAIN_RS: &str = "\
fn main() {
    let config = load();
    run(config);
}

fn run(config: u32) {
    println!(\"{config}\");
}
";

fn create_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("node_modules").join("dep")).unwrap();
    fs::write(root.join("src").join("main.rs"), MAIN_RS).unwrap();
    fs::write(root.join("src").join("util.py"), "def helper():\n    return 1\n").unwrap();
    fs::write(root.join("node_modules").join("dep").join("index.js"), "").unwrap();
    fs::write(root.join("README.md"), "# demo\n").unwrap();
    dir
}

async fn controller_for(root: &Path, max_nodes: usize) -> (GraphController, NodeId) {
    let root = fs::canonicalize(root).unwrap();
    let mut store = GraphStore::with_filters(FilterConfig {
        max_nodes,
        ..FilterConfig::default()
    });
    store.set_root(Locator::from_path(&root));
    let controller = GraphController::new(
        store,
        Arc::new(FsLister),
        Arc::new(TreeSitterResolver::new()),
        Arc::new(SystemOpener),
    );
    let root_id = controller.initialize().await.unwrap();
    (controller, root_id)
}

fn locator(root: &Path, relative: &str) -> Locator {
    Locator::from_path(&fs::canonicalize(root).unwrap().join(relative))
}

async fn labels_under(controller: &GraphController, id: &NodeId) -> Vec<String> {
    let store = controller.store().read().await;
    store.children(id).into_iter().map(|n| n.label.clone()).collect()
}

#[tokio::test]
async fn test_expand_real_project() {
    let dir = create_project();
    let (controller, root_id) = controller_for(dir.path(), 1000).await;

    controller.expand_node(&root_id).await.unwrap();
    assert_eq!(labels_under(&controller, &root_id).await, ["README.md", "src"]);

    let src = NodeId::for_locator(&locator(dir.path(), "src"));
    controller.expand_node(&src).await.unwrap();
    assert_eq!(labels_under(&controller, &src).await, ["main.rs", "util.py"]);

    let main_rs = NodeId::for_locator(&locator(dir.path(), "src/main.rs"));
    controller.expand_node(&main_rs).await.unwrap();
    let store = controller.store().read().await;
    let functions: Vec<_> = store
        .children(&main_rs)
        .into_iter()
        .map(|n| (n.label.as_str(), n.kind, n.range.map(|r| r.start_line)))
        .collect();
    assert_eq!(
        functions,
        [
            ("main", NodeKind::Function, Some(1)),
            ("run", NodeKind::Function, Some(6)),
        ]
    );

    // Text files have no outline.
    drop(store);
    let readme = NodeId::for_locator(&locator(dir.path(), "README.md"));
    assert_eq!(controller.expand_node(&readme).await.unwrap(), ExpandOutcome::Leaf);
}

#[tokio::test]
async fn test_node_limit_holds_across_expansions() {
    let dir = create_project();
    let (controller, root_id) = controller_for(dir.path(), 3).await;

    controller.expand_node(&root_id).await.unwrap();
    let src = NodeId::for_locator(&locator(dir.path(), "src"));
    let outcome = controller.expand_node(&src).await.unwrap();
    assert_eq!(outcome, ExpandOutcome::LimitReached { max_nodes: 3 });

    let store = controller.store().read().await;
    assert_eq!(store.node_count(), 3);
    assert!(store.is_over_node_limit());
    assert!(!store.node(&src).unwrap().is_expanded);
}

#[tokio::test]
async fn test_paused_session_overlays_stack() {
    let dir = create_project();
    let (controller, root_id) = controller_for(dir.path(), 1000).await;
    let src = NodeId::for_locator(&locator(dir.path(), "src"));
    let main_rs_locator = locator(dir.path(), "src/main.rs");
    let main_rs = NodeId::for_locator(&main_rs_locator);
    for id in [&root_id, &src, &main_rs] {
        controller.expand_node(id).await.unwrap();
    }

    let host = Arc::new(LocalHost::new());
    controller
        .attach_debugger(
            host.clone(),
            TrackerOptions {
                recheck_delay: Duration::from_millis(10),
            },
        )
        .await;
    let session = host.start_session();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let path = main_rs_locator.to_path().unwrap();
    let frames = vec![
        StackFrame::at(path.to_string_lossy(), 7),
        StackFrame::at(path.to_string_lossy(), 3),
    ];
    session.pause(vec![frames]);

    let run = NodeId::for_symbol(&main_rs_locator, "run", 6, 1);
    let main = NodeId::for_symbol(&main_rs_locator, "main", 1, 1);
    let mut paused = false;
    for _ in 0..200 {
        let store = controller.store().read().await;
        if store.node(&main).is_some_and(|n| n.is_debug_symbol_active) {
            paused = true;
            break;
        }
        drop(store);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(paused, "stack never reached the graph");

    {
        let store = controller.store().read().await;
        assert_eq!(store.node(&main_rs).unwrap().debug_stack_depth, Some(0));
        assert_eq!(store.node(&run).unwrap().debug_stack_depth, Some(0));
        assert_eq!(store.node(&main).unwrap().debug_stack_depth, Some(1));
        assert!(!store.node(&src).unwrap().is_debug_active);
    }

    host.terminate_session(session.id());
    for _ in 0..200 {
        if controller.store().read().await.nodes().all(|n| !n.is_debug_active) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let store = controller.store().read().await;
    assert!(store.nodes().all(|n| !n.is_debug_active && n.debug_stack_depth.is_none()));
}

#[tokio::test]
async fn test_boundary_messages_drive_the_graph() {
    let dir = create_project();
    let (controller, root_id) = controller_for(dir.path(), 1000).await;
    let state = ServerState::new(controller, Arc::new(LocalHost::new()));
    let mut rx = state.updates_tx.subscribe();

    let message = InboundMessage::parse(&format!(
        r#"{{"type":"node/expand","nodeId":"{root_id}"}}"#
    ))
    .unwrap();
    dispatch(&state, message).await;

    let update = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let update: serde_json::Value = serde_json::from_str(&update).unwrap();
    assert_eq!(update["type"], "graph/update");
    assert_eq!(update["meta"]["nodeCount"], 3);

    let other = TempDir::new().unwrap();
    fs::write(other.path().join("lib.rs"), "pub fn f() {}\n").unwrap();
    let message = InboundMessage::SetRoot {
        path: other.path().display().to_string(),
    };
    dispatch(&state, message).await;

    let store = state.controller.store().read().await;
    assert_eq!(store.node_count(), 1);
    let other_root = Locator::from_path(&fs::canonicalize(other.path()).unwrap());
    assert_eq!(store.root(), Some(&other_root));
}

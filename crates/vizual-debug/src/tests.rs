//! Unit tests for vizual-debug

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use vizual_core::*;

use crate::*;

fn loc(path: &str) -> Locator {
    Locator::from_path(Path::new(path))
}

fn node_id(path: &str) -> NodeId {
    NodeId::for_locator(&loc(path))
}

fn symbol_id(path: &str, name: &str, start_line: u32) -> NodeId {
    NodeId::for_symbol(&loc(path), name, start_line, 1)
}

/// `/repo` with files `a.ts`, `b.ts`, `c.ts`; `a.ts` holds `run` (lines 1-3) and
/// `one` (line 5 only).
fn sample_store() -> SharedStore {
    let mut store = GraphStore::new();
    store.set_root(loc("/repo"));
    store.add_node(GraphNode::folder(loc("/repo"), "repo"));
    for name in ["a.ts", "b.ts", "c.ts"] {
        store.add_node(GraphNode::file(loc(&format!("/repo/{name}")), name));
    }
    store.add_node(GraphNode::symbol(
        &loc("/repo/a.ts"),
        "run",
        "run",
        NodeKind::Function,
        SourceRange::new(1, 1, 3, 2),
        true,
    ));
    store.add_node(GraphNode::symbol(
        &loc("/repo/a.ts"),
        "one",
        "one",
        NodeKind::Variable,
        SourceRange::new(5, 1, 5, 12),
        true,
    ));
    shared(store)
}

fn fast() -> TrackerOptions {
    TrackerOptions {
        recheck_delay: Duration::from_millis(10),
    }
}

async fn attach(store: &SharedStore, host: &Arc<LocalHost>) -> DebugStateTracker {
    DebugStateTracker::attach(store.clone(), host.clone(), fast()).await
}

/// Poll until `predicate` holds, failing after about two seconds.
async fn wait_until(store: &SharedStore, predicate: impl Fn(&GraphStore) -> bool) {
    for _ in 0..400 {
        if predicate(&*store.read().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("graph never reached the expected state");
}

async fn node(store: &SharedStore, id: &NodeId) -> GraphNode {
    store.read().await.node(id).cloned().unwrap()
}

// ── Adapter vocabulary ──────────────────────────────────────

#[test]
fn test_classify_adapter_messages() {
    let stopped = json!({"seq": 4, "type": "event", "event": "stopped", "body": {"reason": "breakpoint"}});
    let output = json!({"seq": 5, "type": "event", "event": "output"});
    let response = json!({"seq": 6, "type": "response", "command": "threads", "success": true});

    assert_eq!(AdapterEvent::classify(&stopped), Some(AdapterEvent::Stopped));
    assert_eq!(
        AdapterEvent::classify(&output),
        Some(AdapterEvent::Other("output".to_string()))
    );
    assert_eq!(AdapterEvent::classify(&response), None);
    assert_eq!(AdapterEvent::classify(&json!("garbage")), None);
}

#[test]
fn test_frame_locator_prefers_explicit_uri() {
    let frame: StackFrame = serde_json::from_value(json!({
        "id": 1,
        "name": "main",
        "line": 3,
        "column": 5,
        "source": {"path": "/repo/a.ts", "uri": "file:///elsewhere/a.ts"}
    }))
    .unwrap();
    assert_eq!(frame.locator(), Some(Locator::new("file:///elsewhere/a.ts")));

    let by_path = StackFrame::at("/repo/a.ts", 3);
    assert_eq!(by_path.locator(), Some(loc("/repo/a.ts")));
}

#[test]
fn test_frame_locator_matches_encoded_uri() {
    let frame: StackFrame = serde_json::from_value(json!({
        "id": 1,
        "name": "main",
        "line": 3,
        "column": 1,
        "source": {"uri": "file:///repo/my%20app/a.ts"}
    }))
    .unwrap();
    assert_eq!(frame.locator(), Some(loc("/repo/my app/a.ts")));
    assert_eq!(StackFrame::at("/repo/my app/a.ts", 3).locator(), frame.locator());
}

#[tokio::test]
async fn test_capture_requests_twenty_levels_per_thread() {
    let session = LocalSession::new(SessionId(9));
    let deep: Vec<StackFrame> = (0..30).map(|i| StackFrame::at("/repo/c.ts", i + 1)).collect();
    session.set_stacks(vec![vec![StackFrame::at("/repo/a.ts", 2)], deep]);

    let snapshot = capture(&session).await.unwrap();
    assert_eq!(snapshot.targets().len(), 1 + MAX_STACK_FRAMES as usize);
    assert_eq!(snapshot.file_depth(&loc("/repo/a.ts")), Some(0));
    assert_eq!(snapshot.file_depth(&loc("/repo/c.ts")), Some(0));
    // threads + one stackTrace per thread
    assert_eq!(session.requests(), 3);
}

// ── Tracker ─────────────────────────────────────────────────

#[tokio::test]
async fn test_paused_stack_sets_depths() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    let _tracker = attach(&store, &host).await;

    let session = host.start_session();
    tokio::time::sleep(Duration::from_millis(20)).await;
    session.pause(vec![vec![
        StackFrame::at("/repo/a.ts", 1),
        StackFrame::at("/repo/b.ts", 2),
    ]]);

    wait_until(&store, |s| s.nodes().filter(|n| n.is_debug_active).count() == 4).await;

    let a = node(&store, &node_id("/repo/a.ts")).await;
    let b = node(&store, &node_id("/repo/b.ts")).await;
    let c = node(&store, &node_id("/repo/c.ts")).await;
    assert_eq!(a.debug_stack_depth, Some(0));
    assert_eq!(b.debug_stack_depth, Some(1));
    assert!(!c.is_debug_active);
    assert_eq!(c.debug_stack_depth, None);

    let run = node(&store, &symbol_id("/repo/a.ts", "run", 1)).await;
    assert!(run.is_debug_symbol_active);
    assert_eq!(run.debug_stack_depth, Some(0));
    let one = node(&store, &symbol_id("/repo/a.ts", "one", 5)).await;
    assert!(!one.is_debug_symbol_active);
    assert_eq!(one.debug_stack_depth, None);
}

#[tokio::test]
async fn test_single_line_symbol_matches_its_line() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    let _tracker = attach(&store, &host).await;

    let session = host.start_session();
    tokio::time::sleep(Duration::from_millis(20)).await;
    session.pause(vec![vec![
        StackFrame::at("/repo/b.ts", 9),
        StackFrame::at("/repo/a.ts", 5),
    ]]);

    let one = symbol_id("/repo/a.ts", "one", 5);
    wait_until(&store, |s| s.node(&one).is_some_and(|n| n.is_debug_symbol_active)).await;
    assert_eq!(node(&store, &one).await.debug_stack_depth, Some(1));
}

#[tokio::test]
async fn test_continue_and_terminate_clear_flags() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    let _tracker = attach(&store, &host).await;

    let session = host.start_session();
    tokio::time::sleep(Duration::from_millis(20)).await;
    session.pause(vec![vec![StackFrame::at("/repo/a.ts", 2)]]);
    wait_until(&store, |s| s.nodes().any(|n| n.is_debug_active)).await;

    session.resume();
    wait_until(&store, |s| s.nodes().all(|n| !n.is_debug_active)).await;

    session.pause(vec![vec![StackFrame::at("/repo/a.ts", 2)]]);
    wait_until(&store, |s| s.nodes().any(|n| n.is_debug_active)).await;

    host.terminate_session(session.id());
    wait_until(&store, |s| {
        s.nodes().all(|n| {
            !n.is_debug_active && !n.is_debug_symbol_active && n.debug_stack_depth.is_none()
        })
    })
    .await;
}

#[tokio::test]
async fn test_failed_introspection_keeps_last_flags() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    let _tracker = attach(&store, &host).await;

    let session = host.start_session();
    tokio::time::sleep(Duration::from_millis(20)).await;
    session.pause(vec![vec![StackFrame::at("/repo/b.ts", 1)]]);
    let b = node_id("/repo/b.ts");
    wait_until(&store, |s| s.node(&b).is_some_and(|n| n.is_debug_active)).await;

    session.set_failing(true);
    let before = session.requests();
    session.send(AdapterEvent::Stopped);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(session.requests() > before);
    let b_node = node(&store, &b).await;
    assert!(b_node.is_debug_active);
    assert_eq!(b_node.debug_stack_depth, Some(0));
}

#[tokio::test]
async fn test_deferred_recheck_catches_already_paused_session() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    let session = host.start_session();
    session.set_stacks(vec![vec![StackFrame::at("/repo/c.ts", 4)]]);

    let tracker = attach(&store, &host).await;
    assert_eq!(tracker.current_session(), Some(session.id()));

    let c = node_id("/repo/c.ts");
    wait_until(&store, |s| s.node(&c).is_some_and(|n| n.debug_stack_depth == Some(0))).await;
}

#[tokio::test]
async fn test_new_session_replaces_previous_tap() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    let tracker = attach(&store, &host).await;

    let first = host.start_session();
    let second = host.start_session();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(tracker.current_session(), Some(second.id()));

    first.pause(vec![vec![StackFrame::at("/repo/a.ts", 1)]]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.read().await.nodes().all(|n| !n.is_debug_active));

    second.pause(vec![vec![StackFrame::at("/repo/b.ts", 1)]]);
    let b = node_id("/repo/b.ts");
    wait_until(&store, |s| s.node(&b).is_some_and(|n| n.is_debug_active)).await;
    assert!(!node(&store, &node_id("/repo/a.ts")).await.is_debug_active);
}

#[tokio::test]
async fn test_breakpoints_and_focus() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    host.set_breakpoints(vec![loc("/repo/b.ts")]);
    let _tracker = attach(&store, &host).await;

    // Initial update on attach.
    assert!(node(&store, &node_id("/repo/b.ts")).await.has_breakpoint);
    assert!(!node(&store, &node_id("/repo/a.ts")).await.has_breakpoint);

    host.set_breakpoints(vec![loc("/repo/a.ts")]);
    let a = node_id("/repo/a.ts");
    wait_until(&store, |s| s.node(&a).is_some_and(|n| n.has_breakpoint)).await;
    assert!(!node(&store, &node_id("/repo/b.ts")).await.has_breakpoint);
    // Symbols share their file's locator.
    assert!(node(&store, &symbol_id("/repo/a.ts", "run", 1)).await.has_breakpoint);

    host.focus(Some(loc("/repo/c.ts")));
    let c = node_id("/repo/c.ts");
    wait_until(&store, |s| s.node(&c).is_some_and(|n| n.is_active)).await;
    assert_eq!(store.read().await.nodes().filter(|n| n.is_active).count(), 1);

    host.focus(None);
    wait_until(&store, |s| s.nodes().all(|n| !n.is_active)).await;
}

#[tokio::test]
async fn test_flag_passes_notify_once() {
    let store = sample_store();
    let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let seen = count.clone();
    let _subscription = store.read().await.subscribe(move |_| {
        seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    let mut snapshot = StackSnapshot::new();
    snapshot.record(loc("/repo/a.ts"), 2, 1, 0);
    {
        let mut guard = store.write().await;
        apply_stack(&mut guard, &snapshot);
        clear_debug(&mut guard);
    }
    assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_dispose_stops_tracking() {
    let store = sample_store();
    let host = Arc::new(LocalHost::new());
    let mut tracker = attach(&store, &host).await;
    assert!(tracker.is_attached());

    tracker.dispose();
    assert!(!tracker.is_attached());
    assert_eq!(tracker.current_session(), None);

    host.set_breakpoints(vec![loc("/repo/a.ts")]);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(store.read().await.nodes().all(|n| !n.has_breakpoint));
}

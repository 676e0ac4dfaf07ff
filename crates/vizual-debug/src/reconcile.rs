//! Call-stack capture and the pure flag passes applied to the graph

use std::collections::{HashMap, HashSet};

use tracing::debug;
use vizual_core::{GraphStore, Locator, Result, SourceRange};

use crate::dap::{list_threads, stack_frames};
use crate::host::DebugSession;

/// Frames requested per thread.
pub const MAX_STACK_FRAMES: u32 = 20;

/// A frame position with its stack depth (0 = innermost).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTarget {
    pub locator: Locator,
    pub line: u32,
    pub column: u32,
    pub depth: u32,
}

/// Paused call stack, across all threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackSnapshot {
    file_depths: HashMap<Locator, u32>,
    targets: Vec<FrameTarget>,
}

impl StackSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, locator: Locator, line: u32, column: u32, depth: u32) {
        self.file_depths
            .entry(locator.clone())
            .and_modify(|current| *current = (*current).min(depth))
            .or_insert(depth);
        self.targets.push(FrameTarget {
            locator,
            line,
            column,
            depth,
        });
    }

    /// Minimum depth at which the file appears.
    pub fn file_depth(&self, locator: &Locator) -> Option<u32> {
        self.file_depths.get(locator).copied()
    }

    /// Minimum depth of a frame in `locator` whose line falls inside `range`.
    pub fn symbol_depth(&self, locator: &Locator, range: &SourceRange) -> Option<u32> {
        self.targets
            .iter()
            .filter(|target| &target.locator == locator && range.contains_line(target.line))
            .map(|target| target.depth)
            .min()
    }

    pub fn targets(&self) -> &[FrameTarget] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Query threads and their innermost frames.
pub async fn capture(session: &dyn DebugSession) -> Result<StackSnapshot> {
    let mut snapshot = StackSnapshot::new();
    for thread in list_threads(session).await? {
        let frames = stack_frames(session, thread.id, MAX_STACK_FRAMES).await?;
        for (depth, frame) in frames.iter().enumerate() {
            if let Some(locator) = frame.locator() {
                snapshot.record(locator, frame.line, frame.column, depth as u32);
            }
        }
    }
    debug!(
        "Captured {} frames in {} files",
        snapshot.targets.len(),
        snapshot.file_depths.len()
    );
    Ok(snapshot)
}

/// Overlay a paused stack. File nodes get the file's minimum depth; symbol nodes get the
/// minimum depth of a frame inside their range.
pub fn apply_stack(store: &mut GraphStore, snapshot: &StackSnapshot) {
    store.update_nodes(|node| {
        let Some(locator) = node.locator.as_ref() else {
            node.clear_debug();
            return;
        };

        let file_depth = snapshot.file_depth(locator);
        node.is_debug_active = file_depth.is_some();
        match node.range {
            None => node.debug_stack_depth = file_depth,
            Some(range) => {
                let symbol_depth = snapshot.symbol_depth(locator, &range);
                node.is_debug_symbol_active = symbol_depth.is_some();
                node.debug_stack_depth = symbol_depth;
            }
        }
    });
}

pub fn apply_breakpoints(store: &mut GraphStore, breakpoints: &HashSet<Locator>) {
    store.update_nodes(|node| {
        if let Some(locator) = &node.locator {
            node.has_breakpoint = breakpoints.contains(locator);
        }
    });
}

pub fn apply_focus(store: &mut GraphStore, focused: Option<&Locator>) {
    store.update_nodes(|node| {
        node.is_active = node.locator.is_some() && node.locator.as_ref() == focused;
    });
}

pub fn clear_debug(store: &mut GraphStore) {
    store.update_nodes(|node| node.clear_debug());
}

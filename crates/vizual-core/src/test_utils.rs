//! Test utilities for vizual-core

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::model::*;

/// Create a temporary repository with the given files (paths relative to the root).
pub fn create_repo_with_files(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = temp_dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    temp_dir
}

pub fn locator(path: &str) -> Locator {
    Locator::from_path(Path::new(path))
}

pub fn folder(path: &str) -> GraphNode {
    let loc = locator(path);
    let label = loc.file_name().to_string();
    GraphNode::folder(loc, label)
}

pub fn file(path: &str) -> GraphNode {
    let loc = locator(path);
    let label = loc.file_name().to_string();
    GraphNode::file(loc, label)
}

pub fn function(path: &str, name: &str, start_line: u32, end_line: u32) -> GraphNode {
    GraphNode::symbol(
        &locator(path),
        name,
        name,
        NodeKind::Function,
        SourceRange::new(start_line, 1, end_line, 2),
        true,
    )
}

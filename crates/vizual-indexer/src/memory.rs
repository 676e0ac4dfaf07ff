//! In-memory collaborators, for embedding the engine and for tests

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use vizual_core::{Locator, Result, VizualError};

use crate::outline::{OutlineSymbol, SymbolResolver};
use crate::source::{DirEntry, DirectoryLister};

/// [`DirectoryLister`] backed by a map of folder → entries.
#[derive(Debug, Default)]
pub struct MemoryLister {
    folders: DashMap<Locator, Vec<DirEntry>>,
    failing: DashSet<Locator>,
    calls: AtomicUsize,
}

impl MemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from slash-separated paths relative to `root`. A trailing `/` marks
    /// an (empty) folder.
    pub fn from_paths(root: &Locator, paths: &[&str]) -> Self {
        let lister = Self::new();
        lister.folders.entry(root.clone()).or_default();
        for path in paths {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let mut folder = root.clone();
            for (i, segment) in segments.iter().enumerate() {
                let is_dir = i + 1 < segments.len() || path.ends_with('/');
                lister.add_entry(&folder, DirEntry::new(*segment, is_dir));
                folder = folder.join(segment);
                if is_dir {
                    lister.folders.entry(folder.clone()).or_default();
                }
            }
        }
        lister
    }

    /// Add one entry to `folder`, ignoring duplicates by name.
    pub fn add_entry(&self, folder: &Locator, entry: DirEntry) {
        let mut entries = self.folders.entry(folder.clone()).or_default();
        if !entries.iter().any(|existing| existing.name == entry.name) {
            entries.push(entry);
        }
    }

    /// Make every listing of `folder` fail until [`MemoryLister::heal`] is called.
    pub fn fail(&self, folder: &Locator) {
        self.failing.insert(folder.clone());
    }

    pub fn heal(&self, folder: &Locator) {
        self.failing.remove(folder);
    }

    /// Number of `list` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryLister for MemoryLister {
    async fn list(&self, folder: &Locator) -> io::Result<Vec<DirEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Suspend once, like a real listing, so concurrent expansions interleave.
        tokio::task::yield_now().await;
        if self.failing.contains(folder) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {folder}"),
            ));
        }
        self.folders
            .get(folder)
            .map(|entries| entries.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such folder: {folder}")))
    }
}

/// [`SymbolResolver`] backed by a map of file → outline. Unknown files have no symbols.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    outlines: DashMap<Locator, Vec<OutlineSymbol>>,
    failing: DashSet<Locator>,
    calls: AtomicUsize,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, file: Locator, outline: Vec<OutlineSymbol>) {
        self.outlines.insert(file, outline);
    }

    pub fn fail(&self, file: &Locator) {
        self.failing.insert(file.clone());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SymbolResolver for MemoryResolver {
    async fn outline(&self, file: &Locator) -> Result<Vec<OutlineSymbol>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(file) {
            return Err(VizualError::resolution(file, "resolver unavailable"));
        }
        Ok(self
            .outlines
            .get(file)
            .map(|outline| outline.clone())
            .unwrap_or_default())
    }
}

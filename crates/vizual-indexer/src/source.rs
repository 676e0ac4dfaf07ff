//! Directory listing collaborator

use std::io;

use async_trait::async_trait;
use vizual_core::Locator;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, is_dir: bool) -> Self {
        DirEntry {
            name: name.into(),
            is_dir,
        }
    }
}

/// Lists the direct entries of a folder.
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    async fn list(&self, folder: &Locator) -> io::Result<Vec<DirEntry>>;
}

/// [`DirectoryLister`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

#[async_trait]
impl DirectoryLister for FsLister {
    async fn list(&self, folder: &Locator) -> io::Result<Vec<DirEntry>> {
        let path = folder.to_path().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("not a file locator: {folder}"))
        })?;

        let mut reader = tokio::fs::read_dir(&path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let file_type = entry.file_type().await?;
            let is_dir = if file_type.is_symlink() {
                // Follow the link; dangling links are listed as files.
                tokio::fs::metadata(entry.path())
                    .await
                    .map(|meta| meta.is_dir())
                    .unwrap_or(false)
            } else {
                file_type.is_dir()
            };
            entries.push(DirEntry::new(entry.file_name().to_string_lossy(), is_dir));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!("Listed {} entries in {}", entries.len(), path.display());
        Ok(entries)
    }
}

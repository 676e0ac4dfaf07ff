//! Opening a node's resource outside the graph

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use vizual_core::{Locator, NodeKind, Result, SourceRange, VizualError};

/// What to open, built from a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub locator: Locator,
    pub kind: NodeKind,
    /// Set for symbols. A hint for openers that can jump to a position; openers that
    /// cannot just open the whole file.
    pub range: Option<SourceRange>,
    /// Show the resource in its containing folder instead of opening it.
    pub reveal: bool,
}

impl OpenRequest {
    /// Folders are always revealed.
    pub fn reveals(&self) -> bool {
        self.reveal || self.kind == NodeKind::Folder
    }
}

#[async_trait]
pub trait NodeOpener: Send + Sync {
    async fn open(&self, request: OpenRequest) -> Result<()>;
}

/// Opens resources with the operating system's default handler.
///
/// The OS handler takes no position, so [`OpenRequest::range`] is ignored and a symbol
/// opens its containing file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl SystemOpener {
    fn target(request: &OpenRequest) -> Result<PathBuf> {
        let path = request.locator.to_path().ok_or_else(|| {
            VizualError::Configuration(format!("cannot open non-file locator {}", request.locator))
        })?;
        if request.reveals() && request.kind != NodeKind::Folder {
            return Ok(path.parent().map(|parent| parent.to_path_buf()).unwrap_or(path));
        }
        Ok(path)
    }
}

#[async_trait]
impl NodeOpener for SystemOpener {
    async fn open(&self, request: OpenRequest) -> Result<()> {
        let target = Self::target(&request)?;
        debug!("Opening {} ({:?})", target.display(), request.kind);
        open::that_detached(&target).map_err(|source| VizualError::Io {
            locator: request.locator,
            source,
        })
    }
}

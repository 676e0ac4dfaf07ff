//! Core data structures for the code graph

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// Resource address of a file or folder, as a `file://` URI.
///
/// Graph nodes and debug frames both build locators through [`Locator::from_path`] or
/// [`Locator::parse`], so a paused frame and the file node it belongs to compare equal
/// however the incoming URI was percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wrap an already-formed locator string.
    pub fn new(uri: impl Into<String>) -> Self {
        Locator(uri.into())
    }

    /// Build a locator from a filesystem path. Relative paths are resolved against the
    /// working directory.
    pub fn from_path(path: &Path) -> Self {
        let url = Url::from_file_path(path).or_else(|()| {
            std::path::absolute(path)
                .map_err(drop)
                .and_then(Url::from_file_path)
        });
        match url {
            Ok(url) => Self::from_url(url),
            Err(()) => Locator(format!("file:///{}", path.display())),
        }
    }

    /// Normalize a locator received from an editor or a debug adapter.
    ///
    /// `file://` URIs are decoded to a path and re-encoded, plain strings are taken as
    /// filesystem paths, and any other URI scheme is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Self::from_path(&path),
                Err(()) => Self::from_url(url),
            },
            // `C:\...` parses with a one-letter scheme
            Ok(url) if url.scheme().len() > 1 => Locator(raw.to_string()),
            _ => Self::from_path(Path::new(raw)),
        }
    }

    fn from_url(mut url: Url) -> Self {
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
        }
        Locator(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem path for `file://` locators.
    pub fn to_path(&self) -> Option<PathBuf> {
        Url::parse(&self.0).ok()?.to_file_path().ok()
    }

    /// Locator of a direct child entry.
    pub fn join(&self, name: &str) -> Locator {
        let Ok(mut url) = Url::parse(&self.0) else {
            return Locator(format!("{}/{}", self.0.trim_end_matches('/'), name));
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        Locator(url.into())
    }

    /// Last path segment, decoded.
    pub fn file_name(&self) -> String {
        match self.to_path() {
            Some(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            None => self.0.rsplit('/').next().unwrap_or(&self.0).to_string(),
        }
    }

    /// Extension of the last path segment, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext.to_string())
        }
    }

    /// Slash-separated path of `self` relative to `base`, or `None` when `self` is not
    /// strictly below it.
    pub fn relative_to(&self, base: &Locator) -> Option<String> {
        let path = self.to_path()?;
        let relative = path.strip_prefix(base.to_path()?).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        let parts: Vec<_> = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect();
        Some(parts.join("/"))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique, stable identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        NodeId(value.into())
    }

    /// Filesystem nodes are identified by their locator.
    pub fn for_locator(locator: &Locator) -> Self {
        NodeId(locator.as_str().to_owned())
    }

    /// Symbol ids only depend on the file, the dotted symbol path and the start position,
    /// so re-expanding an unchanged file yields the same ids.
    pub fn for_symbol(file: &Locator, symbol_path: &str, start_line: u32, start_col: u32) -> Self {
        NodeId(format!("{file}::{symbol_path}::{start_line}:{start_col}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

/// Unique edge identifier (`from->to`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn between(from: &NodeId, to: &NodeId) -> Self {
        EdgeId(format!("{from}->{to}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminates what kind of entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    // ── Structural ──────────────────────────────────────────
    Folder,
    File,

    // ── Symbols (outline extracted) ─────────────────────────
    Class,
    Function,
    Method,
    Variable,
    Interface,
    Enum,
    Namespace,
    Property,
    Constant,
    Constructor,

    // ── Fallback ────────────────────────────────────────────
    Unknown,
}

impl NodeKind {
    /// True for outline-derived kinds.
    pub fn is_symbol(self) -> bool {
        !matches!(self, NodeKind::Folder | NodeKind::File)
    }
}

/// What kind of relationship this edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Parent structurally contains child.
    Contains,
}

/// Source span of a symbol. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceRange {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        SourceRange {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Inclusive on both ends.
    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// A single node in the code graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
    pub is_expanded: bool,
    pub is_leaf: bool,
    /// The last expansion stopped at the node limit.
    #[serde(default)]
    pub is_truncated: bool,

    // ── Debug overlay (owned by the debug tracker) ──────────
    #[serde(default)]
    pub has_breakpoint: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_debug_active: bool,
    #[serde(default)]
    pub is_debug_symbol_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_stack_depth: Option<u32>,
}

impl GraphNode {
    fn structural(locator: Locator, label: String, kind: NodeKind) -> Self {
        GraphNode {
            id: NodeId::for_locator(&locator),
            label,
            kind,
            locator: Some(locator),
            range: None,
            is_expanded: false,
            is_leaf: false,
            is_truncated: false,
            has_breakpoint: false,
            is_active: false,
            is_debug_active: false,
            is_debug_symbol_active: false,
            debug_stack_depth: None,
        }
    }

    pub fn folder(locator: Locator, label: impl Into<String>) -> Self {
        Self::structural(locator, label.into(), NodeKind::Folder)
    }

    pub fn file(locator: Locator, label: impl Into<String>) -> Self {
        Self::structural(locator, label.into(), NodeKind::File)
    }

    /// A symbol node inside `file`; `symbol_path` is the dotted path from the file root.
    pub fn symbol(
        file: &Locator,
        symbol_path: &str,
        label: impl Into<String>,
        kind: NodeKind,
        range: SourceRange,
        is_leaf: bool,
    ) -> Self {
        GraphNode {
            id: NodeId::for_symbol(file, symbol_path, range.start_line, range.start_col),
            label: label.into(),
            kind,
            locator: Some(file.clone()),
            range: Some(range),
            is_expanded: false,
            is_leaf,
            is_truncated: false,
            has_breakpoint: false,
            is_active: false,
            is_debug_active: false,
            is_debug_symbol_active: false,
            debug_stack_depth: None,
        }
    }

    /// Drop every paused-stack flag.
    pub fn clear_debug(&mut self) {
        self.is_debug_active = false;
        self.is_debug_symbol_active = false;
        self.debug_stack_depth = None;
    }
}

/// A directed edge in the code graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        GraphEdge {
            id: EdgeId::between(&from, &to),
            from,
            to,
            kind,
        }
    }
}

/// Include/exclude patterns and size limits applied while expanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    #[serde(alias = "include_patterns")]
    pub include_patterns: Vec<String>,
    #[serde(alias = "exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    /// Informational only; expansion is on demand.
    #[serde(alias = "max_depth")]
    pub max_depth: u32,
    #[serde(alias = "max_nodes")]
    pub max_nodes: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            include_patterns: vec!["**/*".to_string()],
            exclude_patterns: vec![
                "**/node_modules/**".to_string(),
                "**/.git/**".to_string(),
                "**/dist/**".to_string(),
                "**/out/**".to_string(),
                "**/*.map".to_string(),
            ],
            max_depth: 10,
            max_nodes: 1000,
        }
    }
}

impl FilterConfig {
    /// Shallow merge: every field present in `update` replaces the current one.
    pub fn merge(&mut self, update: FilterUpdate) {
        if let Some(include) = update.include_patterns {
            self.include_patterns = include;
        }
        if let Some(exclude) = update.exclude_patterns {
            self.exclude_patterns = exclude;
        }
        if let Some(max_depth) = update.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(max_nodes) = update.max_nodes {
            self.max_nodes = max_nodes;
        }
    }
}

/// Partial [`FilterConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,
}

impl From<FilterConfig> for FilterUpdate {
    fn from(config: FilterConfig) -> Self {
        FilterUpdate {
            include_patterns: Some(config.include_patterns),
            exclude_patterns: Some(config.exclude_patterns),
            max_depth: Some(config.max_depth),
            max_nodes: Some(config.max_nodes),
        }
    }
}

/// Renderer color hint. Stored and forwarded, never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default, alias = "file_extension", skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    pub color: String,
}

impl ColorRule {
    pub fn for_kind(kind: NodeKind, color: impl Into<String>) -> Self {
        ColorRule {
            kind: Some(kind),
            file_extension: None,
            color: color.into(),
        }
    }
}

pub fn default_color_rules() -> Vec<ColorRule> {
    vec![
        ColorRule::for_kind(NodeKind::Folder, "#FFD700"),
        ColorRule::for_kind(NodeKind::File, "#87CEEB"),
        ColorRule::for_kind(NodeKind::Class, "#98FB98"),
        ColorRule::for_kind(NodeKind::Function, "#DDA0DD"),
        ColorRule::for_kind(NodeKind::Method, "#F0E68C"),
        ColorRule::for_kind(NodeKind::Variable, "#FFA07A"),
        ColorRule::for_kind(NodeKind::Interface, "#B0E0E6"),
        ColorRule::for_kind(NodeKind::Enum, "#FFB6C1"),
    ]
}

/// Result of an expand request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Missing node, wrong kind, or already expanded.
    Skipped,
    /// The store was already at the node limit; nothing changed.
    LimitReached { max_nodes: usize },
    /// Children were materialized.
    Expanded { added: usize, truncated: bool },
    /// The node turned out to have no children.
    Leaf,
}

impl ExpandOutcome {
    /// User-facing warning, if this outcome warrants one.
    pub fn notice(&self) -> Option<String> {
        match self {
            ExpandOutcome::LimitReached { max_nodes } => Some(format!(
                "Node limit ({max_nodes}) reached. Increase limit in filters."
            )),
            _ => None,
        }
    }
}

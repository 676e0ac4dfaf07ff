//! Symbol resolution collaborator and its classification vocabulary

use async_trait::async_trait;
use vizual_core::{Locator, NodeKind, Result, SourceRange};

/// Symbol classification, modeled on the language-server vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Key,
    Null,
    EnumMember,
    Struct,
    Event,
    Operator,
    TypeParameter,
}

impl SymbolKind {
    pub fn node_kind(self) -> NodeKind {
        match self {
            SymbolKind::Class | SymbolKind::Struct => NodeKind::Class,
            SymbolKind::Function => NodeKind::Function,
            SymbolKind::Method => NodeKind::Method,
            SymbolKind::Variable => NodeKind::Variable,
            SymbolKind::Interface => NodeKind::Interface,
            SymbolKind::Enum => NodeKind::Enum,
            SymbolKind::Namespace | SymbolKind::Module => NodeKind::Namespace,
            SymbolKind::Property | SymbolKind::Field => NodeKind::Property,
            SymbolKind::Constant => NodeKind::Constant,
            SymbolKind::Constructor => NodeKind::Constructor,
            _ => NodeKind::Unknown,
        }
    }
}

/// One entry of a hierarchical outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub range: SourceRange,
    pub children: Vec<OutlineSymbol>,
}

impl OutlineSymbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: SourceRange) -> Self {
        OutlineSymbol {
            name: name.into(),
            kind,
            range,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineSymbol>) -> Self {
        self.children = children;
        self
    }

    /// Number of symbols in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineSymbol::count).sum::<usize>()
    }
}

/// Produces the symbol outline of a file.
#[async_trait]
pub trait SymbolResolver: Send + Sync {
    async fn outline(&self, file: &Locator) -> Result<Vec<OutlineSymbol>>;
}

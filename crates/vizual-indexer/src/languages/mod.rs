//! Tree-sitter outline extraction

pub mod go;
pub mod python;
pub mod rust;
pub mod typescript;

use async_trait::async_trait;
use tree_sitter::{Node, Tree};
use vizual_core::{Locator, Result, SourceRange, VizualError};

use crate::outline::{OutlineSymbol, SymbolKind, SymbolResolver};
use crate::parser_pool::{FileType, ParseRequest, ParserPool, create_parser_pool};

/// Where a declaration sits; decides method vs function and whether variables count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Module,
    Type,
    Callable,
}

impl Scope {
    fn enter(self, kind: SymbolKind) -> Scope {
        match kind {
            SymbolKind::Class
            | SymbolKind::Struct
            | SymbolKind::Interface
            | SymbolKind::Enum
            | SymbolKind::Object => Scope::Type,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Constructor => Scope::Callable,
            SymbolKind::Module | SymbolKind::Namespace => Scope::Module,
            _ => self,
        }
    }

    /// Functions declared directly in a type body are methods.
    pub fn callable_kind(self) -> SymbolKind {
        if self == Scope::Type {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        }
    }
}

/// A syntax node recognized as a symbol.
pub struct Declared<'tree> {
    pub name: String,
    pub kind: SymbolKind,
    /// Node whose named children hold nested symbols.
    pub body: Option<Node<'tree>>,
}

impl<'tree> Declared<'tree> {
    pub fn new(name: impl Into<String>, kind: SymbolKind, body: Option<Node<'tree>>) -> Self {
        Declared {
            name: name.into(),
            kind,
            body,
        }
    }
}

/// Per-language recognition of declarations.
pub trait Grammar: Sync {
    /// `None` means the node is not a symbol; its children are still searched.
    fn declared<'tree>(&self, node: Node<'tree>, source: &[u8], scope: Scope) -> Option<Declared<'tree>>;
}

fn grammar_for(file_type: FileType) -> &'static dyn Grammar {
    match file_type {
        FileType::Rust => &rust::RustGrammar,
        FileType::TypeScript | FileType::Tsx | FileType::JavaScript => &typescript::TypeScriptGrammar,
        FileType::Python => &python::PythonGrammar,
        FileType::Go => &go::GoGrammar,
    }
}

/// Hierarchical outline of a parsed file.
pub fn outline(file_type: FileType, tree: &Tree, source: &str) -> Vec<OutlineSymbol> {
    let mut symbols = Vec::new();
    collect(
        grammar_for(file_type),
        tree.root_node(),
        source.as_bytes(),
        Scope::Module,
        &mut symbols,
    );
    symbols
}

fn collect(grammar: &dyn Grammar, node: Node<'_>, source: &[u8], scope: Scope, out: &mut Vec<OutlineSymbol>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match grammar.declared(child, source, scope) {
            Some(declared) => {
                let mut children = Vec::new();
                if let Some(body) = declared.body {
                    collect(grammar, body, source, scope.enter(declared.kind), &mut children);
                }
                out.push(OutlineSymbol {
                    name: declared.name,
                    kind: declared.kind,
                    range: range_of(child),
                    children,
                });
            }
            None => collect(grammar, child, source, scope, out),
        }
    }
}

/// 1-based span of a syntax node.
pub fn range_of(node: Node<'_>) -> SourceRange {
    let start = node.start_position();
    let end = node.end_position();
    SourceRange::new(
        start.row as u32 + 1,
        start.column as u32 + 1,
        end.row as u32 + 1,
        end.column as u32 + 1,
    )
}

pub fn text_of(node: Node<'_>, source: &[u8]) -> Option<String> {
    node.utf8_text(source).ok().map(str::to_string)
}

pub fn field_text(node: Node<'_>, field: &str, source: &[u8]) -> Option<String> {
    text_of(node.child_by_field_name(field)?, source)
}

/// [`SymbolResolver`] reading files from disk and parsing them with tree-sitter.
/// Files without a supported grammar have an empty outline.
#[derive(Debug, Clone)]
pub struct TreeSitterResolver {
    pool: ParserPool,
}

impl TreeSitterResolver {
    pub fn new() -> Self {
        Self::with_pool(create_parser_pool())
    }

    pub fn with_pool(pool: ParserPool) -> Self {
        TreeSitterResolver { pool }
    }
}

impl Default for TreeSitterResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SymbolResolver for TreeSitterResolver {
    async fn outline(&self, file: &Locator) -> Result<Vec<OutlineSymbol>> {
        let Some(file_type) = file.extension().as_deref().and_then(FileType::from_extension) else {
            return Ok(Vec::new());
        };
        let path = file
            .to_path()
            .ok_or_else(|| VizualError::resolution(file, "not a file locator"))?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| VizualError::resolution(file, e))?;

        let parsed = self
            .pool
            .parse(ParseRequest { file_type, content })
            .await
            .map_err(|e| VizualError::resolution(file, e))?;
        let symbols = outline(parsed.file_type, &parsed.tree, &parsed.content);

        tracing::debug!("Resolved {} top-level symbols in {}", symbols.len(), file);
        Ok(symbols)
    }
}

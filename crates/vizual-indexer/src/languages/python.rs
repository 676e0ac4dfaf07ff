//! Python outline grammar

use tree_sitter::Node;

use super::{Declared, Grammar, Scope, field_text, text_of};
use crate::outline::SymbolKind;

pub struct PythonGrammar;

impl Grammar for PythonGrammar {
    fn declared<'tree>(&self, node: Node<'tree>, source: &[u8], scope: Scope) -> Option<Declared<'tree>> {
        let body = node.child_by_field_name("body");

        match node.kind() {
            "function_definition" => {
                let name = field_text(node, "name", source)?;
                let kind = match scope {
                    Scope::Type if name == "__init__" => SymbolKind::Constructor,
                    _ => scope.callable_kind(),
                };
                Some(Declared::new(name, kind, body))
            }
            "class_definition" => Some(Declared::new(field_text(node, "name", source)?, SymbolKind::Class, body)),
            "assignment" if scope != Scope::Callable => {
                let left = node.child_by_field_name("left")?;
                if left.kind() != "identifier" {
                    return None;
                }
                let name = text_of(left, source)?;
                let kind = if name.chars().all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit()) {
                    SymbolKind::Constant
                } else {
                    SymbolKind::Variable
                };
                Some(Declared::new(name, kind, None))
            }
            _ => None,
        }
    }
}

//! Rust outline grammar

use tree_sitter::Node;

use super::{Declared, Grammar, Scope, field_text};
use crate::outline::SymbolKind;

pub struct RustGrammar;

impl Grammar for RustGrammar {
    fn declared<'tree>(&self, node: Node<'tree>, source: &[u8], scope: Scope) -> Option<Declared<'tree>> {
        let name = || field_text(node, "name", source);
        let body = node.child_by_field_name("body");

        let declared = match node.kind() {
            "function_item" | "function_signature_item" => Declared::new(name()?, scope.callable_kind(), body),
            "struct_item" | "union_item" => Declared::new(name()?, SymbolKind::Struct, body),
            "enum_item" => Declared::new(name()?, SymbolKind::Enum, body),
            "enum_variant" => Declared::new(name()?, SymbolKind::EnumMember, None),
            "field_declaration" => Declared::new(name()?, SymbolKind::Field, None),
            "trait_item" => Declared::new(name()?, SymbolKind::Interface, body),
            "impl_item" => {
                let ty = field_text(node, "type", source)?;
                let label = match field_text(node, "trait", source) {
                    Some(tr) => format!("impl {tr} for {ty}"),
                    None => format!("impl {ty}"),
                };
                Declared::new(label, SymbolKind::Object, body)
            }
            "mod_item" => Declared::new(name()?, SymbolKind::Module, body),
            "const_item" if scope != Scope::Callable => Declared::new(name()?, SymbolKind::Constant, None),
            "static_item" if scope != Scope::Callable => Declared::new(name()?, SymbolKind::Variable, None),
            "type_item" => Declared::new(name()?, SymbolKind::TypeParameter, None),
            _ => return None,
        };
        Some(declared)
    }
}

//! Go outline grammar

use tree_sitter::Node;

use super::{Declared, Grammar, Scope, field_text};
use crate::outline::SymbolKind;

pub struct GoGrammar;

impl Grammar for GoGrammar {
    fn declared<'tree>(&self, node: Node<'tree>, source: &[u8], scope: Scope) -> Option<Declared<'tree>> {
        let name = || field_text(node, "name", source);

        let declared = match node.kind() {
            "function_declaration" => {
                Declared::new(name()?, SymbolKind::Function, node.child_by_field_name("body"))
            }
            "method_declaration" => Declared::new(name()?, SymbolKind::Method, node.child_by_field_name("body")),
            "type_spec" | "type_alias" => {
                let ty = node.child_by_field_name("type")?;
                match ty.kind() {
                    "struct_type" => Declared::new(name()?, SymbolKind::Struct, Some(ty)),
                    "interface_type" => Declared::new(name()?, SymbolKind::Interface, Some(ty)),
                    _ => Declared::new(name()?, SymbolKind::Class, None),
                }
            }
            "field_declaration" => Declared::new(name()?, SymbolKind::Field, None),
            "method_elem" | "method_spec" => Declared::new(name()?, SymbolKind::Method, None),
            "const_spec" if scope != Scope::Callable => Declared::new(name()?, SymbolKind::Constant, None),
            "var_spec" if scope != Scope::Callable => Declared::new(name()?, SymbolKind::Variable, None),
            _ => return None,
        };
        Some(declared)
    }
}

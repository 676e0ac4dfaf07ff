//! TypeScript / JavaScript outline grammar (TSX and JSX included)

use tree_sitter::Node;

use super::{Declared, Grammar, Scope, field_text, text_of};
use crate::outline::SymbolKind;

pub struct TypeScriptGrammar;

impl Grammar for TypeScriptGrammar {
    fn declared<'tree>(&self, node: Node<'tree>, source: &[u8], scope: Scope) -> Option<Declared<'tree>> {
        let name = || field_text(node, "name", source);
        let body = node.child_by_field_name("body");

        let declared = match node.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                Declared::new(name()?, scope.callable_kind(), body)
            }
            "class_declaration" | "abstract_class_declaration" => Declared::new(name()?, SymbolKind::Class, body),
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                let name = name()?;
                let kind = if name == "constructor" {
                    SymbolKind::Constructor
                } else {
                    SymbolKind::Method
                };
                Declared::new(name, kind, body)
            }
            "public_field_definition" | "property_signature" => Declared::new(name()?, SymbolKind::Property, None),
            "field_definition" => Declared::new(field_text(node, "property", source)?, SymbolKind::Property, None),
            "interface_declaration" => Declared::new(name()?, SymbolKind::Interface, body),
            "enum_declaration" => Declared::new(name()?, SymbolKind::Enum, body),
            "enum_assignment" => Declared::new(name()?, SymbolKind::EnumMember, None),
            "property_identifier" if node.parent().is_some_and(|p| p.kind() == "enum_body") => {
                Declared::new(text_of(node, source)?, SymbolKind::EnumMember, None)
            }
            "internal_module" | "module" => Declared::new(name()?, SymbolKind::Namespace, body),
            "variable_declarator" => return variable(node, source, scope),
            _ => return None,
        };
        Some(declared)
    }
}

/// `const f = () => {}` is a function; plain bindings count only outside callables.
fn variable<'tree>(node: Node<'tree>, source: &[u8], scope: Scope) -> Option<Declared<'tree>> {
    let name_node = node.child_by_field_name("name")?;
    if name_node.kind() != "identifier" {
        return None;
    }
    let name = text_of(name_node, source)?;
    let value = node.child_by_field_name("value");

    match value.map(|v| v.kind()) {
        Some("arrow_function" | "function_expression" | "function" | "generator_function") => Some(
            Declared::new(name, SymbolKind::Function, value.and_then(|v| v.child_by_field_name("body"))),
        ),
        Some("class") => Some(Declared::new(
            name,
            SymbolKind::Class,
            value.and_then(|v| v.child_by_field_name("body")),
        )),
        _ if scope == Scope::Callable => None,
        _ => {
            let is_const = node.parent().is_some_and(|decl| {
                decl.kind() == "lexical_declaration" && decl.child(0).is_some_and(|kw| kw.kind() == "const")
            });
            let kind = if is_const {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };
            Some(Declared::new(name, kind, None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{names, outline_of};
    use crate::outline::SymbolKind;
    use crate::parser_pool::FileType;

    #[test]
    fn test_typescript_outline() {
        let source = r#"
import { UserService } from './services/user';

export const VERSION = "1.0";
let counter = 0;

export class UserController {
    private service: UserService;

    constructor(service: UserService) {
        this.service = service;
    }

    getUser(id: string): User {
        const cached = lookup(id);
        return this.service.findById(id);
    }
}

interface User {
    id: string;
}

export function createController(service: UserService): UserController {
    return new UserController(service);
}

const handler = (event: string) => {
    const inner = 1;
};
"#;
        let symbols = outline_of(FileType::TypeScript, source);
        assert_eq!(
            names(&symbols),
            vec![
                ("VERSION", SymbolKind::Constant),
                ("counter", SymbolKind::Variable),
                ("UserController", SymbolKind::Class),
                ("User", SymbolKind::Interface),
                ("createController", SymbolKind::Function),
                ("handler", SymbolKind::Function),
            ]
        );
        assert_eq!(
            names(&symbols[2].children),
            vec![
                ("service", SymbolKind::Property),
                ("constructor", SymbolKind::Constructor),
                ("getUser", SymbolKind::Method),
            ]
        );
        assert!(symbols[2].children[2].children.is_empty());
        assert_eq!(names(&symbols[3].children), vec![("id", SymbolKind::Property)]);
        assert!(symbols[5].children.is_empty());
    }

    #[test]
    fn test_javascript_outline() {
        let source = "class Greeter {\n  greet() { return 1; }\n}\nfunction main() {}\n";
        let symbols = outline_of(FileType::JavaScript, source);
        assert_eq!(
            names(&symbols),
            vec![("Greeter", SymbolKind::Class), ("main", SymbolKind::Function)]
        );
        assert_eq!(names(&symbols[0].children), vec![("greet", SymbolKind::Method)]);
    }
}

//! Swift client generation.
//!
//! Records are `Codable` final classes, so self-referencing records need no
//! indirection and nested records decode through `JSONDecoder`. Every file of
//! one output directory lives in the same module: planner imports are not
//! rendered.

use heck::ToLowerCamelCase;
use rpcgen_types::{
    Declaration, DeclarationShape, EnumValueKind, Literal, Node, ParameterDefinition, Program,
    PropertyDefinition, Result,
};

use super::{Emitter, TargetLanguage, render_declarations};
use crate::planner::FilePlan;
use crate::render::{
    DocStyle, doc_lines, documented, field_idents, fq_name, module_path, nullable, param_idents,
    quote, safe_ident, trailing_optional,
};
use crate::template;
use crate::view::{ClientView, MethodView, ModelView, RuntimeView};
use crate::{Metadata, REMOTE_URL_PLACEHOLDER};

const CLIENT: &str = include_str!("../../templates/swift/client.jinja");
const MODEL: &str = include_str!("../../templates/swift/model.jinja");
const RUNTIME: &str = include_str!("../../templates/swift/runtime.jinja");

const RESERVED: &[&str] = &[
    "Any", "Self", "as", "associatedtype", "break", "case", "catch", "class", "continue",
    "default", "defer", "deinit", "do", "else", "enum", "extension", "fallthrough", "false",
    "fileprivate", "for", "func", "guard", "if", "import", "in", "init", "inout", "internal",
    "is", "let", "nil", "open", "operator", "private", "protocol", "public", "repeat",
    "rethrows", "return", "self", "static", "struct", "subscript", "super", "switch", "throw",
    "throws", "true", "try", "typealias", "var", "where", "while",
];

const TOP: &[&str] = &["AnyCodable?"];

pub struct Swift;

pub fn swift_type(node: &Node) -> String {
    match node {
        Node::String => "String".into(),
        Node::Integer => "Int".into(),
        Node::Double => "Double".into(),
        Node::Float => "Float".into(),
        Node::Boolean => "Bool".into(),
        Node::Void => "Void".into(),
        Node::Null => "AnyCodable?".into(),
        Node::Any => "AnyCodable".into(),
        Node::Date => "Date".into(),
        Node::Array(inner) => format!("[{}]", swift_type(inner)),
        Node::Map { key, value } => {
            let key = match key.as_ref() {
                Node::Integer => "Int",
                Node::Double => "Double",
                _ => "String",
            };
            format!("[{key}: {}]", swift_type(value))
        }
        Node::Promise(inner) => swift_type(inner),
        Node::Union(_) => match node.nullable_inner() {
            Some(inner) => nullable(&swift_type(inner), TOP),
            None => "AnyCodable".into(),
        },
        Node::NamedReference(r) => r.name.clone(),
        Node::TypeLiteral(_) => "[String: AnyCodable]".into(),
    }
}

fn literal(value: &Literal) -> String {
    match value {
        Literal::String(s) => quote(s, false),
        Literal::Number(n) => n.clone(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "nil".into(),
    }
}

fn params(params: &[ParameterDefinition]) -> String {
    let trailing = trailing_optional(params);
    params
        .iter()
        .zip(param_idents(params, RESERVED))
        .zip(trailing)
        .map(|((p, name), trailing)| {
            let ty = swift_type(&p.ty);
            match (&p.default_value, trailing) {
                (Some(value), true) => format!("{name}: {ty} = {}", literal(value)),
                (None, true) => format!("{name}: {} = nil", nullable(&ty, TOP)),
                (_, false) => format!("{name}: {ty}"),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn field_type(field: &PropertyDefinition) -> String {
    let ty = swift_type(&field.ty);
    if field.optional { nullable(&ty, TOP) } else { ty }
}

fn render_record(name: &str, fields: &[PropertyDefinition]) -> String {
    let idents = field_idents(fields, RESERVED);
    let ident = |p: &PropertyDefinition| idents[p.name.as_str()].clone();
    let mut out = format!("public final class {name}: Codable {{\n");
    for field in fields {
        out.push_str(&format!("    public var {}: {}\n", ident(field), field_type(field)));
    }

    let ordered = PropertyDefinition::required_first(fields);
    let args: Vec<String> = ordered
        .iter()
        .map(|&field| {
            let ty = field_type(field);
            if ty.ends_with('?') {
                format!("{}: {ty} = nil", ident(field))
            } else {
                format!("{}: {ty}", ident(field))
            }
        })
        .collect();
    if !fields.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!("    public init({}) {{\n", args.join(", ")));
    for &field in &ordered {
        let n = ident(field);
        out.push_str(&format!("        self.{n} = {n}\n"));
    }
    out.push_str("    }\n");

    if fields.iter().any(|f| ident(f) != f.name) {
        out.push_str("\n    enum CodingKeys: String, CodingKey {\n");
        for field in fields {
            let n = ident(field);
            if n == field.name {
                out.push_str(&format!("        case {n}\n"));
            } else {
                out.push_str(&format!("        case {n} = {}\n", quote(&field.name, false)));
            }
        }
        out.push_str("    }\n");
    }
    out.push('}');
    out
}

impl Emitter for Swift {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Swift
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn render_type(&self, node: &Node) -> String {
        swift_type(node)
    }

    fn client_path(&self, program: &Program) -> String {
        format!("{}.sdk.swift", program.class.name.to_lower_camel_case())
    }

    fn model_path(&self, declaring_path: &str) -> String {
        format!("{}.swift", module_path(declaring_path))
    }

    fn runtime_path(&self) -> &'static str {
        "remote.swift"
    }

    fn render_declaration(&self, decl: &Declaration) -> Result<String> {
        let body = match &decl.shape {
            DeclarationShape::StructLiteral { fields } => render_record(&decl.name, fields),
            // A raw-value enum needs at least one case.
            DeclarationShape::Enum { cases } if cases.is_empty() => {
                decl.enum_value_kind()?;
                format!("public typealias {} = Int", decl.name)
            }
            DeclarationShape::Enum { cases } => {
                let raw = match decl.enum_value_kind()? {
                    Some(EnumValueKind::String) => "String",
                    _ if cases.iter().all(|c| match &c.value {
                        Literal::Number(n) => n.parse::<i64>().is_ok(),
                        _ => false,
                    }) =>
                    {
                        "Int"
                    }
                    _ => "Double",
                };
                let mut out = format!("public enum {}: {raw}, Codable {{\n", decl.name);
                for case in cases {
                    out.push_str(&format!(
                        "    case {} = {}\n",
                        safe_ident(&case.name.to_lower_camel_case(), RESERVED),
                        literal(&case.value)
                    ));
                }
                out.push('}');
                out
            }
            DeclarationShape::TypeAlias { alias } => {
                format!("public typealias {} = {}", decl.name, swift_type(alias))
            }
        };
        Ok(documented(decl.docs.as_deref(), DocStyle::TripleSlash, body))
    }

    fn render_class(
        &self,
        program: &Program,
        file: &FilePlan<'_>,
        _metadata: &Metadata,
    ) -> Result<String> {
        let class = &program.class;
        let methods = class
            .exposed_methods()
            .map(|m| {
                let returns = m.return_type.awaited();
                MethodView {
                    name: safe_ident(&m.name, RESERVED),
                    fq_name: fq_name(&class.name, &m.name),
                    params: params(&m.params),
                    args: param_idents(&m.params, RESERVED).join(", "),
                    return_type: swift_type(returns),
                    returns_void: matches!(returns, Node::Void),
                    docs: doc_lines(m.docs.as_deref(), DocStyle::TripleSlash, "    "),
                    ..MethodView::default()
                }
            })
            .collect();

        let view = ClientView {
            class_name: class.name.clone(),
            docs: doc_lines(class.docs.as_deref(), DocStyle::TripleSlash, ""),
            url: REMOTE_URL_PLACEHOLDER,
            runtime_import: String::new(),
            imports: Vec::new(),
            declarations: render_declarations(self, file)?,
            methods,
            package: String::new(),
        };
        template::render(self.language(), "client.swift", CLIENT, view)
    }

    fn render_model_file(&self, file: &FilePlan<'_>, _metadata: &Metadata) -> Result<String> {
        let view = ModelView {
            imports: Vec::new(),
            declarations: render_declarations(self, file)?,
            package: String::new(),
        };
        template::render(self.language(), "model.swift", MODEL, view)
    }

    fn render_runtime(&self, metadata: &Metadata) -> Result<String> {
        let view = RuntimeView {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            package: String::new(),
        };
        template::render(self.language(), "remote.swift", RUNTIME, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcgen_types::RefKind;

    #[test]
    fn unions_fall_back_to_any_codable() {
        let user = Node::reference("User", "m", RefKind::Struct);
        assert_eq!(swift_type(&Node::Union(vec![user.clone(), Node::Null])), "User?");
        assert_eq!(swift_type(&Node::Union(vec![user, Node::String])), "AnyCodable");
        assert_eq!(swift_type(&Node::Union(vec![Node::Any, Node::Null])), "AnyCodable?");
    }

    #[test]
    fn renamed_fields_keep_their_coding_keys() {
        let rendered = render_record(
            "Options",
            &[
                PropertyDefinition::optional("default", Node::String),
                PropertyDefinition::new("id", Node::Double),
            ],
        );
        assert!(rendered.contains("public init(id: Double, default_: String? = nil) {"));
        assert!(rendered.contains("case default_ = \"default\""));
        assert!(rendered.contains("        case id\n"));
    }

    #[test]
    fn renamed_fields_keep_clear_of_declared_ones() {
        let rendered = render_record(
            "Options",
            &[
                PropertyDefinition::new("default", Node::String),
                PropertyDefinition::new("default_", Node::Double),
            ],
        );
        assert!(rendered.contains("    public var default__: String\n"), "{rendered}");
        assert!(rendered.contains("    public var default_: Double\n"), "{rendered}");
        assert!(rendered.contains("case default__ = \"default\""), "{rendered}");
        assert!(rendered.contains("        case default_\n"), "{rendered}");
    }
}

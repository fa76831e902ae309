//! TypeScript client generation.
//!
//! Records become `export type` object types and enums become native enums.
//! Every union is native. Promise return types are wrapped exactly once.

use heck::ToLowerCamelCase;
use rpcgen_types::{
    Declaration, DeclarationShape, Literal, Node, ParameterDefinition, Program, Result,
};

use super::{Emitter, TargetLanguage, render_declarations};
use crate::planner::FilePlan;
use crate::render::{
    DocStyle, doc_lines, documented, fq_name, module_path, param_idents, quote, relative_path,
};
use crate::template;
use crate::view::{ClientView, ImportView, MethodView, ModelView, RuntimeView};
use crate::{Metadata, REMOTE_URL_PLACEHOLDER};

const CLIENT: &str = include_str!("../../templates/typescript/client.jinja");
const MODEL: &str = include_str!("../../templates/typescript/model.jinja");
const RUNTIME: &str = include_str!("../../templates/typescript/runtime.jinja");

pub(crate) const RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub struct TypeScript;

/// TypeScript spelling of a type.
pub fn ts_type(node: &Node) -> String {
    match node {
        Node::String => "string".into(),
        Node::Integer | Node::Double | Node::Float => "number".into(),
        Node::Boolean => "boolean".into(),
        Node::Void => "void".into(),
        Node::Null => "null".into(),
        Node::Any => "any".into(),
        Node::Date => "Date".into(),
        Node::Array(inner) => match inner.as_ref() {
            Node::Union(params) if params.len() > 1 => format!("({})[]", ts_type(inner)),
            _ => format!("{}[]", ts_type(inner)),
        },
        Node::Map { key, value } => format!("Record<{}, {}>", ts_key(key), ts_type(value)),
        Node::Promise(inner) => format!("Promise<{}>", ts_type(inner)),
        Node::Union(params) if params.is_empty() => "any".into(),
        Node::Union(params) => params.iter().map(ts_type).collect::<Vec<_>>().join(" | "),
        Node::NamedReference(r) => r.name.clone(),
        Node::TypeLiteral(props) if props.is_empty() => "{}".into(),
        Node::TypeLiteral(props) => {
            let fields: Vec<String> = props
                .iter()
                .map(|p| {
                    let q = if p.optional { "?" } else { "" };
                    format!("{}{q}: {}", prop_name(&p.name), ts_type(&p.ty))
                })
                .collect();
            format!("{{ {} }}", fields.join("; "))
        }
    }
}

/// Record keys must be string-like.
fn ts_key(key: &Node) -> String {
    match key {
        Node::String | Node::Integer | Node::Double | Node::Float => ts_type(key),
        Node::NamedReference(r) if r.kind == rpcgen_types::RefKind::Enum => r.name.clone(),
        _ => "string".into(),
    }
}

/// Property names are kept as declared and quoted when they are not plain
/// identifiers.
pub(crate) fn prop_name(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if plain { name.to_string() } else { quote(name, false) }
}

pub(crate) fn literal(value: &Literal) -> String {
    match value {
        Literal::String(s) => quote(s, false),
        Literal::Number(n) => n.clone(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "null".into(),
    }
}

fn param(p: &ParameterDefinition, name: &str) -> String {
    let ty = ts_type(&p.ty);
    match (&p.default_value, p.optional) {
        (Some(value), _) => format!("{name}: {ty} = {}", literal(value)),
        (None, true) => format!("{name}?: {ty}"),
        (None, false) => format!("{name}: {ty}"),
    }
}

/// `./src/models/user.ts` → `./src/models/user`
fn import_specifier(from: &str, to: &str) -> String {
    let rel = relative_path(from, to);
    rel.strip_suffix(".ts").map(str::to_string).unwrap_or(rel)
}

impl Emitter for TypeScript {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::TypeScript
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn render_type(&self, node: &Node) -> String {
        ts_type(node)
    }

    fn client_path(&self, program: &Program) -> String {
        format!("{}.sdk.ts", program.class.name.to_lower_camel_case())
    }

    fn model_path(&self, declaring_path: &str) -> String {
        format!("{}.ts", module_path(declaring_path))
    }

    fn runtime_path(&self) -> &'static str {
        "remote.ts"
    }

    fn render_declaration(&self, decl: &Declaration) -> Result<String> {
        let mut out = String::new();
        match &decl.shape {
            DeclarationShape::StructLiteral { fields } => {
                out.push_str(&format!("export type {} = {{\n", decl.name));
                for field in fields {
                    let q = if field.optional { "?" } else { "" };
                    out.push_str(&format!(
                        "  {}{q}: {};\n",
                        prop_name(&field.name),
                        ts_type(&field.ty)
                    ));
                }
                out.push_str("};");
            }
            DeclarationShape::Enum { cases } => {
                decl.enum_value_kind()?;
                out.push_str(&format!("export enum {} {{\n", decl.name));
                for case in cases {
                    out.push_str(&format!(
                        "  {} = {},\n",
                        prop_name(&case.name),
                        literal(&case.value)
                    ));
                }
                out.push('}');
            }
            DeclarationShape::TypeAlias { alias } => {
                out.push_str(&format!("export type {} = {};", decl.name, ts_type(alias)));
            }
        }
        Ok(documented(decl.docs.as_deref(), DocStyle::Block, out))
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
                let idents = param_idents(&m.params, RESERVED);
                MethodView {
                    name: m.name.clone(),
                    fq_name: fq_name(&class.name, &m.name),
                    params: m
                        .params
                        .iter()
                        .zip(&idents)
                        .map(|(p, name)| param(p, name))
                        .collect::<Vec<_>>()
                        .join(", "),
                    args: idents.join(", "),
                    return_type: format!("Promise<{}>", ts_type(returns)),
                    returns_void: matches!(returns, Node::Void),
                    docs: doc_lines(m.docs.as_deref(), DocStyle::Block, "  "),
                    ..MethodView::default()
                }
            })
            .collect();

        let view = ClientView {
            class_name: class.name.clone(),
            docs: doc_lines(class.docs.as_deref(), DocStyle::Block, ""),
            url: REMOTE_URL_PLACEHOLDER,
            runtime_import: import_specifier(&file.path, self.runtime_path()),
            imports: ImportView::from_plan(&file.imports, |to| {
                Some(import_specifier(&file.path, to))
            }),
            declarations: render_declarations(self, file)?,
            methods,
            package: String::new(),
        };
        template::render(self.language(), "client.ts", CLIENT, view)
    }

    fn render_model_file(&self, file: &FilePlan<'_>, _metadata: &Metadata) -> Result<String> {
        let view = ModelView {
            imports: ImportView::from_plan(&file.imports, |to| {
                Some(import_specifier(&file.path, to))
            }),
            declarations: render_declarations(self, file)?,
            package: String::new(),
        };
        template::render(self.language(), "model.ts", MODEL, view)
    }

    fn render_runtime(&self, metadata: &Metadata) -> Result<String> {
        let view = RuntimeView {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            package: String::new(),
        };
        template::render(self.language(), "remote.ts", RUNTIME, view)
    }
}

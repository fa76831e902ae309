//! JavaScript client generation.
//!
//! JavaScript has no type declarations to emit. Types survive only as JSDoc:
//! method annotations, plus `@typedef` blocks for the declarations a client
//! reaches, written into the client file itself.

use heck::ToLowerCamelCase;
use rpcgen_types::{
    Declaration, DeclarationShape, Error, Node, ParameterDefinition, Program, Result,
};

use super::typescript::{RESERVED, literal, prop_name};
use super::{Emitter, TargetLanguage};
use crate::planner::{FilePlan, reachable_declarations};
use crate::render::{DocStyle, doc_lines, fq_name, param_idents, relative_path};
use crate::template;
use crate::view::{ClientView, MethodView, RuntimeView};
use crate::{Metadata, REMOTE_URL_PLACEHOLDER};

const CLIENT: &str = include_str!("../../templates/javascript/client.jinja");
const RUNTIME: &str = include_str!("../../templates/javascript/runtime.jinja");

pub struct JavaScript;

/// JSDoc spelling of a type.
pub fn jsdoc_type(node: &Node) -> String {
    match node {
        Node::String => "string".into(),
        Node::Integer | Node::Double | Node::Float => "number".into(),
        Node::Boolean => "boolean".into(),
        Node::Void => "void".into(),
        Node::Null => "null".into(),
        Node::Any => "*".into(),
        Node::Date => "Date".into(),
        Node::Array(inner) => format!("Array<{}>", jsdoc_type(inner)),
        Node::Map { key, value } => format!("Object<{}, {}>", jsdoc_type(key), jsdoc_type(value)),
        Node::Promise(inner) => format!("Promise<{}>", jsdoc_type(inner)),
        Node::Union(params) if params.is_empty() => "*".into(),
        Node::Union(params) => {
            let parts: Vec<String> = params.iter().map(jsdoc_type).collect();
            format!("({})", parts.join("|"))
        }
        Node::NamedReference(r) => r.name.clone(),
        Node::TypeLiteral(props) if props.is_empty() => "Object".into(),
        Node::TypeLiteral(props) => {
            let fields: Vec<String> = props
                .iter()
                .map(|p| {
                    let ty = jsdoc_type(&p.ty);
                    if p.optional {
                        format!("{}: ({ty}|undefined)", prop_name(&p.name))
                    } else {
                        format!("{}: {ty}", prop_name(&p.name))
                    }
                })
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

fn param(p: &ParameterDefinition, name: &str) -> String {
    match &p.default_value {
        Some(value) => format!("{name} = {}", literal(value)),
        None => name.to_string(),
    }
}

fn param_doc(p: &ParameterDefinition, name: &str) -> String {
    let ty = jsdoc_type(&p.ty);
    match (&p.default_value, p.optional) {
        (Some(value), _) => format!("@param {{{ty}}} [{name}={}]", literal(value)),
        (None, true) => format!("@param {{{ty}}} [{name}]"),
        (None, false) => format!("@param {{{ty}}} {name}"),
    }
}

impl Emitter for JavaScript {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::JavaScript
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn render_type(&self, node: &Node) -> String {
        jsdoc_type(node)
    }

    fn client_path(&self, program: &Program) -> String {
        format!("{}.sdk.js", program.class.name.to_lower_camel_case())
    }

    fn model_path(&self, declaring_path: &str) -> String {
        format!("{declaring_path}.js")
    }

    fn runtime_path(&self) -> &'static str {
        "remote.js"
    }

    fn emits_declarations(&self) -> bool {
        false
    }

    /// A JSDoc `@typedef` block.
    fn render_declaration(&self, decl: &Declaration) -> Result<String> {
        let mut out = String::from("/**\n");
        if let Some(docs) = decl.docs.as_deref() {
            for line in docs.lines() {
                out.push_str(format!(" * {line}").trim_end());
                out.push('\n');
            }
        }
        match &decl.shape {
            DeclarationShape::StructLiteral { fields } => {
                out.push_str(&format!(" * @typedef {{Object}} {}\n", decl.name));
                for field in fields {
                    let ty = jsdoc_type(&field.ty);
                    if field.optional {
                        out.push_str(&format!(" * @property {{{ty}}} [{}]\n", field.name));
                    } else {
                        out.push_str(&format!(" * @property {{{ty}}} {}\n", field.name));
                    }
                }
            }
            DeclarationShape::Enum { cases } => {
                decl.enum_value_kind()?;
                let values: Vec<String> = cases.iter().map(|c| literal(&c.value)).collect();
                let values = if values.is_empty() { "*".to_string() } else { values.join("|") };
                out.push_str(&format!(" * @typedef {{({values})}} {}\n", decl.name));
            }
            DeclarationShape::TypeAlias { alias } => {
                out.push_str(&format!(" * @typedef {{{}}} {}\n", jsdoc_type(alias), decl.name));
            }
        }
        out.push_str(" */");
        Ok(out)
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
                let mut tags: Vec<String> =
                    m.params.iter().zip(&idents).map(|(p, name)| param_doc(p, name)).collect();
                tags.push(format!("@returns {{Promise<{}>}}", jsdoc_type(returns)));
                let docs = match m.docs.as_deref() {
                    Some(description) => format!("{description}\n\n{}", tags.join("\n")),
                    None => tags.join("\n"),
                };
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
                    returns_void: matches!(returns, Node::Void),
                    docs: doc_lines(Some(&docs), DocStyle::Block, "  "),
                    ..MethodView::default()
                }
            })
            .collect();

        let declarations = reachable_declarations(program)
            .into_iter()
            .map(|d| self.render_declaration(d))
            .collect::<Result<Vec<_>>>()?;

        let view = ClientView {
            class_name: class.name.clone(),
            docs: doc_lines(class.docs.as_deref(), DocStyle::Block, ""),
            url: REMOTE_URL_PLACEHOLDER,
            runtime_import: relative_path(&file.path, self.runtime_path()),
            imports: Vec::new(),
            declarations,
            methods,
            package: String::new(),
        };
        template::render(self.language(), "client.js", CLIENT, view)
    }

    fn render_model_file(&self, file: &FilePlan<'_>, _metadata: &Metadata) -> Result<String> {
        Err(Error::Render {
            target: self.language().to_string(),
            message: format!("no model files are generated, but `{}` was planned", file.path),
        })
    }

    fn render_runtime(&self, metadata: &Metadata) -> Result<String> {
        let view = RuntimeView {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            package: String::new(),
        };
        template::render(self.language(), "remote.js", RUNTIME, view)
    }
}

//! Go client generation.
//!
//! Every file of one output directory is a single package, so model files
//! are flat and planner imports are not rendered. Records are structs with
//! `json` tags; optional fields are pointers dropped through `omitempty`.
//! Results decode through the runtime's generic `call`.

use std::collections::HashSet;

use heck::{ToSnakeCase, ToUpperCamelCase};
use rpcgen_types::{
    Declaration, DeclarationShape, EnumCase, EnumValueKind, Literal, Node, ParameterDefinition,
    Program, PropertyDefinition, Result,
};

use super::{Emitter, TargetLanguage, render_declarations};
use crate::planner::FilePlan;
use crate::render::{
    DocStyle, doc_lines, documented, fq_name, module_path, param_idents, quote, safe_ident,
};
use crate::template;
use crate::view::{ClientView, ImportView, MethodView, ModelView, RuntimeView};
use crate::{Metadata, REMOTE_URL_PLACEHOLDER};

const CLIENT: &str = include_str!("../../templates/go/client.jinja");
const MODEL: &str = include_str!("../../templates/go/model.jinja");
const RUNTIME: &str = include_str!("../../templates/go/runtime.jinja");

const RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var", "any", "bool", "byte", "error",
    "false", "float32", "float64", "int", "int64", "iota", "len", "make", "new", "nil", "panic",
    "string", "true",
];

/// Names a generated method body refers to besides its parameters.
const BODY_NAMES: &[&str] = &["c", "call", "callVoid", "optional"];

pub struct Go;

pub fn go_type(node: &Node) -> String {
    match node {
        Node::String => "string".into(),
        Node::Integer => "int64".into(),
        Node::Double => "float64".into(),
        Node::Float => "float32".into(),
        Node::Boolean => "bool".into(),
        Node::Void => "struct{}".into(),
        Node::Null | Node::Any => "any".into(),
        Node::Date => "time.Time".into(),
        Node::Array(inner) => format!("[]{}", go_type(inner)),
        Node::Map { key, value } => {
            let key = match key.as_ref() {
                Node::Integer => "int64".to_string(),
                Node::Double | Node::Float => "float64".to_string(),
                Node::NamedReference(r) if r.kind == rpcgen_types::RefKind::Enum => {
                    r.name.clone()
                }
                _ => "string".to_string(),
            };
            format!("map[{key}]{}", go_type(value))
        }
        Node::Promise(inner) => go_type(inner),
        Node::Union(_) => match node.nullable_inner() {
            Some(inner) => pointer(&go_type(inner)),
            None => "any".into(),
        },
        Node::NamedReference(r) => r.name.clone(),
        Node::TypeLiteral(_) => "map[string]any".into(),
    }
}

/// A pointer to `rendered`, unless it already has a nil value.
fn pointer(rendered: &str) -> String {
    let nilable = rendered == "any"
        || rendered.starts_with('*')
        || rendered.starts_with("[]")
        || rendered.starts_with("map[");
    if nilable { rendered.to_string() } else { format!("*{rendered}") }
}

/// An exported Go name for a declared one.
fn exported(name: &str) -> String {
    let upper = safe_ident(name, &[]).to_upper_camel_case();
    match upper.chars().next() {
        Some(c) if c.is_alphabetic() => upper,
        _ => format!("X{upper}"),
    }
}

/// Exported names for one scope, with a `_` suffix on repeats.
fn exported_all<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let mut ident = exported(name);
            while !taken.insert(ident.clone()) {
                ident.push('_');
            }
            ident
        })
        .collect()
}

fn literal(value: &Literal) -> String {
    match value {
        Literal::String(s) => quote(s, false),
        Literal::Number(n) => n.clone(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "nil".into(),
    }
}

/// Optional parameters are pointers; the runtime leaves out trailing nil
/// ones so the backend applies its defaults.
fn params(params: &[ParameterDefinition], idents: &[String]) -> String {
    params
        .iter()
        .zip(idents)
        .map(|(p, name)| {
            let ty = go_type(&p.ty);
            if p.optional && !ty.starts_with('*') {
                format!("{name} *{ty}")
            } else {
                format!("{name} {ty}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn args(params: &[ParameterDefinition], idents: &[String]) -> String {
    params
        .iter()
        .zip(idents)
        .map(|(p, name)| if p.optional { format!("optional({name})") } else { name.clone() })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_record(name: &str, fields: &[PropertyDefinition]) -> String {
    if fields.is_empty() {
        return format!("type {name} struct{{}}");
    }
    let idents = exported_all(fields.iter().map(|f| f.name.as_str()));
    let mut out = format!("type {name} struct {{\n");
    for (field, ident) in fields.iter().zip(&idents) {
        let ty = go_type(&field.ty);
        if field.optional {
            let tag = format!("{},omitempty", field.name);
            out.push_str(&format!("\t{ident} {} `json:{}`\n", pointer(&ty), quote(&tag, false)));
        } else {
            out.push_str(&format!("\t{ident} {ty} `json:{}`\n", quote(&field.name, false)));
        }
    }
    out.push('}');
    out
}

fn render_enum(decl: &Declaration, cases: &[EnumCase]) -> Result<String> {
    let base = match decl.enum_value_kind()? {
        Some(EnumValueKind::String) => "string",
        _ if cases.iter().all(|c| match &c.value {
            Literal::Number(n) => n.parse::<i64>().is_ok(),
            _ => false,
        }) =>
        {
            "int64"
        }
        _ => "float64",
    };
    let mut out = format!("type {} {base}", decl.name);
    if cases.is_empty() {
        return Ok(out);
    }
    out.push_str("\n\nconst (\n");
    let names = exported_all(cases.iter().map(|c| c.name.as_str()));
    for (case, name) in cases.iter().zip(names) {
        out.push_str(&format!(
            "\t{}{name} {} = {}\n",
            decl.name,
            decl.name,
            literal(&case.value)
        ));
    }
    out.push(')');
    Ok(out)
}

fn package(metadata: &Metadata) -> String {
    metadata.package_ident()
}

/// The standard library packages rendered Go text refers to.
fn std_imports<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<ImportView> {
    let mut imports = Vec::new();
    if texts.into_iter().any(|t| t.contains("time.Time")) {
        imports.push(ImportView {
            path: "time".to_string(),
            names: Vec::new(),
        });
    }
    imports
}

impl Emitter for Go {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Go
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn render_type(&self, node: &Node) -> String {
        go_type(node)
    }

    // A trailing `_<os>`, `_<arch>` or `_test` would make the go tool skip a
    // file, so every generated name ends in a fixed word.
    fn client_path(&self, program: &Program) -> String {
        format!("{}_client.go", program.class.name.to_snake_case())
    }

    fn model_path(&self, declaring_path: &str) -> String {
        format!("{}_types.go", module_path(declaring_path).replace('/', "_"))
    }

    fn runtime_path(&self) -> &'static str {
        "remote.go"
    }

    fn render_declaration(&self, decl: &Declaration) -> Result<String> {
        let body = match &decl.shape {
            DeclarationShape::StructLiteral { fields } => render_record(&decl.name, fields),
            DeclarationShape::Enum { cases } => render_enum(decl, cases)?,
            DeclarationShape::TypeAlias { alias } => {
                format!("type {} = {}", decl.name, go_type(alias))
            }
        };
        Ok(documented(decl.docs.as_deref(), DocStyle::Line, body))
    }

    fn render_class(
        &self,
        program: &Program,
        file: &FilePlan<'_>,
        metadata: &Metadata,
    ) -> Result<String> {
        let class = &program.class;
        let reserved: Vec<&str> = RESERVED.iter().chain(BODY_NAMES).copied().collect();
        let exposed: Vec<_> = class.exposed_methods().collect();
        let names = exported_all(exposed.iter().map(|m| m.name.as_str()));
        let methods: Vec<MethodView> = exposed
            .iter()
            .zip(names)
            .map(|(m, name)| {
                let returns = m.return_type.awaited();
                let idents = param_idents(&m.params, &reserved);
                MethodView {
                    name,
                    fq_name: fq_name(&class.name, &m.name),
                    params: params(&m.params, &idents),
                    args: args(&m.params, &idents),
                    return_type: go_type(returns),
                    returns_void: matches!(returns, Node::Void),
                    docs: doc_lines(m.docs.as_deref(), DocStyle::Line, ""),
                    ..MethodView::default()
                }
            })
            .collect();

        let declarations = render_declarations(self, file)?;
        let imports = std_imports(
            declarations
                .iter()
                .chain(methods.iter().flat_map(|m| [&m.params, &m.return_type]))
                .map(String::as_str),
        );
        let view = ClientView {
            class_name: class.name.clone(),
            docs: doc_lines(class.docs.as_deref(), DocStyle::Line, ""),
            url: REMOTE_URL_PLACEHOLDER,
            runtime_import: String::new(),
            imports,
            declarations,
            methods,
            package: package(metadata),
        };
        template::render(self.language(), "client.go", CLIENT, view)
    }

    fn render_model_file(&self, file: &FilePlan<'_>, metadata: &Metadata) -> Result<String> {
        let declarations = render_declarations(self, file)?;
        let view = ModelView {
            imports: std_imports(declarations.iter().map(String::as_str)),
            declarations,
            package: package(metadata),
        };
        template::render(self.language(), "model.go", MODEL, view)
    }

    fn render_runtime(&self, metadata: &Metadata) -> Result<String> {
        let view = RuntimeView {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            package: package(metadata),
        };
        template::render(self.language(), "remote.go", RUNTIME, view)
    }
}

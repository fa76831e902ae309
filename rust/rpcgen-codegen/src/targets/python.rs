//! Python client generation.
//!
//! Records become plain classes whose `__init__` re-hydrates nested records
//! from the mappings the transport delivers. Wire keys stay as declared even
//! when the attribute name had to be changed.

use std::collections::BTreeSet;

use heck::{ToShoutySnakeCase, ToSnakeCase};
use rpcgen_types::{
    Declaration, DeclarationShape, EnumValueKind, Literal, Node, ParameterDefinition, Program,
    PropertyDefinition, RefKind, Result,
};

use super::{Emitter, TargetLanguage, render_declarations};
use crate::planner::FilePlan;
use crate::render::{
    DocStyle, doc_lines, documented, field_idents, fq_name, module_path, param_idents, quote,
    safe_ident, trailing_optional,
};
use crate::template;
use crate::view::{ClientView, ImportView, MethodView, ModelView, RuntimeView};
use crate::{GeneratedFile, Metadata, REMOTE_URL_PLACEHOLDER};

const CLIENT: &str = include_str!("../../templates/python/client.jinja");
const MODEL: &str = include_str!("../../templates/python/model.jinja");
const RUNTIME: &str = include_str!("../../templates/python/runtime.jinja");
const PACKAGE_MARKER: &str = "# This is an auto generated code. This code should not be modified since the file can be overwritten\n# if new rpcgen commands are executed.\n";

const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield", "self",
];

const INDENT: &str = "    ";

pub struct Python;

pub fn py_type(node: &Node) -> String {
    match node {
        Node::String => "str".into(),
        Node::Integer => "int".into(),
        Node::Double | Node::Float => "float".into(),
        Node::Boolean => "bool".into(),
        Node::Void | Node::Null => "None".into(),
        Node::Any => "Any".into(),
        Node::Date => "datetime".into(),
        Node::Array(inner) => format!("list[{}]", py_type(inner)),
        Node::Map { key, value } => {
            let key = match key.as_ref() {
                Node::Integer => "int",
                Node::Double | Node::Float => "float",
                _ => "str",
            };
            format!("dict[{key}, {}]", py_type(value))
        }
        Node::Promise(inner) => py_type(inner),
        Node::Union(params) if params.is_empty() => "Any".into(),
        Node::Union(params) => params.iter().map(py_type).collect::<Vec<_>>().join(" | "),
        Node::NamedReference(r) => r.name.clone(),
        Node::TypeLiteral(_) => "dict[str, Any]".into(),
    }
}

/// Marks a rendered type as accepting `None`.
fn optional_type(rendered: String) -> String {
    if rendered == "None" || rendered == "Any" || rendered.split(" | ").any(|p| p == "None") {
        rendered
    } else {
        format!("{rendered} | None")
    }
}

/// Expression turning the weakly typed `expr` into `node`'s Python type, or
/// `None` when the value can be used as delivered.
fn hydrate(expr: &str, node: &Node, depth: usize) -> Option<String> {
    match node {
        Node::NamedReference(r) => match r.kind {
            RefKind::Struct => Some(format!(
                "({name}.from_mapping({expr}) if isinstance({expr}, Mapping) else {expr})",
                name = r.name
            )),
            RefKind::Enum => Some(format!("{}({expr})", r.name)),
            RefKind::Alias => None,
        },
        Node::Date => Some(format!(
            "(datetime.fromisoformat({expr}) if isinstance({expr}, str) else {expr})"
        )),
        Node::Array(inner) => {
            let var = format!("v{depth}");
            hydrate(&var, inner, depth + 1).map(|h| format!("[{h} for {var} in {expr}]"))
        }
        Node::Map { value, .. } => {
            let (k, v) = (format!("k{depth}"), format!("v{depth}"));
            hydrate(&v, value, depth + 1)
                .map(|h| format!("{{{k}: {h} for {k}, {v} in {expr}.items()}}"))
        }
        Node::Promise(inner) => hydrate(expr, inner, depth),
        Node::Union(_) => {
            let inner = node.nullable_inner()?;
            hydrate(expr, inner, depth).map(|h| format!("({h} if {expr} is not None else None)"))
        }
        _ => None,
    }
}

fn literal(value: &Literal) -> String {
    match value {
        Literal::String(s) => quote(s, false),
        Literal::Number(n) => n.clone(),
        Literal::Boolean(true) => "True".into(),
        Literal::Boolean(false) => "False".into(),
        Literal::Null => "None".into(),
    }
}

fn params(params: &[ParameterDefinition]) -> String {
    let trailing = trailing_optional(params);
    params
        .iter()
        .zip(param_idents(params, RESERVED))
        .zip(trailing)
        .map(|((p, name), trailing)| {
            let ty = py_type(&p.ty);
            match (&p.default_value, trailing) {
                (Some(value), true) => format!("{name}: {ty} = {}", literal(value)),
                (None, true) => format!("{name}: {} = None", optional_type(ty)),
                (_, false) => format!("{name}: {ty}"),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `from` → `to` as a relative module reference: `greeter.py` →
/// `src/models/user.py` is `.src.models.user`.
fn import_module(from: &str, to: &str) -> String {
    let mut from_dir: Vec<&str> = from.split('/').collect();
    from_dir.pop();
    let to = to.strip_suffix(".py").unwrap_or(to);
    let to_parts: Vec<&str> = to.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to_parts.iter().take(to_parts.len().saturating_sub(1)))
        .take_while(|(a, b)| a == b)
        .count();
    let dots = ".".repeat(1 + from_dir.len() - common);
    format!("{dots}{}", to_parts[common..].join("."))
}

fn render_record(name: &str, fields: &[PropertyDefinition]) -> String {
    let ordered = PropertyDefinition::required_first(fields);
    let idents = field_idents(fields, RESERVED);
    let ident = |p: &PropertyDefinition| idents[p.name.as_str()].clone();
    let mut out = format!("class {name}:\n");

    // __init__
    let mut args = vec!["self".to_string()];
    for &field in &ordered {
        let ty = py_type(&field.ty);
        if field.optional {
            args.push(format!("{}: {} = None", ident(field), optional_type(ty)));
        } else {
            args.push(format!("{}: {ty}", ident(field)));
        }
    }
    out.push_str(&format!("{INDENT}def __init__({}) -> None:\n", args.join(", ")));
    if ordered.is_empty() {
        out.push_str(&format!("{INDENT}{INDENT}pass\n"));
    }
    for &field in &ordered {
        let attr = ident(field);
        let value = match hydrate(&attr, &field.ty, 0) {
            Some(h) if field.optional && field.ty.nullable_inner().is_none() => {
                format!("({h} if {attr} is not None else None)")
            }
            Some(h) => h,
            None => attr.clone(),
        };
        out.push_str(&format!("{INDENT}{INDENT}self.{attr} = {value}\n"));
    }

    // from_mapping
    out.push_str(&format!("\n{INDENT}@classmethod\n"));
    out.push_str(&format!(
        "{INDENT}def from_mapping(cls, data: Mapping[str, Any]) -> {name}:\n"
    ));
    if ordered.is_empty() {
        out.push_str(&format!("{INDENT}{INDENT}return cls()\n"));
    } else {
        out.push_str(&format!("{INDENT}{INDENT}return cls(\n"));
        for &field in &ordered {
            let key = quote(&field.name, false);
            let value = if field.optional {
                format!("data.get({key})")
            } else {
                format!("data[{key}]")
            };
            out.push_str(&format!("{INDENT}{INDENT}{INDENT}{}={value},\n", ident(field)));
        }
        out.push_str(&format!("{INDENT}{INDENT})\n"));
    }

    // to_mapping
    out.push_str(&format!("\n{INDENT}def to_mapping(self) -> dict[str, Any]:\n"));
    out.push_str(&format!("{INDENT}{INDENT}data: dict[str, Any] = {{}}\n"));
    for field in fields {
        let attr = ident(field);
        let key = quote(&field.name, false);
        if field.optional {
            out.push_str(&format!("{INDENT}{INDENT}if self.{attr} is not None:\n"));
            out.push_str(&format!("{INDENT}{INDENT}{INDENT}data[{key}] = self.{attr}\n"));
        } else {
            out.push_str(&format!("{INDENT}{INDENT}data[{key}] = self.{attr}\n"));
        }
    }
    out.push_str(&format!("{INDENT}{INDENT}return data"));
    out
}

impl Emitter for Python {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Python
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn render_type(&self, node: &Node) -> String {
        py_type(node)
    }

    fn client_path(&self, program: &Program) -> String {
        format!("{}.py", program.class.name.to_snake_case())
    }

    fn model_path(&self, declaring_path: &str) -> String {
        format!("{}.py", module_path(declaring_path))
    }

    fn runtime_path(&self) -> &'static str {
        "remote.py"
    }

    /// Every directory holding a generated module, and each of its
    /// ancestors, becomes a package.
    fn companion_files(&self, files: &[GeneratedFile]) -> Vec<GeneratedFile> {
        let mut dirs = BTreeSet::new();
        for file in files.iter().filter(|f| f.path.ends_with(".py")) {
            let mut dir = file.path.as_str();
            loop {
                dir = dir.rsplit_once('/').map_or("", |(parent, _)| parent);
                dirs.insert(dir.to_string());
                if dir.is_empty() {
                    break;
                }
            }
        }
        dirs.into_iter()
            .map(|dir| {
                if dir.is_empty() {
                    "__init__.py".to_string()
                } else {
                    format!("{dir}/__init__.py")
                }
            })
            .filter(|path| !files.iter().any(|f| &f.path == path))
            .map(|path| GeneratedFile {
                path,
                content: PACKAGE_MARKER.to_string(),
                owner_class: None,
            })
            .collect()
    }

    fn render_declaration(&self, decl: &Declaration) -> Result<String> {
        let body = match &decl.shape {
            DeclarationShape::StructLiteral { fields } => render_record(&decl.name, fields),
            DeclarationShape::Enum { cases } => {
                let base = match decl.enum_value_kind()? {
                    Some(EnumValueKind::String) => "str, Enum",
                    _ if cases.iter().all(|c| match &c.value {
                        Literal::Number(n) => n.parse::<i64>().is_ok(),
                        _ => false,
                    }) =>
                    {
                        "IntEnum"
                    }
                    _ => "float, Enum",
                };
                let mut out = format!("class {}({base}):\n", decl.name);
                if cases.is_empty() {
                    out.push_str(&format!("{INDENT}pass"));
                }
                let members: Vec<String> = cases
                    .iter()
                    .map(|c| {
                        format!(
                            "{INDENT}{} = {}",
                            safe_ident(&c.name.to_shouty_snake_case(), RESERVED),
                            literal(&c.value)
                        )
                    })
                    .collect();
                out.push_str(&members.join("\n"));
                out
            }
            DeclarationShape::TypeAlias { alias } => {
                format!("{}: TypeAlias = \"{}\"", decl.name, py_type(alias))
            }
        };
        Ok(documented(decl.docs.as_deref(), DocStyle::Hash, body))
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
                    return_type: py_type(returns),
                    returns_void: matches!(returns, Node::Void),
                    result: hydrate("response", returns, 0).unwrap_or_else(|| "response".into()),
                    docs: doc_lines(m.docs.as_deref(), DocStyle::Docstring, "        "),
                }
            })
            .collect();

        let view = ClientView {
            class_name: class.name.clone(),
            docs: doc_lines(class.docs.as_deref(), DocStyle::Docstring, INDENT),
            url: REMOTE_URL_PLACEHOLDER,
            runtime_import: import_module(&file.path, self.runtime_path()),
            imports: ImportView::from_plan(&file.imports, |to| {
                Some(import_module(&file.path, to))
            }),
            declarations: render_declarations(self, file)?,
            methods,
            package: String::new(),
        };
        template::render(self.language(), "client.py", CLIENT, view)
    }

    fn render_model_file(&self, file: &FilePlan<'_>, _metadata: &Metadata) -> Result<String> {
        let view = ModelView {
            imports: ImportView::from_plan(&file.imports, |to| {
                Some(import_module(&file.path, to))
            }),
            declarations: render_declarations(self, file)?,
            package: String::new(),
        };
        template::render(self.language(), "model.py", MODEL, view)
    }

    fn render_runtime(&self, metadata: &Metadata) -> Result<String> {
        let view = RuntimeView {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            package: String::new(),
        };
        template::render(self.language(), "remote.py", RUNTIME, view)
    }
}

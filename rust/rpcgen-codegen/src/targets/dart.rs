//! Dart client generation.
//!
//! Records get a `fromJson` factory that decodes nested records, lists and
//! maps recursively, and a `toJson` that `jsonEncode` picks up. Enums and
//! aliases are decoded through a top-level `decode<Name>` function so that
//! call sites do not need to know their underlying shape.

use heck::{ToLowerCamelCase, ToSnakeCase};
use rpcgen_types::{
    Declaration, DeclarationShape, EnumValueKind, Literal, Node, ParameterDefinition, Program,
    PropertyDefinition, RefKind, Result,
};

use super::{Emitter, TargetLanguage, render_declarations};
use crate::planner::FilePlan;
use crate::render::{
    DocStyle, doc_lines, documented, field_idents, fq_name, module_path, nullable, param_idents,
    quote, relative_path, safe_ident, trailing_optional,
};
use crate::template;
use crate::view::{ClientView, ImportView, MethodView, ModelView, RuntimeView};
use crate::{Metadata, REMOTE_URL_PLACEHOLDER};

const CLIENT: &str = include_str!("../../templates/dart/client.jinja");
const MODEL: &str = include_str!("../../templates/dart/model.jinja");
const RUNTIME: &str = include_str!("../../templates/dart/runtime.jinja");

const RESERVED: &[&str] = &[
    "abstract", "as", "assert", "async", "await", "break", "case", "catch", "class", "const",
    "continue", "covariant", "default", "deferred", "do", "dynamic", "else", "enum", "export",
    "extends", "extension", "external", "factory", "false", "final", "finally", "for",
    "Function", "get", "hide", "if", "implements", "import", "in", "interface", "is", "late",
    "library", "mixin", "new", "null", "on", "operator", "part", "required", "rethrow",
    "return", "set", "show", "static", "super", "switch", "sync", "this", "throw", "true", "try",
    "typedef", "var", "void", "while", "with", "yield",
];

/// Members every Dart enum already has.
const ENUM_RESERVED: &[&str] = &["values", "index", "value", "name"];

const TOP: &[&str] = &["dynamic", "void", "Null"];

pub struct Dart;

pub fn dart_type(node: &Node) -> String {
    match node {
        Node::String => "String".into(),
        Node::Integer => "int".into(),
        Node::Double | Node::Float => "double".into(),
        Node::Boolean => "bool".into(),
        Node::Void => "void".into(),
        Node::Null => "Null".into(),
        Node::Any => "dynamic".into(),
        Node::Date => "DateTime".into(),
        Node::Array(inner) => format!("List<{}>", dart_type(inner)),
        Node::Map { key, value } => format!("Map<{}, {}>", dart_key(key), dart_type(value)),
        Node::Promise(inner) => format!("Future<{}>", dart_type(inner)),
        Node::Union(_) => match node.nullable_inner() {
            Some(inner) => nullable(&dart_type(inner), TOP),
            None => "dynamic".into(),
        },
        Node::NamedReference(r) => r.name.clone(),
        Node::TypeLiteral(_) => "Map<String, dynamic>".into(),
    }
}

fn dart_key(key: &Node) -> &'static str {
    match key {
        Node::Integer => "int",
        Node::Double | Node::Float => "double",
        _ => "String",
    }
}

fn decode_fn(name: &str) -> String {
    format!("decode{name}")
}

/// Expression converting the JSON value `expr` into `node`'s Dart type.
fn decode(expr: &str, node: &Node, depth: usize) -> String {
    match node {
        Node::String | Node::Boolean | Node::Null => format!("{expr} as {}", dart_type(node)),
        Node::Integer => format!("({expr} as num).toInt()"),
        Node::Double | Node::Float => format!("({expr} as num).toDouble()"),
        Node::Void | Node::Any => expr.to_string(),
        Node::Date => format!("DateTime.parse({expr} as String)"),
        Node::Array(inner) => {
            let var = format!("e{depth}");
            format!(
                "({expr} as List<dynamic>).map(({var}) => {}).toList()",
                decode(&var, inner, depth + 1)
            )
        }
        Node::Map { key, value } => {
            let (k, v) = (format!("k{depth}"), format!("v{depth}"));
            let key = match dart_key(key) {
                "int" => format!("int.parse({k})"),
                "double" => format!("double.parse({k})"),
                _ => k.clone(),
            };
            format!(
                "({expr} as Map<String, dynamic>).map(({k}, {v}) => MapEntry({key}, {}))",
                decode(&v, value, depth + 1)
            )
        }
        Node::Promise(inner) => decode(expr, inner, depth),
        Node::Union(_) => match node.nullable_inner() {
            Some(inner) => format!("({expr} == null ? null : {})", decode(expr, inner, depth)),
            None => expr.to_string(),
        },
        Node::NamedReference(r) => match r.kind {
            RefKind::Struct => format!("{}.fromJson({expr} as Map<String, dynamic>)", r.name),
            RefKind::Enum | RefKind::Alias => format!("{}({expr})", decode_fn(&r.name)),
        },
        Node::TypeLiteral(_) => format!("{expr} as Map<String, dynamic>"),
    }
}

fn literal(value: &Literal) -> String {
    match value {
        Literal::String(s) => quote(s, true),
        Literal::Number(n) => n.clone(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "null".into(),
    }
}

/// Required parameters are positional; the trailing optional run becomes a
/// bracketed optional positional group.
fn params(params: &[ParameterDefinition]) -> String {
    let trailing = trailing_optional(params);
    let mut required = Vec::new();
    let mut optional = Vec::new();
    for ((p, name), trailing) in params.iter().zip(param_idents(params, RESERVED)).zip(trailing) {
        let ty = dart_type(&p.ty);
        match (&p.default_value, trailing) {
            (Some(value), true) => optional.push(format!("{ty} {name} = {}", literal(value))),
            (None, true) => optional.push(format!("{} {name}", nullable(&ty, TOP))),
            (_, false) => required.push(format!("{ty} {name}")),
        }
    }
    if !optional.is_empty() {
        required.push(format!("[{}]", optional.join(", ")));
    }
    required.join(", ")
}

fn field_type(field: &PropertyDefinition) -> String {
    let ty = dart_type(&field.ty);
    if field.optional { nullable(&ty, TOP) } else { ty }
}

fn render_record(name: &str, fields: &[PropertyDefinition]) -> String {
    let idents = field_idents(fields, RESERVED);
    let ident = |p: &PropertyDefinition| idents[p.name.as_str()].clone();
    let mut out = format!("class {name} {{\n");
    for field in fields {
        out.push_str(&format!("  final {} {};\n", field_type(field), ident(field)));
    }
    if !fields.is_empty() {
        out.push('\n');
    }

    let ordered = PropertyDefinition::required_first(fields);
    if ordered.is_empty() {
        out.push_str(&format!("  {name}();\n"));
    } else {
        let args: Vec<String> = ordered
            .iter()
            .map(|&field| {
                if field.optional {
                    format!("this.{}", ident(field))
                } else {
                    format!("required this.{}", ident(field))
                }
            })
            .collect();
        out.push_str(&format!("  {name}({{{}}});\n", args.join(", ")));
    }

    out.push_str(&format!(
        "\n  factory {name}.fromJson(Map<String, dynamic> json) => {name}(\n"
    ));
    for &field in &ordered {
        let key = format!("json[{}]", quote(&field.name, true));
        let value = if field.optional && field.ty.nullable_inner().is_none() {
            format!("{key} == null ? null : {}", decode(&key, &field.ty, 0))
        } else {
            decode(&key, &field.ty, 0)
        };
        out.push_str(&format!("        {}: {value},\n", ident(field)));
    }
    out.push_str("      );\n");

    out.push_str("\n  Map<String, dynamic> toJson() => {\n");
    for field in fields {
        let n = ident(field);
        let key = quote(&field.name, true);
        if field.optional {
            out.push_str(&format!("        if ({n} != null) {key}: {n},\n"));
        } else {
            out.push_str(&format!("        {key}: {n},\n"));
        }
    }
    out.push_str("      };\n}");
    out
}

fn render_enum(decl: &Declaration, cases: &[rpcgen_types::EnumCase]) -> Result<String> {
    let value_type = match decl.enum_value_kind()? {
        Some(EnumValueKind::String) => "String",
        _ => "num",
    };
    let decoder = decode_fn(&decl.name);
    // Dart enums need at least one value.
    if cases.is_empty() {
        return Ok(format!(
            "typedef {name} = {value_type};\n\n{name} {decoder}(dynamic value) => value as {value_type};",
            name = decl.name
        ));
    }

    let reserved: Vec<&str> = RESERVED.iter().chain(ENUM_RESERVED).copied().collect();
    let values: Vec<String> = cases
        .iter()
        .map(|c| {
            format!(
                "  {}({})",
                safe_ident(&c.name.to_lower_camel_case(), &reserved),
                literal(&c.value)
            )
        })
        .collect();
    Ok(format!(
        "enum {name} {{\n{values};\n\n  const {name}(this.value);\n\n  final {value_type} value;\n\n  dynamic toJson() => value;\n}}\n\n{name} {decoder}(dynamic value) =>\n    {name}.values.firstWhere((e) => e.value == value);",
        name = decl.name,
        values = values.join(",\n"),
    ))
}

impl Emitter for Dart {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Dart
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn render_type(&self, node: &Node) -> String {
        dart_type(node)
    }

    fn client_path(&self, program: &Program) -> String {
        format!("{}.dart", program.class.name.to_snake_case())
    }

    fn model_path(&self, declaring_path: &str) -> String {
        format!("{}.dart", module_path(declaring_path))
    }

    fn runtime_path(&self) -> &'static str {
        "remote.dart"
    }

    fn render_declaration(&self, decl: &Declaration) -> Result<String> {
        let body = match &decl.shape {
            DeclarationShape::StructLiteral { fields } => render_record(&decl.name, fields),
            DeclarationShape::Enum { cases } => render_enum(decl, cases)?,
            DeclarationShape::TypeAlias { alias } => format!(
                "typedef {name} = {ty};\n\n{name} {decoder}(dynamic value) => {body};",
                name = decl.name,
                ty = dart_type(alias),
                decoder = decode_fn(&decl.name),
                body = decode("value", alias, 0),
            ),
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
                    return_type: format!("Future<{}>", dart_type(returns)),
                    returns_void: matches!(returns, Node::Void),
                    result: decode("response", returns, 0),
                    docs: doc_lines(m.docs.as_deref(), DocStyle::TripleSlash, "  "),
                }
            })
            .collect();

        let view = ClientView {
            class_name: class.name.clone(),
            docs: doc_lines(class.docs.as_deref(), DocStyle::TripleSlash, ""),
            url: REMOTE_URL_PLACEHOLDER,
            runtime_import: import_path(&file.path, self.runtime_path()),
            imports: ImportView::from_plan(&file.imports, |to| {
                Some(import_path(&file.path, to))
            }),
            declarations: render_declarations(self, file)?,
            methods,
            package: String::new(),
        };
        template::render(self.language(), "client.dart", CLIENT, view)
    }

    fn render_model_file(&self, file: &FilePlan<'_>, _metadata: &Metadata) -> Result<String> {
        let view = ModelView {
            imports: ImportView::from_plan(&file.imports, |to| {
                Some(import_path(&file.path, to))
            }),
            declarations: render_declarations(self, file)?,
            package: String::new(),
        };
        template::render(self.language(), "model.dart", MODEL, view)
    }

    fn render_runtime(&self, metadata: &Metadata) -> Result<String> {
        let view = RuntimeView {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            package: String::new(),
        };
        template::render(self.language(), "remote.dart", RUNTIME, view)
    }
}

/// Dart import URIs are relative without a leading `./`.
fn import_path(from: &str, to: &str) -> String {
    let rel = relative_path(from, to);
    rel.strip_prefix("./").map(str::to_string).unwrap_or(rel)
}

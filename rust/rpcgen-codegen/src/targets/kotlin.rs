//! Kotlin client generation.
//!
//! Records are Gson data classes and results are decoded through a
//! `TypeToken` of the declared return type, so nested records need no
//! generated decoding code. Enums carry their wire value and implement the
//! runtime's `WireEnum`, which serializes numeric enums as numbers.

use heck::{ToShoutySnakeCase, ToSnakeCase};
use rpcgen_types::{
    Declaration, DeclarationShape, EnumCase, EnumValueKind, Literal, Node, ParameterDefinition,
    Program, PropertyDefinition, Result,
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

const CLIENT: &str = include_str!("../../templates/kotlin/client.jinja");
const MODEL: &str = include_str!("../../templates/kotlin/model.jinja");
const RUNTIME: &str = include_str!("../../templates/kotlin/runtime.jinja");

const RESERVED: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

const TOP: &[&str] = &["Any?"];

pub struct Kotlin;

pub fn kotlin_type(node: &Node) -> String {
    match node {
        Node::String => "String".into(),
        Node::Integer => "Int".into(),
        Node::Double => "Double".into(),
        Node::Float => "Float".into(),
        Node::Boolean => "Boolean".into(),
        Node::Void => "Unit".into(),
        Node::Null => "Nothing?".into(),
        Node::Any => "Any?".into(),
        Node::Date => "Date".into(),
        Node::Array(inner) => format!("List<{}>", kotlin_type(inner)),
        Node::Map { key, value } => {
            let key = match key.as_ref() {
                Node::Integer => "Int",
                Node::Double => "Double",
                _ => "String",
            };
            format!("Map<{key}, {}>", kotlin_type(value))
        }
        Node::Promise(inner) => kotlin_type(inner),
        Node::Union(_) => match node.nullable_inner() {
            Some(inner) => nullable(&kotlin_type(inner), TOP),
            None => "Any?".into(),
        },
        Node::NamedReference(r) => r.name.clone(),
        Node::TypeLiteral(_) => "Map<String, Any?>".into(),
    }
}

/// A literal spelled for a value of type `ty`. Kotlin does not widen integer
/// literals to floating point.
fn literal(value: &Literal, ty: &Node) -> String {
    match value {
        Literal::String(s) => quote(s, true),
        Literal::Number(n) => {
            let integral = !n.contains(&['.', 'e', 'E'][..]);
            match ty {
                Node::Double if integral => format!("{n}.0"),
                Node::Float if integral => format!("{n}.0f"),
                Node::Float => format!("{n}f"),
                _ => n.clone(),
            }
        }
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "null".into(),
    }
}

fn params(params: &[ParameterDefinition]) -> String {
    let trailing = trailing_optional(params);
    params
        .iter()
        .zip(param_idents(params, RESERVED))
        .zip(trailing)
        .map(|((p, name), trailing)| {
            let ty = kotlin_type(&p.ty);
            match (&p.default_value, trailing) {
                (Some(value), true) => {
                    let base = p.ty.nullable_inner().unwrap_or(&p.ty);
                    format!("{name}: {ty} = {}", literal(value, base))
                }
                (None, true) => format!("{name}: {} = null", nullable(&ty, TOP)),
                (_, false) => format!("{name}: {ty}"),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_record(name: &str, fields: &[PropertyDefinition]) -> String {
    if fields.is_empty() {
        return format!("class {name}");
    }
    let idents = field_idents(fields, RESERVED);
    let mut out = format!("data class {name}(\n");
    for &field in &PropertyDefinition::required_first(fields) {
        let ident = &idents[field.name.as_str()];
        let ty = kotlin_type(&field.ty);
        let annotation = if *ident == field.name {
            String::new()
        } else {
            format!("@SerializedName({}) ", quote(&field.name, true))
        };
        if field.optional {
            out.push_str(&format!("    {annotation}val {ident}: {} = null,\n", nullable(&ty, TOP)));
        } else {
            out.push_str(&format!("    {annotation}val {ident}: {ty},\n"));
        }
    }
    out.push(')');
    out
}

fn render_enum(decl: &Declaration, cases: &[EnumCase]) -> Result<String> {
    let value_type = match decl.enum_value_kind()? {
        Some(EnumValueKind::String) => Node::String,
        _ if cases.iter().all(|c| match &c.value {
            Literal::Number(n) => n.parse::<i64>().is_ok(),
            _ => false,
        }) =>
        {
            Node::Integer
        }
        _ => Node::Double,
    };
    let mut out = format!(
        "enum class {}(override val value: {}) : WireEnum",
        decl.name,
        kotlin_type(&value_type)
    );
    if cases.is_empty() {
        return Ok(out);
    }
    out.push_str(" {\n");
    for case in cases {
        out.push_str(&format!(
            "    {}({}),\n",
            safe_ident(&case.name.to_shouty_snake_case(), RESERVED),
            literal(&case.value, &value_type)
        ));
    }
    out.push_str("    ;\n}");
    Ok(out)
}

fn package(metadata: &Metadata) -> String {
    format!("com.{}.sdk", metadata.package_ident())
}

impl Emitter for Kotlin {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Kotlin
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn render_type(&self, node: &Node) -> String {
        kotlin_type(node)
    }

    fn client_path(&self, program: &Program) -> String {
        format!("{}.kt", program.class.name.to_snake_case())
    }

    fn model_path(&self, declaring_path: &str) -> String {
        format!("{}.kt", module_path(declaring_path))
    }

    fn runtime_path(&self) -> &'static str {
        "remote.kt"
    }

    fn render_declaration(&self, decl: &Declaration) -> Result<String> {
        let body = match &decl.shape {
            DeclarationShape::StructLiteral { fields } => render_record(&decl.name, fields),
            DeclarationShape::Enum { cases } => render_enum(decl, cases)?,
            DeclarationShape::TypeAlias { alias } => {
                format!("typealias {} = {}", decl.name, kotlin_type(alias))
            }
        };
        Ok(documented(decl.docs.as_deref(), DocStyle::Block, body))
    }

    fn render_class(
        &self,
        program: &Program,
        file: &FilePlan<'_>,
        metadata: &Metadata,
    ) -> Result<String> {
        let class = &program.class;
        let methods = class
            .exposed_methods()
            .map(|m| {
                let returns = m.return_type.awaited();
                let args = param_idents(&m.params, RESERVED);
                MethodView {
                    name: safe_ident(&m.name, RESERVED),
                    fq_name: fq_name(&class.name, &m.name),
                    params: params(&m.params),
                    args: if args.is_empty() {
                        "emptyList()".to_string()
                    } else {
                        format!("listOf({})", args.join(", "))
                    },
                    return_type: kotlin_type(returns),
                    returns_void: matches!(returns, Node::Void),
                    docs: doc_lines(m.docs.as_deref(), DocStyle::Block, "        "),
                    ..MethodView::default()
                }
            })
            .collect();

        let view = ClientView {
            class_name: class.name.clone(),
            docs: doc_lines(class.docs.as_deref(), DocStyle::Block, ""),
            url: REMOTE_URL_PLACEHOLDER,
            runtime_import: String::new(),
            imports: Vec::new(),
            declarations: render_declarations(self, file)?,
            methods,
            package: package(metadata),
        };
        template::render(self.language(), "client.kt", CLIENT, view)
    }

    fn render_model_file(&self, file: &FilePlan<'_>, metadata: &Metadata) -> Result<String> {
        let view = ModelView {
            imports: Vec::new(),
            declarations: render_declarations(self, file)?,
            package: package(metadata),
        };
        template::render(self.language(), "model.kt", MODEL, view)
    }

    fn render_runtime(&self, metadata: &Metadata) -> Result<String> {
        let view = RuntimeView {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            package: package(metadata),
        };
        template::render(self.language(), "remote.kt", RUNTIME, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_defaults_are_floating_point() {
        let ps = vec![
            ParameterDefinition::new("name", Node::String),
            ParameterDefinition::new("times", Node::Double)
                .with_default(Literal::Number("1".into())),
            ParameterDefinition::new("ratio", Node::Float)
                .with_default(Literal::Number("0.5".into())),
        ];
        assert_eq!(params(&ps), "name: String, times: Double = 1.0, ratio: Float = 0.5f");
    }

    #[test]
    fn renamed_fields_are_annotated() {
        let rendered = render_record(
            "Options",
            &[
                PropertyDefinition::optional("object", Node::Boolean),
                PropertyDefinition::new("from", Node::String),
            ],
        );
        assert_eq!(
            rendered,
            "data class Options(\n    val from: String,\n    @SerializedName(\"object\") val object_: Boolean? = null,\n)"
        );
    }

    #[test]
    fn enums_carry_wire_values() {
        let decl = Declaration {
            name: "Priority".into(),
            declaring_path: "m".into(),
            shape: DeclarationShape::Enum {
                cases: vec![
                    EnumCase {
                        name: "Low".into(),
                        value: Literal::Number("0".into()),
                    },
                    EnumCase {
                        name: "VeryHigh".into(),
                        value: Literal::Number("5".into()),
                    },
                ],
            },
            docs: None,
        };
        assert_eq!(
            Kotlin.render_declaration(&decl).unwrap(),
            "enum class Priority(override val value: Int) : WireEnum {\n    LOW(0),\n    VERY_HIGH(5),\n    ;\n}"
        );
    }
}

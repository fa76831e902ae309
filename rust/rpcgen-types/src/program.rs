use std::fmt;

use crate::error::{Error, Result};
use crate::exposure::ExposureKind;
use crate::node::{Node, PropertyDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    TypeScript,
    JavaScript,
}

impl SourceLanguage {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" => Some(SourceLanguage::TypeScript),
            "js" | "mjs" => Some(SourceLanguage::JavaScript),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceLanguage::TypeScript => "ts",
            SourceLanguage::JavaScript => "js",
        }
    }
}

/// A literal as written in source, keeping its kind so emitters can quote it
/// correctly. Numbers keep their source spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String(String),
    Number(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Number(n) => f.write_str(n),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// An auxiliary named type discovered while resolving a class.
///
/// Declarations are unique per `(name, declaring_path)`, see [`Declaration::key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// Project-relative path of the declaring module, without extension.
    pub declaring_path: String,
    pub shape: DeclarationShape,
    /// Text of the leading `/** ... */` comment, markers stripped.
    pub docs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationShape {
    Enum { cases: Vec<EnumCase> },
    TypeAlias { alias: Node },
    StructLiteral { fields: Vec<PropertyDefinition> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    pub name: String,
    pub value: Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumValueKind {
    String,
    Number,
}

impl Declaration {
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.declaring_path)
    }

    /// Named references in this declaration's body, in source order.
    pub fn references(&self) -> Vec<&crate::TypeRef> {
        match &self.shape {
            DeclarationShape::Enum { .. } => Vec::new(),
            DeclarationShape::TypeAlias { alias } => alias.references(),
            DeclarationShape::StructLiteral { fields } => {
                fields.iter().flat_map(|f| f.ty.references()).collect()
            }
        }
    }

    pub fn visit_references_mut(&mut self, f: &mut impl FnMut(&mut crate::TypeRef)) {
        match &mut self.shape {
            DeclarationShape::Enum { .. } => {}
            DeclarationShape::TypeAlias { alias } => alias.visit_references_mut(f),
            DeclarationShape::StructLiteral { fields } => {
                for field in fields {
                    field.ty.visit_references_mut(f);
                }
            }
        }
    }

    /// Literal kind shared by every case of an enum. An empty enum counts as
    /// numeric. Mixed kinds are an error.
    pub fn enum_value_kind(&self) -> Result<Option<EnumValueKind>> {
        let DeclarationShape::Enum { cases } = &self.shape else {
            return Ok(None);
        };
        let mut kind = None;
        for case in cases {
            let this = match case.value {
                Literal::String(_) => EnumValueKind::String,
                Literal::Number(_) => EnumValueKind::Number,
                Literal::Boolean(_) | Literal::Null => {
                    return Err(Error::HeterogeneousEnum {
                        name: self.name.clone(),
                    });
                }
            };
            match kind {
                None => kind = Some(this),
                Some(k) if k != this => {
                    return Err(Error::HeterogeneousEnum {
                        name: self.name.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Some(kind.unwrap_or(EnumValueKind::Number)))
    }
}

// ============================================================================
// Classes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDefinition {
    pub name: String,
    pub ty: Node,
    pub optional: bool,
    pub default_value: Option<Literal>,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, ty: Node) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: Literal) -> Self {
        self.optional = true;
        self.default_value = Some(value);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefinition {
    pub name: String,
    pub params: Vec<ParameterDefinition>,
    pub return_type: Node,
    /// Decided by the exposure resolver when the program is built.
    pub exposure: ExposureKind,
    pub docs: Option<String>,
}

impl MethodDefinition {
    pub fn is_exposed(&self) -> bool {
        self.exposure.is_sdk_callable()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub name: String,
    pub methods: Vec<MethodDefinition>,
    pub docs: Option<String>,
}

impl ClassDefinition {
    pub fn exposed_methods(&self) -> impl Iterator<Item = &MethodDefinition> {
        self.methods.iter().filter(|m| m.is_exposed())
    }

    pub fn has_exposed_methods(&self) -> bool {
        self.exposed_methods().next().is_some()
    }
}

/// The front end's output for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub source_language: SourceLanguage,
    /// Project-relative path of the source module, without extension. Same
    /// convention as [`Declaration::declaring_path`].
    pub source_path: String,
    pub class: ClassDefinition,
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn declaration(&self, name: &str, declaring_path: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.name == name && d.declaring_path == declaring_path)
    }

    /// Every named reference in method signatures and declaration bodies.
    pub fn visit_references_mut(&mut self, f: &mut impl FnMut(&mut crate::TypeRef)) {
        for method in &mut self.class.methods {
            for param in &mut method.params {
                param.ty.visit_references_mut(f);
            }
            method.return_type.visit_references_mut(f);
        }
        for decl in &mut self.declarations {
            decl.visit_references_mut(f);
        }
    }
}

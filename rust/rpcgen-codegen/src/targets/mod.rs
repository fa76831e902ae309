//! Target languages and their emitters.
//!
//! Every target implements [`Emitter`]. The set of targets is closed: a
//! [`TargetLanguage`] maps to exactly one emitter at compile time.

use std::fmt;
use std::str::FromStr;

use rpcgen_types::{Declaration, Error, Node, Program, Result};

use crate::planner::FilePlan;
use crate::{GeneratedFile, Metadata};

pub mod dart;
pub mod go;
pub mod javascript;
pub mod kotlin;
pub mod python;
pub mod swift;
pub mod typescript;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetLanguage {
    TypeScript,
    JavaScript,
    Python,
    Swift,
    Dart,
    Kotlin,
    Go,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 7] = [
        TargetLanguage::TypeScript,
        TargetLanguage::JavaScript,
        TargetLanguage::Python,
        TargetLanguage::Swift,
        TargetLanguage::Dart,
        TargetLanguage::Kotlin,
        TargetLanguage::Go,
    ];

    pub fn emitter(self) -> &'static dyn Emitter {
        match self {
            TargetLanguage::TypeScript => &typescript::TypeScript,
            TargetLanguage::JavaScript => &javascript::JavaScript,
            TargetLanguage::Python => &python::Python,
            TargetLanguage::Swift => &swift::Swift,
            TargetLanguage::Dart => &dart::Dart,
            TargetLanguage::Kotlin => &kotlin::Kotlin,
            TargetLanguage::Go => &go::Go,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetLanguage::TypeScript => "typescript",
            TargetLanguage::JavaScript => "javascript",
            TargetLanguage::Python => "python",
            TargetLanguage::Swift => "swift",
            TargetLanguage::Dart => "dart",
            TargetLanguage::Kotlin => "kotlin",
            TargetLanguage::Go => "go",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ts" | "typescript" => Ok(TargetLanguage::TypeScript),
            "js" | "javascript" => Ok(TargetLanguage::JavaScript),
            "py" | "python" => Ok(TargetLanguage::Python),
            "swift" => Ok(TargetLanguage::Swift),
            "dart" => Ok(TargetLanguage::Dart),
            "kt" | "kotlin" => Ok(TargetLanguage::Kotlin),
            "go" | "golang" => Ok(TargetLanguage::Go),
            _ => Err(Error::UnsupportedTargetLanguage {
                language: s.to_string(),
            }),
        }
    }
}

/// Everything one target language needs to turn a plan into source files.
pub trait Emitter: Sync {
    fn language(&self) -> TargetLanguage;

    /// Identifiers that get a trailing `_` when used as parameter or
    /// property names.
    fn reserved_words(&self) -> &'static [&'static str];

    /// The language's spelling of a type. Total over [`Node`].
    fn render_type(&self, node: &Node) -> String;

    // ------------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------------

    fn client_path(&self, program: &Program) -> String;

    fn model_path(&self, declaring_path: &str) -> String;

    fn runtime_path(&self) -> &'static str;

    /// Whether declarations are rendered at all. Untyped targets skip them.
    fn emits_declarations(&self) -> bool {
        true
    }

    /// Extra files derived from the generated set, such as package markers.
    fn companion_files(&self, _files: &[GeneratedFile]) -> Vec<GeneratedFile> {
        Vec::new()
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn render_declaration(&self, decl: &Declaration) -> Result<String>;

    fn render_class(
        &self,
        program: &Program,
        file: &FilePlan<'_>,
        metadata: &Metadata,
    ) -> Result<String>;

    fn render_model_file(&self, file: &FilePlan<'_>, metadata: &Metadata) -> Result<String>;

    fn render_runtime(&self, metadata: &Metadata) -> Result<String>;
}

/// Renders every declaration a file owns, in plan order.
pub(crate) fn render_declarations(
    emitter: &dyn Emitter,
    file: &FilePlan<'_>,
) -> Result<Vec<String>> {
    file.declarations
        .iter()
        .map(|d| emitter.render_declaration(d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcgen_types::{PropertyDefinition, RefKind};

    fn every_node() -> Vec<Node> {
        vec![
            Node::String,
            Node::Integer,
            Node::Double,
            Node::Float,
            Node::Boolean,
            Node::Void,
            Node::Null,
            Node::Any,
            Node::Date,
            Node::array(Node::String),
            Node::map(Node::String, Node::Double),
            Node::map(Node::Date, Node::Any),
            Node::promise(Node::Boolean),
            Node::Union(vec![Node::String, Node::Null]),
            Node::Union(vec![Node::String, Node::Double]),
            Node::Union(vec![]),
            Node::reference("User", "src/models", RefKind::Struct),
            Node::reference("Role", "src/models", RefKind::Enum),
            Node::reference("Ids", "src/models", RefKind::Alias),
            Node::TypeLiteral(vec![PropertyDefinition::new("a", Node::String)]),
            Node::TypeLiteral(vec![]),
            Node::array(Node::Union(vec![Node::Double, Node::Null])),
            Node::promise(Node::array(Node::map(Node::String, Node::Void))),
        ]
    }

    #[test]
    fn every_node_renders_in_every_language() {
        for language in TargetLanguage::ALL {
            let emitter = language.emitter();
            assert_eq!(emitter.language(), language);
            for node in every_node() {
                let rendered = emitter.render_type(&node);
                assert!(!rendered.trim().is_empty(), "{language}: empty type for {node:?}");
                assert!(
                    !rendered.contains("undefined"),
                    "{language}: {rendered} for {node:?}"
                );
            }
        }
    }

    #[test]
    fn language_names_parse() {
        assert_eq!("ts".parse::<TargetLanguage>().unwrap(), TargetLanguage::TypeScript);
        assert_eq!("Kotlin".parse::<TargetLanguage>().unwrap(), TargetLanguage::Kotlin);
        assert_eq!("golang".parse::<TargetLanguage>().unwrap(), TargetLanguage::Go);
        for language in TargetLanguage::ALL {
            assert_eq!(language.as_str().parse::<TargetLanguage>().unwrap(), language);
        }
        assert!(matches!(
            "cobol".parse::<TargetLanguage>(),
            Err(Error::UnsupportedTargetLanguage { .. })
        ));
    }
}

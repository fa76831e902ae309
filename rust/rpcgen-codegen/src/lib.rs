#![deny(unsafe_code)]

//! Client SDK generation for rpcgen programs.
//!
//! Takes the [`Program`]s built by `rpcgen-parse` and produces, per target
//! language, a client file for every class with exposed methods, model files
//! for the declarations those methods reach, and one runtime file that
//! performs the actual JSON-RPC call.
//!
//! ```text
//! Program[]  →  planner (ownership, imports)  →  Emitter  →  GeneratedFile[]
//! ```
//!
//! Nothing here touches the filesystem. Client files carry
//! [`REMOTE_URL_PLACEHOLDER`] where the deployment URL goes; [`link`]
//! substitutes it once the URL is known.
//!
//! ```ignore
//! let files = rpcgen_codegen::generate_target(&programs, TargetLanguage::TypeScript, &metadata)?;
//! for file in files {
//!     std::fs::write(out.join(&file.path), file.content)?;
//! }
//! ```

mod pipeline;
pub mod planner;
pub mod render;
mod summary;
pub mod targets;
mod template;
mod view;

pub use pipeline::{Target, TargetOutput, generate, generate_target};
pub use summary::{AstSummary, ClassSummary, MethodSummary, ParamSummary};
pub use targets::{Emitter, TargetLanguage};

/// Sentinel every generated client uses in place of its deployment URL.
pub const REMOTE_URL_PLACEHOLDER: &str = "%%%RPCGEN_REMOTE_URL%%%";

/// Replaces the URL placeholder in generated source.
pub fn link(content: &str, url: &str) -> String {
    content.replace(REMOTE_URL_PLACEHOLDER, url)
}

/// Project metadata stamped into generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub version: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: "rpcgen".to_string(),
            version: "0.1.0".to_string(),
        }
    }
}

impl Metadata {
    /// The project name reduced to a lowercase identifier, for package names.
    pub fn package_ident(&self) -> String {
        let ident: String = self
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match ident.chars().next() {
            None => "app".to_string(),
            Some(c) if c.is_ascii_digit() => format!("app{ident}"),
            Some(_) => ident,
        }
    }
}

/// One generated file, relative to the target's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    /// The class a client file was generated for. `None` for model,
    /// runtime and companion files.
    pub owner_class: Option<String>,
}

use std::collections::BTreeMap;
use std::path::PathBuf;

/// A source file handed to the front end: a project-relative,
/// `/`-separated path plus its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Reads the modules that a source file imports types from.
///
/// Paths are project-relative and `/`-separated. Returning `None` means the
/// file does not exist; the resolver then tries the next candidate.
pub trait SourceLoader: Sync {
    fn load(&self, path: &str) -> Option<String>;
}

/// In-memory file set.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn source(&self, path: &str) -> Option<SourceFile> {
        self.files
            .get(path)
            .map(|text| SourceFile::new(path, text.clone()))
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// Reads files below a project root.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceLoader for FsLoader {
    fn load(&self, path: &str) -> Option<String> {
        let full = self.root.join(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %full.display(), error = %e, "cannot read source file");
                None
            }
        }
    }
}

/// Joins a relative import specifier onto the directory of `from`,
/// normalizing `.` and `..` segments. Segments that climb above the project
/// root are kept as leading `..`.
pub(crate) fn join_relative(from: &str, specifier: &str) -> String {
    let mut parts: Vec<&str> = from.split('/').collect();
    parts.pop();
    for seg in specifier.split('/') {
        match seg {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Files a relative import specifier may refer to, in lookup order.
pub(crate) fn candidates(base: &str) -> Vec<String> {
    const EXTENSIONS: [&str; 4] = [".ts", ".mts", ".d.ts", ".js"];

    let mut out = Vec::new();
    if has_source_extension(base) {
        out.push(base.to_string());
        // `./models.js` in TypeScript sources names `./models.ts`.
        if let Some(stem) = base.strip_suffix(".js") {
            out.push(format!("{stem}.ts"));
        }
        return out;
    }
    for ext in EXTENSIONS {
        out.push(format!("{base}{ext}"));
    }
    for ext in EXTENSIONS {
        out.push(format!("{base}/index{ext}"));
    }
    out
}

fn has_source_extension(path: &str) -> bool {
    [".ts", ".mts", ".js", ".mjs"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Stands in for a `..` segment so modules outside the project root keep
/// distinct output locations.
pub(crate) const PARENT_SEGMENT: &str = "_parent";

/// Project-relative module identity without extension, as used for
/// declaration keys and output locations.
pub(crate) fn declaring_path(path: &str) -> String {
    let mut p = path;
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    let mut out = String::new();
    while let Some(rest) = p.strip_prefix("../") {
        out.push_str(PARENT_SEGMENT);
        out.push('/');
        p = rest;
    }
    let p = match p.rfind('.') {
        Some(dot) if !p[dot..].contains('/') => &p[..dot],
        _ => p,
    };
    out.push_str(p.strip_suffix(".d").unwrap_or(p));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_joins_normalize() {
        assert_eq!(join_relative("src/greeter.ts", "./models"), "src/models");
        assert_eq!(join_relative("src/api/greeter.ts", "../models/user"), "src/models/user");
        assert_eq!(join_relative("greeter.ts", "../shared/types"), "../shared/types");
        assert_eq!(join_relative("src/a.ts", "./b/../c"), "src/c");
    }

    #[test]
    fn declaring_paths_drop_extensions_and_keep_parents_apart() {
        assert_eq!(declaring_path("src/models.ts"), "src/models");
        assert_eq!(declaring_path("src/types.d.ts"), "src/types");
        assert_eq!(declaring_path("../shared/types.ts"), "_parent/shared/types");
        assert_eq!(declaring_path("../../x/models.ts"), "_parent/_parent/x/models");
        assert_ne!(declaring_path("../x/models.ts"), declaring_path("x/models.ts"));
        assert_eq!(declaring_path("./greeter.js"), "greeter");
        assert_eq!(declaring_path("src/v1.2/models"), "src/v1.2/models");
    }

    #[test]
    fn extensionless_specifiers_try_files_then_index() {
        let c = candidates("src/models");
        assert_eq!(c.first().map(String::as_str), Some("src/models.ts"));
        assert!(c.contains(&"src/models/index.ts".to_string()));

        assert_eq!(candidates("src/models.js"), ["src/models.js", "src/models.ts"]);
    }
}

use std::collections::{HashMap, HashSet};

use rpcgen_types::{ParameterDefinition, PropertyDefinition};

/// Fully-qualified method name as the runtime sends it: `Class.method`.
pub fn fq_name(class_name: &str, method_name: &str) -> String {
    format!("{class_name}.{method_name}")
}

/// Appends `_` to names that collide with `reserved`, and replaces characters
/// that cannot appear in identifiers.
pub fn safe_ident(name: &str, reserved: &[&str]) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if reserved.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// [`safe_ident`] over the names of one scope. Names that come through
/// unchanged keep their spelling; a renamed one that would land on another
/// name of the scope keeps growing its suffix.
pub fn safe_idents<'a>(names: impl IntoIterator<Item = &'a str>, reserved: &[&str]) -> Vec<String> {
    let names: Vec<&str> = names.into_iter().collect();
    let mut out: Vec<String> = names.iter().map(|n| safe_ident(n, reserved)).collect();
    let mut taken: HashSet<String> = out
        .iter()
        .zip(&names)
        .filter(|(ident, name)| ident.as_str() == **name)
        .map(|(ident, _)| ident.clone())
        .collect();
    for (ident, name) in out.iter_mut().zip(&names) {
        if ident.as_str() == *name {
            continue;
        }
        while taken.contains(ident.as_str()) || reserved.contains(&ident.as_str()) {
            ident.push('_');
        }
        taken.insert(ident.clone());
    }
    out
}

/// Identifiers of a parameter list, in order.
pub fn param_idents(params: &[ParameterDefinition], reserved: &[&str]) -> Vec<String> {
    safe_idents(params.iter().map(|p| p.name.as_str()), reserved)
}

/// Identifier of every field of one record, keyed by wire name.
pub fn field_idents<'f>(
    fields: &'f [PropertyDefinition],
    reserved: &[&str],
) -> HashMap<&'f str, String> {
    let names = fields.iter().map(|f| f.name.as_str());
    names.clone().zip(safe_idents(names, reserved)).collect()
}

/// How a target spells documentation comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStyle {
    /// `/** ... */`
    Block,
    /// `/// ...`
    TripleSlash,
    /// `// ...`
    Line,
    /// `# ...`
    Hash,
    /// A `"""` docstring.
    Docstring,
}

/// The doc comment for `docs`, one output line per entry, each prefixed by
/// `indent`. Empty when there is nothing to document.
pub fn doc_lines(docs: Option<&str>, style: DocStyle, indent: &str) -> Vec<String> {
    let Some(text) = docs.filter(|d| !d.trim().is_empty()) else {
        return Vec::new();
    };
    let (open, prefix, close) = match style {
        DocStyle::Block => (Some("/**"), " * ", Some(" */")),
        DocStyle::TripleSlash => (None, "/// ", None),
        DocStyle::Line => (None, "// ", None),
        DocStyle::Hash => (None, "# ", None),
        DocStyle::Docstring => (Some("\"\"\""), "", Some("\"\"\"")),
    };
    let text = match style {
        DocStyle::Block => text.replace("*/", "*\\/"),
        DocStyle::Docstring => text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\"\""),
        _ => text.to_string(),
    };

    let mut out = Vec::new();
    if let Some(open) = open {
        out.push(format!("{indent}{open}"));
    }
    for line in text.lines() {
        out.push(format!("{indent}{prefix}{line}").trim_end().to_string());
    }
    if let Some(close) = close {
        out.push(format!("{indent}{close}"));
    }
    out
}

/// `body` preceded by its doc comment.
pub fn documented(docs: Option<&str>, style: DocStyle, body: String) -> String {
    let mut lines = doc_lines(docs, style, "");
    if lines.is_empty() {
        return body;
    }
    lines.push(body);
    lines.join("\n")
}

/// A double-quoted string literal. JSON escaping is valid in every target;
/// `escape_dollar` additionally protects string interpolation (Dart, Kotlin).
pub fn quote(s: &str, escape_dollar: bool) -> String {
    let quoted = serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""));
    if escape_dollar {
        quoted.replace('$', "\\$")
    } else {
        quoted
    }
}

/// Which parameters may be rendered with a default value in languages where
/// a defaulted parameter cannot precede a required one: only those in the
/// trailing run of optional parameters.
pub fn trailing_optional(params: &[ParameterDefinition]) -> Vec<bool> {
    let mut out = vec![false; params.len()];
    for (i, p) in params.iter().enumerate().rev() {
        if !p.optional {
            break;
        }
        out[i] = true;
    }
    out
}

/// Marks a rendered type as nullable unless it already is.
pub fn nullable(rendered: &str, top_types: &[&str]) -> String {
    if rendered.ends_with('?') || top_types.contains(&rendered) {
        rendered.to_string()
    } else {
        format!("{rendered}?")
    }
}

/// Path of `to` relative to the directory containing `from`. Both are
/// `/`-separated output paths. The result always starts with `./` or `../`.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = {
        let mut parts: Vec<&str> = from.split('/').collect();
        parts.pop();
        parts
    };
    let to_parts: Vec<&str> = to.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dir.len() - common;
    let mut out = String::new();
    if ups == 0 {
        out.push_str("./");
    } else {
        for _ in 0..ups {
            out.push_str("../");
        }
    }
    out.push_str(&to_parts[common..].join("/"));
    out
}

/// Output-safe version of a declaring path: separators kept, every segment
/// reduced to identifier characters.
pub fn module_path(declaring_path: &str) -> String {
    declaring_path
        .split('/')
        .map(|seg| {
            seg.chars()
                .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcgen_types::{Literal, Node};

    #[test]
    fn relative_paths_between_output_files() {
        assert_eq!(relative_path("greeter.sdk.ts", "src/models/user.ts"), "./src/models/user.ts");
        assert_eq!(relative_path("src/models/user.ts", "src/models/role.ts"), "./role.ts");
        assert_eq!(relative_path("src/models/user.ts", "shared/ids.ts"), "../../shared/ids.ts");
        assert_eq!(relative_path("src/a/x.ts", "src/b/y.ts"), "../b/y.ts");
        assert_eq!(relative_path("src/models/user.ts", "greeter.sdk.ts"), "../../greeter.sdk.ts");
    }

    #[test]
    fn reserved_names_get_a_suffix() {
        let reserved = ["from", "def"];
        assert_eq!(safe_ident("from", &reserved), "from_");
        assert_eq!(safe_ident("fromage", &reserved), "fromage");
        assert_eq!(safe_ident("content-type", &reserved), "content_type");
        assert_eq!(safe_ident("1st", &reserved), "_1st");
    }

    #[test]
    fn renamed_idents_do_not_land_on_their_neighbours() {
        let reserved = ["from", "def"];
        assert_eq!(safe_idents(["from", "from_"], &reserved), ["from__", "from_"]);
        assert_eq!(safe_idents(["from_", "from"], &reserved), ["from_", "from__"]);
        assert_eq!(safe_idents(["a-b", "a_b", "def"], &reserved), ["a_b_", "a_b", "def_"]);
        assert_eq!(safe_idents(["x", "y"], &reserved), ["x", "y"]);

        let fields = [
            PropertyDefinition::new("def", Node::String),
            PropertyDefinition::new("def_", Node::String),
        ];
        let idents = field_idents(&fields, &reserved);
        assert_eq!(idents["def"], "def__");
        assert_eq!(idents["def_"], "def_");
    }

    #[test]
    fn doc_comments_per_style() {
        let docs = Some("Greets a user.\n\n@param name who");
        assert_eq!(
            doc_lines(docs, DocStyle::Block, "  "),
            ["  /**", "   * Greets a user.", "   *", "   * @param name who", "   */"]
        );
        assert_eq!(
            doc_lines(docs, DocStyle::Line, ""),
            ["// Greets a user.", "//", "// @param name who"]
        );
        assert_eq!(
            doc_lines(Some("Says \"\"\"hi\"\"\""), DocStyle::Docstring, "    "),
            ["    \"\"\"", "    Says \\\"\"\"hi\\\"\"\"", "    \"\"\""]
        );
        assert_eq!(doc_lines(Some("ends */ here"), DocStyle::Block, "")[1], " * ends *\\/ here");
        assert!(doc_lines(None, DocStyle::TripleSlash, "").is_empty());
        assert!(doc_lines(Some("  \n"), DocStyle::Hash, "").is_empty());
        assert_eq!(
            documented(Some("A user."), DocStyle::Hash, "class User:".into()),
            "# A user.\nclass User:"
        );
        assert_eq!(documented(None, DocStyle::Hash, "x".into()), "x");
    }

    #[test]
    fn only_trailing_optionals_keep_defaults() {
        let params = vec![
            ParameterDefinition::new("a", Node::String).with_default(Literal::String("x".into())),
            ParameterDefinition::new("b", Node::String),
            ParameterDefinition::new("c", Node::Double).with_default(Literal::Number("1".into())),
            ParameterDefinition::new("d", Node::Double).optional(),
        ];
        assert_eq!(trailing_optional(&params), [false, false, true, true]);
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("a\"b", false), r#""a\"b""#);
        assert_eq!(quote("cost $5", true), r#""cost \$5""#);
    }

    #[test]
    fn module_paths_are_identifier_safe() {
        assert_eq!(module_path("src/my-models/user.v2"), "src/my_models/user_v2");
    }
}

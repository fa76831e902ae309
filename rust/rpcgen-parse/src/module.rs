//! One parsed source module and the lookups the resolver runs against it.

use deno_ast::diagnostics::Diagnostic;
use deno_ast::swc::ast;
use deno_ast::swc::common::comments::CommentKind;
use deno_ast::swc::common::{BytePos, Spanned};
use deno_ast::{MediaType, ModuleItemRef, ModuleSpecifier, ParseParams, ParsedSource, SourcePos};
use rpcgen_types::{Error, Result, SourceLanguage};

use crate::loader::declaring_path;

pub(crate) struct Module {
    pub path: String,
    pub declaring_path: String,
    pub language: SourceLanguage,
    parsed: ParsedSource,
}

/// A declaration found at the top level of a module.
#[derive(Clone, Copy)]
pub(crate) enum LocalDecl<'a> {
    Alias(&'a ast::TsTypeAliasDecl),
    Interface(&'a ast::TsInterfaceDecl),
    Enum(&'a ast::TsEnumDecl),
    Class(&'a ast::Class),
}

/// Where an exported class was found in its module.
pub(crate) struct ExportedClass<'a> {
    pub name: String,
    pub class: &'a ast::Class,
    pub docs: Option<String>,
}

impl Module {
    pub fn parse(path: &str, text: String) -> Result<Self> {
        let ext = path.rsplit('.').next().unwrap_or_default();
        let language = SourceLanguage::from_extension(ext).ok_or_else(|| {
            Error::UnsupportedSourceLanguage {
                path: path.to_string(),
            }
        })?;
        let media_type = if path.ends_with(".d.ts") {
            MediaType::Dts
        } else {
            match ext {
                "ts" => MediaType::TypeScript,
                "mts" => MediaType::Mts,
                "mjs" => MediaType::Mjs,
                _ => MediaType::JavaScript,
            }
        };

        let specifier = ModuleSpecifier::parse(&format!("file:///{path}")).map_err(|e| {
            Error::UnsupportedSyntax {
                path: path.to_string(),
                message: format!("invalid module path: {e}"),
            }
        })?;

        let parsed = deno_ast::parse_module(ParseParams {
            specifier,
            text: text.into(),
            media_type,
            capture_tokens: false,
            scope_analysis: false,
            maybe_syntax: None,
        })
        .map_err(|diagnostic| {
            let pos = diagnostic.display_position();
            Error::Parse {
                path: path.to_string(),
                line: pos.line_number,
                column: pos.column_number,
                message: diagnostic.message().to_string(),
            }
        })?;

        tracing::debug!(path, ?language, "parsed module");

        Ok(Self {
            path: path.to_string(),
            declaring_path: declaring_path(path),
            language,
            parsed,
        })
    }

    fn items(&self) -> impl Iterator<Item = ModuleItemRef<'_>> {
        self.parsed.program_ref().body()
    }

    /// The last JSDoc block among the comments leading the token at `pos`.
    pub fn docs_at(&self, pos: BytePos) -> Option<String> {
        let comments = self.parsed.comments().get_leading(SourcePos::unsafely_from_byte_pos(pos))?;
        comments
            .iter()
            .filter(|c| c.kind == CommentKind::Block && c.text.starts_with('*'))
            .filter_map(|c| jsdoc_text(&c.text))
            .last()
    }

    /// Docs of the first position in `candidates` that has any.
    pub fn docs_before(&self, candidates: &[BytePos]) -> Option<String> {
        candidates.iter().find_map(|&pos| self.docs_at(pos))
    }

    // ========================================================================
    // Exported classes
    // ========================================================================

    /// Classes this module exports, in source order.
    pub fn exported_classes(&self) -> Vec<ExportedClass<'_>> {
        let mut out = Vec::new();
        let mut exported_names = Vec::new();

        for item in self.items() {
            let ModuleItemRef::ModuleDecl(decl) = item else {
                continue;
            };
            match decl {
                ast::ModuleDecl::ExportDecl(export) => {
                    if let ast::Decl::Class(c) = &export.decl {
                        out.push(ExportedClass {
                            name: c.ident.sym.to_string(),
                            class: &c.class,
                            docs: self.docs_before(&[export.span.lo, c.class.span.lo]),
                        });
                    }
                }
                ast::ModuleDecl::ExportDefaultDecl(export) => {
                    if let ast::DefaultDecl::Class(c) = &export.decl {
                        let name = match &c.ident {
                            Some(id) => id.sym.to_string(),
                            None => self.default_class_name(),
                        };
                        out.push(ExportedClass {
                            name,
                            class: &c.class,
                            docs: self.docs_before(&[export.span.lo, c.class.span.lo]),
                        });
                    }
                }
                ast::ModuleDecl::ExportDefaultExpr(export) => {
                    if let ast::Expr::Ident(id) = export.expr.as_ref() {
                        exported_names.push(id.sym.to_string());
                    }
                }
                ast::ModuleDecl::ExportNamed(named) if named.src.is_none() => {
                    for spec in &named.specifiers {
                        if let ast::ExportSpecifier::Named(n) = spec {
                            exported_names.push(export_name(&n.orig));
                        }
                    }
                }
                _ => {}
            }
        }

        // `class Greeter {}` followed by `export { Greeter }`
        for name in exported_names {
            if out.iter().any(|c| c.name == name) {
                continue;
            }
            if let Some((LocalDecl::Class(class), docs)) = self.local_with_docs(&name) {
                out.push(ExportedClass { name, class, docs });
            }
        }
        out
    }

    fn default_class_name(&self) -> String {
        let stem = self.declaring_path.rsplit('/').next().unwrap_or("Default");
        let mut chars = stem.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Default".to_string(),
        }
    }

    // ========================================================================
    // Declaration index
    // ========================================================================

    /// A type-level declaration named `name` at the top level of this module,
    /// exported or not.
    pub fn local(&self, name: &str) -> Option<LocalDecl<'_>> {
        self.local_with_docs(name).map(|(decl, _)| decl)
    }

    /// [`Module::local`] plus the declaration's doc comment.
    pub fn local_with_docs(&self, name: &str) -> Option<(LocalDecl<'_>, Option<String>)> {
        self.items()
            .find_map(|item| local_in(item, name))
            .map(|(decl, lo)| (decl, self.docs_at(lo)))
    }

    /// `import { imported as name } from "specifier"` → `(specifier, imported)`.
    pub fn import_of(&self, name: &str) -> Option<(String, String)> {
        for item in self.items() {
            let ModuleItemRef::ModuleDecl(ast::ModuleDecl::Import(import)) = item else {
                continue;
            };
            for spec in &import.specifiers {
                match spec {
                    ast::ImportSpecifier::Named(n) if &*n.local.sym == name => {
                        let imported = match &n.imported {
                            Some(orig) => export_name(orig),
                            None => name.to_string(),
                        };
                        return Some((str_value(&import.src), imported));
                    }
                    ast::ImportSpecifier::Default(d) if &*d.local.sym == name => {
                        return Some((str_value(&import.src), "default".to_string()));
                    }
                    _ => {}
                }
            }
        }
        None
    }

    /// Resolution of an exported name that is not a local declaration:
    /// `export { orig as name }`, `export { orig as name } from "spec"` or
    /// `export default Name`.
    pub fn export_alias(&self, name: &str) -> Option<ExportAlias> {
        for item in self.items() {
            let ModuleItemRef::ModuleDecl(decl) = item else {
                continue;
            };
            match decl {
                ast::ModuleDecl::ExportNamed(named) => {
                    for spec in &named.specifiers {
                        let ast::ExportSpecifier::Named(n) = spec else {
                            continue;
                        };
                        let orig = export_name(&n.orig);
                        let exported = n.exported.as_ref().map(export_name);
                        if exported.as_deref().unwrap_or(&orig) != name {
                            continue;
                        }
                        return Some(match &named.src {
                            Some(src) => ExportAlias::From {
                                specifier: str_value(src),
                                name: orig,
                            },
                            None => ExportAlias::Local(orig),
                        });
                    }
                }
                ast::ModuleDecl::ExportDefaultExpr(export) if name == "default" => {
                    if let ast::Expr::Ident(id) = export.expr.as_ref() {
                        return Some(ExportAlias::Local(id.sym.to_string()));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Specifiers of `export * from "..."` statements.
    pub fn star_exports(&self) -> Vec<String> {
        self.items()
            .filter_map(|item| match item {
                ModuleItemRef::ModuleDecl(ast::ModuleDecl::ExportAll(all)) => {
                    Some(str_value(&all.src))
                }
                _ => None,
            })
            .collect()
    }
}

/// The declaration named `name` in one module item, with the position its
/// doc comment leads.
fn local_in<'a>(item: ModuleItemRef<'a>, name: &str) -> Option<(LocalDecl<'a>, BytePos)> {
    let (decl, lo) = match item {
        ModuleItemRef::Stmt(ast::Stmt::Decl(decl)) => (decl, decl.span_lo()),
        ModuleItemRef::ModuleDecl(ast::ModuleDecl::ExportDecl(export)) => {
            (&export.decl, export.span.lo)
        }
        ModuleItemRef::ModuleDecl(ast::ModuleDecl::ExportDefaultDecl(export)) => {
            let found = match &export.decl {
                ast::DefaultDecl::Class(c) => {
                    let matches = match &c.ident {
                        Some(id) => &*id.sym == name,
                        None => name == "default",
                    };
                    matches.then_some(LocalDecl::Class(&c.class))
                }
                ast::DefaultDecl::TsInterfaceDecl(i) if &*i.id.sym == name => {
                    Some(LocalDecl::Interface(i))
                }
                _ => None,
            };
            return found.map(|decl| (decl, export.span.lo));
        }
        _ => return None,
    };
    let found = match decl {
        ast::Decl::TsTypeAlias(a) if &*a.id.sym == name => LocalDecl::Alias(a),
        ast::Decl::TsInterface(i) if &*i.id.sym == name => LocalDecl::Interface(i),
        ast::Decl::TsEnum(e) if &*e.id.sym == name => LocalDecl::Enum(e),
        ast::Decl::Class(c) if &*c.ident.sym == name => LocalDecl::Class(&c.class),
        _ => return None,
    };
    Some((found, lo))
}

/// `* Greets.\n * @deprecated` → `Greets.\n@deprecated`.
fn jsdoc_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .collect();
    let first = lines.iter().position(|l| !l.is_empty())?;
    let last = lines.iter().rposition(|l| !l.is_empty())?;
    Some(lines[first..=last].join("\n"))
}

pub(crate) enum ExportAlias {
    Local(String),
    From { specifier: String, name: String },
}

pub(crate) fn export_name(name: &ast::ModuleExportName) -> String {
    match name {
        ast::ModuleExportName::Ident(id) => id.sym.to_string(),
        ast::ModuleExportName::Str(s) => str_value(s),
    }
}

pub(crate) fn str_value(s: &ast::Str) -> String {
    String::from_utf8_lossy(s.value.as_bytes()).to_string()
}

//! Type classification and cross-module declaration resolution.

use std::collections::HashMap;
use std::rc::Rc;

use deno_ast::swc::ast;
use indexmap::IndexMap;
use rpcgen_types::{
    Declaration, DeclarationShape, EnumCase, Error, Literal, Node, PropertyDefinition, RefKind,
    Result,
};

use crate::loader::{SourceLoader, candidates, join_relative};
use crate::module::{ExportAlias, LocalDecl, Module};

/// Re-export chains longer than this are treated as unresolvable.
const MAX_EXPORT_DEPTH: usize = 32;

struct Slot {
    kind: RefKind,
    decl: Option<Declaration>,
}

/// Resolution state for building one program.
///
/// Owns the module cache and the declaration dedup table. Slots are inserted
/// before a declaration's body is classified, so a reference cycle finds the
/// slot already taken and stops.
pub(crate) struct Resolver<'l> {
    loader: &'l dyn SourceLoader,
    modules: HashMap<String, Rc<Module>>,
    table: IndexMap<(String, String), Slot>,
    /// Unresolvable names become `any` instead of an error.
    lenient: bool,
}

impl<'l> Resolver<'l> {
    pub fn new(loader: &'l dyn SourceLoader) -> Self {
        Self {
            loader,
            modules: HashMap::new(),
            table: IndexMap::new(),
            lenient: false,
        }
    }

    pub fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    /// Drops slots whose declaration never finished resolving, after a
    /// lenient classification failed halfway.
    pub fn discard_unfinished(&mut self) {
        self.table.retain(|_, slot| slot.decl.is_some());
    }

    pub fn add_module(&mut self, module: Rc<Module>) {
        self.modules.insert(module.path.clone(), module);
    }

    /// Declarations in discovery order.
    pub fn into_declarations(self) -> Vec<Declaration> {
        self.table.into_values().filter_map(|slot| slot.decl).collect()
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Classifies an optional annotation. A missing annotation is `Any`.
    pub fn classify_ann(
        &mut self,
        module: &Rc<Module>,
        ann: Option<&ast::TsTypeAnn>,
        generics: &[String],
    ) -> Result<Node> {
        match ann {
            Some(ann) => self.classify(module, &ann.type_ann, generics),
            None => Ok(Node::Any),
        }
    }

    pub fn classify(
        &mut self,
        module: &Rc<Module>,
        ty: &ast::TsType,
        generics: &[String],
    ) -> Result<Node> {
        use ast::TsKeywordTypeKind as K;

        let node = match ty {
            ast::TsType::TsKeywordType(kw) => match kw.kind {
                K::TsStringKeyword => Node::String,
                K::TsNumberKeyword => Node::Double,
                K::TsBigIntKeyword => Node::Integer,
                K::TsBooleanKeyword => Node::Boolean,
                K::TsAnyKeyword | K::TsUnknownKeyword | K::TsObjectKeyword => Node::Any,
                K::TsVoidKeyword | K::TsNeverKeyword => Node::Void,
                K::TsNullKeyword | K::TsUndefinedKeyword => Node::Null,
                K::TsSymbolKeyword | K::TsIntrinsicKeyword => degrade(module, "symbol type"),
            },
            ast::TsType::TsArrayType(arr) => {
                Node::array(self.classify(module, &arr.elem_type, generics)?)
            }
            ast::TsType::TsTypeRef(r) => self.classify_ref(module, r, generics)?,
            ast::TsType::TsTypeLit(lit) => self.classify_literal(module, &lit.members, generics)?,
            ast::TsType::TsUnionOrIntersectionType(ast::TsUnionOrIntersectionType::TsUnionType(
                u,
            )) => {
                let mut params = Vec::with_capacity(u.types.len());
                for t in &u.types {
                    params.push(self.classify(module, t, generics)?);
                }
                Node::Union(params)
            }
            ast::TsType::TsParenthesizedType(p) => self.classify(module, &p.type_ann, generics)?,
            ast::TsType::TsOptionalType(o) => self.classify(module, &o.type_ann, generics)?,
            ast::TsType::TsTypeOperator(op) if op.op == ast::TsTypeOperatorOp::ReadOnly => {
                self.classify(module, &op.type_ann, generics)?
            }
            ast::TsType::TsLitType(lit) => match &lit.lit {
                ast::TsLit::Str(_) | ast::TsLit::Tpl(_) => Node::String,
                ast::TsLit::Number(_) => Node::Double,
                ast::TsLit::Bool(_) => Node::Boolean,
                ast::TsLit::BigInt(_) => Node::Integer,
            },
            ast::TsType::TsUnionOrIntersectionType(
                ast::TsUnionOrIntersectionType::TsIntersectionType(_),
            ) => degrade(module, "intersection type"),
            ast::TsType::TsTupleType(_) => degrade(module, "tuple type"),
            ast::TsType::TsFnOrConstructorType(_) => degrade(module, "function type"),
            _ => degrade(module, "type construct"),
        };
        Ok(node)
    }

    fn classify_ref(
        &mut self,
        module: &Rc<Module>,
        r: &ast::TsTypeRef,
        generics: &[String],
    ) -> Result<Node> {
        let name = match &r.type_name {
            ast::TsEntityName::Ident(id) => id.sym.to_string(),
            _ => return Ok(degrade(module, "qualified type name")),
        };
        if generics.iter().any(|g| *g == name) {
            return Ok(Node::Any);
        }

        let mut args = Vec::new();
        if let Some(params) = &r.type_params {
            for p in &params.params {
                args.push(self.classify(module, p, generics)?);
            }
        }
        let mut args = args.into_iter();
        let mut arg = || args.next().unwrap_or(Node::Any);

        Ok(match name.as_str() {
            "Array" | "ReadonlyArray" => Node::array(arg()),
            "Promise" => Node::promise(arg()),
            "Date" => Node::Date,
            "Record" | "Map" => {
                let key = arg();
                Node::map(key, arg())
            }
            _ => self.resolve_named(module, &name)?,
        })
    }

    /// An inline `{ ... }` type. A lone index signature is a map.
    fn classify_literal(
        &mut self,
        module: &Rc<Module>,
        members: &[ast::TsTypeElement],
        generics: &[String],
    ) -> Result<Node> {
        if let [ast::TsTypeElement::TsIndexSignature(sig)] = members {
            let key = match sig.params.first() {
                Some(ast::TsFnParam::Ident(id)) => {
                    self.classify_ann(module, id.type_ann.as_deref(), generics)?
                }
                _ => Node::String,
            };
            let value = self.classify_ann(module, sig.type_ann.as_deref(), generics)?;
            return Ok(Node::map(key, value));
        }
        Ok(Node::TypeLiteral(self.members(module, members, generics)?))
    }

    fn members(
        &mut self,
        module: &Rc<Module>,
        members: &[ast::TsTypeElement],
        generics: &[String],
    ) -> Result<Vec<PropertyDefinition>> {
        let mut props = Vec::new();
        for member in members {
            match member {
                ast::TsTypeElement::TsPropertySignature(p) => {
                    if p.computed {
                        return Err(unsupported(module, "computed property names"));
                    }
                    let name = match p.key.as_ref() {
                        ast::Expr::Ident(id) => id.sym.to_string(),
                        ast::Expr::Lit(ast::Lit::Str(s)) => crate::module::str_value(s),
                        _ => return Err(unsupported(module, "property key")),
                    };
                    let ty = self.classify_ann(module, p.type_ann.as_deref(), generics)?;
                    props.push(PropertyDefinition {
                        name,
                        optional: p.optional,
                        ty,
                    });
                }
                _ => {
                    tracing::warn!(
                        path = %module.path,
                        "skipping non-property member in type literal"
                    );
                }
            }
        }
        Ok(props)
    }

    // ========================================================================
    // Named references
    // ========================================================================

    fn resolve_named(&mut self, module: &Rc<Module>, name: &str) -> Result<Node> {
        let Some((owner, local)) = self.locate(module, name, 0)? else {
            return self.unresolved(module, name);
        };

        let key = (local.clone(), owner.declaring_path.clone());
        if let Some(slot) = self.table.get(&key) {
            return Ok(Node::reference(local, owner.declaring_path.clone(), slot.kind));
        }

        let Some((decl, docs)) = owner.local_with_docs(&local) else {
            return self.unresolved(module, name);
        };
        let kind = match decl {
            LocalDecl::Enum(_) => RefKind::Enum,
            LocalDecl::Interface(_) | LocalDecl::Class(_) => RefKind::Struct,
            LocalDecl::Alias(a) => match a.type_ann.as_ref() {
                ast::TsType::TsTypeLit(lit) if !is_index_only(&lit.members) => RefKind::Struct,
                _ => RefKind::Alias,
            },
        };

        // Claim the slot before descending so cycles terminate here.
        self.table.insert(key.clone(), Slot { kind, decl: None });
        let shape = self.declaration_shape(&owner, decl)?;
        if let Some(slot) = self.table.get_mut(&key) {
            slot.decl = Some(Declaration {
                name: local.clone(),
                declaring_path: owner.declaring_path.clone(),
                shape,
                docs,
            });
        }
        tracing::debug!(name = %local, path = %owner.declaring_path, ?kind, "resolved declaration");

        Ok(Node::reference(local, owner.declaring_path.clone(), kind))
    }

    /// A name `locate` could not find. Types imported from packages have no
    /// source to read and become `any`; anything else is an error unless the
    /// resolver is lenient.
    fn unresolved(&self, module: &Module, name: &str) -> Result<Node> {
        if let Some((specifier, _)) = module.import_of(name) {
            if !is_relative(&specifier) {
                tracing::warn!(
                    path = %module.path,
                    name,
                    package = %specifier,
                    "type comes from a package, using any"
                );
                return Ok(Node::Any);
            }
        }
        if self.lenient {
            tracing::debug!(
                path = %module.path,
                name,
                "unresolved type outside the sdk, using any"
            );
            return Ok(Node::Any);
        }
        Err(Error::UnresolvedTypeReference {
            name: name.to_string(),
            path: module.path.clone(),
        })
    }

    fn declaration_shape(
        &mut self,
        owner: &Rc<Module>,
        decl: LocalDecl<'_>,
    ) -> Result<DeclarationShape> {
        match decl {
            LocalDecl::Enum(e) => Ok(DeclarationShape::Enum {
                cases: enum_cases(owner, e)?,
            }),
            LocalDecl::Alias(a) => {
                let generics = type_param_names(a.type_params.as_deref());
                match a.type_ann.as_ref() {
                    ast::TsType::TsTypeLit(lit) if !is_index_only(&lit.members) => {
                        Ok(DeclarationShape::StructLiteral {
                            fields: self.members(owner, &lit.members, &generics)?,
                        })
                    }
                    other => Ok(DeclarationShape::TypeAlias {
                        alias: self.classify(owner, other, &generics)?,
                    }),
                }
            }
            LocalDecl::Interface(i) => Ok(DeclarationShape::StructLiteral {
                fields: self.interface_fields(owner, i, 0)?,
            }),
            LocalDecl::Class(c) => {
                let generics = type_param_names(c.type_params.as_deref());
                Ok(DeclarationShape::StructLiteral {
                    fields: self.class_fields(owner, c, &generics)?,
                })
            }
        }
    }

    /// Fields of an interface, inherited ones first.
    fn interface_fields(
        &mut self,
        owner: &Rc<Module>,
        iface: &ast::TsInterfaceDecl,
        depth: usize,
    ) -> Result<Vec<PropertyDefinition>> {
        let generics = type_param_names(iface.type_params.as_deref());
        let mut fields = Vec::new();
        for base in &iface.extends {
            let ast::Expr::Ident(id) = base.expr.as_ref() else {
                tracing::warn!(path = %owner.path, "skipping qualified base interface");
                continue;
            };
            let base_name = id.sym.to_string();
            let located = if depth < MAX_EXPORT_DEPTH {
                self.locate(owner, &base_name, 0)?
            } else {
                None
            };
            let Some((base_owner, local)) = located else {
                return Err(Error::UnresolvedTypeReference {
                    name: base_name,
                    path: owner.path.clone(),
                });
            };
            match base_owner.local(&local) {
                Some(LocalDecl::Interface(b)) => {
                    fields.extend(self.interface_fields(&base_owner, b, depth + 1)?);
                }
                Some(LocalDecl::Alias(a)) => {
                    if let ast::TsType::TsTypeLit(lit) = a.type_ann.as_ref() {
                        let g = type_param_names(a.type_params.as_deref());
                        fields.extend(self.members(&base_owner, &lit.members, &g)?);
                    }
                }
                Some(LocalDecl::Class(c)) => {
                    let g = type_param_names(c.type_params.as_deref());
                    fields.extend(self.class_fields(&base_owner, c, &g)?);
                }
                _ => {}
            }
        }
        let own = self.members(owner, &iface.body.body, &generics)?;
        // Redeclared members override inherited ones.
        fields.retain(|f: &PropertyDefinition| own.iter().all(|o| o.name != f.name));
        fields.extend(own);
        Ok(fields)
    }

    /// Typed instance fields of a class used as a record type.
    fn class_fields(
        &mut self,
        owner: &Rc<Module>,
        class: &ast::Class,
        generics: &[String],
    ) -> Result<Vec<PropertyDefinition>> {
        let mut fields = Vec::new();
        for member in &class.body {
            let ast::ClassMember::ClassProp(prop) = member else {
                continue;
            };
            if prop.is_static || prop.accessibility == Some(ast::Accessibility::Private) {
                continue;
            }
            let name = match &prop.key {
                ast::PropName::Ident(id) => id.sym.to_string(),
                ast::PropName::Str(s) => crate::module::str_value(s),
                _ => return Err(unsupported(owner, "computed class field names")),
            };
            let ty = self.classify_ann(owner, prop.type_ann.as_deref(), generics)?;
            fields.push(PropertyDefinition {
                name,
                optional: prop.is_optional,
                ty,
            });
        }
        Ok(fields)
    }

    // ========================================================================
    // Declaration index lookups
    // ========================================================================

    /// Finds the module and local name that `name`, as seen from `module`,
    /// refers to.
    fn locate(
        &mut self,
        module: &Rc<Module>,
        name: &str,
        depth: usize,
    ) -> Result<Option<(Rc<Module>, String)>> {
        if module.local(name).is_some() {
            return Ok(Some((module.clone(), name.to_string())));
        }
        let Some((specifier, imported)) = module.import_of(name) else {
            return Ok(None);
        };
        let Some(target) = self.load_relative(module, &specifier)? else {
            return Ok(None);
        };
        self.locate_export(&target, &imported, depth + 1)
    }

    fn locate_export(
        &mut self,
        module: &Rc<Module>,
        exported: &str,
        depth: usize,
    ) -> Result<Option<(Rc<Module>, String)>> {
        if depth > MAX_EXPORT_DEPTH {
            return Ok(None);
        }
        if module.local(exported).is_some() {
            return Ok(Some((module.clone(), exported.to_string())));
        }
        match module.export_alias(exported) {
            Some(ExportAlias::Local(orig)) => return self.locate(module, &orig, depth + 1),
            Some(ExportAlias::From { specifier, name }) => {
                return match self.load_relative(module, &specifier)? {
                    Some(target) => self.locate_export(&target, &name, depth + 1),
                    None => Ok(None),
                };
            }
            None => {}
        }
        for specifier in module.star_exports() {
            if let Some(target) = self.load_relative(module, &specifier)? {
                if let Some(found) = self.locate_export(&target, exported, depth + 1)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    /// Loads the module a relative specifier points at. Bare specifiers
    /// (packages) are not followed.
    fn load_relative(&mut self, from: &Module, specifier: &str) -> Result<Option<Rc<Module>>> {
        if !is_relative(specifier) {
            tracing::debug!(specifier, from = %from.path, "not following package import");
            return Ok(None);
        }
        let base = join_relative(&from.path, specifier);
        for candidate in candidates(&base) {
            if let Some(m) = self.modules.get(&candidate) {
                return Ok(Some(m.clone()));
            }
            if let Some(text) = self.loader.load(&candidate) {
                let m = Rc::new(Module::parse(&candidate, text)?);
                self.modules.insert(candidate, m.clone());
                return Ok(Some(m));
            }
        }
        tracing::warn!(specifier, from = %from.path, "import target not found");
        Ok(None)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

fn degrade(module: &Module, what: &str) -> Node {
    tracing::warn!(path = %module.path, "{what} has no portable representation, using any");
    Node::Any
}

fn unsupported(module: &Module, what: &str) -> Error {
    Error::UnsupportedSyntax {
        path: module.path.clone(),
        message: format!("unsupported {what}"),
    }
}

fn is_index_only(members: &[ast::TsTypeElement]) -> bool {
    matches!(members, [ast::TsTypeElement::TsIndexSignature(_)])
}

pub(crate) fn type_param_names(params: Option<&ast::TsTypeParamDecl>) -> Vec<String> {
    params
        .map(|p| p.params.iter().map(|tp| tp.name.sym.to_string()).collect())
        .unwrap_or_default()
}

fn enum_cases(module: &Module, e: &ast::TsEnumDecl) -> Result<Vec<EnumCase>> {
    let mut cases = Vec::with_capacity(e.members.len());
    let mut next: Option<f64> = Some(0.0);
    for member in &e.members {
        let name = match &member.id {
            ast::TsEnumMemberId::Ident(id) => id.sym.to_string(),
            ast::TsEnumMemberId::Str(s) => crate::module::str_value(s),
        };
        let value = match member.init.as_deref() {
            None => match next {
                Some(n) => {
                    next = Some(n + 1.0);
                    Literal::Number(format_number(n))
                }
                None => {
                    return Err(Error::UnsupportedSyntax {
                        path: module.path.clone(),
                        message: format!(
                            "enum member `{}.{name}` needs an initializer",
                            e.id.sym
                        ),
                    });
                }
            },
            Some(init) => match numeric_literal(init) {
                Some(n) => {
                    next = Some(n + 1.0);
                    Literal::Number(format_number(n))
                }
                None => match init {
                    ast::Expr::Lit(ast::Lit::Str(s)) => {
                        next = None;
                        Literal::String(crate::module::str_value(s))
                    }
                    _ => {
                        return Err(Error::UnsupportedSyntax {
                            path: module.path.clone(),
                            message: format!(
                                "enum member `{}.{name}` must be a string or number literal",
                                e.id.sym
                            ),
                        });
                    }
                },
            },
        };
        cases.push(EnumCase { name, value });
    }
    Ok(cases)
}

/// `1`, `-1`, `(2)`.
pub(crate) fn numeric_literal(expr: &ast::Expr) -> Option<f64> {
    match expr {
        ast::Expr::Lit(ast::Lit::Num(n)) => Some(n.value),
        ast::Expr::Unary(u) if u.op == ast::UnaryOp::Minus => numeric_literal(&u.arg).map(|n| -n),
        ast::Expr::Paren(p) => numeric_literal(&p.expr),
        _ => None,
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

use std::rc::Rc;

use deno_ast::swc::ast;
use deno_ast::swc::common::Spanned;
use rpcgen_types::{
    ClassDefinition, Error, ExposureKind, ExposureResolver, Literal, MethodDefinition, Node,
    ParameterDefinition, Result,
};

use crate::module::{ExportedClass, Module, str_value};
use crate::resolve::{Resolver, format_number, numeric_literal, type_param_names};

/// A method that passed the syntactic checks, with its exposure decided.
struct Candidate<'a> {
    name: String,
    method: &'a ast::ClassMethod,
    exposure: ExposureKind,
    docs: Option<String>,
}

/// Builds the class definition for the exposed class of `module`.
///
/// Exposure is decided before any type is resolved. SDK methods are resolved
/// first and strictly. The other methods only feed the summary, so their
/// unresolvable types become `any` instead of failing the file.
pub(crate) fn build_class(
    resolver: &mut Resolver<'_>,
    module: &Rc<Module>,
    exported: &ExportedClass<'_>,
    exposure: &dyn ExposureResolver,
) -> Result<ClassDefinition> {
    let class_generics = type_param_names(exported.class.type_params.as_deref());

    let mut candidates = Vec::new();
    for member in &exported.class.body {
        // Constructors, `#private` methods and fields are never exposed.
        let ast::ClassMember::Method(method) = member else {
            continue;
        };
        if method.kind != ast::MethodKind::Method {
            continue;
        }
        if method.accessibility == Some(ast::Accessibility::Private) {
            continue;
        }
        let name = match &method.key {
            ast::PropName::Ident(id) => id.sym.to_string(),
            ast::PropName::Str(s) => str_value(s),
            _ => {
                return Err(Error::UnsupportedSyntax {
                    path: module.path.clone(),
                    message: format!("method of `{}` has a computed name", exported.name),
                });
            }
        };
        if method.is_static {
            return Err(Error::UnsupportedSyntax {
                path: module.path.clone(),
                message: format!("static method `{}.{name}` cannot be exposed", exported.name),
            });
        }

        let kind = exposure.resolve(&exported.name, &name);
        tracing::debug!(class = %exported.name, method = %name, exposure = kind.as_str(), "method");
        let mut doc_positions = vec![method.span.lo];
        doc_positions.extend(method.function.decorators.first().map(|d| d.span.lo));
        doc_positions.push(method.key.span_lo());
        candidates.push(Candidate {
            name,
            method,
            exposure: kind,
            docs: module.docs_before(&doc_positions),
        });
    }

    let mut methods: Vec<Option<MethodDefinition>> = candidates.iter().map(|_| None).collect();
    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.exposure.is_sdk_callable() {
            let sig = signature(resolver, module, &exported.name, candidate, &class_generics)?;
            methods[i] = Some(sig);
        }
    }

    resolver.set_lenient(true);
    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.exposure.is_sdk_callable() {
            continue;
        }
        let sig = match signature(resolver, module, &exported.name, candidate, &class_generics) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::warn!(
                    class = %exported.name,
                    method = %candidate.name,
                    error = %e,
                    "cannot type a method outside the sdk, using any"
                );
                resolver.discard_unfinished();
                untyped(candidate)
            }
        };
        methods[i] = Some(sig);
    }
    resolver.set_lenient(false);

    Ok(ClassDefinition {
        name: exported.name.clone(),
        methods: methods.into_iter().flatten().collect(),
        docs: exported.docs.clone(),
    })
}

fn signature(
    resolver: &mut Resolver<'_>,
    module: &Rc<Module>,
    class_name: &str,
    candidate: &Candidate<'_>,
    class_generics: &[String],
) -> Result<MethodDefinition> {
    let function = &candidate.method.function;
    let mut generics = class_generics.to_vec();
    generics.extend(type_param_names(function.type_params.as_deref()));

    let mut params = Vec::with_capacity(function.params.len());
    for param in &function.params {
        params.push(build_param(
            resolver,
            module,
            class_name,
            &candidate.name,
            &param.pat,
            &generics,
        )?);
    }

    let return_type = match function.return_type.as_deref() {
        Some(ann) => resolver.classify(module, &ann.type_ann, &generics)?,
        None if function.is_async => Node::promise(Node::Any),
        None => Node::Any,
    };

    Ok(MethodDefinition {
        name: candidate.name.clone(),
        params,
        return_type,
        exposure: candidate.exposure.clone(),
        docs: candidate.docs.clone(),
    })
}

/// Fallback for a non-SDK method whose signature cannot be typed.
fn untyped(candidate: &Candidate<'_>) -> MethodDefinition {
    let function = &candidate.method.function;
    let params = function
        .params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let name = match &param.pat {
                ast::Pat::Ident(b) => b.id.sym.to_string(),
                ast::Pat::Assign(a) => match a.left.as_ref() {
                    ast::Pat::Ident(b) => b.id.sym.to_string(),
                    _ => format!("arg{i}"),
                },
                _ => format!("arg{i}"),
            };
            ParameterDefinition::new(name, Node::Any)
        })
        .collect();
    let return_type = if function.is_async {
        Node::promise(Node::Any)
    } else {
        Node::Any
    };
    MethodDefinition {
        name: candidate.name.clone(),
        params,
        return_type,
        exposure: candidate.exposure.clone(),
        docs: candidate.docs.clone(),
    }
}

fn build_param(
    resolver: &mut Resolver<'_>,
    module: &Rc<Module>,
    class_name: &str,
    method_name: &str,
    pat: &ast::Pat,
    generics: &[String],
) -> Result<ParameterDefinition> {
    match pat {
        ast::Pat::Ident(binding) => {
            let ty = resolver.classify_ann(module, binding.type_ann.as_deref(), generics)?;
            let mut param = ParameterDefinition::new(binding.id.sym.to_string(), ty);
            param.optional = binding.id.optional;
            Ok(param)
        }
        ast::Pat::Assign(assign) => {
            let ast::Pat::Ident(binding) = assign.left.as_ref() else {
                return Err(destructured(module, class_name, method_name));
            };
            let ty = resolver.classify_ann(module, binding.type_ann.as_deref(), generics)?;
            let param = ParameterDefinition::new(binding.id.sym.to_string(), ty);
            Ok(match default_literal(&assign.right) {
                Some(value) => param.with_default(value),
                None => {
                    tracing::warn!(
                        path = %module.path,
                        class = class_name,
                        method = method_name,
                        param = %param.name,
                        "default value is not a literal, treating parameter as optional"
                    );
                    param.optional()
                }
            })
        }
        _ => Err(destructured(module, class_name, method_name)),
    }
}

fn destructured(module: &Module, class_name: &str, method_name: &str) -> Error {
    Error::UnsupportedSyntax {
        path: module.path.clone(),
        message: format!("parameters of `{class_name}.{method_name}` must be plain identifiers"),
    }
}

fn default_literal(expr: &ast::Expr) -> Option<Literal> {
    if let Some(n) = numeric_literal(expr) {
        return Some(Literal::Number(format_number(n)));
    }
    match expr {
        ast::Expr::Lit(ast::Lit::Str(s)) => Some(Literal::String(str_value(s))),
        ast::Expr::Lit(ast::Lit::Bool(b)) => Some(Literal::Boolean(b.value)),
        ast::Expr::Lit(ast::Lit::Null(_)) => Some(Literal::Null),
        _ => None,
    }
}

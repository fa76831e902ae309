#![deny(unsafe_code)]

//! Front end for rpcgen: builds a [`Program`] from one TypeScript or
//! JavaScript source file.
//!
//! The exported class of the file becomes the [`ClassDefinition`]. Every
//! named type reachable from its method signatures is resolved through the
//! file's imports (relative specifiers only, loaded through a
//! [`SourceLoader`]) and collected once per `(name, declaring path)`.
//!
//! ```ignore
//! let loader = MemoryLoader::new()
//!     .with("src/greeter.ts", "export class Greeter { greet(name: string): string { return name } }");
//! let source = loader.source("src/greeter.ts").unwrap();
//! let program = rpcgen_parse::build_program(&source, &loader, &ExposureConfig::default(), None)?;
//! assert_eq!(program.class.name, "Greeter");
//! ```
//!
//! [`ClassDefinition`]: rpcgen_types::ClassDefinition

mod class;
mod loader;
mod module;
mod resolve;

use std::rc::Rc;

use rayon::prelude::*;
use rpcgen_types::{Error, ExposureResolver, Program, Result};

pub use loader::{FsLoader, MemoryLoader, SourceFile, SourceLoader};

use module::Module;
use resolve::Resolver;

/// Builds the program for `source`.
///
/// `class_name` picks one exported class; without it the first exported
/// class of the file is used.
pub fn build_program(
    source: &SourceFile,
    loader: &dyn SourceLoader,
    exposure: &dyn ExposureResolver,
    class_name: Option<&str>,
) -> Result<Program> {
    let module = Rc::new(Module::parse(&source.path, source.text.clone())?);
    let mut resolver = Resolver::new(loader);
    resolver.add_module(module.clone());

    let classes = module.exported_classes();
    let exported = match class_name {
        Some(wanted) => classes.iter().find(|c| c.name == wanted),
        None => classes.first(),
    }
    .ok_or_else(|| Error::NoExposedClassFound {
        path: source.path.clone(),
    })?;

    let class = class::build_class(&mut resolver, &module, exported, exposure)?;
    let declarations = resolver.into_declarations();

    tracing::debug!(
        path = %source.path,
        class = %class.name,
        methods = class.methods.len(),
        declarations = declarations.len(),
        "built program"
    );

    Ok(Program {
        source_language: module.language,
        source_path: module.declaring_path.clone(),
        class,
        declarations,
    })
}

/// One file of a batch build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub source: SourceFile,
    pub class_name: Option<String>,
}

impl BuildRequest {
    pub fn new(source: SourceFile) -> Self {
        Self {
            source,
            class_name: None,
        }
    }

    pub fn with_class(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }
}

/// Builds every request in parallel. Results line up with `requests`; a
/// failure in one file does not affect the others.
pub fn build_programs(
    requests: &[BuildRequest],
    loader: &dyn SourceLoader,
    exposure: &dyn ExposureResolver,
) -> Vec<Result<Program>> {
    requests
        .par_iter()
        .map(|req| build_program(&req.source, loader, exposure, req.class_name.as_deref()))
        .collect()
}

//! Decides which output file owns each declaration and what every file
//! imports.
//!
//! Only declarations reachable from an exposed method of some class in the
//! batch are planned. A declaration whose module is the source of a class
//! that emits a client file is co-located in that client file; everything
//! else goes to one model file per declaring module.

use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};

use heck::ToUpperCamelCase;
use indexmap::{IndexMap, IndexSet};
use rpcgen_types::{Declaration, Program, Result, TypeRef};

use crate::targets::Emitter;

type Key<'p> = (&'p str, &'p str);

fn key(r: &TypeRef) -> Key<'_> {
    (&r.name, &r.declaring_path)
}

/// One output file and its contents' provenance.
#[derive(Debug)]
pub struct FilePlan<'p> {
    pub path: String,
    /// The class this client file belongs to. `None` for model files.
    pub program: Option<&'p Program>,
    /// Declarations this file defines, in discovery order.
    pub declarations: Vec<&'p Declaration>,
    pub imports: Vec<Import>,
}

/// Names one file imports from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Output path of the file that owns the names.
    pub file: String,
    pub names: Vec<String>,
}

#[derive(Debug)]
pub struct Plan<'p> {
    pub files: Vec<FilePlan<'p>>,
}

/// Renames declarations whose name is declared by more than one module, so
/// that flat namespaces and named imports stay unambiguous. Each clashing
/// declaration, and every reference to it, gets its module path as a prefix:
/// `User` from `src/a` becomes `SrcAUser`. Batches without clashes come back
/// borrowed.
pub fn disambiguate(programs: &[Program]) -> Cow<'_, [Program]> {
    let mut modules: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for program in programs {
        for decl in &program.declarations {
            modules.entry(&decl.name).or_default().insert(&decl.declaring_path);
        }
    }

    let mut renames: HashMap<(String, String), String> = HashMap::new();
    for (name, paths) in modules.iter().filter(|(_, paths)| paths.len() > 1) {
        for path in paths {
            let prefix = path.replace('/', "_").to_upper_camel_case();
            tracing::debug!(%name, %path, "name declared in several modules, renaming");
            renames.insert((name.to_string(), path.to_string()), format!("{prefix}{name}"));
        }
    }
    if renames.is_empty() {
        return Cow::Borrowed(programs);
    }

    let rename = |name: &mut String, path: &str| {
        if let Some(new) = renames.get(&(name.clone(), path.to_string())) {
            name.clone_from(new);
        }
    };
    let mut programs = programs.to_vec();
    for program in &mut programs {
        for decl in &mut program.declarations {
            rename(&mut decl.name, &decl.declaring_path);
        }
        program.visit_references_mut(&mut |r| rename(&mut r.name, &r.declaring_path));
    }
    Cow::Owned(programs)
}

pub fn plan<'p>(programs: &'p [Program], emitter: &dyn Emitter) -> Result<Plan<'p>> {
    // First program to mention a declaration wins; the front end guarantees
    // identical keys carry identical shapes.
    let mut decls: IndexMap<Key<'p>, &'p Declaration> = IndexMap::new();
    for program in programs {
        for decl in &program.declarations {
            decls.entry(decl.key()).or_insert(decl);
        }
    }

    let reachable = reachable(programs, &decls);
    for k in &reachable {
        if let Some(decl) = decls.get(k) {
            decl.enum_value_kind()?;
        }
    }

    let mut files: Vec<FilePlan<'p>> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();
    let mut client_by_source: HashMap<&'p str, usize> = HashMap::new();

    for program in programs {
        if !program.class.has_exposed_methods() {
            tracing::debug!(
                class = %program.class.name,
                "no exposed methods, skipping client file"
            );
            continue;
        }
        let idx = files.len();
        files.push(FilePlan {
            path: emitter.client_path(program),
            program: Some(program),
            declarations: Vec::new(),
            imports: Vec::new(),
        });
        by_path.insert(files[idx].path.clone(), idx);
        client_by_source.entry(program.source_path.as_str()).or_insert(idx);
    }

    if !emitter.emits_declarations() {
        return Ok(Plan { files });
    }

    // Ownership
    let mut owner: HashMap<Key<'p>, usize> = HashMap::new();
    for k in &reachable {
        let Some(&decl) = decls.get(k) else {
            continue;
        };
        let idx = match client_by_source.get(decl.declaring_path.as_str()) {
            Some(&idx) => idx,
            None => {
                let path = emitter.model_path(&decl.declaring_path);
                match by_path.get(&path) {
                    Some(&idx) => idx,
                    None => {
                        let idx = files.len();
                        by_path.insert(path.clone(), idx);
                        files.push(FilePlan {
                            path,
                            program: None,
                            declarations: Vec::new(),
                            imports: Vec::new(),
                        });
                        idx
                    }
                }
            }
        };
        files[idx].declarations.push(decl);
        owner.insert(*k, idx);
    }

    // Imports
    let mut all_imports = Vec::with_capacity(files.len());
    for (idx, file) in files.iter().enumerate() {
        let mut wanted: IndexMap<usize, IndexSet<String>> = IndexMap::new();
        let mut want = |r: &TypeRef| {
            if let Some(&from) = owner.get(&key(r)) {
                if from != idx {
                    wanted.entry(from).or_default().insert(r.name.clone());
                }
            }
        };
        for decl in &file.declarations {
            for r in decl.references() {
                want(r);
            }
        }
        if let Some(program) = file.program {
            for method in program.class.exposed_methods() {
                for param in &method.params {
                    param.ty.visit_references(&mut want);
                }
                method.return_type.visit_references(&mut want);
            }
        }
        all_imports.push(
            wanted
                .into_iter()
                .map(|(from, names)| Import {
                    file: files[from].path.clone(),
                    names: names.into_iter().collect(),
                })
                .collect::<Vec<_>>(),
        );
    }
    for (file, imports) in files.iter_mut().zip(all_imports) {
        file.imports = imports;
    }

    Ok(Plan { files })
}

/// Keys of every declaration reachable from an exposed method, in
/// breadth-first discovery order.
fn reachable<'p>(
    programs: &'p [Program],
    decls: &IndexMap<Key<'p>, &'p Declaration>,
) -> IndexSet<Key<'p>> {
    let mut queue: VecDeque<Key<'p>> = VecDeque::new();
    for program in programs {
        for method in program.class.exposed_methods() {
            for param in &method.params {
                param.ty.visit_references(&mut |r| queue.push_back(key(r)));
            }
            method.return_type.visit_references(&mut |r| queue.push_back(key(r)));
        }
    }

    let mut seen = IndexSet::new();
    while let Some(k) = queue.pop_front() {
        if !seen.insert(k) {
            continue;
        }
        if let Some(decl) = decls.get(&k) {
            queue.extend(decl.references().into_iter().map(key));
        }
    }
    seen
}

/// Declarations of one program reachable from its exposed methods, for
/// targets that document types inline instead of planning model files.
pub fn reachable_declarations(program: &Program) -> Vec<&Declaration> {
    let decls: IndexMap<Key<'_>, &Declaration> =
        program.declarations.iter().map(|d| (d.key(), d)).collect();
    reachable(std::slice::from_ref(program), &decls)
        .iter()
        .filter_map(|k| decls.get(k).copied())
        .collect()
}

use std::collections::HashSet;

use rayon::prelude::*;
use rpcgen_types::{Error, Program, Result};

use crate::targets::TargetLanguage;
use crate::{GeneratedFile, Metadata, planner};

/// A language plus where its files will be written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub language: TargetLanguage,
    pub output_dir: String,
}

impl Target {
    pub fn new(language: TargetLanguage, output_dir: impl Into<String>) -> Self {
        Self {
            language,
            output_dir: output_dir.into(),
        }
    }
}

/// Result of one target. A failed target does not affect the others.
#[derive(Debug)]
pub struct TargetOutput {
    pub target: Target,
    pub result: Result<Vec<GeneratedFile>>,
}

/// Generates every file of one target. Files are sorted by path.
pub fn generate_target(
    programs: &[Program],
    language: TargetLanguage,
    metadata: &Metadata,
) -> Result<Vec<GeneratedFile>> {
    let emitter = language.emitter();
    let programs = planner::disambiguate(programs);
    let plan = planner::plan(&programs, emitter)?;

    let mut files = Vec::with_capacity(plan.files.len() + 1);
    for file in &plan.files {
        let content = match file.program {
            Some(program) => emitter.render_class(program, file, metadata)?,
            None => emitter.render_model_file(file, metadata)?,
        };
        files.push(GeneratedFile {
            path: file.path.clone(),
            content,
            owner_class: file.program.map(|p| p.class.name.clone()),
        });
    }
    files.push(GeneratedFile {
        path: emitter.runtime_path().to_string(),
        content: emitter.render_runtime(metadata)?,
        owner_class: None,
    });
    let companions = emitter.companion_files(&files);
    files.extend(companions);

    let mut seen = HashSet::new();
    for file in &files {
        if !seen.insert(file.path.as_str()) {
            return Err(Error::Render {
                target: language.to_string(),
                message: format!("two generated files claim `{}`", file.path),
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(%language, files = files.len(), "generated target");
    Ok(files)
}

/// Generates every target in parallel.
///
/// Repeated targets are collapsed, so each output directory receives a
/// single runtime file. Outputs follow the order of first appearance.
pub fn generate(
    programs: &[Program],
    targets: &[Target],
    metadata: &Metadata,
) -> Vec<TargetOutput> {
    let mut unique: Vec<Target> = Vec::with_capacity(targets.len());
    for target in targets {
        if !unique.contains(target) {
            unique.push(target.clone());
        }
    }

    unique
        .into_par_iter()
        .map(|target| {
            let result = generate_target(programs, target.language, metadata);
            if let Err(e) = &result {
                tracing::warn!(
                    language = %target.language,
                    dir = %target.output_dir,
                    error = %e,
                    "target failed"
                );
            }
            TargetOutput { target, result }
        })
        .collect()
}

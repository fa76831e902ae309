#![deny(unsafe_code)]

//! The `rpcgen` command: reads `rpcgen.yaml`, builds every configured class
//! and writes one SDK per configured target.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;
use rpcgen_codegen::{AstSummary, Target};
use rpcgen_parse::{FsLoader, SourceFile, SourceLoader, build_program};
use rpcgen_types::{Error, Program};

pub mod config;
pub mod output;

pub use config::{DEFAULT_CONFIG, ProjectConfig};

/// A loaded project: its config and the directory sources are read from.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: ProjectConfig,
    pub root: PathBuf,
}

impl Project {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config = ProjectConfig::load(config_path)?;
        let root = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self { config, root })
    }

    /// Builds every configured class in parallel. Failed files are returned
    /// alongside the programs that did build.
    pub fn build(&self) -> (Vec<Program>, Vec<anyhow::Error>) {
        let loader = FsLoader::new(&self.root);
        let results: Vec<_> = self
            .config
            .classes
            .par_iter()
            .map(|entry| -> anyhow::Result<Program> {
                let exposure = entry.exposure()?;
                let text = loader.load(&entry.path).ok_or_else(|| Error::SourceNotFound {
                    path: entry.path.clone(),
                })?;
                let source = SourceFile::new(entry.path.clone(), text);
                Ok(build_program(&source, &loader, &exposure, entry.name.as_deref())?)
            })
            .collect();

        let mut programs = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(program) => programs.push(program),
                Err(e) => {
                    tracing::error!("{e:#}");
                    failures.push(e);
                }
            }
        }
        (programs, failures)
    }
}

/// What one `generate` run did.
#[derive(Debug, Default)]
pub struct Report {
    /// Output directories that were replaced, with their file counts.
    pub written: Vec<(PathBuf, usize)>,
    /// Every file or target that failed.
    pub failures: Vec<anyhow::Error>,
}

/// Builds the project and writes each target's output directory.
///
/// `overrides` replaces the configured targets when non-empty. A failing
/// source file or target is recorded in the report; everything else is
/// still written.
pub fn generate(
    project: &Project,
    overrides: &[Target],
    summary: Option<&Path>,
) -> anyhow::Result<Report> {
    let mut report = Report::default();
    let targets = if overrides.is_empty() {
        let mut targets = Vec::new();
        for target in project.config.targets(&project.root) {
            match target {
                Ok(target) => targets.push(target),
                Err(e) => {
                    tracing::error!("{e:#}");
                    report.failures.push(e);
                }
            }
        }
        targets
    } else {
        overrides.to_vec()
    };
    if targets.is_empty() {
        tracing::warn!("no sdk targets configured");
    }

    let (programs, failures) = project.build();
    report.failures.extend(failures);

    let metadata = project.config.metadata();
    for out in rpcgen_codegen::generate(&programs, &targets, &metadata) {
        let dir = PathBuf::from(&out.target.output_dir);
        let written = out
            .result
            .map_err(anyhow::Error::from)
            .and_then(|files| output::replace_dir(&dir, &files).map(|()| files.len()))
            .with_context(|| format!("{} sdk in {}", out.target.language, dir.display()));
        match written {
            Ok(count) => {
                tracing::info!(
                    language = %out.target.language,
                    dir = %dir.display(),
                    files = count,
                    "wrote sdk"
                );
                report.written.push((dir, count));
            }
            Err(e) => {
                tracing::error!("{e:#}");
                report.failures.push(e);
            }
        }
    }

    if let Some(path) = summary {
        let json = AstSummary::from_programs(&programs).to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(report)
}

/// The summary JSON of every class that builds.
pub fn summary(project: &Project) -> anyhow::Result<String> {
    let (programs, failures) = project.build();
    if let Some(first) = failures.into_iter().next() {
        return Err(first);
    }
    Ok(AstSummary::from_programs(&programs).to_json()?)
}

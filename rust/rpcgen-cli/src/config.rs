//! `rpcgen.yaml`: the project name, the classes to expose and the SDKs to
//! generate.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use rpcgen_codegen::{Metadata, Target, TargetLanguage};
use rpcgen_types::{ClassExposure, ExposureKind};
use serde::Deserialize;

pub const DEFAULT_CONFIG: &str = "rpcgen.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
    #[serde(default)]
    pub sdk: Vec<SdkEntry>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassEntry {
    /// Source file, relative to the directory holding the config.
    pub path: String,
    /// Exported class to use when the file exports several.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: KindName,
    #[serde(default, rename = "cronString")]
    pub cron_string: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: KindName,
    #[serde(default, rename = "cronString")]
    pub cron_string: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    #[default]
    Jsonrpc,
    Http,
    Cron,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdkEntry {
    pub language: String,
    pub path: PathBuf,
}

fn exposure_kind(kind: KindName, cron: Option<&str>, what: &str) -> anyhow::Result<ExposureKind> {
    Ok(match kind {
        KindName::Jsonrpc => ExposureKind::Jsonrpc,
        KindName::Http => ExposureKind::Http,
        KindName::Cron => match cron {
            Some(schedule) => ExposureKind::Cron {
                schedule: schedule.to_string(),
            },
            None => bail!("{what} is a cron job but has no cronString"),
        },
    })
}

impl ProjectConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: ProjectConfig = serde_yaml::from_str(text).context("invalid rpcgen config")?;
        for class in &config.classes {
            class.exposure()?;
        }
        Ok(config)
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    /// Configured SDK targets, one result per `sdk` entry so that a bad entry
    /// does not hide the others. Relative output paths are taken relative to
    /// `root`.
    pub fn targets(&self, root: &Path) -> Vec<anyhow::Result<Target>> {
        self.sdk
            .iter()
            .map(|entry| {
                let language: TargetLanguage = entry
                    .language
                    .parse()
                    .with_context(|| format!("sdk entry for {}", entry.path.display()))?;
                let dir = if entry.path.is_absolute() {
                    entry.path.clone()
                } else {
                    root.join(&entry.path)
                };
                Ok(Target::new(language, dir.to_string_lossy()))
            })
            .collect()
    }
}

impl ClassEntry {
    pub fn exposure(&self) -> anyhow::Result<ClassExposure> {
        let kind = exposure_kind(self.kind, self.cron_string.as_deref(), &self.path)?;
        let mut exposure = ClassExposure {
            kind,
            ..ClassExposure::default()
        };
        for method in &self.methods {
            let what = format!("{}#{}", self.path, method.name);
            let kind = exposure_kind(method.kind, method.cron_string.as_deref(), &what)?;
            exposure.methods.insert(method.name.clone(), kind);
        }
        Ok(exposure)
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a method can be invoked once deployed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExposureKind {
    /// Callable through the generated SDK.
    #[default]
    Jsonrpc,
    /// Raw HTTP passthrough. Not part of the SDK.
    Http,
    /// Invoked on a schedule. Not part of the SDK.
    Cron {
        #[serde(rename = "cronString")]
        schedule: String,
    },
}

impl ExposureKind {
    pub fn is_sdk_callable(&self) -> bool {
        matches!(self, ExposureKind::Jsonrpc)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureKind::Jsonrpc => "jsonrpc",
            ExposureKind::Http => "http",
            ExposureKind::Cron { .. } => "cron",
        }
    }

    pub fn schedule(&self) -> Option<&str> {
        match self {
            ExposureKind::Cron { schedule } => Some(schedule),
            _ => None,
        }
    }
}

/// Decides, per `(class, method)`, how a method is exposed.
///
/// The front end calls this once per method while building a
/// [`Program`](crate::Program); the answer is frozen into the
/// [`MethodDefinition`](crate::MethodDefinition).
pub trait ExposureResolver: Sync {
    fn resolve(&self, class_name: &str, method_name: &str) -> ExposureKind;
}

impl<F> ExposureResolver for F
where
    F: Fn(&str, &str) -> ExposureKind + Sync,
{
    fn resolve(&self, class_name: &str, method_name: &str) -> ExposureKind {
        self(class_name, method_name)
    }
}

/// Exposure of one class: a class-wide kind plus per-method overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassExposure {
    #[serde(default)]
    pub kind: ExposureKind,
    #[serde(default)]
    pub methods: BTreeMap<String, ExposureKind>,
}

impl ClassExposure {
    pub fn method(&self, method_name: &str) -> ExposureKind {
        // A class that is not itself jsonrpc never contributes SDK methods.
        if !self.kind.is_sdk_callable() {
            return match self.methods.get(method_name) {
                Some(k) if !k.is_sdk_callable() => k.clone(),
                _ => self.kind.clone(),
            };
        }
        self.methods
            .get(method_name)
            .cloned()
            .unwrap_or_else(|| self.kind.clone())
    }
}

/// Exposure of every class in a project. Classes without an entry are fully
/// jsonrpc.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExposureConfig {
    #[serde(default)]
    pub classes: BTreeMap<String, ClassExposure>,
}

impl ExposureConfig {
    pub fn insert(&mut self, class_name: impl Into<String>, exposure: ClassExposure) {
        self.classes.insert(class_name.into(), exposure);
    }
}

impl ExposureResolver for ClassExposure {
    fn resolve(&self, _class_name: &str, method_name: &str) -> ExposureKind {
        self.method(method_name)
    }
}

impl ExposureResolver for ExposureConfig {
    fn resolve(&self, class_name: &str, method_name: &str) -> ExposureKind {
        self.classes
            .get(class_name)
            .map(|c| c.method(method_name))
            .unwrap_or_default()
    }
}

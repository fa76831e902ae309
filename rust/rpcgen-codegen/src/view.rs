//! View models handed to templates. Everything a template prints is already
//! a rendered string.

use serde::Serialize;

use crate::planner::Import;

#[derive(Debug, Serialize)]
pub struct ImportView {
    pub path: String,
    pub names: Vec<String>,
}

impl ImportView {
    /// Builds import views, dropping imports a target cannot express.
    pub fn from_plan(imports: &[Import], path: impl Fn(&str) -> Option<String>) -> Vec<Self> {
        imports
            .iter()
            .filter_map(|i| {
                path(&i.file).map(|p| ImportView {
                    path: p,
                    names: i.names.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct MethodView {
    pub name: String,
    pub fq_name: String,
    /// Parameter list as it appears between the parentheses.
    pub params: String,
    /// Arguments forwarded to the runtime, already joined.
    pub args: String,
    pub return_type: String,
    pub returns_void: bool,
    /// Expression producing the return value from `response`.
    pub result: String,
    /// Doc comment lines, indented for the method's position.
    pub docs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientView {
    pub class_name: String,
    /// Doc comment lines of the class.
    pub docs: Vec<String>,
    pub url: &'static str,
    pub runtime_import: String,
    pub imports: Vec<ImportView>,
    pub declarations: Vec<String>,
    pub methods: Vec<MethodView>,
    pub package: String,
}

#[derive(Debug, Serialize)]
pub struct ModelView {
    pub imports: Vec<ImportView>,
    pub declarations: Vec<String>,
    pub package: String,
}

#[derive(Debug, Serialize)]
pub struct RuntimeView {
    pub name: String,
    pub version: String,
    pub package: String,
}

use rpcgen_types::Program;
use serde::Serialize;

/// Per class, per method: name, exposure kind (with the schedule of cron
/// jobs) and parameter types. Deployment tooling reads the kinds; methods
/// outside the SDK are listed too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AstSummary {
    pub version: String,
    pub classes: Vec<ClassSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub name: String,
    pub path: String,
    pub language: &'static str,
    pub methods: Vec<MethodSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSummary {
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    pub params: Vec<ParamSummary>,
    #[serde(rename = "returnType")]
    pub return_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl AstSummary {
    pub const VERSION: &'static str = "2";

    pub fn from_programs(programs: &[Program]) -> Self {
        let classes = programs
            .iter()
            .map(|program| ClassSummary {
                name: program.class.name.clone(),
                path: program.source_path.clone(),
                language: program.source_language.as_str(),
                methods: program
                    .class
                    .methods
                    .iter()
                    .map(|m| MethodSummary {
                        name: m.name.clone(),
                        kind: m.exposure.as_str(),
                        schedule: m.exposure.schedule().map(str::to_string),
                        params: m
                            .params
                            .iter()
                            .map(|p| ParamSummary {
                                name: p.name.clone(),
                                ty: p.ty.to_string(),
                            })
                            .collect(),
                        return_type: m.return_type.to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            version: Self::VERSION.to_string(),
            classes,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

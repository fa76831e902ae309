pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the front end or a code generator can report.
///
/// All of these are terminal for the file or target they occur in. Batch
/// entry points return one `Result` per item so the rest of the batch still
/// completes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{path}: no exposed class found")]
    NoExposedClassFound { path: String },

    #[error("{path}: cannot resolve type `{name}`")]
    UnresolvedTypeReference { name: String, path: String },

    #[error("enum `{name}` mixes string and numeric values")]
    HeterogeneousEnum { name: String },

    #[error("unsupported target language `{language}`")]
    UnsupportedTargetLanguage { language: String },

    #[error("{path}: unsupported source language")]
    UnsupportedSourceLanguage { path: String },

    #[error("{path}: {message}")]
    UnsupportedSyntax { path: String, message: String },

    #[error("{path}: source file not found")]
    SourceNotFound { path: String },

    #[error("rendering {target} failed: {message}")]
    Render { target: String, message: String },
}

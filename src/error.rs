use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("failed to parse source descriptor {path}: {message}")]
    #[diagnostic(help("each descriptor must be a JSON object with `properties.id` and `properties.type`"))]
    Parse { path: Utf8PathBuf, message: String },

    #[error("source {id} has no valid polygonal geometry: {message}")]
    InvalidGeometry { id: String, message: String },

    #[error("source directory not found: {0}")]
    SourcesNotFound(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to encode catalog: {0}")]
    Serialize(String),

    #[error("{0} source(s) failed; see the run report")]
    SourceFailures(usize),
}

impl CatalogError {
    pub fn parse(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_geometry(id: &str, message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            id: id.to_string(),
            message: message.into(),
        }
    }
}

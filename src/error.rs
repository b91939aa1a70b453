use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("contents request failed: {0}")]
    Http(String),

    #[error("contents host returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("invalid JSON from {source_url}: {message}")]
    InvalidJson { source_url: String, message: String },

    #[error("failed to read bundled contents: {0}")]
    LocalBundle(String),

    #[error("every contents source failed ({attempts} attempts); last error: {last_error}")]
    #[diagnostic(help("check network access, or pass --demo-fallback to browse the demo catalog"))]
    FetchFailed { attempts: usize, last_error: String },

    #[error("contents document has no categories array")]
    SchemaMismatch,

    #[error("contents document produced an empty catalog")]
    EmptyCatalog,

    #[error("cache storage error: {0}")]
    Storage(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid contents source: {0}")]
    InvalidSource(String),

    #[error("category not found: {0}")]
    CategoryNotFound(String),
}

impl CatalogError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CatalogError::Http(_)
                | CatalogError::HttpStatus { .. }
                | CatalogError::InvalidJson { .. }
                | CatalogError::LocalBundle(_)
                | CatalogError::FetchFailed { .. }
        )
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            CatalogError::CategoryNotFound(_)
            | CatalogError::ConfigRead(_)
            | CatalogError::ConfigParse(_)
            | CatalogError::InvalidSource(_) => 2,
            error if error.is_transport() => 3,
            _ => 1,
        }
    }
}

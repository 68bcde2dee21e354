use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The relation has not been created yet (e.g. the export file is missing)
    #[error("relation '{0}' does not exist")]
    MissingRelation(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("relation '{relation}' is missing required column '{column}'")]
    MissingColumn {
        relation: &'static str,
        column: &'static str,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{relation}': {source}")]
    Csv {
        relation: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("malformed JSON in '{relation}': {source}")]
    Json {
        relation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode trend table: {0}")]
    Encoding(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

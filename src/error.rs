use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CreditScoreError {
    #[error("failed to read transaction log {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no closing `]` found in {path}; the transaction log is not a JSON array")]
    MissingArrayBoundary { path: PathBuf },

    #[error("transaction log {path} does not parse as an array of transactions")]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write score table to {path}")]
    TableWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to render score histogram to {path}: {message}")]
    PlotWrite { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CreditScoreError>;

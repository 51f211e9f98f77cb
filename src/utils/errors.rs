use crate::esa::error::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RotatorError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Credential(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("certificate file path is empty")]
    EmptyCertificatePath,

    #[error("failed to read certificate file '{path}': {source}")]
    CertificateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request signing error: {0}")]
    Signing(String),

    #[error("Certificate parsing error: {0}")]
    CertParsing(String),
}

pub type Result<T> = std::result::Result<T, RotatorError>;

// Error taxonomy for the library. The binary wraps these in `anyhow` to
// add context; library callers can match on the variants directly.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrxError {
    /// The package manager reported the install as failed.
    #[error("Installation incomplete!")]
    InstallIncomplete { errors: Vec<String> },

    /// The install went through but the response listed errors and they
    /// were not tolerated.
    #[error("Installation completed with errors!")]
    InstallCompletedWithErrors { errors: Vec<String> },

    #[error("Package upload failed: {0}")]
    UploadFailed(String),

    #[error("Unexpected upload response: {0}")]
    InvalidUploadResponse(#[from] serde_json::Error),

    #[error("Cannot read package file `{path}`")]
    PackageFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {url} failed: {status} - {body}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl CrxError {
    /// Error lines reported by the package manager, if any.
    pub fn package_errors(&self) -> &[String] {
        match self {
            Self::InstallIncomplete { errors } | Self::InstallCompletedWithErrors { errors } => {
                errors
            }
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, CrxError>;

/// Errors from the export pipeline.
use reqwest::StatusCode;
use thiserror::Error;

use crate::cookies::CookieStoreError;

/// Everything that can end an export run. All variants are fatal.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Wrong argument count or flag combination.
    #[error("{0}")]
    Usage(String),

    /// The browser cookie store could not be used.
    #[error("Cannot load browser cookies: {0}")]
    Credential(#[from] CookieStoreError),

    /// The API host could not be reached, or the request could not be built.
    #[error("Request to the transactions API failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API answered with something other than `200 OK`.
    #[error("request failed with status \"{status}\"")]
    RequestFailed {
        /// Status returned by the API.
        status: StatusCode,
    },

    /// The response body is not the expected JSON.
    #[error("Cannot decode transactions: {0}")]
    Decode(#[from] serde_json::Error),

    /// Writing the report to stdout failed.
    #[error("Cannot write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Exit code mapping for `ExportError` variants.
impl ExportError {
    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Output(_) => 1,
            Self::Usage(_) => 2,
            Self::Credential(_) => 3,
            Self::Transport(_) => 4,
            Self::RequestFailed { .. } => 5,
            Self::Decode(_) => 6,
        }
    }
}

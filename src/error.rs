//! Error types for deployctl
//!
//! Every failure ends the process with a nonzero exit code; discovery
//! failures in the delete workflow get their own code.

use thiserror::Error;

/// Exit code for transport, status and setup failures
pub const EXIT_CALL_FAILED: i32 = -1;

/// Exit code for ReplicaSet discovery failures during delete
pub const EXIT_DISCOVERY_FAILED: i32 = -2;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport, TLS or connection error
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API server answered with a status >= 300
    #[error("call failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The ReplicaSet list could not be fetched or has no items
    #[error("replicaset list unavailable: {0}")]
    ReplicaSetListUnavailable(String),

    /// No ReplicaSet carries the `app` label of the deployment
    #[error("Replicaset for {0} not found")]
    ReplicaSetNotFound(String),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ReplicaSetListUnavailable(_) | Error::ReplicaSetNotFound(_) => {
                EXIT_DISCOVERY_FAILED
            }
            _ => EXIT_CALL_FAILED,
        }
    }
}

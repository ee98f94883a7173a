//! Per-invocation configuration for deployment operations

use std::collections::BTreeMap;
use std::fmt;

use strum::Display;

/// The four operations exposed as subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Replace,
    Patch,
    Delete,
}

/// HTTP Basic credentials for the API server
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where requests go: API base URL, namespace and credentials
#[derive(Debug, Clone)]
pub struct ApiTarget {
    pub url: String,
    pub namespace: String,
    pub credentials: Credentials,
}

/// Flat deployment settings the manifest builder expands into a Deployment
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentConfig {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub image_pull_policy: String,
    pub replicas: i32,
    pub port: i32,
    pub image_pull_secret: String,
    /// Secret name -> mount path
    pub secrets: BTreeMap<String, String>,
    /// Variable name -> value
    pub env: BTreeMap<String, String>,
    pub memory_limit: Option<String>,
    pub memory_request: Option<String>,
}

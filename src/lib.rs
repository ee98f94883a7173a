//! deployctl library
//!
//! Builds Kubernetes Deployment manifests from flat settings and sends them
//! to the API server with HTTP Basic auth.

pub mod cli;
pub mod config;
pub mod error;
pub mod k8s;
pub mod models;

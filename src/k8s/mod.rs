//! Kubernetes integration module for deployctl
//!
//! - Building Deployment manifests and merge patches from flat settings
//! - Sending them to the `apps/v1` REST API
//! - Finding and removing the ReplicaSet left behind by a deleted Deployment

mod client;
mod deployment;
mod resources;

pub use client::K8sClient;
pub use deployment::DeploymentManager;
pub use resources::{
    app_labels, build_deployment, build_patch, find_replicaset_for_app, DeploymentPatch,
    ReplicaSetList, ReplicaSetSummary, APP_LABEL,
};

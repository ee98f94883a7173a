//! Deployment manager
//!
//! Glues the manifest builder to the REST client for each subcommand.

use tracing::{info, instrument, warn};

use super::client::K8sClient;
use super::resources::{build_deployment, build_patch, find_replicaset_for_app};
use crate::error::{Error, Result};
use crate::models::DeploymentConfig;

/// Runs deployment operations against one API server and namespace
pub struct DeploymentManager {
    k8s: K8sClient,
}

impl DeploymentManager {
    /// Create a new deployment manager
    pub fn new(k8s: K8sClient) -> Self {
        Self { k8s }
    }

    /// POST a new Deployment
    #[instrument(skip(self, config), fields(name = %config.name))]
    pub async fn create(&self, config: &DeploymentConfig) -> Result<()> {
        let deployment = build_deployment(config);
        self.k8s.create_deployment(&deployment).await?;
        info!("Created deployment");
        Ok(())
    }

    /// PUT over an existing Deployment
    #[instrument(skip(self, config), fields(name = %config.name))]
    pub async fn replace(&self, config: &DeploymentConfig) -> Result<()> {
        let deployment = build_deployment(config);
        self.k8s
            .replace_deployment(&config.name, &deployment)
            .await?;
        info!("Replaced deployment");
        Ok(())
    }

    /// Merge-patch the spec of an existing Deployment
    #[instrument(skip(self, config), fields(name = %config.name))]
    pub async fn patch(&self, config: &DeploymentConfig) -> Result<()> {
        let patch = build_patch(config);
        self.k8s.patch_deployment(&config.name, &patch).await?;
        info!("Patched deployment");
        Ok(())
    }

    /// Delete a Deployment and the ReplicaSet labelled with its name.
    ///
    /// The Deployment delete is best-effort. The ReplicaSet is found by
    /// scanning the namespace list for `app: <name>`; pods are left alone.
    /// Returns the name of the deleted ReplicaSet.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<String> {
        if let Err(e) = self.k8s.delete_deployment(name).await {
            warn!(error = %e, "Failed to delete deployment, continuing with replicaset");
        }

        let list = self
            .k8s
            .list_replicasets()
            .await
            .map_err(|e| match e {
                Error::ReplicaSetListUnavailable(_) => e,
                other => Error::ReplicaSetListUnavailable(other.to_string()),
            })?;

        let items = list
            .items
            .ok_or_else(|| Error::ReplicaSetListUnavailable("response has no items".into()))?;

        let replicaset = match find_replicaset_for_app(&items, name) {
            Some(rs) => rs.to_string(),
            None => {
                warn!(scanned = items.len(), "Replicaset for {} not found", name);
                return Err(Error::ReplicaSetNotFound(name.to_string()));
            }
        };

        self.k8s.delete_replicaset(&replicaset).await?;
        info!(replicaset = %replicaset, "Deleted replicaset");
        Ok(replicaset)
    }
}

//! Kubernetes REST client for deployctl
//!
//! Speaks to the `apps/v1` API with HTTP Basic auth. Each call is a single
//! request; there are no retries.

use k8s_openapi::api::apps::v1::Deployment;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use super::resources::{DeploymentPatch, ReplicaSetList};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{ApiTarget, Credentials};

const APPS_V1: &str = "/apis/apps/v1/namespaces";
const JSON: &str = "application/json";
const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// Thin wrapper around `reqwest::Client` bound to one API server and namespace
pub struct K8sClient {
    http: reqwest::Client,
    base_url: String,
    namespace: String,
    credentials: Credentials,
}

impl K8sClient {
    /// Create a client for the given target
    pub fn new(target: &ApiTarget, config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.request_timeout())
            // 3xx counts as a failed call, so never follow it
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: target.url.trim_end_matches('/').to_string(),
            namespace: target.namespace.clone(),
            credentials: target.credentials.clone(),
        })
    }

    /// Get the namespace this client operates in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// URL of a resource collection in the namespace
    pub fn collection_url(&self, resource: &str) -> String {
        format!("{}{}/{}/{}", self.base_url, APPS_V1, self.namespace, resource)
    }

    /// URL of a named resource in the namespace
    pub fn resource_url(&self, resource: &str, name: &str) -> String {
        format!("{}/{}", self.collection_url(resource), name)
    }

    /// Create a deployment
    #[instrument(
        skip(self, deployment),
        fields(name = %deployment.metadata.name.as_deref().unwrap_or("unknown"))
    )]
    pub async fn create_deployment(&self, deployment: &Deployment) -> Result<Option<Value>> {
        let url = self.collection_url("deployments");
        self.send_json(Method::POST, &url, deployment, JSON).await
    }

    /// Replace a deployment
    #[instrument(skip(self, deployment))]
    pub async fn replace_deployment(
        &self,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Option<Value>> {
        let url = self.resource_url("deployments", name);
        self.send_json(Method::PUT, &url, deployment, JSON).await
    }

    /// Merge-patch a deployment
    #[instrument(skip(self, patch))]
    pub async fn patch_deployment(
        &self,
        name: &str,
        patch: &DeploymentPatch,
    ) -> Result<Option<Value>> {
        let url = self.resource_url("deployments", name);
        self.send_json(Method::PATCH, &url, patch, MERGE_PATCH_JSON).await
    }

    /// Delete a deployment
    #[instrument(skip(self))]
    pub async fn delete_deployment(&self, name: &str) -> Result<Option<Value>> {
        let url = self.resource_url("deployments", name);
        self.send(Method::DELETE, &url, None, JSON).await
    }

    /// List replicasets in the namespace
    #[instrument(skip(self))]
    pub async fn list_replicasets(&self) -> Result<ReplicaSetList> {
        let url = self.collection_url("replicasets");
        let body = self
            .send(Method::GET, &url, None, JSON)
            .await?
            .ok_or_else(|| Error::ReplicaSetListUnavailable("empty response body".into()))?;
        Ok(serde_json::from_value(body)?)
    }

    /// Delete a replicaset
    #[instrument(skip(self))]
    pub async fn delete_replicaset(&self, name: &str) -> Result<Option<Value>> {
        let url = self.resource_url("replicasets", name);
        self.send(Method::DELETE, &url, None, JSON).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        url: &str,
        document: &T,
        content_type: &str,
    ) -> Result<Option<Value>> {
        let body = serde_json::to_vec(document)?;
        self.send(method, url, Some(body), content_type).await
    }

    /// Issue one request. Any status >= 300 is an error carrying the raw body.
    /// A successful body that is not a JSON object yields `None`.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        content_type: &str,
    ) -> Result<Option<Value>> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .header(CONTENT_TYPE, content_type);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(%method, url, error = %e, "Request failed");
            e
        })?;

        let status = response.status();
        info!(%method, url, status = %status, "response status");

        let bytes = response.bytes().await?;
        if status.as_u16() >= 300 {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            error!(%method, url, status = status.as_u16(), body = %body, "call failed");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_slice::<Value>(&bytes)
            .ok()
            .filter(Value::is_object))
    }
}

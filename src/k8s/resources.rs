//! Kubernetes resource builders for deployctl
//!
//! Expands a flat [`DeploymentConfig`] into an `apps/v1` Deployment, and
//! decodes the parts of a ReplicaSet list the delete workflow needs.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, LocalObjectReference, PodSpec, PodTemplateSpec,
    ResourceRequirements, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::DeploymentConfig;

/// Label key tying a Deployment to its pods and ReplicaSets
pub const APP_LABEL: &str = "app";

/// Merge-patch body for a Deployment: only `spec`, no type or object metadata
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPatch {
    pub spec: DeploymentSpec,
}

/// Create the `app: <name>` label set
pub fn app_labels(name: &str) -> BTreeMap<String, String> {
    [(APP_LABEL.to_string(), name.to_string())]
        .into_iter()
        .collect()
}

/// Create a full Deployment manifest, used by create and replace
pub fn build_deployment(config: &DeploymentConfig) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(config.name.clone()),
            namespace: Some(config.namespace.clone()),
            ..Default::default()
        },
        spec: Some(build_deployment_spec(config)),
        ..Default::default()
    }
}

/// Create a merge-patch document carrying the same spec as [`build_deployment`]
pub fn build_patch(config: &DeploymentConfig) -> DeploymentPatch {
    DeploymentPatch {
        spec: build_deployment_spec(config),
    }
}

fn build_deployment_spec(config: &DeploymentConfig) -> DeploymentSpec {
    let labels = app_labels(&config.name);
    let (volumes, volume_mounts) = build_secret_volumes(&config.secrets);

    let container = Container {
        name: config.name.clone(),
        image: Some(config.image.clone()),
        image_pull_policy: Some(config.image_pull_policy.clone()),
        ports: Some(vec![ContainerPort {
            container_port: config.port,
            ..Default::default()
        }]),
        volume_mounts: Some(volume_mounts),
        env: Some(build_env_vars(&config.env)),
        resources: build_resource_requirements(
            config.memory_limit.as_deref(),
            config.memory_request.as_deref(),
        ),
        ..Default::default()
    };

    DeploymentSpec {
        replicas: Some(config.replicas),
        selector: LabelSelector {
            match_labels: Some(labels.clone()),
            ..Default::default()
        },
        template: PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(labels),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![container],
                volumes: Some(volumes),
                image_pull_secrets: Some(vec![LocalObjectReference {
                    name: Some(config.image_pull_secret.clone()),
                }]),
                ..Default::default()
            }),
        },
        ..Default::default()
    }
}

/// One secret-backed volume and one read-only mount per secret entry
fn build_secret_volumes(secrets: &BTreeMap<String, String>) -> (Vec<Volume>, Vec<VolumeMount>) {
    secrets
        .iter()
        .map(|(secret, mount_path)| {
            let volume = Volume {
                name: secret.clone(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(secret.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let mount = VolumeMount {
                name: secret.clone(),
                mount_path: mount_path.clone(),
                read_only: Some(true),
                ..Default::default()
            };
            (volume, mount)
        })
        .unzip()
}

fn build_env_vars(env: &BTreeMap<String, String>) -> Vec<EnvVar> {
    env.iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..Default::default()
        })
        .collect()
}

/// Memory limit and request; empty values are left out entirely
fn build_resource_requirements(
    limit: Option<&str>,
    request: Option<&str>,
) -> Option<ResourceRequirements> {
    let memory = |value: Option<&str>| {
        value.filter(|v| !v.is_empty()).map(|v| {
            [("memory".to_string(), Quantity(v.to_string()))]
                .into_iter()
                .collect::<BTreeMap<_, _>>()
        })
    };

    let limits = memory(limit);
    let requests = memory(request);
    if limits.is_none() && requests.is_none() {
        return None;
    }

    Some(ResourceRequirements {
        limits,
        requests,
        ..Default::default()
    })
}

/// The parts of a ReplicaSet list response the delete workflow reads
#[derive(Debug, Deserialize)]
pub struct ReplicaSetList {
    #[serde(default)]
    pub items: Option<Vec<ReplicaSetSummary>>,
}

#[derive(Debug, Deserialize)]
pub struct ReplicaSetSummary {
    #[serde(default)]
    pub metadata: ObjectMeta,
}

impl ReplicaSetSummary {
    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn app_label(&self) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(APP_LABEL))
            .map(String::as_str)
    }
}

/// Name of the first ReplicaSet labelled `app: <app>`
pub fn find_replicaset_for_app<'a>(items: &'a [ReplicaSetSummary], app: &str) -> Option<&'a str> {
    items
        .iter()
        .filter(|rs| rs.app_label() == Some(app))
        .find_map(ReplicaSetSummary::name)
}

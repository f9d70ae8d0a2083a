//! Pod composition for ModelService roles
//!
//! Applies a role's container overrides (decode, prefill, endpoint picker)
//! onto a base pod template and wires the model artifact into the containers
//! that ask for it.
//!
//! # Usage
//!
//! ```text
//! let composer = PodComposer::new(ResolverConfig::default());
//! let pod = composer.compose(&svc.spec.model_artifacts, &template, &decode.pod)?;
//! // pod.containers, pod.init_containers, pod.volumes
//! ```
//!
//! # Model volume wiring
//!
//! The artifact is resolved only when at least one override container sets
//! `mountModelVolume`. Each such container (after merging) gets the model
//! volume mount and the resolved env vars, merged by name. The pod gets the
//! model volume, replacing any base volume of the same name.

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::{Container, PodSpec, Volume};
use tracing::debug;

use modelservice_artifacts::{ArtifactLocator, ArtifactResolver, ResolvedMount, ResolverConfig};
use modelservice_common::crd::{ContainerSpec, ModelArtifacts, ModelServicePodSpec};
use modelservice_common::{Error, Result};
use modelservice_merge::{container_merge, merge_env_vars, KeyedMerge};

/// Containers and volumes of a composed pod
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposedPod {
    /// Merged main containers
    pub containers: Vec<Container>,
    /// Merged init containers
    pub init_containers: Vec<Container>,
    /// Pod volumes, including the model volume when any container mounts it
    pub volumes: Vec<Volume>,
}

impl ComposedPod {
    /// Write the composed lists into a copy of `base`
    pub fn into_pod_spec(self, base: &PodSpec) -> PodSpec {
        PodSpec {
            containers: self.containers,
            init_containers: non_empty(self.init_containers),
            volumes: non_empty(self.volumes),
            ..base.clone()
        }
    }
}

/// Composes role pods from a base template and role overrides
pub struct PodComposer {
    resolver: ArtifactResolver,
    containers: KeyedMerge<Container>,
}

impl Default for PodComposer {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl PodComposer {
    /// Create a composer resolving artifacts with `config`
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            resolver: ArtifactResolver::new(config),
            containers: container_merge(),
        }
    }

    /// Compose the pod for one role
    pub fn compose(
        &self,
        artifacts: &ModelArtifacts,
        base: &PodSpec,
        role: &ModelServicePodSpec,
    ) -> Result<ComposedPod> {
        let containers = self.containers.merge(
            base.containers.clone(),
            role.containers.iter().map(container_override).collect(),
        )?;
        let init_containers = self.containers.merge(
            base.init_containers.clone().unwrap_or_default(),
            role.init_containers.iter().map(container_override).collect(),
        )?;

        let mut pod = ComposedPod {
            containers,
            init_containers,
            volumes: base.volumes.clone().unwrap_or_default(),
        };

        let mounting = mount_targets(&role.containers);
        let init_mounting = mount_targets(&role.init_containers);
        if mounting.is_empty() && init_mounting.is_empty() {
            debug!(
                containers = pod.containers.len(),
                init_containers = pod.init_containers.len(),
                "composed pod without model volume"
            );
            return Ok(pod);
        }

        let mount = self.resolver.resolve(&ArtifactLocator::from(artifacts))?;
        for container in pod.containers.iter_mut() {
            if mounting.contains(container.name.as_str()) {
                attach_model(container, &mount)?;
            }
        }
        for container in pod.init_containers.iter_mut() {
            if init_mounting.contains(container.name.as_str()) {
                attach_model(container, &mount)?;
            }
        }

        pod.volumes.retain(|v| v.name != mount.volume_name);
        pod.volumes.push(mount.volume());

        debug!(
            uri = %artifacts.uri,
            model_path = %mount.model_path,
            mounted = mounting.len() + init_mounting.len(),
            "composed pod with model volume"
        );
        Ok(pod)
    }
}

/// Compose a role pod with the default resolver configuration
pub fn compose_pod(
    artifacts: &ModelArtifacts,
    base: &PodSpec,
    role: &ModelServicePodSpec,
) -> Result<ComposedPod> {
    PodComposer::default().compose(artifacts, base, role)
}

/// Convert a ModelService container override into a Kubernetes container
///
/// Empty lists become `None` so they read as "not overridden".
pub fn container_override(spec: &ContainerSpec) -> Container {
    Container {
        name: spec.name.clone(),
        image: spec.image.clone(),
        command: non_empty(spec.command.clone()),
        args: non_empty(spec.args.clone()),
        env: non_empty(spec.env.clone()),
        env_from: non_empty(spec.env_from.clone()),
        resources: spec.resources.clone(),
        ..Default::default()
    }
}

fn mount_targets(overrides: &[ContainerSpec]) -> BTreeSet<&str> {
    overrides
        .iter()
        .filter(|c| c.mount_model_volume)
        .map(|c| c.name.as_str())
        .collect()
}

fn attach_model(container: &mut Container, mount: &ResolvedMount) -> Result<()> {
    let mounts = container.volume_mounts.get_or_insert_with(Vec::new);
    mounts.retain(|m| m.name != mount.volume_name);
    mounts.push(mount.volume_mount());

    let env = merge_env_vars(container.env.take().unwrap_or_default(), mount.k8s_env_vars())
        .map_err(|e| Error::merge_conflict(container.name.clone(), e))?;
    container.env = non_empty(env);
    Ok(())
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::EnvVar;

    fn artifacts(uri: &str) -> ModelArtifacts {
        ModelArtifacts {
            uri: uri.to_string(),
            auth_secret_name: None,
            size: None,
        }
    }

    fn spec(name: &str, mount: bool) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            image: None,
            command: vec![],
            args: vec![],
            env: vec![],
            env_from: vec![],
            resources: None,
            mount_model_volume: mount,
        }
    }

    fn template() -> PodSpec {
        PodSpec {
            containers: vec![Container {
                name: "vllm".to_string(),
                image: Some("vllm/vllm-openai:v0.8".to_string()),
                args: Some(vec!["--port=8000".to_string()]),
                ..Default::default()
            }],
            service_account_name: Some("decode".to_string()),
            ..Default::default()
        }
    }

    fn role(containers: Vec<ContainerSpec>) -> ModelServicePodSpec {
        ModelServicePodSpec {
            replicas: Some(1),
            containers,
            init_containers: vec![],
        }
    }

    #[test]
    fn container_override_drops_empty_lists() {
        let container = container_override(&ContainerSpec {
            args: vec!["--tp=2".to_string()],
            ..spec("vllm", true)
        });
        assert_eq!(container.name, "vllm");
        assert_eq!(container.args, Some(vec!["--tp=2".to_string()]));
        assert_eq!(container.command, None);
        assert_eq!(container.env, None);
        assert_eq!(container.env_from, None);
    }

    #[test]
    fn no_mount_request_skips_resolution() {
        // An unknown scheme would fail resolution; it must not be touched.
        let pod = compose_pod(
            &artifacts("s3://bucket/model"),
            &template(),
            &role(vec![spec("vllm", false)]),
        )
        .unwrap();
        assert!(pod.volumes.is_empty());
        assert_eq!(pod.containers[0].volume_mounts, None);
    }

    #[test]
    fn mount_request_resolves_artifact() {
        let err = compose_pod(
            &artifacts("s3://bucket/model"),
            &template(),
            &role(vec![spec("vllm", true)]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidLocator { .. }));
    }

    #[test]
    fn pvc_mount_is_wired_into_requesting_container() {
        let pod = compose_pod(
            &artifacts("pvc://models/granite"),
            &template(),
            &role(vec![
                ContainerSpec {
                    args: vec!["--model=/model-cache/granite".to_string()],
                    ..spec("vllm", true)
                },
                spec("sidecar", false),
            ]),
        )
        .unwrap();

        assert_eq!(pod.containers.len(), 2);
        let vllm = &pod.containers[0];
        assert_eq!(
            vllm.args,
            Some(vec![
                "--model=/model-cache/granite".to_string(),
                "--port=8000".to_string(),
            ])
        );
        let mounts = vllm.volume_mounts.as_ref().unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].name, "model-storage");
        assert_eq!(mounts[0].read_only, Some(true));
        assert_eq!(vllm.env, None);

        assert_eq!(pod.containers[1].name, "sidecar");
        assert_eq!(pod.containers[1].volume_mounts, None);

        assert_eq!(pod.volumes.len(), 1);
        assert_eq!(pod.volumes[0].name, "model-storage");
    }

    #[test]
    fn hf_env_merges_with_container_env() {
        let pod = compose_pod(
            &ModelArtifacts {
                auth_secret_name: Some("hf-token".to_string()),
                ..artifacts("hf://ibm-granite/granite-3.3-2b-instruct")
            },
            &template(),
            &role(vec![ContainerSpec {
                env: vec![EnvVar {
                    name: "VLLM_LOGGING_LEVEL".to_string(),
                    value: Some("DEBUG".to_string()),
                    ..Default::default()
                }],
                ..spec("vllm", true)
            }]),
        )
        .unwrap();

        let names: Vec<&str> = pod.containers[0]
            .env
            .iter()
            .flatten()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["VLLM_LOGGING_LEVEL", "HF_TOKEN", "HF_HOME"]);
    }

    #[test]
    fn model_volume_replaces_same_named_base_volume() {
        let mut base = template();
        base.volumes = Some(vec![
            Volume {
                name: "model-storage".to_string(),
                ..Default::default()
            },
            Volume {
                name: "shm".to_string(),
                ..Default::default()
            },
        ]);

        let pod = compose_pod(
            &artifacts("pvc://models"),
            &base,
            &role(vec![spec("vllm", true)]),
        )
        .unwrap();

        let names: Vec<&str> = pod.volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["shm", "model-storage"]);
        assert!(pod.volumes[1].persistent_volume_claim.is_some());
    }

    #[test]
    fn init_containers_merge_and_mount_independently() {
        let mut base = template();
        base.init_containers = Some(vec![Container {
            name: "fetch".to_string(),
            command: Some(vec!["old".to_string()]),
            ..Default::default()
        }]);
        let role = ModelServicePodSpec {
            replicas: None,
            containers: vec![],
            init_containers: vec![ContainerSpec {
                command: vec!["download".to_string()],
                ..spec("fetch", true)
            }],
        };

        let pod = compose_pod(&artifacts("pvc://models"), &base, &role).unwrap();
        assert_eq!(pod.init_containers[0].command, Some(vec!["download".to_string()]));
        assert!(pod.init_containers[0].volume_mounts.is_some());
        assert_eq!(pod.containers[0].volume_mounts, None);
    }

    #[test]
    fn composed_pod_keeps_template_fields() {
        let base = template();
        let pod_spec = compose_pod(&artifacts("pvc://models"), &base, &role(vec![spec("vllm", true)]))
            .unwrap()
            .into_pod_spec(&base);
        assert_eq!(pod_spec.service_account_name.as_deref(), Some("decode"));
        assert_eq!(pod_spec.init_containers, None);
        assert_eq!(pod_spec.volumes.map(|v| v.len()), Some(1));
    }
}

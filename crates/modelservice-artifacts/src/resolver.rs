//! Model storage mount resolution
//!
//! Turns a classified [`ArtifactLocator`] into the volume, mount, and
//! environment a serving container needs to read the model:
//! - `pvc://` mounts the named claim read-only, no env
//! - `hf://` mounts a size-bounded emptyDir the runtime downloads into, plus
//!   `HF_TOKEN` (from the auth Secret) and `HF_HOME` (the mount root)
//! - `oci://` is recognized but not mountable: its in-container path is not
//!   defined yet, so it fails with `UnsupportedSource` instead of guessing
//!
//! Resolution is a pure function of the locator and configuration.

use k8s_openapi::api::core::v1::{
    EmptyDirVolumeSource, EnvVar, EnvVarSource, PersistentVolumeClaimVolumeSource, SecretKeySelector, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use modelservice_common::{Error, Result};
use tracing::debug;

use crate::config::ResolverConfig;
use crate::uri::{
    parse_hugging_face_parts, parse_image_reference, parse_persistent_volume_parts,
    ArtifactLocator, SourceKind,
};

// =============================================================================
// ResolvedMount
// =============================================================================

/// Backing storage of the model volume
#[derive(Clone, Debug, PartialEq)]
pub enum VolumeSource {
    /// An existing PersistentVolumeClaim
    ClaimReference {
        /// Claim name
        claim_name: String,
    },
    /// Scratch space, unbounded when `size_limit` is `None`
    EmptyDirWithQuota {
        /// Size bound for the scratch volume
        size_limit: Option<Quantity>,
    },
}

/// Value of a resolved environment variable
#[derive(Clone, Debug, PartialEq)]
pub enum EnvValue {
    /// Literal value
    Literal(String),
    /// A key inside a Secret
    SecretKey {
        /// Secret name
        secret_name: String,
        /// Key within the Secret
        key: String,
    },
}

/// A resolved environment variable
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEnvVar {
    /// Variable name
    pub name: String,
    /// Variable value
    pub value: EnvValue,
}

impl ResolvedEnvVar {
    /// Convert to a Kubernetes EnvVar
    pub fn to_k8s(&self) -> EnvVar {
        match &self.value {
            EnvValue::Literal(value) => EnvVar {
                name: self.name.clone(),
                value: Some(value.clone()),
                value_from: None,
            },
            EnvValue::SecretKey { secret_name, key } => EnvVar {
                name: self.name.clone(),
                value: None,
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: secret_name.clone(),
                        key: key.clone(),
                        optional: None,
                    }),
                    ..Default::default()
                }),
            },
        }
    }
}

/// Everything a container needs to access a model artifact
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMount {
    /// Volume name, shared by the pod volume and container mount
    pub volume_name: String,
    /// Where the volume is mounted in the container
    pub mount_path: String,
    /// Whether the mount is read-only
    pub read_only: bool,
    /// Backing storage
    pub volume_source: VolumeSource,
    /// Environment variables, in the order they must be set
    pub env_vars: Vec<ResolvedEnvVar>,
    /// Path of the model inside the container
    pub model_path: String,
}

impl ResolvedMount {
    /// Pod volume for this mount
    pub fn volume(&self) -> Volume {
        let mut volume = Volume {
            name: self.volume_name.clone(),
            ..Default::default()
        };
        match &self.volume_source {
            VolumeSource::ClaimReference { claim_name } => {
                volume.persistent_volume_claim = Some(PersistentVolumeClaimVolumeSource {
                    claim_name: claim_name.clone(),
                    read_only: Some(self.read_only),
                });
            }
            VolumeSource::EmptyDirWithQuota { size_limit } => {
                volume.empty_dir = Some(EmptyDirVolumeSource {
                    medium: None,
                    size_limit: size_limit.clone(),
                });
            }
        }
        volume
    }

    /// Container volume mount for this mount
    pub fn volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.volume_name.clone(),
            mount_path: self.mount_path.clone(),
            read_only: Some(self.read_only),
            ..Default::default()
        }
    }

    /// Environment variables as Kubernetes EnvVars, order preserved
    pub fn k8s_env_vars(&self) -> Vec<EnvVar> {
        self.env_vars.iter().map(ResolvedEnvVar::to_k8s).collect()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves artifact locators into storage mounts
#[derive(Clone, Debug, Default)]
pub struct ArtifactResolver {
    config: ResolverConfig,
}

impl ArtifactResolver {
    /// Create a resolver with the given configuration
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// The resolver's configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Path at which the model is visible inside a container
    ///
    /// For `hf://` this is always the storage root: the runtime treats it as
    /// its cache directory, not as a literal model path.
    pub fn mounted_path(&self, locator: &ArtifactLocator) -> Result<String> {
        match locator.kind() {
            SourceKind::PersistentVolume => {
                let parts = parse_persistent_volume_parts(locator)?;
                Ok(join_path(&self.config.storage_root, &parts.sub_path()))
            }
            SourceKind::HuggingFace => Ok(self.config.storage_root.clone()),
            SourceKind::ImageVolume => Err(unsupported_image(locator)),
            SourceKind::Unknown => Err(unknown_scheme(locator)),
        }
    }

    /// Resolve the volume, mount, and env vars for a locator
    pub fn resolve(&self, locator: &ArtifactLocator) -> Result<ResolvedMount> {
        let kind = locator.kind();
        let resolved = match kind {
            SourceKind::PersistentVolume => self.resolve_persistent_volume(locator)?,
            SourceKind::HuggingFace => self.resolve_hugging_face(locator)?,
            SourceKind::ImageVolume => return Err(unsupported_image(locator)),
            SourceKind::Unknown => return Err(unknown_scheme(locator)),
        };

        debug!(
            uri = %locator.uri,
            kind = %kind,
            mount_path = %resolved.mount_path,
            read_only = resolved.read_only,
            env_vars = resolved.env_vars.len(),
            "resolved model artifact mount"
        );
        Ok(resolved)
    }

    fn resolve_persistent_volume(&self, locator: &ArtifactLocator) -> Result<ResolvedMount> {
        let parts = parse_persistent_volume_parts(locator)?;
        Ok(ResolvedMount {
            volume_name: self.config.volume_name.clone(),
            mount_path: self.config.storage_root.clone(),
            read_only: true,
            volume_source: VolumeSource::ClaimReference {
                claim_name: parts.claim_name.clone(),
            },
            env_vars: Vec::new(),
            model_path: join_path(&self.config.storage_root, &parts.sub_path()),
        })
    }

    fn resolve_hugging_face(&self, locator: &ArtifactLocator) -> Result<ResolvedMount> {
        parse_hugging_face_parts(locator)?;

        let mut env_vars = Vec::with_capacity(2);
        if let Some(secret) = &locator.auth_secret_ref {
            env_vars.push(ResolvedEnvVar {
                name: self.config.token_env.clone(),
                value: EnvValue::SecretKey {
                    secret_name: secret.clone(),
                    key: self.config.token_env.clone(),
                },
            });
        }
        env_vars.push(ResolvedEnvVar {
            name: self.config.home_env.clone(),
            value: EnvValue::Literal(self.config.storage_root.clone()),
        });

        Ok(ResolvedMount {
            volume_name: self.config.volume_name.clone(),
            mount_path: self.config.storage_root.clone(),
            read_only: false,
            volume_source: VolumeSource::EmptyDirWithQuota {
                size_limit: locator.size_quota.clone(),
            },
            env_vars,
            model_path: self.config.storage_root.clone(),
        })
    }
}

/// Resolve a locator with the default configuration
pub fn resolve_mount(locator: &ArtifactLocator) -> Result<ResolvedMount> {
    ArtifactResolver::default().resolve(locator)
}

/// Mounted model path for a locator with the default configuration
pub fn mounted_path(locator: &ArtifactLocator) -> Result<String> {
    ArtifactResolver::default().mounted_path(locator)
}

fn join_path(root: &str, sub_path: &str) -> String {
    if sub_path.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root.trim_end_matches('/'), sub_path)
    }
}

/// `oci://` locators are validated, then refused
fn unsupported_image(locator: &ArtifactLocator) -> Error {
    if let Err(err) = parse_image_reference(locator) {
        return err;
    }
    Error::unsupported_source(SourceKind::ImageVolume.to_string(), &locator.uri)
}

fn unknown_scheme(locator: &ArtifactLocator) -> Error {
    Error::invalid_locator(&locator.uri, "URI must start with pvc://, hf://, or oci://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENV_HF_HOME, ENV_HF_TOKEN, MODEL_STORAGE_ROOT, MODEL_STORAGE_VOLUME_NAME};

    fn hf_locator() -> ArtifactLocator {
        ArtifactLocator::new("hf://ibm-granite/granite-3.3-2b-instruct")
            .with_auth_secret("auth-secret-key")
            .with_size_quota("5Gi")
    }

    // =========================================================================
    // Mounted path
    // =========================================================================

    #[test]
    fn mounted_path_for_pvc_appends_sub_path() {
        let path = mounted_path(&ArtifactLocator::new("pvc://my-pvc/path/to/model")).unwrap();
        assert_eq!(path, format!("{MODEL_STORAGE_ROOT}/path/to/model"));
    }

    #[test]
    fn mounted_path_for_pvc_without_sub_path_is_root() {
        assert_eq!(
            mounted_path(&ArtifactLocator::new("pvc://my-pvc")).unwrap(),
            MODEL_STORAGE_ROOT
        );
        assert_eq!(
            mounted_path(&ArtifactLocator::new("pvc://my-pvc/")).unwrap(),
            MODEL_STORAGE_ROOT
        );
    }

    #[test]
    fn mounted_path_for_hf_is_always_root() {
        for uri in ["hf://repo-id/model-id", "hf://wrong", "hf://a/b/c"] {
            assert_eq!(
                mounted_path(&ArtifactLocator::new(uri)).unwrap(),
                MODEL_STORAGE_ROOT
            );
        }
    }

    #[test]
    fn mounted_path_fails_for_unknown_schemes() {
        for uri in ["", "random://", "PVC://", "HF://", "OCI://", "s3://bucket/model"] {
            let err = mounted_path(&ArtifactLocator::new(uri)).unwrap_err();
            assert!(matches!(err, Error::InvalidLocator { .. }), "uri {uri:?}");
        }
    }

    #[test]
    fn mounted_path_follows_configured_root() {
        let resolver = ArtifactResolver::new(ResolverConfig::default().with_storage_root("/models/"));
        assert_eq!(
            resolver
                .mounted_path(&ArtifactLocator::new("pvc://my-pvc/granite"))
                .unwrap(),
            "/models/granite"
        );
    }

    #[test]
    fn mounted_path_for_oci_is_unsupported() {
        for uri in ["oci://repo:v1", "oci://repo:v1::models/granite"] {
            let err = mounted_path(&ArtifactLocator::new(uri)).unwrap_err();
            assert!(matches!(err, Error::UnsupportedSource { .. }), "uri {uri:?}");
            assert_eq!(err.uri(), Some(uri));
        }
    }

    // =========================================================================
    // PersistentVolume resolution
    // =========================================================================

    #[test]
    fn pvc_resolves_to_read_only_claim_without_env() {
        let resolved = resolve_mount(&ArtifactLocator::new("pvc://my-pvc/path/to/model")).unwrap();

        assert_eq!(resolved.volume_name, MODEL_STORAGE_VOLUME_NAME);
        assert_eq!(resolved.mount_path, MODEL_STORAGE_ROOT);
        assert!(resolved.read_only);
        assert!(resolved.env_vars.is_empty());
        assert_eq!(
            resolved.volume_source,
            VolumeSource::ClaimReference {
                claim_name: "my-pvc".to_string()
            }
        );
        assert_eq!(resolved.model_path, "/model-cache/path/to/model");

        let volume = resolved.volume();
        let claim = volume.persistent_volume_claim.unwrap();
        assert_eq!(claim.claim_name, "my-pvc");
        assert_eq!(claim.read_only, Some(true));

        let mount = resolved.volume_mount();
        assert_eq!(mount.name, MODEL_STORAGE_VOLUME_NAME);
        assert_eq!(mount.mount_path, MODEL_STORAGE_ROOT);
        assert_eq!(mount.read_only, Some(true));
    }

    // =========================================================================
    // HuggingFace resolution
    // =========================================================================

    #[test]
    fn hf_resolves_to_writable_scratch_with_token_then_home() {
        let resolved = resolve_mount(&hf_locator()).unwrap();

        assert!(!resolved.read_only);
        assert_eq!(resolved.mount_path, MODEL_STORAGE_ROOT);

        let env = resolved.k8s_env_vars();
        assert_eq!(env.len(), 2);

        assert_eq!(env[0].name, ENV_HF_TOKEN);
        let secret = env[0]
            .value_from
            .as_ref()
            .and_then(|v| v.secret_key_ref.as_ref())
            .unwrap();
        assert_eq!(secret.name, "auth-secret-key");
        assert_eq!(secret.key, ENV_HF_TOKEN);

        assert_eq!(env[1].name, ENV_HF_HOME);
        assert_eq!(env[1].value.as_deref(), Some(resolved.mount_path.as_str()));
    }

    #[test]
    fn hf_scratch_quota_serializes_back() {
        let volume = resolve_mount(&hf_locator()).unwrap().volume();
        let empty_dir = volume.empty_dir.as_ref().unwrap();
        assert_eq!(empty_dir.size_limit, Some(Quantity("5Gi".to_string())));

        let value = serde_json::to_value(&volume).unwrap();
        assert_eq!(value["emptyDir"]["sizeLimit"], "5Gi");
        assert_eq!(value["name"], MODEL_STORAGE_VOLUME_NAME);
    }

    #[test]
    fn hf_without_quota_is_unbounded() {
        let locator = ArtifactLocator::new("hf://org/model").with_auth_secret("s");
        let resolved = resolve_mount(&locator).unwrap();
        assert_eq!(
            resolved.volume_source,
            VolumeSource::EmptyDirWithQuota { size_limit: None }
        );
        assert_eq!(resolved.volume().empty_dir.unwrap().size_limit, None);
    }

    #[test]
    fn hf_without_auth_secret_only_sets_home() {
        let resolved = resolve_mount(&ArtifactLocator::new("hf://org/model")).unwrap();
        assert_eq!(resolved.env_vars.len(), 1);
        assert_eq!(resolved.env_vars[0].name, ENV_HF_HOME);
    }

    #[test]
    fn malformed_hf_uri_fails_resolution() {
        let err = resolve_mount(&ArtifactLocator::new("hf://wrong")).unwrap_err();
        assert!(matches!(err, Error::InvalidLocator { .. }));
    }

    // =========================================================================
    // ImageVolume resolution
    // =========================================================================

    #[test]
    fn oci_never_resolves_to_a_mount() {
        for uri in ["oci://registry.io/granite:v1", "oci://registry.io/granite:v1::weights"] {
            let err = resolve_mount(&ArtifactLocator::new(uri)).unwrap_err();
            assert!(matches!(err, Error::UnsupportedSource { ref kind, .. } if kind == "ImageVolume"));
            assert_eq!(err.uri(), Some(uri));
        }
    }

    #[test]
    fn empty_oci_reference_is_invalid() {
        for uri in ["oci://", "oci://::weights"] {
            let err = resolve_mount(&ArtifactLocator::new(uri)).unwrap_err();
            assert!(matches!(err, Error::InvalidLocator { .. }), "uri {uri:?}");
        }
    }

    // =========================================================================
    // Unknown
    // =========================================================================

    #[test]
    fn unknown_scheme_never_resolves() {
        for uri in ["", "nothing://my-pvc/path", "PVC://my-pvc", "s3://bucket/model"] {
            let err = resolve_mount(&ArtifactLocator::new(uri)).unwrap_err();
            assert!(matches!(err, Error::InvalidLocator { .. }), "uri {uri:?}");
        }
    }

    #[test]
    fn resolution_is_repeatable() {
        let locator = hf_locator();
        assert_eq!(resolve_mount(&locator).unwrap(), resolve_mount(&locator).unwrap());
    }
}

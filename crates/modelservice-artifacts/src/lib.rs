//! Model artifact locators for modelservice
//!
//! Classifies model URIs (`pvc://`, `hf://`, `oci://`) and resolves them into
//! the volume, mount, and environment a serving container needs. Pure
//! computation crate: no API calls, no controller logic.

#![deny(missing_docs)]

pub mod config;
mod resolver;
mod uri;

pub use config::ResolverConfig;
pub use resolver::{
    mounted_path, resolve_mount, ArtifactResolver, EnvValue, ResolvedEnvVar, ResolvedMount,
    VolumeSource,
};
pub use uri::{
    classify, is_hugging_face_uri, is_image_volume_uri, is_persistent_volume_uri,
    parse_hugging_face_parts, parse_image_reference, parse_persistent_volume_parts,
    ArtifactLocator, HuggingFaceParts, PersistentVolumeParts, SourceKind, HF_URI_PREFIX,
    OCI_URI_PREFIX, PVC_URI_PREFIX,
};

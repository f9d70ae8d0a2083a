//! Model artifact URI classification
//!
//! Classification is case-sensitive and decided by prefix alone, so every
//! string maps to exactly one [`SourceKind`]. Parsing the structured parts of
//! a URI is separate and can fail for a URI that classified successfully.

use std::fmt;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use modelservice_common::crd::ModelArtifacts;
use modelservice_common::{Error, Result};

/// URI prefix for pre-populated PersistentVolumeClaims
pub const PVC_URI_PREFIX: &str = "pvc://";

/// URI prefix for HuggingFace Hub models
pub const HF_URI_PREFIX: &str = "hf://";

/// URI prefix for models packaged as OCI images
pub const OCI_URI_PREFIX: &str = "oci://";

/// Separates the image reference from a path inside the image in `oci://` URIs
pub const OCI_PATH_SEPARATOR: &str = "::";

/// Where a model artifact is stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// `pvc://`: an existing PersistentVolumeClaim
    PersistentVolume,
    /// `hf://`: downloaded from HuggingFace into a scratch volume
    HuggingFace,
    /// `oci://`: an OCI image; recognized but not yet mountable
    ImageVolume,
    /// Anything else
    Unknown,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersistentVolume => write!(f, "PersistentVolume"),
            Self::HuggingFace => write!(f, "HuggingFace"),
            Self::ImageVolume => write!(f, "ImageVolume"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Classify a model URI by its scheme prefix
pub fn classify(uri: &str) -> SourceKind {
    if uri.starts_with(PVC_URI_PREFIX) {
        SourceKind::PersistentVolume
    } else if uri.starts_with(HF_URI_PREFIX) {
        SourceKind::HuggingFace
    } else if uri.starts_with(OCI_URI_PREFIX) {
        SourceKind::ImageVolume
    } else {
        SourceKind::Unknown
    }
}

/// Whether `uri` refers to a PersistentVolumeClaim
pub fn is_persistent_volume_uri(uri: &str) -> bool {
    classify(uri) == SourceKind::PersistentVolume
}

/// Whether `uri` refers to a HuggingFace model
pub fn is_hugging_face_uri(uri: &str) -> bool {
    classify(uri) == SourceKind::HuggingFace
}

/// Whether `uri` refers to an OCI image
pub fn is_image_volume_uri(uri: &str) -> bool {
    classify(uri) == SourceKind::ImageVolume
}

// =============================================================================
// ArtifactLocator
// =============================================================================

/// A model artifact URI with its optional credentials and size
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArtifactLocator {
    /// Model URI; its prefix determines the source kind
    pub uri: String,
    /// Name of the Secret holding the download token
    pub auth_secret_ref: Option<String>,
    /// Size bound for the download volume
    pub size_quota: Option<Quantity>,
}

impl ArtifactLocator {
    /// Create a locator with no credentials or size quota
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Set the auth secret reference
    pub fn with_auth_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth_secret_ref = Some(secret.into());
        self
    }

    /// Set the size quota
    pub fn with_size_quota(mut self, quota: impl Into<String>) -> Self {
        self.size_quota = Some(Quantity(quota.into()));
        self
    }

    /// Source kind of this locator's URI
    pub fn kind(&self) -> SourceKind {
        classify(&self.uri)
    }
}

impl From<&ModelArtifacts> for ArtifactLocator {
    fn from(artifacts: &ModelArtifacts) -> Self {
        Self {
            uri: artifacts.uri.clone(),
            auth_secret_ref: artifacts.auth_secret_name.clone(),
            size_quota: artifacts.size.clone(),
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parts of a `pvc://<claim>/<path...>` URI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistentVolumeParts {
    /// PersistentVolumeClaim name
    pub claim_name: String,
    /// Path segments inside the claim, in order
    pub path_segments: Vec<String>,
}

impl PersistentVolumeParts {
    /// Path inside the claim, segments joined with `/` (empty if none)
    pub fn sub_path(&self) -> String {
        self.path_segments.join("/")
    }
}

/// Split a `pvc://` URI into claim name and path segments
pub fn parse_persistent_volume_parts(locator: &ArtifactLocator) -> Result<PersistentVolumeParts> {
    let rest = locator
        .uri
        .strip_prefix(PVC_URI_PREFIX)
        .ok_or_else(|| Error::invalid_locator(&locator.uri, "expected a pvc:// URI"))?;

    let mut segments = rest.split('/');
    let claim_name = segments.next().unwrap_or_default();
    if claim_name.is_empty() {
        return Err(Error::invalid_locator(
            &locator.uri,
            "missing PersistentVolumeClaim name",
        ));
    }

    Ok(PersistentVolumeParts {
        claim_name: claim_name.to_string(),
        path_segments: segments.map(str::to_string).collect(),
    })
}

/// Parts of an `hf://<repo>/<model>` URI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuggingFaceParts {
    /// Repository (organization) id, e.g. `ibm-granite`
    pub repo_id: String,
    /// Model id within the repository
    pub model_id: String,
}

/// Split an `hf://` URI into repository and model ids
///
/// The split happens on the first `/`, so any further segments stay part of
/// the model id.
pub fn parse_hugging_face_parts(locator: &ArtifactLocator) -> Result<HuggingFaceParts> {
    let rest = locator
        .uri
        .strip_prefix(HF_URI_PREFIX)
        .ok_or_else(|| Error::invalid_locator(&locator.uri, "expected an hf:// URI"))?;

    match rest.split_once('/') {
        Some((repo, model)) if !repo.is_empty() && !model.is_empty() => Ok(HuggingFaceParts {
            repo_id: repo.to_string(),
            model_id: model.to_string(),
        }),
        _ => Err(Error::invalid_locator(
            &locator.uri,
            "expected hf://<repo>/<model>",
        )),
    }
}

/// Extract the image reference from an `oci://<image>[::<path>]` URI
pub fn parse_image_reference(locator: &ArtifactLocator) -> Result<String> {
    let rest = locator
        .uri
        .strip_prefix(OCI_URI_PREFIX)
        .ok_or_else(|| Error::invalid_locator(&locator.uri, "expected an oci:// URI"))?;

    let reference = rest
        .split_once(OCI_PATH_SEPARATOR)
        .map_or(rest, |(image, _)| image);
    if reference.is_empty() {
        return Err(Error::invalid_locator(
            &locator.uri,
            "missing image reference",
        ));
    }
    Ok(reference.to_string())
}

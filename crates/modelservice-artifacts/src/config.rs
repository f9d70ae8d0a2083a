//! Resolver configuration
//!
//! The naming conventions consumed by serving runtimes (volume name, mount
//! root, HuggingFace env var names) are fixed defaults; callers embedding the
//! resolver elsewhere can override them per field.

/// Volume name of the model storage mount
pub const MODEL_STORAGE_VOLUME_NAME: &str = "model-storage";

/// Mount path root of the model storage volume
pub const MODEL_STORAGE_ROOT: &str = "/model-cache";

/// Env var holding the HuggingFace token; also the key inside the auth Secret
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";

/// Env var pointing the HuggingFace client at the download cache
pub const ENV_HF_HOME: &str = "HF_HOME";

/// Naming conventions and mount locations used by the resolver
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Root path where the model storage volume is mounted
    pub storage_root: String,
    /// Name of the model storage volume
    pub volume_name: String,
    /// Env var name (and Secret key) for the download token
    pub token_env: String,
    /// Env var name for the download cache directory
    pub home_env: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            storage_root: MODEL_STORAGE_ROOT.to_string(),
            volume_name: MODEL_STORAGE_VOLUME_NAME.to_string(),
            token_env: ENV_HF_TOKEN.to_string(),
            home_env: ENV_HF_HOME.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Mount the model storage volume at `root`
    pub fn with_storage_root(mut self, root: impl Into<String>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// Name the model storage volume `name`
    pub fn with_volume_name(mut self, name: impl Into<String>) -> Self {
        self.volume_name = name.into();
        self
    }
}

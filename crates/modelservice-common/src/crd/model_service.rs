//! ModelService CRD types
//!
//! Defines `ModelService`: a model-serving workload split into prefill,
//! decode, and endpoint-picker roles. Each role carries container override
//! fragments that are layered on top of a shared base configuration, and the
//! spec names a single model artifact that containers can opt into mounting.

use k8s_openapi::api::core::v1::{EnvFromSource, EnvVar, ObjectReference, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// CRD
// =============================================================================

/// Model serving workload composed from a base configuration and overrides
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "llm-d.ai",
    version = "v1alpha1",
    kind = "ModelService",
    plural = "modelservices",
    shortname = "msvc",
    namespaced,
    status = "ModelServiceStatus",
    printcolumn = r#"{"name":"Decouple Scaling","type":"boolean","jsonPath":".spec.decoupleScaling"}"#,
    printcolumn = r#"{"name":"Prefill READY","type":"string","jsonPath":".status.prefillReady"}"#,
    printcolumn = r#"{"name":"Prefill AVAIL","type":"integer","jsonPath":".status.prefillAvailable"}"#,
    printcolumn = r#"{"name":"Decode READY","type":"string","jsonPath":".status.decodeReady"}"#,
    printcolumn = r#"{"name":"Decode AVAIL","type":"integer","jsonPath":".status.decodeAvailable"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ModelServiceSpec {
    /// Base configuration the role overrides are layered on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_config_map_ref: Option<ObjectReference>,

    /// Routing configuration for the served model
    pub routing: Routing,

    /// Source of the model artifacts
    pub model_artifacts: ModelArtifacts,

    /// When true, replica counts are owned by an external autoscaler
    #[serde(default)]
    pub decouple_scaling: bool,

    /// Decode role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode: Option<PDSpec>,

    /// Prefill role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefill: Option<PDSpec>,

    /// Endpoint picker role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_picker: Option<ModelServicePodSpec>,
}

// =============================================================================
// Artifacts and routing
// =============================================================================

/// Where the model comes from
///
/// Supported URI forms:
/// - `pvc://<claim>/<path/in/claim>`: pre-populated PersistentVolumeClaim
/// - `hf://<repo>/<model>`: downloaded from HuggingFace at startup
/// - `oci://<image-ref>[::<path/in/image>]`: model packaged as an image
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifacts {
    /// Model URI
    pub uri: String,

    /// Name of the Secret holding `HF_TOKEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_secret_name: Option<String>,

    /// Size of the model on disk; bounds the download volume for `hf://`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Quantity>,
}

/// Routing information for the served model
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Routing {
    /// Model name as it appears in the `model` field of inference requests
    pub model_name: String,

    /// Named ports usable from base configuration and overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<Port>,
}

impl Routing {
    /// Look up a named port
    pub fn port(&self, name: &str) -> Option<i32> {
        self.ports.iter().find(|p| p.name == name).map(|p| p.port)
    }
}

/// A named port
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Port {
    /// Name that can be used in place of the port number
    pub name: String,
    /// Port number
    pub port: i32,
}

// =============================================================================
// Roles
// =============================================================================

/// Pod-level overrides for one role
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelServicePodSpec {
    /// Desired replica count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Container overrides, matched to base containers by name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerSpec>,

    /// Init container overrides, matched to base init containers by name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<ContainerSpec>,
}

/// Prefill/decode role spec
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PDSpec {
    /// Pod-level overrides
    #[serde(flatten)]
    pub pod: ModelServicePodSpec,

    /// Parallelism overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<Parallelism>,

    /// Accelerators this role may be scheduled on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_types: Option<AcceleratorTypes>,
}

/// Parallelism settings for the serving runtime
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Parallelism {
    /// Tensor parallelism, also the number of GPUs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tensor: Option<i32>,
}

/// Accelerator selection by node label
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorTypes {
    /// Node label key identifying the accelerator (e.g. `nvidia.com/gpu.product`)
    #[serde(default)]
    pub label_key: String,
    /// Accepted label values (e.g. `A100`, `H100`)
    #[serde(default)]
    pub label_values: Vec<String>,
}

// =============================================================================
// Container override
// =============================================================================

/// Container-level override fragment
///
/// Fields left empty keep the base configuration's value. `command` replaces
/// the base command entirely, `args` are placed before the base args, and
/// `env` entries merge with base entries by name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    /// Container name, matched against base container names
    pub name: String,

    /// Image override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Entrypoint override
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Arguments placed ahead of the base arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables merged by name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    /// Environment sources, appended after the base sources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<EnvFromSource>,

    /// Compute resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Mount the model artifact volume and its environment into this container
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mount_model_volume: bool,
}

// =============================================================================
// Status
// =============================================================================

/// Observed state of a ModelService, written by the reconciler
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelServiceStatus {
    /// Prefill deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefill_deployment_ref: Option<String>,
    /// Decode deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_deployment_ref: Option<String>,
    /// Endpoint picker deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epp_deployment_ref: Option<String>,
    /// InferenceModel name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_model_ref: Option<String>,
    /// InferencePool name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_pool_ref: Option<String>,
    /// Service account used by prefill/decode pods
    #[serde(
        default,
        rename = "prefillServiceAccountRef",
        skip_serializing_if = "Option::is_none"
    )]
    pub pd_service_account_ref: Option<String>,
    /// Service account used by decode pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_service_account_ref: Option<String>,
    /// RoleBinding for the endpoint picker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epp_role_binding: Option<String>,
    /// ConfigMaps rendered for prefill and decode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_map_names: Vec<String>,

    /// Prefill READY column (e.g. "1/1")
    #[serde(default)]
    pub prefill_ready: String,
    /// Prefill available replicas
    #[serde(default)]
    pub prefill_available: i32,
    /// Decode READY column
    #[serde(default)]
    pub decode_ready: String,
    /// Decode available replicas
    #[serde(default)]
    pub decode_available: i32,
    /// Endpoint picker READY column
    #[serde(default)]
    pub epp_ready: String,
    /// Endpoint picker available replicas
    #[serde(default)]
    pub epp_available: i32,

    /// Deployment conditions prefixed by origin (e.g. `PrefillAvailable`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

// =============================================================================
// Tests
// =============================================================================

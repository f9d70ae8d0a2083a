//! Gateway API route references
//!
//! Routing configuration for a served model is composed from a base fragment
//! and an override fragment. Both parent references (which Gateway a route
//! attaches to) and backend references (where the route sends traffic) are
//! lists keyed by `name`.

use serde::{Deserialize, Serialize};

/// API group for Gateway API resources
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";

/// Parent reference for route resources
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParentRef {
    /// API group (gateway.networking.k8s.io)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Resource kind (Gateway)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Gateway name
    pub name: String,
    /// Gateway namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Listener section name to bind to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    /// Listener port to bind to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ParentRef {
    /// Create a reference to a specific listener on a Gateway
    pub fn gateway(name: &str, namespace: &str, section_name: impl Into<String>) -> Self {
        Self {
            group: Some(GATEWAY_API_GROUP.to_string()),
            kind: Some("Gateway".to_string()),
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
            section_name: Some(section_name.into()),
            port: None,
        }
    }
}

/// Backend reference
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendRef {
    /// API group (empty for core Services, `inference.networking.x-k8s.io` for pools)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Resource kind (Service, InferencePool)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Backend name
    pub name: String,
    /// Backend namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Backend port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Relative traffic weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

impl BackendRef {
    /// Create a reference to a Service port
    pub fn service(name: &str, port: u16) -> Self {
        Self {
            kind: Some("Service".to_string()),
            name: name.to_string(),
            port: Some(port),
            ..Default::default()
        }
    }
}

//! Common types for modelservice: CRDs, Gateway API references, and errors

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod network;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group of the ModelService CRD
pub const MODELSERVICE_API_GROUP: &str = "llm-d.ai";

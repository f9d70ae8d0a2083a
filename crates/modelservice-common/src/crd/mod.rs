//! Custom Resource Definitions for modelservice
//!
//! This module contains the CRD consumed by the reconciler; the composition
//! crates read its spec and never write to it.

mod model_service;

pub use model_service::{
    AcceleratorTypes, ContainerSpec, ModelArtifacts, ModelService, ModelServicePodSpec,
    ModelServiceSpec, ModelServiceStatus, PDSpec, Parallelism, Port, Routing,
};

//! ModelService - workload composition core for model serving
//!
//! Turns a ModelService role into the pod content a serving runtime needs:
//! base/override container merges and model artifact mounts. Everything here
//! is a pure function of its inputs; the reconciliation loop that reads
//! ModelService objects and applies the results lives elsewhere.
//!
//! # Crates
//!
//! - [`common`] - ModelService CRD, Gateway API references, errors, telemetry
//! - [`artifacts`] - Model URI classification and mount resolution
//! - [`merge`] - Structured base/override merge engine and keyed-list strategies
//! - [`compose`] - Pod composition combining both

#![deny(missing_docs)]

pub mod compose;

pub use modelservice_artifacts as artifacts;
pub use modelservice_common as common;
pub use modelservice_merge as merge;

pub use compose::{compose_pod, container_override, ComposedPod, PodComposer};
pub use modelservice_common::{Error, Result};

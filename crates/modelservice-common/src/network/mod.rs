//! Network resource types
//!
//! - [`gateway_api`] - Gateway API route references merged when composing routing fragments

pub mod gateway_api;

pub use gateway_api::{BackendRef, ParentRef};

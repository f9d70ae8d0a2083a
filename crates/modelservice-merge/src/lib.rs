//! Base/override merging for modelservice workloads
//!
//! A [`MergeEngine`] merges an override fragment into a base fragment using
//! an immutable [`Transformers`] rule set. Lists of named entities go through
//! [`KeyedMerge`] so entries are correlated by name instead of appended.
//!
//! Ready-made strategies cover containers ([`merge_containers`]), environment
//! variables ([`merge_env_vars`]) and route references ([`merge_parent_refs`],
//! [`merge_backend_refs`]).

#![deny(missing_docs)]

mod container;
mod engine;
mod keyed;
mod routing;
mod transformer;

pub use container::{
    container_merge, container_transformers, env_var_merge, merge_containers, merge_env_vars,
};
pub use engine::MergeEngine;
pub use keyed::{ElementMergeFn, KeyedMerge};
pub use routing::{backend_ref_merge, merge_backend_refs, merge_parent_refs, parent_ref_merge};
pub use transformer::{KeyedList, StringListPrepend, Transformer, Transformers, TransformersBuilder};

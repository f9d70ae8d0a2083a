//! Route reference list merge
//!
//! Gateway and backend references from a base routing fragment and an
//! override fragment are correlated by `name`; matched references merge with
//! the engine's default policy.

use modelservice_common::network::{BackendRef, ParentRef};
use modelservice_common::Result;

use crate::engine::MergeEngine;
use crate::keyed::KeyedMerge;

fn parent_ref_name(r: &ParentRef) -> &str {
    &r.name
}

fn backend_ref_name(r: &BackendRef) -> &str {
    &r.name
}

/// Keyed merge for parent references, keyed on `name`
pub fn parent_ref_merge() -> KeyedMerge<ParentRef> {
    let engine = MergeEngine::default();
    KeyedMerge::new(parent_ref_name, move |base: &mut ParentRef, overlay| {
        engine.merge_into(base, overlay)
    })
}

/// Keyed merge for backend references, keyed on `name`
pub fn backend_ref_merge() -> KeyedMerge<BackendRef> {
    let engine = MergeEngine::default();
    KeyedMerge::new(backend_ref_name, move |base: &mut BackendRef, overlay| {
        engine.merge_into(base, overlay)
    })
}

/// Merge an override parent reference list into a base list
pub fn merge_parent_refs(base: &[ParentRef], overlay: &[ParentRef]) -> Result<Vec<ParentRef>> {
    parent_ref_merge().merge(base.to_vec(), overlay.to_vec())
}

/// Merge an override backend reference list into a base list
pub fn merge_backend_refs(base: &[BackendRef], overlay: &[BackendRef]) -> Result<Vec<BackendRef>> {
    backend_ref_merge().merge(base.to_vec(), overlay.to_vec())
}

//! Container list merge
//!
//! Containers are correlated by name. Within a matched pair:
//! - a non-empty override `command` replaces the base command outright
//! - `args` (and any other list of strings) are prepended, override first
//! - `env` merges by variable name, override value wins
//! - everything else follows the engine's override-wins-if-present policy

use k8s_openapi::api::core::v1::{Container, EnvVar};
use tracing::debug;

use modelservice_common::Result;

use crate::engine::MergeEngine;
use crate::keyed::KeyedMerge;
use crate::transformer::{KeyedList, StringListPrepend, Transformers};

fn container_name(c: &Container) -> &str {
    &c.name
}

fn env_var_name(e: &EnvVar) -> &str {
    &e.name
}

/// Leaf merge for one environment variable
///
/// `value` and `valueFrom` are alternative sources for the same variable, so
/// an override carrying either one replaces both.
fn merge_env_var(base: &mut EnvVar, overlay: EnvVar) -> Result<()> {
    let has_value = overlay.value.as_deref().is_some_and(|v| !v.is_empty());
    if has_value || overlay.value_from.is_some() {
        base.value = overlay.value;
        base.value_from = overlay.value_from;
    }
    Ok(())
}

/// Keyed merge for environment variables, keyed on `name`
pub fn env_var_merge() -> KeyedMerge<EnvVar> {
    KeyedMerge::new(env_var_name, merge_env_var)
}

/// Merge two environment variable lists by name
pub fn merge_env_vars(base: Vec<EnvVar>, overlay: Vec<EnvVar>) -> Result<Vec<EnvVar>> {
    env_var_merge().merge(base, overlay)
}

/// Field transformers applied inside a single container
pub fn container_transformers() -> Transformers {
    Transformers::builder()
        .with(KeyedList::new("env", env_var_merge()))
        .with(StringListPrepend)
        .build()
}

/// Keyed merge for containers, keyed on `name`
///
/// The returned strategy owns its engine and can be shared across threads.
pub fn container_merge() -> KeyedMerge<Container> {
    let engine = MergeEngine::new(container_transformers());
    KeyedMerge::new(container_name, move |base: &mut Container, overlay: Container| {
        if overlay.command.as_ref().is_some_and(|c| !c.is_empty()) {
            base.command = None;
        }
        engine.merge_into(base, overlay)
    })
}

/// Merge an override container list into a base container list
pub fn merge_containers(base: &[Container], overlay: &[Container]) -> Result<Vec<Container>> {
    let merged = container_merge().merge(base.to_vec(), overlay.to_vec())?;
    debug!(
        base = base.len(),
        overlay = overlay.len(),
        merged = merged.len(),
        "merged container lists"
    );
    Ok(merged)
}

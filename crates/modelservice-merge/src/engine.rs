//! Structured merge engine
//!
//! Merges an override tree into a base tree. Values are handled in their
//! serialized (JSON) form so one engine serves every API type; typed entry
//! points convert in and out.
//!
//! Default policy, for fields no transformer claims:
//! - an absent override (null, empty string, `false`, zero, empty list or
//!   empty map) leaves the base untouched
//! - maps merge recursively, field by field
//! - lists append override after base
//! - anything else is replaced by the override

use std::any::type_name;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use modelservice_common::{Error, Result};

use crate::transformer::Transformers;

/// Merge engine bound to an immutable transformer set
///
/// Holds no mutable state; one engine can be shared across threads.
#[derive(Debug, Default)]
pub struct MergeEngine {
    transformers: Transformers,
}

impl MergeEngine {
    /// Create an engine that consults `transformers` before the default policy
    pub fn new(transformers: Transformers) -> Self {
        Self { transformers }
    }

    /// The transformer set this engine dispatches to
    pub fn transformers(&self) -> &Transformers {
        &self.transformers
    }

    /// Merge `overlay` into a copy of `base`
    pub fn merge<T>(&self, base: &T, overlay: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut merged = to_tree(base)?;
        self.merge_values(&mut merged, to_tree(overlay)?)?;
        serde_json::from_value(merged)
            .map_err(|e| Error::serialization_for_kind(type_name::<T>(), e.to_string()))
    }

    /// Merge `overlay` into `base` in place
    pub fn merge_into<T>(&self, base: &mut T, overlay: T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        *base = self.merge(base, &overlay)?;
        Ok(())
    }

    /// Merge two serialized trees
    pub fn merge_values(&self, base: &mut Value, overlay: Value) -> Result<()> {
        self.merge_field(None, base, overlay)
    }

    fn merge_field(&self, field: Option<&str>, base: &mut Value, overlay: Value) -> Result<()> {
        if is_absent(&overlay) {
            return Ok(());
        }

        if let Some(name) = field {
            if let Some(transformer) = self.transformers.find(name, base, &overlay) {
                trace!(field = name, transformer = transformer.name(), "dispatching field merge");
                return transformer.transform(name, base, overlay);
            }
        }

        match (base, overlay) {
            (Value::Object(existing), Value::Object(incoming)) => {
                self.merge_object(existing, incoming)
            }
            (Value::Array(existing), Value::Array(incoming)) => {
                existing.extend(incoming);
                Ok(())
            }
            (slot, incoming) => {
                *slot = incoming;
                Ok(())
            }
        }
    }

    fn merge_object(&self, base: &mut Map<String, Value>, overlay: Map<String, Value>) -> Result<()> {
        for (key, value) in overlay {
            if is_absent(&value) {
                continue;
            }
            let slot = base.entry(key.clone()).or_insert(Value::Null);
            self.merge_field(Some(&key), slot, value)?;
        }
        Ok(())
    }
}

fn to_tree<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| Error::serialization_for_kind(type_name::<T>(), e.to_string()))
}

/// Whether an override value counts as "not set"
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

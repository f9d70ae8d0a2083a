//! Merge transformers
//!
//! A transformer replaces the engine's default merge policy for the fields it
//! claims. [`Transformers`] is the ordered rule set handed to the engine: for
//! each field, the first transformer that claims it wins.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use modelservice_common::{Error, Result};

use crate::keyed::KeyedMerge;

/// Field-level merge rule
pub trait Transformer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this transformer handles `field` given both sides' values
    ///
    /// `base` is `Value::Null` when the field is absent from the base tree.
    fn claims(&self, field: &str, base: &Value, overlay: &Value) -> bool;

    /// Merge `overlay` into `base` for a claimed field
    fn transform(&self, field: &str, base: &mut Value, overlay: Value) -> Result<()>;
}

// =============================================================================
// Transformers (ordered composite)
// =============================================================================

/// Immutable, ordered set of transformers
#[derive(Default)]
pub struct Transformers {
    rules: Vec<Box<dyn Transformer>>,
}

impl fmt::Debug for Transformers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl Transformers {
    /// Start building a rule set
    pub fn builder() -> TransformersBuilder {
        TransformersBuilder::default()
    }

    /// First transformer claiming `field`, in registration order
    pub fn find(&self, field: &str, base: &Value, overlay: &Value) -> Option<&dyn Transformer> {
        self.rules
            .iter()
            .find(|r| r.claims(field, base, overlay))
            .map(|r| r.as_ref())
    }

    /// Number of registered transformers
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no transformers are registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder for [`Transformers`]
#[derive(Default)]
pub struct TransformersBuilder {
    rules: Vec<Box<dyn Transformer>>,
}

impl TransformersBuilder {
    /// Register a transformer after the ones already registered
    pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.rules.push(Box::new(transformer));
        self
    }

    /// Freeze the rule set
    pub fn build(self) -> Transformers {
        Transformers { rules: self.rules }
    }
}

// =============================================================================
// String list prepend
// =============================================================================

/// Places override strings before base strings in any list of strings
///
/// Override arguments are read first by left-to-right consumers while base
/// arguments remain as trailing fallbacks. An empty override is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringListPrepend;

fn is_string_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

impl Transformer for StringListPrepend {
    fn name(&self) -> &'static str {
        "string-list-prepend"
    }

    fn claims(&self, _field: &str, base: &Value, overlay: &Value) -> bool {
        is_string_list(overlay) && (base.is_null() || is_string_list(base))
    }

    fn transform(&self, _field: &str, base: &mut Value, overlay: Value) -> Result<()> {
        // Only arrays are claimed; anything else leaves the base untouched
        let Value::Array(mut merged) = overlay else {
            return Ok(());
        };
        if merged.is_empty() {
            return Ok(());
        }
        if let Value::Array(existing) = base.take() {
            merged.extend(existing);
        }
        *base = Value::Array(merged);
        Ok(())
    }
}

// =============================================================================
// Keyed list
// =============================================================================

/// Merges the list under one field name with a [`KeyedMerge`]
pub struct KeyedList<T> {
    field: &'static str,
    merge: KeyedMerge<T>,
}

impl<T> KeyedList<T> {
    /// Apply `merge` to the list stored under `field`
    pub fn new(field: &'static str, merge: KeyedMerge<T>) -> Self {
        Self { field, merge }
    }
}

impl<T> Transformer for KeyedList<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn name(&self) -> &'static str {
        self.field
    }

    fn claims(&self, field: &str, base: &Value, overlay: &Value) -> bool {
        if field != self.field {
            return false;
        }
        assert!(
            overlay.is_array() && (base.is_null() || base.is_array()),
            "keyed-list transformer for '{}' registered on a non-list field",
            self.field
        );
        true
    }

    fn transform(&self, _field: &str, base: &mut Value, overlay: Value) -> Result<()> {
        let kind = std::any::type_name::<T>();
        let base_items: Vec<T> = match base.take() {
            Value::Null => Vec::new(),
            existing => serde_json::from_value(existing)
                .map_err(|e| Error::serialization_for_kind(kind, e.to_string()))?,
        };
        let overlay_items: Vec<T> = serde_json::from_value(overlay)
            .map_err(|e| Error::serialization_for_kind(kind, e.to_string()))?;

        let merged = self.merge.merge(base_items, overlay_items)?;
        *base = serde_json::to_value(merged)
            .map_err(|e| Error::serialization_for_kind(kind, e.to_string()))?;
        Ok(())
    }
}

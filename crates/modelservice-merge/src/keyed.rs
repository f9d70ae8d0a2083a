//! Keyed-list merge
//!
//! Merges two lists of records by a string key: matched pairs are merged in
//! place with an element-level merge function, override elements with no
//! match are appended in their original order, and unmatched base elements
//! are left untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use modelservice_common::{Error, Result};
use tracing::trace;

/// Element-level merge: merges `overlay` into `base` in place
pub type ElementMergeFn<T> = Box<dyn Fn(&mut T, T) -> Result<()> + Send + Sync>;

/// Merge strategy for lists of `T` correlated by a key field
pub struct KeyedMerge<T> {
    key: fn(&T) -> &str,
    merge: ElementMergeFn<T>,
}

impl<T> fmt::Debug for KeyedMerge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedMerge")
            .field("element", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T> KeyedMerge<T> {
    /// Create a keyed merge from a key accessor and an element merge function
    pub fn new(
        key: fn(&T) -> &str,
        merge: impl Fn(&mut T, T) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            merge: Box::new(merge),
        }
    }

    /// Merge key of an element
    pub fn key_of<'a>(&self, item: &'a T) -> &'a str {
        (self.key)(item)
    }

    /// Merge `overlay` into `base`
    ///
    /// Keys must be unique within each list; a repeated key fails with
    /// [`Error::DuplicateMergeKey`] before anything is merged.
    pub fn merge(&self, mut base: Vec<T>, overlay: Vec<T>) -> Result<Vec<T>> {
        self.ensure_unique(&base)?;
        self.ensure_unique(&overlay)?;

        let index: BTreeMap<String, usize> = overlay
            .iter()
            .enumerate()
            .map(|(i, item)| (self.key_of(item).to_string(), i))
            .collect();
        let mut pending: Vec<Option<T>> = overlay.into_iter().map(Some).collect();

        for item in base.iter_mut() {
            let Some(&i) = index.get(self.key_of(item)) else {
                continue;
            };
            let Some(src) = pending[i].take() else {
                continue;
            };
            let key = self.key_of(item).to_string();
            trace!(key = %key, "merging keyed element");
            (self.merge)(item, src).map_err(|e| Error::merge_conflict(key, e))?;
        }

        base.extend(pending.into_iter().flatten());
        Ok(base)
    }

    fn ensure_unique(&self, items: &[T]) -> Result<()> {
        let mut seen = BTreeSet::new();
        for item in items {
            let key = self.key_of(item);
            if !seen.insert(key) {
                return Err(Error::duplicate_merge_key(key));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Entry {
        name: String,
        value: u32,
    }

    fn entry(name: &str, value: u32) -> Entry {
        Entry {
            name: name.to_string(),
            value,
        }
    }

    fn entry_name(e: &Entry) -> &str {
        &e.name
    }

    fn overwrite() -> KeyedMerge<Entry> {
        KeyedMerge::new(entry_name, |base: &mut Entry, overlay: Entry| {
            base.value = overlay.value;
            Ok(())
        })
    }

    #[test]
    fn matched_elements_merge_in_place_and_unmatched_append() {
        let merged = overwrite()
            .merge(
                vec![entry("a", 1), entry("b", 2), entry("c", 3)],
                vec![entry("d", 40), entry("b", 20), entry("e", 50)],
            )
            .unwrap();

        assert_eq!(
            merged,
            vec![
                entry("a", 1),
                entry("b", 20),
                entry("c", 3),
                entry("d", 40),
                entry("e", 50),
            ]
        );
    }

    #[test]
    fn empty_overlay_keeps_base() {
        let base = vec![entry("a", 1), entry("b", 2)];
        assert_eq!(overwrite().merge(base.clone(), vec![]).unwrap(), base);
    }

    #[test]
    fn empty_base_takes_overlay() {
        let overlay = vec![entry("x", 9), entry("y", 8)];
        assert_eq!(overwrite().merge(vec![], overlay.clone()).unwrap(), overlay);
    }

    #[test]
    fn element_failure_is_wrapped_with_key() {
        let failing = KeyedMerge::new(entry_name, |_: &mut Entry, _: Entry| {
            Err(Error::serialization("incompatible"))
        });

        let err = failing
            .merge(vec![entry("a", 1)], vec![entry("a", 2)])
            .unwrap_err();
        assert_eq!(err.merge_key(), Some("a"));
        assert!(matches!(err, Error::MergeConflict { .. }));
    }

    #[test]
    fn element_function_not_called_without_match() {
        let failing = KeyedMerge::new(entry_name, |_: &mut Entry, _: Entry| {
            Err(Error::serialization("should not run"))
        });
        let merged = failing
            .merge(vec![entry("a", 1)], vec![entry("b", 2)])
            .unwrap();
        assert_eq!(merged, vec![entry("a", 1), entry("b", 2)]);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = overwrite()
            .merge(vec![entry("a", 1), entry("a", 2)], vec![])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateMergeKey { ref key } if key == "a"));

        let err = overwrite()
            .merge(vec![entry("a", 1)], vec![entry("b", 1), entry("b", 2)])
            .unwrap_err();
        assert_eq!(err.merge_key(), Some("b"));
    }

    #[test]
    fn keys_compare_exactly() {
        let merged = overwrite()
            .merge(vec![entry("Name", 1)], vec![entry("name", 2)])
            .unwrap();
        assert_eq!(merged.len(), 2);
    }
}

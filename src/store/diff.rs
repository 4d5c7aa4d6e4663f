//! Change detection for the store's two write modes.

use super::EqualsFn;
use crate::value::PropertyMap;

/// One key whose value differs between the old and new state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeyChange<V> {
    pub key: String,
    pub new: Option<V>,
    pub old: Option<V>,
}

/// Changes produced by merging `partial` over `current`, in `partial` order.
pub(crate) fn merged<V: Clone>(
    current: &PropertyMap<V>,
    partial: &PropertyMap<V>,
    equals: EqualsFn<V>,
) -> Vec<KeyChange<V>> {
    partial
        .iter()
        .filter_map(|(key, new)| match current.get(key) {
            Some(old) if equals(old, new) => None,
            old => Some(KeyChange {
                key: key.clone(),
                new: Some(new.clone()),
                old: old.cloned(),
            }),
        })
        .collect()
}

/// Changes produced by replacing `current` with `next`.
///
/// Keys already held come first in their current order (updated or removed),
/// followed by keys only present in `next`, in `next` order.
pub(crate) fn replaced<V: Clone>(
    current: &PropertyMap<V>,
    next: &PropertyMap<V>,
    equals: EqualsFn<V>,
) -> Vec<KeyChange<V>> {
    let existing = current.iter().filter_map(|(key, old)| match next.get(key) {
        Some(new) if equals(old, new) => None,
        new => Some(KeyChange {
            key: key.clone(),
            new: new.cloned(),
            old: Some(old.clone()),
        }),
    });
    let added = next
        .iter()
        .filter(|(key, _)| !current.contains_key(*key))
        .map(|(key, new)| KeyChange {
            key: key.clone(),
            new: Some(new.clone()),
            old: None,
        });
    existing.chain(added).collect()
}

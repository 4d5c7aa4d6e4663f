use super::diff::{self, KeyChange};
use crate::emitter::{dispatch, Event, Notification, Registry, Subscription};
use crate::value::{PropertyMap, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Equality predicate used to decide whether a key changed.
///
/// The store calls it once per key with the old and new value; it never looks
/// inside nested values by itself.
pub type EqualsFn<V> = fn(&V, &V) -> bool;

/// The default [`EqualsFn`]: the value type's own `PartialEq`.
pub fn default_equals<V: PartialEq>(a: &V, b: &V) -> bool {
    a == b
}

/// A key/value property store with resettable defaults and change events.
///
/// The store is a single-threaded handle: clones share the same data and
/// listeners. Every write goes through one mutation path that compares old
/// and new values, commits the new state, then notifies listeners with one
/// [`Event::KeyChange`] per changed key followed by a single
/// [`Event::Change`].
///
/// # Examples
///
/// ```
/// use propbag::Store;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let store = Store::new([("foo", "bar"), ("bar", "foo")]);
/// let changes = Rc::new(Cell::new(0));
///
/// let _sub = store.on_change({
///     let changes = changes.clone();
///     move |_keys| changes.set(changes.get() + 1)
/// });
///
/// store.set("foo", "boop");
/// store.set("foo", "boop"); // same value, no event
/// assert_eq!(store.get("foo"), Some("boop"));
/// assert_eq!(changes.get(), 1);
///
/// store.reset();
/// assert_eq!(store.get("foo"), Some("bar"));
/// ```
///
/// # Reentrancy
///
/// No borrow of the store is held while listeners run, so a listener may read
/// or write the store. A write from inside a listener is applied and fully
/// dispatched before the outer dispatch continues, which means later
/// listeners of the outer mutation can observe state newer than the payload
/// they receive.
pub struct Store<V = Value> {
    defaults: Rc<PropertyMap<V>>,
    data: Rc<RefCell<PropertyMap<V>>>,
    listeners: Registry<V>,
    equals: EqualsFn<V>,
}

impl<V: Clone + PartialEq + 'static> Store<V> {
    /// Create a store whose defaults and initial state are `defaults`.
    ///
    /// No event is emitted.
    pub fn new<I, K>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        Self::with_equality(defaults, default_equals::<V>)
    }
}

impl<V: Clone + 'static> Store<V> {
    /// Create a store that uses `equals` for change detection.
    pub fn with_equality<I, K>(defaults: I, equals: EqualsFn<V>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let defaults = collect(defaults);
        Self {
            data: Rc::new(RefCell::new(defaults.clone())),
            defaults: Rc::new(defaults),
            listeners: Registry::new(),
            equals,
        }
    }

    /// Get a clone of the value under `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.data.borrow().get(key).cloned()
    }

    /// Read the value under `key` without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this store.
    pub fn with<F, R>(&self, key: &str, f: F) -> R
    where
        F: FnOnce(Option<&V>) -> R,
    {
        f(self.data.borrow().get(key))
    }

    /// Get the requested keys with their current values.
    ///
    /// Keys the store does not hold are left out of the result. Results
    /// follow the order of `keys`.
    pub fn get_properties<I, K>(&self, keys: I) -> PropertyMap<V>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let data = self.data.borrow();
        keys.into_iter()
            .filter_map(|key| {
                let key = key.as_ref();
                data.get(key).map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    /// Get a copy of the whole live mapping.
    pub fn get_all(&self) -> PropertyMap<V> {
        self.data.borrow().clone()
    }

    /// Get a copy of the defaults the store was created with.
    pub fn defaults(&self) -> PropertyMap<V> {
        self.defaults.as_ref().clone()
    }

    /// Whether the store currently holds `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.borrow().contains_key(key)
    }

    /// Keys currently held, in iteration order.
    pub fn keys(&self) -> Vec<String> {
        self.data.borrow().keys().cloned().collect()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Visit every key and value in iteration order.
    ///
    /// Iteration runs over a snapshot taken when the call starts, so `f` may
    /// write to the store; those writes are not visited.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &V),
    {
        let snapshot = self.get_all();
        for (key, value) in &snapshot {
            f(key, value);
        }
    }

    /// Set a single key. Same as [`set_properties`](Self::set_properties)
    /// with one entry.
    pub fn set(&self, key: impl Into<String>, value: impl Into<V>) {
        self.set_properties([(key.into(), value.into())]);
    }

    /// Merge `partial` into the live mapping.
    ///
    /// Keys missing from `partial` keep their values. Events are emitted only
    /// for keys whose value actually changed, and `change` only if any did.
    pub fn set_properties<I, K>(&self, partial: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let partial = collect(partial);
        let changes = {
            let mut data = self.data.borrow_mut();
            let changes = diff::merged(&data, &partial, self.equals);
            data.extend(partial);
            changes
        };
        self.emit(changes, false, false);
    }

    /// Replace the whole live mapping with `full`.
    ///
    /// Keys missing from `full` are removed. Unlike the merging writes, this
    /// always emits `change`, even when nothing differs.
    pub fn set_all<I, K>(&self, full: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        self.replace(collect(full), true);
    }

    /// Edit a copy of the live mapping and commit it as a replacement.
    ///
    /// Events follow the merging writes: nothing is emitted if the edited
    /// copy equals the current state.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PropertyMap<V>),
    {
        let mut next = self.get_all();
        f(&mut next);
        self.replace(next, false);
    }

    /// Restore the defaults, dropping every write and added key.
    ///
    /// Behaves as [`set_all`](Self::set_all) with a fresh copy of the
    /// defaults, so `change` is always emitted.
    pub fn reset(&self) {
        self.replace(self.defaults(), true);
    }

    /// Register `listener` for `event`.
    ///
    /// Listeners run synchronously in registration order. The listener is
    /// removed when the returned [`Subscription`] is dropped.
    pub fn on<F>(&self, event: Event, listener: F) -> Subscription
    where
        F: Fn(&Notification<'_, V>) + 'static,
    {
        self.listeners.add(event, Rc::new(listener))
    }

    /// Listen for the generic `change` event. `listener` receives the keys
    /// that changed.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[String]) + 'static,
    {
        self.on(Event::Change, move |notification| {
            if let Notification::Changed { keys } = notification {
                listener(*keys);
            }
        })
    }

    /// Listen for `change:<key>`. `listener` receives `(new, old)`.
    pub fn on_key_change<F>(&self, key: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(Option<&V>, Option<&V>) + 'static,
    {
        self.on(Event::key(key), move |notification| {
            if let Notification::KeyChanged { new, old, .. } = notification {
                listener(*new, *old);
            }
        })
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn replace(&self, next: PropertyMap<V>, always_notify: bool) {
        let changes = {
            let mut data = self.data.borrow_mut();
            let changes = diff::replaced(&data, &next, self.equals);
            *data = next;
            changes
        };
        self.emit(changes, true, always_notify);
    }

    /// Notify listeners about a committed mutation.
    fn emit(&self, changes: Vec<KeyChange<V>>, replace: bool, always_notify: bool) {
        debug!(changed = changes.len(), replace, "store mutation applied");
        if changes.is_empty() && !always_notify {
            return;
        }

        let snapshot = self.listeners.snapshot();
        for change in &changes {
            trace!(key = %change.key, "emitting key change");
            dispatch(
                &snapshot,
                &Notification::KeyChanged {
                    key: &change.key,
                    new: change.new.as_ref(),
                    old: change.old.as_ref(),
                },
            );
        }

        let keys: Vec<String> = changes.into_iter().map(|change| change.key).collect();
        dispatch(&snapshot, &Notification::Changed { keys: &keys });
    }
}

fn collect<V, I, K>(entries: I) -> PropertyMap<V>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

impl<V: Clone + PartialEq + 'static> Default for Store<V> {
    fn default() -> Self {
        Self::new(PropertyMap::new())
    }
}

impl<V: Clone + PartialEq + 'static> From<PropertyMap<V>> for Store<V> {
    fn from(defaults: PropertyMap<V>) -> Self {
        Self::new(defaults)
    }
}

impl<V> Clone for Store<V> {
    fn clone(&self) -> Self {
        Self {
            defaults: Rc::clone(&self.defaults),
            data: Rc::clone(&self.data),
            listeners: self.listeners.clone(),
            equals: self.equals,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Store<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Store");
        match self.data.try_borrow() {
            Ok(data) => s.field("data", &*data),
            Err(_) => s.field("data", &"<borrowed>"),
        };
        s.field("defaults", &*self.defaults).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn store() -> Store<&'static str> {
        Store::new([("foo", "bar"), ("bar", "foo")])
    }

    #[test]
    fn store_get_set() {
        let store = store();
        assert_eq!(store.get("foo"), Some("bar"));
        assert_eq!(store.get("missing"), None);

        store.set("foo", "boop");
        assert_eq!(store.get("foo"), Some("boop"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clones_share_state_and_listeners() {
        let store = store();
        let other = store.clone();
        let calls = Rc::new(Cell::new(0));

        let _sub = other.on_change({
            let calls = calls.clone();
            move |_| calls.set(calls.get() + 1)
        });

        store.set("foo", "baz");
        assert_eq!(other.get("foo"), Some("baz"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn defaults_are_not_aliased_by_writes() {
        let store = store();
        store.set("foo", "boop");
        store.set("alt", "x");
        assert_eq!(
            store.defaults(),
            collect([("foo", "bar"), ("bar", "foo")])
        );
    }

    #[test]
    fn overwriting_keeps_key_position() {
        let store = store();
        store.set_properties([("new", "1"), ("foo", "2")]);
        assert_eq!(store.keys(), vec!["foo", "bar", "new"]);
    }

    #[test]
    fn update_emits_only_on_difference() {
        let store = store();
        let calls = Rc::new(Cell::new(0));
        let _sub = store.on_change({
            let calls = calls.clone();
            move |_| calls.set(calls.get() + 1)
        });

        store.update(|_| {});
        assert_eq!(calls.get(), 0);

        store.update(|map| {
            map.shift_remove("bar");
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(store.keys(), vec!["foo"]);
    }

    #[test]
    fn listener_can_write_to_store() {
        let store = store();
        let echo = store.clone();
        let _sub = store.on_key_change("foo", move |new, _old| {
            if let Some(value) = new {
                echo.set("mirror", *value);
            }
        });

        store.set("foo", "boop");
        assert_eq!(store.get("mirror"), Some("boop"));
    }

    #[test]
    fn for_each_tolerates_writes() {
        let store = store();
        let mut seen = Vec::new();
        store.for_each(|key, _| {
            store.set(format!("{}-copy", key), "x");
            seen.push(key.to_string());
        });
        assert_eq!(seen, vec!["foo", "bar"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn debug_output_lists_data() {
        let rendered = format!("{:?}", store());
        assert!(rendered.contains("\"foo\": \"bar\""));
    }
}

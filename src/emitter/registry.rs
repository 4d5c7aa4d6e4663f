use super::{Event, Notification, Subscription};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::trace;

pub(crate) type Listener<V> = Rc<dyn Fn(&Notification<'_, V>)>;

/// Registry entries captured at the start of a dispatch.
pub(crate) type Snapshot<V> = Vec<(Event, Listener<V>)>;

struct Entry<V> {
    id: usize,
    event: Event,
    listener: Listener<V>,
}

/// Listener storage shared between a store and its subscriptions.
pub(crate) struct RegistryInner<V> {
    next_id: usize,
    // Registration order is dispatch order.
    entries: Vec<Entry<V>>,
}

/// Lets a [`Subscription`] remove its listener without knowing the value type.
pub(crate) trait RemoveListener {
    fn remove_listener(&self, id: usize) -> bool;
}

impl<V> RemoveListener for RefCell<RegistryInner<V>> {
    fn remove_listener(&self, id: usize) -> bool {
        // The listener may own other subscriptions, so it is dropped only
        // after the borrow is released.
        let mut inner = self.borrow_mut();
        let removed = match inner.entries.iter().position(|entry| entry.id == id) {
            Some(index) => Some(inner.entries.remove(index)),
            None => None,
        };
        drop(inner);
        removed.is_some()
    }
}

/// Ordered listener list owned by one store.
pub(crate) struct Registry<V> {
    inner: Rc<RefCell<RegistryInner<V>>>,
}

impl<V: 'static> Registry<V> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener and hand back the guard that owns its lifetime.
    pub fn add(&self, event: Event, listener: Listener<V>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Entry {
                id,
                event,
                listener,
            });
            id
        };
        trace!(id, "listener registered");

        let weak = Rc::downgrade(&self.inner);
        let registry: Weak<dyn RemoveListener> = weak;
        Subscription::new(id, registry)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Copy out the current listeners so no borrow is held while they run.
    pub fn snapshot(&self) -> Snapshot<V> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|entry| (entry.event.clone(), Rc::clone(&entry.listener)))
            .collect()
    }
}

impl<V> Clone for Registry<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Call every listener in `snapshot` whose event matches `notification`.
pub(crate) fn dispatch<V>(snapshot: &Snapshot<V>, notification: &Notification<'_, V>) {
    for (event, listener) in snapshot {
        if event.matches(notification) {
            listener(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting(counter: &Rc<Cell<usize>>) -> Listener<i32> {
        let counter = Rc::clone(counter);
        Rc::new(move |_| counter.set(counter.get() + 1))
    }

    #[test]
    fn dropping_subscription_removes_listener() {
        let registry = Registry::<i32>::new();
        let calls = Rc::new(Cell::new(0));

        let subscription = registry.add(Event::Change, counting(&calls));
        assert_eq!(registry.len(), 1);

        dispatch(&registry.snapshot(), &Notification::Changed { keys: &[] });
        assert_eq!(calls.get(), 1);

        drop(subscription);
        assert_eq!(registry.len(), 0);

        dispatch(&registry.snapshot(), &Notification::Changed { keys: &[] });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn dispatch_filters_by_event() {
        let registry = Registry::<i32>::new();
        let any = Rc::new(Cell::new(0));
        let foo = Rc::new(Cell::new(0));

        let _a = registry.add(Event::Change, counting(&any));
        let _b = registry.add(Event::key("foo"), counting(&foo));

        let snapshot = registry.snapshot();
        dispatch(
            &snapshot,
            &Notification::KeyChanged {
                key: "bar",
                new: Some(&1),
                old: None,
            },
        );
        assert_eq!((any.get(), foo.get()), (0, 0));

        dispatch(
            &snapshot,
            &Notification::KeyChanged {
                key: "foo",
                new: Some(&1),
                old: None,
            },
        );
        assert_eq!((any.get(), foo.get()), (0, 1));
    }

    #[test]
    fn listener_can_drop_its_own_subscription() {
        let registry = Registry::<i32>::new();
        let calls = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let subscription = registry.add(Event::Change, {
            let calls = Rc::clone(&calls);
            let slot = Rc::clone(&slot);
            Rc::new(move |_| {
                calls.set(calls.get() + 1);
                slot.borrow_mut().take();
            })
        });
        *slot.borrow_mut() = Some(subscription);

        dispatch(&registry.snapshot(), &Notification::Changed { keys: &[] });
        assert_eq!(calls.get(), 1);
        assert_eq!(registry.len(), 0);

        dispatch(&registry.snapshot(), &Notification::Changed { keys: &[] });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let registry = Registry::<i32>::new();
        let calls = Rc::new(Cell::new(0));

        let first = registry.add(Event::Change, counting(&calls));
        let first_id = first.id();
        drop(first);
        let second = registry.add(Event::Change, counting(&calls));
        assert_ne!(first_id, second.id());
    }
}

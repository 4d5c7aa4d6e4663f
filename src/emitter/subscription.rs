use super::registry::RemoveListener;
use std::fmt;
use std::rc::Weak;
use tracing::trace;

/// RAII guard for a store listener.
///
/// The listener stays registered for as long as the guard lives. Dropping it
/// (or calling [`unsubscribe`](Subscription::unsubscribe)) removes the
/// listener; [`detach`](Subscription::detach) keeps it for the rest of the
/// store's life instead.
#[must_use = "dropping a Subscription immediately removes its listener"]
pub struct Subscription {
    id: usize,
    registry: Option<Weak<dyn RemoveListener>>,
}

impl Subscription {
    pub(crate) fn new(id: usize, registry: Weak<dyn RemoveListener>) -> Self {
        Self {
            id,
            registry: Some(registry),
        }
    }

    /// Registration id, unique within the owning store.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered without holding on to the guard.
    pub fn detach(mut self) {
        self.registry = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            if registry.remove_listener(self.id) {
                trace!(id = self.id, "listener removed");
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.registry.is_some())
            .finish()
    }
}

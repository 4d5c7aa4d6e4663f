//! Per-store event emission.
//!
//! Every [`Store`](crate::Store) owns its own listener registry; there is no
//! global bus. Registering a listener returns a [`Subscription`] that removes
//! the listener again when dropped.

mod event;
mod registry;
mod subscription;

pub use event::{Event, Notification};
pub(crate) use registry::{dispatch, Registry};
pub use subscription::Subscription;

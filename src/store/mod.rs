//! The property store.
//!
//! A [`Store`] holds a live key/value mapping next to the defaults it was
//! created with. Writes either merge into the mapping or replace it, and
//! both kinds share one change-detection and notification path.

mod diff;
mod store;

pub use store::{default_equals, EqualsFn, Store};

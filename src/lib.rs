//! # Propbag
//!
//! A small in-memory property store with change notification.
//!
//! A [`Store`] maps string keys to values, remembers the defaults it was
//! created with and can be [`reset`](Store::reset) to them at any time.
//! Writes that change something notify listeners:
//!
//! - `change:<key>` ([`Event::KeyChange`]) once per changed key, with the new
//!   and old value
//! - `change` ([`Event::Change`]) once per mutation, after the per-key events
//!
//! Setting a key to the value it already holds emits nothing. Replacing the
//! whole mapping with [`Store::set_all`] always emits `change`.
//!
//! Values default to the dynamic [`Value`] type but any `Clone` type works.
//! The store is single-threaded; listeners run synchronously inside the call
//! that caused them.
//!
//! ```
//! use propbag::{Store, Value};
//!
//! let store: Store = Store::new([("volume", Value::from(40)), ("muted", Value::from(false))]);
//! let _sub = store.on_key_change("volume", |new, old| {
//!     println!("volume {:?} -> {:?}", old, new);
//! });
//!
//! store.set("volume", 55);
//! assert_eq!(store.get("volume"), Some(Value::Int(55)));
//! ```

mod emitter;
mod error;
pub mod store;
mod value;

// Re-export main types for convenience
pub use emitter::{Event, Notification, Subscription};
pub use error::{Error, Result};
pub use store::{default_equals, EqualsFn, Store};
pub use value::{PropertyMap, Value};

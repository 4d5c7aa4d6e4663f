use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

const CHANGE: &str = "change";

/// The events a store emits.
///
/// The string form is `"change"` for [`Event::Change`] and `"change:<key>"`
/// for [`Event::KeyChange`], so event names can be parsed from text:
///
/// ```
/// use propbag::Event;
///
/// let event: Event = "change:foo".parse().unwrap();
/// assert_eq!(event, Event::key("foo"));
/// assert_eq!(event.to_string(), "change:foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    /// At least one key changed. Emitted once per mutation.
    Change,
    /// The value under this key changed.
    KeyChange(String),
}

impl Event {
    /// Shorthand for [`Event::KeyChange`].
    pub fn key(key: impl Into<String>) -> Self {
        Event::KeyChange(key.into())
    }

    /// Whether a listener registered for this event receives `notification`.
    pub fn matches<V>(&self, notification: &Notification<'_, V>) -> bool {
        match (self, notification) {
            (Event::Change, Notification::Changed { .. }) => true,
            (Event::KeyChange(wanted), Notification::KeyChanged { key, .. }) => {
                wanted.as_str() == *key
            }
            _ => false,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Change => write!(f, "{}", CHANGE),
            Event::KeyChange(key) => write!(f, "{}:{}", CHANGE, key),
        }
    }
}

impl FromStr for Event {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == CHANGE {
            return Ok(Event::Change);
        }
        match s.strip_prefix(CHANGE).and_then(|rest| rest.strip_prefix(':')) {
            Some("") => Err(Error::EmptyEventKey),
            Some(key) => Ok(Event::KeyChange(key.to_string())),
            None => Err(Error::InvalidEvent(s.to_string())),
        }
    }
}

/// Payload delivered to listeners.
#[derive(Debug)]
pub enum Notification<'a, V> {
    /// Generic change event, carrying the keys that changed in this mutation.
    ///
    /// `keys` is empty when a full replacement produced no difference.
    Changed { keys: &'a [String] },
    /// Per-key change event. `None` means the key was absent on that side:
    /// added keys have no `old`, removed keys have no `new`.
    KeyChanged {
        key: &'a str,
        new: Option<&'a V>,
        old: Option<&'a V>,
    },
}

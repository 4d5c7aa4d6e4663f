//! Error types for propbag

use thiserror::Error;

/// Crate error type.
///
/// Store reads and writes never fail; errors only come from parsing
/// event names supplied as strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid event name: {0:?} (expected \"change\" or \"change:<key>\")")]
    InvalidEvent(String),

    #[error("Event name \"change:\" is missing a key")]
    EmptyEventKey,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

//! Failure model for woven helpers
//!
//! Failures come in two kinds. `Recoverable` failures are the expected
//! lookup and access problems a reflective operation can hit. `Fatal`
//! failures are the single unchecked contract instrumented call sites see.
//! [`unchecked`] is the boundary that turns the former into the latter.

use thiserror::Error;

/// Result type for helper operations that may fail either way
pub type HelperResult<T> = Result<T, Failure>;

/// Result type once a value has crossed the [`unchecked`] boundary
pub type FatalResult<T> = Result<T, Fatal>;

/// Lookup and access failures raised by the object model
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Recoverable {
    /// No class is registered under the name
    #[error("Class not found: {name}")]
    NoSuchClass {
        /// Fully-qualified class name
        name: String,
    },

    /// The class declares no field with the name
    #[error("No such field: {owner}.{name}")]
    NoSuchField {
        /// Declaring class
        owner: String,
        /// Field name
        name: String,
    },

    /// The field is not visible to the caller and has not been relaxed
    #[error("Class {caller} cannot access non-public field {owner}.{name}")]
    IllegalAccess {
        /// Declaring class
        owner: String,
        /// Field name
        name: String,
        /// Class the access originates from
        caller: String,
    },

    /// The instance handle does not refer to a live object
    #[error("No such object: #{id}")]
    NoSuchObject {
        /// Object id
        id: u64,
    },

    /// A value had the wrong shape for the operation
    #[error("Type mismatch: expected {expected}, got {got}")]
    WrongType {
        /// Expected shape
        expected: String,
        /// Actual shape
        got: String,
    },

    /// A helper was called with the wrong number of arguments
    #[error("{method} expects {expected} arguments, got {got}")]
    Arity {
        /// Helper name
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },
}

/// Unchecked failures
#[derive(Debug, Error)]
pub enum Fatal {
    /// A recoverable failure that crossed an [`unchecked`] boundary
    #[error("{0}")]
    Wrapped(#[source] Recoverable),

    /// Pop without a matching push on the current thread
    #[error("Access stack underflow: pop without matching push on {thread}")]
    UnbalancedPop {
        /// Debug name of the offending thread
        thread: String,
    },

    /// Invariant broken inside the runtime or a host
    #[error("Internal error: {message}")]
    Internal {
        /// Description
        message: String,
    },
}

impl Fatal {
    /// The recoverable failure this one wraps, if any
    pub fn cause(&self) -> Option<&Recoverable> {
        match self {
            Fatal::Wrapped(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Either kind of failure
#[derive(Debug, Error)]
pub enum Failure {
    /// Expected lookup/access failure
    #[error(transparent)]
    Recoverable(#[from] Recoverable),

    /// Already unchecked
    #[error(transparent)]
    Fatal(#[from] Fatal),
}

impl Failure {
    /// Whether this failure would pass an [`unchecked`] boundary unchanged
    pub fn is_fatal(&self) -> bool {
        matches!(self, Failure::Fatal(_))
    }
}

impl From<Failure> for Fatal {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Recoverable(inner) => Fatal::Wrapped(inner),
            Failure::Fatal(fatal) => fatal,
        }
    }
}

/// Run `f`, translating recoverable failures into [`Fatal::Wrapped`].
///
/// Fatal failures propagate unchanged, so a caller sees exactly one
/// unchecked failure whichever kind was raised inside.
pub fn unchecked<T, F>(f: F) -> FatalResult<T>
where
    F: FnOnce() -> HelperResult<T>,
{
    f().map_err(Fatal::from)
}

//! Weaver Runtime - what woven field-access helpers do at run time
//!
//! Synthesized helpers installed by `weaver-assist` bind to the operations
//! in this crate: field reads and writes through a typed [`ObjectModel`],
//! and paired push/pop of relaxed field sets on a thread-scoped
//! [`AccessStack`].

pub mod access;
pub mod error;
pub mod helpers;
pub mod memory;
pub mod object;

pub use access::{AccessStack, FieldSet};
pub use error::{unchecked, Failure, Fatal, FatalResult, HelperResult, Recoverable};
pub use helpers::{
    collect_inaccessible, pop_field_access, push_field_access, read_field, relax, write_field,
    AccessScope,
};
pub use memory::MemoryHeap;
pub use object::{FieldRef, Modifiers, ObjectId, ObjectModel, Value};

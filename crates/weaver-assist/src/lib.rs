//! Weaver Assist - field-access helper synthesis
//!
//! Transformation passes use [`Assistant`] to inject private static helpers
//! into the types they rewrite: a field reader, a field writer, and a
//! push/pop pair that relaxes field visibility on a per-thread stack held in
//! a synthesized static field. Every helper is looked up before it is
//! created, so any number of passes can ask for the same helper on the same
//! type.

mod assistant;
pub mod body;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod naming;
pub mod signature;
mod stack_field;

pub use assistant::{Assistant, CallSite};
pub use body::Body;
pub use config::AssistantConfig;
pub use error::{AssistError, AssistResult, InstallError};
pub use memory::{MemoryClass, MemoryPool};
pub use model::{
    FieldDecl, FieldHandle, FieldInfo, HelperKind, MethodDecl, MethodHandle, Param, TargetType,
    TypePool, TypeRef,
};
pub use naming::{NameGenerator, DEFAULT_PREFIX};
pub use signature::{compare_params, ParamSignature};

// Re-export runtime types that appear in this crate's API
pub use weaver_runtime::{FieldRef, FieldSet, Modifiers};

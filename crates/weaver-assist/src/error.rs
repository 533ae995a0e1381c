//! Synthesis errors
//!
//! Every variant is a defect in the calling pass or in the assistant itself.
//! None is retried.

use thiserror::Error;

pub type AssistResult<T> = Result<T, AssistError>;

/// Reasons a host refuses to install a member
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("Malformed member source: {reason}")]
    Malformed { reason: String },

    #[error("Duplicate member: {name}")]
    Duplicate { name: String },
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("Missing argument {index} for template `{template}`")]
    MissingArgument { template: String, index: usize },

    #[error("Malformed template `{template}`: {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("No open block to end in {tag}")]
    NoOpenBlock { tag: String },

    #[error("Unterminated blocks in {tag}: {blocks:?}")]
    UnterminatedBlocks { tag: String, blocks: Vec<String> },

    #[error("Empty type name at position {index}")]
    EmptyTypeName { index: usize },

    #[error("Type not found: {name}")]
    TypeNotFound { name: String },

    #[error("Cannot install {member} on {owner}")]
    Install {
        owner: String,
        member: String,
        #[source]
        source: InstallError,
    },

    #[error("Invalid member prefix `{prefix}`")]
    InvalidPrefix { prefix: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

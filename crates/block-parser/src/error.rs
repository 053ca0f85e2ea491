//! Error types for block-parser

use block_types::ContentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockParserError {
    /// Invalid setup, such as registering a transformer under a family tag
    /// it does not report. Raised before any content is processed.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Content {0} not found")]
    NotFound(ContentId),

    /// A synced reference expanded back into a content item that is already
    /// being expanded.
    #[error("Reference cycle: content {0} includes itself")]
    ReferenceCycle(ContentId),

    #[error("Render error: {0}")]
    Render(String),

    /// A host collaborator (tree source, renderer, field storage) failed.
    /// The pass is abandoned.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlockParserError {
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }

    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BlockParserError>;

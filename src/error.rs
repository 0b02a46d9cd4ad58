//! Error types for gpnvm
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::directory::AttrId;

/// Result type alias using NvmError
pub type Result<T> = std::result::Result<T, NvmError>;

/// Unified error type for gpnvm operations
#[derive(Debug, Error)]
pub enum NvmError {
    // -------------------------------------------------------------------------
    // Medium Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Medium not found: {}", .0.display())]
    MediumNotFound(PathBuf),

    #[error("Illegal offset {offset}: medium is only {medium_len} bytes long")]
    Seek { offset: u32, medium_len: u64 },

    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Short write at offset {offset}: could not write {expected} bytes")]
    ShortWrite { offset: u32, expected: usize },

    #[error("Write verification failed at offset {offset}: {detail}")]
    VerificationFailed { offset: u32, detail: String },

    // -------------------------------------------------------------------------
    // Directory Errors
    // -------------------------------------------------------------------------
    #[error("Directory record corrupted: {0}")]
    CorruptDirectory(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Attribute {0} is already in the directory")]
    DuplicateAttr(AttrId),

    // -------------------------------------------------------------------------
    // Attribute Store Errors
    // -------------------------------------------------------------------------
    #[error("Attribute {0} not found")]
    AttrNotFound(AttrId),

    #[error("Attribute {id} has length {stored}, refusing to write {requested} bytes")]
    AttrLenDiff {
        id: AttrId,
        stored: u8,
        requested: u8,
    },

    #[error("Attribute directory full ({capacity} entries)")]
    MemFull { capacity: usize },

    #[error("Memory error: {0}")]
    MemError(#[source] Box<NvmError>),

    #[error("Declared length {declared} does not match value of {actual} bytes")]
    ValueLength { declared: u8, actual: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NvmError {
    /// Wrap a medium failure as seen by the attribute store
    pub(crate) fn mem(err: NvmError) -> Self {
        match err {
            already @ NvmError::MemError(_) => already,
            other => NvmError::MemError(Box::new(other)),
        }
    }

    /// True when the error means "nothing has been written at offset 0 yet":
    /// the medium does not exist, or it exists but is empty.
    pub fn is_missing_record(&self) -> bool {
        match self {
            NvmError::MediumNotFound(_) => true,
            NvmError::ShortRead {
                offset: 0,
                actual: 0,
                ..
            } => true,
            NvmError::MemError(inner) => inner.is_missing_record(),
            _ => false,
        }
    }

    /// The medium-level cause behind a `MemError`, or the error itself
    pub fn root_cause(&self) -> &NvmError {
        match self {
            NvmError::MemError(inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl From<bincode::Error> for NvmError {
    fn from(err: bincode::Error) -> Self {
        NvmError::Serialization(err.to_string())
    }
}

/*!
Error types for the tree reader.
*/

use crate::store::StoreError;
use shared::{ElementType, SharedError};
use thiserror::Error;

/// Result type used by the reader
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Configuration and cycle errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReaderError {
    #[error("Invalid tree name: '{0}'")]
    InvalidTreeName(String),

    #[error("Invalid shot selector {0}: use -1 for the latest shot or a positive number")]
    InvalidShot(i64),

    #[error("Invalid cycle frequency: {0}")]
    InvalidFrequency(f64),

    #[error("No channels configured")]
    NoChannels,

    #[error("Channel count mismatch: declared {declared}, configured {configured}")]
    ChannelCountMismatch { declared: usize, configured: usize },

    #[error("Channel '{0}' configured more than once")]
    DuplicateChannel(String),

    #[error("Channel '{0}' must produce at least one element per cycle")]
    InvalidElementCount(String),

    #[error("Channel '{node}': byte size {declared} does not match {expected}")]
    ByteSizeMismatch {
        node: String,
        declared: usize,
        expected: usize,
    },

    #[error("Channel '{node}': invalid data management code {code}")]
    InvalidDataManagement { node: String, code: u8 },

    #[error("Channel '{node}': invalid hole management code {code}")]
    InvalidHoleManagement { node: String, code: u8 },

    #[error("Time signal cannot be of type {0}")]
    InvalidTimeSignalType(ElementType),

    #[error("Node '{0}' holds no segments")]
    EmptyNode(String),

    #[error("Channel '{node}': sampling time {configured}s differs from stored {stored}s")]
    SamplingTimeMismatch {
        node: String,
        configured: f64,
        stored: f64,
    },

    /// Element type resolution failures (unknown or mismatched types)
    #[error("Type error: {0}")]
    Type(#[from] SharedError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel '{node}': no more data in the store")]
    StoreExhausted { node: String },

    #[error("Channel '{node}': copied {copied} of {requested} samples")]
    CopyMismatch {
        node: String,
        requested: usize,
        copied: usize,
    },
}

impl ReaderError {
    /// True for the errors only a cycle can raise. Store errors can come
    /// from either phase and are not counted here.
    pub fn is_cycle_failure(&self) -> bool {
        matches!(self, Self::StoreExhausted { .. } | Self::CopyMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        assert!(!ReaderError::NoChannels.is_cycle_failure());
        assert!(!ReaderError::from(SharedError::UnknownTypeCode(1)).is_cycle_failure());
        assert!(ReaderError::StoreExhausted {
            node: "SIG".to_string()
        }
        .is_cycle_failure());
    }

    #[test]
    fn test_messages() {
        let err = ReaderError::from(SharedError::type_mismatch(ElementType::Int8, ElementType::UInt8));
        assert_eq!(
            err.to_string(),
            "Type error: Type mismatch: declared int8, store holds uint8"
        );
    }
}

/*!
Common error types for the signal plugin components.
*/

use crate::element::ElementType;
use thiserror::Error;

/// Common result type used throughout the shared library
pub type Result<T> = std::result::Result<T, SharedError>;

/// Errors raised while resolving and handling element types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SharedError {
    /// The store reported a type code outside the ten supported codes
    #[error("Unsupported store type code: {0}")]
    UnknownTypeCode(u8),

    /// A configured type name does not name a supported element type
    #[error("Unknown element type name: '{0}'")]
    UnknownTypeName(String),

    /// Declared type differs from the type the store holds
    #[error("Type mismatch: declared {declared}, store holds {stored}")]
    TypeMismatch {
        declared: ElementType,
        stored: ElementType,
    },

    /// Raw bytes do not have the width of the element type
    #[error("Invalid sample width for {element_type}: expected {expected} bytes, got {actual}")]
    InvalidSampleWidth {
        element_type: ElementType,
        expected: usize,
        actual: usize,
    },
}

impl SharedError {
    /// Create a new unknown type name error
    pub fn unknown_type_name(name: impl Into<String>) -> Self {
        Self::UnknownTypeName(name.into())
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(declared: ElementType, stored: ElementType) -> Self {
        Self::TypeMismatch { declared, stored }
    }
}

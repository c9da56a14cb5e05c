/*!
# Shared Types and Utilities

This crate contains common types and utilities shared between the real-time
signal plugin components.

## Core Types

- [`ElementType`] - The ten numeric element types and their dispatch table
- [`Element`] - Rust numeric types that map onto an [`ElementType`]
- [`SampleValue`] - One element held as raw bytes (hold-last filling)

## Modules

- [`element`] - Type dispatch table and store type codes
- [`sample`] - Single-sample value holder
- [`error`] - Common error types
*/

pub mod element;
pub mod error;
pub mod sample;

// Re-export commonly used types
pub use element::{store_codes, Element, ElementType, NumericKind, TypeInfo};
pub use error::{Result, SharedError};
pub use sample::SampleValue;

/// Version information for the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed limits and tolerances
pub mod limits {
    /// Widest supported element in bytes (64-bit types)
    pub const MAX_ELEMENT_WIDTH: usize = 8;

    /// Relative tolerance when comparing sampling times
    pub const SAMPLING_TIME_TOLERANCE: f64 = 1e-6;

    /// Microseconds per second, for time signals
    pub const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;
}

/*!
Single-sample value holder.

[`SampleValue`] keeps one element as raw native-endian bytes together with
its type, so hold-last filling can replicate it into any channel slice
without knowing the Rust type at the call site.
*/

use crate::element::{Element, ElementType};
use crate::error::{Result, SharedError};
use crate::limits::MAX_ELEMENT_WIDTH;

/// One element of a channel, stored as raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleValue {
    element_type: ElementType,
    bytes: [u8; MAX_ELEMENT_WIDTH],
}

impl SampleValue {
    /// The all-zero value of `element_type`
    pub fn zero(element_type: ElementType) -> Self {
        Self {
            element_type,
            bytes: [0; MAX_ELEMENT_WIDTH],
        }
    }

    /// Build a value from exactly one element's worth of bytes
    pub fn from_bytes(element_type: ElementType, raw: &[u8]) -> Result<Self> {
        let width = element_type.byte_width();
        if raw.len() != width {
            return Err(SharedError::InvalidSampleWidth {
                element_type,
                expected: width,
                actual: raw.len(),
            });
        }

        let mut bytes = [0; MAX_ELEMENT_WIDTH];
        bytes[..width].copy_from_slice(raw);
        Ok(Self {
            element_type,
            bytes,
        })
    }

    pub fn from_element<E: Element>(value: E) -> Self {
        let mut bytes = [0; MAX_ELEMENT_WIDTH];
        value.write_ne(&mut bytes[..E::TYPE.byte_width()]);
        Self {
            element_type: E::TYPE,
            bytes,
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The meaningful bytes of the value
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.element_type.byte_width()]
    }

    /// Decode as `E`; `None` when `E` is not the stored type
    pub fn to_element<E: Element>(&self) -> Option<E> {
        if E::TYPE != self.element_type {
            return None;
        }
        E::read_ne(self.as_bytes())
    }

    /// Replicate the value across `out`. A trailing partial element, if
    /// any, is left untouched.
    pub fn fill(&self, out: &mut [u8]) {
        let value = self.as_bytes();
        for chunk in out.chunks_exact_mut(value.len()) {
            chunk.copy_from_slice(value);
        }
    }
}

/*!
Element type dispatch table.

Maps the ten numeric element kinds to their byte widths, numeric kinds and
the type codes used by the pulse tree store. The same table drives
configuration validation, output buffer sizing and the selection of the
typed copy/fill routines.
*/

use crate::error::{Result, SharedError};
use num_traits::{NumCast, ToBytes, ToPrimitive};
use std::fmt;
use std::str::FromStr;

/// Type codes reported by the pulse tree store for numeric nodes
pub mod store_codes {
    pub const DTYPE_BU: u8 = 2;
    pub const DTYPE_WU: u8 = 3;
    pub const DTYPE_LU: u8 = 4;
    pub const DTYPE_QU: u8 = 5;
    pub const DTYPE_B: u8 = 6;
    pub const DTYPE_W: u8 = 7;
    pub const DTYPE_L: u8 = 8;
    pub const DTYPE_Q: u8 = 9;
    pub const DTYPE_FS: u8 = 52;
    pub const DTYPE_FT: u8 = 53;
}

/// Broad numeric category of an element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Unsigned,
    Signed,
    Float,
}

/// Numeric element types a channel can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    UInt8 = 0,
    UInt16 = 1,
    UInt32 = 2,
    UInt64 = 3,
    Int8 = 4,
    Int16 = 5,
    Int32 = 6,
    Int64 = 7,
    Float32 = 8,
    Float64 = 9,
}

/// One row of the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub element_type: ElementType,
    pub name: &'static str,
    pub byte_width: usize,
    pub kind: NumericKind,
    pub store_code: u8,
}

const fn row(
    element_type: ElementType,
    name: &'static str,
    byte_width: usize,
    kind: NumericKind,
    store_code: u8,
) -> TypeInfo {
    TypeInfo {
        element_type,
        name,
        byte_width,
        kind,
        store_code,
    }
}

// Indexed by the `ElementType` discriminant.
static TYPE_TABLE: [TypeInfo; 10] = [
    row(ElementType::UInt8, "uint8", 1, NumericKind::Unsigned, store_codes::DTYPE_BU),
    row(ElementType::UInt16, "uint16", 2, NumericKind::Unsigned, store_codes::DTYPE_WU),
    row(ElementType::UInt32, "uint32", 4, NumericKind::Unsigned, store_codes::DTYPE_LU),
    row(ElementType::UInt64, "uint64", 8, NumericKind::Unsigned, store_codes::DTYPE_QU),
    row(ElementType::Int8, "int8", 1, NumericKind::Signed, store_codes::DTYPE_B),
    row(ElementType::Int16, "int16", 2, NumericKind::Signed, store_codes::DTYPE_W),
    row(ElementType::Int32, "int32", 4, NumericKind::Signed, store_codes::DTYPE_L),
    row(ElementType::Int64, "int64", 8, NumericKind::Signed, store_codes::DTYPE_Q),
    row(ElementType::Float32, "float32", 4, NumericKind::Float, store_codes::DTYPE_FS),
    row(ElementType::Float64, "float64", 8, NumericKind::Float, store_codes::DTYPE_FT),
];

impl ElementType {
    /// Every supported element type, in table order
    pub const ALL: [ElementType; 10] = [
        ElementType::UInt8,
        ElementType::UInt16,
        ElementType::UInt32,
        ElementType::UInt64,
        ElementType::Int8,
        ElementType::Int16,
        ElementType::Int32,
        ElementType::Int64,
        ElementType::Float32,
        ElementType::Float64,
    ];

    /// Table row for this type
    pub fn info(self) -> &'static TypeInfo {
        &TYPE_TABLE[self as usize]
    }

    /// Width of a single element in bytes
    pub fn byte_width(self) -> usize {
        self.info().byte_width
    }

    pub fn kind(self) -> NumericKind {
        self.info().kind
    }

    /// Configuration name, e.g. `"uint16"`
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Type code the tree store uses for nodes of this type
    pub fn store_code(self) -> u8 {
        self.info().store_code
    }

    /// Bytes needed for `elements` values of this type
    pub fn byte_size(self, elements: usize) -> usize {
        elements * self.byte_width()
    }

    /// Resolve a store type code
    pub fn from_store_code(code: u8) -> Result<Self> {
        TYPE_TABLE
            .iter()
            .find(|info| info.store_code == code)
            .map(|info| info.element_type)
            .ok_or(SharedError::UnknownTypeCode(code))
    }

    /// Parse a configuration type name (case-insensitive)
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim().to_lowercase();
        TYPE_TABLE
            .iter()
            .find(|info| info.name == wanted)
            .map(|info| info.element_type)
            .ok_or_else(|| SharedError::unknown_type_name(name))
    }

    /// Fail unless `stored` is exactly this type. No implicit conversion is
    /// ever performed between declared and stored types.
    pub fn check_matches(self, stored: ElementType) -> Result<()> {
        if self == stored {
            Ok(())
        } else {
            Err(SharedError::type_mismatch(self, stored))
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// A Rust numeric type that can be stored in a channel.
///
/// Values are moved in native byte order; the element type of a channel is
/// fixed at configuration time so routines generic over `Element` are picked
/// once per cycle or segment, never per element.
pub trait Element: Copy + PartialEq + fmt::Debug + NumCast + ToPrimitive + ToBytes + 'static {
    /// Dispatch table entry for this Rust type
    const TYPE: ElementType;

    /// Decode one value from exactly `size_of::<Self>()` native-endian bytes
    fn read_ne(bytes: &[u8]) -> Option<Self>;

    /// Encode into `out`, which must be exactly one element wide
    fn write_ne(self, out: &mut [u8]) {
        out.copy_from_slice(self.to_ne_bytes().as_ref());
    }

    /// Convert from `f64`, `None` when the value does not fit
    fn cast_from_f64(value: f64) -> Option<Self> {
        num_traits::cast(value)
    }

    /// Linear interpolation between `a` and `b`; integer kinds round to the
    /// nearest value.
    fn lerp(a: Self, b: Self, fraction: f64) -> Self {
        if fraction <= 0.0 {
            return a;
        }
        if fraction >= 1.0 {
            return b;
        }
        let (Some(x), Some(y)) = (a.to_f64(), b.to_f64()) else {
            return a;
        };
        let mut value = x + (y - x) * fraction;
        if Self::TYPE.kind() != NumericKind::Float {
            value = value.round();
        }
        Self::cast_from_f64(value).unwrap_or(a)
    }
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const TYPE: ElementType = ElementType::$variant;

                fn read_ne(bytes: &[u8]) -> Option<Self> {
                    bytes.try_into().ok().map(<$t>::from_ne_bytes)
                }
            }
        )*
    };
}

impl_element! {
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

/// Run `$body` with `$E` bound to the Rust type of `$element_type`.
///
/// ```
/// use shared::{dispatch_element, ElementType};
///
/// let width = dispatch_element!(ElementType::Int16, E => std::mem::size_of::<E>());
/// assert_eq!(width, 2);
/// ```
#[macro_export]
macro_rules! dispatch_element {
    ($element_type:expr, $E:ident => $body:expr) => {
        match $element_type {
            $crate::ElementType::UInt8 => {
                type $E = u8;
                $body
            }
            $crate::ElementType::UInt16 => {
                type $E = u16;
                $body
            }
            $crate::ElementType::UInt32 => {
                type $E = u32;
                $body
            }
            $crate::ElementType::UInt64 => {
                type $E = u64;
                $body
            }
            $crate::ElementType::Int8 => {
                type $E = i8;
                $body
            }
            $crate::ElementType::Int16 => {
                type $E = i16;
                $body
            }
            $crate::ElementType::Int32 => {
                type $E = i32;
                $body
            }
            $crate::ElementType::Int64 => {
                type $E = i64;
                $body
            }
            $crate::ElementType::Float32 => {
                type $E = f32;
                $body
            }
            $crate::ElementType::Float64 => {
                type $E = f64;
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_widths_match_rust_types() {
        for element_type in ElementType::ALL {
            let width = dispatch_element!(element_type, E => std::mem::size_of::<E>());
            assert_eq!(element_type.byte_width(), width, "{element_type}");
            let typed = dispatch_element!(element_type, E => <E as Element>::TYPE);
            assert_eq!(typed, element_type);
        }
    }

    #[test]
    fn test_store_code_lookup() {
        assert_eq!(ElementType::from_store_code(2).unwrap(), ElementType::UInt8);
        assert_eq!(ElementType::from_store_code(9).unwrap(), ElementType::Int64);
        assert_eq!(ElementType::from_store_code(53).unwrap(), ElementType::Float64);
        assert_eq!(
            ElementType::from_store_code(10),
            Err(SharedError::UnknownTypeCode(10))
        );
        for element_type in ElementType::ALL {
            assert_eq!(
                ElementType::from_store_code(element_type.store_code()).unwrap(),
                element_type
            );
        }
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!(ElementType::from_name("uint8").unwrap(), ElementType::UInt8);
        assert_eq!(ElementType::from_name("Float32").unwrap(), ElementType::Float32);
        assert_eq!("int64".parse::<ElementType>().unwrap(), ElementType::Int64);
        assert!(matches!(
            ElementType::from_name("float"),
            Err(SharedError::UnknownTypeName(_))
        ));
        assert_eq!(ElementType::Int16.to_string(), "int16");
    }

    #[test]
    fn test_names_parse_back() {
        for element_type in ElementType::ALL {
            let parsed: ElementType = element_type.to_string().parse().unwrap();
            assert_eq!(parsed, element_type);
        }
        assert_eq!("UINT32".parse::<ElementType>().unwrap(), ElementType::UInt32);
    }

    #[test]
    fn test_signed_unsigned_mismatch_is_rejected() {
        let err = ElementType::Int8.check_matches(ElementType::UInt8).unwrap_err();
        assert_eq!(
            err,
            SharedError::TypeMismatch {
                declared: ElementType::Int8,
                stored: ElementType::UInt8,
            }
        );
        assert!(ElementType::Float32.check_matches(ElementType::Float32).is_ok());
    }

    #[test]
    fn test_kinds_and_sizes() {
        assert_eq!(ElementType::UInt64.kind(), NumericKind::Unsigned);
        assert_eq!(ElementType::Int32.kind(), NumericKind::Signed);
        assert_eq!(ElementType::Float32.kind(), NumericKind::Float);
        assert_eq!(ElementType::Int32.byte_size(10), 40);
    }

    #[test]
    fn test_native_byte_roundtrip() {
        let mut out = [0u8; 2];
        (-1234i16).write_ne(&mut out);
        assert_eq!(i16::read_ne(&out), Some(-1234));
        assert_eq!(i16::read_ne(&out[..1]), None);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(<i32 as Element>::lerp(0, 10, 0.25), 3);
        assert_eq!(<u8 as Element>::lerp(10, 20, 0.0), 10);
        assert_eq!(<u8 as Element>::lerp(10, 20, 1.0), 20);
        assert_eq!(<f64 as Element>::lerp(1.0, 2.0, 0.5), 1.5);
        assert_eq!(<i8 as Element>::lerp(-10, 10, 0.5), 0);
    }

    #[test]
    fn test_cast_from_f64() {
        assert_eq!(u32::cast_from_f64(1500.0), Some(1500));
        assert_eq!(u32::cast_from_f64(-1.0), None);
        assert_eq!(i8::cast_from_f64(1000.0), None);
    }
}

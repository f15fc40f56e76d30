use std::fmt::{Debug, Display, Formatter};

use half::f16;
use num_traits::{ToPrimitive, Zero};

/// The physical type tag of a stored element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// A boolean stored as one byte, zero meaning `false`.
    Bool,
    /// An 8-bit unsigned integer
    U8,
    /// A 16-bit unsigned integer
    U16,
    /// A 32-bit unsigned integer
    U32,
    /// A 64-bit unsigned integer
    U64,
    /// An 8-bit signed integer
    I8,
    /// A 16-bit signed integer
    I16,
    /// A 32-bit signed integer
    I32,
    /// A 64-bit signed integer
    I64,
    /// An IEEE 754 half-precision float
    F16,
    /// An IEEE 754 single-precision float
    F32,
    /// An IEEE 754 double-precision float
    F64,
}

impl ElementKind {
    /// The number of bytes used to store one element.
    pub const fn byte_width(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Whether the kind is an integer type, signed or unsigned.
    pub const fn is_int(&self) -> bool {
        self.is_unsigned_int() || self.is_signed_int()
    }

    /// Whether the kind is an unsigned integer type.
    pub const fn is_unsigned_int(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Whether the kind is a signed integer type.
    pub const fn is_signed_int(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Whether the kind is a floating point type.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32 | Self::F64)
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::U32 => write!(f, "u32"),
            Self::U64 => write!(f, "u64"),
            Self::I8 => write!(f, "i8"),
            Self::I16 => write!(f, "i16"),
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::F16 => write!(f, "f16"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
        }
    }
}

/// A Rust type that can be decoded from a dataset of the matching [`ElementKind`].
pub trait NativeElement:
    Send + Sync + Sized + Debug + Display + PartialEq + Default + Copy + 'static
{
    /// The kind tag of datasets holding this type.
    const KIND: ElementKind;

    /// The implicit value of unstored entries in sparse storage.
    fn zero() -> Self {
        Self::default()
    }

    /// Whether the value equals [`NativeElement::zero`].
    fn is_zero(&self) -> bool;

    /// Decode one element from exactly `KIND.byte_width()` little-endian bytes.
    fn decode_le(bytes: &[u8]) -> Self;

    /// Append the little-endian representation of this element.
    fn encode_le(self, out: &mut Vec<u8>);

    /// Convert to a zero-based position, if the value is a non-negative integer that fits.
    fn to_index(self) -> Option<usize>;
}

macro_rules! native_element {
    ($T:ty, $kind:ident) => {
        impl NativeElement for $T {
            const KIND: ElementKind = ElementKind::$kind;

            #[inline]
            fn is_zero(&self) -> bool {
                Zero::is_zero(self)
            }

            #[inline]
            fn decode_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$T>()];
                raw.copy_from_slice(bytes);
                <$T>::from_le_bytes(raw)
            }

            #[inline]
            fn encode_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn to_index(self) -> Option<usize> {
                ToPrimitive::to_usize(&self)
            }
        }
    };
}

native_element!(u8, U8);
native_element!(u16, U16);
native_element!(u32, U32);
native_element!(u64, U64);
native_element!(i8, I8);
native_element!(i16, I16);
native_element!(i32, I32);
native_element!(i64, I64);
native_element!(f16, F16);
native_element!(f32, F32);
native_element!(f64, F64);

impl NativeElement for bool {
    const KIND: ElementKind = ElementKind::Bool;

    #[inline]
    fn is_zero(&self) -> bool {
        !*self
    }

    #[inline]
    fn decode_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    #[inline]
    fn encode_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    #[inline]
    fn to_index(self) -> Option<usize> {
        Some(usize::from(self))
    }
}

static_assertions::const_assert_eq!(ElementKind::F16.byte_width(), size_of::<f16>());
static_assertions::const_assert_eq!(ElementKind::Bool.byte_width(), size_of::<bool>());

/// Expands `$body` once per [`ElementKind`], with `$T` bound to the matching Rust type.
///
/// ```
/// use strata_dtype::{ElementKind, NativeElement, match_each_element_kind};
///
/// let width = match_each_element_kind!(ElementKind::I32, |$T| size_of::<$T>());
/// assert_eq!(width, 4);
/// ```
#[macro_export]
macro_rules! match_each_element_kind {
    ($self:expr, | $_:tt $enc:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $enc:ident ) => ( $($body)* )}
        use $crate::ElementKind;
        use $crate::half::f16;
        match $self {
            ElementKind::Bool => __with__! { bool },
            ElementKind::U8 => __with__! { u8 },
            ElementKind::U16 => __with__! { u16 },
            ElementKind::U32 => __with__! { u32 },
            ElementKind::U64 => __with__! { u64 },
            ElementKind::I8 => __with__! { i8 },
            ElementKind::I16 => __with__! { i16 },
            ElementKind::I32 => __with__! { i32 },
            ElementKind::I64 => __with__! { i64 },
            ElementKind::F16 => __with__! { f16 },
            ElementKind::F32 => __with__! { f32 },
            ElementKind::F64 => __with__! { f64 },
        }
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ElementKind::U8, 1)]
    #[case(ElementKind::I16, 2)]
    #[case(ElementKind::F32, 4)]
    #[case(ElementKind::U64, 8)]
    fn widths(#[case] kind: ElementKind, #[case] width: usize) {
        assert_eq!(kind.byte_width(), width);
        let via_macro = match_each_element_kind!(kind, |$T| size_of::<$T>());
        assert_eq!(via_macro, width);
    }

    #[test]
    fn encode_decode_f64() {
        let mut bytes = Vec::new();
        1.5f64.encode_le(&mut bytes);
        assert_eq!(f64::decode_le(&bytes), 1.5);
    }

    #[test]
    fn zeros() {
        assert!(NativeElement::is_zero(&0.0f32));
        assert!(NativeElement::is_zero(&-0.0f64));
        assert!(!NativeElement::is_zero(&f64::NAN));
        assert!(NativeElement::is_zero(&false));
        assert!(NativeElement::is_zero(&f16::from_f32(0.0)));
        assert!(!NativeElement::is_zero(&3u16));
    }

    #[test]
    fn negative_is_not_an_index() {
        assert_eq!((-1i32).to_index(), None);
        assert_eq!(7i64.to_index(), Some(7));
        assert_eq!(u64::MAX.to_index(), usize::try_from(u64::MAX).ok());
    }
}

//! Wire format constants and fixed-width value encoding.
//!
//! Every resource blob is laid out as:
//!
//! ```text
//! [u32 payload length][field slots in declaration order][child data ...]
//! ```
//!
//! Offsets and lengths are always 32 bits wide and little-endian, whatever
//! the host word size. Reference slots hold an `i32` relative to the slot's
//! own position, so a blob can be copied anywhere and read back unchanged.

/// Width of a stored offset (reference slot).
pub const OFFSET_WIDTH: usize = 4;

/// Width of a length header (resources and arrays).
pub const HEADER_WIDTH: usize = 4;

/// Stored offset type.
pub type OffsetType = i32;

/// Stored length type.
pub type SizeType = u32;

/// A fixed-width, reference-free value that can be stored inline in a field
/// slot or an array element.
///
/// Implementations write exactly `WIDTH` bytes and read back from exactly
/// `WIDTH` bytes. Encoding is explicit little-endian; no host layout or
/// padding is involved, so any `Flat` value may sit at any byte offset.
pub trait Flat: Copy + Sized {
    /// Encoded width in bytes
    const WIDTH: usize;

    /// Encodes `self` into `out`, which is exactly `WIDTH` bytes long.
    fn write_to(&self, out: &mut [u8]);

    /// Decodes a value from `bytes`, which is exactly `WIDTH` bytes long.
    fn read_from(bytes: &[u8]) -> Self;
}

macro_rules! impl_flat_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Flat for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_to(&self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_from(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_flat_numeric!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Flat for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn write_to(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    #[inline]
    fn read_from(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Encodes a value into a freshly allocated byte vector.
#[cfg(test)]
pub(crate) fn encode<T: Flat>(value: &T) -> Vec<u8> {
    let mut out = vec![0u8; T::WIDTH];
    value.write_to(&mut out);
    out
}

/// Reads a `u32` length header at `pos`, if the span holds one.
pub(crate) fn read_header(bytes: &[u8], pos: usize) -> Option<SizeType> {
    let end = pos.checked_add(HEADER_WIDTH)?;
    bytes.get(pos..end).map(SizeType::read_from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_encoding_is_little_endian() {
        assert_eq!(encode(&0x0102_0304u32), vec![4, 3, 2, 1]);
        assert_eq!(encode(&-2i16), vec![0xfe, 0xff]);
    }

    #[test]
    fn widths_are_fixed() {
        assert_eq!(<u8 as Flat>::WIDTH, 1);
        assert_eq!(<bool as Flat>::WIDTH, 1);
        assert_eq!(<i16 as Flat>::WIDTH, 2);
        assert_eq!(<f32 as Flat>::WIDTH, 4);
        assert_eq!(<u64 as Flat>::WIDTH, 8);
        assert_eq!(<f64 as Flat>::WIDTH, 8);
        assert_eq!(OFFSET_WIDTH, std::mem::size_of::<OffsetType>());
        assert_eq!(HEADER_WIDTH, std::mem::size_of::<SizeType>());
    }

    #[test]
    fn bool_reads_any_nonzero_as_true() {
        assert!(bool::read_from(&[7]));
        assert!(!bool::read_from(&[0]));
        assert_eq!(encode(&true), vec![1]);
    }

    #[test]
    fn float_roundtrip_preserves_bits() {
        let bytes = encode(&-0.0f64);
        assert_eq!(f64::read_from(&bytes).to_bits(), (-0.0f64).to_bits());
    }

    #[test]
    fn header_read_checks_bounds() {
        let bytes = [6, 0, 0, 0, 9];
        assert_eq!(read_header(&bytes, 0), Some(6));
        assert_eq!(read_header(&bytes, 2), None);
        assert_eq!(read_header(&bytes, usize::MAX), None);
    }
}

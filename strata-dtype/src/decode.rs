use itertools::Itertools;
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::{ElementKind, NativeElement, match_each_element_kind};

/// Decode a little-endian buffer of `kind` elements into typed values.
///
/// Fails with `MismatchedTypes` if `T` is not the Rust type for `kind`, and with `ShapeMismatch`
/// if the buffer is not a whole number of elements.
pub fn decode_elements<T: NativeElement>(kind: ElementKind, bytes: &[u8]) -> StrataResult<Vec<T>> {
    if T::KIND != kind {
        strata_bail!(MismatchedTypes: T::KIND, kind);
    }
    let width = kind.byte_width();
    if bytes.len() % width != 0 {
        strata_bail!(
            ShapeMismatch: "buffer of {} bytes is not a multiple of the {} element width {}",
            bytes.len(),
            kind,
            width
        );
    }
    Ok(bytes.chunks_exact(width).map(T::decode_le).collect())
}

/// Decode a buffer of integer elements of any width into zero-based positions.
///
/// Used for the `shape`, `indices` and `indptr` components of sparse storage, whose integer
/// width is chosen by the writer.
pub fn decode_positions(kind: ElementKind, bytes: &[u8]) -> StrataResult<Vec<usize>> {
    if !kind.is_int() {
        strata_bail!(MismatchedTypes: "integer", kind);
    }
    match_each_element_kind!(kind, |$T| {
        decode_elements::<$T>(kind, bytes)?
            .into_iter()
            .map(|v| {
                v.to_index()
                    .ok_or_else(|| strata_err!("{} value {} is not a valid position", kind, v))
            })
            .try_collect()
    })
}

/// Encode typed values into their little-endian representation.
pub fn encode_elements<T: NativeElement>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * T::KIND.byte_width());
    for v in values {
        v.encode_le(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use strata_error::StrataError;

    use super::*;

    #[test]
    fn decode_roundtrip_i32() {
        let bytes = encode_elements(&[1i32, -2, 3]);
        let values: Vec<i32> = decode_elements(ElementKind::I32, &bytes).unwrap();
        assert_eq!(values, vec![1, -2, 3]);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let bytes = encode_elements(&[1.0f64]);
        let err = decode_elements::<f32>(ElementKind::F64, &bytes).unwrap_err();
        assert!(matches!(err, StrataError::MismatchedTypes { .. }));
    }

    #[test]
    fn ragged_buffer_is_rejected() {
        let err = decode_elements::<u32>(ElementKind::U32, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, StrataError::ShapeMismatch(_)));
    }

    #[test]
    fn positions_of_any_width() {
        let bytes = encode_elements(&[0u16, 4, 9]);
        assert_eq!(
            decode_positions(ElementKind::U16, &bytes).unwrap(),
            vec![0, 4, 9]
        );
        let bytes = encode_elements(&[0i64, -1]);
        assert!(decode_positions(ElementKind::I64, &bytes).is_err());
        let bytes = encode_elements(&[0.5f32]);
        assert!(decode_positions(ElementKind::F32, &bytes).is_err());
    }
}

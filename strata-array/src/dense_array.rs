use strata_dtype::{NativeElement, Shape};
use strata_error::{StrataResult, strata_bail};

/// A fully materialized array.
///
/// Values are stored with the first axis varying fastest, which is the on-disk row-major order
/// read back in caller axis order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseArray<T> {
    shape: Shape,
    values: Vec<T>,
}

impl<T: NativeElement> DenseArray<T> {
    /// Wrap `values`, laid out first axis fastest, as an array of `shape`.
    pub fn try_new(shape: impl Into<Shape>, values: Vec<T>) -> StrataResult<Self> {
        let shape = shape.into();
        if shape.checked_len() != Some(values.len()) {
            strata_bail!(
                ShapeMismatch: "{} values cannot fill an array of shape {}",
                values.len(),
                shape
            );
        }
        Ok(Self { shape, values })
    }

    pub(crate) fn zeros(shape: Shape) -> StrataResult<Self> {
        let Some(len) = shape.checked_len() else {
            strata_bail!("array of shape {} is too large to materialize", shape);
        };
        Ok(Self {
            shape,
            values: vec![T::zero(); len],
        })
    }

    /// The extents, in caller order.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the array holds no element.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values, first axis fastest.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Unwrap into the value buffer, first axis fastest.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// The position of `coords` in [`values`](Self::values), if it is in bounds.
    pub fn offset(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.shape.ndim() {
            return None;
        }
        let mut offset = 0;
        let mut stride = 1;
        for (c, extent) in coords.iter().zip(self.shape.iter()) {
            if c >= extent {
                return None;
            }
            offset += c * stride;
            stride *= extent;
        }
        Some(offset)
    }

    /// The value at `coords`, if it is in bounds.
    pub fn get(&self, coords: &[usize]) -> Option<T> {
        self.offset(coords).map(|o| self.values[o])
    }

    /// The number of non-zero values.
    pub fn count_nonzero(&self) -> usize {
        self.values.iter().filter(|v| !v.is_zero()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_axis_fastest() {
        // 2 x 3, value = 10 * row + col
        let array = DenseArray::try_new([2, 3], vec![0i64, 10, 1, 11, 2, 12]).unwrap();
        assert_eq!(array.get(&[1, 2]), Some(12));
        assert_eq!(array.get(&[0, 1]), Some(1));
        assert_eq!(array.get(&[2, 0]), None);
        assert_eq!(array.get(&[0]), None);
        assert_eq!(array.offset(&[1, 1]), Some(3));
        assert_eq!(array.count_nonzero(), 5);
    }

    #[test]
    fn length_must_match_shape() {
        assert!(DenseArray::try_new([2, 2], vec![1.0f32; 3]).is_err());
        let empty = DenseArray::<u8>::try_new([0, 4], Vec::new()).unwrap();
        assert!(empty.is_empty());
    }
}

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};

use crate::LazyArray;

/// The number of elements a default block holds for contiguous storage.
pub const DEFAULT_BLOCK_ELEMENTS: usize = 1 << 20;

/// Tunables for one extraction.
///
/// Every field is optional; unset fields are derived from the array being read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    block_shape: Option<Vec<usize>>,
    coalescing_window: Option<usize>,
}

impl ExtractOptions {
    /// Group reads into blocks of at most these extents, given in caller axis order.
    ///
    /// Defaults to the dataset's chunk extents for chunked storage, and to
    /// [`default_block_shape`] otherwise.
    pub fn with_block_shape(mut self, block_shape: impl Into<Vec<usize>>) -> Self {
        self.block_shape = Some(block_shape.into());
        self
    }

    /// Merge sparse value reads separated by at most `window` elements.
    ///
    /// Defaults to the storage handle's [`PerformanceHint`](strata_io::PerformanceHint).
    pub fn with_coalescing_window(mut self, window: usize) -> Self {
        self.coalescing_window = Some(window);
        self
    }

    /// The explicit block shape, if one was set.
    pub fn block_shape(&self) -> Option<&[usize]> {
        self.block_shape.as_deref()
    }

    /// The explicit coalescing window, if one was set.
    pub fn coalescing_window(&self) -> Option<usize> {
        self.coalescing_window
    }

    /// The block shape to plan `array` with.
    ///
    /// Fails with `ShapeMismatch` if an explicit block shape has the wrong number of axes and
    /// with `InvalidArgument` if it has a zero extent.
    pub fn resolve_block_shape(&self, array: &LazyArray) -> StrataResult<Vec<usize>> {
        let ndim = array.ndim();
        if let Some(block_shape) = &self.block_shape {
            if block_shape.len() != ndim {
                strata_bail!(
                    ShapeMismatch: "block shape ({}) has {} axes but the array has {}",
                    block_shape.iter().join(", "),
                    block_shape.len(),
                    ndim
                );
            }
            if block_shape.contains(&0) {
                strata_bail!(
                    "block extents must be positive, got ({})",
                    block_shape.iter().join(", ")
                );
            }
            return Ok(block_shape.clone());
        }

        let chunks = match array {
            LazyArray::Dense(source) => source.chunk_shape().map(|c| c.to_vec()),
            LazyArray::Sparse(_) => None,
        };
        Ok(chunks.unwrap_or_else(|| default_block_shape(ndim)))
    }
}

/// A block shape of roughly [`DEFAULT_BLOCK_ELEMENTS`] elements, equal along every axis.
pub fn default_block_shape(ndim: usize) -> Vec<usize> {
    vec![integer_root(DEFAULT_BLOCK_ELEMENTS, ndim).max(1); ndim]
}

/// The largest `r` with `r^k <= n`.
fn integer_root(n: usize, k: usize) -> usize {
    let Ok(k) = u32::try_from(k) else {
        return 1;
    };
    if k == 0 {
        return n;
    }
    let fits = |r: usize| r.checked_pow(k).is_some_and(|p| p <= n);
    let (mut lo, mut hi) = (0usize, n);
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strata_error::StrataError;
    use strata_io::InMemoryDataset;

    use super::*;

    #[rstest]
    #[case(1, vec![1 << 20])]
    #[case(2, vec![1024, 1024])]
    #[case(3, vec![101, 101, 101])]
    #[case(4, vec![32, 32, 32, 32])]
    #[case(0, vec![])]
    fn default_shapes(#[case] ndim: usize, #[case] expected: Vec<usize>) {
        assert_eq!(default_block_shape(ndim), expected);
    }

    #[test]
    fn roots_are_floored() {
        assert_eq!(integer_root(26, 3), 2);
        assert_eq!(integer_root(27, 3), 3);
        assert_eq!(integer_root(1, 40), 1);
    }

    fn dense(chunks: Option<[usize; 2]>) -> LazyArray {
        let ds = InMemoryDataset::try_new([6, 8], &[0u8; 48]).unwrap();
        let ds = match chunks {
            Some(chunks) => ds.with_chunks(chunks).unwrap(),
            None => ds,
        };
        LazyArray::try_new_dense(ds).unwrap()
    }

    #[test]
    fn chunk_extents_are_the_default() {
        let options = ExtractOptions::default();
        assert_eq!(options.resolve_block_shape(&dense(Some([3, 2]))).unwrap(), vec![2, 3]);
        assert_eq!(options.resolve_block_shape(&dense(None)).unwrap(), vec![1024, 1024]);
    }

    #[test]
    fn explicit_block_shape_is_validated() {
        let array = dense(None);
        let err = ExtractOptions::default()
            .with_block_shape([4])
            .resolve_block_shape(&array)
            .unwrap_err();
        assert!(matches!(err, StrataError::ShapeMismatch(_)));

        let err = ExtractOptions::default()
            .with_block_shape([4, 0])
            .resolve_block_shape(&array)
            .unwrap_err();
        assert!(matches!(err, StrataError::InvalidArgument(_)));

        let options = ExtractOptions::default()
            .with_block_shape([5, 1])
            .with_coalescing_window(16);
        assert_eq!(options.resolve_block_shape(&array).unwrap(), vec![5, 1]);
        assert_eq!(options.coalescing_window(), Some(16));
    }
}

use std::iter;

use strata_dtype::{NativeElement, Shape};
use strata_error::{StrataResult, strata_bail};

use crate::DenseArray;

/// A sparse matrix in compressed sparse column form.
///
/// Column `c` holds the entries `indices[indptr[c]..indptr[c + 1]]` and
/// `data[indptr[c]..indptr[c + 1]]`. Row indices are ascending within each column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CscMatrix<T> {
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<T>,
}

impl<T: NativeElement> CscMatrix<T> {
    /// Build a matrix from a CSC triple, checking every structural invariant.
    pub fn try_new(
        nrows: usize,
        ncols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<T>,
    ) -> StrataResult<Self> {
        if indptr.len().checked_sub(1) != Some(ncols) {
            strata_bail!(
                ShapeMismatch: "indptr has {} entries, expected one more than {} columns",
                indptr.len(),
                ncols
            );
        }
        if indices.len() != data.len() {
            strata_bail!(
                ShapeMismatch: "{} indices but {} data values",
                indices.len(),
                data.len()
            );
        }
        if indptr.first() != Some(&0) || indptr.last() != Some(&data.len()) {
            strata_bail!(
                ShapeMismatch: "indptr must run from 0 to {}",
                data.len()
            );
        }
        if let Some(c) = indptr.windows(2).position(|w| w[0] > w[1]) {
            strata_bail!(ShapeMismatch: "indptr decreases at column {}", c);
        }
        for (c, bounds) in indptr.windows(2).enumerate() {
            let rows = &indices[bounds[0]..bounds[1]];
            if rows.windows(2).any(|w| w[0] >= w[1]) {
                strata_bail!("rows of column {} are not strictly ascending", c);
            }
            if let Some(row) = rows.last().filter(|r| **r >= nrows) {
                strata_bail!(IndexOutOfRange: 0, *row, nrows);
            }
        }
        Ok(Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        })
    }

    /// A matrix with `nrows` rows and no columns yet.
    pub(crate) fn with_rows(nrows: usize) -> Self {
        Self {
            nrows,
            ncols: 0,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Append one column given as `(row, value)` pairs with strictly ascending rows.
    pub(crate) fn push_column(&mut self, entries: impl IntoIterator<Item = (usize, T)>) {
        for (row, value) in entries {
            self.indices.push(row);
            self.data.push(value);
        }
        self.indptr.push(self.data.len());
        self.ncols += 1;
    }

    /// Append every column of `other`, which must have the same number of rows.
    pub(crate) fn append_columns(&mut self, other: &CscMatrix<T>) {
        let base = self.data.len();
        self.indices.extend_from_slice(&other.indices);
        self.data.extend_from_slice(&other.data);
        self.indptr
            .extend(other.indptr.iter().skip(1).map(|p| base + p));
        self.ncols += other.ncols;
    }

    /// Compress a two-dimensional dense array, dropping zero values.
    pub fn from_dense(dense: &DenseArray<T>) -> StrataResult<Self> {
        let &[nrows, ncols] = dense.shape().dims() else {
            strata_bail!(
                UnsupportedLayout: "compressed sparse columns need 2 dimensions, got {}",
                dense.ndim()
            );
        };
        let mut csc = Self::with_rows(nrows);
        if nrows == 0 {
            for _ in 0..ncols {
                csc.push_column(iter::empty());
            }
            return Ok(csc);
        }
        for column in dense.values().chunks_exact(nrows) {
            csc.push_column(
                column
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_zero())
                    .map(|(row, v)| (row, *v)),
            );
        }
        Ok(csc)
    }

    /// Expand into a dense array, filling absent entries with zero.
    pub fn to_dense(&self) -> StrataResult<DenseArray<T>> {
        let mut dense = DenseArray::zeros(self.shape())?;
        let values = dense.values_mut();
        for (row, col, value) in self.iter() {
            values[col * self.nrows + row] = value;
        }
        Ok(dense)
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> Shape {
        Shape::from([self.nrows, self.ncols])
    }

    /// The number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// The number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// The number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column offsets into [`indices`](Self::indices) and [`data`](Self::data).
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// The row of each stored entry.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The value of each stored entry.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// The rows and values stored in column `col`.
    pub fn column(&self, col: usize) -> Option<(&[usize], &[T])> {
        let start = *self.indptr.get(col)?;
        let end = *self.indptr.get(col + 1)?;
        Some((&self.indices[start..end], &self.data[start..end]))
    }

    /// The value at `(row, col)`, zero if not stored, `None` if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.nrows {
            return None;
        }
        let (rows, values) = self.column(col)?;
        Some(
            rows.binary_search(&row)
                .map_or_else(|_| T::zero(), |i| values[i]),
        )
    }

    /// Iterate `(row, col, value)` for every stored entry in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.ncols).flat_map(move |col| {
            let range = self.indptr[col]..self.indptr[col + 1];
            self.indices[range.clone()]
                .iter()
                .zip(&self.data[range])
                .map(move |(row, value)| (*row, col, *value))
        })
    }
}

#[cfg(test)]
mod tests {
    use strata_error::StrataError;

    use super::*;

    fn sample() -> CscMatrix<f64> {
        // [[1, 0, 0],
        //  [0, 0, 3],
        //  [2, 0, 4]]
        CscMatrix::try_new(3, 3, vec![0, 2, 2, 4], vec![0, 2, 1, 2], vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
    }

    #[test]
    fn element_access() {
        let m = sample();
        assert_eq!(m.get(2, 0), Some(2.0));
        assert_eq!(m.get(1, 1), Some(0.0));
        assert_eq!(m.get(3, 0), None);
        assert_eq!(m.get(0, 3), None);
        assert_eq!(m.column(2), Some((&[1usize, 2][..], &[3.0, 4.0][..])));
    }

    #[test]
    fn dense_round_trip() {
        let m = sample();
        let dense = m.to_dense().unwrap();
        assert_eq!(
            dense.values(),
            &[1.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 3.0, 4.0]
        );
        assert_eq!(CscMatrix::from_dense(&dense).unwrap(), m);
    }

    #[test]
    fn invariants_are_checked() {
        let err = CscMatrix::try_new(3, 2, vec![0, 1], vec![0], vec![1u8]).unwrap_err();
        assert!(matches!(err, StrataError::ShapeMismatch(_)));
        let err = CscMatrix::try_new(3, 1, vec![0, 2], vec![0], vec![1u8, 2]).unwrap_err();
        assert!(matches!(err, StrataError::ShapeMismatch(_)));
        let err = CscMatrix::try_new(3, 1, vec![0, 1], vec![3], vec![1u8]).unwrap_err();
        assert!(matches!(err, StrataError::IndexOutOfRange { .. }));
        let err = CscMatrix::try_new(3, 1, vec![0, 2], vec![2, 1], vec![1u8, 2]).unwrap_err();
        assert!(matches!(err, StrataError::InvalidArgument(_)));
    }

    #[test]
    fn overflowing_column_count_is_a_shape_mismatch() {
        let err = CscMatrix::<f64>::try_new(2, usize::MAX, vec![0], vec![], vec![]).unwrap_err();
        assert!(matches!(err, StrataError::ShapeMismatch(_)));
    }

    #[test]
    fn append_columns_rebases_offsets() {
        let mut m = CscMatrix::<f64>::with_rows(3);
        m.push_column([(1, 5.0)]);
        m.append_columns(&sample());
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.indptr(), &[0, 1, 3, 3, 5]);
        assert_eq!(m.get(2, 3), Some(4.0));
        assert_eq!(m.iter().count(), 5);
    }

    #[test]
    fn three_dimensions_cannot_compress() {
        let dense = DenseArray::try_new([1, 1, 1], vec![1i8]).unwrap();
        assert!(matches!(
            CscMatrix::from_dense(&dense).unwrap_err(),
            StrataError::UnsupportedLayout(_)
        ));
    }
}

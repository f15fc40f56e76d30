use itertools::Itertools;
use strata_dtype::NativeElement;
use strata_error::{StrataResult, strata_err};

use crate::{
    AxisSelection, CscMatrix, DenseArray, DenseExtractor, ExtractOptions, LazyArray,
    ResolvedSelection, SparseCscExtractor, ViewArena, ViewId,
};

impl LazyArray {
    /// Materialize `selection` densely, dispatching on the storage layout.
    pub fn extract_dense<T: NativeElement>(
        &self,
        selection: &ResolvedSelection,
        options: &ExtractOptions,
    ) -> StrataResult<DenseArray<T>> {
        let block_shape = options.resolve_block_shape(self)?;
        match self {
            Self::Dense(source) => DenseExtractor::new(source, block_shape).extract(selection),
            Self::Sparse(source) => {
                SparseCscExtractor::new(source, column_block(&block_shape), options.coalescing_window())
                    .extract_dense(selection)
            }
        }
    }

    /// Materialize `selection` as compressed sparse columns, dispatching on the storage layout.
    ///
    /// Dense storage is read in column groups and its zeros dropped; no sparsity check is made.
    /// Fails with `UnsupportedLayout` unless the array has two dimensions.
    pub fn extract_sparse<T: NativeElement>(
        &self,
        selection: &ResolvedSelection,
        options: &ExtractOptions,
    ) -> StrataResult<CscMatrix<T>> {
        if self.ndim() != 2 {
            return Err(strata_err!(
                UnsupportedLayout: "sparse extraction needs 2 dimensions, got {}",
                self.ndim()
            ));
        }
        let block_shape = options.resolve_block_shape(self)?;
        match self {
            Self::Dense(source) => {
                DenseExtractor::new(source, block_shape).extract_sparse(selection)
            }
            Self::Sparse(source) => {
                SparseCscExtractor::new(source, column_block(&block_shape), options.coalescing_window())
                    .extract_sparse(selection)
            }
        }
    }

    /// Materialize the whole array densely.
    pub fn to_dense<T: NativeElement>(&self) -> StrataResult<DenseArray<T>> {
        self.extract_dense(
            &ResolvedSelection::full(self.shape().clone()),
            &ExtractOptions::default(),
        )
    }

    /// Materialize the whole array as compressed sparse columns.
    pub fn to_sparse<T: NativeElement>(&self) -> StrataResult<CscMatrix<T>> {
        self.extract_sparse(
            &ResolvedSelection::full(self.shape().clone()),
            &ExtractOptions::default(),
        )
    }
}

fn column_block(block_shape: &[usize]) -> usize {
    block_shape.get(1).copied().unwrap_or(1)
}

impl ViewArena {
    /// Materialize a view densely.
    pub fn extract_dense<T: NativeElement>(
        &self,
        view: ViewId,
        options: &ExtractOptions,
    ) -> StrataResult<DenseArray<T>> {
        self.array().extract_dense(&self.resolve(view)?, options)
    }

    /// Materialize `selections` taken out of a view densely, without adding a view to the tree.
    pub fn extract_dense_with<T: NativeElement>(
        &self,
        view: ViewId,
        selections: &[AxisSelection],
        options: &ExtractOptions,
    ) -> StrataResult<DenseArray<T>> {
        self.array()
            .extract_dense(&self.resolve_with(view, selections)?, options)
    }

    /// Materialize a two-dimensional view as compressed sparse columns.
    pub fn extract_sparse<T: NativeElement>(
        &self,
        view: ViewId,
        options: &ExtractOptions,
    ) -> StrataResult<CscMatrix<T>> {
        self.array().extract_sparse(&self.resolve(view)?, options)
    }

    /// Materialize `selections` taken out of a two-dimensional view as compressed sparse
    /// columns, without adding a view to the tree.
    pub fn extract_sparse_with<T: NativeElement>(
        &self,
        view: ViewId,
        selections: &[AxisSelection],
        options: &ExtractOptions,
    ) -> StrataResult<CscMatrix<T>> {
        self.array()
            .extract_sparse(&self.resolve_with(view, selections)?, options)
    }

    /// Materialize a whole view densely with default options.
    pub fn to_dense<T: NativeElement>(&self, view: ViewId) -> StrataResult<DenseArray<T>> {
        self.extract_dense(view, &ExtractOptions::default())
    }

    /// Materialize a whole two-dimensional view as compressed sparse columns with default
    /// options.
    pub fn to_sparse<T: NativeElement>(&self, view: ViewId) -> StrataResult<CscMatrix<T>> {
        self.extract_sparse(view, &ExtractOptions::default())
    }

    /// Read the single element of a view at `coords`.
    pub fn get<T: NativeElement>(&self, view: ViewId, coords: &[usize]) -> StrataResult<T> {
        let selections = coords.iter().map(|c| AxisSelection::Scalar(*c)).collect_vec();
        self.extract_dense_with::<T>(view, &selections, &ExtractOptions::default())?
            .values()
            .first()
            .copied()
            .ok_or_else(|| strata_err!("no element at ({})", coords.iter().join(", ")))
    }
}

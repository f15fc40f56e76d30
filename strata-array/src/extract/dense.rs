use strata_dtype::{NativeElement, decode_elements};
use strata_error::{StrataResult, strata_bail};

use crate::planner::{Block, BlockPlan, BlockPlanner};
use crate::{CscMatrix, DenseArray, DenseSource, ResolvedSelection, order};

/// Materializes selections of a dense dataset block by block.
pub struct DenseExtractor<'a> {
    source: &'a DenseSource,
    planner: BlockPlanner,
}

impl<'a> DenseExtractor<'a> {
    /// An extractor reading `source` in blocks of `block_shape`, in caller order.
    pub fn new(source: &'a DenseSource, block_shape: Vec<usize>) -> Self {
        Self {
            source,
            planner: BlockPlanner::new(block_shape),
        }
    }

    /// The plan `extract` would execute for `selection`.
    pub fn plan(&self, selection: &ResolvedSelection) -> StrataResult<BlockPlan> {
        self.planner.plan(selection.axes(), selection.root_shape())
    }

    /// Read `selection` into a dense array.
    ///
    /// One `read_block` is issued per planned block. The first failed read aborts the
    /// extraction.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn extract<T: NativeElement>(
        &self,
        selection: &ResolvedSelection,
    ) -> StrataResult<DenseArray<T>> {
        if T::KIND != self.source.element_kind() {
            strata_bail!(MismatchedTypes: T::KIND, self.source.element_kind());
        }
        if selection.root_shape() != self.source.shape() {
            strata_bail!(
                ShapeMismatch: "selection over shape {} applied to an array of shape {}",
                selection.root_shape(),
                self.source.shape()
            );
        }

        let plan = self.plan(selection)?;
        let mut output = DenseArray::<T>::zeros(plan.output_shape())?;
        let strides = output.shape().strides();

        for block in plan.blocks() {
            let ranges = order::block_to_disk(&block.ranges());
            let bytes = self.source.handle().read_block(&ranges)?;
            let values = decode_elements::<T>(self.source.element_kind(), &bytes)?;
            let expected = block.shape().checked_len().unwrap_or(usize::MAX);
            if values.len() != expected {
                strata_bail!(
                    ShapeMismatch: "storage returned {} elements for a block of shape {}",
                    values.len(),
                    block.shape()
                );
            }
            log::trace!("scattering block of shape {}", block.shape());
            scatter(&block, &values, output.values_mut(), &strides);
        }

        Ok(output)
    }

    /// Read `selection` of a two-dimensional dataset into compressed sparse columns, dropping
    /// zeros.
    ///
    /// Columns are extracted in groups of the planner's column extent, so at most one group is
    /// held densely at a time.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn extract_sparse<T: NativeElement>(
        &self,
        selection: &ResolvedSelection,
    ) -> StrataResult<CscMatrix<T>> {
        let &[nrows, ncols] = selection.shape().dims() else {
            strata_bail!(
                UnsupportedLayout: "sparse extraction needs 2 dimensions, got {}",
                selection.ndim()
            );
        };
        let group = self.planner.block_shape().get(1).copied().unwrap_or(1).max(1);

        let mut csc = CscMatrix::with_rows(nrows);
        let mut start = 0;
        while start < ncols {
            let end = (start + group).min(ncols);
            let columns = selection.compose(&[(0..nrows).into(), (start..end).into()])?;
            let dense = self.extract::<T>(&columns)?;
            csc.append_columns(&CscMatrix::from_dense(&dense)?);
            start = end;
        }
        Ok(csc)
    }
}

/// Copy every value a block answers into `out`.
///
/// `values` holds the block's hyperslab with the first axis fastest; `strides` are the output
/// strides.
fn scatter<T: Copy>(block: &Block<'_>, values: &[T], out: &mut [T], strides: &[usize]) {
    let axes = block.axes();
    if axes.is_empty() {
        out[0] = values[0];
        return;
    }
    let block_strides = block.shape().strides();
    let picks = axes.iter().map(|a| a.picks()).collect::<Vec<_>>();
    if picks.iter().any(|p| p.is_empty()) {
        return;
    }

    let mut cursor = vec![0usize; axes.len()];
    loop {
        let (mut o, mut i) = (0, 0);
        for (axis, k) in cursor.iter().enumerate() {
            let (out_pos, offset) = picks[axis][*k];
            o += out_pos * strides[axis];
            i += offset * block_strides[axis];
        }
        out[o] = values[i];

        let mut axis = 0;
        loop {
            cursor[axis] += 1;
            if cursor[axis] < picks[axis].len() {
                break;
            }
            cursor[axis] = 0;
            axis += 1;
            if axis == axes.len() {
                return;
            }
        }
    }
}

use std::ops::Range;

use hashbrown::HashMap;
use strata_dtype::{NativeElement, decode_elements, decode_positions};
use strata_error::{StrataResult, strata_bail};
use strata_io::{SparseComponent, read_ranges};

use crate::planner::BlockPlanner;
use crate::{AxisSelection, CscMatrix, DenseArray, ResolvedSelection, SparseSource};

/// Extracts selections of a CSC group.
///
/// Columns are planned in blocks of `column_block`: each block costs one `indptr` read, and the
/// `indices` and `data` spans of its columns are fetched with reads coalesced across gaps of up
/// to the coalescing window.
pub struct SparseCscExtractor<'a> {
    source: &'a SparseSource,
    column_block: usize,
    coalescing_window: Option<usize>,
}

impl<'a> SparseCscExtractor<'a> {
    /// An extractor over `source`. Without an explicit coalescing window the `data` handle's
    /// [`PerformanceHint`](strata_io::PerformanceHint) is used.
    pub fn new(
        source: &'a SparseSource,
        column_block: usize,
        coalescing_window: Option<usize>,
    ) -> Self {
        Self {
            source,
            column_block,
            coalescing_window,
        }
    }

    /// Read `selection` into a dense array, zero-filling unstored entries.
    pub fn extract_dense<T: NativeElement>(
        &self,
        selection: &ResolvedSelection,
    ) -> StrataResult<DenseArray<T>> {
        self.extract_sparse::<T>(selection)?.to_dense()
    }

    /// Read `selection` into compressed sparse columns.
    ///
    /// Output columns follow the requested column order, repeats included. Within a column the
    /// output rows are ascending; a repeated requested row yields one entry per occurrence.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn extract_sparse<T: NativeElement>(
        &self,
        selection: &ResolvedSelection,
    ) -> StrataResult<CscMatrix<T>> {
        if T::KIND != self.source.element_kind() {
            strata_bail!(MismatchedTypes: T::KIND, self.source.element_kind());
        }
        if selection.root_shape() != self.source.shape() {
            strata_bail!(
                ShapeMismatch: "selection over shape {} applied to a sparse matrix of shape {}",
                selection.root_shape(),
                self.source.shape()
            );
        }
        let nnz = self.source.checked_nnz()?;

        let (nrows, ncols) = (self.source.shape()[0], self.source.shape()[1]);
        let [rows, cols] = selection.axes() else {
            strata_bail!(
                UnsupportedLayout: "sparse extraction needs 2 dimensions, got {}",
                selection.ndim()
            );
        };
        let lookup = RowLookup::new(rows, nrows);
        let out_rows = rows.len(nrows);

        let indptr_kind = self.source.component(SparseComponent::Indptr)?.element_kind();
        let indices_ds = self.source.component(SparseComponent::Indices)?;
        let data_ds = self.source.component(SparseComponent::Data)?;
        let window = self
            .coalescing_window
            .unwrap_or_else(|| data_ds.performance_hint().coalescing_window());

        let plan = BlockPlanner::plan_axis(cols, ncols, self.column_block);
        log::debug!(
            "extracting {} of {} columns in {} blocks, coalescing window {}",
            plan.len(),
            ncols,
            plan.blocks().len(),
            window
        );

        let mut columns: Vec<Vec<(usize, T)>> = vec![Vec::new(); plan.len()];
        for block in plan.blocks() {
            let span = block.span();
            let ptr = decode_positions(
                indptr_kind,
                &self
                    .source
                    .group()
                    .read_range(SparseComponent::Indptr, span.start..span.end + 1)?,
            )?;
            if ptr.len() != span.len() + 1 {
                strata_bail!(
                    ShapeMismatch: "read {} indptr entries for {} columns",
                    ptr.len(),
                    span.len()
                );
            }

            let spans = block
                .picks()
                .iter()
                .map(|(_, offset)| value_span(&ptr, *offset, nnz))
                .collect::<StrataResult<Vec<Range<usize>>>>()?;
            let indices = read_ranges(indices_ds, &spans, window)?;
            let data = read_ranges(data_ds, &spans, window)?;

            for (((out_col, _), index_bytes), data_bytes) in
                block.picks().iter().zip(&indices).zip(&data)
            {
                let stored_rows = decode_positions(indices_ds.element_kind(), index_bytes)?;
                let values = decode_elements::<T>(data_ds.element_kind(), data_bytes)?;
                if stored_rows.len() != values.len() {
                    strata_bail!(
                        ShapeMismatch: "read {} row indices but {} values for one column",
                        stored_rows.len(),
                        values.len()
                    );
                }

                let entries = &mut columns[*out_col];
                for (row, value) in stored_rows.into_iter().zip(values) {
                    if row >= nrows {
                        strata_bail!(IndexOutOfRange: 0, row, nrows);
                    }
                    lookup.for_each_output(row, |out_row| entries.push((out_row, value)));
                }
                entries.sort_by_key(|(out_row, _)| *out_row);
            }
        }

        let mut csc = CscMatrix::with_rows(out_rows);
        for entries in columns {
            csc.push_column(entries);
        }
        Ok(csc)
    }
}

/// The `indices`/`data` span of the column at `offset` within a block's `indptr` read.
fn value_span(ptr: &[usize], offset: usize, nnz: usize) -> StrataResult<Range<usize>> {
    let (start, end) = (ptr[offset], ptr[offset + 1]);
    if start > end || end > nnz {
        strata_bail!(
            ShapeMismatch: "indptr span {}..{} is invalid for {} stored values",
            start,
            end,
            nnz
        );
    }
    Ok(start..end)
}

/// Maps an absolute row to the output rows that request it.
enum RowLookup {
    Contiguous(Range<usize>),
    Scattered(HashMap<usize, Vec<usize>>),
}

impl RowLookup {
    fn new(rows: &AxisSelection, nrows: usize) -> Self {
        if let Some(range) = rows.as_contiguous(nrows) {
            return Self::Contiguous(range);
        }
        let mut outputs: HashMap<usize, Vec<usize>> = HashMap::new();
        for (out_row, row) in rows.positions(nrows).enumerate() {
            outputs.entry(row).or_default().push(out_row);
        }
        Self::Scattered(outputs)
    }

    fn for_each_output(&self, row: usize, mut f: impl FnMut(usize)) {
        match self {
            Self::Contiguous(range) => {
                if range.contains(&row) {
                    f(row - range.start);
                }
            }
            Self::Scattered(outputs) => {
                if let Some(out_rows) = outputs.get(&row) {
                    out_rows.iter().copied().for_each(f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;
    use strata_error::StrataError;
    use strata_io::{InMemoryGroup, InstrumentedGroup};
    use strata_metrics::StrataMetrics;

    use super::*;
    use crate::LazyArray;

    // 5 x 4
    // [[1, 0, 0, 6],
    //  [0, 3, 0, 0],
    //  [0, 4, 0, 0],
    //  [2, 0, 0, 0],
    //  [0, 5, 0, 7]]
    fn group() -> InMemoryGroup {
        InMemoryGroup::from_csc(
            5,
            4,
            &[0, 2, 5, 5, 7],
            &[0, 3, 1, 2, 4, 0, 4],
            &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        )
    }

    fn source(array: &LazyArray) -> &SparseSource {
        let LazyArray::Sparse(source) = array else {
            unreachable!()
        };
        source
    }

    fn select(array: &LazyArray, rows: AxisSelection, cols: AxisSelection) -> ResolvedSelection {
        ResolvedSelection::full(array.shape().clone())
            .compose(&[rows, cols])
            .unwrap()
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(4)]
    fn duplicate_rows_and_columns(#[case] column_block: usize) {
        let array = LazyArray::try_new_sparse(group()).unwrap();
        let selection = select(
            &array,
            AxisSelection::from([4, 0, 0, 2]),
            AxisSelection::from([3, 1, 3]),
        );
        let extractor = SparseCscExtractor::new(source(&array), column_block, None);

        let csc = extractor.extract_sparse::<f64>(&selection).unwrap();
        assert_eq!(csc.shape().dims(), &[4, 3]);
        assert_eq!(csc.indptr(), &[0, 3, 5, 8]);
        assert_eq!(csc.indices(), &[0, 1, 2, 0, 3, 0, 1, 2]);
        assert_eq!(csc.data(), &[7.0, 6.0, 6.0, 5.0, 4.0, 7.0, 6.0, 6.0]);

        let dense = extractor.extract_dense::<f64>(&selection).unwrap();
        assert_eq!(
            dense.values(),
            &[7.0, 6.0, 6.0, 0.0, 5.0, 0.0, 0.0, 4.0, 7.0, 6.0, 6.0, 0.0]
        );
    }

    #[test]
    fn contiguous_rows() {
        let array = LazyArray::try_new_sparse(group()).unwrap();
        let selection = select(&array, AxisSelection::Slice(1..5), AxisSelection::Full);
        let csc = SparseCscExtractor::new(source(&array), 1024, None)
            .extract_sparse::<f64>(&selection)
            .unwrap();
        assert_eq!(csc.indptr(), &[0, 1, 4, 4, 5]);
        assert_eq!(csc.indices(), &[2, 0, 1, 3, 3]);
        assert_eq!(csc.data(), &[2.0, 3.0, 4.0, 5.0, 7.0]);
    }

    #[test]
    fn reads_are_coalesced() {
        let metrics = Arc::new(StrataMetrics::default());
        let array =
            LazyArray::try_new_sparse(InstrumentedGroup::new(group(), metrics.clone())).unwrap();
        let opened = metrics.read_stats().reads;
        let selection = select(&array, AxisSelection::Full, AxisSelection::from([0, 3]));

        SparseCscExtractor::new(source(&array), 4, Some(16))
            .extract_sparse::<f64>(&selection)
            .unwrap();
        // one indptr read, then one read each for indices and data
        assert_eq!(metrics.read_stats().reads - opened, 3);

        let before = metrics.read_stats().reads;
        SparseCscExtractor::new(source(&array), 4, Some(0))
            .extract_sparse::<f64>(&selection)
            .unwrap();
        assert_eq!(metrics.read_stats().reads - before, 5);
    }

    #[test]
    fn broken_triple_reads_nothing() {
        let metrics = Arc::new(StrataMetrics::default());
        // indptr is one entry short for 4 columns
        let broken = InMemoryGroup::from_csc(
            5,
            4,
            &[0, 2, 5, 7],
            &[0, 3, 1, 2, 4, 0, 4],
            &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        );
        let array = LazyArray::try_new_sparse(InstrumentedGroup::new(broken, metrics.clone()))
            .unwrap();
        let opened = metrics.read_stats().reads;
        let err = SparseCscExtractor::new(source(&array), 4, None)
            .extract_sparse::<f64>(&ResolvedSelection::full(array.shape().clone()))
            .unwrap_err();
        assert!(matches!(err, StrataError::ShapeMismatch(_)));
        assert_eq!(metrics.read_stats().reads, opened);
    }

    #[test]
    fn wrong_value_type() {
        let array = LazyArray::try_new_sparse(group()).unwrap();
        let err = SparseCscExtractor::new(source(&array), 4, None)
            .extract_sparse::<f32>(&ResolvedSelection::full(array.shape().clone()))
            .unwrap_err();
        assert!(matches!(err, StrataError::MismatchedTypes { .. }));
    }

    #[test]
    fn empty_selection() {
        let array = LazyArray::try_new_sparse(group()).unwrap();
        let selection = select(&array, AxisSelection::from(Vec::new()), AxisSelection::from([1]));
        let csc = SparseCscExtractor::new(source(&array), 4, None)
            .extract_sparse::<f64>(&selection)
            .unwrap();
        assert_eq!(csc.shape().dims(), &[0, 1]);
        assert_eq!(csc.nnz(), 0);
    }
}

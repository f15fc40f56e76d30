use std::sync::Arc;

use strata_dtype::{ElementKind, Shape, decode_positions};
use strata_error::{StrataResult, strata_bail, strata_err};
use strata_io::{ChunkLayout, DatasetHandle, GroupHandle, SparseComponent};

use crate::order;

/// A read-only array backed by external storage.
///
/// Construction inspects metadata only; no element is read until an extraction is requested.
/// Cloning is cheap and shares the underlying handle.
#[derive(Clone)]
pub enum LazyArray {
    /// Every element is stored explicitly in one dataset.
    Dense(DenseSource),
    /// A two-dimensional matrix stored as a compressed sparse column group.
    Sparse(SparseSource),
}

impl LazyArray {
    /// Wrap a dense dataset.
    ///
    /// The caller-facing shape is the reverse of the dataset's on-disk shape.
    pub fn try_new_dense<D: DatasetHandle + 'static>(handle: D) -> StrataResult<Self> {
        DenseSource::try_new(Arc::new(handle)).map(Self::Dense)
    }

    /// Wrap a sparse CSC group, reading its `shape` record.
    pub fn try_new_sparse<G: GroupHandle + 'static>(group: G) -> StrataResult<Self> {
        SparseSource::try_new(Arc::new(group)).map(Self::Sparse)
    }

    /// The caller-facing shape.
    pub fn shape(&self) -> &Shape {
        match self {
            Self::Dense(source) => &source.shape,
            Self::Sparse(source) => &source.shape,
        }
    }

    /// The number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape().ndim()
    }

    /// The type of the stored elements.
    pub fn element_kind(&self) -> ElementKind {
        match self {
            Self::Dense(source) => source.kind,
            Self::Sparse(source) => source.kind,
        }
    }

    /// Whether the array is stored in compressed sparse column form.
    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }
}

/// A dense dataset with its metadata translated to caller axis order.
#[derive(Clone)]
pub struct DenseSource {
    handle: Arc<dyn DatasetHandle>,
    shape: Shape,
    kind: ElementKind,
    chunks: Option<Shape>,
}

impl DenseSource {
    fn try_new(handle: Arc<dyn DatasetHandle>) -> StrataResult<Self> {
        let disk_shape = handle.shape();
        let chunks = match handle.chunk_layout() {
            ChunkLayout::Contiguous => None,
            ChunkLayout::Chunked(chunks) => {
                if chunks.ndim() != disk_shape.ndim() {
                    strata_bail!(
                        ShapeMismatch: "chunk shape {} does not match dataset shape {}",
                        chunks,
                        disk_shape
                    );
                }
                if chunks.contains(&0) {
                    strata_bail!("chunk extents must be positive, got {}", chunks);
                }
                Some(order::shape_to_caller(&chunks))
            }
        };
        Ok(Self {
            shape: order::shape_to_caller(&disk_shape),
            kind: handle.element_kind(),
            chunks,
            handle,
        })
    }

    /// The storage handle.
    pub fn handle(&self) -> &dyn DatasetHandle {
        self.handle.as_ref()
    }

    /// The caller-facing shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The stored element type.
    pub fn element_kind(&self) -> ElementKind {
        self.kind
    }

    /// The chunk extents in caller order, if the dataset is chunked.
    pub fn chunk_shape(&self) -> Option<&Shape> {
        self.chunks.as_ref()
    }
}

/// A CSC group whose component datasets have been checked to exist.
#[derive(Clone)]
pub struct SparseSource {
    group: Arc<dyn GroupHandle>,
    shape: Shape,
    kind: ElementKind,
}

impl SparseSource {
    fn try_new(group: Arc<dyn GroupHandle>) -> StrataResult<Self> {
        for component in SparseComponent::ALL {
            component_of(group.as_ref(), component)?;
        }

        let shape_ds = component_of(group.as_ref(), SparseComponent::Shape)?;
        if shape_ds.shape().dims() != [2] {
            strata_bail!(
                ShapeMismatch: "sparse shape record must hold 2 values, found shape {}",
                shape_ds.shape()
            );
        }
        for component in [SparseComponent::Indices, SparseComponent::Indptr] {
            let kind = component_of(group.as_ref(), component)?.element_kind();
            if !kind.is_int() {
                strata_bail!(MismatchedTypes: "integer", kind);
            }
        }

        let record = group.read_range(SparseComponent::Shape, 0..2)?;
        let dims = decode_positions(shape_ds.element_kind(), &record)?;
        if dims.len() != 2 {
            strata_bail!(
                ShapeMismatch: "sparse shape record returned {} values",
                dims.len()
            );
        }
        let kind = component_of(group.as_ref(), SparseComponent::Data)?.element_kind();
        log::debug!("opened sparse {}x{} {} matrix", dims[0], dims[1], kind);

        Ok(Self {
            shape: Shape::from(dims),
            kind,
            group,
        })
    }

    /// The storage group.
    pub fn group(&self) -> &dyn GroupHandle {
        self.group.as_ref()
    }

    /// One component dataset of the group.
    pub fn component(&self, component: SparseComponent) -> StrataResult<&dyn DatasetHandle> {
        component_of(self.group.as_ref(), component)
    }

    /// The logical `(rows, cols)` shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The type of the stored non-zero values.
    pub fn element_kind(&self) -> ElementKind {
        self.kind
    }

    /// The number of stored non-zero entries.
    ///
    /// Checks the CSC triple against the logical shape first: `indices` and `data` must be
    /// one-dimensional with equal lengths and `indptr` must hold `cols + 1` entries. Only
    /// metadata is consulted.
    pub fn checked_nnz(&self) -> StrataResult<usize> {
        let extent = |component: SparseComponent| -> StrataResult<usize> {
            let shape = self.component(component)?.shape();
            match shape.dims() {
                [n] => Ok(*n),
                _ => Err(strata_err!(
                    ShapeMismatch: "sparse '{}' dataset must be one-dimensional, found shape {}",
                    component,
                    shape
                )),
            }
        };
        let data = extent(SparseComponent::Data)?;
        let indices = extent(SparseComponent::Indices)?;
        let indptr = extent(SparseComponent::Indptr)?;
        if indices != data {
            strata_bail!(
                ShapeMismatch: "sparse group has {} indices but {} data values",
                indices,
                data
            );
        }
        if indptr.checked_sub(1) != Some(self.shape[1]) {
            strata_bail!(
                ShapeMismatch: "indptr has {} entries, expected one more than {} columns",
                indptr,
                self.shape[1]
            );
        }
        Ok(data)
    }
}

fn component_of(
    group: &dyn GroupHandle,
    component: SparseComponent,
) -> StrataResult<&dyn DatasetHandle> {
    group
        .dataset(component)
        .ok_or_else(|| strata_err!(UnsupportedLayout: "sparse group has no '{}' dataset", component))
}

#[cfg(test)]
mod tests {
    use strata_error::StrataError;
    use strata_io::{InMemoryDataset, InMemoryGroup};

    use super::*;

    #[test]
    fn dense_shape_is_reversed() {
        let ds = InMemoryDataset::try_new([10, 20], &vec![0.0f32; 200])
            .unwrap()
            .with_chunks([5, 4])
            .unwrap();
        let array = LazyArray::try_new_dense(ds).unwrap();
        assert_eq!(array.shape(), &Shape::from([20, 10]));
        assert_eq!(array.element_kind(), ElementKind::F32);
        assert!(!array.is_sparse());
        let LazyArray::Dense(source) = &array else {
            unreachable!()
        };
        assert_eq!(source.chunk_shape(), Some(&Shape::from([4, 5])));
    }

    #[test]
    fn sparse_reads_shape_record() {
        let group = InMemoryGroup::from_csc(3, 2, &[0, 1, 3], &[2, 0, 1], &[1i32, 2, 3]);
        let array = LazyArray::try_new_sparse(group).unwrap();
        assert!(array.is_sparse());
        assert_eq!(array.shape(), &Shape::from([3, 2]));
        assert_eq!(array.ndim(), 2);
        assert_eq!(array.element_kind(), ElementKind::I32);
        let LazyArray::Sparse(source) = &array else {
            unreachable!()
        };
        assert_eq!(source.checked_nnz().unwrap(), 3);
    }

    #[test]
    fn missing_component_is_unsupported() {
        let group = InMemoryGroup::from_csc(3, 2, &[0, 1, 3], &[2, 0, 1], &[1i32, 2, 3])
            .without_component(SparseComponent::Indptr);
        let err = LazyArray::try_new_sparse(group).err().unwrap();
        assert!(matches!(err, StrataError::UnsupportedLayout(_)));
        assert!(err.to_string().contains("indptr"));
    }

    #[test]
    fn float_positions_are_rejected() {
        let group = InMemoryGroup::from_csc(3, 2, &[0, 1, 3], &[2, 0, 1], &[1i32, 2, 3])
            .with_component(
                SparseComponent::Indices,
                InMemoryDataset::from_slice(&[2.0f64, 0.0, 1.0]),
            );
        let err = LazyArray::try_new_sparse(group).err().unwrap();
        assert!(matches!(err, StrataError::MismatchedTypes { .. }));
    }

    #[test]
    fn triple_lengths_are_checked() {
        let group = InMemoryGroup::from_csc(3, 2, &[0, 1, 3], &[2, 0], &[1i32, 2, 3]);
        let LazyArray::Sparse(source) = LazyArray::try_new_sparse(group).unwrap() else {
            unreachable!()
        };
        assert!(matches!(
            source.checked_nnz().unwrap_err(),
            StrataError::ShapeMismatch(_)
        ));

        let group = InMemoryGroup::from_csc(3, 3, &[0, 1, 3], &[2, 0, 1], &[1i32, 2, 3]);
        let LazyArray::Sparse(source) = LazyArray::try_new_sparse(group).unwrap() else {
            unreachable!()
        };
        assert!(matches!(
            source.checked_nnz().unwrap_err(),
            StrataError::ShapeMismatch(_)
        ));
    }

    #[test]
    fn overflowing_column_count_is_a_shape_mismatch() {
        let group = InMemoryGroup::from_csc(3, 2, &[0, 1, 3], &[2, 0, 1], &[1.0f64, 2.0, 3.0])
            .with_component(
                SparseComponent::Shape,
                InMemoryDataset::from_slice(&[3u64, u64::MAX]),
            );
        let array = LazyArray::try_new_sparse(group).unwrap();
        let LazyArray::Sparse(source) = &array else {
            unreachable!()
        };
        assert!(matches!(
            source.checked_nnz().unwrap_err(),
            StrataError::ShapeMismatch(_)
        ));
        assert!(matches!(
            array.to_sparse::<f64>().unwrap_err(),
            StrataError::ShapeMismatch(_)
        ));
    }
}

use std::io;
use std::ops::Range;

use bytes::{Bytes, BytesMut};
use strata_dtype::{ElementKind, NativeElement, Shape, encode_elements};
use strata_error::{StrataResult, strata_bail};

use crate::{ChunkLayout, DatasetHandle, GroupHandle, PerformanceHint, SparseComponent};

/// A dataset held entirely in memory, stored row-major in on-disk axis order.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    shape: Shape,
    kind: ElementKind,
    layout: ChunkLayout,
    bytes: Bytes,
}

impl InMemoryDataset {
    /// Create a contiguous dataset from row-major `values` with on-disk extents `shape`.
    pub fn try_new<T: NativeElement>(shape: impl Into<Shape>, values: &[T]) -> StrataResult<Self> {
        let shape = shape.into();
        if shape.checked_len() != Some(values.len()) {
            strata_bail!(
                ShapeMismatch: "{} values cannot fill a dataset of shape {}",
                values.len(),
                shape
            );
        }
        Ok(Self {
            shape,
            kind: T::KIND,
            layout: ChunkLayout::Contiguous,
            bytes: Bytes::from(encode_elements(values)),
        })
    }

    /// A one-dimensional dataset.
    pub fn from_slice<T: NativeElement>(values: &[T]) -> Self {
        Self {
            shape: Shape::from([values.len()]),
            kind: T::KIND,
            layout: ChunkLayout::Contiguous,
            bytes: Bytes::from(encode_elements(values)),
        }
    }

    /// Declare a chunked layout with the given on-disk chunk extents.
    pub fn with_chunks(mut self, chunks: impl Into<Shape>) -> StrataResult<Self> {
        let chunks = chunks.into();
        if chunks.ndim() != self.shape.ndim() {
            strata_bail!(
                ShapeMismatch: "chunk shape {} does not match dataset shape {}",
                chunks,
                self.shape
            );
        }
        if chunks.contains(&0) {
            strata_bail!("chunk extents must be positive, got {}", chunks);
        }
        self.layout = ChunkLayout::Chunked(chunks);
        Ok(self)
    }

    fn check_block(&self, block: &[Range<usize>]) -> io::Result<()> {
        if block.len() != self.shape.ndim() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "block has {} ranges but dataset has {} dimensions",
                    block.len(),
                    self.shape.ndim()
                ),
            ));
        }
        for (range, extent) in block.iter().zip(self.shape.iter()) {
            if range.start > range.end || range.end > *extent {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("range {}..{} exceeds extent {}", range.start, range.end, extent),
                ));
            }
        }
        Ok(())
    }
}

impl DatasetHandle for InMemoryDataset {
    fn shape(&self) -> Shape {
        self.shape.clone()
    }

    fn element_kind(&self) -> ElementKind {
        self.kind
    }

    fn chunk_layout(&self) -> ChunkLayout {
        self.layout.clone()
    }

    fn read_block(&self, block: &[Range<usize>]) -> io::Result<Bytes> {
        self.check_block(block)?;
        let width = self.kind.byte_width();

        let Some((inner, outer)) = block.split_last() else {
            return Ok(self.bytes.clone());
        };
        if block.iter().any(|r| r.is_empty()) {
            return Ok(Bytes::new());
        }
        if outer.is_empty() {
            return Ok(self.bytes.slice(inner.start * width..inner.end * width));
        }

        // Row-major strides of the stored dataset, in elements.
        let mut strides = vec![1usize; block.len()];
        for axis in (0..block.len() - 1).rev() {
            strides[axis] = strides[axis + 1] * self.shape[axis + 1];
        }

        let run = inner.len() * width;
        let nruns: usize = outer.iter().map(|r| r.len()).product();
        let mut out = BytesMut::with_capacity(nruns * run);

        // Odometer over the outer axes, copying one contiguous run of the innermost axis at a time.
        let mut cursor: Vec<usize> = outer.iter().map(|r| r.start).collect();
        'runs: loop {
            let offset = cursor
                .iter()
                .zip(strides.iter())
                .map(|(c, s)| c * s)
                .sum::<usize>()
                + inner.start;
            out.extend_from_slice(&self.bytes[offset * width..offset * width + run]);

            for axis in (0..outer.len()).rev() {
                cursor[axis] += 1;
                if cursor[axis] < outer[axis].end {
                    continue 'runs;
                }
                cursor[axis] = outer[axis].start;
            }
            break;
        }

        Ok(out.freeze())
    }

    fn performance_hint(&self) -> PerformanceHint {
        PerformanceHint::local()
    }
}

/// A sparse matrix group held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryGroup {
    shape: Option<InMemoryDataset>,
    data: Option<InMemoryDataset>,
    indices: Option<InMemoryDataset>,
    indptr: Option<InMemoryDataset>,
}

impl InMemoryGroup {
    /// Build a group from a CSC triple, storing positions as `u64`.
    ///
    /// No invariants are checked; readers validate what they need.
    pub fn from_csc<T: NativeElement>(
        nrows: usize,
        ncols: usize,
        indptr: &[usize],
        indices: &[usize],
        data: &[T],
    ) -> Self {
        let to_u64 = |v: &[usize]| v.iter().map(|x| *x as u64).collect::<Vec<_>>();
        Self {
            shape: Some(InMemoryDataset::from_slice(&[nrows as u64, ncols as u64])),
            data: Some(InMemoryDataset::from_slice(data)),
            indices: Some(InMemoryDataset::from_slice(&to_u64(indices))),
            indptr: Some(InMemoryDataset::from_slice(&to_u64(indptr))),
        }
    }

    /// Replace one component dataset, e.g. to store positions with a different integer width.
    pub fn with_component(mut self, component: SparseComponent, dataset: InMemoryDataset) -> Self {
        *self.slot(component) = Some(dataset);
        self
    }

    /// Remove one component dataset.
    pub fn without_component(mut self, component: SparseComponent) -> Self {
        *self.slot(component) = None;
        self
    }

    fn slot(&mut self, component: SparseComponent) -> &mut Option<InMemoryDataset> {
        match component {
            SparseComponent::Shape => &mut self.shape,
            SparseComponent::Data => &mut self.data,
            SparseComponent::Indices => &mut self.indices,
            SparseComponent::Indptr => &mut self.indptr,
        }
    }
}

impl GroupHandle for InMemoryGroup {
    fn dataset(&self, component: SparseComponent) -> Option<&dyn DatasetHandle> {
        let dataset = match component {
            SparseComponent::Shape => self.shape.as_ref(),
            SparseComponent::Data => self.data.as_ref(),
            SparseComponent::Indices => self.indices.as_ref(),
            SparseComponent::Indptr => self.indptr.as_ref(),
        };
        dataset.map(|d| d as &dyn DatasetHandle)
    }
}

use std::fmt::{Display, Formatter};
use std::io;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use strata_dtype::{ElementKind, Shape};

/// How a dataset is physically laid out by the storage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkLayout {
    /// One contiguous extent with no preferred access granularity.
    Contiguous,
    /// Fixed-size rectangular chunks, extents given in on-disk axis order.
    Chunked(Shape),
}

/// The default gap, in elements, below which two reads are merged into one.
pub const DEFAULT_COALESCING_WINDOW: usize = 4096;

/// Read characteristics reported by a storage handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceHint {
    coalescing_window: usize,
}

impl Default for PerformanceHint {
    fn default() -> Self {
        Self {
            coalescing_window: DEFAULT_COALESCING_WINDOW,
        }
    }
}

impl PerformanceHint {
    /// A hint with the given coalescing window, in elements.
    pub fn new(coalescing_window: usize) -> Self {
        Self { coalescing_window }
    }

    /// Creates a new instance with a profile appropriate for fast local storage, like memory or files on NVMe devices.
    pub fn local() -> Self {
        Self::new(0)
    }

    /// The maximum number of unrequested elements between two reads that should be coalesced
    /// into a single operation.
    pub fn coalescing_window(&self) -> usize {
        self.coalescing_window
    }
}

/// A reference to one on-disk dataset.
///
/// All extents and ranges are expressed in the on-disk axis order, which is the reverse of the
/// caller-facing order used by `strata-array`.
///
/// Implementations that are shared across threads must be safe for concurrent reads.
pub trait DatasetHandle: Send + Sync {
    /// The extent of each axis, in on-disk order.
    fn shape(&self) -> Shape;

    /// The type of the stored elements.
    fn element_kind(&self) -> ElementKind;

    /// The physical layout of the dataset.
    fn chunk_layout(&self) -> ChunkLayout;

    /// Read the hyperslab covering `block`, one contiguous range per on-disk axis.
    ///
    /// Returns the little-endian elements of the hyperslab in row-major order, i.e. with the
    /// last on-disk axis varying fastest.
    fn read_block(&self, block: &[Range<usize>]) -> io::Result<Bytes>;

    /// Read characteristics of the underlying storage.
    fn performance_hint(&self) -> PerformanceHint {
        PerformanceHint::default()
    }
}

impl<D: DatasetHandle + ?Sized> DatasetHandle for Arc<D> {
    fn shape(&self) -> Shape {
        D::shape(self)
    }

    fn element_kind(&self) -> ElementKind {
        D::element_kind(self)
    }

    fn chunk_layout(&self) -> ChunkLayout {
        D::chunk_layout(self)
    }

    fn read_block(&self, block: &[Range<usize>]) -> io::Result<Bytes> {
        D::read_block(self, block)
    }

    fn performance_hint(&self) -> PerformanceHint {
        D::performance_hint(self)
    }
}

/// The datasets making up a compressed sparse column group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SparseComponent {
    /// Two integers: rows, then columns.
    Shape,
    /// The non-zero values in column-major order.
    Data,
    /// The zero-based row of each non-zero value.
    Indices,
    /// `cols + 1` offsets into `indices` and `data` delimiting each column.
    Indptr,
}

impl SparseComponent {
    /// All components, in the order they are validated.
    pub const ALL: [SparseComponent; 4] = [
        SparseComponent::Shape,
        SparseComponent::Data,
        SparseComponent::Indices,
        SparseComponent::Indptr,
    ];

    /// The dataset name inside the group.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::Data => "data",
            Self::Indices => "indices",
            Self::Indptr => "indptr",
        }
    }
}

impl Display for SparseComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference to a group of datasets holding a sparse matrix in CSC form.
pub trait GroupHandle: Send + Sync {
    /// The dataset for `component`, if the group has one.
    fn dataset(&self, component: SparseComponent) -> Option<&dyn DatasetHandle>;

    /// Read `range` of the one-dimensional `component` dataset.
    fn read_range(&self, component: SparseComponent, range: Range<usize>) -> io::Result<Bytes> {
        self.dataset(component)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("sparse group has no '{component}' dataset"),
                )
            })?
            .read_block(&[range])
    }
}

impl<G: GroupHandle + ?Sized> GroupHandle for Arc<G> {
    fn dataset(&self, component: SparseComponent) -> Option<&dyn DatasetHandle> {
        G::dataset(self, component)
    }

    fn read_range(&self, component: SparseComponent, range: Range<usize>) -> io::Result<Bytes> {
        G::read_range(self, component, range)
    }
}

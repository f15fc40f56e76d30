use std::io;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use strata_dtype::{ElementKind, Shape};
use strata_error::StrataExpect;
use strata_metrics::StrataMetrics;

use crate::{ChunkLayout, DatasetHandle, GroupHandle, PerformanceHint, SparseComponent};

/// A [`DatasetHandle`] adapter that records every read into a [`StrataMetrics`] registry.
pub struct InstrumentedDataset<D> {
    inner: D,
    metrics: Arc<StrataMetrics>,
}

impl<D: DatasetHandle> InstrumentedDataset<D> {
    /// Wrap `inner`, recording into `metrics`.
    pub fn new(inner: D, metrics: Arc<StrataMetrics>) -> Self {
        Self { inner, metrics }
    }

    /// The registry reads are recorded into.
    pub fn metrics(&self) -> &Arc<StrataMetrics> {
        &self.metrics
    }
}

impl<D: DatasetHandle> DatasetHandle for InstrumentedDataset<D> {
    fn shape(&self) -> Shape {
        self.inner.shape()
    }

    fn element_kind(&self) -> ElementKind {
        self.inner.element_kind()
    }

    fn chunk_layout(&self) -> ChunkLayout {
        self.inner.chunk_layout()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    fn read_block(&self, block: &[Range<usize>]) -> io::Result<Bytes> {
        let start = Instant::now();
        let bytes = self.inner.read_block(block)?;
        let elements = bytes.len() / self.inner.element_kind().byte_width();
        self.metrics.record_read(elements, start.elapsed());
        log::trace!("read {} elements in {} ranges", elements, block.len());
        Ok(bytes)
    }

    fn performance_hint(&self) -> PerformanceHint {
        self.inner.performance_hint()
    }
}

/// A [`GroupHandle`] adapter that records every component read into one registry.
pub struct InstrumentedGroup {
    shape: Option<InstrumentedDataset<Arc<dyn DatasetHandle>>>,
    data: Option<InstrumentedDataset<Arc<dyn DatasetHandle>>>,
    indices: Option<InstrumentedDataset<Arc<dyn DatasetHandle>>>,
    indptr: Option<InstrumentedDataset<Arc<dyn DatasetHandle>>>,
    metrics: Arc<StrataMetrics>,
}

impl InstrumentedGroup {
    /// Wrap each component of `inner`, recording into `metrics`.
    pub fn new<G: GroupHandle + 'static>(inner: G, metrics: Arc<StrataMetrics>) -> Self {
        let inner = Arc::new(inner);
        let wrap = |component: SparseComponent| {
            inner.dataset(component).map(|_| {
                let handle: Arc<dyn DatasetHandle> = Arc::new(ComponentOf {
                    group: inner.clone(),
                    component,
                });
                InstrumentedDataset::new(handle, metrics.clone())
            })
        };
        Self {
            shape: wrap(SparseComponent::Shape),
            data: wrap(SparseComponent::Data),
            indices: wrap(SparseComponent::Indices),
            indptr: wrap(SparseComponent::Indptr),
            metrics,
        }
    }

    /// The registry reads are recorded into.
    pub fn metrics(&self) -> &Arc<StrataMetrics> {
        &self.metrics
    }
}

impl GroupHandle for InstrumentedGroup {
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

/// One component of a shared group, as an owned dataset handle.
struct ComponentOf<G> {
    group: Arc<G>,
    component: SparseComponent,
}

impl<G: GroupHandle> ComponentOf<G> {
    fn get(&self) -> &dyn DatasetHandle {
        self.group
            .dataset(self.component)
            .strata_expect("component presence checked when wrapping the group")
    }
}

impl<G: GroupHandle> DatasetHandle for ComponentOf<G> {
    fn shape(&self) -> Shape {
        self.get().shape()
    }

    fn element_kind(&self) -> ElementKind {
        self.get().element_kind()
    }

    fn chunk_layout(&self) -> ChunkLayout {
        self.get().chunk_layout()
    }

    fn read_block(&self, block: &[Range<usize>]) -> io::Result<Bytes> {
        self.get().read_block(block)
    }

    fn performance_hint(&self) -> PerformanceHint {
        self.get().performance_hint()
    }
}

use std::io;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use strata_dtype::{ElementKind, Shape};

use crate::{ChunkLayout, DatasetHandle, PerformanceHint};

/// A [`DatasetHandle`] adapter that fails the n-th read (zero-based) and every read after it.
///
/// Used to check that storage failures abort an extraction and reach the caller unchanged.
pub struct FailingDataset<D> {
    inner: D,
    fail_from: usize,
    reads: AtomicUsize,
}

impl<D: DatasetHandle> FailingDataset<D> {
    /// Wrap `inner`, failing read number `fail_from` and all later reads.
    pub fn new(inner: D, fail_from: usize) -> Self {
        Self {
            inner,
            fail_from,
            reads: AtomicUsize::new(0),
        }
    }

    /// The number of reads attempted so far, failed ones included.
    pub fn attempted_reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl<D: DatasetHandle> DatasetHandle for FailingDataset<D> {
    fn shape(&self) -> Shape {
        self.inner.shape()
    }

    fn element_kind(&self) -> ElementKind {
        self.inner.element_kind()
    }

    fn chunk_layout(&self) -> ChunkLayout {
        self.inner.chunk_layout()
    }

    fn read_block(&self, block: &[Range<usize>]) -> io::Result<Bytes> {
        let n = self.reads.fetch_add(1, Ordering::Relaxed);
        if n >= self.fail_from {
            return Err(io::Error::other(format!("injected failure on read {n}")));
        }
        self.inner.read_block(block)
    }

    fn performance_hint(&self) -> PerformanceHint {
        self.inner.performance_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryDataset;

    #[test]
    fn fails_from_the_requested_read() {
        let ds = FailingDataset::new(InMemoryDataset::from_slice(&[1i16, 2, 3]), 1);
        assert!(ds.read_block(&[0..1]).is_ok());
        let err = ds.read_block(&[1..2]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(ds.read_block(&[0..1]).is_err());
        assert_eq!(ds.attempted_reads(), 3);
    }
}

#![deny(missing_docs)]
//! Metrics recorded by Strata storage reads.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use witchcraft_metrics::{Metric, MetricRegistry, Metrics, MetricsIter};

// re-export exposed metric types
pub use witchcraft_metrics::{Counter, Histogram, MetricId, Timer};

/// Number of read calls issued against a storage handle.
pub const READS: &str = "strata.io.reads";
/// Number of elements returned by read calls.
pub const ELEMENTS_READ: &str = "strata.io.elements_read";
/// Wall-clock time spent inside read calls.
pub const READ_LATENCY: &str = "strata.io.read_latency";

/// A metric registry shared by the handles of one dataset or group.
#[derive(Default)]
pub struct StrataMetrics {
    registry: MetricRegistry,
    default_tags: DefaultTags,
}

/// Default tags for metrics used in [`StrataMetrics`].
#[derive(Default)]
pub struct DefaultTags(BTreeMap<Cow<'static, str>, Cow<'static, str>>);

impl<K, V> From<&[(K, V)]> for DefaultTags
where
    K: Clone + Into<Cow<'static, str>>,
    V: Clone + Into<Cow<'static, str>>,
{
    fn from(pairs: &[(K, V)]) -> Self {
        DefaultTags(
            pairs
                .iter()
                .map(|(k, v)| (k.clone().into(), v.clone().into()))
                .collect(),
        )
    }
}

/// A point-in-time summary of the read counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Read calls issued.
    pub reads: u64,
    /// Elements returned.
    pub elements: u64,
}

impl StrataMetrics {
    /// Create an empty metric registry with default tags, e.g. the dataset path.
    pub fn default_with_tags(default_tags: impl Into<DefaultTags>) -> Self {
        Self {
            registry: MetricRegistry::default(),
            default_tags: default_tags.into(),
        }
    }

    /// Returns the counter with the specified ID, creating a default instance if absent.
    ///
    /// # Panics
    ///
    /// Panics if a metric is registered with the ID that is not a counter.
    pub fn counter<T>(&self, id: T) -> Arc<Counter>
    where
        T: Into<MetricId>,
    {
        self.registry.counter(id)
    }

    /// Returns the timer with the specified ID, creating a default instance if absent.
    ///
    /// # Panics
    ///
    /// Panics if a metric is registered with the ID that is not a timer.
    pub fn timer<T>(&self, id: T) -> Arc<Timer>
    where
        T: Into<MetricId>,
    {
        self.registry.timer(id)
    }

    /// Record one completed read of `elements` elements that took `elapsed`.
    pub fn record_read(&self, elements: usize, elapsed: Duration) {
        self.counter(READS).inc();
        self.counter(ELEMENTS_READ)
            .add(i64::try_from(elements).unwrap_or(i64::MAX));
        self.timer(READ_LATENCY).update(elapsed);
    }

    /// The read counters accumulated so far.
    pub fn read_stats(&self) -> ReadStats {
        ReadStats {
            reads: u64::try_from(self.counter(READS).count()).unwrap_or_default(),
            elements: u64::try_from(self.counter(ELEMENTS_READ).count()).unwrap_or_default(),
        }
    }

    /// Returns a snapshot of the metrics in the registry.
    ///
    /// Modifications to the registry after this method is called will not affect the state of the returned `MetricsSnapshot`.
    pub fn metrics(&self) -> MetricsSnapshot<'_> {
        MetricsSnapshot {
            snapshot: self.registry.metrics(),
            default_tags: &self.default_tags,
        }
    }
}

/// A snapshot of the metrics in a registry with default tags.
pub struct MetricsSnapshot<'a> {
    snapshot: Metrics,
    default_tags: &'a DefaultTags,
}

impl MetricsSnapshot<'_> {
    /// Create an iterator over the metrics snapshot.
    pub fn iter(&self) -> StrataMetricsIter<'_> {
        StrataMetricsIter {
            iter: self.snapshot.iter(),
            default_tags: self.default_tags,
        }
    }
}

/// Metrics Iterator that applies the default tags to each metric in the inner iterator.
pub struct StrataMetricsIter<'a> {
    iter: MetricsIter<'a>,
    default_tags: &'a DefaultTags,
}

impl<'a> Iterator for StrataMetricsIter<'a> {
    type Item = (MetricId, &'a Metric);

    #[inline]
    fn next(&mut self) -> Option<(MetricId, &'a Metric)> {
        self.iter.next().map(|(k, v)| {
            let mut metric_id = k.clone();
            for (tag_key, tag_value) in self.default_tags.0.iter() {
                metric_id = metric_id.with_tag(tag_key.clone(), tag_value.clone())
            }

            (metric_id, v)
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_reads_and_elements() {
        let metrics = StrataMetrics::default();
        metrics.record_read(10, Duration::from_micros(3));
        metrics.record_read(5, Duration::from_micros(1));
        assert_eq!(
            metrics.read_stats(),
            ReadStats {
                reads: 2,
                elements: 15
            }
        );
    }

    #[test]
    fn snapshot_applies_default_tags() {
        let metrics = StrataMetrics::default_with_tags([("dataset", "foo")].as_slice());
        metrics.record_read(1, Duration::ZERO);
        let mut names: Vec<String> = metrics
            .metrics()
            .iter()
            .map(|(id, _)| id.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![ELEMENTS_READ, READ_LATENCY, READS]);
    }
}

use ingest_metrics::{Datapoint, Datapoints, Tags, TimeUnit};

use crate::IterError;

/// A view on the metric an iterator is positioned on.
#[derive(Clone, Copy, Debug)]
pub struct MetricRef<'a> {
    /// The tags of the metric.
    pub tags: &'a Tags,
    /// The samples of the metric.
    pub datapoints: &'a [Datapoint],
    /// The unit of the sample timestamps.
    pub unit: TimeUnit,
}

/// A rewindable pull iterator over a batch of metrics.
///
/// [`DownsamplerAndWriter::write_batch`](crate::DownsamplerAndWriter::write_batch) walks the
/// iterator twice: once to launch storage writes and, after [`reset`](Self::reset), once more to
/// feed the downsampler. The iterator is only ever accessed sequentially.
pub trait DownsampleAndWriteIter: Send {
    /// Advances to the next metric. Returns `false` once the iterator is exhausted.
    fn next(&mut self) -> bool;

    /// Returns the metric the iterator is positioned on.
    ///
    /// Must only be called after [`next`](Self::next) returned `true`.
    fn current(&self) -> MetricRef<'_>;

    /// Rewinds the iterator to the start of the batch.
    fn reset(&mut self) -> Result<(), IterError>;

    /// Returns the error that ended the iteration early, if any.
    fn error(&self) -> Option<IterError>;
}

#[derive(Clone, Debug)]
struct BufferedMetric {
    tags: Tags,
    datapoints: Datapoints,
    unit: TimeUnit,
}

/// A [`DownsampleAndWriteIter`] over a batch held in memory.
///
/// Sources that cannot rewind are buffered into this iterator once.
#[derive(Clone, Debug, Default)]
pub struct BufferedIter {
    metrics: Vec<BufferedMetric>,
    // One past the current metric; zero before the first call to `next`.
    position: usize,
}

impl BufferedIter {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a metric to the batch.
    pub fn push(&mut self, tags: Tags, datapoints: Datapoints, unit: TimeUnit) {
        self.metrics.push(BufferedMetric {
            tags,
            datapoints,
            unit,
        });
    }

    /// Returns the number of metrics in the batch.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns `true` if the batch holds no metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl FromIterator<(Tags, Datapoints, TimeUnit)> for BufferedIter {
    fn from_iter<T: IntoIterator<Item = (Tags, Datapoints, TimeUnit)>>(iter: T) -> Self {
        let mut batch = Self::new();
        for (tags, datapoints, unit) in iter {
            batch.push(tags, datapoints, unit);
        }
        batch
    }
}

impl DownsampleAndWriteIter for BufferedIter {
    fn next(&mut self) -> bool {
        if self.position < self.metrics.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// # Panics
    ///
    /// Panics if the iterator is not positioned on a metric.
    fn current(&self) -> MetricRef<'_> {
        let metric = &self.metrics[self.position - 1];
        MetricRef {
            tags: &metric.tags,
            datapoints: &metric.datapoints,
            unit: metric.unit,
        }
    }

    fn reset(&mut self) -> Result<(), IterError> {
        self.position = 0;
        Ok(())
    }

    fn error(&self) -> Option<IterError> {
        None
    }
}

#[cfg(test)]
mod tests {
    use ingest_metrics::{Tag, UnixTimestamp};

    use super::*;

    fn batch() -> BufferedIter {
        ["a", "b"]
            .into_iter()
            .map(|host| {
                let tags = Tags::from(vec![Tag::new("host", host)]);
                let datapoints = vec![Datapoint::new(UnixTimestamp::from_secs(10), 1.0)];
                (tags, datapoints, TimeUnit::Second)
            })
            .collect()
    }

    fn hosts(iter: &mut BufferedIter) -> Vec<String> {
        let mut hosts = Vec::new();
        while iter.next() {
            let host = iter.current().tags.get(b"host").unwrap_or_default();
            hosts.push(String::from_utf8_lossy(host).into_owned());
        }
        hosts
    }

    #[test]
    fn test_walk_twice() {
        let mut iter = batch();
        assert_eq!(iter.len(), 2);

        assert_eq!(hosts(&mut iter), ["a", "b"]);
        assert!(!iter.next());

        iter.reset().unwrap();
        assert_eq!(hosts(&mut iter), ["a", "b"]);
        assert!(iter.error().is_none());
    }

    #[test]
    fn test_empty_batch() {
        let mut iter = BufferedIter::new();
        assert!(iter.is_empty());
        assert!(!iter.next());
    }
}

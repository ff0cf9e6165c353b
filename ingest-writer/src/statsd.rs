use ingest_statsd::{CounterMetric, DistributionMetric, GaugeMetric, TimerMetric};

/// Counter metrics for the writer.
pub enum WriterCounters {
    /// Incremented for every write issued to storage.
    ///
    /// This metric is tagged with:
    ///  - `metrics_type`: `unaggregated` or `aggregated`.
    ///  - `outcome`: `ok` or `failed`.
    StorageWrite,

    /// Incremented for every gauge sample appended to the downsampler.
    DownsampleSamples,

    /// Incremented when a metric is neither downsampled nor written to storage.
    Skipped,
}

impl CounterMetric for WriterCounters {
    fn name(&self) -> &'static str {
        match *self {
            Self::StorageWrite => "writer.storage.write",
            Self::DownsampleSamples => "writer.downsample.samples",
            Self::Skipped => "writer.skipped",
        }
    }
}

/// Timer metrics for the writer.
pub enum WriterTimers {
    /// Time spent in a single write, including all its storage writes.
    WriteDuration,

    /// Time spent writing a batch, including all its storage writes.
    WriteBatchDuration,
}

impl TimerMetric for WriterTimers {
    fn name(&self) -> &'static str {
        match *self {
            Self::WriteDuration => "writer.write.duration",
            Self::WriteBatchDuration => "writer.write_batch.duration",
        }
    }
}

/// Distribution metrics for the writer.
pub enum WriterDistributions {
    /// The number of metrics in a batch.
    BatchSize,
}

impl DistributionMetric for WriterDistributions {
    fn name(&self) -> &'static str {
        match *self {
            Self::BatchSize => "writer.write_batch.size",
        }
    }
}

/// Gauge metrics for the writer.
pub enum WriterGauges {
    /// Storage writes of a single call that are still running when the call starts waiting.
    StorageInFlight,
}

impl GaugeMetric for WriterGauges {
    fn name(&self) -> &'static str {
        match *self {
            Self::StorageInFlight => "writer.storage.in_flight",
        }
    }
}

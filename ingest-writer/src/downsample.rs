use bytes::Bytes;
use ingest_metrics::MappingRule;

use crate::AppenderError;

/// Options passed to [`MetricsAppender::samples_appender`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SamplesAppenderOptions {
    /// Mapping rules that replace the downsampler's configured rules for this metric.
    ///
    /// `None` applies the configured rules.
    pub override_rules: Option<Vec<MappingRule>>,
}

/// Aggregates samples into downsampled series.
pub trait Downsampler: Send + Sync {
    /// Acquires a new appender for one or more metrics.
    fn new_metrics_appender(&self) -> Result<Box<dyn MetricsAppender + '_>, AppenderError>;
}

/// Collects the tags of a metric and hands out a [`SamplesAppender`] for its samples.
///
/// An appender is stateful and must not be shared between concurrent writers. It can be reused
/// for subsequent metrics by calling [`reset`](Self::reset) in between.
pub trait MetricsAppender {
    /// Adds a tag to the current metric.
    fn add_tag(&mut self, name: Bytes, value: Bytes);

    /// Returns an appender for the samples of the current metric.
    fn samples_appender(
        &mut self,
        options: &SamplesAppenderOptions,
    ) -> Result<Box<dyn SamplesAppender + '_>, AppenderError>;

    /// Clears the tags of the current metric.
    fn reset(&mut self);

    /// Releases the appender.
    ///
    /// Dropping the appender without finalizing abandons it.
    fn finalize(self: Box<Self>);
}

/// Appends samples of one metric.
pub trait SamplesAppender {
    /// Appends a gauge sample.
    fn append_gauge_sample(&mut self, value: f64) -> Result<(), AppenderError>;
}

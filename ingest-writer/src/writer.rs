use std::fmt;
use std::sync::Arc;

use ingest_log::LogError;
use ingest_metrics::{Datapoint, Datapoints, Tags, TimeUnit};
use ingest_statsd::metric;
use tokio::task::JoinSet;

use crate::statsd::{WriterCounters, WriterDistributions, WriterGauges, WriterTimers};
use crate::{
    AppenderError, Attributes, DownsampleAndWriteIter, Downsampler, ErrorCollector,
    MetricsAppender, SamplesAppenderOptions, Storage, StorageError, WriteError, WriteOverrides,
    WriteQuery,
};

/// Writes metrics to the downsampler and to storage.
///
/// Both sinks are optional. A writer without sinks accepts every write and does nothing.
///
/// Storage writes run as tokio tasks and therefore require a tokio runtime. Every call waits for
/// the tasks it spawned. Dropping the future of a call aborts its outstanding storage writes.
#[derive(Clone, Default)]
pub struct DownsamplerAndWriter {
    storage: Option<Arc<dyn Storage>>,
    downsampler: Option<Arc<dyn Downsampler>>,
}

impl DownsamplerAndWriter {
    /// Creates a new writer.
    pub fn new(
        storage: Option<Arc<dyn Storage>>,
        downsampler: Option<Arc<dyn Downsampler>>,
    ) -> Self {
        Self {
            storage,
            downsampler,
        }
    }

    /// Returns the storage this writer writes to.
    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    /// Returns the downsampler this writer appends to.
    pub fn downsampler(&self) -> Option<&Arc<dyn Downsampler>> {
        self.downsampler.as_ref()
    }

    /// Writes a single metric.
    ///
    /// The metric is appended to the downsampler unless `overrides` requests a mapping rule
    /// override without any rules. It is then written to storage: unaggregated by default, or
    /// aggregated once per storage policy in `overrides`.
    ///
    /// Downsampler failures end the call before anything is written to storage. The aggregated
    /// storage writes run in parallel and their failures are reported together as
    /// [`WriteError::Partial`] after all of them completed.
    pub async fn write(
        &self,
        tags: Tags,
        datapoints: Datapoints,
        unit: TimeUnit,
        overrides: &WriteOverrides,
    ) -> Result<(), WriteError> {
        metric!(timer(WriterTimers::WriteDuration), {
            self.write_metric(tags, datapoints, unit, overrides).await
        })
    }

    async fn write_metric(
        &self,
        tags: Tags,
        datapoints: Datapoints,
        unit: TimeUnit,
        overrides: &WriteOverrides,
    ) -> Result<(), WriteError> {
        let mut downsampled = false;
        if let Some(downsampler) = self.downsampler.as_deref() {
            if overrides.should_downsample() {
                let options = SamplesAppenderOptions {
                    override_rules: overrides.mapping_rules_override().map(<[_]>::to_vec),
                };
                append_metric(downsampler, &tags, &datapoints, &options)?;
                downsampled = true;
            }
        }

        let Some(storage) = self.storage.as_ref() else {
            if !downsampled {
                metric!(counter(WriterCounters::Skipped) += 1);
            }
            return Ok(());
        };

        if !overrides.override_storage_policies {
            let query = WriteQuery {
                tags,
                datapoints,
                unit,
                attributes: Attributes::unaggregated(),
            };
            write_to_storage(storage.as_ref(), query).await?;
            return Ok(());
        }

        if overrides.storage_policies.is_empty() {
            ingest_log::debug!("storage policy override without policies, skipping storage");
            if !downsampled {
                metric!(counter(WriterCounters::Skipped) += 1);
            }
            return Ok(());
        }

        let errors = Arc::new(ErrorCollector::new());
        let mut tasks = JoinSet::new();
        for policy in &overrides.storage_policies {
            let query = WriteQuery {
                tags: tags.clone(),
                datapoints: datapoints.clone(),
                unit,
                attributes: Attributes::aggregated(policy),
            };
            tasks.spawn(spawn_write(Arc::clone(storage), query, Arc::clone(&errors)));
        }

        wait_for_writes(&mut tasks, &errors).await;
        errors.finish()?;
        Ok(())
    }

    /// Writes a batch of metrics.
    ///
    /// If storage is configured, the iterator is walked once to launch an unaggregated storage
    /// write per metric. The iterator is then reset and, if a downsampler is configured, walked a
    /// second time to append every metric to a single appender. A failed reset skips the
    /// downsampler.
    ///
    /// The call waits for all storage writes before it returns. Every failure is collected and
    /// reported as [`WriteError::Partial`].
    pub async fn write_batch(
        &self,
        iter: &mut dyn DownsampleAndWriteIter,
    ) -> Result<(), WriteError> {
        metric!(timer(WriterTimers::WriteBatchDuration), {
            self.write_metrics(iter).await
        })
    }

    async fn write_metrics(&self, iter: &mut dyn DownsampleAndWriteIter) -> Result<(), WriteError> {
        let errors = Arc::new(ErrorCollector::new());
        let mut tasks = JoinSet::new();

        if let Some(storage) = self.storage.as_ref() {
            while iter.next() {
                let metric = iter.current();
                let query = WriteQuery {
                    tags: metric.tags.clone(),
                    datapoints: metric.datapoints.to_vec(),
                    unit: metric.unit,
                    attributes: Attributes::unaggregated(),
                };
                tasks.spawn(spawn_write(Arc::clone(storage), query, Arc::clone(&errors)));
            }
            metric!(distribution(WriterDistributions::BatchSize) = tasks.len() as u64);
        }

        match iter.reset() {
            Ok(()) => {
                if let Some(downsampler) = self.downsampler.as_deref() {
                    if let Err(error) = append_batch(downsampler, iter) {
                        errors.add(error);
                    }
                }
            }
            Err(error) => {
                ingest_log::debug!(
                    "failed to reset batch, skipping downsampler: {}",
                    LogError(&error)
                );
                errors.add(error);
            }
        }

        wait_for_writes(&mut tasks, &errors).await;
        errors.finish()?;
        Ok(())
    }
}

impl fmt::Debug for DownsamplerAndWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownsamplerAndWriter")
            .field("storage", &self.storage.is_some())
            .field("downsampler", &self.downsampler.is_some())
            .finish()
    }
}

/// Appends the tags and samples of the current metric.
fn append_samples(
    appender: &mut dyn MetricsAppender,
    tags: &Tags,
    datapoints: &[Datapoint],
    options: &SamplesAppenderOptions,
) -> Result<(), AppenderError> {
    for tag in tags {
        let (name, value) = tag.clone().into_parts();
        appender.add_tag(name, value);
    }

    let mut samples = appender.samples_appender(options)?;
    for datapoint in datapoints {
        samples.append_gauge_sample(datapoint.value)?;
    }

    metric!(counter(WriterCounters::DownsampleSamples) += datapoints.len() as i64);
    Ok(())
}

/// Appends a single metric with a fresh appender.
fn append_metric(
    downsampler: &dyn Downsampler,
    tags: &Tags,
    datapoints: &[Datapoint],
    options: &SamplesAppenderOptions,
) -> Result<(), AppenderError> {
    let mut appender = downsampler.new_metrics_appender()?;
    append_samples(appender.as_mut(), tags, datapoints, options)?;
    appender.finalize();
    Ok(())
}

/// Appends every metric of the iterator to one appender.
///
/// Appender state is reset between metrics. The appender is finalized once the iterator is
/// exhausted, after which a trailing iterator error is reported.
fn append_batch(
    downsampler: &dyn Downsampler,
    iter: &mut dyn DownsampleAndWriteIter,
) -> Result<(), WriteError> {
    let mut appender = downsampler.new_metrics_appender()?;
    let options = SamplesAppenderOptions::default();

    while iter.next() {
        appender.reset();
        let metric = iter.current();
        append_samples(appender.as_mut(), metric.tags, metric.datapoints, &options)?;
    }
    appender.finalize();

    match iter.error() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

async fn write_to_storage(storage: &dyn Storage, query: WriteQuery) -> Result<(), StorageError> {
    let metrics_type = query.attributes.metrics_type;
    let result = storage.write(query).await;

    metric!(
        counter(WriterCounters::StorageWrite) += 1,
        metrics_type = metrics_type.as_str(),
        outcome = if result.is_ok() { "ok" } else { "failed" },
    );

    result
}

async fn spawn_write(storage: Arc<dyn Storage>, query: WriteQuery, errors: Arc<ErrorCollector>) {
    if let Err(error) = write_to_storage(storage.as_ref(), query).await {
        ingest_log::debug!("storage write failed: {}", LogError(&error));
        errors.add(error);
    }
}

/// Waits for all storage writes. Tasks that panicked count as failed writes.
async fn wait_for_writes(tasks: &mut JoinSet<()>, errors: &ErrorCollector) {
    metric!(gauge(WriterGauges::StorageInFlight) = tasks.len() as u64);

    while let Some(result) = tasks.join_next().await {
        if let Err(error) = result {
            errors.add(StorageError::new(error));
        }
    }
}

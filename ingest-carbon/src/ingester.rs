use ingest_log::LogError;
use ingest_metrics::{Datapoint, MalformedMetricName, TimeUnit, UnixTimestamp, generate_tags};
use ingest_statsd::metric;
use ingest_writer::{DownsamplerAndWriter, WriteError};

use crate::Rules;
use crate::statsd::CarbonCounters;

/// An error returned by [`CarbonIngester::ingest`].
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The metric name cannot be converted into tags.
    #[error(transparent)]
    Malformed(#[from] MalformedMetricName),
    /// Writing the metric failed for at least one matching rule.
    #[error("failed to write carbon metric")]
    Write(#[from] WriteError),
}

/// The result of a successful [`CarbonIngester::ingest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The metric was written for the given number of matching rules.
    Written(usize),
    /// No rule matched and the metric was discarded.
    Dropped,
}

/// Routes carbon metrics into a [`DownsamplerAndWriter`].
#[derive(Debug)]
pub struct CarbonIngester {
    writer: DownsamplerAndWriter,
    rules: Rules,
}

impl CarbonIngester {
    /// Creates a new ingester.
    pub fn new(writer: DownsamplerAndWriter, rules: Rules) -> Self {
        Self { writer, rules }
    }

    /// Returns the writer metrics are routed into.
    pub fn writer(&self) -> &DownsamplerAndWriter {
        &self.writer
    }

    /// Ingests a single carbon sample.
    ///
    /// The metric is written once for every matching rule, with the overrides of that rule. A
    /// failed write does not prevent the writes of subsequent rules. If any of them failed, the
    /// error of the last failed write is returned.
    pub async fn ingest(
        &self,
        name: &[u8],
        timestamp: UnixTimestamp,
        value: f64,
    ) -> Result<IngestOutcome, IngestError> {
        let tags = match generate_tags(name) {
            Ok(tags) => tags,
            Err(error) => {
                metric!(counter(CarbonCounters::TagsMalformed) += 1);
                return Err(error.into());
            }
        };
        metric!(counter(CarbonCounters::TagsGenerated) += 1);

        let datapoints = vec![Datapoint::new(timestamp, value)];

        let mut written = 0;
        let mut last_error = None;
        for rule in self.rules.matching(name) {
            let overrides = rule.overrides();
            metric!(
                counter(CarbonCounters::RuleWrite) += 1,
                aggregated = if overrides.should_downsample() { "true" } else { "false" },
            );

            let result = self
                .writer
                .write(tags.clone(), datapoints.clone(), TimeUnit::Second, overrides)
                .await;

            written += 1;
            if let Err(error) = result {
                ingest_log::debug!(
                    "failed to write carbon metric {}: {}",
                    String::from_utf8_lossy(name),
                    LogError(&error)
                );
                last_error = Some(error);
            }
        }

        if let Some(error) = last_error {
            return Err(error.into());
        }

        if written == 0 {
            ingest_log::debug!(
                "no rule matched carbon metric {}, dropping",
                String::from_utf8_lossy(name)
            );
            metric!(counter(CarbonCounters::Dropped) += 1);
            return Ok(IngestOutcome::Dropped);
        }

        Ok(IngestOutcome::Written(written))
    }
}

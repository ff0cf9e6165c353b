use ingest_statsd::CounterMetric;

/// Counter metrics for carbon ingestion.
pub enum CarbonCounters {
    /// Incremented for every metric name converted into tags.
    TagsGenerated,

    /// Incremented for every metric name rejected as malformed.
    TagsMalformed,

    /// Incremented for every metric that matched no rule.
    Dropped,

    /// Incremented for every write issued for a matching rule.
    ///
    /// This metric is tagged with:
    ///  - `aggregated`: `true` if the rule aggregates with the downsampler.
    RuleWrite,
}

impl CounterMetric for CarbonCounters {
    fn name(&self) -> &'static str {
        match *self {
            Self::TagsGenerated => "carbon.tags.generated",
            Self::TagsMalformed => "carbon.tags.malformed",
            Self::Dropped => "carbon.dropped",
            Self::RuleWrite => "carbon.rule.write",
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;
use ingest_metrics::{Datapoints, MappingRule, StoragePolicy, Tags, TimeUnit};

use crate::StorageError;

/// Distinguishes raw writes from writes into an aggregated namespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MetricsType {
    /// Raw samples, written with the storage's default retention.
    #[default]
    Unaggregated,
    /// Samples written into the namespace of a specific storage policy.
    Aggregated,
}

impl MetricsType {
    /// Returns the name of the metrics type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unaggregated => "unaggregated",
            Self::Aggregated => "aggregated",
        }
    }
}

/// Describes the namespace a [`WriteQuery`] targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Whether the write is aggregated.
    pub metrics_type: MetricsType,
    /// The resolution window of an aggregated write.
    pub resolution: Option<Duration>,
    /// The retention of an aggregated write.
    pub retention: Option<Duration>,
}

impl Attributes {
    /// Attributes of a raw write.
    pub fn unaggregated() -> Self {
        Self::default()
    }

    /// Attributes of a write into the namespace of the given storage policy.
    pub fn aggregated(policy: &StoragePolicy) -> Self {
        Self {
            metrics_type: MetricsType::Aggregated,
            resolution: Some(policy.resolution.window),
            retention: Some(policy.retention.duration()),
        }
    }
}

/// A single write request sent to [`Storage`].
#[derive(Clone, Debug, PartialEq)]
pub struct WriteQuery {
    /// The tags identifying the series.
    pub tags: Tags,
    /// The samples to write.
    pub datapoints: Datapoints,
    /// The unit of the sample timestamps.
    pub unit: TimeUnit,
    /// The namespace to write to.
    pub attributes: Attributes,
}

/// Persists series.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Writes the samples of a single series.
    async fn write(&self, query: WriteQuery) -> Result<(), StorageError>;
}

/// Per-write overrides of the downsampler mapping rules and the storage policies.
///
/// The default value overrides nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteOverrides {
    /// Replace the downsampler's mapping rules with [`mapping_rules`](Self::mapping_rules).
    ///
    /// An override with no rules skips downsampling.
    pub override_mapping_rules: bool,
    /// The mapping rules used when overriding.
    pub mapping_rules: Vec<MappingRule>,
    /// Write to the namespaces of [`storage_policies`](Self::storage_policies) instead of
    /// writing unaggregated.
    ///
    /// An override with no policies skips storage.
    pub override_storage_policies: bool,
    /// The storage policies used when overriding.
    pub storage_policies: Vec<StoragePolicy>,
}

impl WriteOverrides {
    /// Returns the overriding mapping rules if an override with at least one rule is requested.
    pub fn mapping_rules_override(&self) -> Option<&[MappingRule]> {
        match self.override_mapping_rules && !self.mapping_rules.is_empty() {
            true => Some(&self.mapping_rules),
            false => None,
        }
    }

    /// Returns `true` if the downsampler should receive the metric.
    pub fn should_downsample(&self) -> bool {
        !self.override_mapping_rules || !self.mapping_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_overrides_downsample() {
        let overrides = WriteOverrides::default();
        assert!(overrides.should_downsample());
        assert_eq!(overrides.mapping_rules_override(), None);
    }

    #[test]
    fn test_empty_mapping_override_skips_downsampling() {
        let overrides = WriteOverrides {
            override_mapping_rules: true,
            ..Default::default()
        };
        assert!(!overrides.should_downsample());
        assert_eq!(overrides.mapping_rules_override(), None);
    }

    #[test]
    fn test_aggregated_attributes() {
        let policy: StoragePolicy = "1m:40d".parse().unwrap();
        insta::assert_debug_snapshot!(Attributes::aggregated(&policy), @r###"
        Attributes {
            metrics_type: Aggregated,
            resolution: Some(
                60s,
            ),
            retention: Some(
                3456000s,
            ),
        }
        "###);
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StoragePolicy;

/// The aggregation applied to samples within one resolution window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    /// The last sample.
    Last,
    /// The smallest sample.
    Min,
    /// The largest sample.
    Max,
    /// The arithmetic mean.
    Mean,
    /// The median.
    Median,
    /// The number of samples.
    Count,
    /// The sum of all samples.
    Sum,
    /// The sum of squares of all samples.
    SumSq,
    /// The standard deviation.
    Stdev,
    /// The 10th percentile.
    P10,
    /// The 20th percentile.
    P20,
    /// The 30th percentile.
    P30,
    /// The 40th percentile.
    P40,
    /// The 50th percentile.
    P50,
    /// The 80th percentile.
    P80,
    /// The 90th percentile.
    P90,
    /// The 95th percentile.
    P95,
    /// The 99th percentile.
    P99,
    /// The 99.9th percentile.
    P999,
    /// The 99.99th percentile.
    P9999,
}

impl AggregationType {
    /// Returns the lowercase name of the aggregation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last => "last",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Count => "count",
            Self::Sum => "sum",
            Self::SumSq => "sumsq",
            Self::Stdev => "stdev",
            Self::P10 => "p10",
            Self::P20 => "p20",
            Self::P30 => "p30",
            Self::P40 => "p40",
            Self::P50 => "p50",
            Self::P80 => "p80",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
            Self::P999 => "p999",
            Self::P9999 => "p9999",
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes how matching series are aggregated and where the aggregates are stored.
///
/// Mapping rules are interpreted by the downsampler. They are passed through as values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MappingRule {
    /// The aggregations to compute.
    pub aggregations: Vec<AggregationType>,
    /// The storage policies the aggregates are written with.
    pub policies: Vec<StoragePolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_rule_json() {
        let rule: MappingRule = serde_json::from_str(
            r#"{"aggregations": ["sumsq", "p999"], "policies": ["1m:40d"]}"#,
        )
        .unwrap();

        assert_eq!(
            rule.aggregations,
            [AggregationType::SumSq, AggregationType::P999]
        );
        insta::assert_json_snapshot!(rule, @r###"
        {
          "aggregations": [
            "sumsq",
            "p999"
          ],
          "policies": [
            "1m:40d"
          ]
        }
        "###);
    }

    #[test]
    fn test_serde_matches_as_str() {
        for ty in [AggregationType::Mean, AggregationType::SumSq, AggregationType::P9999] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{ty}\""));
        }
    }
}

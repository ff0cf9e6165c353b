use ingest_metrics::{AggregationType, StoragePolicy};
use serde::{Deserialize, Serialize};

/// Configuration of the carbon ingester.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CarbonIngesterConfig {
    /// Routing rules, evaluated in order.
    ///
    /// Metrics that match no rule are dropped.
    pub rules: Vec<RuleConfig>,
}

/// A single routing rule.
///
/// Exactly one of `pattern` and `contains` must be set.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Regular expression matched against the metric name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Substring the metric name must contain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    /// Keep evaluating subsequent rules after this rule matched.
    #[serde(rename = "continue")]
    pub continue_matching: bool,
    /// How the downsampler aggregates matching metrics.
    pub aggregation: AggregationConfig,
    /// The storage policies matching metrics are written with.
    pub policies: Vec<StoragePolicy>,
}

/// Aggregation of the metrics matched by a rule.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Aggregate with the downsampler.
    ///
    /// When disabled, samples are written unaggregated into the namespaces of the rule's
    /// storage policies.
    pub enabled: bool,
    /// The aggregation applied by the downsampler.
    #[serde(rename = "type")]
    pub ty: AggregationType,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ty: AggregationType::Mean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: CarbonIngesterConfig = serde_yaml::from_str(
            r#"
rules:
  - contains: servers
    policies: ["10s:2d"]
"#,
        )
        .unwrap();

        insta::assert_debug_snapshot!(config, @r###"
        CarbonIngesterConfig {
            rules: [
                RuleConfig {
                    pattern: None,
                    contains: Some(
                        "servers",
                    ),
                    continue_matching: false,
                    aggregation: AggregationConfig {
                        enabled: true,
                        ty: Mean,
                    },
                    policies: [
                        StoragePolicy {
                            resolution: Resolution {
                                window: 10s,
                                precision: Second,
                            },
                            retention: Retention(
                                172800s,
                            ),
                        },
                    ],
                },
            ],
        }
        "###);
    }

    #[test]
    fn test_serialize() {
        let config = CarbonIngesterConfig {
            rules: vec![RuleConfig {
                pattern: Some("^foo".to_owned()),
                continue_matching: true,
                aggregation: AggregationConfig {
                    enabled: false,
                    ty: AggregationType::Max,
                },
                policies: vec!["1m:40d".parse().unwrap()],
                ..Default::default()
            }],
        };

        insta::assert_json_snapshot!(config, @r###"
        {
          "rules": [
            {
              "pattern": "^foo",
              "continue": true,
              "aggregation": {
                "enabled": false,
                "type": "max"
              },
              "policies": [
                "1m:40d"
              ]
            }
          ]
        }
        "###);
    }
}

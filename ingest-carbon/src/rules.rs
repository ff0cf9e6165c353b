use ingest_metrics::MappingRule;
use ingest_writer::WriteOverrides;
use regex::bytes::Regex;

use crate::{CarbonIngesterConfig, RuleConfig};

/// An error returned by [`Rules::compile`].
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The rule sets neither `pattern` nor `contains`.
    #[error("rule {0} has neither a pattern nor a contains matcher")]
    MissingMatcher(usize),
    /// The rule sets both `pattern` and `contains`.
    #[error("rule {0} has both a pattern and a contains matcher")]
    AmbiguousMatcher(usize),
    /// The rule has no storage policies.
    #[error("rule {0} has no storage policies")]
    MissingPolicies(usize),
    /// The pattern of the rule is not a valid regular expression.
    #[error("rule {index} has an invalid pattern")]
    InvalidPattern {
        /// Position of the rule in the configuration.
        index: usize,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug)]
enum Matcher {
    Pattern(Regex),
    Contains(Vec<u8>),
}

impl Matcher {
    fn is_match(&self, name: &[u8]) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(name),
            Self::Contains(needle) if needle.is_empty() => true,
            Self::Contains(needle) => name.windows(needle.len()).any(|w| w == needle.as_slice()),
        }
    }
}

/// A compiled routing rule.
#[derive(Debug)]
pub struct Rule {
    matcher: Matcher,
    continue_matching: bool,
    overrides: WriteOverrides,
}

impl Rule {
    fn compile(index: usize, config: &RuleConfig) -> Result<Self, RuleError> {
        let matcher = match (&config.pattern, &config.contains) {
            (Some(pattern), None) => Matcher::Pattern(
                Regex::new(pattern)
                    .map_err(|source| RuleError::InvalidPattern { index, source })?,
            ),
            (None, Some(contains)) => Matcher::Contains(contains.as_bytes().to_vec()),
            (None, None) => return Err(RuleError::MissingMatcher(index)),
            (Some(_), Some(_)) => return Err(RuleError::AmbiguousMatcher(index)),
        };

        if config.policies.is_empty() {
            return Err(RuleError::MissingPolicies(index));
        }

        // Aggregated metrics only reach storage through the downsampler, all others bypass it.
        let overrides = if config.aggregation.enabled {
            WriteOverrides {
                override_mapping_rules: true,
                mapping_rules: vec![MappingRule {
                    aggregations: vec![config.aggregation.ty],
                    policies: config.policies.clone(),
                }],
                override_storage_policies: true,
                storage_policies: Vec::new(),
            }
        } else {
            WriteOverrides {
                override_mapping_rules: true,
                mapping_rules: Vec::new(),
                override_storage_policies: true,
                storage_policies: config.policies.clone(),
            }
        };

        Ok(Self {
            matcher,
            continue_matching: config.continue_matching,
            overrides,
        })
    }

    /// Returns `true` if the rule matches the metric name.
    pub fn is_match(&self, name: &[u8]) -> bool {
        self.matcher.is_match(name)
    }

    /// Returns `true` if subsequent rules are evaluated after this rule matched.
    pub fn continue_matching(&self) -> bool {
        self.continue_matching
    }

    /// Returns the write overrides for metrics matching this rule.
    pub fn overrides(&self) -> &WriteOverrides {
        &self.overrides
    }
}

/// The compiled routing rules of a [`CarbonIngester`](crate::CarbonIngester).
#[derive(Debug, Default)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    /// Validates and compiles the rules of the given configuration.
    pub fn compile(config: &CarbonIngesterConfig) -> Result<Self, RuleError> {
        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| Rule::compile(index, rule))
            .collect::<Result<_, _>>()?;

        Ok(Self { rules })
    }

    /// Returns the rules a metric is routed by.
    ///
    /// Rules are evaluated in order. Evaluation stops after the first matching rule, unless that
    /// rule continues matching.
    pub fn matching<'a>(&'a self, name: &'a [u8]) -> impl Iterator<Item = &'a Rule> + 'a {
        let mut done = false;
        self.rules
            .iter()
            .filter(move |rule| rule.is_match(name))
            .take_while(move |rule| {
                let take = !done;
                done = !rule.continue_matching;
                take
            })
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ingest_metrics::{AggregationType, StoragePolicy};
    use similar_asserts::assert_eq;

    use super::*;
    use crate::AggregationConfig;

    fn policies() -> Vec<StoragePolicy> {
        vec!["1m:40d".parse().unwrap()]
    }

    fn contains(needle: &str, continue_matching: bool) -> RuleConfig {
        RuleConfig {
            contains: Some(needle.to_owned()),
            continue_matching,
            policies: policies(),
            ..Default::default()
        }
    }

    fn compile(rules: Vec<RuleConfig>) -> Result<Rules, RuleError> {
        Rules::compile(&CarbonIngesterConfig { rules })
    }

    fn matching_indices(rules: &Rules, name: &[u8]) -> Vec<usize> {
        rules
            .matching(name)
            .map(|m| {
                rules
                    .rules
                    .iter()
                    .position(|r| std::ptr::eq(r, m))
                    .unwrap_or(usize::MAX)
            })
            .collect()
    }

    #[test]
    fn test_first_match_wins() {
        let rules = compile(vec![
            contains("cpu", false),
            contains("servers", false),
            contains("servers", false),
        ])
        .unwrap();

        assert_eq!(matching_indices(&rules, b"servers.web01.cpu"), vec![0]);
        assert_eq!(matching_indices(&rules, b"servers.web01.mem"), vec![1]);
        assert!(matching_indices(&rules, b"app.requests").is_empty());
    }

    #[test]
    fn test_continue_matching() {
        let rules = compile(vec![
            contains("servers", true),
            contains("nothing", false),
            contains("web", false),
            contains("servers", false),
        ])
        .unwrap();

        assert_eq!(matching_indices(&rules, b"servers.web01.cpu"), vec![0, 2]);
    }

    #[test]
    fn test_pattern() {
        let rules = compile(vec![RuleConfig {
            pattern: Some(r"^servers\.[^.]+\.cpu$".to_owned()),
            policies: policies(),
            ..Default::default()
        }])
        .unwrap();

        assert!(rules.rules[0].is_match(b"servers.web01.cpu"));
        assert!(!rules.rules[0].is_match(b"servers.web01.cpu.user"));
    }

    #[test]
    fn test_empty_contains_matches_everything() {
        let rules = compile(vec![contains("", false)]).unwrap();
        assert_eq!(matching_indices(&rules, b"a"), vec![0]);
    }

    #[test]
    fn test_aggregated_overrides() {
        let rules = compile(vec![RuleConfig {
            aggregation: AggregationConfig {
                enabled: true,
                ty: AggregationType::Sum,
            },
            ..contains("servers", false)
        }])
        .unwrap();

        assert_eq!(
            rules.rules[0].overrides(),
            &WriteOverrides {
                override_mapping_rules: true,
                mapping_rules: vec![MappingRule {
                    aggregations: vec![AggregationType::Sum],
                    policies: policies(),
                }],
                override_storage_policies: true,
                storage_policies: vec![],
            }
        );
    }

    #[test]
    fn test_unaggregated_overrides() {
        let rules = compile(vec![RuleConfig {
            aggregation: AggregationConfig {
                enabled: false,
                ty: AggregationType::Mean,
            },
            ..contains("servers", false)
        }])
        .unwrap();

        let overrides = rules.rules[0].overrides();
        assert!(!overrides.should_downsample());
        assert_eq!(overrides.storage_policies, policies());
    }

    #[test]
    fn test_invalid_rules() {
        let missing = RuleConfig {
            policies: policies(),
            ..Default::default()
        };
        let ambiguous = RuleConfig {
            pattern: Some("a".to_owned()),
            ..contains("b", false)
        };
        let no_policies = RuleConfig {
            policies: vec![],
            ..contains("a", false)
        };
        let bad_pattern = RuleConfig {
            pattern: Some("(".to_owned()),
            policies: policies(),
            ..Default::default()
        };

        let messages: Vec<_> = [missing, ambiguous, no_policies, bad_pattern]
            .into_iter()
            .map(|rule| compile(vec![contains("ok", false), rule]).unwrap_err().to_string())
            .collect();

        insta::assert_debug_snapshot!(messages, @r###"
        [
            "rule 1 has neither a pattern nor a contains matcher",
            "rule 1 has both a pattern and a contains matcher",
            "rule 1 has no storage policies",
            "rule 1 has an invalid pattern",
        ]
        "###);
    }
}

//! Resolution and retention of stored series.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::TimeUnit;

/// Units a duration may be written in, coarsest first.
const DURATION_UNITS: [TimeUnit; 8] = [
    TimeUnit::Year,
    TimeUnit::Day,
    TimeUnit::Hour,
    TimeUnit::Minute,
    TimeUnit::Second,
    TimeUnit::Millisecond,
    TimeUnit::Microsecond,
    TimeUnit::Nanosecond,
];

/// Parses a duration of the form `<integer><unit>`, e.g. `10s` or `40d`.
fn parse_duration(s: &str) -> Option<Duration> {
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    let (amount, unit) = s.split_at(split);
    let amount: u32 = amount.parse().ok()?;

    match unit.parse::<TimeUnit>().ok()?.value() {
        Some(unit) => unit.checked_mul(amount),
        None => None,
    }
}

/// Writes a duration in the coarsest unit that represents it exactly.
fn write_duration(f: &mut fmt::Formatter<'_>, duration: Duration) -> fmt::Result {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return f.write_str("0s");
    }

    for unit in DURATION_UNITS {
        let Some(unit_nanos) = unit.value().map(|v| v.as_nanos()) else {
            continue;
        };
        if nanos % unit_nanos == 0 {
            return write!(f, "{}{unit}", nanos / unit_nanos);
        }
    }

    write!(f, "{nanos}ns")
}

/// Error returned when parsing a [`StoragePolicy`] or one of its parts.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid storage policy {input:?}: {reason}")]
pub struct ParseStoragePolicyError {
    input: String,
    reason: &'static str,
}

impl ParseStoragePolicyError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            reason,
        }
    }
}

/// The sampling window of a stored series and the precision of its timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// The size of one bucket.
    pub window: Duration,
    /// The precision timestamps are stored with.
    pub precision: TimeUnit,
}

impl Resolution {
    /// Creates a resolution with the default precision for `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            precision: TimeUnit::precision_for(window),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_duration(f, self.window)?;
        if self.precision != TimeUnit::precision_for(self.window) {
            write!(f, "@1{}", self.precision)?;
        }
        Ok(())
    }
}

impl FromStr for Resolution {
    type Err = ParseStoragePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (raw_window, raw_precision) = match s.split_once('@') {
            Some((window, precision)) => (window, Some(precision)),
            None => (s, None),
        };

        let window = parse_duration(raw_window)
            .ok_or_else(|| ParseStoragePolicyError::new(s, "invalid resolution window"))?;
        if window.is_zero() {
            return Err(ParseStoragePolicyError::new(
                s,
                "resolution window must be positive",
            ));
        }

        let Some(raw_precision) = raw_precision else {
            return Ok(Self::new(window));
        };

        let precision = raw_precision
            .strip_prefix('1')
            .and_then(|unit| unit.parse::<TimeUnit>().ok())
            .filter(TimeUnit::is_precision)
            .ok_or_else(|| ParseStoragePolicyError::new(s, "invalid resolution precision"))?;

        let fits = precision
            .value()
            .is_some_and(|p| window.as_nanos() % p.as_nanos() == 0);
        if !fits {
            return Err(ParseStoragePolicyError::new(
                s,
                "precision does not divide the resolution window",
            ));
        }

        Ok(Self { window, precision })
    }
}

/// How long a stored series is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Retention(pub Duration);

impl Retention {
    /// Returns the retention period.
    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_duration(f, self.0)
    }
}

impl FromStr for Retention {
    type Err = ParseStoragePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_duration(s) {
            Some(duration) if !duration.is_zero() => Ok(Self(duration)),
            _ => Err(ParseStoragePolicyError::new(s, "invalid retention")),
        }
    }
}

/// Identifies the resolution and retention of a storage namespace.
///
/// Storage policies are written as `<resolution>:<retention>`, for instance `10s:2d` or `1m:40d`.
/// The resolution may specify an explicit timestamp precision as in `1m@1ms:40d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StoragePolicy {
    /// The resolution of the stored series.
    pub resolution: Resolution,
    /// The retention of the stored series.
    pub retention: Retention,
}

impl StoragePolicy {
    /// Creates a storage policy with the default precision for `window`.
    pub fn new(window: Duration, retention: Duration) -> Self {
        Self {
            resolution: Resolution::new(window),
            retention: Retention(retention),
        }
    }
}

impl fmt::Display for StoragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resolution, self.retention)
    }
}

impl FromStr for StoragePolicy {
    type Err = ParseStoragePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resolution, retention) = s.split_once(':').ok_or_else(|| {
            ParseStoragePolicyError::new(s, "expected <resolution>:<retention>")
        })?;

        let reason = |e: ParseStoragePolicyError| ParseStoragePolicyError::new(s, e.reason);
        Ok(Self {
            resolution: resolution.parse().map_err(reason)?,
            retention: retention.parse().map_err(reason)?,
        })
    }
}

ingest_common::impl_str_serde!(StoragePolicy, "a storage policy such as \"1m:40d\"");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_policy() {
        let policy: StoragePolicy = "10s:2d".parse().unwrap();
        assert_eq!(policy.resolution.window, Duration::from_secs(10));
        assert_eq!(policy.resolution.precision, TimeUnit::Second);
        assert_eq!(policy.retention.duration(), Duration::from_secs(2 * 86_400));
    }

    #[test]
    fn test_display_uses_coarsest_unit() {
        let policy = StoragePolicy::new(Duration::from_secs(60), Duration::from_secs(40 * 86_400));
        assert_eq!(policy.to_string(), "1m:40d");

        let policy = StoragePolicy::new(Duration::from_millis(500), Duration::from_secs(7200));
        assert_eq!(policy.to_string(), "500ms:2h");
    }

    #[test]
    fn test_explicit_precision() {
        let policy: StoragePolicy = "1m@1ms:40d".parse().unwrap();
        assert_eq!(policy.resolution.precision, TimeUnit::Millisecond);
        assert_eq!(policy.to_string(), "1m@1ms:40d");

        // The default precision is not repeated.
        let policy: StoragePolicy = "1m@1s:40d".parse().unwrap();
        assert_eq!(policy.to_string(), "1m:40d");
    }

    #[test]
    fn test_invalid_policies() {
        let cases = [
            "10s",
            "10s:",
            ":2d",
            "0s:2d",
            "10s:0d",
            "10x:2d",
            "ten:2d",
            "10s@1m:2d",
            "1500ms@1s:2d",
        ];

        for case in cases {
            let error = case.parse::<StoragePolicy>().unwrap_err();
            assert!(error.to_string().contains(case), "{case}: {error}");
        }
    }

    #[test]
    fn test_serde() {
        let policies: Vec<StoragePolicy> = serde_json::from_str(r#"["1m:40d", "10s:2d"]"#).unwrap();
        insta::assert_json_snapshot!(policies, @r###"
        [
          "1m:40d",
          "10s:2d"
        ]
        "###);
    }
}

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ingest_common::UnixTimestamp;

/// A single sample of a series.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Datapoint {
    /// The time the sample was taken.
    pub timestamp: UnixTimestamp,
    /// The sampled value.
    pub value: f64,
}

impl Datapoint {
    /// Creates a new datapoint.
    pub fn new(timestamp: UnixTimestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// The ordered samples of one series.
pub type Datapoints = Vec<Datapoint>;

/// Time resolution unit attached to a write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// No unit.
    #[default]
    None,
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Microseconds.
    Microsecond,
    /// Nanoseconds.
    Nanosecond,
    /// Minutes.
    Minute,
    /// Hours.
    Hour,
    /// Days.
    Day,
    /// Years of 365 days.
    Year,
}

impl TimeUnit {
    /// Units that can express the precision of a resolution window, coarsest first.
    const PRECISIONS: [TimeUnit; 4] = [
        TimeUnit::Second,
        TimeUnit::Millisecond,
        TimeUnit::Microsecond,
        TimeUnit::Nanosecond,
    ];

    /// Returns the short name of the unit, e.g. `"ms"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "us",
            Self::Nanosecond => "ns",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Year => "y",
        }
    }

    /// Returns the duration of one unit, or `None` for [`TimeUnit::None`].
    pub fn value(&self) -> Option<Duration> {
        Some(match self {
            Self::None => return None,
            Self::Second => Duration::from_secs(1),
            Self::Millisecond => Duration::from_millis(1),
            Self::Microsecond => Duration::from_micros(1),
            Self::Nanosecond => Duration::from_nanos(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(60 * 60),
            Self::Day => Duration::from_secs(24 * 60 * 60),
            Self::Year => Duration::from_secs(365 * 24 * 60 * 60),
        })
    }

    /// Returns the coarsest sub-minute unit that evenly divides `window`.
    ///
    /// A zero window yields [`TimeUnit::Second`].
    pub fn precision_for(window: Duration) -> Self {
        let nanos = window.as_nanos();
        Self::PRECISIONS
            .into_iter()
            .find(|unit| unit.value().is_some_and(|v| nanos % v.as_nanos() == 0))
            .unwrap_or(Self::Nanosecond)
    }

    /// Returns `true` if this unit may be used as the precision of a resolution.
    pub fn is_precision(&self) -> bool {
        Self::PRECISIONS.contains(self)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`TimeUnit`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown time unit {0:?}")]
pub struct ParseTimeUnitError(String);

impl std::str::FromStr for TimeUnit {
    type Err = ParseTimeUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "none" => Self::None,
            "s" => Self::Second,
            "ms" => Self::Millisecond,
            "us" => Self::Microsecond,
            "ns" => Self::Nanosecond,
            "m" => Self::Minute,
            "h" => Self::Hour,
            "d" => Self::Day,
            "y" => Self::Year,
            other => return Err(ParseTimeUnitError(other.to_owned())),
        })
    }
}

ingest_common::impl_str_serde!(TimeUnit, "a time unit string");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_for() {
        assert_eq!(
            TimeUnit::precision_for(Duration::from_secs(60)),
            TimeUnit::Second
        );
        assert_eq!(
            TimeUnit::precision_for(Duration::from_millis(1500)),
            TimeUnit::Millisecond
        );
        assert_eq!(
            TimeUnit::precision_for(Duration::from_nanos(10)),
            TimeUnit::Nanosecond
        );
    }

    #[test]
    fn test_unit_serde() {
        let json = serde_json::to_string(&[TimeUnit::Millisecond, TimeUnit::None]).unwrap();
        assert_eq!(json, r#"["ms","none"]"#);

        let unit: TimeUnit = serde_json::from_str(r#""y""#).unwrap();
        assert_eq!(unit.value(), Some(Duration::from_secs(365 * 24 * 60 * 60)));
        assert!(serde_json::from_str::<TimeUnit>(r#""fortnight""#).is_err());
    }

    #[test]
    fn test_datapoint_json() {
        let datapoint = Datapoint::new(UnixTimestamp::from_secs(1_700_000_000), 4.5);
        let json = serde_json::to_string(&datapoint).unwrap();
        assert_eq!(json, r#"{"timestamp":1700000000,"value":4.5}"#);
    }
}

//! Timestamps of ingested samples.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Whole seconds since the unix epoch, 1970-01-01 00:00 UTC.
///
/// Serializes as a plain integer.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    /// Creates a timestamp from seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Converts a system time, truncating to whole seconds.
    ///
    /// Times before the epoch map to the epoch.
    pub fn from_system(time: SystemTime) -> Self {
        let since_epoch = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(since_epoch.as_secs())
    }

    /// Returns the current time.
    pub fn now() -> Self {
        Self::from_system(SystemTime::now())
    }

    /// Returns the seconds since the epoch.
    pub const fn as_secs(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixTimestamp({})", self.0)
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The time between two timestamps, or zero if `rhs` is later.
impl std::ops::Sub for UnixTimestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_secs(self.0.saturating_sub(rhs.0))
    }
}

/// Error returned when a string is not a number of seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseUnixTimestampError(String);

impl fmt::Display for ParseUnixTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid unix timestamp {:?}", self.0)
    }
}

impl std::error::Error for ParseUnixTimestampError {}

impl FromStr for UnixTimestamp {
    type Err = ParseUnixTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Self)
            .map_err(|_| ParseUnixTimestampError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let ts: UnixTimestamp = "1554837142".parse().unwrap();
        assert_eq!(ts.as_secs(), 1554837142);

        let error = "15548.37142".parse::<UnixTimestamp>().unwrap_err();
        assert_eq!(error.to_string(), r#"invalid unix timestamp "15548.37142""#);
    }

    #[test]
    fn test_sub_saturates() {
        let earlier = UnixTimestamp::from_secs(10);
        let later = UnixTimestamp::from_secs(25);
        assert_eq!(later - earlier, Duration::from_secs(15));
        assert_eq!(earlier - later, Duration::ZERO);
    }

    #[test]
    fn test_serde_as_integer() {
        let ts = UnixTimestamp::from_secs(1_700_000_000);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1700000000");
        assert_eq!(serde_json::from_str::<UnixTimestamp>("42").unwrap().as_secs(), 42);
    }

    #[test]
    fn test_before_epoch() {
        let time = SystemTime::UNIX_EPOCH - Duration::from_secs(5);
        assert_eq!(UnixTimestamp::from_system(time), UnixTimestamp::default());
    }
}

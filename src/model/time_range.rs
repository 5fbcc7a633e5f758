use std::str::FromStr;

use anyhow::{Error, bail};
use chrono::TimeDelta;

/// Lookback window offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    Hours12,
    #[default]
    Hours24,
    Hours48,
    Days7,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Hours12,
        TimeRange::Hours24,
        TimeRange::Hours48,
        TimeRange::Days7,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Hours12 => "12h",
            TimeRange::Hours24 => "24h",
            TimeRange::Hours48 => "48h",
            TimeRange::Days7 => "7d",
        }
    }

    pub fn hours(&self) -> i64 {
        match self {
            TimeRange::Hours12 => 12,
            TimeRange::Hours24 => 24,
            TimeRange::Hours48 => 48,
            TimeRange::Days7 => 168,
        }
    }

    pub fn window(&self) -> TimeDelta {
        TimeDelta::hours(self.hours())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "12h" => Ok(TimeRange::Hours12),
            "24h" => Ok(TimeRange::Hours24),
            "48h" => Ok(TimeRange::Hours48),
            "7d" | "168h" => Ok(TimeRange::Days7),
            _ => bail!("unknown time range: {}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_offered_range() {
        for range in TimeRange::ALL {
            assert_eq!(range.as_str().parse::<TimeRange>().unwrap(), range);
        }
    }

    #[test]
    fn seven_days_is_168_hours() {
        assert_eq!("7d".parse::<TimeRange>().unwrap().window(), TimeDelta::hours(168));
        assert_eq!("168h".parse::<TimeRange>().unwrap(), TimeRange::Days7);
    }

    #[test]
    fn rejects_unknown_range() {
        assert!("3h".parse::<TimeRange>().is_err());
    }

    #[test]
    fn defaults_to_a_day() {
        assert_eq!(TimeRange::default().hours(), 24);
    }
}

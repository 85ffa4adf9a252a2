//! Time utilities and protocol timing constants.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protocol timing constants.
pub mod constants {
    use super::Duration;

    /// How long an issued quote stays firm (60 seconds).
    pub fn quote_validity() -> Duration {
        Duration::seconds(60)
    }

    /// Upper bound on a rate-source fetch (2 seconds).
    pub fn rate_fetch_timeout() -> Duration {
        Duration::seconds(2)
    }

    /// How stale a cached rate may be and still back an indicative
    /// response (30 seconds).
    pub fn stale_rate_allowance() -> Duration {
        Duration::seconds(30)
    }

    /// Maximum validity window of a treasury deal (7 days).
    pub fn max_deal_validity() -> Duration {
        Duration::days(7)
    }
}

/// A timestamp with timezone (always UTC for RailFX).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// A wall-clock minute of day, `00:00` to `23:59`, parsed from `hh:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            minutes: hour * 60 + minute,
        })
    }

    /// The minute-of-day of a UTC timestamp.
    pub fn of(ts: Timestamp) -> Self {
        Self {
            minutes: (ts.hour() * 60 + ts.minute()) as u16,
        }
    }

    pub fn hour(&self) -> u16 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u16 {
        self.minutes % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| format!("expected hh:mm, got {s:?}"))?;
        let hour: u16 = h.parse().map_err(|_| format!("bad hour in {s:?}"))?;
        let minute: u16 = m.parse().map_err(|_| format!("bad minute in {s:?}"))?;
        TimeOfDay::new(hour, minute).ok_or_else(|| format!("out of range: {s:?}"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> String {
        t.to_string()
    }
}

/// A half-open daily window `[open, close)`. A window whose close precedes
/// its open wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWindow {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl DailyWindow {
    pub fn new(open: TimeOfDay, close: TimeOfDay) -> Self {
        Self { open, close }
    }

    /// Whole-day window.
    pub fn always() -> Self {
        Self {
            open: TimeOfDay { minutes: 0 },
            close: TimeOfDay { minutes: 0 },
        }
    }

    /// Membership in the half-open window. The degenerate `open == close`
    /// window contains every time of day.
    pub fn contains(&self, t: TimeOfDay) -> bool {
        if self.open == self.close {
            return true;
        }
        if self.open < self.close {
            self.open <= t && t < self.close
        } else {
            t >= self.open || t < self.close
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(tod("09:30").to_string(), "09:30");
        assert!("25:00".parse::<TimeOfDay>().is_err());
        assert!("0930".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_window_half_open() {
        let window = DailyWindow::new(tod("09:00"), tod("17:00"));
        assert!(window.contains(tod("09:00")));
        assert!(window.contains(tod("16:59")));
        assert!(!window.contains(tod("17:00")));
        assert!(!window.contains(tod("08:59")));
    }

    #[test]
    fn test_window_wraps_midnight() {
        let window = DailyWindow::new(tod("22:00"), tod("06:00"));
        assert!(window.contains(tod("23:30")));
        assert!(window.contains(tod("05:59")));
        assert!(!window.contains(tod("06:00")));
        assert!(!window.contains(tod("12:00")));
    }

    #[test]
    fn test_always_window() {
        assert!(DailyWindow::always().contains(tod("00:00")));
        assert!(DailyWindow::always().contains(tod("23:59")));
    }
}

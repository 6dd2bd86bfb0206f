//! Query windows offered by the metrics dashboards.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Number of sampling buckets a window is split into.
const BUCKETS_PER_WINDOW: u32 = 6;

/// A duration value that is not one of the supported windows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDuration {
    /// The minute count is not a supported window.
    #[error("{0} minutes is not a supported time window")]
    Unsupported(u32),

    /// The text could not be parsed as a duration.
    #[error("cannot parse time window: {0:?}")]
    Malformed(String),
}

/// The time window a metrics query looks back over.
///
/// Only the ten windows offered by the console are representable; anything
/// else is rejected at the edges by [`TryFrom<u32>`] and [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u32", try_from = "u32"))]
pub enum TimeDuration {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    #[default]
    OneHour,
    ThreeHours,
    SixHours,
    TwelveHours,
    OneDay,
    TwoDays,
    SevenDays,
}

impl TimeDuration {
    /// Every supported window, shortest first.
    pub const ALL: [TimeDuration; 10] = [
        TimeDuration::FiveMinutes,
        TimeDuration::FifteenMinutes,
        TimeDuration::ThirtyMinutes,
        TimeDuration::OneHour,
        TimeDuration::ThreeHours,
        TimeDuration::SixHours,
        TimeDuration::TwelveHours,
        TimeDuration::OneDay,
        TimeDuration::TwoDays,
        TimeDuration::SevenDays,
    ];

    /// Length of the window in minutes.
    pub const fn minutes(self) -> u32 {
        match self {
            TimeDuration::FiveMinutes => 5,
            TimeDuration::FifteenMinutes => 15,
            TimeDuration::ThirtyMinutes => 30,
            TimeDuration::OneHour => 60,
            TimeDuration::ThreeHours => 180,
            TimeDuration::SixHours => 360,
            TimeDuration::TwelveHours => 720,
            TimeDuration::OneDay => 1440,
            TimeDuration::TwoDays => 2880,
            TimeDuration::SevenDays => 10080,
        }
    }

    /// Sampling step for a query over this window, in minutes.
    ///
    /// Never less than one minute.
    pub const fn interval_minutes(self) -> u32 {
        let step = self.minutes() / BUCKETS_PER_WINDOW;
        if step == 0 {
            1
        } else {
            step
        }
    }

    /// Length of the window as a standard duration.
    pub const fn to_duration(self) -> core::time::Duration {
        core::time::Duration::from_secs(self.minutes() as u64 * 60)
    }
}

impl From<TimeDuration> for u32 {
    fn from(d: TimeDuration) -> Self {
        d.minutes()
    }
}

impl TryFrom<u32> for TimeDuration {
    type Error = InvalidDuration;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        TimeDuration::ALL
            .into_iter()
            .find(|d| d.minutes() == minutes)
            .ok_or(InvalidDuration::Unsupported(minutes))
    }
}

impl FromStr for TimeDuration {
    type Err = InvalidDuration;

    /// Accepts bare minutes (`"60"`) or a `m`/`h`/`d` suffix (`"15m"`, `"1h"`, `"7d"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let malformed = || InvalidDuration::Malformed(s.to_string());

        let (digits, scale) = match s.char_indices().last() {
            Some((idx, 'm')) => (&s[..idx], 1),
            Some((idx, 'h')) => (&s[..idx], 60),
            Some((idx, 'd')) => (&s[..idx], 1440),
            Some(_) => (s, 1),
            None => return Err(malformed()),
        };

        let value: u32 = digits.parse().map_err(|_| malformed())?;
        let minutes = value.checked_mul(scale).ok_or_else(malformed)?;
        TimeDuration::try_from(minutes)
    }
}

impl fmt::Display for TimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.minutes();
        if minutes % 1440 == 0 {
            write!(f, "{}d", minutes / 1440)
        } else if minutes % 60 == 0 {
            write!(f, "{}h", minutes / 60)
        } else {
            write!(f, "{}m", minutes)
        }
    }
}

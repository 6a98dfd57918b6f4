//! Wall-clock times of day (`"HH:MM"` strings in snapshots).

use std::fmt;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time of day with minute resolution, always in `[00:00, 24:00)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    /// Build from hours and minutes, wrapping past midnight.
    pub fn new(hour: u32, minute: u32) -> Self {
        Self::from_minutes(hour as i64 * 60 + minute as i64)
    }

    /// Build from minutes since midnight, wrapping into a single day.
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            minutes: minutes.rem_euclid(MINUTES_PER_DAY as i64) as u16,
        }
    }

    /// Build from a fractional hour, wrapping into a single day.
    pub fn from_hours(hours: f32) -> Self {
        if !hours.is_finite() {
            return Self { minutes: 0 };
        }
        Self::from_minutes((hours * 60.0).round() as i64)
    }

    /// Parse `"HH:MM"`, also accepting `"H:MM"` and a trailing `":SS"`.
    ///
    /// Returns `None` for anything malformed; callers pick their own default.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hour: u32 = parts.next()?.trim().parse().ok()?;
        let minute: u32 = parts.next()?.trim().parse().ok()?;
        if let Some(sec) = parts.next() {
            sec.trim().parse::<u32>().ok().filter(|s| *s < 60)?;
        }
        if parts.next().is_some() || hour > 24 || minute > 59 || (hour == 24 && minute > 0) {
            return None;
        }
        Some(Self::new(hour, minute))
    }

    /// Parse, falling back to `default` on malformed input.
    pub fn parse_or(s: &str, default: Self) -> Self {
        Self::parse(s).unwrap_or(default)
    }

    #[inline]
    pub fn minutes(&self) -> u16 {
        self.minutes
    }

    /// Fractional hour in `[0.0, 24.0)`.
    #[inline]
    pub fn hour(&self) -> f32 {
        self.minutes as f32 / 60.0
    }

    /// Progress through the daylight span: 0 at sunrise, 1 at sunset.
    ///
    /// Outside daylight the value keeps going (negative before sunrise, > 1
    /// after sunset) so callers can tell how deep into the night it is.
    pub fn day_progress(&self, sunrise: ClockTime, sunset: ClockTime) -> f32 {
        let span = (sunset.minutes as i32 - sunrise.minutes as i32).rem_euclid(MINUTES_PER_DAY as i32);
        if span == 0 {
            return 0.5;
        }
        let day = MINUTES_PER_DAY as i32;
        let mut since = (self.minutes as i32 - sunrise.minutes as i32).rem_euclid(day);
        // Split the night evenly: first half reads as after sunset, second half as before sunrise
        if since > span + (day - span) / 2 {
            since -= day;
        }
        since as f32 / span as f32
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

//! Astronomy model.
//!
//! Pure functions from (timestamp, latitude, longitude) to sun and moon
//! position, estimated sunrise/sunset, and season. No internal state; the
//! output is continuous as time advances apart from the azimuth wrap.

pub mod clock;
pub mod moon;
pub mod season;
pub mod sun;

pub use clock::ClockTime;
pub use moon::{moon_phase, moon_position, phase_illumination, MoonPosition};
pub use season::{season_for, Season};
pub use sun::{estimate_sun_times, solar_position, DaylightKind, SunPosition, SunTimes};

use chrono::{DateTime, Duration, Utc};

/// Everything the sky needs to know about the sky bodies at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AstronomySnapshot {
    pub sun: SunPosition,
    pub moon: MoonPosition,
    pub sun_times: SunTimes,
    pub season: Season,
    /// Observer's local wall-clock time.
    pub local_time: ClockTime,
}

impl AstronomySnapshot {
    /// Compute all bodies for `ts` at the given location.
    ///
    /// `utc_offset_minutes` only affects the wall-clock fields (local time,
    /// sunrise/sunset and the calendar date used for the season).
    pub fn compute(ts: DateTime<Utc>, latitude: f32, longitude: f32, utc_offset_minutes: i32) -> Self {
        let local = ts.naive_utc() + Duration::minutes(utc_offset_minutes as i64);
        let date = local.date();
        Self {
            sun: solar_position(ts, latitude, longitude),
            moon: moon_position(ts, latitude, longitude),
            sun_times: estimate_sun_times(date, latitude, longitude, utc_offset_minutes),
            season: season_for(date, latitude),
            local_time: ClockTime::from_minutes(
                (local.and_utc().timestamp().rem_euclid(86_400) / 60) as i64,
            ),
        }
    }
}

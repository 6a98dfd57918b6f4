//! The external snapshot the engine renders from.
//!
//! A `SkyStateInput` is replaced wholesale whenever live data refreshes (or a
//! developer panel forces values); nothing inside the engine mutates one.
//! Consumers never trust upstream clamping: every normalized field is read
//! through an accessor that clamps it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::astronomy::{AstronomySnapshot, ClockTime, Season};
use crate::color::ease::{clamp01, clamp_or};
use crate::core::{Error, Result};

/// Kind of precipitation reported by the weather source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationKind {
    #[default]
    None,
    Rain,
    Snow,
    Storm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInfo {
    /// Local wall-clock time, `"HH:MM"`.
    pub local_time: String,
    pub sunrise: String,
    pub sunset: String,
}

impl TimeInfo {
    pub fn local(&self) -> ClockTime {
        ClockTime::parse_or(&self.local_time, ClockTime::new(12, 0))
    }

    pub fn sunrise(&self) -> ClockTime {
        ClockTime::parse_or(&self.sunrise, ClockTime::new(6, 0))
    }

    pub fn sunset(&self) -> ClockTime {
        ClockTime::parse_or(&self.sunset, ClockTime::new(18, 0))
    }
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self {
            local_time: "12:00".to_string(),
            sunrise: "06:00".to_string(),
            sunset: "18:00".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AstronomyInfo {
    /// Degrees above the horizon; negative below.
    pub sun_elevation: f32,
    /// Compass bearing in degrees.
    pub sun_azimuth: f32,
    pub moon_elevation: f32,
    /// 0.0 = new, 0.5 = full.
    pub moon_phase: f32,
}

impl AstronomyInfo {
    /// Sun elevation clamped to `[-90, 90]` (NaN reads as the horizon).
    pub fn elevation(&self) -> f32 {
        clamp_or(self.sun_elevation, -90.0, 90.0, 0.0)
    }

    /// Sun azimuth wrapped into `[0, 360)` (NaN reads as due south).
    pub fn azimuth(&self) -> f32 {
        if self.sun_azimuth.is_finite() { self.sun_azimuth.rem_euclid(360.0) } else { 180.0 }
    }

    pub fn moon_elevation(&self) -> f32 {
        clamp_or(self.moon_elevation, -90.0, 90.0, -90.0)
    }

    pub fn moon_phase(&self) -> f32 {
        clamp01(self.moon_phase)
    }
}

impl Default for AstronomyInfo {
    fn default() -> Self {
        Self {
            sun_elevation: 45.0,
            sun_azimuth: 180.0,
            moon_elevation: -30.0,
            moon_phase: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInfo {
    /// Fraction of the sky covered, 0..1.
    #[serde(default)]
    pub cloud_cover: f32,
    #[serde(default)]
    pub precipitation: PrecipitationKind,
    /// 0..1.
    #[serde(default)]
    pub fog_density: f32,
    /// Kilometres.
    #[serde(default = "default_visibility")]
    pub visibility_km: f32,
    #[serde(default)]
    pub wind_speed_kmh: Option<f32>,
    /// Compass degrees.
    #[serde(default)]
    pub wind_direction_deg: Option<f32>,
    /// Millimetres per hour.
    #[serde(default)]
    pub precipitation_amount_mm: Option<f32>,
    /// Percent, 0..100.
    #[serde(default)]
    pub precipitation_probability: Option<f32>,
    /// WMO weather interpretation code.
    #[serde(default)]
    pub weather_code: Option<u16>,
}

fn default_visibility() -> f32 {
    10.0
}

impl WeatherInfo {
    pub fn cover(&self) -> f32 {
        clamp01(self.cloud_cover)
    }

    pub fn fog(&self) -> f32 {
        clamp01(self.fog_density)
    }

    pub fn visibility(&self) -> f32 {
        clamp_or(self.visibility_km, 0.0, 1000.0, default_visibility())
    }

    /// Wind speed in km/h, 0 when absent or invalid.
    pub fn wind_speed(&self) -> f32 {
        self.wind_speed_kmh
            .filter(|s| s.is_finite())
            .map_or(0.0, |s| s.max(0.0))
    }

    pub fn wind_direction(&self) -> Option<f32> {
        self.wind_direction_deg
            .filter(|d| d.is_finite())
            .map(|d| d.rem_euclid(360.0))
    }
}

impl Default for WeatherInfo {
    fn default() -> Self {
        Self {
            cloud_cover: 0.0,
            precipitation: PrecipitationKind::None,
            fog_density: 0.0,
            visibility_km: default_visibility(),
            wind_speed_kmh: None,
            wind_direction_deg: None,
            precipitation_amount_mm: None,
            precipitation_probability: None,
            weather_code: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub latitude: f32,
    pub longitude: f32,
    #[serde(default)]
    pub season: Season,
}

/// One complete frame-of-reference for the sky.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SkyStateInput {
    #[serde(default)]
    pub time: TimeInfo,
    #[serde(default)]
    pub astronomy: AstronomyInfo,
    #[serde(default)]
    pub weather: WeatherInfo,
    #[serde(default)]
    pub environment: EnvironmentInfo,
}

impl SkyStateInput {
    /// Parse a snapshot from JSON (camelCase field names).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidInput(e.to_string()))
    }

    /// Build a snapshot from live astronomy plus already-normalized weather.
    pub fn synthesize(
        ts: DateTime<Utc>,
        latitude: f32,
        longitude: f32,
        utc_offset_minutes: i32,
        weather: WeatherInfo,
    ) -> Self {
        let astro = AstronomySnapshot::compute(ts, latitude, longitude, utc_offset_minutes);
        Self {
            time: TimeInfo {
                local_time: astro.local_time.to_string(),
                sunrise: astro.sun_times.sunrise.to_string(),
                sunset: astro.sun_times.sunset.to_string(),
            },
            astronomy: AstronomyInfo {
                sun_elevation: astro.sun.elevation,
                sun_azimuth: astro.sun.azimuth,
                moon_elevation: astro.moon.elevation,
                moon_phase: astro.moon.phase,
            },
            weather,
            environment: EnvironmentInfo {
                latitude,
                longitude,
                season: astro.season,
            },
        }
    }

    /// Force the sun position (developer override).
    pub fn with_sun(mut self, elevation: f32, azimuth: f32) -> Self {
        self.astronomy.sun_elevation = elevation;
        self.astronomy.sun_azimuth = azimuth;
        self
    }

    /// Force the moon (developer override).
    pub fn with_moon(mut self, elevation: f32, phase: f32) -> Self {
        self.astronomy.moon_elevation = elevation;
        self.astronomy.moon_phase = phase;
        self
    }

    /// Replace the weather block (developer override).
    pub fn with_weather(mut self, weather: WeatherInfo) -> Self {
        self.weather = weather;
        self
    }
}

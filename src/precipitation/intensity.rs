//! Precipitation kind and intensity bucket from a weather snapshot.
//!
//! The bucket comes from the WMO weather code when it names an intensity,
//! then from the reported amount, then from the probability, and finally
//! from a per-kind default.

use crate::precipitation::table::{IntensityBucket, ParticleKind};
use crate::sky::{PrecipitationKind, WeatherInfo};

impl IntensityBucket {
    /// Intensity implied by a WMO weather interpretation code, if any.
    pub fn from_weather_code(code: u16) -> Option<Self> {
        use IntensityBucket::*;
        match code {
            // Drizzle, freezing drizzle
            51 | 56 => Some(Light),
            53 => Some(Moderate),
            55 | 57 => Some(Heavy),
            // Rain, freezing rain
            61 | 66 => Some(Light),
            63 => Some(Moderate),
            65 | 67 => Some(Heavy),
            // Snow fall, snow grains
            71 | 77 => Some(Light),
            73 => Some(Moderate),
            75 => Some(Heavy),
            // Showers
            80 | 85 => Some(Light),
            81 => Some(Moderate),
            82 | 86 => Some(Heavy),
            // Thunderstorm, with hail
            95 => Some(Moderate),
            96 | 99 => Some(Heavy),
            _ => None,
        }
    }

    /// Intensity from an hourly amount in millimetres (water equivalent).
    pub fn from_amount(kind: ParticleKind, mm_per_hour: f32) -> Option<Self> {
        if !mm_per_hour.is_finite() || mm_per_hour <= 0.0 {
            return None;
        }
        let (moderate, heavy) = match kind {
            ParticleKind::Rain => (2.5, 7.6),
            ParticleKind::Snow => (1.0, 3.0),
        };
        Some(if mm_per_hour < moderate {
            IntensityBucket::Light
        } else if mm_per_hour < heavy {
            IntensityBucket::Moderate
        } else {
            IntensityBucket::Heavy
        })
    }

    /// Intensity from a probability in percent.
    pub fn from_probability(percent: f32) -> Option<Self> {
        if !percent.is_finite() || percent <= 0.0 {
            return None;
        }
        Some(if percent < 40.0 {
            IntensityBucket::Light
        } else if percent < 70.0 {
            IntensityBucket::Moderate
        } else {
            IntensityBucket::Heavy
        })
    }
}

/// Particle kind and bucket for `weather`, or `None` when nothing falls.
/// Storms fall as rain.
pub fn derive_precipitation(weather: &WeatherInfo) -> Option<(ParticleKind, IntensityBucket)> {
    let kind = match weather.precipitation {
        PrecipitationKind::None => return None,
        PrecipitationKind::Rain | PrecipitationKind::Storm => ParticleKind::Rain,
        PrecipitationKind::Snow => ParticleKind::Snow,
    };
    let bucket = weather
        .weather_code
        .and_then(IntensityBucket::from_weather_code)
        .or_else(|| {
            weather
                .precipitation_amount_mm
                .and_then(|mm| IntensityBucket::from_amount(kind, mm))
        })
        .or_else(|| weather.precipitation_probability.and_then(IntensityBucket::from_probability))
        .unwrap_or(match weather.precipitation {
            PrecipitationKind::Storm => IntensityBucket::Heavy,
            _ => IntensityBucket::Moderate,
        });
    Some((kind, bucket))
}

//! Static per-(kind, intensity) particle tuning.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    Rain,
    Snow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityBucket {
    Light,
    Moderate,
    Heavy,
}

/// Tuning for one precipitation class. Pixel quantities are for a 1280×720
/// surface; the system scales them to the live size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleProfile {
    /// Particles per second across a 1280 px wide surface.
    pub spawn_rate: f32,
    pub size: (f32, f32),
    pub opacity: (f32, f32),
    /// Fall speed, px/s on a 720 px tall surface.
    pub speed: (f32, f32),
    /// Seconds.
    pub lifetime: (f32, f32),
    /// Fraction of the wind speed the particle picks up.
    pub wind_response: f32,
    /// Noise drift amplitude, px/s.
    pub drift: f32,
    /// Streak length in CSS px (rain only).
    pub streak_length: f32,
    /// Spin range, radians per second (snow only).
    pub spin: f32,
}

const RAIN_LIGHT: ParticleProfile = ParticleProfile {
    spawn_rate: 220.0,
    size: (1.0, 1.4),
    opacity: (0.25, 0.45),
    speed: (700.0, 950.0),
    lifetime: (1.2, 1.8),
    wind_response: 0.6,
    drift: 8.0,
    streak_length: 14.0,
    spin: 0.0,
};

const RAIN_MODERATE: ParticleProfile = ParticleProfile {
    spawn_rate: 600.0,
    size: (1.1, 1.6),
    opacity: (0.3, 0.55),
    speed: (800.0, 1100.0),
    lifetime: (1.1, 1.6),
    wind_response: 0.7,
    drift: 10.0,
    streak_length: 18.0,
    spin: 0.0,
};

const RAIN_HEAVY: ParticleProfile = ParticleProfile {
    spawn_rate: 1400.0,
    size: (1.2, 1.9),
    opacity: (0.35, 0.65),
    speed: (900.0, 1300.0),
    lifetime: (1.0, 1.5),
    wind_response: 0.8,
    drift: 14.0,
    streak_length: 24.0,
    spin: 0.0,
};

const SNOW_LIGHT: ParticleProfile = ParticleProfile {
    spawn_rate: 60.0,
    size: (1.5, 3.0),
    opacity: (0.5, 0.8),
    speed: (40.0, 80.0),
    lifetime: (8.0, 12.0),
    wind_response: 0.9,
    drift: 25.0,
    streak_length: 0.0,
    spin: 1.2,
};

const SNOW_MODERATE: ParticleProfile = ParticleProfile {
    spawn_rate: 140.0,
    size: (1.8, 3.6),
    opacity: (0.55, 0.85),
    speed: (50.0, 100.0),
    lifetime: (7.0, 11.0),
    wind_response: 1.0,
    drift: 30.0,
    streak_length: 0.0,
    spin: 1.5,
};

const SNOW_HEAVY: ParticleProfile = ParticleProfile {
    spawn_rate: 320.0,
    size: (2.0, 4.5),
    opacity: (0.6, 0.9),
    speed: (60.0, 120.0),
    lifetime: (6.0, 10.0),
    wind_response: 1.1,
    drift: 35.0,
    streak_length: 0.0,
    spin: 2.0,
};

/// Profile lookup. Exhaustive over both enums, so a new variant fails to
/// compile until it has an entry.
pub fn profile(kind: ParticleKind, bucket: IntensityBucket) -> &'static ParticleProfile {
    match (kind, bucket) {
        (ParticleKind::Rain, IntensityBucket::Light) => &RAIN_LIGHT,
        (ParticleKind::Rain, IntensityBucket::Moderate) => &RAIN_MODERATE,
        (ParticleKind::Rain, IntensityBucket::Heavy) => &RAIN_HEAVY,
        (ParticleKind::Snow, IntensityBucket::Light) => &SNOW_LIGHT,
        (ParticleKind::Snow, IntensityBucket::Moderate) => &SNOW_MODERATE,
        (ParticleKind::Snow, IntensityBucket::Heavy) => &SNOW_HEAVY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ParticleKind; 2] = [ParticleKind::Rain, ParticleKind::Snow];
    const BUCKETS: [IntensityBucket; 3] =
        [IntensityBucket::Light, IntensityBucket::Moderate, IntensityBucket::Heavy];

    #[test]
    fn test_ranges_are_ordered() {
        for kind in KINDS {
            for bucket in BUCKETS {
                let p = profile(kind, bucket);
                for (lo, hi) in [p.size, p.opacity, p.speed, p.lifetime] {
                    assert!(lo > 0.0 && lo <= hi, "{kind:?}/{bucket:?}");
                }
                assert!(p.opacity.1 <= 1.0);
            }
        }
    }

    #[test]
    fn test_heavier_spawns_more() {
        for kind in KINDS {
            let rates: Vec<f32> = BUCKETS.iter().map(|b| profile(kind, *b).spawn_rate).collect();
            assert!(rates.windows(2).all(|w| w[0] < w[1]), "{kind:?}");
        }
    }

    #[test]
    fn test_snow_falls_slower_than_rain() {
        for bucket in BUCKETS {
            assert!(profile(ParticleKind::Snow, bucket).speed.1 < profile(ParticleKind::Rain, bucket).speed.0);
        }
    }
}

//! Lightning: procedural bolts, strike scheduling and flash effects.
//!
//! One [`LightningSystem`] belongs to each sky renderer; there is no shared
//! bolt state between surfaces.

pub mod bolt;
pub mod system;

pub use bolt::{Bolt, BoltPhase};
pub use system::{GlowPoint, LightningEffect, LightningSystem};

use crate::precipitation::{derive_precipitation, IntensityBucket};
use crate::sky::{PrecipitationKind, WeatherInfo};

/// Storm intensity in `0..=1` for scheduling strikes. Zero unless the
/// weather reports a storm.
pub fn storm_intensity(weather: &WeatherInfo) -> f32 {
    if weather.precipitation != PrecipitationKind::Storm {
        return 0.0;
    }
    let bucket_bonus = match derive_precipitation(weather).map(|(_, bucket)| bucket) {
        Some(IntensityBucket::Heavy) => 0.25,
        Some(IntensityBucket::Moderate) => 0.1,
        Some(IntensityBucket::Light) | None => 0.0,
    };
    (0.45 + 0.3 * weather.cover() + bucket_bonus).min(1.0)
}

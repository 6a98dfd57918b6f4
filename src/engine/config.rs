//! Engine configuration.
//!
//! Every section has a `Default` tuned for a 1280×720 container and is
//! `#[serde(default)]`, so a config file only needs the fields it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::css::hex_rgb;
use crate::core::{Result, Rgb};
use crate::sky::SkyPalette;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub surface: SurfaceConfig,
    pub smoothing: SmoothingConfig,
    pub palette: SkyPalette,
    pub sun: SunEffectsConfig,
    pub stars: StarConfig,
    pub lightning: LightningConfig,
    pub precipitation: PrecipitationConfig,
    pub clouds: CloudConfig,
}

impl EngineConfig {
    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Surface / frame pacing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Internal resolution as a fraction of device pixels.
    pub resolution_scale: f32,
    /// Frame cap; frames arriving sooner than `1 / max_fps` are skipped.
    pub max_fps: f32,
    /// Largest delta fed to time-based systems after a stall (seconds).
    pub max_frame_delta: f32,
}

impl SurfaceConfig {
    /// Minimum wall-clock gap between rendered frames.
    pub fn min_frame_interval(&self) -> f64 {
        if self.max_fps.is_finite() && self.max_fps > 0.0 { 1.0 / self.max_fps as f64 } else { 0.0 }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            resolution_scale: 0.5,
            max_fps: 30.0,
            max_frame_delta: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// Color smoothing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Exponential time constant (seconds). 0 snaps instantly.
    pub time_constant: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { time_constant: 1.5 }
    }
}

// ---------------------------------------------------------------------------
// Sun
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunEffectsConfig {
    /// Disc radius in CSS pixels (multiplied by the device scale).
    pub disc_radius: f32,
    /// Corona radius as a multiple of the disc radius.
    pub corona_scale: f32,
    pub bloom_strength: f32,
    pub starburst_strength: f32,
    pub starburst_rays: u32,
    pub streak_strength: f32,
    pub flare_strength: f32,
    /// Sprite cache entries kept.
    pub sprite_cache_size: usize,
    #[serde(with = "hex_rgb")]
    pub day_color: Rgb,
    #[serde(with = "hex_rgb")]
    pub horizon_color: Rgb,
}

impl Default for SunEffectsConfig {
    fn default() -> Self {
        Self {
            disc_radius: 16.0,
            corona_scale: 7.0,
            bloom_strength: 0.55,
            starburst_strength: 0.35,
            starburst_rays: 12,
            streak_strength: 0.3,
            flare_strength: 0.18,
            sprite_cache_size: 32,
            day_color: [1.0, 0.97, 0.88],
            horizon_color: [1.0, 0.58, 0.28],
        }
    }
}

// ---------------------------------------------------------------------------
// Stars
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    pub count: usize,
    pub seed: u64,
    /// Radius range in CSS pixels.
    pub min_radius: f32,
    pub max_radius: f32,
    /// Twinkle angular speed range (radians per second).
    pub twinkle_speed: f32,
    #[serde(with = "hex_rgb")]
    pub color: Rgb,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 260,
            seed: 0x5747_4152,
            min_radius: 0.5,
            max_radius: 1.4,
            twinkle_speed: 1.6,
            color: [0.92, 0.95, 1.0],
        }
    }
}

// ---------------------------------------------------------------------------
// Lightning
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightningConfig {
    /// Seconds a bolt stays at full brightness.
    pub flash_duration: f32,
    /// Seconds a bolt takes to fade out after the flash.
    pub fade_duration: f32,
    /// Mean seconds between strikes at intensity 1.
    pub base_interval: f32,
    /// Frequency exponent: interval scales with `intensity^(-exponent)`.
    pub intensity_exponent: f32,
    pub jitter_min: f32,
    pub jitter_max: f32,
    /// Live bolts kept at once.
    pub max_bolts: usize,
    /// Walk steps from top to bottom.
    pub segments: usize,
    /// Peak alpha of the full-surface flash.
    pub flash_strength: f32,
    /// Cap on glow points exported for cloud backlighting.
    pub max_glow_points: usize,
    pub seed: u64,
    #[serde(with = "hex_rgb")]
    pub tint: Rgb,
}

impl LightningConfig {
    /// Total visible lifetime of a bolt (seconds).
    pub fn bolt_lifetime(&self) -> f64 {
        self.flash_duration.max(0.0) as f64 + self.fade_duration.max(0.0) as f64
    }
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            flash_duration: 0.15,
            fade_duration: 0.6,
            base_interval: 4.0,
            intensity_exponent: 1.5,
            jitter_min: 0.5,
            jitter_max: 1.5,
            max_bolts: 4,
            segments: 28,
            flash_strength: 0.35,
            max_glow_points: 24,
            seed: 0x1157_0b17,
            tint: [0.80, 0.85, 1.0],
        }
    }
}

// ---------------------------------------------------------------------------
// Precipitation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecipitationConfig {
    /// Hard cap on live particles.
    pub max_particles: usize,
    /// Largest simulation step (seconds); longer deltas are clamped.
    pub max_step: f32,
    pub fade_in: f32,
    pub fade_out: f32,
    /// Pixels per second of drift per km/h of wind.
    pub wind_px_per_kmh: f32,
    /// Launch angle variance for rain (degrees either side of vertical).
    pub rain_angle_variance: f32,
    pub snow_sprite_cache_size: usize,
    pub seed: u64,
    #[serde(with = "hex_rgb")]
    pub rain_color: Rgb,
    #[serde(with = "hex_rgb")]
    pub snow_color: Rgb,
}

impl Default for PrecipitationConfig {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            max_step: 0.05,
            fade_in: 0.25,
            fade_out: 0.35,
            wind_px_per_kmh: 6.0,
            rain_angle_variance: 4.0,
            snow_sprite_cache_size: 16,
            seed: 0x00da_1100,
            rain_color: [0.68, 0.75, 0.84],
            snow_color: [1.0, 1.0, 1.0],
        }
    }
}

// ---------------------------------------------------------------------------
// Clouds
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Cloud surface size relative to the sky surface.
    pub resolution_scale: f32,
    /// Seconds between cloud renders.
    pub update_interval: f32,
    /// Cover at or below which the cloud renderer is released.
    pub cover_threshold: f32,
    /// Largest cloud surface, in pixels, the renderer will allocate.
    pub max_pixels: u64,
    pub seed: u32,
    pub octaves: usize,
    /// Noise features per surface height.
    pub frequency: f64,
    /// Noise units per second of drift per km/h of wind.
    pub wind_drift: f32,
    pub opacity: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            resolution_scale: 0.5,
            update_interval: 0.1,
            cover_threshold: 0.02,
            max_pixels: 2048 * 2048,
            seed: 0xc10d,
            octaves: 5,
            frequency: 2.5,
            wind_drift: 0.004,
            opacity: 0.92,
        }
    }
}

//! Sun disc, corona and optical effects.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::color::ease::{clamp01, clamp_or, smoothstep};
use crate::color::oklch::mix_oklch;
use crate::core::Rgb;
use crate::engine::config::SunEffectsConfig;
use crate::render::sprite::{SkyBucket, Sprite, SpriteCache, SpriteKey};
use crate::render::surface::{BlendMode, Surface};
use crate::render::HORIZON_FRACTION;

/// Below this elevation (degrees) the sun contributes nothing.
pub const SUN_VISIBILITY_FLOOR: f32 = -4.0;
/// Elevation at which the sun reaches full visibility.
pub const SUN_FULL_VISIBILITY: f32 = 6.0;
/// Effects below this brightness are not drawn.
pub const EFFECT_EPSILON: f32 = 0.02;

/// Master alpha gating every sun effect.
///
/// Exactly 0 at or below [`SUN_VISIBILITY_FLOOR`]; non-increasing in cover and fog.
pub fn sun_master_brightness(elevation: f32, cloud_cover: f32, fog_density: f32) -> f32 {
    let elevation = clamp_or(elevation, -90.0, 90.0, 0.0);
    let visibility = smoothstep(SUN_VISIBILITY_FLOOR, SUN_FULL_VISIBILITY, elevation);
    clamp01(visibility * (1.0 - 0.85 * clamp01(cloud_cover)) * (1.0 - 0.7 * clamp01(fog_density)))
}

/// Screen position for a sun at `azimuth`/`elevation` on a `size` surface.
///
/// Due south (180°) is centred; east/west map to the left/right 10% margins.
/// The horizon sits at [`HORIZON_FRACTION`] of the height.
pub fn sun_screen_position(azimuth: f32, elevation: f32, size: Vec2) -> Vec2 {
    let azimuth = if azimuth.is_finite() { azimuth.rem_euclid(360.0) } else { 180.0 };
    let elevation = clamp_or(elevation, -90.0, 90.0, 0.0);
    let x = size.x * (0.5 + (azimuth - 180.0) / 180.0 * 0.4);
    let horizon = size.y * HORIZON_FRACTION;
    let y = if elevation >= 0.0 {
        horizon - (elevation / 90.0).powf(0.8) * (horizon - 0.08 * size.y)
    } else {
        horizon + (-elevation / 90.0) * (size.y - horizon)
    };
    Vec2::new(x, y)
}

/// Which sun layers were drawn this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SunEffects {
    pub disc: bool,
    pub bloom: bool,
    pub starburst: bool,
    pub streak: bool,
    pub lens_flare: bool,
}

impl SunEffects {
    pub fn any(&self) -> bool {
        self.disc || self.bloom || self.starburst || self.streak || self.lens_flare
    }

    pub fn all(&self) -> bool {
        self.disc && self.bloom && self.starburst && self.streak && self.lens_flare
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SunReport {
    pub brightness: f32,
    pub position: Option<Vec2>,
    pub effects: SunEffects,
}

/// Paints the sun from cached sprites plus cheap per-frame effects.
pub struct SunPainter {
    config: SunEffectsConfig,
    sprites: SpriteCache,
    sprite_builds: u64,
}

impl SunPainter {
    pub fn new(config: SunEffectsConfig) -> Self {
        Self {
            sprites: SpriteCache::new(config.sprite_cache_size),
            config,
            sprite_builds: 0,
        }
    }

    pub fn config(&self) -> &SunEffectsConfig {
        &self.config
    }

    /// Replace the config; cached sprites depend on it, so they are dropped.
    pub fn set_config(&mut self, config: SunEffectsConfig) {
        if config != self.config {
            self.sprites = SpriteCache::new(config.sprite_cache_size);
            self.config = config;
        }
    }

    pub fn cached_sprites(&self) -> usize {
        self.sprites.len()
    }

    /// Sprites rendered since creation (cache misses).
    pub fn sprite_builds(&self) -> u64 {
        self.sprite_builds
    }

    pub fn clear_cache(&mut self) {
        self.sprites.clear();
    }

    /// Paint the sun for the given (already clamped) parameters.
    pub fn paint(
        &mut self,
        surface: &mut Surface,
        elevation: f32,
        azimuth: f32,
        cloud_cover: f32,
        fog_density: f32,
        device_scale: f32,
    ) -> SunReport {
        let brightness = sun_master_brightness(elevation, cloud_cover, fog_density);
        if elevation <= SUN_VISIBILITY_FLOOR || brightness < EFFECT_EPSILON || surface.is_empty() {
            return SunReport {
                brightness,
                ..Default::default()
            };
        }

        let position = sun_screen_position(azimuth, elevation, surface.size());
        let bucket = SkyBucket::new(elevation, cloud_cover, fog_density, device_scale);
        let mut effects = SunEffects::default();

        let corona_key = SpriteKey::SunCorona(bucket);
        if !self.sprites.contains(corona_key) {
            self.sprite_builds += 1;
        }
        let corona = self
            .sprites
            .get_or_insert_with(corona_key, || build_corona(&bucket, &self.config));
        surface.draw_sprite(corona, position, brightness, BlendMode::Screen);
        effects.disc = true;
        effects.bloom = brightness * self.config.bloom_strength >= EFFECT_EPSILON;

        let disc_px = self.config.disc_radius * bucket.scale();
        let color = sun_color(bucket.elevation(), &self.config);

        let starburst = brightness * self.config.starburst_strength;
        if starburst >= EFFECT_EPSILON && self.config.starburst_rays > 0 {
            let rays = self.config.starburst_rays;
            let offset = azimuth.to_radians() * 0.25;
            for i in 0..rays {
                let angle = offset + i as f32 / rays as f32 * TAU;
                let long = if i % 2 == 0 { 1.0 } else { 0.6 };
                let len = disc_px * (2.5 + 3.5 * brightness) * long;
                let dir = Vec2::new(angle.cos(), angle.sin());
                surface.draw_line(
                    position + dir * disc_px * 0.8,
                    position + dir * len,
                    (disc_px * 0.12).max(1.0),
                    color,
                    starburst * 0.6,
                    BlendMode::Additive,
                );
            }
            effects.starburst = true;
        }

        let streak = brightness * self.config.streak_strength;
        if streak >= EFFECT_EPSILON {
            let streak_key = SpriteKey::SunStreak(bucket);
            if !self.sprites.contains(streak_key) {
                self.sprite_builds += 1;
            }
            let sprite = self
                .sprites
                .get_or_insert_with(streak_key, || build_streak(&bucket, &self.config));
            surface.draw_sprite(sprite, position, streak, BlendMode::Additive);
            effects.streak = true;
        }

        let flare = brightness * self.config.flare_strength;
        if flare >= EFFECT_EPSILON {
            // Ghosts along the axis from the sun through the surface centre
            let axis = surface.size() * 0.5 - position;
            let ghosts = [(0.5, 0.35, 0.6), (0.9, 0.8, 0.35), (1.3, 0.5, 0.5), (1.7, 1.4, 0.25)];
            for (t, size, strength) in ghosts {
                let tint = mix_oklch(color, [0.55, 0.75, 1.0], t / 2.0);
                surface.fill_circle(
                    position + axis * t,
                    disc_px * size,
                    tint,
                    flare * strength,
                    BlendMode::Additive,
                );
            }
            effects.lens_flare = true;
        }

        log::trace!(
            "sun at ({:.0}, {:.0}) brightness {:.2} effects {:?}",
            position.x,
            position.y,
            brightness,
            effects
        );
        SunReport {
            brightness,
            position: Some(position),
            effects,
        }
    }
}

/// Disc color: warm near the horizon, near-white high up.
fn sun_color(elevation: f32, config: &SunEffectsConfig) -> Rgb {
    mix_oklch(config.horizon_color, config.day_color, smoothstep(0.0, 20.0, elevation))
}

/// Disc + corona + bloom for one bucket.
fn build_corona(bucket: &SkyBucket, config: &SunEffectsConfig) -> Sprite {
    let disc = config.disc_radius * bucket.scale();
    let haze = 1.0 - 0.5 * bucket.fog();
    let radius = disc * config.corona_scale * (0.6 + 0.4 * haze) * (1.0 + 0.4 * bucket.cover());
    let edge = disc / radius;
    let color = sun_color(bucket.elevation(), config);
    let glow = mix_oklch(color, config.horizon_color, 0.35 * (1.0 - smoothstep(0.0, 30.0, bucket.elevation())));
    let corona_alpha = 0.55 * (1.0 - 0.5 * bucket.cover());
    let bloom_alpha = config.bloom_strength * haze;

    Sprite::radial(radius, |r| {
        if r <= edge {
            // Disc with a one-pixel soft rim
            let rim = clamp01((edge - r) * radius);
            return (mix_oklch(glow, [1.0, 1.0, 1.0], 0.7), 0.6 + 0.4 * rim);
        }
        let outer = (r - edge) / (1.0 - edge);
        let corona = corona_alpha * (1.0 - outer).powf(6.0);
        let bloom = bloom_alpha * (1.0 - outer).powf(2.2) * 0.35;
        (mix_oklch(color, glow, outer), corona + bloom)
    })
}

/// Thin horizontal anamorphic streak for one bucket.
fn build_streak(bucket: &SkyBucket, config: &SunEffectsConfig) -> Sprite {
    let disc = config.disc_radius * bucket.scale();
    let half_w = disc * 14.0;
    let half_h = (disc * 0.35).max(1.0);
    let color = mix_oklch(sun_color(bucket.elevation(), config), [0.75, 0.85, 1.0], 0.4);
    let w = (half_w * 2.0).ceil() as u32;
    let h = (half_h * 2.0).ceil() as u32;
    Sprite::from_fn(w, h, |dx, dy| {
        let fx = clamp01(1.0 - dx.abs() / half_w);
        let fy = clamp01(1.0 - dy.abs() / half_h);
        (color, fx * fx * fy * fy)
    })
}

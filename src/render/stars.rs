//! Seeded twinkling star field.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::color::ease::{clamp01, clamp_or, smoothstep};
use crate::color::oklch::mix_oklch;
use crate::engine::config::StarConfig;
use crate::render::surface::{BlendMode, Surface};
use crate::render::HORIZON_FRACTION;

/// Star visibility: fades in as the sun sinks below +2° and is fully up by
/// -12°, suppressed proportionally to cloud cover.
pub fn star_visibility(sun_elevation: f32, cloud_cover: f32) -> f32 {
    let elevation = clamp_or(sun_elevation, -90.0, 90.0, 0.0);
    clamp01((1.0 - smoothstep(-12.0, 2.0, elevation)) * (1.0 - clamp01(cloud_cover)))
}

#[derive(Clone, Copy, Debug)]
struct Star {
    /// Normalized position; `y` spans the sky above the horizon.
    position: Vec2,
    radius: f32,
    brightness: f32,
    twinkle_phase: f32,
    twinkle_rate: f32,
    warmth: f32,
}

pub struct StarField {
    stars: Vec<Star>,
    config: StarConfig,
}

impl StarField {
    pub fn new(config: StarConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let (min_r, max_r) = (config.min_radius.min(config.max_radius), config.max_radius.max(config.min_radius));
        let stars = (0..config.count)
            .map(|_| {
                // Bias towards faint stars
                let magnitude: f32 = rng.gen_range(0.0..1.0);
                Star {
                    position: Vec2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)),
                    radius: min_r + (max_r - min_r) * magnitude * magnitude,
                    brightness: 0.35 + 0.65 * magnitude,
                    twinkle_phase: rng.gen_range(0.0..std::f32::consts::TAU),
                    twinkle_rate: config.twinkle_speed * rng.gen_range(0.5..1.5),
                    warmth: rng.gen_range(0.0..1.0),
                }
            })
            .collect();
        Self { stars, config }
    }

    pub fn config(&self) -> &StarConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Paint stars at `visibility`; returns how many were drawn.
    pub fn paint(&self, surface: &mut Surface, visibility: f32, time_secs: f64, device_scale: f32) -> usize {
        let visibility = clamp01(visibility);
        if visibility < 0.01 || surface.is_empty() {
            return 0;
        }
        let size = surface.size();
        let sky_height = size.y * HORIZON_FRACTION;
        let t = time_secs as f32;
        let mut drawn = 0;
        for star in &self.stars {
            // Stars near the horizon are dimmed by extinction
            let extinction = 1.0 - smoothstep(0.7, 1.0, star.position.y);
            let twinkle = 0.75 + 0.25 * (t * star.twinkle_rate + star.twinkle_phase).sin();
            let alpha = visibility * star.brightness * twinkle * extinction;
            if alpha < 0.01 {
                continue;
            }
            let color = mix_oklch(self.config.color, [1.0, 0.85, 0.7], 0.3 * star.warmth);
            let center = Vec2::new(star.position.x * size.x, star.position.y * sky_height);
            surface.fill_circle(center, star.radius * device_scale, color, alpha, BlendMode::Screen);
            drawn += 1;
        }
        drawn
    }
}

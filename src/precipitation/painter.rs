//! Draws precipitation particles onto a surface.

use glam::Vec2;

use crate::core::Rgb;
use crate::engine::config::PrecipitationConfig;
use crate::precipitation::particle::Particle;
use crate::precipitation::table::{profile, ParticleKind};
use crate::render::sprite::{Sprite, SpriteCache, SpriteKey};
use crate::render::surface::{BlendMode, Surface};

/// Below this opacity a particle isn't worth touching pixels for.
const MIN_VISIBLE_OPACITY: f32 = 0.01;
/// Flakes at least this large (device px) get a faint crystal cross.
const CRYSTAL_MIN_RADIUS: f32 = 3.0;

/// Renders rain as velocity-aligned streaks and snow as soft cached dots.
/// Never mutates particles.
pub struct PrecipitationPainter {
    sprites: SpriteCache,
    rain_color: Rgb,
    snow_color: Rgb,
    device_scale: f32,
    sprite_builds: u64,
}

impl PrecipitationPainter {
    pub fn new(config: &PrecipitationConfig, device_scale: f32) -> Self {
        Self {
            sprites: SpriteCache::new(config.snow_sprite_cache_size),
            rain_color: config.rain_color,
            snow_color: config.snow_color,
            device_scale: sanitize_scale(device_scale),
            sprite_builds: 0,
        }
    }

    /// Colors feed the cached sprites, so a config change drops them.
    pub fn set_config(&mut self, config: &PrecipitationConfig) {
        self.sprites = SpriteCache::new(config.snow_sprite_cache_size);
        self.rain_color = config.rain_color;
        self.snow_color = config.snow_color;
    }

    pub fn device_scale(&self) -> f32 {
        self.device_scale
    }

    pub fn set_device_scale(&mut self, device_scale: f32) {
        self.device_scale = sanitize_scale(device_scale);
    }

    pub fn cached_sprites(&self) -> usize {
        self.sprites.len()
    }

    pub fn sprite_builds(&self) -> u64 {
        self.sprite_builds
    }

    /// Paint every visible particle; returns how many were drawn.
    pub fn paint(&mut self, surface: &mut Surface, particles: &[Particle]) -> usize {
        if surface.is_empty() {
            return 0;
        }
        let mut drawn = 0;
        for p in particles {
            if p.opacity < MIN_VISIBLE_OPACITY {
                continue;
            }
            match p.kind {
                ParticleKind::Rain => self.paint_drop(surface, p),
                ParticleKind::Snow => self.paint_flake(surface, p),
            }
            drawn += 1;
        }
        drawn
    }

    fn paint_drop(&self, surface: &mut Surface, p: &Particle) {
        let speed = p.velocity.length();
        if speed <= f32::EPSILON {
            return;
        }
        let dir = p.velocity / speed;
        // Slanted drops read longer; heavier buckets carry longer streaks
        let slant = 1.0 + 0.5 * dir.x.abs();
        let length = profile(p.kind, p.bucket).streak_length * self.device_scale * slant;
        let tail = p.position - dir * length;
        surface.draw_line(
            tail,
            p.position,
            p.size * self.device_scale,
            self.rain_color,
            p.opacity,
            BlendMode::SourceOver,
        );
    }

    fn paint_flake(&mut self, surface: &mut Surface, p: &Particle) {
        let key = SpriteKey::snowflake(p.size, self.device_scale);
        let radius = key.snowflake_radius_px().unwrap_or(p.size * self.device_scale);
        if !self.sprites.contains(key) {
            self.sprite_builds += 1;
        }
        let color = self.snow_color;
        let sprite = self.sprites.get_or_insert_with(key, || build_flake(radius, color));
        surface.draw_sprite(sprite, p.position, p.opacity, BlendMode::SourceOver);

        if radius >= CRYSTAL_MIN_RADIUS {
            for i in 0..3 {
                let angle = p.rotation + i as f32 * std::f32::consts::FRAC_PI_3;
                let arm = Vec2::new(angle.cos(), angle.sin()) * radius * 1.1;
                surface.draw_line(p.position - arm, p.position + arm, 0.8, color, p.opacity * 0.35, BlendMode::SourceOver);
            }
        }
    }
}

fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() { scale.clamp(0.25, 8.0) } else { 1.0 }
}

fn build_flake(radius: f32, color: Rgb) -> Sprite {
    Sprite::radial(radius, |r| {
        let falloff = 1.0 - r * r;
        (color, falloff * falloff)
    })
}

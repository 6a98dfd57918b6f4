//! Strike scheduling, bolt bookkeeping and the effect summary other layers read.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::color::ease::clamp01;
use crate::core::Rgb;
use crate::engine::config::LightningConfig;
use crate::lightning::bolt::{Bolt, BoltPhase};
use crate::render::surface::{BlendMode, Surface};

/// Intensity floor used when scheduling, so near-zero storms don't schedule
/// strikes hours away.
const MIN_SCHEDULING_INTENSITY: f32 = 0.05;

/// A point along a visible bolt, for backlighting clouds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowPoint {
    /// Normalized surface coordinates.
    pub position: Vec2,
    pub intensity: f32,
}

/// What the rest of the frame needs to know about lightning right now.
#[derive(Clone, Debug, PartialEq)]
pub struct LightningEffect {
    /// Alpha of the full-surface flash.
    pub flash_alpha: f32,
    /// Brightest visible bolt.
    pub intensity: f32,
    pub glow_points: Vec<GlowPoint>,
    pub tint: Rgb,
}

/// Owns the live bolts of one sky surface.
pub struct LightningSystem {
    config: LightningConfig,
    bolts: Vec<Bolt>,
    next_strike: Option<f64>,
    rng: ChaCha8Rng,
    spawned: u64,
    removed: u64,
}

impl LightningSystem {
    pub fn new(config: LightningConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            bolts: Vec::new(),
            next_strike: None,
            spawned: 0,
            removed: 0,
        }
    }

    pub fn config(&self) -> &LightningConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LightningConfig) {
        self.config = config;
    }

    pub fn bolts(&self) -> &[Bolt] {
        &self.bolts
    }

    pub fn next_strike(&self) -> Option<f64> {
        self.next_strike
    }

    /// Bolts created since construction.
    pub fn spawned_count(&self) -> u64 {
        self.spawned
    }

    /// Bolts pruned after their lifetime since construction.
    pub fn removed_count(&self) -> u64 {
        self.removed
    }

    #[inline]
    fn timings(&self) -> (f64, f64) {
        (
            self.config.flash_duration.max(0.0) as f64,
            self.config.fade_duration.max(0.0) as f64,
        )
    }

    /// Advance to `now`: prune expired bolts, then strike if one is due.
    ///
    /// At `storm_intensity <= 0` nothing is scheduled; live bolts keep fading.
    pub fn update(&mut self, now: f64, storm_intensity: f32) {
        let (flash, fade) = self.timings();
        let before = self.bolts.len();
        self.bolts.retain(|b| now < b.expires_at(flash, fade));
        let pruned = before - self.bolts.len();
        if pruned > 0 {
            self.removed += pruned as u64;
            log::trace!("pruned {pruned} lightning bolt(s)");
        }

        let intensity = clamp01(storm_intensity);
        if intensity <= 0.0 {
            self.next_strike = None;
            return;
        }

        match self.next_strike {
            None => {
                // First strike of a storm comes sooner than the steady rhythm
                let delay = self.strike_interval(intensity) * 0.5;
                self.next_strike = Some(now + delay);
            }
            Some(due) if now >= due => {
                self.strike(now);
                self.next_strike = Some(now + self.strike_interval(intensity));
            }
            Some(_) => {}
        }
    }

    /// `base_interval · intensity^(-p) · jitter` seconds.
    fn strike_interval(&mut self, intensity: f32) -> f64 {
        let i = intensity.max(MIN_SCHEDULING_INTENSITY);
        let (lo, hi) = (
            self.config.jitter_min.min(self.config.jitter_max),
            self.config.jitter_max.max(self.config.jitter_min),
        );
        let jitter = if hi > lo { self.rng.gen_range(lo..hi) } else { lo };
        (self.config.base_interval.max(0.01) * i.powf(-self.config.intensity_exponent) * jitter) as f64
    }

    /// Spawn a bolt at `now` regardless of the schedule. When the list is
    /// full the oldest bolt makes room.
    pub fn strike(&mut self, now: f64) {
        let max = self.config.max_bolts.max(1);
        while self.bolts.len() >= max {
            self.bolts.remove(0);
            self.removed += 1;
        }
        let bolt = Bolt::generate(&mut self.rng, now, self.config.segments);
        log::debug!("lightning strike at t={now:.2}s ({} bolts live)", self.bolts.len() + 1);
        self.bolts.push(bolt);
        self.spawned += 1;
    }

    /// Drop every bolt and the pending strike.
    pub fn clear(&mut self) {
        self.bolts.clear();
        self.next_strike = None;
    }

    /// `Some` exactly while at least one bolt is flashing or fading at `now`.
    pub fn effect(&self, now: f64) -> Option<LightningEffect> {
        let (flash, fade) = self.timings();
        let visible: Vec<(&Bolt, f32)> = self
            .bolts
            .iter()
            .filter(|b| b.phase(now, flash, fade) != BoltPhase::Expired)
            .map(|b| (b, b.intensity(now, flash, fade)))
            .collect();
        if visible.is_empty() {
            return None;
        }

        let mut flash_alpha = 0.0f32;
        let mut intensity = 0.0f32;
        for (bolt, i) in &visible {
            intensity = intensity.max(*i);
            let age = (now - bolt.start_time()).max(0.0);
            if flash > 0.0 && age < flash {
                let k = 1.0 - (age / flash) as f32;
                flash_alpha = flash_alpha.max(self.config.flash_strength * k * k);
            }
        }

        let per_bolt = (self.config.max_glow_points / visible.len()).max(1);
        let mut glow_points: Vec<GlowPoint> = visible
            .iter()
            .flat_map(|(bolt, i)| {
                bolt.sample_points(per_bolt)
                    .into_iter()
                    .map(move |position| GlowPoint { position, intensity: *i })
            })
            .collect();
        glow_points.truncate(self.config.max_glow_points);

        Some(LightningEffect {
            flash_alpha,
            intensity,
            glow_points,
            tint: self.config.tint,
        })
    }

    /// Draw visible bolts (three additive passes each) and the strike flash.
    pub fn paint(&self, surface: &mut Surface, now: f64, device_scale: f32) {
        if surface.is_empty() {
            return;
        }
        let (flash, fade) = self.timings();
        let size = surface.size();
        let scale = device_scale.max(0.25);
        let tint = self.config.tint;
        // (width px, alpha, color)
        let passes = [(9.0, 0.12, tint), (3.5, 0.35, tint), (1.2, 0.95, [1.0, 1.0, 1.0])];

        for bolt in &self.bolts {
            let i = bolt.intensity(now, flash, fade);
            if i <= 0.0 {
                continue;
            }
            for (width, alpha, color) in passes {
                draw_polyline(surface, bolt.points(), size, width * scale, color, alpha * i);
                for branch in bolt.branches() {
                    draw_polyline(surface, branch, size, width * scale * 0.6, color, alpha * i * 0.6);
                }
            }
        }

        if let Some(effect) = self.effect(now) {
            if effect.flash_alpha > 0.0 {
                surface.fill(tint, effect.flash_alpha, BlendMode::Screen);
            }
        }
    }
}

fn draw_polyline(surface: &mut Surface, points: &[Vec2], size: Vec2, width: f32, color: Rgb, alpha: f32) {
    for pair in points.windows(2) {
        surface.draw_line(pair[0] * size, pair[1] * size, width, color, alpha, BlendMode::Additive);
    }
}

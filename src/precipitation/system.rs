//! Particle simulation for rain and snow.
//!
//! Stepping is split into integrate → cull → spawn. Culling is a single
//! `retain` pass, so a particle is either alive with `age < lifetime` or
//! gone; nothing is kept around expired. The only ways out are expiry and
//! falling past the bottom edge: particles blown past the side margins wrap
//! to the opposite margin, both of which are off screen.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::engine::config::PrecipitationConfig;
use crate::precipitation::particle::{fade_factor, Particle};
use crate::precipitation::table::{profile, IntensityBucket, ParticleKind, ParticleProfile};

/// Surface size the profile table is tuned for.
const REFERENCE_WIDTH: f32 = 1280.0;
const REFERENCE_HEIGHT: f32 = 720.0;
const MIN_SPEED_SCALE: f32 = 0.3;
/// Off-screen band on each side, as a fraction of the width.
const SIDE_MARGIN: f32 = 0.5;
/// Particles are culled this many sizes below the bottom edge.
const BOTTOM_MARGIN: f32 = 4.0;

/// How fast horizontal velocity relaxes toward wind + drift, per second.
const WIND_RELAX_RATE: f32 = 3.0;
/// Spatial and temporal frequency of the drift noise field.
const DRIFT_SPATIAL_FREQ: f64 = 0.006;
const DRIFT_TIME_FREQ: f64 = 0.35;

pub struct PrecipitationSystem {
    width: f32,
    height: f32,
    config: PrecipitationConfig,
    particles: Vec<Particle>,
    rng: ChaCha8Rng,
    noise: Perlin,
    /// Wind in device px/s (horizontal only).
    wind: Vec2,
    spawn_accumulator: f32,
    elapsed: f64,
    next_id: u64,
    spawned: u64,
    culled: u64,
}

impl PrecipitationSystem {
    pub fn new(width: u32, height: u32, config: &PrecipitationConfig) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            particles: Vec::with_capacity(config.max_particles.min(4096)),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            noise: Perlin::new(config.seed as u32),
            config: config.clone(),
            wind: Vec2::ZERO,
            spawn_accumulator: 0.0,
            elapsed: 0.0,
            next_id: 0,
            spawned: 0,
            culled: 0,
        }
    }

    pub fn config(&self) -> &PrecipitationConfig {
        &self.config
    }

    /// Replace tuning. Live particles keep their state; a lower cap takes
    /// effect as they are culled.
    pub fn set_config(&mut self, config: &PrecipitationConfig) {
        self.config = config.clone();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn wind(&self) -> Vec2 {
        self.wind
    }

    /// Simulated seconds so far (sum of clamped steps).
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn spawned_count(&self) -> u64 {
        self.spawned
    }

    pub fn culled_count(&self) -> u64 {
        self.culled
    }

    /// Set the wind from speed (km/h) and direction (degrees). The
    /// horizontal component is `sin(direction)`; a missing direction means
    /// no horizontal push.
    pub fn set_wind(&mut self, speed_kmh: f32, direction_deg: Option<f32>) {
        let speed = if speed_kmh.is_finite() { speed_kmh.max(0.0) } else { 0.0 };
        let x = match direction_deg {
            Some(dir) if dir.is_finite() => dir.to_radians().sin() * speed * self.config.wind_px_per_kmh,
            _ => 0.0,
        };
        self.wind = Vec2::new(x, 0.0);
    }

    #[inline]
    fn speed_scale(&self) -> f32 {
        (self.height / REFERENCE_HEIGHT).max(MIN_SPEED_SCALE)
    }

    #[inline]
    fn spawn_rate(&self, profile: &ParticleProfile) -> f32 {
        profile.spawn_rate * (self.width / REFERENCE_WIDTH)
    }

    /// Upper bound on particles created by one `update`, whatever its `dt`.
    pub fn max_spawn_per_step(&self, kind: ParticleKind, bucket: IntensityBucket) -> usize {
        let rate = self.spawn_rate(profile(kind, bucket));
        (rate * self.config.max_step.max(0.0) + 1.0).floor() as usize
    }

    /// Mean particle velocity, `None` when there are no particles.
    pub fn average_velocity(&self) -> Option<Vec2> {
        if self.particles.is_empty() {
            return None;
        }
        let sum: Vec2 = self.particles.iter().map(|p| p.velocity).sum();
        Some(sum / self.particles.len() as f32)
    }

    /// Advance by `dt` seconds (clamped to `max_step`) and spawn toward
    /// `target`. `None` stops spawning; live particles finish their fall.
    pub fn update(&mut self, dt: f32, target: Option<(ParticleKind, IntensityBucket)>) {
        let dt = if dt.is_finite() { dt.clamp(0.0, self.config.max_step.max(0.0)) } else { 0.0 };
        if self.width <= 0.0 || self.height <= 0.0 {
            self.particles.clear();
            self.spawn_accumulator = 0.0;
            return;
        }
        self.elapsed += dt as f64;

        self.integrate(dt);
        self.cull();

        match target {
            Some((kind, bucket)) => self.spawn(dt, kind, bucket),
            None => self.spawn_accumulator = 0.0,
        }
    }

    fn integrate(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let noise = &self.noise;
        let wind = self.wind;
        let t = self.elapsed * DRIFT_TIME_FREQ;
        let (fade_in, fade_out) = (self.config.fade_in, self.config.fade_out);
        let relax = 1.0 - (-WIND_RELAX_RATE * dt).exp();
        let (x_min, x_max) = self.side_margins();
        let span = x_max - x_min;

        for p in &mut self.particles {
            let prof = profile(p.kind, p.bucket);
            let n = noise.get([
                p.position.x as f64 * DRIFT_SPATIAL_FREQ,
                p.position.y as f64 * DRIFT_SPATIAL_FREQ + p.noise_phase as f64,
                t,
            ]) as f32;
            let target_vx = p.launch_vx + wind.x * prof.wind_response + n * prof.drift;
            p.velocity.x += (target_vx - p.velocity.x) * relax;

            p.position += p.velocity * dt;
            if p.position.x < x_min {
                p.position.x += span;
            } else if p.position.x > x_max {
                p.position.x -= span;
            }
            p.rotation += p.rotation_velocity * dt;
            p.age += dt;
            p.opacity = p.base_opacity * fade_factor(p.age, p.lifetime, fade_in, fade_out);
        }
    }

    /// Horizontal band particles live in, half a surface beyond each edge.
    #[inline]
    fn side_margins(&self) -> (f32, f32) {
        (-self.width * SIDE_MARGIN, self.width * (1.0 + SIDE_MARGIN))
    }

    fn cull(&mut self) {
        let h = self.height;
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_expired() && p.position.y <= h + p.size * BOTTOM_MARGIN);
        let removed = before - self.particles.len();
        self.culled += removed as u64;
    }

    fn spawn(&mut self, dt: f32, kind: ParticleKind, bucket: IntensityBucket) {
        let prof = profile(kind, bucket);
        let rate = self.spawn_rate(prof);
        let cap = rate * self.config.max_step.max(0.0) + 1.0;
        self.spawn_accumulator = (self.spawn_accumulator + rate * dt).min(cap);

        let room = self.config.max_particles.saturating_sub(self.particles.len());
        let wanted = self.spawn_accumulator.floor() as usize;
        let count = if wanted > room {
            // Full: drop the backlog instead of bursting once room frees up
            self.spawn_accumulator = 0.0;
            room
        } else {
            self.spawn_accumulator -= wanted as f32;
            wanted
        };

        for _ in 0..count {
            let particle = self.make_particle(kind, bucket, prof);
            self.particles.push(particle);
        }
        self.spawned += count as u64;
        if count > 0 {
            log::trace!("spawned {count} {kind:?} particles ({} live)", self.particles.len());
        }
    }

    fn make_particle(&mut self, kind: ParticleKind, bucket: IntensityBucket, prof: &ParticleProfile) -> Particle {
        let speed_scale = self.speed_scale();
        let speed = sample(&mut self.rng, prof.speed) * speed_scale;
        let fall_time = self.height / speed.max(1.0);

        // Widen the spawn strip upwind so windy rain still covers the surface
        let blown = self.wind.x * prof.wind_response * fall_time;
        let (x_min, x_max) = self.side_margins();
        let (x_lo, x_hi) = if blown >= 0.0 {
            ((-blown).max(x_min), self.width)
        } else {
            (0.0, (self.width - blown).min(x_max))
        };
        let x = x_lo + (x_hi - x_lo) * self.rng.gen_range(0.0f32..1.0);
        let y = -self.rng.gen_range(0.0f32..1.0) * self.height * 0.1;

        let (launch_vx, vy, rotation_velocity) = match kind {
            ParticleKind::Rain => {
                let variance = self.config.rain_angle_variance.max(0.0);
                let angle = if variance > 0.0 {
                    self.rng.gen_range(-variance..variance).to_radians()
                } else {
                    0.0
                };
                (speed * angle.sin(), speed * angle.cos(), 0.0)
            }
            ParticleKind::Snow => {
                let sway = self.rng.gen_range(-1.0f32..1.0) * prof.drift * 0.5;
                let spin = if prof.spin > 0.0 { self.rng.gen_range(-prof.spin..prof.spin) } else { 0.0 };
                (sway, speed, spin)
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        Particle {
            id,
            position: Vec2::new(x, y),
            velocity: Vec2::new(launch_vx + self.wind.x * prof.wind_response, vy),
            launch_vx,
            size: sample(&mut self.rng, prof.size),
            base_opacity: sample(&mut self.rng, prof.opacity),
            opacity: 0.0,
            lifetime: sample(&mut self.rng, prof.lifetime),
            age: 0.0,
            rotation: self.rng.gen_range(0.0f32..std::f32::consts::TAU),
            rotation_velocity,
            kind,
            bucket,
            noise_phase: self.rng.gen_range(0.0f32..64.0),
        }
    }

    /// Follow a surface resize: positions scale into the new bounds. A
    /// zero-sized surface drops every particle.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        if w == self.width && h == self.height {
            return;
        }
        if w <= 0.0 || h <= 0.0 {
            self.particles.clear();
        } else if self.width > 0.0 && self.height > 0.0 {
            let ratio = Vec2::new(w / self.width, h / self.height);
            for p in &mut self.particles {
                p.position = (p.position * ratio).clamp(Vec2::ZERO, Vec2::new(w, h));
            }
        } else {
            self.particles.clear();
        }
        log::debug!(
            "precipitation resized {}x{} -> {}x{}",
            self.width,
            self.height,
            w,
            h
        );
        self.width = w;
        self.height = h;
    }

    /// Drop every particle and the spawn backlog.
    pub fn clear(&mut self) {
        self.culled += self.particles.len() as u64;
        self.particles.clear();
        self.spawn_accumulator = 0.0;
    }
}

#[inline]
fn sample<R: Rng>(rng: &mut R, (lo, hi): (f32, f32)) -> f32 {
    lo + (hi - lo) * rng.gen_range(0.0f32..1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    const HEAVY_RAIN: Option<(ParticleKind, IntensityBucket)> =
        Some((ParticleKind::Rain, IntensityBucket::Heavy));
    const SNOW: Option<(ParticleKind, IntensityBucket)> =
        Some((ParticleKind::Snow, IntensityBucket::Moderate));

    fn system() -> PrecipitationSystem {
        PrecipitationSystem::new(1280, 720, &PrecipitationConfig::default())
    }

    #[test]
    fn test_dt_spike_is_clamped() {
        let mut sys = system();
        let bound = sys.max_spawn_per_step(ParticleKind::Rain, IntensityBucket::Heavy);
        sys.update(10.0, HEAVY_RAIN);
        assert!(sys.len() <= bound, "{} > {bound}", sys.len());
        assert!((sys.elapsed() - 0.05).abs() < 1e-6);
        for p in sys.particles() {
            assert!(p.age <= 0.05 + 1e-6);
        }
        // Non-finite deltas do nothing
        let before = sys.elapsed();
        sys.update(f32::NAN, HEAVY_RAIN);
        assert_eq!(sys.elapsed(), before);
    }

    #[test]
    fn test_particle_cap_never_exceeded() {
        let config = PrecipitationConfig {
            max_particles: 50,
            ..Default::default()
        };
        let mut sys = PrecipitationSystem::new(1280, 720, &config);
        for _ in 0..300 {
            sys.update(1.0 / 30.0, HEAVY_RAIN);
            assert!(sys.len() <= 50);
        }
        assert_eq!(sys.len(), 50);
    }

    #[test]
    fn test_age_monotonic_and_single_removal() {
        let mut sys = system();
        let mut ages: HashMap<u64, f32> = HashMap::new();
        let mut gone: HashSet<u64> = HashSet::new();
        for _ in 0..200 {
            sys.update(1.0 / 30.0, SNOW);
            let live: HashSet<u64> = sys.particles().iter().map(|p| p.id).collect();
            assert_eq!(live.len(), sys.len(), "duplicate ids");
            for p in sys.particles() {
                assert!(!gone.contains(&p.id), "particle {} came back", p.id);
                assert!(p.age < p.lifetime);
                if let Some(prev) = ages.get(&p.id) {
                    assert!(p.age > *prev);
                }
                ages.insert(p.id, p.age);
            }
            for id in ages.keys() {
                if !live.contains(id) {
                    gone.insert(*id);
                }
            }
            ages.retain(|id, _| live.contains(id));
        }
        assert_eq!(sys.spawned_count(), sys.culled_count() + sys.len() as u64);
    }

    #[test]
    fn test_no_target_stops_spawning() {
        let mut sys = system();
        for _ in 0..10 {
            sys.update(1.0 / 30.0, HEAVY_RAIN);
        }
        let spawned = sys.spawned_count();
        assert!(spawned > 0);
        for _ in 0..120 {
            sys.update(1.0 / 30.0, None);
        }
        assert_eq!(sys.spawned_count(), spawned);
        assert!(sys.is_empty());
    }

    #[test]
    fn test_heavy_rain_with_wind() {
        let mut sys = system();
        sys.set_wind(40.0, Some(90.0));
        let mut peak = 0;
        for _ in 0..150 {
            sys.update(1.0 / 30.0, HEAVY_RAIN);
            assert!(sys.len() <= 1000);
            peak = peak.max(sys.len());
        }
        assert!(peak > 500, "peak {peak}");
        let v = sys.average_velocity().unwrap();
        assert!(v.x > 0.0 && v.y > 0.0, "{v:?}");
    }

    #[test]
    fn test_strong_wind_removes_only_expired_or_fallen() {
        let mut sys = system();
        sys.set_wind(40.0, Some(90.0));
        let dt = 1.0 / 30.0;
        let h = sys.size().y;
        let (x_min, x_max) = sys.side_margins();
        for _ in 0..300 {
            let before: HashMap<u64, Particle> = sys.particles().iter().map(|p| (p.id, p.clone())).collect();
            sys.update(dt, SNOW);
            let live: HashSet<u64> = sys.particles().iter().map(|p| p.id).collect();
            for (id, p) in &before {
                if live.contains(id) {
                    continue;
                }
                // Vertical speed is constant between spawn and removal
                let expired = p.age + dt >= p.lifetime - 1e-4;
                let fallen = p.position.y + p.velocity.y * dt > h + p.size * BOTTOM_MARGIN - 1e-3;
                assert!(expired || fallen, "particle {id} removed early: {p:?}");
            }
            for p in sys.particles() {
                assert!((x_min..=x_max).contains(&p.position.x), "x = {}", p.position.x);
            }
        }
        assert!(sys.culled_count() > 0);
    }

    #[test]
    fn test_resize_keeps_particles_in_bounds() {
        let mut sys = system();
        for _ in 0..30 {
            sys.update(1.0 / 30.0, SNOW);
        }
        assert!(!sys.is_empty());
        sys.resize(320, 200);
        for p in sys.particles() {
            assert!((0.0..=320.0).contains(&p.position.x));
            assert!((0.0..=200.0).contains(&p.position.y));
        }
        sys.resize(0, 0);
        assert!(sys.is_empty());
        sys.update(1.0 / 30.0, SNOW);
        assert!(sys.is_empty());
    }

    #[test]
    fn test_snow_rotates_and_fades_in() {
        let mut sys = system();
        sys.update(0.05, SNOW);
        sys.update(0.05, SNOW);
        let first = sys.particles()[0].clone();
        assert!(first.opacity < first.base_opacity);
        for _ in 0..20 {
            sys.update(0.05, SNOW);
        }
        let later = sys.particles().iter().find(|p| p.id == first.id).unwrap();
        if first.rotation_velocity != 0.0 {
            assert_ne!(later.rotation, first.rotation);
        }
        assert!(later.opacity > first.opacity);
    }

    #[test]
    fn test_wind_direction_sign() {
        let mut sys = system();
        sys.set_wind(10.0, Some(270.0));
        assert!(sys.wind().x < 0.0);
        sys.set_wind(10.0, None);
        assert_eq!(sys.wind(), Vec2::ZERO);
        sys.set_wind(f32::NAN, Some(90.0));
        assert_eq!(sys.wind(), Vec2::ZERO);
    }
}

//! Procedural bolt geometry and per-bolt lifecycle.

use glam::Vec2;
use rand::Rng;

/// Where a bolt is in its life at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoltPhase {
    Flashing,
    Fading,
    Expired,
}

/// One lightning strike.
///
/// Geometry is in normalized surface coordinates (0..1 on both axes) so it
/// survives surface resizes; it never changes after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Bolt {
    points: Vec<Vec2>,
    branches: Vec<Vec<Vec2>>,
    start_time: f64,
    seed: u64,
}

/// Share of the previous step's drift carried into the next.
const DRIFT_MEMORY: f32 = 0.6;
const MAX_STEP_DRIFT: f32 = 0.045;
const MAX_BRANCHES: usize = 2;

impl Bolt {
    /// Build a bolt with a damped random walk from the top edge down to the
    /// horizon region.
    pub fn generate<R: Rng>(rng: &mut R, start_time: f64, segments: usize) -> Self {
        let segments = segments.max(4);
        let seed = rng.gen_range(0..u64::MAX);
        let start_x = rng.gen_range(0.15f32..0.85);
        let end_y = rng.gen_range(0.55f32..0.75);
        let points = random_walk(rng, Vec2::new(start_x, 0.0), end_y / segments as f32, segments, 0.0);

        let mut branches = Vec::new();
        for _ in 0..rng.gen_range(0..=MAX_BRANCHES) {
            let from = rng.gen_range(segments / 4..(3 * segments / 4).max(segments / 4 + 1));
            let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let bias = side * MAX_STEP_DRIFT * 0.6;
            let len = rng.gen_range(3..=6);
            let step = end_y / segments as f32 * 0.8;
            branches.push(random_walk(rng, points[from], step, len, bias));
        }

        Self {
            points,
            branches,
            start_time,
            seed,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn branches(&self) -> &[Vec<Vec2>] {
        &self.branches
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Time at which the bolt is gone for good.
    #[inline]
    pub fn expires_at(&self, flash: f64, fade: f64) -> f64 {
        self.start_time + flash + fade
    }

    pub fn phase(&self, now: f64, flash: f64, fade: f64) -> BoltPhase {
        if now >= self.expires_at(flash, fade) {
            BoltPhase::Expired
        } else if now < self.start_time + flash {
            BoltPhase::Flashing
        } else {
            BoltPhase::Fading
        }
    }

    /// Visible intensity: 1 while flashing (with a seeded flicker), easing
    /// out quadratically while fading, 0 once expired. Strictly positive
    /// before expiry.
    pub fn intensity(&self, now: f64, flash: f64, fade: f64) -> f32 {
        match self.phase(now, flash, fade) {
            BoltPhase::Flashing => {
                let age = (now - self.start_time).max(0.0);
                let flicker = ((age * 60.0 + (self.seed % 7) as f64).sin() * 0.5 + 0.5) as f32;
                0.85 + 0.15 * flicker
            }
            BoltPhase::Fading => {
                let left = (self.expires_at(flash, fade) - now) / fade.max(1e-9);
                let left = left.clamp(0.0, 1.0) as f32;
                (left * left).max(f32::MIN_POSITIVE)
            }
            BoltPhase::Expired => 0.0,
        }
    }

    /// Up to `count` points spread evenly along the main channel.
    pub fn sample_points(&self, count: usize) -> Vec<Vec2> {
        if count == 0 || self.points.is_empty() {
            return Vec::new();
        }
        if count >= self.points.len() {
            return self.points.clone();
        }
        let last = self.points.len() - 1;
        (0..count)
            .map(|i| {
                let idx = if count == 1 { last / 2 } else { i * last / (count - 1) };
                self.points[idx]
            })
            .collect()
    }
}

/// Walk downward; each step's horizontal drift blends a random delta with the
/// previous step's drift.
fn random_walk<R: Rng>(rng: &mut R, start: Vec2, step_y: f32, steps: usize, bias: f32) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(steps + 1);
    let mut p = start;
    let mut vx = bias;
    points.push(p);
    for _ in 0..steps {
        let delta = rng.gen_range(-MAX_STEP_DRIFT..MAX_STEP_DRIFT) + bias;
        vx = DRIFT_MEMORY * vx + (1.0 - DRIFT_MEMORY) * delta;
        p = Vec2::new((p.x + vx).clamp(0.02, 0.98), (p.y + step_y).min(1.0));
        points.push(p);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const FLASH: f64 = 0.15;
    const FADE: f64 = 0.6;

    fn bolt() -> Bolt {
        Bolt::generate(&mut ChaCha8Rng::seed_from_u64(3), 10.0, 24)
    }

    #[test]
    fn test_geometry_top_to_bottom() {
        let bolt = bolt();
        assert_eq!(bolt.points().len(), 25);
        assert_eq!(bolt.points()[0].y, 0.0);
        for pair in bolt.points().windows(2) {
            assert!(pair[1].y > pair[0].y);
            // Damped walk: no single jump larger than the raw delta bound
            assert!((pair[1].x - pair[0].x).abs() <= MAX_STEP_DRIFT + 1e-6);
        }
        let end = bolt.points().last().unwrap().y;
        assert!((0.55..=0.75).contains(&end));
        assert!(bolt.branches().len() <= MAX_BRANCHES);
        for p in bolt.points().iter().chain(bolt.branches().iter().flatten()) {
            assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn test_same_seed_same_bolt() {
        assert_eq!(bolt(), bolt());
    }

    #[test]
    fn test_phases() {
        let bolt = bolt();
        assert_eq!(bolt.phase(10.0, FLASH, FADE), BoltPhase::Flashing);
        assert_eq!(bolt.phase(10.2, FLASH, FADE), BoltPhase::Fading);
        let expiry = bolt.expires_at(FLASH, FADE);
        assert_eq!(bolt.phase(expiry - 1e-6, FLASH, FADE), BoltPhase::Fading);
        assert_eq!(bolt.phase(expiry, FLASH, FADE), BoltPhase::Expired);
    }

    #[test]
    fn test_intensity_fades_to_zero() {
        let bolt = bolt();
        let expiry = bolt.expires_at(FLASH, FADE);
        assert!(bolt.intensity(10.05, FLASH, FADE) >= 0.85);
        let early = bolt.intensity(10.3, FLASH, FADE);
        let late = bolt.intensity(10.7, FLASH, FADE);
        assert!(early > late && late > 0.0);
        assert!(bolt.intensity(expiry - 1e-6, FLASH, FADE) > 0.0);
        assert_eq!(bolt.intensity(expiry, FLASH, FADE), 0.0);
    }

    #[test]
    fn test_sample_points_bounded() {
        let bolt = bolt();
        assert_eq!(bolt.sample_points(0).len(), 0);
        assert_eq!(bolt.sample_points(5).len(), 5);
        assert_eq!(bolt.sample_points(5)[0], bolt.points()[0]);
        assert_eq!(bolt.sample_points(100).len(), bolt.points().len());
    }
}

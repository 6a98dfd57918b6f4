//! A single rain drop or snow flake.

use glam::Vec2;

use crate::color::ease::{clamp01, smoothstep};
use crate::precipitation::table::{IntensityBucket, ParticleKind};

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub id: u64,
    /// Device pixels.
    pub position: Vec2,
    /// Device pixels per second.
    pub velocity: Vec2,
    /// Horizontal launch velocity before wind, px/s.
    pub launch_vx: f32,
    /// Radius (snow) or stroke width (rain) in CSS pixels; the painter
    /// scales it by the device pixel ratio.
    pub size: f32,
    pub base_opacity: f32,
    /// Opacity after fading, updated every step.
    pub opacity: f32,
    pub lifetime: f32,
    pub age: f32,
    pub rotation: f32,
    pub rotation_velocity: f32,
    pub kind: ParticleKind,
    pub bucket: IntensityBucket,
    /// Offset into the drift noise field so neighbours don't sway in lockstep.
    pub noise_phase: f32,
}

impl Particle {
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Opacity multiplier for a particle `age` seconds into a `lifetime`:
/// eases in over `fade_in`, out over the last `fade_out`.
pub fn fade_factor(age: f32, lifetime: f32, fade_in: f32, fade_out: f32) -> f32 {
    if !(age.is_finite() && lifetime > 0.0) || age >= lifetime {
        return 0.0;
    }
    let fin = if fade_in > 0.0 { smoothstep(0.0, fade_in, age) } else { 1.0 };
    let left = lifetime - age;
    let fout = if fade_out > 0.0 { smoothstep(0.0, fade_out, left) } else { 1.0 };
    clamp01(fin.min(fout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_factor_shape() {
        assert_eq!(fade_factor(0.0, 2.0, 0.25, 0.35), 0.0);
        assert_eq!(fade_factor(1.0, 2.0, 0.25, 0.35), 1.0);
        assert!(fade_factor(0.1, 2.0, 0.25, 0.35) < 1.0);
        assert!(fade_factor(1.9, 2.0, 0.25, 0.35) < 1.0);
        assert_eq!(fade_factor(2.0, 2.0, 0.25, 0.35), 0.0);
        assert_eq!(fade_factor(f32::NAN, 2.0, 0.25, 0.35), 0.0);
    }

    #[test]
    fn test_no_fade_windows() {
        assert_eq!(fade_factor(0.0, 1.0, 0.0, 0.0), 1.0);
    }
}

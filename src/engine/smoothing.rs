//! Exponential chase of the displayed sky colors toward the target.

use crate::sky::SkyLayerColors;

/// Current/target pair blended in OKLCH by `k = 1 - exp(-dt / tau)`.
///
/// The blend depends only on elapsed time, so the approach looks the same
/// at any frame rate. The first target snaps instead of fading in from
/// nothing.
#[derive(Clone, Debug)]
pub struct ColorSmoother {
    current: Option<SkyLayerColors>,
    target: Option<SkyLayerColors>,
    time_constant: f32,
}

impl ColorSmoother {
    pub fn new(time_constant: f32) -> Self {
        Self {
            current: None,
            target: None,
            time_constant: sanitize_tau(time_constant),
        }
    }

    pub fn time_constant(&self) -> f32 {
        self.time_constant
    }

    pub fn set_time_constant(&mut self, time_constant: f32) {
        self.time_constant = sanitize_tau(time_constant);
    }

    pub fn current(&self) -> Option<&SkyLayerColors> {
        self.current.as_ref()
    }

    pub fn target(&self) -> Option<&SkyLayerColors> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: SkyLayerColors) {
        if self.current.is_none() {
            self.current = Some(target);
        }
        self.target = Some(target);
    }

    /// Blend factor for a step of `dt` seconds.
    pub fn blend_factor(&self, dt: f32) -> f32 {
        if !(dt.is_finite() && dt > 0.0) {
            return 0.0;
        }
        if self.time_constant <= 0.0 {
            return 1.0;
        }
        1.0 - (-dt / self.time_constant).exp()
    }

    /// Advance by `dt` seconds and return the colors to draw.
    pub fn step(&mut self, dt: f32) -> Option<SkyLayerColors> {
        let target = self.target?;
        let k = self.blend_factor(dt);
        let next = match self.current {
            Some(current) if k < 1.0 => current.mix(&target, k),
            _ => target,
        };
        self.current = Some(next);
        Some(next)
    }

    /// Largest per-channel gap between current and target.
    pub fn remaining(&self) -> f32 {
        match (&self.current, &self.target) {
            (Some(c), Some(t)) => c.max_channel_delta(t),
            _ => 0.0,
        }
    }

    /// Forget both colors; the next target snaps.
    pub fn reset(&mut self) {
        self.current = None;
        self.target = None;
    }
}

fn sanitize_tau(tau: f32) -> f32 {
    if tau.is_finite() { tau.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: SkyLayerColors = SkyLayerColors {
        upper_sky: [0.2, 0.45, 0.85],
        mid_sky: [0.4, 0.6, 0.9],
        horizon_band: [0.75, 0.82, 0.92],
        ground_bounce: [0.5, 0.5, 0.45],
    };
    const NIGHT: SkyLayerColors = SkyLayerColors {
        upper_sky: [0.01, 0.02, 0.06],
        mid_sky: [0.02, 0.03, 0.09],
        horizon_band: [0.05, 0.06, 0.12],
        ground_bounce: [0.02, 0.02, 0.03],
    };

    #[test]
    fn test_first_target_snaps() {
        let mut s = ColorSmoother::new(1.5);
        assert!(s.step(0.1).is_none());
        s.set_target(DAY);
        assert_eq!(s.step(0.0), Some(DAY));
    }

    #[test]
    fn test_converges_monotonically() {
        let mut s = ColorSmoother::new(1.5);
        s.set_target(DAY);
        s.set_target(NIGHT);
        let mut last = s.remaining();
        assert!(last > 0.5);
        for _ in 0..60 {
            s.step(1.0 / 30.0);
            let r = s.remaining();
            assert!(r <= last + 1e-3);
            last = r;
        }
        assert!(last > 0.0);
        for _ in 0..600 {
            s.step(1.0 / 30.0);
        }
        assert!(s.remaining() < 0.01);
    }

    #[test]
    fn test_frame_rate_independent() {
        let k_once = ColorSmoother::new(1.5).blend_factor(0.2);
        let s = ColorSmoother::new(1.5);
        let k_step = s.blend_factor(0.1);
        // Two half steps compound to one full step
        let k_twice = 1.0 - (1.0 - k_step) * (1.0 - k_step);
        assert!((k_once - k_twice).abs() < 1e-6);
    }

    #[test]
    fn test_zero_time_constant_snaps() {
        let mut s = ColorSmoother::new(0.0);
        s.set_target(DAY);
        s.set_target(NIGHT);
        assert_eq!(s.step(0.016), Some(NIGHT));
        assert_eq!(s.blend_factor(f32::NAN), 0.0);
    }
}

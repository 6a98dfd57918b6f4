//! Scalar easing and clamping helpers shared by every model and renderer.

/// Clamp to `[0.0, 1.0]`, mapping NaN to 0.
#[inline]
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Clamp to `[min, max]`, mapping NaN to `fallback`.
#[inline]
pub fn clamp_or(x: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if x.is_nan() { fallback } else { x.clamp(min, max) }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep. Returns exactly 0 at or below `edge0` and exactly 1
/// at or above `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = clamp01((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

/// Smooth bump centred on `center`: 1 at the center, 0 beyond `half_width`.
#[inline]
pub fn bell(x: f32, center: f32, half_width: f32) -> f32 {
    1.0 - smoothstep(0.0, half_width, (x - center).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp01_handles_nan() {
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert_eq!(clamp01(-3.0), 0.0);
        assert_eq!(clamp01(7.0), 1.0);
        assert_eq!(clamp01(0.25), 0.25);
    }

    #[test]
    fn test_smoothstep_edges_exact() {
        assert_eq!(smoothstep(-4.0, 6.0, -4.0), 0.0);
        assert_eq!(smoothstep(-4.0, 6.0, -10.0), 0.0);
        assert_eq!(smoothstep(-4.0, 6.0, 6.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_smoothstep_monotonic() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = smoothstep(0.0, 1.0, i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn test_bell_peak_and_tails() {
        assert!((bell(2.0, 2.0, 8.0) - 1.0).abs() < 1e-6);
        assert_eq!(bell(20.0, 2.0, 8.0), 0.0);
    }
}

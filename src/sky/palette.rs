//! Elevation-keyed color ramps for the four sky layers.
//!
//! [`ElevationRamp`] interpolates between keys sorted by sun elevation with
//! smoothstep easing, so the palette lingers near each key and moves quickly
//! between them instead of sliding linearly. Colors mix in OKLCH.

use serde::{Deserialize, Serialize};

use crate::color::ease::{clamp_or, smoothstep};
use crate::color::oklch::mix_oklch;
use crate::core::Rgb;
use crate::sky::layers::SkyLayerColors;

// ---------------------------------------------------------------------------
// Mix trait
// ---------------------------------------------------------------------------

/// Types that can be blended between two keys.
pub trait Mix: Clone {
    fn mix(&self, other: &Self, t: f32) -> Self;
}

impl Mix for f32 {
    #[inline]
    fn mix(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Mix for Rgb {
    #[inline]
    fn mix(&self, other: &Self, t: f32) -> Self {
        mix_oklch(*self, *other, t)
    }
}

// ---------------------------------------------------------------------------
// ElevationRamp
// ---------------------------------------------------------------------------

/// Keyframe ramp over sun elevation in degrees.
///
/// Sampling clamps to the first/last key outside the keyed range; there is
/// no wrapping (elevation is not cyclic).
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationRamp<T: Mix> {
    keys: Vec<(f32, T)>,
}

impl<T: Mix> ElevationRamp<T> {
    /// Create a ramp from unsorted keys. Non-finite elevations are dropped.
    pub fn new(mut keys: Vec<(f32, T)>) -> Self {
        keys.retain(|k| k.0.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![(0.0, value)],
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sample at `elevation`, or `None` for an empty ramp.
    pub fn sample(&self, elevation: f32) -> Option<T> {
        let (first, last) = (self.keys.first()?, self.keys.last()?);
        let e = clamp_or(elevation, -90.0, 90.0, 0.0);
        if e <= first.0 {
            return Some(first.1.clone());
        }
        if e >= last.0 {
            return Some(last.1.clone());
        }
        // First key strictly above e; exists because e < last key
        let upper = self.keys.iter().position(|k| k.0 > e).unwrap_or(self.keys.len() - 1);
        let (e_a, ref v_a) = self.keys[upper - 1];
        let (e_b, ref v_b) = self.keys[upper];
        let span = e_b - e_a;
        if span < 1e-6 {
            return Some(v_a.clone());
        }
        Some(v_a.mix(v_b, smoothstep(0.0, 1.0, (e - e_a) / span)))
    }
}

impl<T: Mix + Serialize> Serialize for ElevationRamp<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.keys.serialize(serializer)
    }
}

impl<'de, T: Mix + Deserialize<'de>> Deserialize<'de> for ElevationRamp<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<(f32, T)>::deserialize(deserializer)?;
        if keys.is_empty() {
            return Err(serde::de::Error::custom("elevation ramp needs at least one key"));
        }
        Ok(Self::new(keys))
    }
}

// ---------------------------------------------------------------------------
// SkyPalette
// ---------------------------------------------------------------------------

/// Base (clear-sky) palette: one ramp per sky layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyPalette {
    pub upper_sky: ElevationRamp<Rgb>,
    pub mid_sky: ElevationRamp<Rgb>,
    pub horizon_band: ElevationRamp<Rgb>,
    pub ground_bounce: ElevationRamp<Rgb>,
}

const FALLBACK: Rgb = [0.0, 0.0, 0.0];

impl SkyPalette {
    pub fn sample(&self, elevation: f32) -> SkyLayerColors {
        SkyLayerColors {
            upper_sky: self.upper_sky.sample(elevation).unwrap_or(FALLBACK),
            mid_sky: self.mid_sky.sample(elevation).unwrap_or(FALLBACK),
            horizon_band: self.horizon_band.sample(elevation).unwrap_or(FALLBACK),
            ground_bounce: self.ground_bounce.sample(elevation).unwrap_or(FALLBACK),
        }
    }
}

impl Default for SkyPalette {
    fn default() -> Self {
        Self {
            // ----- Upper sky (zenith) -----
            upper_sky: ElevationRamp::new(vec![
                (-18.0, [0.010, 0.015, 0.050]), // astronomical night
                (-10.0, [0.020, 0.030, 0.100]), // nautical twilight
                (-4.0, [0.080, 0.100, 0.280]),  // blue hour
                (0.0, [0.180, 0.240, 0.480]),   // horizon crossing
                (4.0, [0.260, 0.380, 0.660]),   // golden hour
                (10.0, [0.240, 0.440, 0.780]),
                (25.0, [0.200, 0.460, 0.860]),  // day
                (60.0, [0.160, 0.420, 0.880]),  // high sun, deepest blue
            ]),
            // ----- Mid sky -----
            mid_sky: ElevationRamp::new(vec![
                (-18.0, [0.020, 0.030, 0.080]),
                (-10.0, [0.050, 0.060, 0.160]),
                (-4.0, [0.220, 0.200, 0.400]),  // violet twilight
                (0.0, [0.520, 0.400, 0.520]),   // rose
                (4.0, [0.620, 0.580, 0.700]),
                (10.0, [0.500, 0.660, 0.880]),
                (25.0, [0.450, 0.660, 0.920]),
                (60.0, [0.400, 0.640, 0.930]),
            ]),
            // ----- Horizon band -----
            horizon_band: ElevationRamp::new(vec![
                (-18.0, [0.040, 0.050, 0.100]),
                (-10.0, [0.100, 0.090, 0.180]),
                (-4.0, [0.550, 0.320, 0.300]),  // first glow
                (0.0, [0.980, 0.580, 0.320]),   // sunrise orange
                (4.0, [1.000, 0.750, 0.500]),
                (10.0, [0.850, 0.850, 0.850]),  // washed-out haze
                (25.0, [0.720, 0.840, 0.950]),
                (60.0, [0.700, 0.840, 0.960]),
            ]),
            // ----- Ground bounce -----
            ground_bounce: ElevationRamp::new(vec![
                (-18.0, [0.020, 0.020, 0.040]),
                (-10.0, [0.040, 0.040, 0.070]),
                (-4.0, [0.160, 0.110, 0.120]),
                (0.0, [0.380, 0.240, 0.180]),
                (4.0, [0.500, 0.400, 0.320]),
                (10.0, [0.520, 0.520, 0.500]),
                (25.0, [0.550, 0.580, 0.580]),
                (60.0, [0.560, 0.600, 0.600]),
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_constant_ramp() {
        let ramp = ElevationRamp::constant(0.5_f32);
        assert_eq!(ramp.sample(-90.0), Some(0.5));
        assert_eq!(ramp.sample(90.0), Some(0.5));
    }

    #[test]
    fn test_empty_ramp_samples_none() {
        let ramp: ElevationRamp<f32> = ElevationRamp::new(vec![(f32::NAN, 1.0)]);
        assert!(ramp.is_empty());
        assert_eq!(ramp.sample(0.0), None);
    }

    #[test]
    fn test_clamps_outside_keys() {
        let ramp = ElevationRamp::new(vec![(10.0, 1.0_f32), (-10.0, 0.0)]);
        assert_eq!(ramp.sample(-50.0), Some(0.0));
        assert_eq!(ramp.sample(50.0), Some(1.0));
        assert_eq!(ramp.sample(f32::NAN), Some(0.5));
    }

    #[test]
    fn test_smoothstep_easing() {
        let ramp = ElevationRamp::new(vec![(0.0, 0.0_f32), (10.0, 1.0)]);
        assert!(approx_eq_f32(ramp.sample(5.0).unwrap(), 0.5, 1e-5));
        // Eased: a quarter of the way in is below linear
        let quarter = ramp.sample(2.5).unwrap();
        assert!(quarter < 0.25, "quarter = {quarter}");
        assert!(approx_eq_f32(quarter, 0.156_25, 1e-5));
    }

    #[test]
    fn test_exact_keys() {
        let ramp = ElevationRamp::new(vec![(-6.0, 1.0_f32), (0.0, 2.0), (6.0, 3.0)]);
        assert_eq!(ramp.sample(-6.0), Some(1.0));
        assert_eq!(ramp.sample(0.0), Some(2.0));
        assert_eq!(ramp.sample(6.0), Some(3.0));
    }

    #[test]
    fn test_default_palette_brighter_by_day() {
        let palette = SkyPalette::default();
        let night = palette.sample(-30.0);
        let day = palette.sample(45.0);
        let lum = |c: Rgb| c[0] + c[1] + c[2];
        assert!(lum(day.upper_sky) > lum(night.upper_sky) * 5.0);
        assert!(lum(day.horizon_band) > lum(night.horizon_band));
    }

    #[test]
    fn test_serde_round_trip() {
        let palette = SkyPalette::default();
        let json = serde_json::to_string(&palette).unwrap();
        let back: SkyPalette = serde_json::from_str(&json).unwrap();
        assert_eq!(back, palette);
    }

    #[test]
    fn test_deserialize_rejects_empty_ramp() {
        let result: Result<ElevationRamp<f32>, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }
}

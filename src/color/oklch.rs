//! OKLab / OKLCH conversion and perceptual mixing.
//!
//! Sky transitions blended in plain RGB pass through muddy greys (blue to
//! orange goes brown). Mixing lightness, chroma and hue separately keeps
//! twilight gradients saturated.

use crate::color::ease::clamp01;
use crate::core::Rgb;

/// Below this chroma the hue is meaningless and the other endpoint's hue wins.
const ACHROMATIC_CHROMA: f32 = 0.02;

/// Color in the cylindrical OKLCH space. `h` is in degrees `[0, 360)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oklch {
    pub l: f32,
    pub c: f32,
    pub h: f32,
}

impl Oklch {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let [l, a, b] = rgb_to_oklab(rgb);
        let c = (a * a + b * b).sqrt();
        let h = if c < 1e-6 { 0.0 } else { b.atan2(a).to_degrees().rem_euclid(360.0) };
        Self { l, c, h }
    }

    /// Convert back to sRGB, clamping out-of-gamut channels.
    pub fn to_rgb(self) -> Rgb {
        let hr = self.h.to_radians();
        oklab_to_rgb([self.l, self.c * hr.cos(), self.c * hr.sin()])
    }

    /// Interpolate along the shortest hue arc.
    pub fn mix(self, other: Self, t: f32) -> Self {
        let t = clamp01(t);
        let (h0, h1) = match (self.c < ACHROMATIC_CHROMA, other.c < ACHROMATIC_CHROMA) {
            (true, false) => (other.h, other.h),
            (false, true) => (self.h, self.h),
            _ => (self.h, other.h),
        };
        let mut dh = h1 - h0;
        if dh > 180.0 {
            dh -= 360.0;
        } else if dh < -180.0 {
            dh += 360.0;
        }
        Self {
            l: self.l + (other.l - self.l) * t,
            c: self.c + (other.c - self.c) * t,
            h: (h0 + dh * t).rem_euclid(360.0),
        }
    }
}

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    let c = clamp01(c);
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    let c = c.max(0.0);
    let v = if c <= 0.003_130_8 { c * 12.92 } else { 1.055 * c.powf(1.0 / 2.4) - 0.055 };
    clamp01(v)
}

/// sRGB → OKLab `[L, a, b]`.
pub fn rgb_to_oklab(rgb: Rgb) -> [f32; 3] {
    let r = srgb_to_linear(rgb[0]);
    let g = srgb_to_linear(rgb[1]);
    let b = srgb_to_linear(rgb[2]);

    let l = 0.412_221_47 * r + 0.536_332_55 * g + 0.051_445_995 * b;
    let m = 0.211_903_5 * r + 0.680_699_5 * g + 0.107_396_96 * b;
    let s = 0.088_302_46 * r + 0.281_718_85 * g + 0.629_978_7 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    [
        0.210_454_26 * l_ + 0.793_617_8 * m_ - 0.004_072_047 * s_,
        1.977_998_5 * l_ - 2.428_592_2 * m_ + 0.450_593_7 * s_,
        0.025_904_037 * l_ + 0.782_771_77 * m_ - 0.808_675_77 * s_,
    ]
}

/// OKLab `[L, a, b]` → sRGB, clamped into gamut.
pub fn oklab_to_rgb(lab: [f32; 3]) -> Rgb {
    let [l, a, b] = lab;
    let l_ = l + 0.396_337_78 * a + 0.215_803_76 * b;
    let m_ = l - 0.105_561_346 * a - 0.063_854_17 * b;
    let s_ = l - 0.089_484_18 * a - 1.291_485_5 * b;

    let l3 = l_ * l_ * l_;
    let m3 = m_ * m_ * m_;
    let s3 = s_ * s_ * s_;

    [
        linear_to_srgb(4.076_741_7 * l3 - 3.307_711_6 * m3 + 0.230_969_94 * s3),
        linear_to_srgb(-1.268_438 * l3 + 2.609_757_4 * m3 - 0.341_319_38 * s3),
        linear_to_srgb(-0.004_196_086_3 * l3 - 0.703_418_6 * m3 + 1.707_614_7 * s3),
    ]
}

/// Perceptual blend of two sRGB colors. `t = 0` returns `a`, `t = 1` returns `b`.
pub fn mix_oklch(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = clamp01(t);
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    Oklch::from_rgb(a).mix(Oklch::from_rgb(b), t).to_rgb()
}

/// Perceptual lightness (OKLab L) of an sRGB color.
pub fn lightness(rgb: Rgb) -> f32 {
    rgb_to_oklab(rgb)[0]
}

/// Scale chroma and lightness in one conversion round trip.
pub fn scale_chroma_lightness(rgb: Rgb, chroma: f32, light: f32) -> Rgb {
    let mut lch = Oklch::from_rgb(rgb);
    lch.c *= chroma.max(0.0);
    lch.l = clamp01(lch.l * light.max(0.0));
    lch.to_rgb()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_3(a: Rgb, b: Rgb, eps: f32) -> bool {
        (a[0] - b[0]).abs() < eps && (a[1] - b[1]).abs() < eps && (a[2] - b[2]).abs() < eps
    }

    #[test]
    fn test_round_trip_preserves_color() {
        for rgb in [[0.2, 0.4, 0.8], [1.0, 0.55, 0.25], [0.0, 0.0, 0.02], [1.0, 1.0, 1.0]] {
            let back = Oklch::from_rgb(rgb).to_rgb();
            assert!(approx_eq_3(rgb, back, 2e-3), "{rgb:?} -> {back:?}");
        }
    }

    #[test]
    fn test_white_lightness_is_one() {
        assert!((lightness([1.0, 1.0, 1.0]) - 1.0).abs() < 1e-3);
        assert!(lightness([0.0, 0.0, 0.0]).abs() < 1e-3);
    }

    #[test]
    fn test_mix_endpoints() {
        let a = [0.1, 0.2, 0.6];
        let b = [1.0, 0.6, 0.2];
        assert_eq!(mix_oklch(a, b, 0.0), a);
        assert_eq!(mix_oklch(a, b, 1.0), b);
        assert_eq!(mix_oklch(a, b, -1.0), a);
    }

    #[test]
    fn test_mix_keeps_chroma_through_midpoint() {
        // Blue to orange through RGB lerp loses most of its chroma; OKLCH keeps it
        let a = [0.15, 0.35, 0.85];
        let b = [0.95, 0.55, 0.15];
        let mid = Oklch::from_rgb(mix_oklch(a, b, 0.5));
        let rgb_mid = Oklch::from_rgb([
            (a[0] + b[0]) * 0.5,
            (a[1] + b[1]) * 0.5,
            (a[2] + b[2]) * 0.5,
        ]);
        assert!(mid.c > rgb_mid.c, "oklch mid chroma {} <= rgb mid chroma {}", mid.c, rgb_mid.c);
    }

    #[test]
    fn test_mix_with_grey_keeps_hue() {
        let blue = [0.2, 0.3, 0.9];
        let grey = [0.5, 0.5, 0.5];
        let h_blue = Oklch::from_rgb(blue).h;
        let h_mid = Oklch::from_rgb(mix_oklch(blue, grey, 0.5)).h;
        assert!((h_blue - h_mid).abs() < 3.0, "hue drifted {h_blue} -> {h_mid}");
    }

    #[test]
    fn test_hue_takes_short_arc() {
        let a = Oklch { l: 0.5, c: 0.1, h: 350.0 };
        let b = Oklch { l: 0.5, c: 0.1, h: 10.0 };
        let mid = a.mix(b, 0.5);
        assert!(mid.h < 1.0 || mid.h > 359.0, "midpoint hue {}", mid.h);
    }

    #[test]
    fn test_scale_chroma_lightness_desaturates() {
        let rgb = [0.2, 0.4, 0.9];
        let grey = scale_chroma_lightness(rgb, 0.0, 1.0);
        assert!((grey[0] - grey[1]).abs() < 0.01 && (grey[1] - grey[2]).abs() < 0.01);
        let darker = scale_chroma_lightness(rgb, 1.0, 0.5);
        assert!(lightness(darker) < lightness(rgb));
    }
}

//! Fog/haze band and ground-bounce glow.

use crate::color::ease::{clamp01, smoothstep};
use crate::color::oklch::Oklch;
use crate::core::Rgb;
use crate::render::surface::{BlendMode, Surface};
use crate::render::HORIZON_FRACTION;
use crate::sky::SkyLayerColors;

/// Geometry and strength of the haze band, as fractions of the surface height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazeBand {
    pub height: f32,
    pub opacity: f32,
}

/// Band height and opacity grow with fog density and with poor visibility.
pub fn haze_band(fog_density: f32, visibility_km: f32) -> HazeBand {
    let fog = clamp01(fog_density);
    let murk = if visibility_km.is_finite() { clamp01(1.0 - visibility_km / 10.0) } else { 0.0 };
    HazeBand {
        height: 0.15 + 0.45 * fog + 0.1 * murk,
        opacity: clamp01(0.85 * fog + 0.3 * murk),
    }
}

/// Haze color: the horizon band lightened by day and darkened by night.
pub fn haze_color(horizon_band: Rgb, sun_elevation: f32) -> Rgb {
    let day = smoothstep(-6.0, 10.0, sun_elevation);
    let mut lch = Oklch::from_rgb(horizon_band);
    lch.l = clamp01(lch.l + 0.12 * day - 0.1 * (1.0 - day));
    lch.c *= 0.6;
    lch.to_rgb()
}

/// Paint the haze band centred on the horizon. Returns `false` when the band
/// is too faint to draw.
pub fn paint_haze(
    surface: &mut Surface,
    layers: &SkyLayerColors,
    sun_elevation: f32,
    fog_density: f32,
    visibility_km: f32,
) -> bool {
    let band = haze_band(fog_density, visibility_km);
    if band.opacity < 0.005 || surface.is_empty() {
        return false;
    }
    let h = surface.height() as f32;
    let horizon = h * HORIZON_FRACTION;
    let top = horizon - band.height * h * 0.6;
    let bottom = horizon + band.height * h * 0.4;
    let color = haze_color(layers.horizon_band, sun_elevation);
    surface.fill_band(top, horizon, color, 0.0, band.opacity, BlendMode::SourceOver);
    surface.fill_band(horizon, bottom, color, band.opacity, 0.6 * band.opacity, BlendMode::SourceOver);
    true
}

/// Soft glow from the horizon down, tinted with the ground-bounce layer.
pub fn paint_ground_bounce(surface: &mut Surface, layers: &SkyLayerColors, sun_elevation: f32) {
    if surface.is_empty() {
        return;
    }
    let h = surface.height() as f32;
    let horizon = h * HORIZON_FRACTION;
    let strength = 0.25 + 0.3 * smoothstep(-8.0, 15.0, sun_elevation);
    surface.fill_band(horizon, h, layers.ground_bounce, 0.0, strength, BlendMode::SourceOver);
}

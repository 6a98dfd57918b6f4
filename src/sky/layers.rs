//! Weather- and moon-aware sky layer colors.

use std::sync::LazyLock;

use crate::astronomy::{phase_illumination, Season};
use crate::color::css::CssColorCache;
use crate::color::ease::{bell, clamp01, smoothstep};
use crate::color::oklch::{lightness, mix_oklch, scale_chroma_lightness, Oklch};
use crate::core::Rgb;
use crate::sky::input::{PrecipitationKind, SkyStateInput};
use crate::sky::palette::SkyPalette;

/// Warm tint pulled into the horizon around sunrise/sunset.
const WARM_HORIZON: Rgb = [1.0, 0.52, 0.24];
/// Cool silver-blue lift for moonlit nights.
const MOONLIT_SKY: Rgb = [0.22, 0.27, 0.40];
const WINTER_TINT: Rgb = [0.62, 0.72, 0.90];
const SUMMER_TINT: Rgb = [0.95, 0.82, 0.62];

/// The four vertical gradient stops of the sky.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyLayerColors {
    pub upper_sky: Rgb,
    pub mid_sky: Rgb,
    pub horizon_band: Rgb,
    pub ground_bounce: Rgb,
}

impl SkyLayerColors {
    /// Uniform layers, mostly for tests and placeholders.
    pub fn uniform(rgb: Rgb) -> Self {
        Self {
            upper_sky: rgb,
            mid_sky: rgb,
            horizon_band: rgb,
            ground_bounce: rgb,
        }
    }

    /// Layers top to bottom.
    pub fn as_array(&self) -> [Rgb; 4] {
        [self.upper_sky, self.mid_sky, self.horizon_band, self.ground_bounce]
    }

    /// Perceptual blend of every layer toward `other`.
    pub fn mix(&self, other: &Self, t: f32) -> Self {
        Self {
            upper_sky: mix_oklch(self.upper_sky, other.upper_sky, t),
            mid_sky: mix_oklch(self.mid_sky, other.mid_sky, t),
            horizon_band: mix_oklch(self.horizon_band, other.horizon_band, t),
            ground_bounce: mix_oklch(self.ground_bounce, other.ground_bounce, t),
        }
    }

    /// Largest per-channel difference to `other`.
    pub fn max_channel_delta(&self, other: &Self) -> f32 {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .flat_map(|(a, b)| (0..3).map(move |i| (a[i] - b[i]).abs()))
            .fold(0.0, f32::max)
    }

    /// CSS `linear-gradient` equivalent of the sky, for hosts that paint a
    /// backdrop before the first frame.
    pub fn to_css_gradient(&self, cache: &mut CssColorCache) -> String {
        let stops = [
            (self.upper_sky, 0),
            (self.mid_sky, 45),
            (self.horizon_band, 72),
            (self.ground_bounce, 100),
        ];
        let parts: Vec<String> = stops
            .iter()
            .map(|(rgb, pct)| format!("{} {}%", cache.rgba(*rgb, 1.0), pct))
            .collect();
        format!("linear-gradient(to bottom, {})", parts.join(", "))
    }
}

/// Maps snapshots to sky layers using a configurable base palette.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkyColorModel {
    palette: SkyPalette,
}

static DEFAULT_MODEL: LazyLock<SkyColorModel> = LazyLock::new(SkyColorModel::default);

/// Sky layers for `input` with the default palette.
///
/// Deterministic and side-effect free: identical inputs give identical layers.
pub fn compute_sky_layers(input: &SkyStateInput) -> SkyLayerColors {
    DEFAULT_MODEL.compute(input)
}

impl SkyColorModel {
    pub fn new(palette: SkyPalette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &SkyPalette {
        &self.palette
    }

    pub fn compute(&self, input: &SkyStateInput) -> SkyLayerColors {
        let elevation = input.astronomy.elevation();
        let cover = input.weather.cover();
        let fog = input.weather.fog();
        let storm = input.weather.precipitation == PrecipitationKind::Storm;

        let mut layers = self.palette.sample(elevation);

        // Warm horizon around sunrise/sunset; clouds hide it
        let warmth = bell(elevation, 2.0, 10.0) * (1.0 - 0.8 * cover);
        layers.horizon_band = mix_oklch(layers.horizon_band, WARM_HORIZON, 0.45 * warmth);
        layers.mid_sky = mix_oklch(layers.mid_sky, WARM_HORIZON, 0.15 * warmth);

        // Moonlight
        let night = 1.0 - smoothstep(-12.0, -2.0, elevation);
        let moon_altitude = smoothstep(0.0, 30.0, input.astronomy.moon_elevation());
        let moonlight = night
            * moon_altitude
            * phase_illumination(input.astronomy.moon_phase())
            * (1.0 - 0.7 * cover);
        if moonlight > 0.0 {
            layers.upper_sky = mix_oklch(layers.upper_sky, MOONLIT_SKY, 0.25 * moonlight);
            layers.mid_sky = mix_oklch(layers.mid_sky, MOONLIT_SKY, 0.3 * moonlight);
        }

        // Season
        let tint = match input.environment.season {
            Season::Winter => Some((WINTER_TINT, 0.06)),
            Season::Summer => Some((SUMMER_TINT, 0.04)),
            Season::Spring | Season::Autumn => None,
        };
        if let Some((tint, amount)) = tint {
            let day = smoothstep(-6.0, 10.0, elevation);
            layers.upper_sky = mix_oklch(layers.upper_sky, tint, amount * day);
            layers.mid_sky = mix_oklch(layers.mid_sky, tint, amount * day);
        }

        // Cloud cover desaturates and darkens; storms darken further
        let storm_k = if storm { 1.0 } else { 0.0 };
        let chroma = (1.0 - 0.75 * cover - 0.1 * storm_k).max(0.0);
        let light = (1.0 - 0.3 * cover - 0.25 * storm_k * cover.max(0.5)).max(0.0);
        if cover > 0.0 || storm {
            layers.upper_sky = scale_chroma_lightness(layers.upper_sky, chroma, light);
            layers.mid_sky = scale_chroma_lightness(layers.mid_sky, chroma, light);
            layers.horizon_band = scale_chroma_lightness(layers.horizon_band, chroma, light);
            layers.ground_bounce =
                scale_chroma_lightness(layers.ground_bounce, chroma, 1.0 - (1.0 - light) * 0.6);
        }

        // Fog and poor visibility pull every layer toward a matching-lightness grey
        let murk = clamp01(1.0 - input.weather.visibility() / 10.0);
        let haze = clamp01(0.55 * fog + 0.2 * murk);
        if haze > 0.0 {
            let grey = Oklch {
                l: lightness(layers.horizon_band),
                c: 0.01,
                h: 250.0,
            }
            .to_rgb();
            layers.upper_sky = mix_oklch(layers.upper_sky, grey, 0.5 * haze);
            layers.mid_sky = mix_oklch(layers.mid_sky, grey, 0.8 * haze);
            layers.horizon_band = mix_oklch(layers.horizon_band, grey, haze);
            layers.ground_bounce = mix_oklch(layers.ground_bounce, grey, 0.9 * haze);
        }

        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sky::input::WeatherInfo;

    fn chroma(rgb: Rgb) -> f32 {
        Oklch::from_rgb(rgb).c
    }

    fn clear(elevation: f32) -> SkyStateInput {
        SkyStateInput::default().with_sun(elevation, 180.0)
    }

    fn finite(layers: &SkyLayerColors) -> bool {
        layers.as_array().iter().flatten().all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }

    #[test]
    fn test_deterministic() {
        let input = clear(12.0).with_weather(WeatherInfo {
            cloud_cover: 0.4,
            fog_density: 0.2,
            ..Default::default()
        });
        assert_eq!(compute_sky_layers(&input), compute_sky_layers(&input));
        assert_eq!(compute_sky_layers(&input), SkyColorModel::default().compute(&input));
    }

    #[test]
    fn test_day_brighter_than_night() {
        let day = compute_sky_layers(&clear(45.0));
        let night = compute_sky_layers(&clear(-30.0));
        assert!(lightness(day.upper_sky) > lightness(night.upper_sky) + 0.3);
    }

    #[test]
    fn test_cover_desaturates_and_darkens() {
        let sunny = compute_sky_layers(&clear(40.0));
        let overcast = compute_sky_layers(&clear(40.0).with_weather(WeatherInfo {
            cloud_cover: 1.0,
            ..Default::default()
        }));
        assert!(chroma(overcast.upper_sky) < chroma(sunny.upper_sky) * 0.5);
        assert!(lightness(overcast.upper_sky) < lightness(sunny.upper_sky));
    }

    #[test]
    fn test_storm_darker_than_overcast() {
        let overcast = WeatherInfo {
            cloud_cover: 0.9,
            ..Default::default()
        };
        let storm = WeatherInfo {
            precipitation: PrecipitationKind::Storm,
            ..overcast.clone()
        };
        let a = compute_sky_layers(&clear(30.0).with_weather(overcast));
        let b = compute_sky_layers(&clear(30.0).with_weather(storm));
        assert!(lightness(b.mid_sky) < lightness(a.mid_sky));
    }

    #[test]
    fn test_horizon_warmer_near_sunrise() {
        let sunrise = compute_sky_layers(&clear(2.0));
        let noon = compute_sky_layers(&clear(60.0));
        let warmth = |c: Rgb| c[0] - c[2];
        assert!(warmth(sunrise.horizon_band) > warmth(noon.horizon_band) + 0.3);
    }

    #[test]
    fn test_fog_pulls_toward_grey() {
        let clear_sky = compute_sky_layers(&clear(30.0));
        let foggy = compute_sky_layers(&clear(30.0).with_weather(WeatherInfo {
            fog_density: 1.0,
            visibility_km: 0.5,
            ..Default::default()
        }));
        assert!(chroma(foggy.upper_sky) < chroma(clear_sky.upper_sky));
        assert!(chroma(foggy.horizon_band) < 0.03);
    }

    #[test]
    fn test_moon_lifts_night_sky() {
        let dark = compute_sky_layers(&clear(-25.0).with_moon(-20.0, 0.5));
        let moonlit = compute_sky_layers(&clear(-25.0).with_moon(60.0, 0.5));
        assert!(lightness(moonlit.upper_sky) > lightness(dark.upper_sky));
        // New moon adds nothing
        let new_moon = compute_sky_layers(&clear(-25.0).with_moon(60.0, 0.0));
        assert!(dark.max_channel_delta(&new_moon) < 1e-6);
    }

    #[test]
    fn test_out_of_range_degrades_gracefully() {
        for elevation in [f32::NAN, f32::INFINITY, -500.0, 500.0] {
            let mut input = clear(elevation);
            input.weather.cloud_cover = f32::NAN;
            input.weather.fog_density = 9.0;
            assert!(finite(&compute_sky_layers(&input)), "elevation {elevation}");
        }
        assert_eq!(compute_sky_layers(&clear(500.0)), compute_sky_layers(&clear(90.0)));
        assert_eq!(compute_sky_layers(&clear(f32::NAN)), compute_sky_layers(&clear(0.0)));
    }

    #[test]
    fn test_mix_endpoints() {
        let a = compute_sky_layers(&clear(-20.0));
        let b = compute_sky_layers(&clear(30.0));
        assert_eq!(a.mix(&b, 0.0), a);
        assert_eq!(a.mix(&b, 1.0), b);
    }

    #[test]
    fn test_css_gradient() {
        let mut cache = CssColorCache::default();
        let css = SkyLayerColors::uniform([1.0, 1.0, 1.0]).to_css_gradient(&mut cache);
        assert!(css.starts_with("linear-gradient(to bottom, rgba(255, 255, 255, 1.000) 0%"));
        assert!(css.ends_with("100%)"));
        assert_eq!(cache.len(), 1);
    }
}

//! Procedural cloud layer on its own low-resolution surface.
//!
//! Density is an fBm field drifting with an accumulated wind offset,
//! thresholded by cloud cover. Shading is cheap and per-pixel: lit tops
//! from the current sky colors, dark undersides for thick cells, a warm rim
//! toward a low sun and a backlight from lightning glow points.

use glam::Vec2;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;

use crate::color::ease::{bell, clamp01, lerp, smoothstep};
use crate::color::oklch::{mix_oklch, scale_chroma_lightness};
use crate::core::{Error, Result, Rgb};
use crate::engine::config::CloudConfig;
use crate::lightning::LightningEffect;
use crate::render::sun::sun_screen_position;
use crate::render::surface::Surface;
use crate::sky::{PrecipitationKind, SkyLayerColors, WeatherInfo};

/// Clouds always creep a little, even on a still day (km/h).
const MIN_DRIFT_KMH: f32 = 3.0;
/// Largest wind step applied for one render, seconds.
const MAX_WIND_STEP: f64 = 1.0;
/// Rows below this share of the height start fading out.
const FADE_START: f32 = 0.55;
const FADE_END: f32 = 0.75;
/// Noise slice advance per second, so shapes evolve as well as drift.
const EVOLVE_RATE: f64 = 0.015;

const CLOUD_WHITE: Rgb = [0.96, 0.96, 0.98];
const RIM_WARM: Rgb = [1.0, 0.62, 0.38];

/// Per-render inputs borrowed from the current frame.
#[derive(Clone, Copy, Debug)]
pub struct CloudInputs<'a> {
    pub layers: &'a SkyLayerColors,
    pub weather: &'a WeatherInfo,
    pub sun_elevation: f32,
    pub sun_azimuth: f32,
    pub lightning: Option<&'a LightningEffect>,
}

/// Colors and factors shared by every pixel of one render.
struct Shading {
    lit: Rgb,
    shade: Rgb,
    rim: Rgb,
    rim_strength: f32,
    sun: Vec2,
    rim_radius: f32,
    edge0: f32,
    underside: f32,
    opacity: f32,
    glow: Vec<(Vec2, f32)>,
    glow_tint: Rgb,
}

pub struct CloudRenderer {
    surface: Surface,
    noise: Fbm<Perlin>,
    config: CloudConfig,
    wind_offset: Vec2,
    last_elapsed: Option<f64>,
    last_render: Option<f64>,
    renders: u64,
}

impl CloudRenderer {
    /// Allocate a `width × height` cloud surface. Fails for a zero size or
    /// one over `max_pixels`.
    pub fn new(width: u32, height: u32, config: &CloudConfig) -> Result<Self> {
        check_size(width, height, config)?;
        let noise = Fbm::<Perlin>::new(config.seed)
            .set_octaves(config.octaves.clamp(1, 8))
            .set_frequency(1.0)
            .set_persistence(0.5)
            .set_lacunarity(2.0);
        log::debug!("cloud renderer created at {width}x{height}");
        Ok(Self {
            surface: Surface::new(width, height),
            noise,
            config: config.clone(),
            wind_offset: Vec2::ZERO,
            last_elapsed: None,
            last_render: None,
            renders: 0,
        })
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn wind_offset(&self) -> Vec2 {
        self.wind_offset
    }

    /// Resize the cloud surface. `Ok(false)` when the size didn't change.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool> {
        check_size(width, height, &self.config)?;
        let changed = self.surface.resize(width, height);
        if changed {
            self.last_render = None;
        }
        Ok(changed)
    }

    /// Whether `update_interval` has passed since the last render.
    pub fn is_due(&self, elapsed: f64) -> bool {
        match self.last_render {
            None => true,
            Some(last) => elapsed - last >= self.config.update_interval.max(0.0) as f64 || elapsed < last,
        }
    }

    /// Re-shade the whole cloud surface for time `elapsed` (seconds).
    pub fn render(&mut self, elapsed: f64, inputs: &CloudInputs) {
        let dt = match self.last_elapsed {
            Some(last) if elapsed.is_finite() => (elapsed - last).clamp(0.0, MAX_WIND_STEP),
            _ => 0.0,
        };
        if elapsed.is_finite() {
            self.last_elapsed = Some(elapsed);
            self.last_render = Some(elapsed);
        }
        self.advance_wind(dt as f32, inputs.weather);
        self.renders += 1;

        let cover = inputs.weather.cover();
        if cover <= self.config.cover_threshold {
            self.surface.clear();
            return;
        }

        let shading = self.shading(inputs);
        let (w, h) = (self.surface.width() as usize, self.surface.height() as usize);
        let aspect = w as f32 / h as f32;
        let frequency = self.config.frequency;
        let offset = self.wind_offset;
        let z = if elapsed.is_finite() { elapsed * EVOLVE_RATE } else { 0.0 };
        let noise = &self.noise;

        self.surface
            .pixels_mut()
            .par_chunks_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let v = (y as f32 + 0.5) / h as f32;
                let fade = 1.0 - smoothstep(FADE_START, FADE_END, v);
                if fade <= 0.0 {
                    row.fill(0);
                    return;
                }
                for x in 0..w {
                    let u = (x as f32 + 0.5) / w as f32;
                    let px = &mut row[x * 4..x * 4 + 4];
                    let sample = [
                        ((u * aspect + offset.x) as f64) * frequency,
                        ((v + offset.y) as f64) * frequency,
                        z,
                    ];
                    let d = noise.get(sample) as f32 * 0.5 + 0.5;
                    let density = smoothstep(shading.edge0, shading.edge0 + 0.25, d);
                    let alpha = density * fade * shading.opacity;
                    if alpha <= 0.0 {
                        px.copy_from_slice(&[0, 0, 0, 0]);
                        continue;
                    }
                    let thickness = smoothstep(shading.edge0, shading.edge0 + 0.5, d);
                    let rgb = shade_pixel(&shading, Vec2::new(u * aspect, v), thickness);
                    px.copy_from_slice(&[to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), to_u8(alpha)]);
                }
            });
        log::trace!("clouds rendered ({w}x{h}, cover {cover:.2})");
    }

    fn advance_wind(&mut self, dt: f32, weather: &WeatherInfo) {
        if dt <= 0.0 {
            return;
        }
        let speed = weather.wind_speed().max(MIN_DRIFT_KMH);
        // Screen-space push: the horizontal share of the wind moves cells
        // sideways, the rest slides them slowly toward the horizon
        let dir = weather.wind_direction().unwrap_or(90.0).to_radians();
        let drift = Vec2::new(dir.sin(), 0.25 * dir.cos().abs());
        self.wind_offset -= drift * speed * self.config.wind_drift * dt;
    }

    fn shading(&self, inputs: &CloudInputs) -> Shading {
        let weather = inputs.weather;
        let cover = weather.cover();
        let elevation = if inputs.sun_elevation.is_finite() { inputs.sun_elevation } else { 0.0 };
        let storm = if weather.precipitation == PrecipitationKind::Storm { 1.0 } else { 0.0 };
        let wet = if weather.precipitation == PrecipitationKind::None { 0.0 } else { 1.0 };

        let day = smoothstep(-8.0, 8.0, elevation);
        let warm = bell(elevation, 2.0, 10.0) * (1.0 - 0.5 * cover);

        let lit = mix_oklch(inputs.layers.mid_sky, CLOUD_WHITE, 0.25 + 0.6 * day);
        let lit = mix_oklch(lit, RIM_WARM, 0.45 * warm);
        let lit = scale_chroma_lightness(lit, 1.0 - 0.4 * storm, 1.0 - 0.35 * storm - 0.1 * wet);
        let shade = scale_chroma_lightness(lit, 0.6, 0.62 - 0.2 * storm - 0.1 * cover);

        let aspect = self.surface.width() as f32 / self.surface.height().max(1) as f32;
        let sun_px = sun_screen_position(inputs.sun_azimuth, elevation, Vec2::new(aspect, 1.0));

        let (glow, glow_tint) = match inputs.lightning {
            Some(effect) => (
                effect
                    .glow_points
                    .iter()
                    .map(|g| (Vec2::new(g.position.x * aspect, g.position.y), g.intensity))
                    .collect(),
                effect.tint,
            ),
            None => (Vec::new(), [0.0; 3]),
        };

        Shading {
            lit,
            shade,
            rim: RIM_WARM,
            rim_strength: 0.6 * warm * smoothstep(-4.0, 0.0, elevation),
            sun: sun_px,
            rim_radius: 0.35,
            edge0: 1.0 - 1.1 * cover,
            underside: 0.6 + 0.3 * storm,
            opacity: clamp01(self.config.opacity),
            glow,
            glow_tint,
        }
    }
}

fn check_size(width: u32, height: u32, config: &CloudConfig) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::Surface(format!("cloud surface has zero size ({width}x{height})")));
    }
    let pixels = width as u64 * height as u64;
    if pixels > config.max_pixels {
        return Err(Error::Surface(format!(
            "cloud surface {width}x{height} exceeds budget of {} pixels",
            config.max_pixels
        )));
    }
    Ok(())
}

fn shade_pixel(s: &Shading, p: Vec2, thickness: f32) -> Rgb {
    let k = thickness * s.underside;
    let mut rgb = [
        lerp(s.lit[0], s.shade[0], k),
        lerp(s.lit[1], s.shade[1], k),
        lerp(s.lit[2], s.shade[2], k),
    ];

    if s.rim_strength > 0.0 {
        // Thin edges near the sun catch the light
        let near = (-p.distance(s.sun) / s.rim_radius).exp();
        let rim = s.rim_strength * near * (1.0 - thickness);
        for c in 0..3 {
            rgb[c] += s.rim[c] * rim;
        }
    }

    if !s.glow.is_empty() {
        let mut glow = 0.0;
        for (pos, intensity) in &s.glow {
            glow += intensity * (-p.distance(*pos) * 9.0).exp();
        }
        // Thick cells glow from inside
        let glow = (glow * (0.4 + 0.6 * thickness)).min(1.5);
        for c in 0..3 {
            rgb[c] += s.glow_tint[c] * glow * 0.8;
        }
    }
    rgb
}

#[inline]
fn to_u8(c: f32) -> u8 {
    (clamp01(c) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightning::GlowPoint;
    use crate::sky::compute_sky_layers;
    use crate::sky::SkyStateInput;

    fn weather(cover: f32, kind: PrecipitationKind) -> WeatherInfo {
        WeatherInfo {
            cloud_cover: cover,
            precipitation: kind,
            ..Default::default()
        }
    }

    fn mean_alpha(surface: &Surface, rows: std::ops::Range<u32>) -> f32 {
        let mut sum = 0.0;
        let mut n = 0.0;
        for y in rows {
            for x in 0..surface.width() {
                sum += surface.pixel(x, y).map_or(0, |p| p[3]) as f32 / 255.0;
                n += 1.0;
            }
        }
        sum / n
    }

    fn render(cover: f32, kind: PrecipitationKind, lightning: Option<&LightningEffect>) -> CloudRenderer {
        let input = SkyStateInput::default().with_weather(weather(cover, kind));
        let layers = compute_sky_layers(&input);
        let mut clouds = CloudRenderer::new(96, 54, &CloudConfig::default()).unwrap();
        clouds.render(
            1.0,
            &CloudInputs {
                layers: &layers,
                weather: &input.weather,
                sun_elevation: 30.0,
                sun_azimuth: 180.0,
                lightning,
            },
        );
        clouds
    }

    #[test]
    fn test_construction_failures() {
        let config = CloudConfig::default();
        assert!(matches!(CloudRenderer::new(0, 10, &config), Err(Error::Surface(_))));
        let small = CloudConfig {
            max_pixels: 100,
            ..config.clone()
        };
        assert!(matches!(CloudRenderer::new(20, 20, &small), Err(Error::Surface(_))));
        assert!(CloudRenderer::new(10, 10, &small).is_ok());
    }

    #[test]
    fn test_clear_sky_draws_nothing() {
        let clouds = render(0.0, PrecipitationKind::None, None);
        assert_eq!(clouds.surface().painted_pixels(), 0);
        assert_eq!(clouds.render_count(), 1);
    }

    #[test]
    fn test_coverage_grows_with_cover() {
        let light = render(0.3, PrecipitationKind::None, None);
        let heavy = render(0.95, PrecipitationKind::None, None);
        let a = mean_alpha(light.surface(), 0..25);
        let b = mean_alpha(heavy.surface(), 0..25);
        assert!(b > a, "{a} vs {b}");
        assert!(b > 0.5);
    }

    #[test]
    fn test_fades_out_toward_horizon() {
        let clouds = render(1.0, PrecipitationKind::None, None);
        let bottom = (54.0 * FADE_END).ceil() as u32;
        assert_eq!(mean_alpha(clouds.surface(), bottom..54), 0.0);
        assert!(mean_alpha(clouds.surface(), 0..10) > 0.5);
    }

    #[test]
    fn test_storm_darker_than_overcast() {
        let grey = render(0.9, PrecipitationKind::None, None);
        let storm = render(0.9, PrecipitationKind::Storm, None);
        let a = grey.surface().average_rgb(0, 0, 96, 20);
        let b = storm.surface().average_rgb(0, 0, 96, 20);
        assert!(b.iter().sum::<f32>() < a.iter().sum::<f32>());
    }

    #[test]
    fn test_lightning_backlight() {
        let effect = LightningEffect {
            flash_alpha: 0.3,
            intensity: 1.0,
            glow_points: vec![GlowPoint {
                position: Vec2::new(0.5, 0.2),
                intensity: 1.0,
            }],
            tint: [0.8, 0.85, 1.0],
        };
        let dark = render(0.9, PrecipitationKind::Storm, None);
        let lit = render(0.9, PrecipitationKind::Storm, Some(&effect));
        let a = dark.surface().average_rgb(36, 5, 60, 16);
        let b = lit.surface().average_rgb(36, 5, 60, 16);
        assert!(b[2] > a[2]);
    }

    #[test]
    fn test_wind_moves_clouds() {
        let input = SkyStateInput::default().with_weather(WeatherInfo {
            wind_speed_kmh: Some(30.0),
            wind_direction_deg: Some(90.0),
            ..weather(0.6, PrecipitationKind::None)
        });
        let layers = compute_sky_layers(&input);
        let mut clouds = CloudRenderer::new(64, 36, &CloudConfig::default()).unwrap();
        let inputs = CloudInputs {
            layers: &layers,
            weather: &input.weather,
            sun_elevation: 30.0,
            sun_azimuth: 180.0,
            lightning: None,
        };
        clouds.render(0.0, &inputs);
        assert_eq!(clouds.wind_offset(), Vec2::ZERO);
        assert!(!clouds.is_due(0.05));
        assert!(clouds.is_due(0.2));
        clouds.render(1.0, &inputs);
        assert!(clouds.wind_offset().x < 0.0);
    }

    #[test]
    fn test_resize_validates() {
        let mut clouds = CloudRenderer::new(32, 32, &CloudConfig::default()).unwrap();
        assert!(!clouds.resize(32, 32).unwrap());
        assert!(clouds.resize(48, 20).unwrap());
        assert_eq!(clouds.surface().width(), 48);
        assert!(clouds.resize(0, 20).is_err());
    }
}

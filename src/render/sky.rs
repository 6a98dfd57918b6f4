//! Full sky frame: gradient, sun, stars, lightning, haze, ground bounce.

use crate::engine::config::EngineConfig;
use crate::lightning::{storm_intensity, LightningEffect, LightningSystem};
use crate::render::haze::{paint_ground_bounce, paint_haze};
use crate::render::stars::{star_visibility, StarField};
use crate::render::sun::{SunPainter, SunReport};
use crate::render::surface::Surface;
use crate::render::HORIZON_FRACTION;
use crate::sky::{SkyLayerColors, SkyStateInput};

/// Where the mid-sky stop sits in the base gradient.
const MID_SKY_STOP: f32 = 0.45;

/// What one sky frame drew, for the cloud pass and diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkyFrameReport {
    pub lightning: Option<LightningEffect>,
    pub sun: SunReport,
    pub star_visibility: f32,
    pub stars_drawn: usize,
    pub haze_drawn: bool,
}

/// Owns the per-surface painters and the lightning state.
pub struct SkyRenderer {
    sun: SunPainter,
    stars: StarField,
    lightning: LightningSystem,
    device_scale: f32,
}

impl SkyRenderer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            sun: SunPainter::new(config.sun.clone()),
            stars: StarField::new(config.stars.clone()),
            lightning: LightningSystem::new(config.lightning.clone()),
            device_scale: 1.0,
        }
    }

    /// Push config changes into the painters. The star field is only
    /// regenerated when its own config changed.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        if self.sun.config() != &config.sun {
            self.sun.set_config(config.sun.clone());
        }
        if self.stars.config() != &config.stars {
            self.stars = StarField::new(config.stars.clone());
        }
        self.lightning.set_config(config.lightning.clone());
    }

    pub fn device_scale(&self) -> f32 {
        self.device_scale
    }

    pub fn set_device_scale(&mut self, scale: f32) {
        self.device_scale = if scale.is_finite() { scale.clamp(0.25, 8.0) } else { 1.0 };
    }

    pub fn lightning(&self) -> &LightningSystem {
        &self.lightning
    }

    pub fn lightning_mut(&mut self) -> &mut LightningSystem {
        &mut self.lightning
    }

    pub fn sun_painter(&self) -> &SunPainter {
        &self.sun
    }

    /// Drop bolts and cached sprites.
    pub fn clear(&mut self) {
        self.lightning.clear();
        self.sun.clear_cache();
    }

    /// Paint one frame into `surface`, replacing its contents.
    pub fn render(
        &mut self,
        surface: &mut Surface,
        layers: &SkyLayerColors,
        input: &SkyStateInput,
        time_secs: f64,
    ) -> SkyFrameReport {
        let elevation = input.astronomy.elevation();
        let weather = &input.weather;
        let (cover, fog) = (weather.cover(), weather.fog());

        surface.fill_vertical_gradient(&[
            (0.0, layers.upper_sky),
            (MID_SKY_STOP, layers.mid_sky),
            (HORIZON_FRACTION, layers.horizon_band),
            (1.0, layers.ground_bounce),
        ]);

        let sun = self.sun.paint(
            surface,
            elevation,
            input.astronomy.azimuth(),
            cover,
            fog,
            self.device_scale,
        );

        let visibility = star_visibility(elevation, cover);
        let stars_drawn = self.stars.paint(surface, visibility, time_secs, self.device_scale);

        self.lightning.update(time_secs, storm_intensity(weather));
        self.lightning.paint(surface, time_secs, self.device_scale);
        let lightning = self.lightning.effect(time_secs);

        let haze_drawn = paint_haze(surface, layers, elevation, fog, weather.visibility());
        paint_ground_bounce(surface, layers, elevation);

        SkyFrameReport {
            lightning,
            sun,
            star_visibility: visibility,
            stars_drawn,
            haze_drawn,
        }
    }
}

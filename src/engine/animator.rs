//! The frame loop: owns the surfaces and drives every renderer once per frame.

use std::sync::Arc;

use crate::color::css::CssColorCache;
use crate::engine::config::EngineConfig;
use crate::engine::feed::InputFeed;
use crate::engine::resize::{ResizeObserver, SurfaceSize};
use crate::engine::scheduler::{FrameHandle, FrameScheduler};
use crate::engine::smoothing::ColorSmoother;
use crate::engine::stats::FrameStats;
use crate::precipitation::{derive_precipitation, PrecipitationPainter, PrecipitationSystem};
use crate::render::{CloudInputs, CloudRenderer, SkyFrameReport, SkyRenderer, Surface};
use crate::sky::{SkyColorModel, SkyLayerColors, SkyStateInput};

/// Slack when comparing frame spacing against the throttle interval.
const THROTTLE_TOLERANCE: f64 = 1e-3;

/// What a frame callback did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Too soon after the previous frame; nothing drawn.
    Throttled,
    /// No input published; surfaces left clear.
    Idle,
    Disposed,
}

/// Drives the sky, precipitation and cloud renderers from a scheduler.
///
/// Single-threaded: only the animator touches colors, particles and bolts.
/// The input feed is the only thing shared with other threads.
pub struct SkyAnimator<S: FrameScheduler> {
    scheduler: S,
    config: EngineConfig,
    config_dirty: bool,
    feed: InputFeed,
    input: Option<Arc<SkyStateInput>>,
    model: SkyColorModel,
    smoother: ColorSmoother,
    resize: ResizeObserver,
    sky_surface: Surface,
    sky: SkyRenderer,
    precipitation: PrecipitationSystem,
    painter: PrecipitationPainter,
    clouds: Option<CloudRenderer>,
    stats: FrameStats,
    css_cache: CssColorCache,
    last_report: Option<SkyFrameReport>,
    pending: Option<FrameHandle>,
    running: bool,
    disposed: bool,
}

impl<S: FrameScheduler> SkyAnimator<S> {
    pub fn new(scheduler: S, config: EngineConfig, feed: InputFeed) -> Self {
        log::debug!("sky animator created");
        Self {
            model: SkyColorModel::new(config.palette.clone()),
            smoother: ColorSmoother::new(config.smoothing.time_constant),
            resize: ResizeObserver::new(config.surface.resolution_scale),
            sky_surface: Surface::new(0, 0),
            sky: SkyRenderer::new(&config),
            precipitation: PrecipitationSystem::new(0, 0, &config.precipitation),
            painter: PrecipitationPainter::new(&config.precipitation, 1.0),
            clouds: None,
            stats: FrameStats::new(),
            css_cache: CssColorCache::default(),
            last_report: None,
            pending: None,
            running: false,
            disposed: false,
            scheduler,
            config,
            config_dirty: false,
            feed,
            input: None,
        }
    }

    /// Begin requesting frames. No-op once disposed.
    pub fn start(&mut self) {
        if self.disposed || self.running {
            return;
        }
        self.running = true;
        self.pending = Some(self.scheduler.request_frame());
        log::debug!("sky animator started");
    }

    /// Report the container size. The new backing size takes effect at the
    /// start of the next frame.
    pub fn resize(&mut self, css_width: f32, css_height: f32, device_pixel_ratio: f32) {
        if self.resize.observe(css_width, css_height, device_pixel_ratio) {
            log::trace!("resize queued for {css_width}x{css_height} @{device_pixel_ratio}");
        }
    }

    /// Wait for the next scheduled frame and run it. Returns `false` when
    /// no frame is pending (not started, or disposed).
    pub fn pump(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        let Some(tick) = self.scheduler.wait_frame() else {
            return false;
        };
        if self.pending != Some(tick.handle) {
            return false;
        }
        self.pending = None;
        self.on_frame(tick.timestamp);
        true
    }

    /// Pump up to `frames` frames; returns how many fired.
    pub fn run_frames(&mut self, frames: usize) -> usize {
        (0..frames).take_while(|_| self.pump()).count()
    }

    /// Run frames until the scheduler clock reaches `until` seconds.
    pub fn run_until(&mut self, until: f64) -> usize {
        let mut fired = 0;
        while self.scheduler.now() < until && self.pump() {
            fired += 1;
        }
        fired
    }

    /// The frame callback. Always re-requests the next frame unless disposed.
    pub fn on_frame(&mut self, timestamp: f64) -> FrameOutcome {
        if self.disposed {
            return FrameOutcome::Disposed;
        }
        let outcome = self.frame(timestamp);
        if self.running && self.pending.is_none() {
            self.pending = Some(self.scheduler.request_frame());
        }
        outcome
    }

    fn frame(&mut self, timestamp: f64) -> FrameOutcome {
        if let Some(last) = self.stats.last_frame() {
            let min_interval = self.config.surface.min_frame_interval();
            if timestamp - last + THROTTLE_TOLERANCE < min_interval {
                self.stats.record_skip();
                return FrameOutcome::Throttled;
            }
        }

        if self.config_dirty {
            self.apply_config();
        }
        if let Some(size) = self.resize.take_pending() {
            self.apply_size(size);
        }
        if let Some(scale) = self.resize.take_scale_change() {
            log::debug!("device scale now {scale}");
            self.sky.set_device_scale(scale);
            self.painter.set_device_scale(scale);
        }

        if self.feed.has_changed() || self.input.is_none() {
            self.input = self.feed.latest();
        }
        let Some(input) = self.input.clone() else {
            self.go_idle();
            self.stats.record(timestamp);
            return FrameOutcome::Idle;
        };

        let dt = self.stats.record(timestamp).min(self.config.surface.max_frame_delta.max(0.0) as f64) as f32;

        self.smoother.set_target(self.model.compute(&input));
        let Some(layers) = self.smoother.step(dt) else {
            return FrameOutcome::Idle;
        };

        let report = self.sky.render(&mut self.sky_surface, &layers, &input, timestamp);

        let weather = &input.weather;
        self.precipitation.set_wind(weather.wind_speed(), weather.wind_direction());
        self.precipitation.update(dt, derive_precipitation(weather));
        self.painter.paint(&mut self.sky_surface, self.precipitation.particles());

        self.update_clouds(timestamp, &input, &layers, &report);

        log::trace!(
            "frame t={timestamp:.3} dt={dt:.3} particles={} bolts={}",
            self.precipitation.len(),
            self.sky.lightning().bolts().len()
        );
        self.last_report = Some(report);
        FrameOutcome::Rendered
    }

    fn update_clouds(&mut self, timestamp: f64, input: &SkyStateInput, layers: &SkyLayerColors, report: &SkyFrameReport) {
        let cover = input.weather.cover();
        if cover <= self.config.clouds.cover_threshold || self.sky_surface.is_empty() {
            if self.clouds.take().is_some() {
                log::debug!("cloud renderer released (cover {cover:.2})");
            }
            return;
        }

        if self.clouds.is_none() {
            let size = self.cloud_size();
            match CloudRenderer::new(size.width, size.height, &self.config.clouds) {
                Ok(renderer) => self.clouds = Some(renderer),
                Err(err) => {
                    // Retried on the next frame
                    log::warn!("cloud renderer unavailable: {err}");
                    return;
                }
            }
        }

        if let Some(clouds) = self.clouds.as_mut() {
            if clouds.is_due(timestamp) {
                clouds.render(
                    timestamp,
                    &CloudInputs {
                        layers,
                        weather: &input.weather,
                        sun_elevation: input.astronomy.elevation(),
                        sun_azimuth: input.astronomy.azimuth(),
                        lightning: report.lightning.as_ref(),
                    },
                );
            }
        }
    }

    fn cloud_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.sky_surface.width(), self.sky_surface.height()).scaled(self.config.clouds.resolution_scale)
    }

    fn apply_size(&mut self, size: SurfaceSize) {
        log::debug!("surfaces resized to {}x{}", size.width, size.height);
        self.sky_surface.resize(size.width, size.height);
        self.precipitation.resize(size.width, size.height);

        let cloud = self.cloud_size();
        let failed = match self.clouds.as_mut() {
            Some(clouds) => clouds.resize(cloud.width, cloud.height).err(),
            None => None,
        };
        if let Some(err) = failed {
            log::warn!("dropping cloud renderer: {err}");
            self.clouds = None;
        }
    }

    fn apply_config(&mut self) {
        self.config_dirty = false;
        let config = &self.config;
        self.model = SkyColorModel::new(config.palette.clone());
        self.smoother.set_time_constant(config.smoothing.time_constant);
        self.sky.apply_config(config);
        self.precipitation.set_config(&config.precipitation);
        self.painter.set_config(&config.precipitation);
        self.resize.set_resolution_scale(config.surface.resolution_scale);
        // Recreated lazily with the new settings
        self.clouds = None;
        log::info!("engine config applied");
    }

    /// Nothing to show: clear everything once.
    fn go_idle(&mut self) {
        if self.last_report.is_none() && self.precipitation.is_empty() && self.clouds.is_none() {
            return;
        }
        self.sky_surface.clear();
        self.precipitation.clear();
        self.sky.clear();
        self.smoother.reset();
        self.clouds = None;
        self.last_report = None;
        log::debug!("input withdrawn, surfaces cleared");
    }

    /// Stop for good: cancel the pending frame and release particles, bolts
    /// and the cloud renderer. No frame runs afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.precipitation.clear();
        self.sky.clear();
        self.clouds = None;
        self.running = false;
        self.disposed = true;
        log::debug!("sky animator disposed after {} frames", self.stats.frame_count());
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutable config; changes are applied at the start of the next frame.
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        self.config_dirty = true;
        &mut self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn sky_surface(&self) -> &Surface {
        &self.sky_surface
    }

    /// Cloud surface, while the cloud renderer exists.
    pub fn cloud_surface(&self) -> Option<&Surface> {
        self.clouds.as_ref().map(|c| c.surface())
    }

    pub fn cloud_renderer(&self) -> Option<&CloudRenderer> {
        self.clouds.as_ref()
    }

    pub fn sky_renderer(&self) -> &SkyRenderer {
        &self.sky
    }

    pub fn precipitation(&self) -> &PrecipitationSystem {
        &self.precipitation
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn last_report(&self) -> Option<&SkyFrameReport> {
        self.last_report.as_ref()
    }

    /// Colors drawn on the last rendered frame.
    pub fn current_layers(&self) -> Option<&SkyLayerColors> {
        self.smoother.current()
    }

    pub fn input(&self) -> Option<&SkyStateInput> {
        self.input.as_deref()
    }

    /// The current layers as a CSS `linear-gradient(...)`, for hosts that
    /// can't composite the surfaces.
    pub fn css_gradient(&mut self) -> Option<String> {
        let layers = *self.smoother.current()?;
        Some(layers.to_css_gradient(&mut self.css_cache))
    }
}

impl<S: FrameScheduler> Drop for SkyAnimator<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::feed::{input_channel, InputPublisher};
    use crate::engine::scheduler::ManualScheduler;
    use crate::precipitation::ParticleKind;
    use crate::sky::{PrecipitationKind, WeatherInfo};

    fn animator(fps: f64) -> (SkyAnimator<ManualScheduler>, InputPublisher) {
        let (publisher, feed) = input_channel();
        let mut animator = SkyAnimator::new(ManualScheduler::new(fps), EngineConfig::default(), feed);
        // 320x180 CSS at dpr 1 and the default 0.5 scale
        animator.resize(320.0, 180.0, 1.0);
        animator.start();
        (animator, publisher)
    }

    #[test]
    fn test_clear_noon() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default().with_sun(60.0, 180.0));
        assert_eq!(anim.run_frames(3), 3);

        let surface = anim.sky_surface();
        assert_eq!((surface.width(), surface.height()), (160, 90));
        assert_eq!(surface.painted_pixels(), 160 * 90);
        let report = anim.last_report().unwrap();
        assert!(report.sun.effects.all());
        assert!(report.sun.brightness > 0.9);
        assert_eq!(report.stars_drawn, 0);
        assert!(anim.cloud_surface().is_none());
        assert!(anim.precipitation().is_empty());
        assert!(anim.css_gradient().unwrap().starts_with("linear-gradient("));
    }

    #[test]
    fn test_night_stars() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(
            SkyStateInput::default()
                .with_sun(-10.0, 290.0)
                .with_weather(WeatherInfo {
                    cloud_cover: 0.1,
                    ..Default::default()
                }),
        );
        anim.run_frames(5);
        let report = anim.last_report().unwrap();
        assert_eq!(report.sun.brightness, 0.0);
        assert!(!report.sun.effects.any());
        assert!(report.star_visibility > 0.0);
        assert!(report.stars_drawn > 0);
        // Thin cover still gets a cloud layer
        assert!(anim.cloud_surface().is_some());
    }

    #[test]
    fn test_heavy_rain_with_wind() {
        let (mut anim, publisher) = animator(30.0);
        // Full-size backing surface so the spawn rate is not scaled down
        anim.resize(1280.0, 720.0, 2.0);
        publisher.publish(SkyStateInput::default().with_weather(WeatherInfo {
            cloud_cover: 0.9,
            precipitation: PrecipitationKind::Rain,
            weather_code: Some(65),
            wind_speed_kmh: Some(40.0),
            wind_direction_deg: Some(90.0),
            ..Default::default()
        }));
        let cap = anim.config().precipitation.max_particles;
        let mut peak = 0;
        while anim.scheduler().now() < 5.0 && anim.pump() {
            assert!(anim.precipitation().len() <= cap);
            peak = peak.max(anim.precipitation().len());
        }
        assert_eq!(anim.sky_surface().width(), 1280);
        assert!(peak > cap / 2, "peak {peak} of {cap}");

        let rain = anim.precipitation();
        assert!(!rain.is_empty());
        assert!(rain.particles().iter().all(|p| p.kind == ParticleKind::Rain));
        assert!(rain.average_velocity().unwrap().x > 0.0);
        let clouds = anim.cloud_renderer().unwrap();
        assert!(clouds.render_count() > 0);
        assert!(clouds.surface().painted_pixels() > 0);
    }

    #[test]
    fn test_sixty_second_storm() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default().with_weather(WeatherInfo {
            cloud_cover: 1.0,
            precipitation: PrecipitationKind::Storm,
            ..Default::default()
        }));
        let max_bolts = anim.config().lightning.max_bolts;
        let mut lit_frames = 0;
        while anim.scheduler().now() < 60.0 && anim.pump() {
            if anim.last_report().is_some_and(|r| r.lightning.is_some()) {
                lit_frames += 1;
            }
            assert!(anim.sky_renderer().lightning().bolts().len() <= max_bolts);
            assert!(anim.precipitation().len() <= 1000);
        }
        let lightning = anim.sky_renderer().lightning();
        assert!(lightning.spawned_count() >= 3, "{}", lightning.spawned_count());
        assert!(lit_frames > 0);
        assert_eq!(
            lightning.spawned_count(),
            lightning.removed_count() + lightning.bolts().len() as u64
        );
    }

    #[test]
    fn test_absent_input_renders_nothing() {
        let (mut anim, publisher) = animator(30.0);
        anim.run_frames(3);
        assert_eq!(anim.sky_surface().painted_pixels(), 0);
        assert!(anim.last_report().is_none());

        publisher.publish(SkyStateInput::default().with_weather(WeatherInfo {
            cloud_cover: 0.8,
            precipitation: PrecipitationKind::Snow,
            ..Default::default()
        }));
        anim.run_frames(30);
        assert!(anim.sky_surface().painted_pixels() > 0);
        assert!(!anim.precipitation().is_empty());

        publisher.clear();
        anim.run_frames(1);
        assert_eq!(anim.sky_surface().painted_pixels(), 0);
        assert!(anim.precipitation().is_empty());
        assert!(anim.cloud_surface().is_none());
        assert!(anim.css_gradient().is_none());
    }

    #[test]
    fn test_dispose_stops_frames() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default().with_weather(WeatherInfo {
            cloud_cover: 0.7,
            precipitation: PrecipitationKind::Rain,
            ..Default::default()
        }));
        anim.run_frames(10);
        anim.dispose();
        assert!(anim.is_disposed());
        assert!(!anim.scheduler().has_pending());
        assert!(anim.precipitation().is_empty());
        assert!(anim.cloud_surface().is_none());

        let fired = anim.scheduler().fired();
        assert!(!anim.pump());
        assert_eq!(anim.on_frame(100.0), FrameOutcome::Disposed);
        anim.start();
        assert!(!anim.pump());
        assert_eq!(anim.scheduler().fired(), fired);
    }

    #[test]
    fn test_throttle_skips_frames() {
        let (mut anim, publisher) = animator(120.0);
        publisher.publish(SkyStateInput::default());
        anim.run_until(2.0);
        let stats = anim.stats();
        // 30 fps cap out of 120 callbacks per second
        assert!(stats.skipped_frames() > stats.frame_count() * 2);
        let rendered_per_sec = stats.frame_count() as f64 / 2.0;
        assert!(rendered_per_sec <= 31.0, "{rendered_per_sec}");
    }

    #[test]
    fn test_resize_applied_next_frame() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default());
        anim.run_frames(1);
        anim.resize(640.0, 360.0, 2.0);
        assert_eq!(anim.sky_surface().width(), 160);
        anim.run_frames(1);
        assert_eq!((anim.sky_surface().width(), anim.sky_surface().height()), (640, 360));
        assert!(anim.precipitation().size().x == 640.0);
    }

    #[test]
    fn test_dpr_change_rescales_painters() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default());
        anim.resize(640.0, 360.0, 2.0);
        anim.run_frames(1);
        assert_eq!(anim.sky_surface().width(), 640);
        assert!((anim.sky_renderer().device_scale() - 1.0).abs() < 1e-6);

        // Same 640x360 backing size at half the device scale
        anim.resize(1280.0, 720.0, 1.0);
        anim.run_frames(1);
        assert_eq!(anim.sky_surface().width(), 640);
        assert!((anim.sky_renderer().device_scale() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_colors_chase_new_target() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default().with_sun(45.0, 180.0));
        anim.run_frames(2);
        let day = *anim.current_layers().unwrap();
        let night_input = SkyStateInput::default().with_sun(-20.0, 180.0);
        let night = SkyColorModel::new(EngineConfig::default().palette).compute(&night_input);
        publisher.publish(night_input);
        anim.run_frames(1);
        let mid = *anim.current_layers().unwrap();
        assert!(mid.max_channel_delta(&day) > 0.0);
        assert!(mid.max_channel_delta(&night) > 0.05);
        anim.run_until(30.0);
        assert!(anim.current_layers().unwrap().max_channel_delta(&night) < 0.01);
    }

    #[test]
    fn test_dropped_frames_clamped() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default().with_weather(WeatherInfo {
            precipitation: PrecipitationKind::Rain,
            cloud_cover: 0.5,
            ..Default::default()
        }));
        anim.run_frames(10);
        let before: Vec<(u64, f32)> = anim.precipitation().particles().iter().map(|p| (p.id, p.age)).collect();
        anim.scheduler_mut().stall(5.0);
        anim.run_frames(1);
        let step = anim.config().precipitation.max_step;
        for p in anim.precipitation().particles() {
            if let Some((_, age)) = before.iter().find(|(id, _)| *id == p.id) {
                assert!(p.age - age <= step + 1e-5);
            }
        }
    }

    #[test]
    fn test_config_change_applies() {
        let (mut anim, publisher) = animator(30.0);
        publisher.publish(SkyStateInput::default());
        anim.run_frames(1);
        anim.config_mut().surface.resolution_scale = 1.0;
        anim.run_frames(1);
        assert_eq!(anim.sky_surface().width(), 320);
    }
}

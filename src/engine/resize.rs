//! Container size tracking with change detection.

/// Backing size of a surface in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `css × device_pixel_ratio × resolution_scale`, rounded. Non-finite
    /// or negative inputs give zero.
    pub fn from_container(css_width: f32, css_height: f32, device_pixel_ratio: f32, resolution_scale: f32) -> Self {
        let factor = positive(device_pixel_ratio) * positive(resolution_scale);
        Self {
            width: (positive(css_width) * factor).round() as u32,
            height: (positive(css_height) * factor).round() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scaled copy, at least one pixel on each axis unless empty.
    pub fn scaled(&self, scale: f32) -> Self {
        if self.is_empty() {
            return *self;
        }
        let s = positive(scale);
        Self {
            width: ((self.width as f32 * s).round() as u32).max(1),
            height: ((self.height as f32 * s).round() as u32).max(1),
        }
    }
}

#[inline]
fn positive(x: f32) -> f32 {
    if x.is_finite() && x > 0.0 { x } else { 0.0 }
}

/// Remembers the container and reports a new backing size or device scale
/// only when it actually changes. The owner applies pending changes at
/// frame start.
#[derive(Clone, Debug)]
pub struct ResizeObserver {
    css: (f32, f32),
    device_pixel_ratio: f32,
    resolution_scale: f32,
    applied: SurfaceSize,
    pending: Option<SurfaceSize>,
    /// Device scale the renderers were last given.
    applied_scale: f32,
}

impl ResizeObserver {
    pub fn new(resolution_scale: f32) -> Self {
        Self {
            css: (0.0, 0.0),
            device_pixel_ratio: 1.0,
            resolution_scale: positive(resolution_scale),
            applied: SurfaceSize::default(),
            pending: None,
            applied_scale: 1.0,
        }
    }

    /// Record a container measurement. Returns `true` when it changes the
    /// backing size or the device scale.
    pub fn observe(&mut self, css_width: f32, css_height: f32, device_pixel_ratio: f32) -> bool {
        let scale_before = self.device_scale();
        self.css = (css_width, css_height);
        self.device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let resized = self.recompute();
        resized || self.scale_changed_from(scale_before)
    }

    pub fn set_resolution_scale(&mut self, resolution_scale: f32) -> bool {
        let scale_before = self.device_scale();
        self.resolution_scale = positive(resolution_scale);
        let resized = self.recompute();
        resized || self.scale_changed_from(scale_before)
    }

    fn recompute(&mut self) -> bool {
        let size = SurfaceSize::from_container(self.css.0, self.css.1, self.device_pixel_ratio, self.resolution_scale);
        let latest = self.pending.unwrap_or(self.applied);
        if size == latest {
            return false;
        }
        // Bouncing back to the applied size cancels the pending change
        self.pending = if size == self.applied { None } else { Some(size) };
        self.pending.is_some()
    }

    fn scale_changed_from(&self, before: f32) -> bool {
        let scale = self.device_scale();
        (scale - before).abs() > f32::EPSILON && (scale - self.applied_scale).abs() > f32::EPSILON
    }

    /// Take the pending size, marking it applied.
    pub fn take_pending(&mut self) -> Option<SurfaceSize> {
        let size = self.pending.take()?;
        self.applied = size;
        Some(size)
    }

    /// Take the device scale if it differs from the one last taken. A DPR
    /// change can land on the same backing size, so this is tracked apart
    /// from the size.
    pub fn take_scale_change(&mut self) -> Option<f32> {
        let scale = self.device_scale();
        if (scale - self.applied_scale).abs() <= f32::EPSILON {
            return None;
        }
        self.applied_scale = scale;
        Some(scale)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some() || (self.device_scale() - self.applied_scale).abs() > f32::EPSILON
    }

    pub fn applied(&self) -> SurfaceSize {
        self.applied
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Device pixels per CSS pixel on the backing surface.
    pub fn device_scale(&self) -> f32 {
        self.device_pixel_ratio * self.resolution_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_size() {
        assert_eq!(SurfaceSize::from_container(800.0, 600.0, 2.0, 0.5), SurfaceSize::new(800, 600));
        assert_eq!(SurfaceSize::from_container(801.0, 601.0, 1.0, 0.5), SurfaceSize::new(401, 301));
        assert!(SurfaceSize::from_container(f32::NAN, 10.0, 1.0, 1.0).is_empty());
        assert_eq!(SurfaceSize::new(3, 3).scaled(0.1), SurfaceSize::new(1, 1));
    }

    #[test]
    fn test_change_detection() {
        let mut obs = ResizeObserver::new(0.5);
        assert!(obs.observe(640.0, 360.0, 2.0));
        assert!(!obs.observe(640.0, 360.0, 2.0));
        assert_eq!(obs.take_pending(), Some(SurfaceSize::new(640, 360)));
        assert!(obs.take_pending().is_none());
        // 2.0 × 0.5 matches the renderers' initial scale
        assert!(obs.take_scale_change().is_none());
        assert!(!obs.has_pending());
    }

    #[test]
    fn test_dpr_change_with_same_backing_size() {
        let mut obs = ResizeObserver::new(0.5);
        obs.observe(640.0, 360.0, 2.0);
        obs.take_pending();
        obs.take_scale_change();
        assert!(obs.observe(1280.0, 720.0, 1.0));
        assert!(obs.take_pending().is_none());
        assert_eq!(obs.take_scale_change(), Some(0.5));
        assert!(obs.take_scale_change().is_none());
        assert!(!obs.has_pending());
    }

    #[test]
    fn test_bounce_back_cancels() {
        let mut obs = ResizeObserver::new(1.0);
        obs.observe(100.0, 100.0, 1.0);
        obs.take_pending();
        assert!(obs.observe(200.0, 100.0, 1.0));
        assert!(!obs.observe(100.0, 100.0, 1.0));
        assert!(!obs.has_pending());
        assert!(obs.set_resolution_scale(0.5));
        assert_eq!(obs.take_pending(), Some(SurfaceSize::new(50, 50)));
    }
}

//! CPU raster surface the renderers paint into.
//!
//! Pixels are stored as straight-alpha RGBA8 in an [`RgbaImage`]; all
//! blending happens in premultiplied float space one pixel at a time.
//! Unpainted pixels are fully transparent so hosts can stack surfaces.

use std::path::Path;

use glam::Vec2;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::color::ease::clamp01;
use crate::color::oklch::mix_oklch;
use crate::core::{Result, Rgb};
use crate::render::sprite::Sprite;

/// How a source color combines with what is already on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// Ordinary alpha compositing.
    SourceOver,
    /// Light adds up; overlapping glows brighten.
    Additive,
    /// Brightens without clipping as hard as `Additive`.
    Screen,
}

pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Reallocate to a new size. Returns `false` (and keeps the pixels) when
    /// the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == self.width() && height == self.height() {
            return false;
        }
        self.image = RgbaImage::new(width, height);
        true
    }

    /// Make every pixel transparent.
    pub fn clear(&mut self) {
        let raw: &mut [u8] = &mut self.image;
        raw.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA rows, for renderers that shade in parallel.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p.0[3] > 0).count()
    }

    /// Mean straight RGB of painted pixels inside a rectangle, 0..1.
    pub fn average_rgb(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Rgb {
        let (x1, y1) = (x1.min(self.width()), y1.min(self.height()));
        let mut sum = [0.0f64; 3];
        let mut n = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = self.image.get_pixel(x, y).0;
                if p[3] == 0 {
                    continue;
                }
                for i in 0..3 {
                    sum[i] += p[i] as f64 / 255.0;
                }
                n += 1;
            }
        }
        if n == 0 {
            return [0.0; 3];
        }
        [(sum[0] / n as f64) as f32, (sum[1] / n as f64) as f32, (sum[2] / n as f64) as f32]
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pixel blending
    // -----------------------------------------------------------------------

    /// Blend a premultiplied source `[r·a, g·a, b·a, a]` into one pixel.
    #[inline]
    pub fn blend_premul(&mut self, x: i32, y: i32, src: [f32; 4], mode: BlendMode) {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return;
        }
        if src[3] <= 0.0 && mode == BlendMode::SourceOver {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        *pixel = blend(*pixel, src, mode);
    }

    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, rgb: Rgb, alpha: f32, mode: BlendMode) {
        let a = clamp01(alpha);
        if a <= 0.0 {
            return;
        }
        self.blend_premul(x, y, [rgb[0] * a, rgb[1] * a, rgb[2] * a, a], mode);
    }

    // -----------------------------------------------------------------------
    // Shapes
    // -----------------------------------------------------------------------

    /// Opaque vertical gradient through `stops` (`(fraction_of_height, color)`,
    /// sorted top to bottom). Colors between stops mix in OKLCH.
    pub fn fill_vertical_gradient(&mut self, stops: &[(f32, Rgb)]) {
        let Some(first) = stops.first() else {
            return;
        };
        let h = self.height();
        for y in 0..h {
            let t = (y as f32 + 0.5) / h as f32;
            let rgb = match stops.iter().position(|s| s.0 > t) {
                Some(0) => first.1,
                Some(i) => {
                    let (a, b) = (stops[i - 1], stops[i]);
                    let span = (b.0 - a.0).max(1e-6);
                    mix_oklch(a.1, b.1, (t - a.0) / span)
                }
                None => stops[stops.len() - 1].1,
            };
            let px = Rgba([to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), 255]);
            for x in 0..self.width() {
                self.image.put_pixel(x, y, px);
            }
        }
    }

    /// Horizontal band from `y0` to `y1` whose alpha ramps linearly from
    /// `alpha_top` to `alpha_bottom`.
    pub fn fill_band(&mut self, y0: f32, y1: f32, rgb: Rgb, alpha_top: f32, alpha_bottom: f32, mode: BlendMode) {
        if y1 <= y0 {
            return;
        }
        let start = y0.floor().max(0.0) as i32;
        let end = y1.ceil().min(self.height() as f32) as i32;
        for y in start..end {
            let t = ((y as f32 + 0.5 - y0) / (y1 - y0)).clamp(0.0, 1.0);
            let a = alpha_top + (alpha_bottom - alpha_top) * t;
            for x in 0..self.width() as i32 {
                self.blend_pixel(x, y, rgb, a, mode);
            }
        }
    }

    pub fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, rgb: Rgb, alpha: f32, mode: BlendMode) {
        let (xs, xe) = (x0.floor().max(0.0) as i32, x1.ceil().min(self.width() as f32) as i32);
        let (ys, ye) = (y0.floor().max(0.0) as i32, y1.ceil().min(self.height() as f32) as i32);
        for y in ys..ye {
            for x in xs..xe {
                self.blend_pixel(x, y, rgb, alpha, mode);
            }
        }
    }

    /// Cover the whole surface.
    pub fn fill(&mut self, rgb: Rgb, alpha: f32, mode: BlendMode) {
        let (w, h) = (self.width() as f32, self.height() as f32);
        self.fill_rect(0.0, 0.0, w, h, rgb, alpha, mode);
    }

    /// Radial glow: alpha falls from `alpha` at the center to 0 at `radius`
    /// as `(1 - r)^falloff`.
    pub fn radial_glow(&mut self, center: Vec2, radius: f32, rgb: Rgb, alpha: f32, falloff: f32, mode: BlendMode) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        self.for_each_in_box(center, Vec2::splat(radius), |s, x, y, p| {
            let r = p.distance(center) / radius;
            if r < 1.0 {
                s.blend_pixel(x, y, rgb, alpha * (1.0 - r).powf(falloff), mode);
            }
        });
    }

    /// Anti-aliased filled circle.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, rgb: Rgb, alpha: f32, mode: BlendMode) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        self.for_each_in_box(center, Vec2::splat(radius + 1.0), |s, x, y, p| {
            let coverage = clamp01(radius + 0.5 - p.distance(center));
            if coverage > 0.0 {
                s.blend_pixel(x, y, rgb, alpha * coverage, mode);
            }
        });
    }

    /// Soft line segment of the given width, coverage by distance to the segment.
    pub fn draw_line(&mut self, a: Vec2, b: Vec2, width: f32, rgb: Rgb, alpha: f32, mode: BlendMode) {
        if width <= 0.0 || alpha <= 0.0 {
            return;
        }
        let half = width * 0.5;
        let center = (a + b) * 0.5;
        let extent = (a - b).abs() * 0.5 + Vec2::splat(half + 1.0);
        let ab = b - a;
        let len_sq = ab.length_squared();
        self.for_each_in_box(center, extent, |s, x, y, p| {
            let t = if len_sq > 0.0 { ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
            let d = p.distance(a + ab * t);
            let coverage = clamp01(half + 0.5 - d);
            if coverage > 0.0 {
                s.blend_pixel(x, y, rgb, alpha * coverage, mode);
            }
        });
    }

    /// Composite a premultiplied sprite centred at `center`, scaled by `alpha`.
    pub fn draw_sprite(&mut self, sprite: &Sprite, center: Vec2, alpha: f32, mode: BlendMode) {
        let alpha = clamp01(alpha);
        if alpha <= 0.0 || sprite.is_empty() {
            return;
        }
        let ox = (center.x - sprite.width() as f32 * 0.5).round() as i32;
        let oy = (center.y - sprite.height() as f32 * 0.5).round() as i32;
        for sy in 0..sprite.height() {
            let y = oy + sy as i32;
            if y < 0 || y >= self.height() as i32 {
                continue;
            }
            for sx in 0..sprite.width() {
                let p = sprite.texel(sx, sy);
                if p[3] <= 0.0 && p[0] <= 0.0 && p[1] <= 0.0 && p[2] <= 0.0 {
                    continue;
                }
                let src = [p[0] * alpha, p[1] * alpha, p[2] * alpha, p[3] * alpha];
                self.blend_premul(ox + sx as i32, y, src, mode);
            }
        }
    }

    /// Visit every pixel centre inside `center ± extent`, clipped to the surface.
    fn for_each_in_box(&mut self, center: Vec2, extent: Vec2, mut f: impl FnMut(&mut Self, i32, i32, Vec2)) {
        let x0 = (center.x - extent.x).floor().max(0.0) as i32;
        let y0 = (center.y - extent.y).floor().max(0.0) as i32;
        let x1 = (center.x + extent.x).ceil().min(self.width() as f32) as i32;
        let y1 = (center.y + extent.y).ceil().min(self.height() as f32) as i32;
        for y in y0..y1 {
            for x in x0..x1 {
                f(self, x, y, Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
            }
        }
    }
}

#[inline]
fn to_u8(c: f32) -> u8 {
    (clamp01(c) * 255.0).round() as u8
}

/// Blend a premultiplied source over a straight-alpha RGBA8 pixel.
fn blend(dst: Rgba<u8>, src: [f32; 4], mode: BlendMode) -> Rgba<u8> {
    let da = dst.0[3] as f32 / 255.0;
    let d = [
        dst.0[0] as f32 / 255.0 * da,
        dst.0[1] as f32 / 255.0 * da,
        dst.0[2] as f32 / 255.0 * da,
    ];
    let sa = clamp01(src[3]);
    let (out, oa) = match mode {
        BlendMode::SourceOver => {
            let k = 1.0 - sa;
            ([src[0] + d[0] * k, src[1] + d[1] * k, src[2] + d[2] * k], sa + da * k)
        }
        BlendMode::Additive => {
            let oa = (da + sa).min(1.0);
            ([src[0] + d[0], src[1] + d[1], src[2] + d[2]], oa)
        }
        BlendMode::Screen => {
            let s = |sc: f32, dc: f32| sc + dc - sc * dc;
            ([s(src[0], d[0]), s(src[1], d[1]), s(src[2], d[2])], sa + da - sa * da)
        }
    };
    if oa <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([
        to_u8(out[0].min(oa) / oa),
        to_u8(out[1].min(oa) / oa),
        to_u8(out[2].min(oa) / oa),
        to_u8(oa),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = Surface::new(8, 4);
        assert_eq!(surface.painted_pixels(), 0);
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(8, 0), None);
    }

    #[test]
    fn test_resize_only_on_change() {
        let mut surface = Surface::new(4, 4);
        surface.fill([1.0, 0.0, 0.0], 1.0, BlendMode::SourceOver);
        assert!(!surface.resize(4, 4));
        assert_eq!(surface.painted_pixels(), 16);
        assert!(surface.resize(6, 2));
        assert_eq!((surface.width(), surface.height()), (6, 2));
        assert_eq!(surface.painted_pixels(), 0);
    }

    #[test]
    fn test_source_over_on_transparent_keeps_color() {
        let mut surface = Surface::new(1, 1);
        surface.blend_pixel(0, 0, [1.0, 0.5, 0.0], 0.5, BlendMode::SourceOver);
        assert_eq!(surface.pixel(0, 0), Some([255, 128, 0, 128]));
    }

    #[test]
    fn test_additive_brightens() {
        let mut surface = Surface::new(1, 1);
        surface.fill([0.2, 0.2, 0.2], 1.0, BlendMode::SourceOver);
        surface.blend_pixel(0, 0, [0.5, 0.5, 0.5], 1.0, BlendMode::Additive);
        let p = surface.pixel(0, 0).unwrap();
        assert_eq!(p[3], 255);
        assert!((p[0] as i32 - 179).abs() <= 1);
        surface.blend_pixel(0, 0, [1.0, 1.0, 1.0], 1.0, BlendMode::Additive);
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_screen_never_darkens() {
        let mut surface = Surface::new(1, 1);
        surface.fill([0.6, 0.3, 0.1], 1.0, BlendMode::SourceOver);
        let before = surface.pixel(0, 0).unwrap();
        surface.blend_pixel(0, 0, [0.1, 0.1, 0.1], 0.8, BlendMode::Screen);
        let after = surface.pixel(0, 0).unwrap();
        for i in 0..3 {
            assert!(after[i] >= before[i]);
        }
    }

    #[test]
    fn test_vertical_gradient_endpoints() {
        let mut surface = Surface::new(2, 100);
        surface.fill_vertical_gradient(&[(0.0, [0.0, 0.0, 1.0]), (1.0, [1.0, 1.0, 1.0])]);
        let top = surface.pixel(0, 0).unwrap();
        let bottom = surface.pixel(0, 99).unwrap();
        assert!(top[2] > 240 && top[0] < 20);
        assert!(bottom[0] > 240);
        assert_eq!(surface.painted_pixels(), 200);
    }

    #[test]
    fn test_fill_circle_clips_to_bounds() {
        let mut surface = Surface::new(10, 10);
        surface.fill_circle(Vec2::new(0.0, 0.0), 4.0, [1.0; 3], 1.0, BlendMode::SourceOver);
        assert!(surface.painted_pixels() > 8);
        assert_eq!(surface.pixel(9, 9), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_line_covers_segment() {
        let mut surface = Surface::new(20, 20);
        surface.draw_line(Vec2::new(2.0, 10.0), Vec2::new(18.0, 10.0), 2.0, [1.0; 3], 1.0, BlendMode::SourceOver);
        assert_eq!(surface.pixel(10, 10).unwrap()[3], 255);
        assert_eq!(surface.pixel(10, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_band_alpha_ramp() {
        let mut surface = Surface::new(1, 10);
        surface.fill_band(0.0, 10.0, [1.0; 3], 0.0, 1.0, BlendMode::SourceOver);
        let top = surface.pixel(0, 0).unwrap()[3];
        let bottom = surface.pixel(0, 9).unwrap()[3];
        assert!(top < bottom);
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sky.png");
        let mut surface = Surface::new(4, 4);
        surface.fill([0.1, 0.2, 0.3], 1.0, BlendMode::SourceOver);
        surface.save_png(&path).unwrap();
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (4, 4));
    }
}

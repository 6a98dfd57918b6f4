//! Procedural sprites and their cache keys.
//!
//! Expensive glows are rendered once per quantized parameter bucket and
//! composited per frame. Sprites are always built from the *quantized*
//! key values, so a cache miss rebuilds exactly the sprite a hit would
//! have returned.

use crate::color::ease::clamp01;
use crate::core::{BoundedCache, Rgb};

/// Premultiplied float RGBA texture.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl Sprite {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    /// Build a sprite by evaluating `shade(dx, dy)` at every texel, where
    /// `dx`/`dy` are offsets from the sprite centre in pixels. `shade`
    /// returns a straight color and alpha.
    pub fn from_fn(width: u32, height: u32, mut shade: impl FnMut(f32, f32) -> (Rgb, f32)) -> Self {
        let mut sprite = Self::new(width, height);
        let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
        for y in 0..height {
            for x in 0..width {
                let (rgb, a) = shade(x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                let a = clamp01(a);
                sprite.texels[(y * width + x) as usize] =
                    [clamp01(rgb[0]) * a, clamp01(rgb[1]) * a, clamp01(rgb[2]) * a, a];
            }
        }
        sprite
    }

    /// Square radial sprite: `shade(r)` with `r` normalized to 0..1 at `radius`.
    pub fn radial(radius: f32, mut shade: impl FnMut(f32) -> (Rgb, f32)) -> Self {
        let side = (radius.max(0.5) * 2.0).ceil() as u32;
        Self::from_fn(side, side, |dx, dy| {
            let r = (dx * dx + dy * dy).sqrt() / radius.max(0.5);
            if r >= 1.0 { ([0.0; 3], 0.0) } else { shade(r) }
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[(y * self.width + x) as usize]
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

const ELEVATION_STEP: f32 = 0.5;
const COVER_STEP: f32 = 0.1;
const FOG_STEP: f32 = 0.1;
const SCALE_STEP: f32 = 0.25;
const RADIUS_STEP: f32 = 0.5;

#[inline]
fn quantize(value: f32, step: f32) -> i32 {
    if value.is_finite() { (value / step).round() as i32 } else { 0 }
}

/// Quantized sky parameters shared by the sun sprites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SkyBucket {
    elevation: i16,
    cover: u8,
    fog: u8,
    scale: u8,
}

impl SkyBucket {
    /// Elevation to 0.5°, cover and fog to 0.1, device scale to 0.25.
    pub fn new(elevation: f32, cover: f32, fog: f32, scale: f32) -> Self {
        Self {
            elevation: quantize(elevation.clamp(-90.0, 90.0), ELEVATION_STEP) as i16,
            cover: quantize(clamp01(cover), COVER_STEP) as u8,
            fog: quantize(clamp01(fog), FOG_STEP) as u8,
            scale: quantize(scale.clamp(0.25, 8.0), SCALE_STEP).max(1) as u8,
        }
    }

    pub fn elevation(&self) -> f32 {
        self.elevation as f32 * ELEVATION_STEP
    }

    pub fn cover(&self) -> f32 {
        self.cover as f32 * COVER_STEP
    }

    pub fn fog(&self) -> f32 {
        self.fog as f32 * FOG_STEP
    }

    pub fn scale(&self) -> f32 {
        self.scale as f32 * SCALE_STEP
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    SunCorona(SkyBucket),
    SunStreak(SkyBucket),
    Snowflake { radius: u8, scale: u8 },
}

impl SpriteKey {
    pub fn snowflake(radius: f32, scale: f32) -> Self {
        SpriteKey::Snowflake {
            radius: quantize(radius.clamp(0.5, 32.0), RADIUS_STEP) as u8,
            scale: quantize(scale.clamp(0.25, 8.0), SCALE_STEP).max(1) as u8,
        }
    }

    /// Snowflake radius in device pixels, or `None` for other kinds.
    pub fn snowflake_radius_px(&self) -> Option<f32> {
        match *self {
            SpriteKey::Snowflake { radius, scale } => {
                Some(radius as f32 * RADIUS_STEP * scale as f32 * SCALE_STEP)
            }
            _ => None,
        }
    }
}

pub type SpriteCache = BoundedCache<SpriteKey, Sprite>;

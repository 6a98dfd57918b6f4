//! CPU raster rendering: surfaces, sprites and the sky and cloud painters.

pub mod clouds;
pub mod haze;
pub mod sky;
pub mod sprite;
pub mod stars;
pub mod sun;
pub mod surface;

pub use clouds::{CloudInputs, CloudRenderer};
pub use sky::{SkyFrameReport, SkyRenderer};
pub use sprite::{SkyBucket, Sprite, SpriteCache, SpriteKey};
pub use stars::{star_visibility, StarField};
pub use sun::{sun_master_brightness, sun_screen_position, SunEffects, SunPainter, SunReport};
pub use surface::{BlendMode, Surface};

/// Height of the horizon line as a fraction of the surface height.
pub const HORIZON_FRACTION: f32 = 0.72;

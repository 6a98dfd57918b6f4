//! Nimbus - procedural sky and weather visualization engine
//!
//! Astronomy and weather snapshots go in; an animated sky (gradient, sun
//! optics, stars, haze, lightning), rain and snow particles and a cloud
//! layer come out as CPU raster surfaces.

pub mod astronomy;
pub mod color;
pub mod core;
pub mod engine;
pub mod lightning;
pub mod precipitation;
pub mod render;
pub mod sky;

pub use engine::{input_channel, EngineConfig, SkyAnimator};
pub use sky::{compute_sky_layers, SkyLayerColors, SkyStateInput};

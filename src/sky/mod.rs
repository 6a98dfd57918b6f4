//! Sky color model: input snapshot → four gradient layers.

pub mod input;
pub mod layers;
pub mod palette;

pub use input::{
    AstronomyInfo, EnvironmentInfo, PrecipitationKind, SkyStateInput, TimeInfo, WeatherInfo,
};
pub use layers::{compute_sky_layers, SkyColorModel, SkyLayerColors};
pub use palette::{ElevationRamp, Mix, SkyPalette};

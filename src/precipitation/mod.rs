//! Rain and snow particles: tuning table, intensity derivation, simulation
//! and painting.

pub mod intensity;
pub mod painter;
pub mod particle;
pub mod system;
pub mod table;

pub use intensity::derive_precipitation;
pub use painter::PrecipitationPainter;
pub use particle::{fade_factor, Particle};
pub use system::PrecipitationSystem;
pub use table::{profile, IntensityBucket, ParticleKind, ParticleProfile};

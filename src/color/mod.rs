//! Color utilities
//!
//! Perceptual mixing in OKLCH, easing helpers, and CSS-style color strings.
//! Colors are plain `[f32; 3]` sRGB triples (see [`crate::core::Rgb`]).

pub mod css;
pub mod ease;
pub mod oklch;

pub use css::{parse_css_color, to_hex, CssColorCache};
pub use ease::{clamp01, lerp, smoothstep};
pub use oklch::{lightness, mix_oklch, Oklch};

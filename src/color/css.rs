//! CSS-style color strings.
//!
//! Hosts that composite the engine's surfaces inside a web-like UI want the
//! current sky as a CSS gradient before the first frame lands; formatting
//! a string per stop per frame is wasteful, so formatted strings are cached
//! per quantized RGBA value.

use crate::color::ease::clamp01;
use crate::core::{BoundedCache, Rgb};

/// Cache of formatted `rgba(...)` strings keyed by 8-bit RGBA.
pub struct CssColorCache {
    cache: BoundedCache<[u8; 4], String>,
}

impl CssColorCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: BoundedCache::new(max_entries),
        }
    }

    /// Format `rgb` with `alpha` as `rgba(r, g, b, a)`.
    pub fn rgba(&mut self, rgb: Rgb, alpha: f32) -> &str {
        let key = quantize(rgb, alpha);
        self.cache
            .get_or_insert_with(key, || {
                format!(
                    "rgba({}, {}, {}, {:.3})",
                    key[0],
                    key[1],
                    key[2],
                    key[3] as f32 / 255.0
                )
            })
            .as_str()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for CssColorCache {
    fn default() -> Self {
        Self::new(64)
    }
}

fn to_u8(c: f32) -> u8 {
    (clamp01(c) * 255.0).round() as u8
}

fn quantize(rgb: Rgb, alpha: f32) -> [u8; 4] {
    [to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), to_u8(alpha)]
}

/// `#rrggbb` representation of an sRGB triple.
pub fn to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]))
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)` (alpha ignored).
pub fn parse_css_color(s: &str) -> Option<Rgb> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let inner = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut channels = inner.split(',').map(|p| p.trim().parse::<f32>());
    let r = channels.next()?.ok()?;
    let g = channels.next()?.ok()?;
    let b = channels.next()?.ok()?;
    Some([clamp01(r / 255.0), clamp01(g / 255.0), clamp01(b / 255.0)])
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits: Vec<u8> = match hex.len() {
        3 => hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| (d * 17) as u8))
            .collect::<Option<_>>()?,
        6 => (0..3)
            .map(|i| hex.get(i * 2..i * 2 + 2).and_then(|p| u8::from_str_radix(p, 16).ok()))
            .collect::<Option<_>>()?,
        _ => return None,
    };
    Some([
        digits[0] as f32 / 255.0,
        digits[1] as f32 / 255.0,
        digits[2] as f32 / 255.0,
    ])
}

/// Serde adapter storing an [`Rgb`] as a CSS color string in config files.
pub mod hex_rgb {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::core::Rgb;

    pub fn serialize<S: Serializer>(rgb: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(*rgb))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_css_color(&s).ok_or_else(|| D::Error::custom(format!("invalid color `{s}`")))
    }
}

//! Error types for the Nimbus engine

use thiserror::Error;

/// Main error type for the engine
///
/// Nothing inside the frame loop surfaces these to the host; they come
/// out of configuration loading, snapshot parsing, surface export and
/// secondary renderer construction, and the animator recovers from the
/// latter locally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

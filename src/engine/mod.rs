//! Orchestration: configuration, frame scheduling, input feed and the
//! animator that runs every renderer once per frame.

pub mod animator;
pub mod config;
pub mod feed;
pub mod resize;
pub mod scheduler;
pub mod smoothing;
pub mod stats;

pub use animator::{FrameOutcome, SkyAnimator};
pub use config::{
    CloudConfig, EngineConfig, LightningConfig, PrecipitationConfig, SmoothingConfig, StarConfig,
    SunEffectsConfig, SurfaceConfig,
};
pub use feed::{input_channel, InputFeed, InputPublisher};
pub use resize::{ResizeObserver, SurfaceSize};
pub use scheduler::{FrameHandle, FrameScheduler, FrameTick, IntervalScheduler, ManualScheduler};
pub use smoothing::ColorSmoother;
pub use stats::{FpsStats, FpsWindow, FrameStats};

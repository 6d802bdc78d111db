//! Plain data shared between the MandelGL renderer and its host shell.
//!
//! Nothing in this crate touches the GPU. It owns the bounded view transform,
//! the user-adjustable render settings, the flat key/value snapshot used to
//! persist a session, and the optional TOML configuration file.

mod config;
mod file;
mod snapshot;
mod transform;

pub use config::{
    clamp_iterations, clamp_super_sampling, Hue, RenderConfig, DEFAULT_ITERATIONS,
    DEFAULT_SUPER_SAMPLING, MAX_ITERATIONS, MAX_SUPER_SAMPLING, MIN_SUPER_SAMPLING,
};
pub use file::{PathSettings, RenderSettings, ViewerConfig, WindowSettings};
pub use snapshot::{SavedView, SnapshotValue, StateSnapshot};
pub use transform::{
    clamp_position, clamp_scale, ViewTransform, MAX_POSITION, MAX_SCALE, MIN_POSITION, MIN_SCALE,
};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("super-sampling factor {0} is outside the supported range 0.5..=3.0")]
    SuperSamplingOutOfRange(f64),
    #[error("unknown theme '{0}'; expected FIRE, ICE, ASH, or PSYCHEDELIC")]
    UnknownTheme(String),
    #[error("state key '{key}' holds a {found} where a {expected} was expected")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{
    clamp_super_sampling, Hue, DEFAULT_ITERATIONS, DEFAULT_SUPER_SAMPLING, MAX_ITERATIONS,
};
use crate::StateError;

/// Optional `mandelgl.toml` read at start-up. Every section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            title: "MandelGL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub iterations: u32,
    pub hue: Hue,
    pub super_sampling: f64,
    /// Overrides the pixel density reported by the window system.
    pub density: Option<f64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            hue: Hue::Fire,
            super_sampling: DEFAULT_SUPER_SAMPLING,
            density: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    pub assets: Option<PathBuf>,
    pub captures: Option<PathBuf>,
}

impl ViewerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, StateError> {
        let mut config: ViewerConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges and normalises values that have a documented clamp.
    pub fn validate(&mut self) -> Result<(), StateError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(StateError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }
        if self.render.iterations > MAX_ITERATIONS {
            return Err(StateError::Invalid(format!(
                "iterations {} exceeds the maximum of {MAX_ITERATIONS}",
                self.render.iterations
            )));
        }
        self.render.super_sampling = clamp_super_sampling(self.render.super_sampling)
            .ok_or(StateError::SuperSamplingOutOfRange(self.render.super_sampling))?;
        if let Some(density) = self.render.density {
            if !density.is_finite() || density <= 0.0 {
                return Err(StateError::Invalid(format!(
                    "density {density} must be a positive number"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[window]
width = 1024
height = 768

[render]
iterations = 120
hue = "ice"
super_sampling = 0.25
density = 2.0

[paths]
assets = "/opt/mandelgl/assets"
"#;

    #[test]
    fn parses_sample_config() {
        let config = ViewerConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.title, "MandelGL");
        assert_eq!(config.render.iterations, 120);
        assert_eq!(config.render.hue, Hue::Ice);
        assert_eq!(config.render.super_sampling, 0.5);
        assert_eq!(config.render.density, Some(2.0));
        assert_eq!(
            config.paths.assets.as_deref(),
            Some(std::path::Path::new("/opt/mandelgl/assets"))
        );
        assert!(config.paths.captures.is_none());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = ViewerConfig::from_toml_str("[render]\niterations = 500\n").unwrap_err();
        assert!(matches!(err, StateError::Invalid(_)));

        let err = ViewerConfig::from_toml_str("[render]\nsuper_sampling = 4.0\n").unwrap_err();
        assert!(matches!(err, StateError::SuperSamplingOutOfRange(_)));

        let err = ViewerConfig::from_toml_str("[window]\nwidth = 0\n").unwrap_err();
        assert!(matches!(err, StateError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = ViewerConfig::from_toml_str("[render]\nzoom = 3\n").unwrap_err();
        assert!(matches!(err, StateError::Parse(_)));
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::StateError;

/// Upper bound of the escape-time iteration slider.
pub const MAX_ITERATIONS: u32 = 200;
pub const DEFAULT_ITERATIONS: u32 = 50;
pub const MIN_SUPER_SAMPLING: f64 = 0.5;
pub const MAX_SUPER_SAMPLING: f64 = 3.0;
pub const DEFAULT_SUPER_SAMPLING: f64 = 2.0;

/// Colour ramp used to shade escape-time counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hue {
    #[default]
    #[serde(alias = "FIRE", alias = "firehue")]
    Fire,
    #[serde(alias = "ICE", alias = "icehue")]
    Ice,
    #[serde(alias = "ASH", alias = "ashhue")]
    Ash,
    #[serde(alias = "PSYCHEDELIC", alias = "psychue", alias = "trippy")]
    Psychedelic,
}

impl Hue {
    pub const ALL: [Hue; 4] = [Hue::Fire, Hue::Ice, Hue::Ash, Hue::Psychedelic];

    /// Name stored in persisted state (`theme` key).
    pub fn name(self) -> &'static str {
        match self {
            Hue::Fire => "FIRE",
            Hue::Ice => "ICE",
            Hue::Ash => "ASH",
            Hue::Psychedelic => "PSYCHEDELIC",
        }
    }

    /// Asset holding the raw RGBA8 ramp for this hue.
    pub fn asset_name(self) -> &'static str {
        match self {
            Hue::Fire => "firehue.rgba",
            Hue::Ice => "icehue.rgba",
            Hue::Ash => "ashhue.rgba",
            Hue::Psychedelic => "psychue.rgba",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Hue::Fire => 0,
            Hue::Ice => 1,
            Hue::Ash => 2,
            Hue::Psychedelic => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Hue> {
        Hue::ALL.get(index).copied()
    }
}

impl fmt::Display for Hue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hue {
    type Err = StateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "fire" | "firehue" => Ok(Hue::Fire),
            "ice" | "icehue" => Ok(Hue::Ice),
            "ash" | "ashhue" => Ok(Hue::Ash),
            "psychedelic" | "psychue" | "trippy" => Ok(Hue::Psychedelic),
            _ => Err(StateError::UnknownTheme(value.to_string())),
        }
    }
}

pub fn clamp_iterations(value: u32) -> u32 {
    value.min(MAX_ITERATIONS)
}

/// Applies the super-sampling rules: below the minimum is raised to it, above
/// the maximum (or NaN) is rejected.
pub fn clamp_super_sampling(value: f64) -> Option<f64> {
    if value.is_nan() || value > MAX_SUPER_SAMPLING {
        None
    } else {
        Some(value.max(MIN_SUPER_SAMPLING))
    }
}

/// User-adjustable render settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    iterations: u32,
    hue: Hue,
    super_sampling: f64,
}

impl RenderConfig {
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn hue(&self) -> Hue {
        self.hue
    }

    pub fn super_sampling(&self) -> f64 {
        self.super_sampling
    }

    pub fn set_iterations(&mut self, value: u32) {
        self.iterations = clamp_iterations(value);
    }

    pub fn set_hue(&mut self, hue: Hue) {
        self.hue = hue;
    }

    /// Updates the super-sampling factor, leaving it untouched when rejected.
    pub fn set_super_sampling(&mut self, value: f64) -> Result<f64, StateError> {
        let accepted =
            clamp_super_sampling(value).ok_or(StateError::SuperSamplingOutOfRange(value))?;
        self.super_sampling = accepted;
        Ok(accepted)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            hue: Hue::Fire,
            super_sampling: DEFAULT_SUPER_SAMPLING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_sampling_below_minimum_is_raised() {
        let mut config = RenderConfig::default();
        assert_eq!(config.set_super_sampling(0.1).unwrap(), 0.5);
        assert_eq!(config.super_sampling(), 0.5);
    }

    #[test]
    fn super_sampling_above_maximum_is_rejected() {
        let mut config = RenderConfig::default();
        config.set_super_sampling(1.25).unwrap();
        let err = config.set_super_sampling(3.5).unwrap_err();
        assert!(matches!(err, StateError::SuperSamplingOutOfRange(v) if v == 3.5));
        assert_eq!(config.super_sampling(), 1.25);
        assert!(config.set_super_sampling(f64::NAN).is_err());
        assert_eq!(config.set_super_sampling(3.0).unwrap(), 3.0);
    }

    #[test]
    fn iterations_are_capped() {
        let mut config = RenderConfig::default();
        assert_eq!(config.iterations(), DEFAULT_ITERATIONS);
        config.set_iterations(250);
        assert_eq!(config.iterations(), MAX_ITERATIONS);
        config.set_iterations(0);
        assert_eq!(config.iterations(), 0);
    }

    #[test]
    fn hue_names_round_trip() {
        for hue in Hue::ALL {
            assert_eq!(hue.name().parse::<Hue>().unwrap(), hue);
            assert_eq!(Hue::from_index(hue.index()), Some(hue));
        }
        assert_eq!("psychue".parse::<Hue>().unwrap(), Hue::Psychedelic);
        assert!(matches!(
            "plasma".parse::<Hue>(),
            Err(StateError::UnknownTheme(_))
        ));
    }

    #[test]
    fn hue_assets_are_distinct() {
        let mut names: Vec<_> = Hue::ALL.iter().map(|hue| hue.asset_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Hue::ALL.len());
    }
}

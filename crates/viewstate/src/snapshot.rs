use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{clamp_super_sampling, Hue, DEFAULT_SUPER_SAMPLING};
use crate::transform::{ViewTransform, MIN_SCALE};
use crate::StateError;

const KEY_POSITION_X: &str = "positionX";
const KEY_POSITION_Y: &str = "positionY";
const KEY_SCALE: &str = "scale";
const KEY_THEME: &str = "theme";
const KEY_SUPER_SAMPLING: &str = "superSamplingFactor";

/// A single value in a [`StateSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Number(f64),
    Text(String),
}

impl SnapshotValue {
    fn kind(&self) -> &'static str {
        match self {
            SnapshotValue::Number(_) => "number",
            SnapshotValue::Text(_) => "string",
        }
    }
}

/// Flat key/value record used to persist a viewing session.
///
/// Serialises to a single TOML table, e.g.
///
/// ```toml
/// positionX = -0.75
/// positionY = 0.1
/// scale = 4200.0
/// superSamplingFactor = 2.0
/// theme = "ICE"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    entries: BTreeMap<String, SnapshotValue>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_double(&mut self, key: &str, value: f64) {
        self.entries
            .insert(key.to_string(), SnapshotValue::Number(value));
    }

    pub fn put_text(&mut self, key: &str, value: impl Into<String>) {
        self.entries
            .insert(key.to_string(), SnapshotValue::Text(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.entries.get(key)
    }

    pub fn get_double(&self, key: &str) -> Result<Option<f64>, StateError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Number(value)) => Ok(Some(*value)),
            Some(other) => Err(StateError::WrongType {
                key: key.to_string(),
                expected: "number",
                found: other.kind(),
            }),
        }
    }

    pub fn get_text(&self, key: &str) -> Result<Option<&str>, StateError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Text(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(StateError::WrongType {
                key: key.to_string(),
                expected: "string",
                found: other.kind(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_toml_str(input: &str) -> Result<Self, StateError> {
        Ok(toml::from_str(input)?)
    }

    pub fn to_toml_string(&self) -> Result<String, StateError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// The part of a session that survives a restart: where the user was looking,
/// which palette was active, and the chosen render quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedView {
    pub transform: ViewTransform,
    pub hue: Hue,
    pub super_sampling: f64,
}

impl Default for SavedView {
    fn default() -> Self {
        Self {
            transform: ViewTransform::default(),
            hue: Hue::Fire,
            super_sampling: DEFAULT_SUPER_SAMPLING,
        }
    }
}

impl SavedView {
    pub fn snapshot(&self) -> StateSnapshot {
        let mut snapshot = StateSnapshot::new();
        snapshot.put_double(KEY_POSITION_X, self.transform.position_x());
        snapshot.put_double(KEY_POSITION_Y, self.transform.position_y());
        snapshot.put_double(KEY_SCALE, self.transform.scale());
        snapshot.put_text(KEY_THEME, self.hue.name());
        snapshot.put_double(KEY_SUPER_SAMPLING, self.super_sampling);
        snapshot
    }

    /// Rebuilds a view from a snapshot, falling back to defaults for absent keys.
    ///
    /// Values pass through the same clamps as live writes. A super-sampling
    /// factor outside the accepted range is ignored and the default is kept.
    pub fn restore(snapshot: &StateSnapshot) -> Result<Self, StateError> {
        let position_x = snapshot.get_double(KEY_POSITION_X)?.unwrap_or(0.0);
        let position_y = snapshot.get_double(KEY_POSITION_Y)?.unwrap_or(0.0);
        let scale = snapshot.get_double(KEY_SCALE)?.unwrap_or(MIN_SCALE);
        let hue = match snapshot.get_text(KEY_THEME)? {
            Some(name) => name.parse()?,
            None => Hue::Fire,
        };
        let super_sampling = snapshot
            .get_double(KEY_SUPER_SAMPLING)?
            .and_then(clamp_super_sampling)
            .unwrap_or(DEFAULT_SUPER_SAMPLING);

        Ok(Self {
            transform: ViewTransform::new(position_x, position_y, scale),
            hue,
            super_sampling,
        })
    }
}

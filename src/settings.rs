//! Puzzle tuning settings
//!
//! Every field has a default, so a partial JSON document only overrides what it names.

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{PuzzleError, Result};
use crate::sim::LayerMask;

/// Emitter timing and geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// Master switch
    pub enabled: bool,
    /// true = continuous beam, false = pulsed
    pub continuous: bool,
    pub max_distance: f32,
    pub beam_width: f32,
    pub continuous_beam_width: f32,
    pub max_deflections: u32,
    pub cycle_time: f32,
    pub active_time: f32,
    pub shrink_delay: f32,
    pub exit_epsilon: f32,
    /// Layers the beam can hit
    pub layer_mask: LayerMask,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            continuous: false,
            max_distance: MAX_DISTANCE,
            beam_width: BEAM_WIDTH,
            continuous_beam_width: CONTINUOUS_BEAM_WIDTH,
            max_deflections: MAX_DEFLECTIONS,
            cycle_time: CYCLE_TIME,
            active_time: ACTIVE_TIME,
            shrink_delay: SHRINK_DELAY,
            exit_epsilon: EXIT_EPSILON,
            layer_mask: LayerMask::ALL,
        }
    }
}

/// Deflector hit-indicator animation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeflectorSettings {
    pub pause_time: f32,
    pub fade_time: f32,
    /// Color the deflector body returns to after a hit
    pub idle_color: Vec4,
}

impl Default for DeflectorSettings {
    fn default() -> Self {
        Self {
            pause_time: FADE_PAUSE_TIME,
            fade_time: FADE_TIME,
            idle_color: Vec4::ONE,
        }
    }
}

/// Tower (positioning) controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerSettings {
    pub move_speed: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub outline_color: Vec4,
    pub outline_width: f32,
    pub select_threshold: f32,
}

impl Default for TowerSettings {
    fn default() -> Self {
        Self {
            move_speed: TOWER_MOVE_SPEED,
            min_z: TOWER_MIN_Z,
            max_z: TOWER_MAX_Z,
            outline_color: Vec4::new(1.0, 0.92, 0.016, 1.0),
            outline_width: OUTLINE_WIDTH,
            select_threshold: SELECT_THRESHOLD,
        }
    }
}

/// Receiver completion rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverSettings {
    /// Only solve when the beam passed through every deflector
    pub require_all_deflectors: bool,
    pub solve_notify_delay: f32,
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            require_all_deflectors: true,
            solve_notify_delay: SOLVE_NOTIFY_DELAY,
        }
    }
}

/// All puzzle settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleSettings {
    pub emitter: EmitterSettings,
    pub deflector: DeflectorSettings,
    pub tower: TowerSettings,
    pub receiver: ReceiverSettings,
}

impl PuzzleSettings {
    /// Parse settings from a JSON document and validate them
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded puzzle settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_path(path)
        } else {
            log::info!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Clamp soft-bounded values into range
    pub fn normalize(&mut self) {
        self.tower.outline_width = self.tower.outline_width.clamp(0.0, OUTLINE_WIDTH_MAX);
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let e = &self.emitter;
        if e.max_distance <= 0.0 {
            return Err(invalid("emitter.max_distance must be positive"));
        }
        if e.max_deflections == 0 {
            return Err(invalid("emitter.max_deflections must be at least 1"));
        }
        if e.beam_width < 0.0 || e.continuous_beam_width < 0.0 {
            return Err(invalid("beam widths must not be negative"));
        }
        if e.cycle_time <= 0.0 || e.active_time <= 0.0 {
            return Err(invalid("emitter cycle_time and active_time must be positive"));
        }
        if e.active_time > e.cycle_time {
            return Err(invalid("emitter.active_time must not exceed cycle_time"));
        }
        if e.shrink_delay < 0.0 || e.shrink_delay >= e.active_time {
            return Err(invalid("emitter.shrink_delay must lie in [0, active_time)"));
        }
        if e.exit_epsilon <= 0.0 {
            return Err(invalid("emitter.exit_epsilon must be positive"));
        }

        let d = &self.deflector;
        if d.pause_time < 0.0 || d.fade_time < 0.0 {
            return Err(invalid("deflector fade timings must not be negative"));
        }

        let t = &self.tower;
        if t.min_z > t.max_z {
            return Err(invalid("tower.min_z must not exceed max_z"));
        }
        if t.move_speed < 0.0 {
            return Err(invalid("tower.move_speed must not be negative"));
        }
        if t.select_threshold <= 0.0 || t.select_threshold >= 1.0 {
            return Err(invalid("tower.select_threshold must lie in (0, 1)"));
        }

        if self.receiver.solve_notify_delay < 0.0 {
            return Err(invalid("receiver.solve_notify_delay must not be negative"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> PuzzleError {
    PuzzleError::InvalidSettings(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = PuzzleSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.emitter.max_deflections, 10);
        assert!(settings.receiver.require_all_deflectors);
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{ "emitter": { "continuous": true, "cycle_time": 2.0 } }"#;
        let settings = PuzzleSettings::from_json(json).unwrap();
        assert!(settings.emitter.continuous);
        assert_eq!(settings.emitter.cycle_time, 2.0);
        assert_eq!(settings.emitter.active_time, ACTIVE_TIME);
        assert_eq!(settings.tower.max_z, TOWER_MAX_Z);
    }

    #[test]
    fn test_outline_width_clamped() {
        let json = r#"{ "tower": { "outline_width": 42.0 } }"#;
        let settings = PuzzleSettings::from_json(json).unwrap();
        assert_eq!(settings.tower.outline_width, OUTLINE_WIDTH_MAX);
    }

    #[test]
    fn test_rejects_shrink_after_active() {
        let json = r#"{ "emitter": { "active_time": 0.5, "shrink_delay": 0.6 } }"#;
        assert!(matches!(
            PuzzleSettings::from_json(json),
            Err(PuzzleError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_tower_bounds() {
        let mut settings = PuzzleSettings::default();
        settings.tower.min_z = 1.0;
        settings.tower.max_z = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_values() {
        let mut settings = PuzzleSettings::default();
        settings.emitter.max_deflections = 4;
        let json = settings.to_json().unwrap();
        let back = PuzzleSettings::from_json(&json).unwrap();
        assert_eq!(back.emitter.max_deflections, 4);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            PuzzleSettings::from_json("{ not json"),
            Err(PuzzleError::Json(_))
        ));
    }
}

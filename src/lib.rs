//! Laser Puzzle - beam deflection puzzle simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (scene, deflectors, receiver, emitter, tower)
//! - `renderer`: Beam segment sink producing GPU instance data
//! - `settings`: Data-driven tuning loaded from JSON
//! - `error`: Configuration errors raised while building a puzzle

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{PuzzleError, Result};
pub use settings::PuzzleSettings;

/// Puzzle tuning defaults
pub mod consts {
    /// Fixed simulation timestep used by the demo driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Maximum distance a single beam leg can travel
    pub const MAX_DISTANCE: f32 = 100.0;
    /// Full beam width
    pub const BEAM_WIDTH: f32 = 0.1;
    /// Beam width once continuous emission has settled
    pub const CONTINUOUS_BEAM_WIDTH: f32 = 0.03;
    /// Upper bound on redirections per trace
    pub const MAX_DEFLECTIONS: u32 = 10;
    /// Nudge applied past a deflector's exit point so the next cast starts outside it
    pub const EXIT_EPSILON: f32 = 0.01;

    /// Pulsed emission: seconds between activations
    pub const CYCLE_TIME: f32 = 3.5;
    /// Pulsed emission: seconds the beam stays lit
    pub const ACTIVE_TIME: f32 = 0.5;
    /// Pulsed emission: seconds into the active window before the beam shrinks
    pub const SHRINK_DELAY: f32 = 0.1;

    /// Default deflection angle (degrees)
    pub const DEFLECTION_ANGLE: f32 = -45.0;
    /// Deflector hit color hold time
    pub const FADE_PAUSE_TIME: f32 = 0.2;
    /// Deflector hit color fade duration
    pub const FADE_TIME: f32 = 1.2;

    /// Tower movement speed (units/s)
    pub const TOWER_MOVE_SPEED: f32 = 1.0;
    pub const TOWER_MIN_Z: f32 = -0.5;
    pub const TOWER_MAX_Z: f32 = 0.5;
    pub const OUTLINE_WIDTH: f32 = 5.0;
    pub const OUTLINE_WIDTH_MAX: f32 = 10.0;
    /// Select axis magnitude that counts as "pressed"
    pub const SELECT_THRESHOLD: f32 = 0.5;

    /// Delay between the solve latch and the solved notification
    pub const SOLVE_NOTIFY_DELAY: f32 = 1.0;

    /// Alpha applied to beam material colors
    pub const BEAM_ALPHA: f32 = 0.8;
}

/// Linear interpolation between `a` and `b`, `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Hermite smooth step from 0 to 1
#[inline]
pub fn smooth_step(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Clamp a deflection angle to [-180, 180] degrees
#[inline]
pub fn clamp_deflection_angle(degrees: f32) -> f32 {
    degrees.clamp(-180.0, 180.0)
}

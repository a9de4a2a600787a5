//! Puzzle state and events
//!
//! `LaserPuzzle` bundles the scene with the two components that act on it.
//! Nothing here is persisted: a puzzle always starts unsolved.

use super::deflector::DeflectorId;
use super::emitter::Emitter;
use super::scene::Scene;
use super::tower::TowerController;
use crate::settings::PuzzleSettings;

/// Notifications for the host (audio, player state, completion flow)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleEvent {
    /// A pulse lit up (cue for the laser sound)
    PulseStarted,
    /// The beam reached a deflector it did not touch on the previous trace
    DeflectorHit(DeflectorId),
    /// The receiver accepted the beam
    ReceiverActivated { all_hit: bool },
    /// Solved notification, raised once after the post-solve delay
    PuzzleSolved,
}

/// A complete, runnable laser puzzle
#[derive(Debug)]
pub struct LaserPuzzle {
    pub settings: PuzzleSettings,
    pub scene: Scene,
    pub emitter: Emitter,
    pub tower: TowerController,
    /// Pending events (drained by the host)
    pub events: Vec<PuzzleEvent>,
    /// Simulated seconds since build
    pub time: f32,
    /// Tick counter
    pub time_ticks: u64,
}

impl LaserPuzzle {
    pub fn new(settings: PuzzleSettings, scene: Scene, emitter: Emitter, tower: TowerController) -> Self {
        Self {
            settings,
            scene,
            emitter,
            tower,
            events: Vec::new(),
            time: 0.0,
            time_ticks: 0,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.scene.receiver.is_puzzle_solved()
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clear the receiver latch. Deflector fades and the emitter mode are left alone.
    pub fn reset_receiver(&mut self) {
        self.scene.receiver.reset();
    }
}

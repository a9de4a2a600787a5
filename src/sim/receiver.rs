//! Receiver - the beam's intended terminus
//!
//! Validates puzzle completion: the beam must arrive having passed through
//! every deflector in the scene (unless the receiver is in relaxed mode).
//! Solving latches permanently until `reset`.

use glam::Vec3;

use super::deflector::DeflectorId;
use super::geometry::{Collider, LayerMask, Pose};
use crate::settings::ReceiverSettings;

/// Visual state shown by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverVisual {
    /// Waiting for the beam
    Idle,
    /// Beam arrived (relaxed mode or partial solve)
    Activated,
    /// Puzzle solved
    Solved,
}

/// Result of a beam arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Already solved, nothing changed
    Ignored,
    /// Arrived without touching every deflector
    Rejected,
    /// Relaxed mode accepted the arrival without solving
    Activated,
    /// Every deflector was hit - latched solved
    Solved,
}

#[derive(Debug, Clone)]
pub struct Receiver {
    pub pose: Pose,
    pub collider: Collider,
    pub layers: LayerMask,
    require_all_deflectors: bool,
    solve_notify_delay: f32,
    solved: bool,
    visual: ReceiverVisual,
    /// Seconds left before the solved notification goes out
    notify_in: Option<f32>,
}

impl Receiver {
    pub fn new(pose: Pose, collider: Collider, settings: &ReceiverSettings) -> Self {
        Self {
            pose,
            collider,
            layers: LayerMask::DEFAULT,
            require_all_deflectors: settings.require_all_deflectors,
            solve_notify_delay: settings.solve_notify_delay,
            solved: false,
            visual: ReceiverVisual::Idle,
            notify_in: None,
        }
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn is_puzzle_solved(&self) -> bool {
        self.solved
    }

    pub fn visual(&self) -> ReceiverVisual {
        self.visual
    }

    pub fn requires_all_deflectors(&self) -> bool {
        self.require_all_deflectors
    }

    pub fn set_require_all_deflectors(&mut self, require: bool) {
        self.require_all_deflectors = require;
    }

    /// Handle the beam arriving after passing through `hit_deflectors`.
    ///
    /// A no-op once solved.
    pub fn receive_laser(&mut self, hit_deflectors: &[DeflectorId], total_deflectors: usize) -> ReceiveOutcome {
        if self.solved {
            return ReceiveOutcome::Ignored;
        }

        let all_hit = hit_deflectors.len() == total_deflectors;
        if self.require_all_deflectors && !all_hit {
            return ReceiveOutcome::Rejected;
        }

        if !all_hit {
            self.visual = ReceiverVisual::Activated;
            return ReceiveOutcome::Activated;
        }

        self.solved = true;
        self.visual = ReceiverVisual::Solved;
        self.notify_in = Some(self.solve_notify_delay);
        log::info!(
            "Receiver solved: {}/{} deflectors hit",
            hit_deflectors.len(),
            total_deflectors
        );
        ReceiveOutcome::Solved
    }

    /// Advance the post-solve delay. Returns true on the tick the solved
    /// notification is due.
    pub fn update(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.notify_in else {
            return false;
        };
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            self.notify_in = None;
            true
        } else {
            self.notify_in = Some(remaining);
            false
        }
    }

    /// Whether the solved notification is still pending
    pub fn notification_pending(&self) -> bool {
        self.notify_in.is_some()
    }

    /// Clear the latch and restore idle visuals. Deflector fades are untouched.
    pub fn reset(&mut self) {
        self.solved = false;
        self.visual = ReceiverVisual::Idle;
        self.notify_in = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver(require_all: bool) -> Receiver {
        let settings = ReceiverSettings {
            require_all_deflectors: require_all,
            ..Default::default()
        };
        Receiver::new(Pose::default(), Collider::sphere(0.5), &settings)
    }

    fn ids(n: u32) -> Vec<DeflectorId> {
        (0..n).map(DeflectorId).collect()
    }

    #[test]
    fn test_all_hit_solves() {
        let mut r = receiver(true);
        assert_eq!(r.receive_laser(&ids(3), 3), ReceiveOutcome::Solved);
        assert!(r.is_puzzle_solved());
        assert_eq!(r.visual(), ReceiverVisual::Solved);
    }

    #[test]
    fn test_partial_hit_rejected() {
        let mut r = receiver(true);
        assert_eq!(r.receive_laser(&ids(2), 3), ReceiveOutcome::Rejected);
        assert!(!r.is_puzzle_solved());
        assert_eq!(r.visual(), ReceiverVisual::Idle);
        assert!(!r.notification_pending());
    }

    #[test]
    fn test_relaxed_activates_without_latch() {
        let mut r = receiver(false);
        assert_eq!(r.receive_laser(&ids(1), 3), ReceiveOutcome::Activated);
        assert!(!r.is_puzzle_solved());
        assert_eq!(r.visual(), ReceiverVisual::Activated);

        // Still solvable afterwards
        assert_eq!(r.receive_laser(&ids(3), 3), ReceiveOutcome::Solved);
    }

    #[test]
    fn test_idempotent_once_solved() {
        let mut r = receiver(true);
        assert_eq!(r.receive_laser(&ids(3), 3), ReceiveOutcome::Solved);
        assert_eq!(r.receive_laser(&ids(3), 3), ReceiveOutcome::Ignored);

        // Notification fires exactly once
        let mut fired = 0;
        for _ in 0..200 {
            if r.update(1.0 / 60.0) {
                fired += 1;
            }
            r.receive_laser(&ids(3), 3);
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_notify_waits_for_delay() {
        let mut r = receiver(true);
        r.receive_laser(&ids(1), 1);
        assert!(!r.update(0.5));
        assert!(r.notification_pending());
        assert!(r.update(0.5));
        assert!(!r.update(0.5));
    }

    #[test]
    fn test_reset_clears_latch() {
        let mut r = receiver(true);
        r.receive_laser(&ids(2), 2);
        r.reset();
        assert!(!r.is_puzzle_solved());
        assert_eq!(r.visual(), ReceiverVisual::Idle);
        assert!(!r.notification_pending());
        assert_eq!(r.receive_laser(&ids(2), 2), ReceiveOutcome::Solved);
    }
}

//! Laser emitter - beam tracing and emission timing
//!
//! Every rebuild re-traces the whole beam from scratch: cast, classify the
//! hit (deflector, receiver, anything else), redirect or stop. The trace is
//! bounded by `max_deflections`, so facing deflectors cannot loop forever.
//!
//! Emission runs in one of two regimes:
//! - continuous: always lit, re-traced every tick, thinner after the first tick
//! - pulsed: lit for `active_time` every `cycle_time`, shrinking to zero width
//!   from `shrink_delay` until the end of the active window

use glam::Vec3;

use super::deflector::DeflectorId;
use super::geometry::Pose;
use super::material::{LaserMaterial, MaterialId};
use super::receiver::{ReceiveOutcome, ReceiverVisual};
use super::scene::{HitTarget, Scene};
use super::state::PuzzleEvent;
use crate::lerp;
use crate::settings::EmitterSettings;

/// Handle to a visual segment owned by a `SegmentSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentHandle {
    pub index: u32,
    pub generation: u32,
}

/// Receives the straight beam segments the emitter wants drawn.
///
/// The emitter creates every segment it destroys and destroys every segment
/// it creates; a sink never has to clean up after it.
pub trait SegmentSink {
    fn create_segment(&mut self, start: Vec3, end: Vec3, material: &LaserMaterial, width: f32) -> SegmentHandle;
    fn destroy_segment(&mut self, handle: SegmentHandle);
}

/// Emission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionState {
    /// Beam off
    Idle,
    /// Always-on beam
    ActiveContinuous,
    /// Pulse lit at full width
    ActivePulsed,
    /// Pulse lit and narrowing toward zero
    Shrinking,
}

/// How the last trace ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No trace yet (or beam torn down)
    None,
    /// Ray left the scene
    Miss,
    /// Stopped by geometry that is neither deflector nor receiver
    Obstacle,
    /// Reached the receiver
    Receiver(ReceiveOutcome),
    /// Ran out of deflections
    DeflectionLimit,
}

#[derive(Debug)]
pub struct Emitter {
    pub pose: Pose,
    settings: EmitterSettings,
    default_material: MaterialId,
    total_deflectors: usize,

    // Mode
    enabled: bool,
    continuous: bool,
    active: bool,
    /// Continuous beam has been shown at full width for its first tick
    continuous_settled: bool,

    // Pulse timers
    cycle_timer: f32,
    active_timer: f32,

    // Last trace
    path: Vec<Vec3>,
    /// Material of segment i (path[i] -> path[i + 1])
    segment_materials: Vec<MaterialId>,
    hit_deflectors: Vec<DeflectorId>,
    segments: Vec<SegmentHandle>,
    termination: Termination,
    /// Hit set from the previous lit trace, for new-hit events
    previous_hits: Vec<DeflectorId>,
}

impl Emitter {
    pub fn new(pose: Pose, settings: EmitterSettings, default_material: MaterialId, total_deflectors: usize) -> Self {
        Self {
            pose,
            enabled: settings.enabled,
            continuous: settings.continuous,
            settings,
            default_material,
            total_deflectors,
            active: false,
            continuous_settled: false,
            cycle_timer: 0.0,
            active_timer: 0.0,
            path: Vec::new(),
            segment_materials: Vec::new(),
            hit_deflectors: Vec::new(),
            segments: Vec::new(),
            termination: Termination::None,
            previous_hits: Vec::new(),
        }
    }

    /// Advance emission timing by `dt` and rebuild the beam when lit
    pub fn update<S: SegmentSink>(&mut self, scene: &mut Scene, sink: &mut S, dt: f32, events: &mut Vec<PuzzleEvent>) {
        if !self.enabled {
            if self.active {
                self.teardown(sink);
                self.previous_hits.clear();
                self.active = false;
            }
            return;
        }

        if self.continuous {
            if self.active {
                self.continuous_settled = true;
            } else {
                self.active = true;
                self.continuous_settled = false;
            }
            self.rebuild(scene, sink, events);
            return;
        }

        self.cycle_timer += dt;
        if self.active {
            self.active_timer += dt;
            if self.active_timer >= self.settings.active_time {
                self.teardown(sink);
                self.previous_hits.clear();
                self.active = false;
                self.active_timer = 0.0;
            } else {
                self.rebuild(scene, sink, events);
            }
        } else if self.cycle_timer >= self.settings.cycle_time {
            self.cycle_timer = 0.0;
            self.active_timer = 0.0;
            self.active = true;
            log::debug!("Laser pulse started");
            events.push(PuzzleEvent::PulseStarted);
            self.rebuild(scene, sink, events);
        }
    }

    /// Light the beam now, restarting the pulse timers. No-op when disabled.
    pub fn activate<S: SegmentSink>(&mut self, scene: &mut Scene, sink: &mut S, events: &mut Vec<PuzzleEvent>) {
        if !self.enabled {
            return;
        }
        self.active = true;
        self.cycle_timer = 0.0;
        self.active_timer = 0.0;
        self.rebuild(scene, sink, events);
    }

    /// Tear the visible beam down without touching the emission mode.
    ///
    /// A lit emitter re-traces on its next update.
    pub fn force_deactivate<S: SegmentSink>(&mut self, sink: &mut S) {
        self.teardown(sink);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch to the always-on regime (used once the puzzle is solved)
    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> EmissionState {
        if !self.active {
            EmissionState::Idle
        } else if self.continuous {
            EmissionState::ActiveContinuous
        } else if self.active_timer > self.settings.shrink_delay {
            EmissionState::Shrinking
        } else {
            EmissionState::ActivePulsed
        }
    }

    /// Width the beam renders at right now
    pub fn current_width(&self) -> f32 {
        let s = &self.settings;
        if self.continuous {
            return if self.continuous_settled {
                s.continuous_beam_width
            } else {
                s.beam_width
            };
        }
        if self.active_timer <= s.shrink_delay {
            return s.beam_width;
        }
        let window = s.active_time - s.shrink_delay;
        if window <= 0.0 {
            return 0.0;
        }
        let progress = (self.active_timer - s.shrink_delay) / window;
        lerp(s.beam_width, 0.0, progress)
    }

    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    pub fn segment_materials(&self) -> &[MaterialId] {
        &self.segment_materials
    }

    pub fn hit_deflectors(&self) -> &[DeflectorId] {
        &self.hit_deflectors
    }

    pub fn segments(&self) -> &[SegmentHandle] {
        &self.segments
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn total_deflectors(&self) -> usize {
        self.total_deflectors
    }

    pub fn default_material(&self) -> MaterialId {
        self.default_material
    }

    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    /// Destroy every segment and forget the last trace
    fn teardown<S: SegmentSink>(&mut self, sink: &mut S) {
        for handle in self.segments.drain(..) {
            sink.destroy_segment(handle);
        }
        self.path.clear();
        self.segment_materials.clear();
        self.hit_deflectors.clear();
        self.termination = Termination::None;
    }

    fn rebuild<S: SegmentSink>(&mut self, scene: &mut Scene, sink: &mut S, events: &mut Vec<PuzzleEvent>) {
        self.teardown(sink);
        if !self.active {
            return;
        }
        self.trace(scene, events);
        self.build_segments(scene, sink);
    }

    /// Append a path point; `material` styles the segment ending at it
    fn push_point(&mut self, point: Vec3, material: MaterialId) {
        self.path.push(point);
        self.segment_materials.push(material);
    }

    fn trace(&mut self, scene: &mut Scene, events: &mut Vec<PuzzleEvent>) {
        let max_distance = self.settings.max_distance;
        let mask = self.settings.layer_mask;

        let mut position = self.pose.position;
        let mut direction = self.pose.forward();
        let mut material = self.default_material;
        let mut deflections = 0;

        self.path.push(position);

        self.termination = loop {
            if deflections >= self.settings.max_deflections {
                log::debug!("Beam truncated after {} deflections", deflections);
                break Termination::DeflectionLimit;
            }

            let Some(hit) = scene.cast_ray(position, direction, max_distance, mask) else {
                self.push_point(position + direction * max_distance, material);
                break Termination::Miss;
            };
            self.push_point(hit.point, material);

            match hit.target {
                HitTarget::Deflector(id) => {
                    let Some(deflector) = scene.deflector_mut(id) else {
                        break Termination::Obstacle;
                    };
                    let center = deflector.pose.position;
                    let exit_dir = deflector.exit_direction();
                    let fallback_radius = deflector.collider.bounding_radius();
                    deflector.notify_hit();

                    // The beam passes through the deflector body
                    self.push_point(center, material);
                    if !self.hit_deflectors.contains(&id) {
                        self.hit_deflectors.push(id);
                        if !self.previous_hits.contains(&id) {
                            events.push(PuzzleEvent::DeflectorHit(id));
                        }
                    }
                    if let Some(exit_material) = deflector.exit_material() {
                        material = exit_material;
                    }

                    let exit_point = scene
                        .cast_ray_against_collider(hit.target, center, exit_dir, max_distance)
                        .unwrap_or(center + exit_dir * fallback_radius);
                    self.push_point(exit_point, material);

                    position = exit_point + exit_dir * self.settings.exit_epsilon;
                    direction = exit_dir;
                    deflections += 1;
                }
                HitTarget::Receiver => {
                    let before = scene.receiver.visual();
                    let outcome = scene
                        .receiver
                        .receive_laser(&self.hit_deflectors, self.total_deflectors);
                    self.on_receive(outcome, before, events);
                    break Termination::Receiver(outcome);
                }
                HitTarget::Obstacle(_) => break Termination::Obstacle,
            }
        };

        self.previous_hits.clone_from(&self.hit_deflectors);
    }

    fn on_receive(&mut self, outcome: ReceiveOutcome, before: ReceiverVisual, events: &mut Vec<PuzzleEvent>) {
        match outcome {
            ReceiveOutcome::Solved => {
                // Keep the solved beam lit
                self.continuous = true;
                events.push(PuzzleEvent::ReceiverActivated { all_hit: true });
            }
            ReceiveOutcome::Activated if before == ReceiverVisual::Idle => {
                log::info!("Receiver activated without every deflector");
                events.push(PuzzleEvent::ReceiverActivated { all_hit: false });
            }
            _ => {}
        }
    }

    fn build_segments<S: SegmentSink>(&mut self, scene: &Scene, sink: &mut S) {
        let width = self.current_width();
        for (i, pair) in self.path.windows(2).enumerate() {
            let id = self.segment_materials[i];
            let Some(material) = scene.materials.get(id) else {
                log::error!("Segment {} references missing material {:?}", i, id);
                continue;
            };
            let handle = sink.create_segment(pair[0], pair[1], material, width);
            self.segments.push(handle);
        }
    }
}

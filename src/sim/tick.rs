//! Per-frame simulation tick
//!
//! Order within a tick:
//! 1. Tower controller applies selection/movement input
//! 2. Emitter advances its timers and re-traces the beam if lit
//! 3. Deflector hit-indicator fades advance
//! 4. Receiver post-solve delay advances

use glam::Vec2;

use super::emitter::SegmentSink;
use super::state::{LaserPuzzle, PuzzleEvent};

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Held select axis (-1 = previous tower, +1 = next), edge-triggered by the controller
    pub select: f32,
    /// Held move axis (-1..1) for the selected tower
    pub move_axis: f32,
}

impl TickInput {
    /// Build input from 2D sticks: select from X, move from Y
    pub fn from_sticks(select: Vec2, movement: Vec2) -> Self {
        Self {
            select: select.x,
            move_axis: Self::move_from_stick(movement),
        }
    }

    /// Move axis from a 2D stick (vertical component)
    pub fn move_from_stick(stick: Vec2) -> f32 {
        stick.y.clamp(-1.0, 1.0)
    }
}

/// Advance the puzzle by `dt` seconds
pub fn tick<S: SegmentSink>(puzzle: &mut LaserPuzzle, input: &TickInput, dt: f32, sink: &mut S) {
    puzzle.time_ticks += 1;
    puzzle.time += dt;

    puzzle
        .tower
        .update(input.select, input.move_axis, dt, &mut puzzle.scene);

    puzzle
        .emitter
        .update(&mut puzzle.scene, sink, dt, &mut puzzle.events);

    let continuous = puzzle.emitter.is_continuous();
    puzzle.scene.update_fades(dt, continuous);

    if puzzle.scene.receiver.update(dt) {
        log::info!("Puzzle solved after {:.2}s", puzzle.time);
        puzzle.events.push(PuzzleEvent::PuzzleSolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::renderer::BeamRenderer;
    use crate::settings::PuzzleSettings;
    use crate::sim::deflector::FadeState;
    use crate::sim::emitter::EmissionState;
    use crate::sim::scene::SceneDesc;
    use crate::sim::tower::Highlightable;

    fn demo(settings: &PuzzleSettings) -> LaserPuzzle {
        SceneDesc::demo().build(settings).unwrap()
    }

    fn count_solved(events: &[PuzzleEvent]) -> usize {
        events
            .iter()
            .filter(|e| **e == PuzzleEvent::PuzzleSolved)
            .count()
    }

    /// Drive the tower controller to the known solution
    fn play_solution(puzzle: &mut LaserPuzzle, sink: &mut BeamRenderer) {
        let hold = |puzzle: &mut LaserPuzzle, sink: &mut BeamRenderer, input: TickInput, secs: f32| {
            let ticks = (secs / SIM_DT).round() as u32;
            for _ in 0..ticks {
                tick(puzzle, &input, SIM_DT, sink);
            }
        };
        let up = TickInput { select: 0.0, move_axis: 1.0 };
        let next = TickInput { select: 1.0, move_axis: 0.0 };
        let idle = TickInput::default();

        // Tower A: -0.5 -> 0.0
        hold(puzzle, sink, up, 0.5);
        // Tower B: -0.5 -> 0.5 (clamped)
        hold(puzzle, sink, next, SIM_DT);
        hold(puzzle, sink, idle, SIM_DT);
        hold(puzzle, sink, up, 1.1);
        // Tower C: -0.5 -> 0.5 (clamped)
        hold(puzzle, sink, next, SIM_DT);
        hold(puzzle, sink, idle, SIM_DT);
        hold(puzzle, sink, up, 1.1);
    }

    #[test]
    fn test_scripted_solution_in_pulsed_mode() {
        let mut puzzle = demo(&PuzzleSettings::default());
        let mut sink = BeamRenderer::new();
        play_solution(&mut puzzle, &mut sink);

        let z: Vec<f32> = puzzle.scene.deflectors.iter().map(|d| d.pose.position.z).collect();
        assert!(z[0].abs() < 0.05, "tower A at {}", z[0]);
        assert_eq!(z[1], 0.5);
        assert_eq!(z[2], 0.5);
        assert!(!puzzle.is_solved(), "beam has not pulsed yet");

        // Wait for the first pulse and the notify delay
        for _ in 0..(6.0 / SIM_DT) as u32 {
            tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        }
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.emitter.state(), EmissionState::ActiveContinuous);
        let events = puzzle.drain_events();
        assert_eq!(count_solved(&events), 1);
        assert!(events.contains(&PuzzleEvent::PulseStarted));
        assert!(events.contains(&PuzzleEvent::ReceiverActivated { all_hit: true }));
    }

    #[test]
    fn test_solved_event_fires_once() {
        let mut settings = PuzzleSettings::default();
        settings.emitter.continuous = true;
        let mut puzzle = demo(&settings);
        for (d, z) in puzzle.scene.deflectors.iter_mut().zip([0.0, 0.5, 0.5]) {
            d.pose.position.z = z;
        }
        let mut sink = BeamRenderer::new();

        tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        assert!(puzzle.is_solved());
        assert_eq!(count_solved(&puzzle.events), 0, "notification is delayed");

        for _ in 0..300 {
            tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        }
        assert_eq!(count_solved(&puzzle.drain_events()), 1);
        // Beam stays lit and thin
        assert_eq!(sink.live_count(), 10);
        assert_eq!(
            puzzle.emitter.current_width(),
            settings.emitter.continuous_beam_width
        );
    }

    #[test]
    fn test_input_ignored_after_solve() {
        let mut settings = PuzzleSettings::default();
        settings.emitter.continuous = true;
        let mut puzzle = demo(&settings);
        for (d, z) in puzzle.scene.deflectors.iter_mut().zip([0.0, 0.5, 0.5]) {
            d.pose.position.z = z;
        }
        let mut sink = BeamRenderer::new();
        tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        assert!(puzzle.is_solved());

        let before: Vec<_> = puzzle.scene.deflectors.iter().map(|d| d.pose).collect();
        let inputs = [
            TickInput { select: 1.0, move_axis: -1.0 },
            TickInput { select: 0.0, move_axis: -1.0 },
            TickInput { select: -1.0, move_axis: 1.0 },
        ];
        for input in inputs.iter().cycle().take(30) {
            tick(&mut puzzle, input, SIM_DT, &mut sink);
            assert!(puzzle.scene.deflectors.iter().all(|d| !d.is_highlighted()));
        }
        let after: Vec<_> = puzzle.scene.deflectors.iter().map(|d| d.pose).collect();
        assert_eq!(before, after);
        assert_eq!(puzzle.tower.selected_index(), 0);
    }

    #[test]
    fn test_fade_runs_after_pulse() {
        let mut puzzle = demo(&PuzzleSettings::default());
        puzzle.scene.deflectors[0].pose.position.z = 0.0;
        let mut sink = BeamRenderer::new();

        // Through one full pulse
        for _ in 0..((puzzle.settings.emitter.cycle_time + 0.6) / SIM_DT) as u32 {
            tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        }
        assert_eq!(puzzle.emitter.state(), EmissionState::Idle);
        assert!(puzzle.scene.deflectors[0].is_fading());

        // Hold + fade have elapsed
        for _ in 0..(2.0 / SIM_DT) as u32 {
            tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        }
        assert_eq!(puzzle.scene.deflectors[0].fade_state(), FadeState::Idle);
        assert_eq!(
            puzzle.scene.deflectors[0].color(),
            puzzle.settings.deflector.idle_color
        );
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn test_reset_receiver_keeps_fades() {
        let mut settings = PuzzleSettings::default();
        settings.emitter.continuous = true;
        let mut puzzle = demo(&settings);
        for (d, z) in puzzle.scene.deflectors.iter_mut().zip([0.0, 0.5, 0.5]) {
            d.pose.position.z = z;
        }
        let mut sink = BeamRenderer::new();
        tick(&mut puzzle, &TickInput::default(), SIM_DT, &mut sink);
        assert!(puzzle.is_solved());

        puzzle.reset_receiver();
        assert!(!puzzle.is_solved());
        assert!(puzzle.scene.deflectors.iter().all(|d| d.is_fading()));
    }

    #[test]
    fn test_stick_input() {
        let input = TickInput::from_sticks(Vec2::new(-1.0, 0.0), Vec2::new(0.3, 2.0));
        assert_eq!(input.select, -1.0);
        assert_eq!(input.move_axis, 1.0);
    }

    #[test]
    fn test_determinism() {
        let inputs = [
            TickInput { select: 0.0, move_axis: 1.0 },
            TickInput { select: 1.0, move_axis: 0.0 },
            TickInput { select: 0.0, move_axis: 0.7 },
            TickInput::default(),
        ];
        let run = || {
            let mut puzzle = demo(&PuzzleSettings::default());
            let mut sink = BeamRenderer::new();
            for input in inputs.iter().cycle().take(600) {
                tick(&mut puzzle, input, SIM_DT, &mut sink);
            }
            (
                puzzle.time_ticks,
                puzzle.emitter.path().to_vec(),
                puzzle.scene.deflectors.iter().map(|d| d.pose.position).collect::<Vec<_>>(),
            )
        };
        assert_eq!(run(), run());
    }
}

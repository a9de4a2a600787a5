//! Laser Puzzle demo driver
//!
//! Builds the demo scene, plays a scripted solution through the fixed-step
//! loop, and logs every puzzle event. Set `RUST_LOG=debug` for trace detail.

use laser_puzzle::consts::{MAX_SUBSTEPS, SIM_DT};
use laser_puzzle::renderer::BeamRenderer;
use laser_puzzle::sim::{LaserPuzzle, PuzzleEvent, SceneDesc, TickInput, tick};
use laser_puzzle::PuzzleSettings;

const SETTINGS_PATH: &str = "laser_puzzle.json";
/// Simulated display frame time (deliberately not a multiple of SIM_DT)
const FRAME_DT: f32 = 1.0 / 45.0;

/// Fixed-step driver around a puzzle
struct Driver {
    puzzle: LaserPuzzle,
    beam: BeamRenderer,
    accumulator: f32,
    input: TickInput,
}

impl Driver {
    fn new(puzzle: LaserPuzzle) -> Self {
        Self {
            puzzle,
            beam: BeamRenderer::new(),
            accumulator: 0.0,
            input: TickInput::default(),
        }
    }

    /// Run simulation ticks for one display frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.puzzle, &self.input, SIM_DT, &mut self.beam);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in self.puzzle.drain_events() {
            match event {
                PuzzleEvent::PulseStarted => log::info!("[{:6.2}s] pulse", self.puzzle.time),
                PuzzleEvent::DeflectorHit(id) => {
                    log::info!("[{:6.2}s] beam hit {}", self.puzzle.time, id)
                }
                PuzzleEvent::ReceiverActivated { all_hit } => log::info!(
                    "[{:6.2}s] receiver activated (all deflectors hit: {})",
                    self.puzzle.time,
                    all_hit
                ),
                PuzzleEvent::PuzzleSolved => log::info!("[{:6.2}s] puzzle solved!", self.puzzle.time),
            }
        }
    }

    /// Hold `input` for `secs` of display time
    fn hold(&mut self, input: TickInput, secs: f32) {
        self.input = input;
        let frames = (secs / FRAME_DT).ceil() as u32;
        for _ in 0..frames {
            self.update(FRAME_DT);
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("Laser Puzzle (native) starting...");

    let settings = PuzzleSettings::load_or_default(SETTINGS_PATH).unwrap_or_else(|e| {
        log::warn!("Ignoring {}: {}", SETTINGS_PATH, e);
        PuzzleSettings::default()
    });
    let puzzle = match SceneDesc::demo().build(&settings) {
        Ok(puzzle) => puzzle,
        Err(e) => {
            log::error!("Failed to build demo puzzle: {}", e);
            return;
        }
    };

    let mut driver = Driver::new(puzzle);
    let up = TickInput { select: 0.0, move_axis: 1.0 };
    let next = TickInput { select: 1.0, move_axis: 0.0 };
    let idle = TickInput::default();

    driver.hold(up, 0.5);
    for _ in 1..driver.puzzle.tower.towers().len() {
        driver.hold(next, FRAME_DT);
        driver.hold(idle, FRAME_DT);
        driver.hold(up, 1.1);
    }
    let towers: Vec<_> = driver
        .puzzle
        .scene
        .deflectors
        .iter()
        .map(|d| format!("{}={:.2}", d.name, d.pose.position.z))
        .collect();
    log::info!("Towers placed: {}", towers.join(", "));

    driver.hold(idle, 6.0);

    log::info!(
        "Solved: {} | emitter {:?} | {} live segments ({} created, {} destroyed)",
        driver.puzzle.is_solved(),
        driver.puzzle.emitter.state(),
        driver.beam.live_count(),
        driver.beam.created(),
        driver.beam.destroyed()
    );
}

//! Deterministic simulation module
//!
//! All puzzle logic lives here. This module must stay pure and deterministic:
//! - Single-threaded, advanced only by `tick`
//! - Stable iteration order (by deflector id)
//! - No rendering or platform dependencies (segments go through `SegmentSink`)

pub mod deflector;
pub mod emitter;
pub mod geometry;
pub mod material;
pub mod receiver;
pub mod scene;
pub mod state;
pub mod tick;
pub mod tower;

pub use deflector::{Deflector, DeflectorId, FadeState};
pub use emitter::{EmissionState, Emitter, SegmentHandle, SegmentSink, Termination};
pub use geometry::{Collider, LayerMask, Pose, ray_aabb_intersect, ray_sphere_intersect};
pub use material::{LaserMaterial, MaterialId, MaterialLibrary};
pub use receiver::{ReceiveOutcome, Receiver, ReceiverVisual};
pub use scene::{HitTarget, Obstacle, RayHit, Scene, SceneDesc};
pub use state::{LaserPuzzle, PuzzleEvent};
pub use tick::{TickInput, tick};
pub use tower::{Highlightable, TowerController};

//! Scene container and scene-geometry queries
//!
//! The scene owns every object the beam can touch. `SceneDesc` is the
//! serializable description a puzzle is built from; building resolves all
//! references up front and refuses to produce a puzzle with dangling ones.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::deflector::{Deflector, DeflectorId};
use super::emitter::Emitter;
use super::geometry::{Collider, LayerMask, Pose};
use super::material::{LaserMaterial, MaterialId, MaterialLibrary};
use super::receiver::Receiver;
use super::state::LaserPuzzle;
use super::tower::TowerController;
use crate::consts::DEFLECTION_ANGLE;
use crate::error::{PuzzleError, Result};
use crate::settings::PuzzleSettings;

/// Static geometry that blocks the beam
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub name: String,
    pub pose: Pose,
    pub collider: Collider,
    pub layers: LayerMask,
}

/// What a scene ray hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Deflector(DeflectorId),
    Receiver,
    Obstacle(usize),
}

/// Nearest intersection along a scene ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    pub target: HitTarget,
}

/// Everything the beam can interact with
#[derive(Debug, Clone)]
pub struct Scene {
    pub materials: MaterialLibrary,
    /// Ordered by id
    pub deflectors: Vec<Deflector>,
    pub receiver: Receiver,
    pub obstacles: Vec<Obstacle>,
}

impl Scene {
    pub fn deflector(&self, id: DeflectorId) -> Option<&Deflector> {
        self.deflectors.get(id.0 as usize)
    }

    pub fn deflector_mut(&mut self, id: DeflectorId) -> Option<&mut Deflector> {
        self.deflectors.get_mut(id.0 as usize)
    }

    /// Deflector population, fixed for the life of the scene
    pub fn deflector_count(&self) -> usize {
        self.deflectors.len()
    }

    /// Nearest object hit by a ray, filtered by `mask`.
    ///
    /// Objects whose collider contains the origin are not reported.
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let mut best: Option<(f32, HitTarget)> = None;
        let mut consider = |t: Option<f32>, target: HitTarget| {
            if let Some(t) = t {
                if best.is_none_or(|(bt, _)| t < bt) {
                    best = Some((t, target));
                }
            }
        };

        for d in self.deflectors.iter().filter(|d| mask.intersects(d.layers)) {
            let t = d.collider.raycast_outside(&d.pose, origin, dir, max_distance);
            consider(t, HitTarget::Deflector(d.id));
        }

        if mask.intersects(self.receiver.layers) {
            let r = &self.receiver;
            consider(
                r.collider.raycast_outside(&r.pose, origin, dir, max_distance),
                HitTarget::Receiver,
            );
        }

        for (i, o) in self.obstacles.iter().enumerate() {
            if mask.intersects(o.layers) {
                consider(
                    o.collider.raycast_outside(&o.pose, origin, dir, max_distance),
                    HitTarget::Obstacle(i),
                );
            }
        }

        best.map(|(distance, target)| RayHit {
            point: origin + dir * distance,
            distance,
            target,
        })
    }

    /// Intersect a ray with one object's collider only.
    ///
    /// From inside the collider this returns the point where the ray leaves it.
    pub fn cast_ray_against_collider(
        &self,
        target: HitTarget,
        origin: Vec3,
        dir: Vec3,
        max_distance: f32,
    ) -> Option<Vec3> {
        let (pose, collider) = match target {
            HitTarget::Deflector(id) => {
                let d = self.deflector(id)?;
                (&d.pose, &d.collider)
            }
            HitTarget::Receiver => (&self.receiver.pose, &self.receiver.collider),
            HitTarget::Obstacle(i) => {
                let o = self.obstacles.get(i)?;
                (&o.pose, &o.collider)
            }
        };
        collider
            .raycast(pose, origin, dir, max_distance)
            .map(|t| origin + dir * t)
    }

    /// Advance every deflector's hit-indicator animation
    pub fn update_fades(&mut self, dt: f32, continuous: bool) {
        for d in &mut self.deflectors {
            d.update_fade(dt, continuous);
        }
    }
}

fn default_deflection_angle() -> f32 {
    DEFLECTION_ANGLE
}

fn default_collider() -> Collider {
    Collider::sphere(0.25)
}

/// Emitter placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterDesc {
    pub position: Vec3,
    /// Facing, degrees around +Y (0 = +Z)
    #[serde(default)]
    pub yaw: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeflectorDesc {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default = "default_deflection_angle")]
    pub deflection_angle: f32,
    #[serde(default = "default_collider")]
    pub collider: Collider,
    /// Name of the material stamped on the beam after this deflector
    #[serde(default)]
    pub exit_material: Option<String>,
    #[serde(default)]
    pub layers: LayerMask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverDesc {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default = "default_collider")]
    pub collider: Collider,
    #[serde(default)]
    pub layers: LayerMask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleDesc {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    pub collider: Collider,
    #[serde(default)]
    pub layers: LayerMask,
}

/// Serializable puzzle layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub materials: Vec<LaserMaterial>,
    /// Beam material before any deflector restyles it
    #[serde(default)]
    pub default_material: Option<String>,
    #[serde(default)]
    pub emitter: Option<EmitterDesc>,
    #[serde(default)]
    pub deflectors: Vec<DeflectorDesc>,
    #[serde(default)]
    pub receiver: Option<ReceiverDesc>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDesc>,
    /// Deflector indices the tower controller cycles through (default: all, in order)
    #[serde(default)]
    pub tower_order: Option<Vec<u32>>,
}

impl SceneDesc {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve references and assemble a runnable puzzle
    pub fn build(&self, settings: &PuzzleSettings) -> Result<LaserPuzzle> {
        settings.validate()?;

        let emitter_desc = self.emitter.as_ref().ok_or(PuzzleError::MissingEmitter)?;
        let receiver_desc = self.receiver.as_ref().ok_or(PuzzleError::MissingReceiver)?;
        if self.deflectors.is_empty() {
            return Err(PuzzleError::NoDeflectors);
        }

        let mut materials = MaterialLibrary::new();
        for m in &self.materials {
            if materials.find(&m.name).is_some() {
                return Err(PuzzleError::DuplicateMaterial(m.name.clone()));
            }
            materials.add(m.clone());
        }
        let default_material = match &self.default_material {
            Some(name) => materials
                .find(name)
                .ok_or_else(|| PuzzleError::UnknownMaterial(name.clone()))?,
            None => {
                log::warn!("No default laser material assigned, using a basic red emissive material");
                materials.add(LaserMaterial::basic_red())
            }
        };

        let mut deflectors = Vec::with_capacity(self.deflectors.len());
        for (i, desc) in self.deflectors.iter().enumerate() {
            let pose = Pose::from_yaw_degrees(desc.position, desc.yaw);
            let mut deflector = Deflector::new(
                DeflectorId(i as u32),
                desc.name.clone(),
                pose,
                desc.collider,
                desc.deflection_angle,
                &settings.deflector,
            )
            .with_layers(desc.layers);
            if let Some(name) = &desc.exit_material {
                let id = resolve_material(&materials, name)?;
                let hit_color = materials
                    .get(id)
                    .map(|m| m.indicator_color())
                    .unwrap_or(glam::Vec4::ONE);
                deflector = deflector.with_exit_material(id, hit_color);
            }
            deflectors.push(deflector);
        }

        let receiver = Receiver::new(
            Pose::from_yaw_degrees(receiver_desc.position, receiver_desc.yaw),
            receiver_desc.collider,
            &settings.receiver,
        )
        .with_layers(receiver_desc.layers);

        let obstacles = self
            .obstacles
            .iter()
            .map(|o| Obstacle {
                name: o.name.clone(),
                pose: Pose::from_yaw_degrees(o.position, o.yaw),
                collider: o.collider,
                layers: o.layers,
            })
            .collect();

        let mut scene = Scene {
            materials,
            deflectors,
            receiver,
            obstacles,
        };

        let tower_order: Vec<DeflectorId> = match &self.tower_order {
            Some(order) => order.iter().copied().map(DeflectorId).collect(),
            None => scene.deflectors.iter().map(|d| d.id).collect(),
        };
        let tower = TowerController::new(tower_order, settings.tower.clone(), &mut scene)?;

        let emitter = Emitter::new(
            Pose::from_yaw_degrees(emitter_desc.position, emitter_desc.yaw),
            settings.emitter.clone(),
            default_material,
            scene.deflector_count(),
        );

        log::info!(
            "Built laser puzzle: {} deflectors, {} obstacles, {} materials",
            scene.deflector_count(),
            scene.obstacles.len(),
            scene.materials.len()
        );

        Ok(LaserPuzzle::new(settings.clone(), scene, emitter, tower))
    }

    /// Three-tower layout used by the demo binary.
    ///
    /// Towers start at the tower controller's `min_z`; the solution is
    /// `z = [0.0, 0.5, 0.5]` with the default tower bounds.
    pub fn demo() -> Self {
        let tower = |name: &str, x: f32, yaw: f32, angle: f32, material: Option<&str>| DeflectorDesc {
            name: name.to_string(),
            position: Vec3::new(x, 0.0, 0.0),
            yaw,
            deflection_angle: angle,
            collider: Collider::sphere(0.25),
            exit_material: material.map(str::to_string),
            layers: LayerMask::DEFAULT,
        };

        Self {
            materials: vec![
                LaserMaterial::new("red", Vec3::new(1.0, 0.1, 0.1), 3.0),
                LaserMaterial::new("green", Vec3::new(0.1, 1.0, 0.2), 3.0),
                LaserMaterial::new("blue", Vec3::new(0.2, 0.3, 1.0), 3.0),
            ],
            default_material: Some("red".to_string()),
            emitter: Some(EmitterDesc {
                position: Vec3::ZERO,
                yaw: 90.0,
            }),
            deflectors: vec![
                // Facing +X, turns the beam onto the +X+Z diagonal
                tower("tower_a", 2.0, 90.0, -45.0, Some("green")),
                // Facing the diagonal, turns it back to +X
                tower("tower_b", 2.5, 45.0, 45.0, None),
                // Facing +X, turns the beam to +Z
                tower("tower_c", 5.0, 90.0, -90.0, Some("blue")),
            ],
            receiver: Some(ReceiverDesc {
                position: Vec3::new(5.0, 0.0, 3.0),
                yaw: 0.0,
                collider: Collider::sphere(0.4),
                layers: LayerMask::DEFAULT,
            }),
            obstacles: vec![ObstacleDesc {
                name: "back_wall".to_string(),
                position: Vec3::new(-3.0, 0.0, 0.0),
                yaw: 0.0,
                collider: Collider::cuboid(Vec3::new(0.5, 2.0, 5.0)),
                layers: LayerMask::DEFAULT,
            }],
            tower_order: None,
        }
    }
}

fn resolve_material(materials: &MaterialLibrary, name: &str) -> Result<MaterialId> {
    materials
        .find(name)
        .ok_or_else(|| PuzzleError::UnknownMaterial(name.to_string()))
}

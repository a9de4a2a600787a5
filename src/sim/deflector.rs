//! Deflectors - movable towers that redirect the beam
//!
//! A deflector turns the beam by a fixed yaw relative to its own forward
//! direction and may restyle everything downstream with its exit material.
//! Each hit flashes the body to the hit color, holds it for `pause_time`,
//! then smooth-steps back to the idle color over `fade_time`.

use std::fmt;

use glam::{Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::geometry::{Collider, LayerMask, Pose};
use super::material::MaterialId;
use super::tower::Highlightable;
use crate::clamp_deflection_angle;
use crate::settings::DeflectorSettings;

/// Stable deflector identity (index in scene order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeflectorId(pub u32);

impl fmt::Display for DeflectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deflector#{}", self.0)
    }
}

/// Hit-indicator animation phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeState {
    /// Showing the idle color
    Idle,
    /// Holding the hit color after a hit
    Holding { elapsed: f32 },
    /// Interpolating from the hit color back to idle
    Fading { elapsed: f32 },
    /// Hit color held indefinitely (continuous beam)
    Lit,
}

/// A beam-redirecting scene object
#[derive(Debug, Clone)]
pub struct Deflector {
    pub id: DeflectorId,
    pub name: String,
    pub pose: Pose,
    pub collider: Collider,
    pub layers: LayerMask,
    deflection_angle: f32,
    exit_material: Option<MaterialId>,

    // Hit indicator
    hit_color: Vec4,
    idle_color: Vec4,
    pause_time: f32,
    fade_time: f32,
    color: Vec4,
    fade: FadeState,

    // Selection outline
    highlighted: bool,
    outline_color: Vec4,
    outline_width: f32,
}

impl Deflector {
    pub fn new(
        id: DeflectorId,
        name: impl Into<String>,
        pose: Pose,
        collider: Collider,
        deflection_angle: f32,
        settings: &DeflectorSettings,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            pose,
            collider,
            layers: LayerMask::DEFAULT,
            deflection_angle: clamp_deflection_angle(deflection_angle),
            exit_material: None,
            hit_color: Vec4::ONE,
            idle_color: settings.idle_color,
            pause_time: settings.pause_time,
            fade_time: settings.fade_time,
            color: settings.idle_color,
            fade: FadeState::Idle,
            highlighted: false,
            outline_color: Vec4::ONE,
            outline_width: 0.0,
        }
    }

    /// Set the material stamped on downstream segments and the hit color it implies
    pub fn with_exit_material(mut self, material: MaterialId, hit_color: Vec4) -> Self {
        self.exit_material = Some(material);
        self.hit_color = hit_color;
        self
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn deflection_angle(&self) -> f32 {
        self.deflection_angle
    }

    pub fn set_deflection_angle(&mut self, degrees: f32) {
        self.deflection_angle = clamp_deflection_angle(degrees);
    }

    /// Beam direction leaving this deflector.
    ///
    /// The forward vector yawed by the deflection angle. Pure function of the
    /// current orientation.
    pub fn exit_direction(&self) -> Vec3 {
        let yaw = Quat::from_rotation_y(self.deflection_angle.to_radians());
        (yaw * self.pose.forward()).normalize_or_zero()
    }

    /// Material for downstream segments; `None` means inherit
    pub fn exit_material(&self) -> Option<MaterialId> {
        self.exit_material
    }

    /// Flash the hit color and (re)start the hold phase
    pub fn notify_hit(&mut self) {
        self.color = self.hit_color;
        self.fade = FadeState::Holding { elapsed: 0.0 };
    }

    /// Advance the hit-indicator animation.
    ///
    /// While the beam is continuous the hit color is held instead of fading.
    pub fn update_fade(&mut self, dt: f32, continuous: bool) {
        self.fade = match self.fade {
            FadeState::Idle | FadeState::Lit => self.fade,
            FadeState::Holding { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed < self.pause_time {
                    FadeState::Holding { elapsed }
                } else if continuous {
                    FadeState::Lit
                } else {
                    self.step_fade(elapsed - self.pause_time)
                }
            }
            FadeState::Fading { elapsed } => self.step_fade(elapsed + dt),
        };
    }

    fn step_fade(&mut self, elapsed: f32) -> FadeState {
        if elapsed >= self.fade_time {
            self.color = self.idle_color;
            return FadeState::Idle;
        }
        let t = crate::smooth_step(elapsed / self.fade_time);
        self.color = self.hit_color.lerp(self.idle_color, t);
        FadeState::Fading { elapsed }
    }

    /// Current body color for the rendering layer
    pub fn color(&self) -> Vec4 {
        self.color
    }

    pub fn fade_state(&self) -> FadeState {
        self.fade
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.fade, FadeState::Holding { .. } | FadeState::Fading { .. })
    }

    pub fn outline(&self) -> (Vec4, f32) {
        (self.outline_color, self.outline_width)
    }
}

impl Highlightable for Deflector {
    fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    fn configure_highlight(&mut self, color: Vec4, width: f32) {
        self.outline_color = color;
        self.outline_width = width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn deflector(angle: f32, yaw: f32) -> Deflector {
        Deflector::new(
            DeflectorId(0),
            "tower",
            Pose::from_yaw_degrees(Vec3::ZERO, yaw),
            Collider::sphere(0.5),
            angle,
            &DeflectorSettings::default(),
        )
    }

    fn lit(settings: &DeflectorSettings) -> Deflector {
        Deflector::new(DeflectorId(1), "lit", Pose::default(), Collider::sphere(0.5), 0.0, settings)
            .with_exit_material(MaterialId(0), Vec4::new(0.0, 1.0, 0.0, 1.0))
    }

    #[test]
    fn test_exit_direction_quarter_turn() {
        let d = deflector(90.0, 0.0);
        assert!((d.exit_direction() - Vec3::X).length() < 1e-5);

        let d = deflector(-90.0, 0.0);
        assert!((d.exit_direction() + Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_exit_direction_combines_pose_and_angle() {
        // Facing +X, turn a further 90° -> facing -Z
        let d = deflector(90.0, 90.0);
        assert!((d.exit_direction() + Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_angle_clamped() {
        let mut d = deflector(400.0, 0.0);
        assert_eq!(d.deflection_angle(), 180.0);
        d.set_deflection_angle(-181.0);
        assert_eq!(d.deflection_angle(), -180.0);
    }

    #[test]
    fn test_hit_then_hold_then_fade() {
        let settings = DeflectorSettings::default();
        let mut d = lit(&settings);
        assert_eq!(d.color(), settings.idle_color);

        d.notify_hit();
        assert_eq!(d.color(), Vec4::new(0.0, 1.0, 0.0, 1.0));

        // Still holding before pause_time
        d.update_fade(0.1, false);
        assert!(matches!(d.fade_state(), FadeState::Holding { .. }));
        assert_eq!(d.color(), Vec4::new(0.0, 1.0, 0.0, 1.0));

        // Into the fade
        d.update_fade(0.1 + settings.fade_time * 0.5, false);
        assert!(matches!(d.fade_state(), FadeState::Fading { .. }));
        let mid = d.color();
        assert!(mid.x > 0.0 && mid.x < 1.0);

        // Past the end
        d.update_fade(settings.fade_time, false);
        assert_eq!(d.fade_state(), FadeState::Idle);
        assert_eq!(d.color(), settings.idle_color);
    }

    #[test]
    fn test_retrigger_restarts_hold() {
        let settings = DeflectorSettings::default();
        let mut d = lit(&settings);
        d.notify_hit();
        d.update_fade(settings.pause_time + 0.3, false);
        assert!(matches!(d.fade_state(), FadeState::Fading { .. }));

        d.notify_hit();
        assert_eq!(d.fade_state(), FadeState::Holding { elapsed: 0.0 });
        assert_eq!(d.color(), Vec4::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_continuous_holds_hit_color() {
        let settings = DeflectorSettings::default();
        let mut d = lit(&settings);
        d.notify_hit();
        d.update_fade(settings.pause_time, true);
        assert_eq!(d.fade_state(), FadeState::Lit);
        d.update_fade(10.0, true);
        assert_eq!(d.color(), Vec4::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_no_material_flashes_white() {
        let settings = DeflectorSettings {
            idle_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            ..Default::default()
        };
        let mut d = Deflector::new(
            DeflectorId(2),
            "plain",
            Pose::default(),
            Collider::sphere(0.5),
            10.0,
            &settings,
        );
        d.notify_hit();
        assert_eq!(d.color(), Vec4::ONE);
        assert!(d.exit_material().is_none());
    }

    #[test]
    fn test_highlight_capability() {
        let mut d = deflector(0.0, 0.0);
        d.configure_highlight(Vec4::new(1.0, 1.0, 0.0, 1.0), 5.0);
        d.set_highlighted(true);
        assert!(d.is_highlighted());
        assert_eq!(d.outline().1, 5.0);
    }

    proptest! {
        #[test]
        fn zero_angle_exits_forward(yaw in -180.0f32..180.0) {
            let d = deflector(0.0, yaw);
            prop_assert!((d.exit_direction() - d.pose.forward()).length() < 1e-5);
        }

        #[test]
        fn exit_direction_is_unit(angle in -180.0f32..180.0, yaw in -180.0f32..180.0) {
            let d = deflector(angle, yaw);
            prop_assert!((d.exit_direction().length() - 1.0).abs() < 1e-4);
        }
    }
}

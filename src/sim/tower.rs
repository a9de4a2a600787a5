//! Tower (positioning) controller
//!
//! Cycles a selection through the controllable deflectors and slides the
//! selected one along Z within fixed bounds. Once the receiver latches solved
//! the controller clears every outline and ignores input for good.

use std::collections::HashSet;

use glam::Vec4;

use super::deflector::DeflectorId;
use super::scene::Scene;
use crate::error::{PuzzleError, Result};
use crate::settings::TowerSettings;

/// Something that can show a selection outline
pub trait Highlightable {
    fn set_highlighted(&mut self, highlighted: bool);
    fn is_highlighted(&self) -> bool;
    fn configure_highlight(&mut self, color: Vec4, width: f32);
}

#[derive(Debug, Clone)]
pub struct TowerController {
    towers: Vec<DeflectorId>,
    selected: usize,
    settings: TowerSettings,
    /// Select axis value seen last tick, for edge detection
    prev_select: f32,
    /// Latched once the receiver reports solved; never cleared
    frozen: bool,
}

impl TowerController {
    /// Take control of `towers`, snapping each to `min_z` and selecting the first
    pub fn new(towers: Vec<DeflectorId>, settings: TowerSettings, scene: &mut Scene) -> Result<Self> {
        if towers.is_empty() {
            return Err(PuzzleError::NoDeflectors);
        }

        let mut seen = HashSet::new();
        for &id in &towers {
            if scene.deflector(id).is_none() {
                return Err(PuzzleError::UnknownDeflector(id));
            }
            if !seen.insert(id) {
                return Err(PuzzleError::DuplicateTowerEntry(id));
            }
        }

        for &id in &towers {
            if let Some(d) = scene.deflector_mut(id) {
                d.pose.position.z = settings.min_z;
                d.configure_highlight(settings.outline_color, settings.outline_width);
                d.set_highlighted(false);
            }
        }

        let controller = Self {
            towers,
            selected: 0,
            settings,
            prev_select: 0.0,
            frozen: false,
        };
        controller.highlight(scene, controller.selected, true);
        Ok(controller)
    }

    /// Per-tick update: selection edges first, then movement
    pub fn update(&mut self, select: f32, move_axis: f32, dt: f32, scene: &mut Scene) {
        if self.latch_solved(scene) {
            for &id in &self.towers {
                if let Some(d) = scene.deflector_mut(id) {
                    d.set_highlighted(false);
                }
            }
            return;
        }

        self.on_select(select, scene);
        self.on_move(move_axis, dt, scene);
    }

    /// Feed the held select axis; a threshold crossing moves the selection one step.
    pub fn on_select(&mut self, value: f32, scene: &mut Scene) {
        if self.latch_solved(scene) {
            return;
        }

        let threshold = self.settings.select_threshold;
        let prev = self.prev_select;
        self.prev_select = value;

        if (value - prev).abs() <= threshold {
            return;
        }

        let previous = self.selected;
        if value < -threshold && prev >= -threshold {
            self.selected = self.selected.saturating_sub(1);
        } else if value > threshold && prev <= threshold {
            self.selected = (self.selected + 1).min(self.towers.len() - 1);
        }

        if self.selected != previous {
            self.highlight(scene, previous, false);
            self.highlight(scene, self.selected, true);
            log::debug!("Selected tower {} ({})", self.selected, self.towers[self.selected]);
        }
    }

    /// Slide the selected tower along Z by `axis * move_speed * dt`, clamped to bounds
    pub fn on_move(&mut self, axis: f32, dt: f32, scene: &mut Scene) {
        if self.latch_solved(scene) || axis == 0.0 {
            return;
        }
        let (min_z, max_z) = (self.settings.min_z, self.settings.max_z);
        let step = axis * self.settings.move_speed * dt;
        if let Some(d) = scene.deflector_mut(self.towers[self.selected]) {
            d.pose.position.z = (d.pose.position.z + step).clamp(min_z, max_z);
        }
    }

    /// Whether the controller has stopped accepting input for good
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze on the first solved observation; a later receiver reset does not thaw.
    fn latch_solved(&mut self, scene: &Scene) -> bool {
        if !self.frozen && scene.receiver.is_puzzle_solved() {
            log::debug!("Tower controller frozen: puzzle solved");
            self.frozen = true;
        }
        self.frozen
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_tower(&self) -> DeflectorId {
        self.towers[self.selected]
    }

    pub fn towers(&self) -> &[DeflectorId] {
        &self.towers
    }

    fn highlight(&self, scene: &mut Scene, index: usize, on: bool) {
        if let Some(d) = self.towers.get(index).and_then(|&id| scene.deflector_mut(id)) {
            d.set_highlighted(on);
        }
    }
}

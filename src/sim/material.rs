//! Beam materials
//!
//! A material is a color plus emission intensity. Segments reference materials
//! by `MaterialId` so a trace never clones material data.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::consts::BEAM_ALPHA;

/// Index into a `MaterialLibrary`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Emissive beam material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserMaterial {
    pub name: String,
    /// Base RGB color
    pub color: Vec3,
    /// Emission intensity (0-10)
    pub intensity: f32,
}

impl LaserMaterial {
    pub fn new(name: impl Into<String>, color: Vec3, intensity: f32) -> Self {
        Self {
            name: name.into(),
            color,
            intensity: intensity.clamp(0.0, 10.0),
        }
    }

    /// Fallback material used when a scene supplies none
    pub fn basic_red() -> Self {
        Self::new("default_red", Vec3::new(1.0, 0.0, 0.0), 2.0)
    }

    /// Render color (translucent)
    pub fn render_color(&self) -> Vec4 {
        self.color.extend(BEAM_ALPHA)
    }

    /// Emission color (HDR)
    pub fn emission_color(&self) -> Vec3 {
        self.color * self.intensity
    }

    /// Opaque color used to tint a deflector body when it is hit
    pub fn indicator_color(&self) -> Vec4 {
        self.color.extend(1.0)
    }
}

/// Owns every material in a scene
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: Vec<LaserMaterial>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a material, clamping its intensity into range
    pub fn add(&mut self, mut material: LaserMaterial) -> MaterialId {
        material.intensity = material.intensity.clamp(0.0, 10.0);
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    pub fn get(&self, id: MaterialId) -> Option<&LaserMaterial> {
        self.materials.get(id.0 as usize)
    }

    /// Look a material up by name
    pub fn find(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(|i| MaterialId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emission_scales_with_intensity() {
        let m = LaserMaterial::new("green", Vec3::new(0.0, 1.0, 0.0), 3.0);
        assert_eq!(m.emission_color(), Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(m.render_color().w, BEAM_ALPHA);
    }

    #[test]
    fn test_intensity_clamped() {
        let m = LaserMaterial::new("hot", Vec3::ONE, 25.0);
        assert_eq!(m.intensity, 10.0);
    }

    #[test]
    fn test_library_lookup() {
        let mut lib = MaterialLibrary::new();
        let red = lib.add(LaserMaterial::basic_red());
        let blue = lib.add(LaserMaterial::new("blue", Vec3::Z, 1.0));
        assert_eq!(lib.find("blue"), Some(blue));
        assert_eq!(lib.get(red).map(|m| m.name.as_str()), Some("default_red"));
        assert!(lib.get(MaterialId(9)).is_none());
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn test_add_clamps_deserialized_intensity() {
        let m: LaserMaterial =
            serde_json::from_str(r#"{ "name": "hot", "color": [1.0, 0.5, 0.0], "intensity": 25.0 }"#).unwrap();
        assert_eq!(m.intensity, 25.0);

        let mut lib = MaterialLibrary::new();
        let id = lib.add(m);
        assert_eq!(lib.get(id).map(|m| m.intensity), Some(10.0));
    }
}

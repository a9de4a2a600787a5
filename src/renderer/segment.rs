//! Beam segment instances

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::sim::emitter::{SegmentHandle, SegmentSink};
use crate::sim::material::LaserMaterial;

/// One beam segment, drawn as a stretched cylinder
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SegmentInstance {
    pub midpoint: [f32; 3],
    pub length: f32,
    /// Unit direction from start to end (zero for degenerate segments)
    pub direction: [f32; 3],
    pub width: f32,
    pub color: [f32; 4],
    /// HDR emission, alpha unused
    pub emission: [f32; 4],
}

impl SegmentInstance {
    pub fn new(start: Vec3, end: Vec3, material: &LaserMaterial, width: f32) -> Self {
        let delta = end - start;
        Self {
            midpoint: ((start + end) * 0.5).to_array(),
            length: delta.length(),
            direction: delta.normalize_or_zero().to_array(),
            width,
            color: material.render_color().to_array(),
            emission: material.emission_color().extend(1.0).to_array(),
        }
    }

    pub fn start(&self) -> Vec3 {
        Vec3::from(self.midpoint) - Vec3::from(self.direction) * self.length * 0.5
    }

    pub fn end(&self) -> Vec3 {
        Vec3::from(self.midpoint) + Vec3::from(self.direction) * self.length * 0.5
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const F3: wgpu::BufferAddress = std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress;
        const F4: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SegmentInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // midpoint + length
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: F3,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32,
                },
                // direction + width
                wgpu::VertexAttribute {
                    offset: F4,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: F4 + F3,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: F4 * 2,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: F4 * 3,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    instance: Option<SegmentInstance>,
}

/// Slot-based segment store implementing `SegmentSink`
///
/// Handles carry a generation so a stale handle can never remove a segment
/// that reused its slot.
#[derive(Debug, Clone, Default)]
pub struct BeamRenderer {
    slots: Vec<Slot>,
    free: Vec<u32>,
    created: u64,
    destroyed: u64,
}

impl BeamRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments currently alive
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.instance.is_some()).count()
    }

    /// Total segments ever created
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Total segments ever destroyed
    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }

    pub fn get(&self, handle: SegmentHandle) -> Option<&SegmentInstance> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.instance.as_ref())
    }

    /// Live instances in slot order
    pub fn instances(&self) -> Vec<SegmentInstance> {
        self.slots.iter().filter_map(|s| s.instance).collect()
    }

    /// Instance data ready for `queue.write_buffer`
    pub fn instance_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.instances()).to_vec()
    }
}

impl SegmentSink for BeamRenderer {
    fn create_segment(&mut self, start: Vec3, end: Vec3, material: &LaserMaterial, width: f32) -> SegmentHandle {
        let instance = Some(SegmentInstance::new(start, end, material, width));
        self.created += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.instance = instance;
            return SegmentHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            instance,
        });
        SegmentHandle {
            index,
            generation: 0,
        }
    }

    fn destroy_segment(&mut self, handle: SegmentHandle) {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.instance.is_some() => {
                slot.instance = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
                self.destroyed += 1;
            }
            _ => log::warn!("Ignoring stale segment handle {:?}", handle),
        }
    }
}

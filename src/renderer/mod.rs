//! Beam rendering data
//!
//! The simulation never talks to the GPU. It hands segments to a
//! `SegmentSink`; `BeamRenderer` keeps them as packed instances ready to be
//! uploaded to a wgpu vertex buffer.

pub mod segment;

pub use segment::{BeamRenderer, SegmentInstance};

//! wgpu render backend for the viewer.
//!
//! Draws the tinted floor plane and the loaded model meshes with hemisphere
//! ambient, a spot light, and linear fog — the parameter set the debug panel
//! drives.
//!
//! # Invariants
//! - The renderer never mutates scene state; settings flow in as uniforms
//!   once per frame.
//! - Rendering with no model uploaded is valid and draws only the floor.

mod gpu;
mod shaders;

pub use gpu::WgpuSceneRenderer;

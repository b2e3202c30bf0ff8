//! Rendering seam: the camera and the backend-agnostic renderer trait.
//!
//! # Invariants
//! - A renderer never mutates the scene or the camera.
//! - Camera motion is advanced by the frame loop, one `update` per frame,
//!   never from inside a renderer.

mod camera;
mod renderer;

pub use camera::OrbitCamera;
pub use renderer::{FrameTrace, SceneRenderer};

//! Shared types for the sceneview workspace: viewport geometry, pixel-scale
//! handling, and linear colors.
//!
//! # Invariants
//! - Aspect ratio is always derived from the latest viewport, never cached.
//! - Rendered pixel scale never exceeds [`MAX_PIXEL_SCALE`].

mod color;
mod viewport;

pub use color::Color;
pub use viewport::{MAX_PIXEL_SCALE, SurfaceExtent, Viewport, clamp_pixel_scale};

//! Asset import: glTF 2.0 documents parsed into mesh data the renderer can
//! upload, plus a background loader so the frame loop never blocks on IO.
//!
//! # Invariants
//! - Loading never blocks the caller; completion is observed by polling.
//! - A failed load is reported once and never retried.

mod gltf;
mod loader;

pub use gltf::{AssetError, MeshData, content_digest, load_gltf};
pub use loader::BackgroundLoader;

//! Scene state for the viewer: every parameter the debug panel can tweak,
//! plus the slot the asynchronously loaded model lands in.
//!
//! # Invariants
//! - Settings are plain fields; the UI writes them directly with no
//!   validation or derived computation in between.
//! - The model slot is empty until the background load completes. Rendering
//!   an empty slot is valid — the scene simply draws without the model.

mod settings;

pub use settings::{
    FloorSettings, FogSettings, HemisphereSettings, SceneSettings, SpotLightSettings,
};

use sceneview_assets::MeshData;

/// A loaded model: the decoded meshes of one glTF document.
#[derive(Debug, Clone)]
pub struct Model {
    pub meshes: Vec<MeshData>,
}

impl Model {
    pub fn new(meshes: Vec<MeshData>) -> Self {
        Self { meshes }
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(MeshData::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

/// The complete render state: tweakable settings plus the optional model.
#[derive(Debug, Default)]
pub struct Scene {
    pub settings: SceneSettings,
    model: Option<Model>,
}

impl Scene {
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            model: None,
        }
    }

    /// Install the loaded model. A second call replaces the first.
    pub fn attach_model(&mut self, model: Model) {
        self.model = Some(model);
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}

use crate::camera::OrbitCamera;
use sceneview_scene::Scene;
use std::fmt::Write;

/// Backend-agnostic renderer interface.
///
/// A renderer reads the scene and camera and produces output. It never
/// mutates either; all state changes go through the frame loop.
pub trait SceneRenderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the scene from the given camera.
    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> Self::Output;
}

/// Headless text renderer.
///
/// Describes the frame that would be drawn — model presence, tweakable
/// settings, camera — without touching a GPU. Used in tests and useful for
/// log diagnostics.
#[derive(Debug, Default)]
pub struct FrameTrace;

impl FrameTrace {
    pub fn new() -> Self {
        Self
    }
}

impl SceneRenderer for FrameTrace {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> String {
        let mut out = String::new();
        let s = &scene.settings;
        let eye = camera.position();

        let _ = writeln!(
            out,
            "background=({:.3}, {:.3}, {:.3})",
            s.background.r, s.background.g, s.background.b
        );
        let _ = writeln!(out, "fog near={:.2} far={:.2}", s.fog.near, s.fog.far);
        let _ = writeln!(
            out,
            "floor height={:.2} tilt={:.2} size={:.1}",
            s.floor.height, s.floor.tilt, s.floor.size
        );
        let _ = writeln!(
            out,
            "spot intensity={:.2} angle={:.3} penumbra={:.2} distance={:.1}",
            s.spot.intensity, s.spot.angle, s.spot.penumbra, s.spot.distance
        );
        let _ = writeln!(out, "hemisphere intensity={:.2}", s.hemisphere.intensity);
        let _ = writeln!(
            out,
            "camera eye=({:.2}, {:.2}, {:.2}) aspect={:.4}",
            eye.x, eye.y, eye.z, camera.aspect
        );

        match scene.model() {
            Some(model) => {
                let _ = writeln!(
                    out,
                    "model: {} meshes, {} vertices, {} triangles",
                    model.meshes.len(),
                    model.vertex_count(),
                    model.triangle_count()
                );
            }
            None => {
                let _ = writeln!(out, "model: absent");
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneview_scene::Model;

    fn one_mesh_model() -> Model {
        Model::new(vec![sceneview_assets::MeshData {
            name: "tri".into(),
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 1.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            base_color: [1.0; 4],
        }])
    }

    #[test]
    fn frame_renders_without_model_before_load() {
        let scene = Scene::default();
        let out = FrameTrace::new().render(&scene, &OrbitCamera::default());
        assert!(out.contains("model: absent"));
        assert!(out.contains("fog near=1.00"));
    }

    #[test]
    fn frame_includes_model_after_attach() {
        let mut scene = Scene::default();
        scene.attach_model(one_mesh_model());
        let out = FrameTrace::new().render(&scene, &OrbitCamera::default());
        assert!(out.contains("model: 1 meshes, 3 vertices, 1 triangles"));
    }

    #[test]
    fn attach_order_is_irrelevant_to_the_next_frame() {
        // Render, attach, render: only the latest frame reflects the model.
        let renderer = FrameTrace::new();
        let camera = OrbitCamera::default();
        let mut scene = Scene::default();

        let before = renderer.render(&scene, &camera);
        scene.attach_model(one_mesh_model());
        let after = renderer.render(&scene, &camera);

        assert!(before.contains("model: absent"));
        assert!(after.contains("model: 1 meshes"));
    }

    #[test]
    fn aspect_change_shows_up_in_the_frame() {
        let scene = Scene::default();
        let mut camera = OrbitCamera::default();
        camera.set_aspect(1920.0 / 1080.0);
        let out = FrameTrace::new().render(&scene, &camera);
        assert!(out.contains("aspect=1.7778"));
    }
}

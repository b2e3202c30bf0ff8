use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use sceneview_assets::MeshData;
use sceneview_render::OrbitCamera;
use sceneview_scene::{FloorSettings, Scene, SceneSettings};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    fog_color: [f32; 4],
    fog_params: [f32; 4],
    spot_position: [f32; 4],
    spot_direction: [f32; 4],
    spot_color: [f32; 4],
    spot_params: [f32; 4],
    hemi_sky: [f32; 4],
    hemi_ground: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PrimitiveUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// Pack the tweakable settings and camera into the per-frame uniform block.
fn frame_uniforms(settings: &SceneSettings, camera: &OrbitCamera) -> FrameUniforms {
    let spot = &settings.spot;
    // Aimed at the scene origin, like the demo it renders.
    let direction = (Vec3::ZERO - spot.position).normalize_or(Vec3::NEG_Y);
    let cos_outer = spot.angle.cos();
    // Penumbra shrinks the fully-lit inner cone. Keep the smoothstep edges
    // strictly ordered even at penumbra 0.
    let cos_inner = (spot.angle * (1.0 - spot.penumbra))
        .cos()
        .max(cos_outer + 1e-4);

    FrameUniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        camera_pos: camera.position().extend(1.0).to_array(),
        fog_color: settings.fog.color.to_array4(1.0),
        fog_params: [settings.fog.near, settings.fog.far, 0.0, 0.0],
        spot_position: spot.position.extend(1.0).to_array(),
        spot_direction: direction.extend(0.0).to_array(),
        spot_color: spot.color.to_array4(spot.intensity),
        spot_params: [cos_outer, cos_inner, spot.decay, spot.distance],
        hemi_sky: settings.hemisphere.sky_color.to_array4(settings.hemisphere.intensity),
        hemi_ground: settings.hemisphere.ground_color.to_array4(0.0),
    }
}

/// World transform of the floor quad from its tweakable settings.
fn floor_model(floor: &FloorSettings) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, floor.height, 0.0))
        * Mat4::from_rotation_x(floor.tilt)
        * Mat4::from_scale(Vec3::splat(floor.size))
}

/// Unit quad in the XY plane, facing +Z. The floor transform tilts it flat.
fn floor_quad() -> (Vec<Vertex>, Vec<u16>) {
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex { position: [-1.0, -1.0, 0.0], normal: n },
        Vertex { position: [1.0, -1.0, 0.0], normal: n },
        Vertex { position: [1.0, 1.0, 0.0], normal: n },
        Vertex { position: [-1.0, 1.0, 0.0], normal: n },
    ];
    let indices = vec![0, 1, 2, 2, 3, 0];
    (vertices, indices)
}

fn interleave(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .map(|(&position, &normal)| Vertex { position, normal })
        .collect()
}

/// One uploaded draw unit: the floor quad or a model mesh.
struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    index_format: wgpu::IndexFormat,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// wgpu scene renderer: one pipeline for floor and meshes, per-frame uniform
/// upload from the scene settings.
pub struct WgpuSceneRenderer {
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    prim_layout: wgpu::BindGroupLayout,
    floor: GpuPrimitive,
    model: Vec<GpuPrimitive>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuSceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let prim_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("primitive_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &prim_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // glTF content has arbitrary winding and the floor is
                // visible from both sides.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (quad_verts, quad_indices) = floor_quad();
        let floor = Self::create_primitive(
            device,
            &prim_layout,
            bytemuck::cast_slice(&quad_verts),
            bytemuck::cast_slice(&quad_indices),
            quad_indices.len() as u32,
            wgpu::IndexFormat::Uint16,
            PrimitiveUniforms {
                model: Mat4::IDENTITY.to_cols_array_2d(),
                color: [1.0; 4],
            },
            "floor",
        );

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            pipeline,
            frame_buffer,
            frame_bind_group,
            prim_layout,
            floor,
            model: Vec::new(),
            depth_texture,
            surface_format,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_primitive(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        vertices: &[u8],
        indices: &[u8],
        index_count: u32,
        index_format: wgpu::IndexFormat,
        uniforms: PrimitiveUniforms,
        label: &str,
    ) -> GpuPrimitive {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_uniforms")),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}_bind_group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        GpuPrimitive {
            vertex_buffer,
            index_buffer,
            index_count,
            index_format,
            uniform_buffer,
            bind_group,
        }
    }

    /// Upload the loaded model meshes. Replaces any previous upload.
    pub fn set_model(&mut self, device: &wgpu::Device, meshes: &[MeshData]) {
        self.model = meshes
            .iter()
            .map(|mesh| {
                let vertices = interleave(mesh);
                Self::create_primitive(
                    device,
                    &self.prim_layout,
                    bytemuck::cast_slice(&vertices),
                    bytemuck::cast_slice(&mesh.indices),
                    mesh.indices.len() as u32,
                    wgpu::IndexFormat::Uint32,
                    PrimitiveUniforms {
                        model: Mat4::IDENTITY.to_cols_array_2d(),
                        color: mesh.base_color,
                    },
                    &mesh.name,
                )
            })
            .collect();
        tracing::debug!(meshes = self.model.len(), "model uploaded to GPU");
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: floor plane plus whatever model meshes are uploaded.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &OrbitCamera,
    ) {
        let settings = &scene.settings;
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&frame_uniforms(settings, camera)),
        );
        queue.write_buffer(
            &self.floor.uniform_buffer,
            0,
            bytemuck::bytes_of(&PrimitiveUniforms {
                model: floor_model(&settings.floor).to_cols_array_2d(),
                color: settings.floor.color.to_array4(1.0),
            }),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let bg = settings.background;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.r as f64,
                            g: bg.g as f64,
                            b: bg.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for prim in std::iter::once(&self.floor).chain(&self.model) {
                pass.set_bind_group(1, &prim.bind_group, &[]);
                pass.set_vertex_buffer(0, prim.vertex_buffer.slice(..));
                pass.set_index_buffer(prim.index_buffer.slice(..), prim.index_format);
                pass.draw_indexed(0..prim.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_mirror_fog_settings() {
        let settings = SceneSettings::default();
        let u = frame_uniforms(&settings, &OrbitCamera::default());
        assert_eq!(u.fog_params[0], settings.fog.near);
        assert_eq!(u.fog_params[1], settings.fog.far);
        assert_eq!(u.fog_color[..3], settings.fog.color.to_array());
    }

    #[test]
    fn spot_cone_edges_stay_ordered() {
        let mut settings = SceneSettings::default();
        settings.spot.penumbra = 0.0;
        let u = frame_uniforms(&settings, &OrbitCamera::default());
        // cos_inner must stay strictly above cos_outer for the smoothstep.
        assert!(u.spot_params[1] > u.spot_params[0]);

        settings.spot.penumbra = 1.0;
        let u = frame_uniforms(&settings, &OrbitCamera::default());
        assert!(u.spot_params[1] > u.spot_params[0]);
        assert!((u.spot_params[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn spot_points_at_the_origin() {
        let settings = SceneSettings::default();
        let u = frame_uniforms(&settings, &OrbitCamera::default());
        let dir = Vec3::new(u.spot_direction[0], u.spot_direction[1], u.spot_direction[2]);
        let expected = (-settings.spot.position).normalize();
        assert!((dir - expected).length() < 1e-6);
    }

    #[test]
    fn floor_transform_lays_the_quad_flat() {
        let floor = FloorSettings {
            color: sceneview_common::Color::rgb(1.0, 1.0, 1.0),
            height: 2.0,
            tilt: -std::f32::consts::FRAC_PI_2,
            size: 10.0,
        };
        let m = floor_model(&floor);
        // Local +Y corner of the unit quad ends up flat on the plane.
        let p = m.transform_point3(Vec3::new(0.0, 1.0, 0.0));
        assert!((p - Vec3::new(0.0, 2.0, -10.0)).length() < 1e-4);
        // Local +Z normal now points up.
        let n = m.transform_vector3(Vec3::Z).normalize();
        assert!((n - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn interleave_pairs_positions_with_normals() {
        let mesh = MeshData {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
            base_color: [1.0; 4],
        };
        let verts = interleave(&mesh);
        assert_eq!(verts.len(), 3);
        assert_eq!(verts[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(verts[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn floor_quad_faces_plus_z() {
        let (verts, indices) = floor_quad();
        assert_eq!(indices.len(), 6);
        for v in verts {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }
}

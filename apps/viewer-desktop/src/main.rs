use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use sceneview_assets::{BackgroundLoader, MeshData};
use sceneview_common::{Color, SurfaceExtent, Viewport, clamp_pixel_scale};
use sceneview_render::OrbitCamera;
use sceneview_render_wgpu::WgpuSceneRenderer;
use sceneview_scene::{Model, Scene};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "sceneview", about = "glTF scene viewer with a live-tweak panel")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// glTF scene to load
    #[arg(long, default_value = "models/scene.gltf")]
    model: PathBuf,

    /// Initial window width, logical pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height, logical pixels
    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// Viewer state independent of the GPU objects.
struct ViewerState {
    scene: Scene,
    camera: OrbitCamera,
    loader: Option<BackgroundLoader>,
    load_error: Option<String>,
    model_path: PathBuf,
    // Pointer offset from the window center, normalized to [-0.5, 0.5].
    // Captured on every move; nothing reads it while the parallax drift
    // below stays disabled.
    #[allow(dead_code)]
    pointer_offset: (f32, f32),
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    show_panel: bool,
    last_frame: Instant,
    frame_time_ms: f32,
}

impl ViewerState {
    fn new(model_path: PathBuf) -> Self {
        tracing::info!(path = %model_path.display(), "starting background asset load");
        let loader = BackgroundLoader::spawn(model_path.clone());
        Self {
            scene: Scene::default(),
            camera: OrbitCamera::default(),
            loader: Some(loader),
            load_error: None,
            model_path,
            pointer_offset: (0.0, 0.0),
            dragging: false,
            last_cursor: None,
            show_panel: true,
            last_frame: Instant::now(),
            frame_time_ms: 0.0,
        }
    }

    /// Check the background load. Returns decoded meshes exactly once, when
    /// they arrive; frames before that render with the model absent.
    fn poll_loader(&mut self) -> Option<Vec<MeshData>> {
        let result = self.loader.as_ref()?.poll()?;
        self.loader = None;
        match result {
            Ok(meshes) => Some(meshes),
            Err(e) => {
                // Fail loud, keep rendering. No retry.
                tracing::error!(path = %self.model_path.display(), error = %e, "model load failed");
                self.load_error = Some(e.to_string());
                None
            }
        }
    }

    /// Advance per-frame interactive state.
    fn update(&mut self, dt: f32) {
        self.camera.update(dt);

        // Parallax drift from the captured pointer offset. Left disabled;
        // the offset keeps being recorded for when this is revisited.
        // let (ox, oy) = self.pointer_offset;
        // self.camera.target.x = ox * 0.5;
        // self.camera.target.y = 1.0 + oy * 0.5;
    }

    fn handle_cursor(&mut self, x: f64, y: f64, viewport: Viewport) {
        let w = viewport.width.max(1) as f32;
        let h = viewport.height.max(1) as f32;
        self.pointer_offset = (x as f32 / w - 0.5, -(y as f32 / h - 0.5));

        if self.dragging {
            if let Some((px, py)) = self.last_cursor {
                self.camera.orbit((x - px) as f32, (y - py) as f32);
            }
        }
        self.last_cursor = Some((x, y));
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        egui::SidePanel::right("tweaks")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Scene");
                ui.separator();

                color_row(ui, "Background", &mut self.scene.settings.background);

                ui.collapsing("Fog", |ui| {
                    let fog = &mut self.scene.settings.fog;
                    color_row(ui, "Color", &mut fog.color);
                    drag_row(ui, "Near", &mut fog.near, 0.1);
                    drag_row(ui, "Far", &mut fog.far, 0.1);
                });

                ui.collapsing("Floor", |ui| {
                    let floor = &mut self.scene.settings.floor;
                    color_row(ui, "Color", &mut floor.color);
                    drag_row(ui, "Height", &mut floor.height, 0.05);
                    drag_row(ui, "Tilt", &mut floor.tilt, 0.01);
                });

                ui.collapsing("Spot light", |ui| {
                    let spot = &mut self.scene.settings.spot;
                    color_row(ui, "Color", &mut spot.color);
                    drag_row(ui, "Intensity", &mut spot.intensity, 0.05);
                    drag_row(ui, "Angle", &mut spot.angle, 0.01);
                    drag_row(ui, "Penumbra", &mut spot.penumbra, 0.01);
                    drag_row(ui, "Decay", &mut spot.decay, 0.01);
                    drag_row(ui, "Distance", &mut spot.distance, 0.1);
                    drag_row(ui, "Shadow radius", &mut spot.shadow_radius, 0.1);
                });

                ui.collapsing("Hemisphere light", |ui| {
                    let hemi = &mut self.scene.settings.hemisphere;
                    color_row(ui, "Sky", &mut hemi.sky_color);
                    color_row(ui, "Ground", &mut hemi.ground_color);
                    drag_row(ui, "Intensity", &mut hemi.intensity, 0.01);
                });

                ui.separator();
                match (self.scene.model(), &self.load_error) {
                    (Some(model), _) => {
                        ui.label(format!(
                            "Model: {} meshes, {} vertices",
                            model.meshes.len(),
                            model.vertex_count()
                        ));
                    }
                    (None, Some(err)) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, format!("Load failed: {err}"));
                    }
                    (None, None) => {
                        ui.label(format!("Loading {} ...", self.model_path.display()));
                    }
                }
                ui.label(format!("Frame: {:.1} ms", self.frame_time_ms));
                ui.separator();
                ui.small("F1: toggle panel | LMB drag: orbit | Wheel: dolly");
            });
    }
}

/// Direct two-way color binding onto a settings field.
fn color_row(ui: &mut egui::Ui, label: &str, color: &mut Color) {
    ui.horizontal(|ui| {
        let mut rgb = color.to_array();
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            *color = rgb.into();
        }
        ui.label(label);
    });
}

/// Direct two-way numeric binding onto a settings field.
fn drag_row(ui: &mut egui::Ui, label: &str, value: &mut f32, speed: f64) {
    ui.horizontal(|ui| {
        ui.add(egui::DragValue::new(value).speed(speed));
        ui.label(label);
    });
}

/// Pixel scale forwarded to the panel: the same clamp the surface extent
/// uses. Re-applied whenever the window's scale factor changes, since the
/// platform integration otherwise resets the panel to the raw factor.
fn panel_pixels_per_point(scale_factor: f64) -> f32 {
    clamp_pixel_scale(scale_factor) as f32
}

/// Surface extent and camera aspect for one window geometry.
///
/// Aspect comes from the physical size directly, so it equals width/height
/// exactly even when the clamped extent rounds each dimension on its own.
fn surface_geometry(physical: Viewport, scale_factor: f64) -> (SurfaceExtent, f32) {
    (
        SurfaceExtent::compute(physical, scale_factor),
        physical.aspect(),
    )
}

struct ViewerApp {
    state: ViewerState,
    initial_size: LogicalSize<u32>,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuSceneRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl ViewerApp {
    fn new(cli: &Cli) -> Self {
        Self {
            state: ViewerState::new(cli.model.clone()),
            initial_size: LogicalSize::new(cli.width.max(1), cli.height.max(1)),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    /// Recompute everything that depends on the window geometry: surface
    /// extent under the pixel-scale clamp, camera aspect, depth target.
    /// Derives only from the latest dimensions, so arbitrarily frequent
    /// resize events collapse to the final one.
    fn apply_window_geometry(&mut self) {
        let (Some(window), Some(surface), Some(device), Some(config)) = (
            &self.window,
            &self.surface,
            &self.device,
            &mut self.config,
        ) else {
            return;
        };

        let physical = window.inner_size();
        let (extent, aspect) = surface_geometry(
            Viewport::new(physical.width, physical.height),
            window.scale_factor(),
        );
        config.width = extent.width;
        config.height = extent.height;
        surface.configure(device, config);

        self.state.camera.set_aspect(aspect);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(device, extent.width, extent.height);
        }
        tracing::debug!(
            width = extent.width,
            height = extent.height,
            scale = window.scale_factor(),
            "surface reconfigured"
        );
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.frame_time_ms = dt * 1000.0;
        self.state.last_frame = now;
        self.state.update(dt);

        let (Some(surface), Some(device), Some(queue)) =
            (&self.surface, &self.device, &self.queue)
        else {
            return;
        };

        // Attach the model the moment the background load delivers it;
        // every frame before that draws the scene without it.
        if let Some(meshes) = self.state.poll_loader() {
            if let Some(renderer) = &mut self.renderer {
                renderer.set_model(device, &meshes);
            }
            self.state.scene.attach_model(Model::new(meshes));
        }

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(config) = &self.config {
                    surface.configure(device, config);
                }
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(renderer) = &self.renderer {
            renderer.render(device, queue, &view, &self.state.scene, &self.state.camera);
        }

        let raw_input = self
            .egui_winit
            .as_mut()
            .unwrap()
            .take_egui_input(self.window.as_ref().unwrap());
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });

        self.egui_winit.as_mut().unwrap().handle_platform_output(
            self.window.as_ref().unwrap(),
            full_output.platform_output,
        );

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.config.as_ref().unwrap().width,
                self.config.as_ref().unwrap().height,
            ],
            pixels_per_point: full_output.pixels_per_point,
        };

        {
            let egui_renderer = self.egui_renderer.as_mut().unwrap();
            for (id, image_delta) in &full_output.textures_delta.set {
                egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
            egui_renderer.update_buffers(
                device,
                queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            queue.submit(std::iter::once(encoder.finish()));
            for id in &full_output.textures_delta.free {
                egui_renderer.free_texture(id);
            }
        }

        output.present();
        // Self-scheduling: each frame requests the next.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("sceneview")
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("sceneview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let physical = window.inner_size();
        let (extent, aspect) = surface_geometry(
            Viewport::new(physical.width, physical.height),
            window.scale_factor(),
        );

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: extent.width,
            height: extent.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.camera.set_aspect(aspect);

        let renderer = WgpuSceneRenderer::new(&device, surface_format, extent.width, extent.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(panel_pixels_per_point(window.scale_factor())),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            width = extent.width,
            height = extent.height,
            "GPU initialized"
        );

        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                // Fires once per notification, arbitrarily often during a
                // continuous resize; each application is idempotent.
                self.apply_window_geometry();
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                // The platform integration just reset the panel scale to the
                // raw factor; clamp it again before reconfiguring.
                if let Some(window) = &self.window {
                    self.egui_ctx
                        .set_pixels_per_point(panel_pixels_per_point(window.scale_factor()));
                }
                self.apply_window_geometry();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::F1),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.state.show_panel = !self.state.show_panel;
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.dragging = btn_state == ElementState::Pressed;
                if !self.state.dragging {
                    self.state.last_cursor = None;
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let step = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * 0.5,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                };
                self.state.camera.dolly(-step);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.state.handle_cursor(
                        position.x,
                        position.y,
                        Viewport::new(size.width, size.height),
                    );
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("sceneview starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(&cli);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_scale_is_clamped_like_the_surface() {
        // The value handed to the panel on startup and after every
        // scale-factor change.
        assert_eq!(panel_pixels_per_point(3.0), 2.0);
        assert_eq!(panel_pixels_per_point(2.0), 2.0);
        assert_eq!(panel_pixels_per_point(1.5), 1.5);
    }

    #[test]
    fn camera_aspect_tracks_physical_size_exactly() {
        // 1919 wide at 3x: the clamped extent rounds to 1279x720, whose
        // ratio is not exactly 1919/1080. The camera must get the exact
        // physical ratio regardless.
        let physical = Viewport::new(1919, 1080);
        let (extent, aspect) = surface_geometry(physical, 3.0);
        assert_eq!(aspect, 1919.0 / 1080.0);
        assert_eq!(extent, SurfaceExtent { width: 1279, height: 720 });
    }

    #[test]
    fn geometry_is_idempotent_on_final_dimensions() {
        let a = surface_geometry(Viewport::new(1280, 720), 1.25);
        let b = surface_geometry(Viewport::new(1280, 720), 1.25);
        assert_eq!(a, b);
    }
}

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use heavens_assets::{
    AssetPaths, CONTAINER_TEXTURE, CubemapFaces, OVERLAY_TEXTURE, SKYBOX_DIR, SKYBOX_EXTENSION,
    TextureOptions, load_cubemap_or_fallback, load_texture_or_fallback,
};
use heavens_common::scene::{self, CAMERA_START};
use heavens_input::{Action, ActionState, Bindings};
use heavens_physics::{BouncingSphere, PhysicsSettings};
use heavens_render_wgpu::{FlyCamera, FrameScene, SceneRenderer, SceneTextures};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowId};

const CLEAR_COLOR: [f32; 4] = [0.0, 0.5, 1.0, 1.0];
const MAX_FRAME_DT: f32 = 0.1;
const FPS_WINDOW_SECS: f32 = 0.5;
/// Pixel scroll deltas are divided by this to match one wheel notch.
const PIXELS_PER_SCROLL_LINE: f32 = 20.0;

#[derive(Parser)]
#[command(name = "heavens-desktop", about = "Grey Heavens desktop demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Asset root (defaults to `assets/` next to the executable)
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value = "600")]
    height: u32,

    /// Open a normal window instead of borderless fullscreen
    #[arg(long)]
    windowed: bool,

    /// Present as fast as possible
    #[arg(long)]
    no_vsync: bool,

    /// Skip the bouncing sphere
    #[arg(long)]
    no_physics: bool,

    /// Window title
    #[arg(long, default_value = "Grey Heavens")]
    title: String,
}

/// Rolling frames-per-second estimate.
#[derive(Default)]
struct FpsCounter {
    frames: u32,
    elapsed: f32,
    value: f32,
}

impl FpsCounter {
    fn tick(&mut self, dt: f32) {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed >= FPS_WINDOW_SECS {
            self.value = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
        }
    }
}

/// Application state.
struct AppState {
    camera: FlyCamera,
    bindings: Bindings,
    actions: ActionState,
    physics: Option<BouncingSphere>,
    mouse_look: bool,
    show_overlay: bool,
    started: Instant,
    last_frame: Instant,
    fps: FpsCounter,
}

impl AppState {
    fn new(physics_enabled: bool) -> Self {
        let physics = physics_enabled.then(|| BouncingSphere::new(PhysicsSettings::default()));
        if physics.is_none() {
            tracing::info!("physics disabled");
        }
        let now = Instant::now();
        Self {
            camera: FlyCamera::new(CAMERA_START),
            bindings: Bindings::default(),
            actions: ActionState::new(),
            physics,
            mouse_look: true,
            show_overlay: false,
            started: now,
            last_frame: now,
            fps: FpsCounter::default(),
        }
    }

    /// Frame time since the last call, capped so a stall does not teleport
    /// the camera.
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(MAX_FRAME_DT);
        self.last_frame = now;
        self.fps.tick(dt);
        dt
    }

    fn update(&mut self, dt: f32) {
        let axes = self.actions.movement_axes();
        self.camera.fly(axes, dt * self.actions.speed_multiplier());

        if let Some(physics) = &mut self.physics {
            physics.advance(dt);
        }
    }

    /// Feed a key transition through the bindings. App-local one-shots are
    /// handled here; the ones that need the window are returned.
    fn handle_key(&mut self, key: KeyCode, pressed: bool) -> Option<Action> {
        let action = self.bindings.action_for(key)?;
        if !pressed {
            self.actions.release(action);
            return None;
        }
        if !self.actions.press(action) || !action.is_one_shot() {
            return None;
        }

        match action {
            Action::ToggleOverlay => {
                self.show_overlay = !self.show_overlay;
                None
            }
            Action::ResetPhysics => {
                if let Some(physics) = &mut self.physics {
                    physics.reset();
                }
                None
            }
            other => Some(other),
        }
    }

    /// Key transition as delivered by the window. The overlay may swallow
    /// presses, but releases always get through so nothing stays held.
    fn handle_key_event(
        &mut self,
        key: KeyCode,
        pressed: bool,
        ui_consumed: bool,
    ) -> Option<Action> {
        if pressed && ui_consumed {
            return None;
        }
        self.handle_key(key, pressed)
    }

    fn frame_scene(&self) -> FrameScene {
        let time = self.started.elapsed().as_secs_f32();
        FrameScene {
            clear_color: CLEAR_COLOR,
            floor: scene::floor_transform(),
            cubes: scene::cube_transforms(time),
            sphere: self.physics.as_ref().map(BouncingSphere::sphere_transform),
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_overlay {
            return;
        }

        egui::Window::new("Grey Heavens")
            .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.0}", self.fps.value));
                ui.separator();

                let cam = &self.camera;
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    cam.position.x, cam.position.y, cam.position.z
                ));
                ui.label(format!(
                    "Yaw {:.0}°  Pitch {:.0}°  FOV {:.0}°",
                    cam.yaw.to_degrees(),
                    cam.pitch.to_degrees(),
                    cam.fov.to_degrees()
                ));
                ui.separator();

                match &self.physics {
                    Some(physics) => {
                        let t = physics.sphere_transform();
                        let v = physics.sphere_velocity();
                        let contacts = physics.world().contact_stats();
                        ui.label(format!("Sphere height: {:.2}", t.position.y));
                        ui.label(format!("Sphere velocity: ({:.2}, {:.2}, {:.2})", v.x, v.y, v.z));
                        ui.label(format!(
                            "Contacts: {} started, {} touching",
                            contacts.started,
                            contacts.touching()
                        ));
                    }
                    None => {
                        ui.label("Physics disabled");
                    }
                }

                ui.separator();
                ui.small("WASD: Move | Space/Ctrl: Up/Down | Shift: Sprint");
                ui.small("Tab: Mouse look | Wheel: Zoom | R: Reset sphere");
                ui.small("F1: Toggle overlay | Esc: Quit");
            });
    }
}

/// Window, surface and every GPU-side object. Created together in
/// `resumed` so nothing is half-initialized.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
    egui_ctx: EguiContext,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, cli: &Cli, textures: &SceneTextures) -> Result<Self> {
        let mut attrs = Window::default_attributes()
            .with_title(cli.title.clone())
            .with_inner_size(PhysicalSize::new(cli.width.max(1), cli.height.max(1)));
        if !cli.windowed {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no GPU adapter can present to this window"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("heavens_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if cli.no_vsync {
                wgpu::PresentMode::AutoNoVsync
            } else {
                wgpu::PresentMode::AutoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = SceneRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            textures,
        );

        let egui_ctx = EguiContext::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend ({}x{}, {:?})",
            adapter.get_info().backend.to_str(),
            config.width,
            config.height,
            config.present_mode
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_ctx,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn set_cursor_captured(&self, captured: bool) {
        let grab = if captured {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            tracing::warn!("cursor grab not supported: {e}");
        }
        self.window.set_cursor_visible(!captured);
    }

    /// Scene, then the egui overlay on top, then present.
    fn draw_frame(&mut self, state: &AppState) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
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

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.camera,
            &state.frame_scene(),
        );

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
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
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

fn load_scene_textures(paths: &AssetPaths) -> SceneTextures {
    let opts = TextureOptions::default();
    SceneTextures {
        container: load_texture_or_fallback(paths.texture(CONTAINER_TEXTURE), &opts),
        overlay: load_texture_or_fallback(paths.texture(OVERLAY_TEXTURE), &opts),
        skybox: load_cubemap_or_fallback(&CubemapFaces::in_dir(
            paths.cubemap_dir(SKYBOX_DIR),
            SKYBOX_EXTENSION,
        )),
    }
}

struct GpuApp {
    cli: Cli,
    state: AppState,
    gpu: Option<Gpu>,
    init_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(cli: Cli) -> Self {
        let state = AppState::new(!cli.no_physics);
        Self {
            cli,
            state,
            gpu: None,
            init_error: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let paths = AssetPaths::discover(self.cli.assets.clone());
        tracing::info!("asset root: {}", paths.root().display());
        let textures = load_scene_textures(&paths);

        match Gpu::new(event_loop, &self.cli, &textures) {
            Ok(gpu) => {
                self.state
                    .camera
                    .set_viewport(gpu.config.width, gpu.config.height);
                gpu.set_cursor_captured(self.state.mouse_look);
                self.gpu = Some(gpu);
                self.state.last_frame = Instant::now();
            }
            Err(e) => {
                tracing::error!("startup failed: {e:#}");
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed && !matches!(event, WindowEvent::KeyboardInput { .. }) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size.width, new_size.height);
                self.state
                    .camera
                    .set_viewport(gpu.config.width, gpu.config.height);
            }
            WindowEvent::Focused(false) => {
                self.state.actions.clear();
                if self.state.mouse_look {
                    self.state.mouse_look = false;
                    gpu.set_cursor_captured(false);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => match self.state.handle_key_event(
                key,
                key_state == ElementState::Pressed,
                response.consumed,
            ) {
                Some(Action::Quit) => event_loop.exit(),
                Some(Action::ToggleMouseLook) => {
                    self.state.mouse_look = !self.state.mouse_look;
                    gpu.set_cursor_captured(self.state.mouse_look);
                }
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_SCROLL_LINE,
                };
                self.state.camera.zoom(lines);
            }
            WindowEvent::RedrawRequested => {
                let dt = self.state.tick();
                self.state.update(dt);
                gpu.draw_frame(&self.state);
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.mouse_look {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("heavens-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli);
    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_toggles_once_per_press() {
        let mut state = AppState::new(false);
        assert!(!state.show_overlay);

        assert_eq!(state.handle_key(KeyCode::F1, true), None);
        assert!(state.show_overlay);
        // Key repeat.
        state.handle_key(KeyCode::F1, true);
        assert!(state.show_overlay);

        state.handle_key(KeyCode::F1, false);
        state.handle_key(KeyCode::F1, true);
        assert!(!state.show_overlay);
    }

    #[test]
    fn window_actions_are_returned() {
        let mut state = AppState::new(false);
        assert_eq!(state.handle_key(KeyCode::Escape, true), Some(Action::Quit));
        assert_eq!(
            state.handle_key(KeyCode::Tab, true),
            Some(Action::ToggleMouseLook)
        );
        assert_eq!(state.handle_key(KeyCode::KeyW, true), None);
        assert_eq!(state.handle_key(KeyCode::KeyP, true), None);
    }

    #[test]
    fn held_forward_moves_camera() {
        let mut state = AppState::new(false);
        let start = state.camera.position;
        state.handle_key(KeyCode::KeyW, true);
        state.update(0.1);
        assert!(state.camera.position.z < start.z);

        state.handle_key(KeyCode::KeyW, false);
        let stopped = state.camera.position;
        state.update(0.1);
        assert_eq!(state.camera.position, stopped);
    }

    #[test]
    fn release_swallowed_by_overlay_still_stops_movement() {
        let mut state = AppState::new(false);
        state.handle_key_event(KeyCode::KeyW, true, false);
        assert!(state.actions.is_held(Action::MoveForward));

        state.handle_key_event(KeyCode::KeyW, false, true);
        assert!(!state.actions.is_held(Action::MoveForward));
        let stopped = state.camera.position;
        state.update(0.1);
        assert_eq!(state.camera.position, stopped);
    }

    #[test]
    fn press_swallowed_by_overlay_is_ignored() {
        let mut state = AppState::new(false);
        assert_eq!(state.handle_key_event(KeyCode::Escape, true, true), None);
        assert!(!state.actions.is_held(Action::Quit));
        assert_eq!(
            state.handle_key_event(KeyCode::Escape, true, false),
            Some(Action::Quit)
        );
    }

    #[test]
    fn frame_scene_follows_physics_toggle() {
        let with = AppState::new(true).frame_scene();
        assert_eq!(with.cubes.len(), scene::CUBE_POSITIONS.len());
        assert!(with.sphere.is_some());
        assert_eq!(with.clear_color, CLEAR_COLOR);

        let without = AppState::new(false).frame_scene();
        assert!(without.sphere.is_none());
    }

    #[test]
    fn reset_key_returns_sphere_to_spawn() {
        let mut state = AppState::new(true);
        for _ in 0..30 {
            state.update(1.0 / 30.0);
        }
        state.handle_key(KeyCode::KeyR, true);
        let sphere = state.frame_scene().sphere.unwrap_or_default();
        assert!((sphere.position - scene::SPHERE_SPAWN).length() < 1e-4);
    }

    #[test]
    fn fps_counter_averages_over_window() {
        let mut fps = FpsCounter::default();
        for _ in 0..30 {
            fps.tick(1.0 / 60.0);
        }
        assert!((fps.value - 60.0).abs() < 0.5);
    }
}

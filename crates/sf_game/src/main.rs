//! Scream Frog -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All simulation
//! runs inside `RedrawRequested` using a **fixed-timestep** model (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- one `SceneDriver::tick` per fixed slice
//!   3. Rebuild the sprite mesh from the current scene's draw list
//!   4. Upload camera uniform, issue draw calls, composite the egui menus/debug panel
//!   5. Apply whatever the menu buttons asked for
//!
//! Startup is strict: a broken level file or a missing microphone ends the process
//! before the window opens. Missing sprite images only degrade to placeholders.

mod collision;
mod entity;
mod flow;
mod gameplay;
mod level;
mod player;
#[cfg(test)]
mod replay;
mod sprites;

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use flow::SceneDriver;
use gameplay::DrawCommand;
use level::{load_level_from_path, LevelError};
use sf_core::config::{load_config_or_default, GameConfig};
use sf_core::input::{InputState, Key};
use sf_core::loudness::LoudnessSlot;
use sf_core::time::TimeState;
use sf_overlay::{MenuScreen, Overlay};
use sf_platform::window::PlatformConfig;
use sf_render::batch::WHITE;
use sf_render::{
    Camera2D, GpuContext, QuadSpec, SpriteBatch, SpritePipeline, SpriteVertex, Texture,
};
use sprites::SpriteBank;

const CONFIG_PATH: &str = "assets/config/game.json";

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// All mutable engine state lives here. Constructed lazily in `ApplicationHandler::resumed`
/// once the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    overlay: Overlay,

    driver: SceneDriver,
    sprites: SpriteBank,
    loudness: LoudnessSlot,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,

    // The sprite mesh is rebuilt on the CPU each frame, then streamed into these
    // GPU buffers. Buffers grow (power-of-two) but never shrink.
    batch: SpriteBatch,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, game: GameSetup) -> Result<Self, String> {
        let GameSetup {
            config,
            mut sprites,
            loudness,
        } = game;
        let gpu = GpuContext::new(window.clone()).map_err(|err| err.to_string())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let overlay = Overlay::new(&gpu.device, gpu.surface_format, &window);

        // World units are logical pixels, whatever the surface's physical size.
        let camera = Camera2D::new(config.window_width, config.window_height);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let textures = upload_sprite_textures(&gpu, &sprite_pipeline, &sprites);
        sprites.release_images();

        let driver = SceneDriver::new(&config, StdRng::from_os_rng());
        let mut state = Self {
            window,
            vertex_buffer: create_vertex_buffer(&gpu.device, 1),
            index_buffer: create_index_buffer(&gpu.device, 1),
            gpu,
            time: TimeState::new(config.fps),
            input: InputState::new(),
            camera,
            sprite_pipeline,
            overlay,
            driver,
            sprites,
            loudness,
            textures,
            batch: SpriteBatch::with_capacity(64),
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        };
        state.ensure_mesh_capacity(4, 6);
        Ok(state)
    }

    /// Fixed-step simulation phase. Returns `Ok(false)` when the game should exit.
    fn update(&mut self) -> Result<bool, LevelError> {
        self.time.begin_frame();
        while self.time.should_step() {
            if self.input.is_just_pressed(Key::F3) {
                self.overlay.toggle_debug();
            }
            let running = self.driver.tick(
                &self.input,
                self.loudness.load(),
                self.time.game_time,
                &self.sprites,
            )?;
            // Edges are consumed per tick, so one Space press is one jump.
            self.input.end_frame();
            if !running {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn render(&mut self) -> Result<bool, LevelError> {
        let now = self.time.game_time;
        self.camera.position.x = self.driver.camera_offset() as f32;
        let commands = self.driver.draw_list(&self.sprites, now);
        self.rebuild_mesh(commands);

        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some(frame) = self.gpu.acquire_frame() else {
            return Ok(true);
        };

        let menu = MenuScreen::for_scene(self.driver.scene(), self.driver.session());
        let mut stats = self.driver.debug_stats(self.loudness.load());
        stats.draw_calls = self.batch.draw_calls.len() as u32;
        stats.texture_binds = self.batch.texture_binds() as u32;
        stats.sprite_count = self.batch.quad_count() as u32;
        let (egui_primitives, egui_textures_delta, menu_response) =
            self.overlay.prepare(&self.window, &self.time, menu, &stats);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut last_bound_texture_key: Option<&Arc<str>> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.batch.draw_calls {
                let Some(texture) = self.textures.get(&draw.texture_key) else {
                    continue;
                };
                let need_rebind = match last_bound_texture_key {
                    Some(last) => **last != *draw.texture_key,
                    None => true,
                };
                if need_rebind {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound_texture_key = Some(&draw.texture_key);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
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

            self.overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        // Menu clicks take effect between frames, never inside a tick.
        if let Some(threshold) = menu_response.threshold {
            self.driver.set_threshold(threshold);
        }
        self.driver.apply(menu_response.flow, &self.sprites)
    }

    fn rebuild_mesh(&mut self, commands: Vec<DrawCommand>) {
        self.batch.clear();
        for command in commands {
            self.batch.add_quad(QuadSpec {
                texture_key: command.texture_key,
                x: command.x,
                y: command.y,
                width: command.width,
                height: command.height,
                color: WHITE,
            });
        }

        let (vertex_count, index_count) = (self.batch.vertices.len(), self.batch.indices.len());
        self.ensure_mesh_capacity(vertex_count, index_count);
        if vertex_count > 0 {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.batch.vertices),
            );
        }
        if index_count > 0 {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.batch.indices));
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }
}

/// Everything loaded before the window exists.
struct GameSetup {
    config: GameConfig,
    sprites: SpriteBank,
    loudness: LoudnessSlot,
}

struct App {
    config: PlatformConfig,
    setup: Option<GameSetup>,
    state: Option<EngineState>,
    exit_code: ExitCode,
}

impl App {
    fn new(setup: GameSetup) -> Self {
        Self {
            config: PlatformConfig::from_game_config(&setup.config),
            setup: Some(setup),
            state: None,
            exit_code: ExitCode::SUCCESS,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, message: &str) {
        log::error!("{message}");
        self.exit_code = ExitCode::FAILURE;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(setup) = self.setup.take() else {
            return;
        };
        let window = match sf_platform::create_window(event_loop, &self.config) {
            Ok(window) => window,
            Err(err) => {
                self.fail(event_loop, &format!("Window creation failed: {err}"));
                return;
            }
        };
        match EngineState::new(window, setup) {
            Ok(state) => self.state = Some(state),
            Err(err) => self.fail(event_loop, &format!("GPU init failed: {err}")),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                // Routed through the input state so the active scene sees it.
                state.input.request_quit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => state.input.reset(),

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }
                let frame = state
                    .update()
                    .and_then(|running| if running { state.render() } else { Ok(false) });
                match frame {
                    Ok(true) => {}
                    Ok(false) => event_loop.exit(),
                    Err(err) => self.fail(event_loop, &format!("Cannot start the level: {err}")),
                }
            }

            _ => {}
        }
    }
}

fn upload_sprite_textures(
    gpu: &GpuContext,
    pipeline: &SpritePipeline,
    sprites: &SpriteBank,
) -> HashMap<Arc<str>, GpuSpriteTexture> {
    let mut textures = HashMap::with_capacity(sprites.images().len());
    for (key, image) in sprites.images() {
        let texture = Texture::from_image(&gpu.device, &gpu.queue, image, key);
        let bind_group = pipeline.create_texture_bind_group(&gpu.device, &texture);
        textures.insert(
            key.clone(),
            GpuSpriteTexture {
                texture,
                bind_group,
            },
        );
    }
    let bytes: u64 = textures
        .values()
        .map(|t| u64::from(t.texture.size.0) * u64::from(t.texture.size.1) * 4)
        .sum();
    log::info!(
        "Uploaded {} sprite textures ({:.1} MB)",
        textures.len(),
        bytes as f64 / (1024.0 * 1024.0)
    );
    textures
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Scream Frog starting...");

    let config = load_config_or_default(Path::new(CONFIG_PATH));
    let level = match load_level_from_path(Path::new(&config.level_path)) {
        Ok(level) => level,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let sprites = SpriteBank::load(
        Path::new(&config.asset_root),
        level.tile_size.max(1) as u32,
        config.window_height,
    );

    let loudness = LoudnessSlot::new();
    if let Err(err) = sf_platform::spawn_loudness_sampler(loudness.clone()) {
        log::error!("Microphone unavailable: {err}");
        return ExitCode::FAILURE;
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(GameSetup {
        config,
        sprites,
        loudness,
    });
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
        return ExitCode::FAILURE;
    }
    app.exit_code
}

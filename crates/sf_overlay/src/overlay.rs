//! egui layer drawn on top of the sprite pass: scene menus and the F3 debug panel.
//!
//! Integration pattern: `egui_wgpu::Renderer::render()` needs a
//! `RenderPass<'static>`, while `begin_render_pass` borrows the encoder, so a
//! frame goes through four phases:
//!
//!   1. `prepare()` -- run the UI, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! Window events always reach egui so menu buttons work; the debug panel only
//! runs while `debug_visible` is set.

use sf_core::session::SceneId;
use sf_core::time::TimeState;
use winit::window::Window;

use crate::menus::{show_menu, MenuResponse, MenuScreen};

#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub scene: Option<SceneId>,
    pub loudness: f32,
    pub threshold: u32,
    pub mic_level: &'static str,
    pub pose: String,
    pub x_vel: i32,
    pub y_vel: f32,
    pub jump_count: u8,
    pub entity_count: usize,
    pub camera_offset: i32,
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub sprite_count: u32,
}

pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl Overlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug panel: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        menu: Option<MenuScreen>,
        stats: &DebugStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        MenuResponse,
    ) {
        let mut response = MenuResponse::default();
        let debug_visible = self.debug_visible;
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(screen) = menu {
                response = show_menu(ctx, screen);
            }
            if debug_visible {
                debug_panel(ctx, time, stats);
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, response)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn debug_panel(ctx: &egui::Context, time: &TimeState, stats: &DebugStats) {
    egui::Window::new("Debug")
        .default_pos([10.0, 120.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", time.smoothed_fps));
            ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
            ui.label(format!("Steps this frame: {}", time.steps_this_frame));
            ui.label(format!("Total steps: {}", time.fixed_step_count));
            if let Some(scene) = stats.scene {
                ui.label(format!("Scene: {scene}"));
            }

            ui.separator();
            ui.label(format!(
                "Loudness: {:.1} / {} ({})",
                stats.loudness, stats.threshold, stats.mic_level
            ));

            ui.separator();
            ui.label(format!("Pose: {}", stats.pose));
            ui.label(format!("Velocity: ({}, {:.2})", stats.x_vel, stats.y_vel));
            ui.label(format!("Jumps: {}", stats.jump_count));
            ui.label(format!("Entities: {}", stats.entity_count));
            ui.label(format!("Camera offset: {}", stats.camera_offset));

            ui.separator();
            ui.label(format!("Draw calls: {}", stats.draw_calls));
            ui.label(format!("Texture binds: {}", stats.texture_binds));
            ui.label(format!("Sprites: {}", stats.sprite_count));
        });
}

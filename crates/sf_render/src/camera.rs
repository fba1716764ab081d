//! Screen-space 2D camera.
//!
//! World coordinates match the level layout: origin at the top-left, y grows
//! downward, one unit per logical pixel. The camera only ever scrolls
//! horizontally in play, but `position` is a full `Vec2`.

use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

pub struct Camera2D {
    /// World position shown at the top-left corner of the viewport.
    pub position: Vec2,
    pub zoom: f32,
    /// Visible area in logical pixels.
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let width = self.viewport.0 as f32 / self.zoom;
        let height = self.viewport.1 as f32 / self.zoom;
        // bottom > top flips the y axis so +y points down the screen.
        Mat4::orthographic_rh(
            self.position.x,
            self.position.x + width,
            self.position.y + height,
            self.position.y,
            -1.0,
            1.0,
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
        }
    }
}

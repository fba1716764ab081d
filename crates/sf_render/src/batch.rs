//! CPU-side sprite mesh, rebuilt every frame and streamed into GPU buffers.
//!
//! Quads are appended in paint order. Consecutive quads that share a texture
//! collapse into one draw call, so the render pass only rebinds a texture
//! when the key actually changes.

use std::sync::Arc;

use crate::vertex::SpriteVertex;

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

/// One axis-aligned quad, positioned by its top-left corner in world pixels.
#[derive(Debug, Clone)]
pub struct QuadSpec {
    pub texture_key: Arc<str>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Default)]
pub struct SpriteBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            draw_calls: Vec::with_capacity(16),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn add_quad(&mut self, spec: QuadSpec) {
        let base_index = self.vertices.len() as u32;
        let (left, top) = (spec.x, spec.y);
        let (right, bottom) = (spec.x + spec.width, spec.y + spec.height);

        self.vertices.push(SpriteVertex {
            position: [left, top],
            uv: [0.0, 0.0],
            color: spec.color,
        });
        self.vertices.push(SpriteVertex {
            position: [right, top],
            uv: [1.0, 0.0],
            color: spec.color,
        });
        self.vertices.push(SpriteVertex {
            position: [right, bottom],
            uv: [1.0, 1.0],
            color: spec.color,
        });
        self.vertices.push(SpriteVertex {
            position: [left, bottom],
            uv: [0.0, 1.0],
            color: spec.color,
        });

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        push_draw_call(&mut self.draw_calls, spec.texture_key, draw_start, 6);
    }

    /// Number of texture rebinds the current draw list needs.
    pub fn texture_binds(&self) -> usize {
        let mut binds = 0usize;
        let mut current: Option<&str> = None;
        for draw in &self.draw_calls {
            let key: &str = &draw.texture_key;
            if current != Some(key) {
                current = Some(key);
                binds += 1;
            }
        }
        binds
    }
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if *last.texture_key == *texture_key && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_key,
        index_start,
        index_count,
    });
}

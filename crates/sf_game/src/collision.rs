//! Pixel-mask collision between the player and level entities.
//!
//! Every sprite frame carries a [`Mask`] built from its alpha channel, and an
//! entity or the player always tests with the mask of the frame it currently
//! shows. Two sprites collide when any pixel is set in both masks once they are
//! placed at their rects' top-left corners. Rects alone are only used for the
//! coarse finish-line test.
//!
//! Movement is resolved the way the level was tuned for:
//!  - horizontal moves are *probed* (would the player overlap something if it
//!    moved `dx`?) and simply refused when blocked;
//!  - vertical moves are applied first, then every overlapping solid snaps the
//!    player back onto its top (landing) or under its bottom (head bump).

use crate::entity::Entity;
use crate::player::Player;

/// Integer pixel rectangle, top-left anchored, y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn set_bottom(&mut self, bottom: i32) {
        self.y = bottom - self.h;
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Strict overlap: rects that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// One bit per pixel: set where the frame is opaque enough to collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub const ALPHA_THRESHOLD: u8 = 127;

    pub fn full(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; (width * height) as usize],
        }
    }

    pub fn from_image(image: &image::RgbaImage) -> Self {
        let bits = image
            .pixels()
            .map(|pixel| pixel.0[3] > Self::ALPHA_THRESHOLD)
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            bits,
        }
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[(y as u32 * self.width + x as u32) as usize]
    }

    #[allow(dead_code)]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&bit| bit).count()
    }

    /// True if any bit is set in both masks with `other`'s origin placed at
    /// `(offset_x, offset_y)` in this mask's coordinates.
    pub fn overlaps(&self, other: &Mask, offset_x: i32, offset_y: i32) -> bool {
        let x0 = offset_x.max(0);
        let y0 = offset_y.max(0);
        let x1 = (self.width as i32).min(offset_x + other.width as i32);
        let y1 = (self.height as i32).min(offset_y + other.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return false;
        }
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - offset_x, y - offset_y) {
                    return true;
                }
            }
        }
        false
    }
}

pub fn sprites_overlap(a_rect: &Rect, a_mask: &Mask, b_rect: &Rect, b_mask: &Mask) -> bool {
    a_mask.overlaps(b_mask, b_rect.x - a_rect.x, b_rect.y - a_rect.y)
}

/// Index of the first solid entity the player would overlap after moving `dx`.
///
/// Tests a shifted copy of the player's rect, so the player is never moved.
pub fn probe_horizontal(player: &Player, entities: &[Entity], dx: i32) -> Option<usize> {
    let probe = player.rect.translated(dx, 0);
    let mask = &player.frame.mask;
    entities
        .iter()
        .position(|entity| entity.is_solid() && sprites_overlap(&probe, mask, &entity.rect, &entity.frame.mask))
}

/// Pushes the player out of every solid it overlaps after a vertical move of `dy`.
///
/// Moving down snaps the player onto the entity and lands it; moving up snaps it
/// below the entity. Each entity is tested against the rect left by earlier
/// snaps. Returns the indices of all entities touched, in level order.
pub fn resolve_vertical(player: &mut Player, entities: &[Entity], dy: f32) -> Vec<usize> {
    let mut collided = Vec::new();
    for (index, entity) in entities.iter().enumerate() {
        if !entity.is_solid() {
            continue;
        }
        if !sprites_overlap(&player.rect, &player.frame.mask, &entity.rect, &entity.frame.mask) {
            continue;
        }
        if dy > 0.0 {
            player.rect.set_bottom(entity.rect.y);
            player.landed();
        } else if dy < 0.0 {
            player.rect.y = entity.rect.bottom();
            player.hit_head();
        }
        collided.push(index);
    }
    collided
}

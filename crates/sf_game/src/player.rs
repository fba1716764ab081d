//! The frog: velocity integration, jump bookkeeping and pose-driven animation.

use sf_core::animation::FrameClock;

use crate::collision::Rect;
use crate::sprites::{self, SpriteBank, SpriteFrame};

pub const GRAVITY: f32 = 1.0;
pub const ANIMATION_DELAY: u32 = 3;
pub const SPAWN: (i32, i32) = (50, 200);
pub const JUMP_LIMIT: u8 = 2;
const JUMP_IMPULSE: f32 = -8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Idle,
    Run,
    Jump,
    DoubleJump,
    Fall,
    Hit,
}

impl Pose {
    pub fn label(self) -> &'static str {
        match self {
            Pose::Idle => "idle",
            Pose::Run => "run",
            Pose::Jump => "jump",
            Pose::DoubleJump => "double_jump",
            Pose::Fall => "fall",
            Pose::Hit => "hit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub rect: Rect,
    pub x_vel: i32,
    /// Fractional so gravity can build up below one pixel per tick.
    pub y_vel: f32,
    pub direction: Direction,
    pub jump_count: u8,
    /// Ticks since the player last stood on something.
    pub fall_count: u32,
    pub hit: bool,
    pub hit_count: u32,
    pub animation: FrameClock,
    pub pose: Pose,
    pub frame: SpriteFrame,
}

impl Player {
    pub fn new(sprites: &SpriteBank) -> Self {
        let direction = Direction::Left;
        let frame = sprites.first_frame_or_blank(
            &sprites::frog_clip(Pose::Idle.label(), direction.label()),
            (64, 64),
        );
        Self {
            rect: Rect::new(SPAWN.0, SPAWN.1, frame.width as i32, frame.height as i32),
            x_vel: 0,
            y_vel: 0.0,
            direction,
            jump_count: 0,
            fall_count: 0,
            hit: false,
            hit_count: 0,
            animation: FrameClock::new(ANIMATION_DELAY),
            pose: Pose::Idle,
            frame,
        }
    }

    pub fn can_jump(&self) -> bool {
        self.jump_count < JUMP_LIMIT
    }

    /// Starts a jump. Does nothing once both jumps are spent.
    pub fn jump(&mut self) -> bool {
        if !self.can_jump() {
            return false;
        }
        self.y_vel = JUMP_IMPULSE * GRAVITY;
        self.animation.reset();
        self.jump_count += 1;
        if self.jump_count == 1 {
            self.fall_count = 0;
        }
        true
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.rect.x += dx;
        self.rect.y += dy;
    }

    pub fn move_left(&mut self, vel: i32) {
        self.x_vel = -vel;
        self.face(Direction::Left);
    }

    pub fn move_right(&mut self, vel: i32) {
        self.x_vel = vel;
        self.face(Direction::Right);
    }

    fn face(&mut self, direction: Direction) {
        if self.direction != direction {
            self.direction = direction;
            self.animation.reset();
        }
    }

    pub fn make_hit(&mut self) {
        self.hit = true;
    }

    /// One simulation tick at `fps` ticks per second.
    pub fn tick(&mut self, fps: u32, sprites: &SpriteBank) {
        let fps = fps.max(1);
        self.y_vel += (self.fall_count as f32 / fps as f32 * GRAVITY).min(1.0);
        self.move_by(self.x_vel, self.y_vel.trunc() as i32);

        if self.hit {
            self.hit_count += 1;
        }
        if self.hit_count > fps {
            self.hit = false;
            self.hit_count = 0;
        }

        self.fall_count += 1;
        self.update_sprite(sprites);
    }

    pub fn landed(&mut self) {
        self.fall_count = 0;
        self.y_vel = 0.0;
        self.jump_count = 0;
    }

    /// Bumping into a ceiling keeps the current velocity.
    pub fn hit_head(&mut self) {}

    pub fn current_pose(&self) -> Pose {
        if self.hit {
            Pose::Hit
        } else if self.y_vel < 0.0 && self.jump_count == 1 {
            Pose::Jump
        } else if self.y_vel < 0.0 && self.jump_count == 2 {
            Pose::DoubleJump
        } else if self.y_vel > 2.0 * GRAVITY {
            Pose::Fall
        } else if self.x_vel != 0 {
            Pose::Run
        } else {
            Pose::Idle
        }
    }

    fn update_sprite(&mut self, sprites: &SpriteBank) {
        self.pose = self.current_pose();
        let clip = sprites.clip(&sprites::frog_clip(self.pose.label(), self.direction.label()));
        if clip.is_empty() {
            return;
        }
        self.frame = clip[self.animation.tick(clip.len())].clone();
        self.rect.w = self.frame.width as i32;
        self.rect.h = self.frame.height as i32;
    }
}

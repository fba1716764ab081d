//! Keyboard state with level-triggered (`is_held`) and edge-triggered
//! (`is_just_pressed` / `is_just_released`) queries.
//!
//! Edge state is cleared by `end_frame()`, which the window loop only calls
//! after at least one fixed tick consumed it, so a press landing on a frame with
//! zero ticks is not lost.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Space,
    Escape,
    R,
    F3,
}

const KEY_COUNT: usize = 6;

impl Key {
    pub const ALL: [Key; KEY_COUNT] = [
        Key::Left,
        Key::Right,
        Key::Space,
        Key::Escape,
        Key::R,
        Key::F3,
    ];

    const fn index(self) -> usize {
        match self {
            Key::Left => 0,
            Key::Right => 1,
            Key::Space => 2,
            Key::Escape => 3,
            Key::R => 4,
            Key::F3 => 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: [bool; KEY_COUNT],
    just_pressed: [bool; KEY_COUNT],
    just_released: [bool; KEY_COUNT],
    quit_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        let i = key.index();
        // OS key repeat delivers extra presses while held; only the first counts.
        if !self.held[i] {
            self.held[i] = true;
            self.just_pressed[i] = true;
        }
    }

    pub fn key_up(&mut self, key: Key) {
        let i = key.index();
        if self.held[i] {
            self.held[i] = false;
            self.just_released[i] = true;
        }
    }

    /// Window close button. Sticky until `reset()`.
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed[key.index()]
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released[key.index()]
    }

    pub fn end_frame(&mut self) {
        self.just_pressed = [false; KEY_COUNT];
        self.just_released = [false; KEY_COUNT];
    }

    /// Drops every held key, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

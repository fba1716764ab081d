//! Session-wide state handed explicitly to every scene.
//!
//! The loudness threshold and the scene identifier live for the whole process
//! and survive scene changes. Scenes never mutate the current scene directly;
//! they return a [`SceneFlow`] and the driver applies it through
//! [`SessionContext::transition`], which enforces the transition table.

use std::fmt;

pub const THRESHOLD_MIN: u32 = 100;
pub const THRESHOLD_MAX: u32 = 300;
pub const DEFAULT_THRESHOLD: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneId {
    Start,
    Game,
    Restart,
    Settings,
}

impl SceneId {
    pub fn can_transition_to(self, next: SceneId) -> bool {
        matches!(
            (self, next),
            (SceneId::Start, SceneId::Game)
                | (SceneId::Start, SceneId::Settings)
                | (SceneId::Game, SceneId::Restart)
                | (SceneId::Restart, SceneId::Game)
                | (SceneId::Restart, SceneId::Settings)
                | (SceneId::Settings, SceneId::Start)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            SceneId::Start => "start",
            SceneId::Game => "game",
            SceneId::Restart => "restart",
            SceneId::Settings => "settings",
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a scene handler wants after a tick or a UI frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFlow {
    Continue,
    Goto(SceneId),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

impl Outcome {
    pub fn banner(self) -> &'static str {
        match self {
            Outcome::Won => "YOU WON!",
            Outcome::Lost => "YOU LOSE!",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    loudness_threshold: u32,
    current_scene: SceneId,
    pub last_outcome: Option<Outcome>,
}

impl SessionContext {
    pub fn new(threshold: u32) -> Self {
        Self {
            loudness_threshold: threshold.clamp(THRESHOLD_MIN, THRESHOLD_MAX),
            current_scene: SceneId::Start,
            last_outcome: None,
        }
    }

    pub fn loudness_threshold(&self) -> u32 {
        self.loudness_threshold
    }

    /// Stores `value` clamped into `[THRESHOLD_MIN, THRESHOLD_MAX]` and returns what was stored.
    pub fn set_loudness_threshold(&mut self, value: u32) -> u32 {
        self.loudness_threshold = value.clamp(THRESHOLD_MIN, THRESHOLD_MAX);
        self.loudness_threshold
    }

    pub fn current_scene(&self) -> SceneId {
        self.current_scene
    }

    /// Moves to `next` if the transition table allows it.
    pub fn transition(&mut self, next: SceneId) -> Result<(), String> {
        if !self.current_scene.can_transition_to(next) {
            return Err(format!(
                "scene transition {} -> {} is not allowed",
                self.current_scene, next
            ));
        }
        log::info!("Scene: {} -> {}", self.current_scene, next);
        self.current_scene = next;
        Ok(())
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

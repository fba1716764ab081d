//! Scene driver: owns the session and the running game, applies scene flows.
//!
//! Menus are drawn and clicked through egui in the render pass; the fixed tick
//! only drives the game scene and the quit keys.

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sf_core::config::GameConfig;
use sf_core::input::{InputState, Key};
use sf_core::session::{SceneFlow, SceneId, SessionContext};
use sf_overlay::DebugStats;

use crate::gameplay::{DrawCommand, GameScene, GameTuning, TickInput};
use crate::level::{build_level, load_level_from_path, LevelError};
use crate::sprites::{self, SpriteBank};

pub struct SceneDriver {
    session: SessionContext,
    game: Option<GameScene>,
    level_path: PathBuf,
    tuning: GameTuning,
    rng: StdRng,
}

impl SceneDriver {
    pub fn new(config: &GameConfig, rng: StdRng) -> Self {
        Self {
            session: SessionContext::new(config.default_threshold),
            game: None,
            level_path: PathBuf::from(&config.level_path),
            tuning: GameTuning::from_config(config),
            rng,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn scene(&self) -> SceneId {
        self.session.current_scene()
    }

    #[allow(dead_code)]
    pub fn game(&self) -> Option<&GameScene> {
        self.game.as_ref()
    }

    pub fn set_threshold(&mut self, value: u32) {
        let stored = self.session.set_loudness_threshold(value);
        log::debug!("Loudness threshold set to {stored}");
    }

    /// Runs one fixed tick. Returns `Ok(false)` once the game should exit.
    pub fn tick(
        &mut self,
        keys: &InputState,
        loudness: f32,
        now: Duration,
        sprites: &SpriteBank,
    ) -> Result<bool, LevelError> {
        let flow = match (self.session.current_scene(), self.game.as_mut()) {
            (SceneId::Game, Some(game)) => game.step(
                &TickInput {
                    keys,
                    loudness,
                    threshold: self.session.loudness_threshold(),
                    now,
                },
                sprites,
            ),
            _ if keys.quit_requested() || keys.is_just_pressed(Key::Escape) => SceneFlow::Quit,
            _ => SceneFlow::Continue,
        };
        self.apply(flow, sprites)
    }

    /// Applies a flow from the game scene or a menu. Illegal transitions are
    /// logged and ignored.
    pub fn apply(&mut self, flow: SceneFlow, sprites: &SpriteBank) -> Result<bool, LevelError> {
        let next = match flow {
            SceneFlow::Continue => return Ok(true),
            SceneFlow::Quit => {
                log::info!("Quit requested in scene {}", self.session.current_scene());
                return Ok(false);
            }
            SceneFlow::Goto(next) => next,
        };
        // The level loads before the scene changes, so a failed load leaves
        // the session where it was.
        let loaded = if next == SceneId::Game
            && self.session.current_scene().can_transition_to(next)
        {
            Some(self.load_game(sprites)?)
        } else {
            None
        };
        if let Err(err) = self.session.transition(next) {
            log::warn!("{err}");
            return Ok(true);
        }
        match next {
            SceneId::Game => self.game = loaded,
            SceneId::Restart => {
                // The last game frame stays on screen behind the restart menu.
                self.session.last_outcome = self.game.as_ref().and_then(GameScene::outcome);
                if let Some(outcome) = self.session.last_outcome {
                    log::info!("Run over: {}", outcome.banner());
                }
            }
            SceneId::Start | SceneId::Settings => self.game = None,
        }
        Ok(true)
    }

    fn load_game(&mut self, sprites: &SpriteBank) -> Result<GameScene, LevelError> {
        let file = load_level_from_path(&self.level_path)?;
        let level = build_level(&file, sprites);
        let rng = StdRng::seed_from_u64(self.rng.random());
        Ok(GameScene::new(level, sprites, self.tuning, rng))
    }

    /// World-space quads for the current scene; menus add their widgets on top.
    pub fn draw_list(&self, sprites: &SpriteBank, now: Duration) -> Vec<DrawCommand> {
        match (self.session.current_scene(), self.game.as_ref()) {
            (SceneId::Game | SceneId::Restart, Some(game)) => game.draw_list(sprites, now),
            _ => sprites
                .first_frame(sprites::MENU_BACKGROUND)
                .map(|frame| {
                    vec![DrawCommand {
                        texture_key: frame.texture_key,
                        x: 0.0,
                        y: 0.0,
                        width: frame.width as f32,
                        height: frame.height as f32,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    pub fn camera_offset(&self) -> i32 {
        match self.session.current_scene() {
            SceneId::Game | SceneId::Restart => {
                self.game.as_ref().map_or(0, GameScene::camera_offset)
            }
            SceneId::Start | SceneId::Settings => 0,
        }
    }

    pub fn debug_stats(&self, loudness: f32) -> DebugStats {
        let mut stats = DebugStats {
            scene: Some(self.session.current_scene()),
            loudness,
            threshold: self.session.loudness_threshold(),
            camera_offset: self.camera_offset(),
            ..DebugStats::default()
        };
        if let Some(game) = &self.game {
            let player = game.player();
            stats.mic_level = game.mic_level().label();
            stats.pose = player.pose.label().to_string();
            stats.x_vel = player.x_vel;
            stats.y_vel = player.y_vel;
            stats.jump_count = player.jump_count;
            stats.entity_count = game.entities().len();
        }
        stats
    }
}

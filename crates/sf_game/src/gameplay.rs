//! The game scene: one fixed tick of frog, level and camera, plus the draw list.
//!
//! Time comes in through [`TickInput::now`] (game-clock time since start), so the
//! stick lifetime and the end-of-run cooldowns are exact and reproducible.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use sf_core::config::GameConfig;
use sf_core::input::{InputState, Key};
use sf_core::session::{Outcome, SceneFlow, SceneId};

use crate::collision::{probe_horizontal, resolve_vertical};
use crate::entity::{Advance, Contact, Entity};
use crate::level::Level;
use crate::player::Player;
use crate::sprites::{self, SpriteBank};

/// Loudness above which the frog walks right on its own.
pub const MIC_MOVE_LOUDNESS: f32 = 5.0;
pub const SCROLL_STEP: i32 = 5;
pub const SCROLL_LIMIT_KEYS: i32 = 6000;
pub const SCROLL_LIMIT_MIC: i32 = 3000;
/// How far below the window the frog may fall before it counts as dead.
pub const FALL_MARGIN: i32 = 10;

pub const MIC_ICON_POS: (f32, f32) = (80.0, 80.0);
const MIC_SHAKE_AMPLITUDE: f32 = 8.0;
const MIC_SHAKE_FREQUENCY: f32 = 40.0;
const BACKGROUND_REPEATS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicLevel {
    Idle,
    Loud,
    Screaming,
}

impl MicLevel {
    pub fn classify(loudness: f32, threshold: u32) -> Self {
        if loudness > threshold as f32 {
            MicLevel::Screaming
        } else if loudness > MIC_MOVE_LOUDNESS {
            MicLevel::Loud
        } else {
            MicLevel::Idle
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MicLevel::Idle => "idle",
            MicLevel::Loud => "loud",
            MicLevel::Screaming => "screaming",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameTuning {
    pub fps: u32,
    pub window_width: i32,
    pub window_height: i32,
    pub player_velocity: i32,
    pub scroll_area_width: i32,
    pub end_cooldown: Duration,
}

impl GameTuning {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            fps: config.fps,
            window_width: config.window_width as i32,
            window_height: config.window_height as i32,
            player_velocity: config.player_velocity,
            scroll_area_width: config.scroll_area_width,
            end_cooldown: Duration::from_millis(config.end_cooldown_ms),
        }
    }
}

impl Default for GameTuning {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Everything the game scene reads from the outside world for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub keys: &'a InputState,
    pub loudness: f32,
    pub threshold: u32,
    pub now: Duration,
}

/// One textured quad in world space (camera offset already applied to HUD items).
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub texture_key: Arc<str>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub struct GameScene {
    player: Player,
    entities: Vec<Entity>,
    fireworks: Vec<Entity>,
    rng: StdRng,
    finish_time: Option<Duration>,
    death_time: Option<Duration>,
    camera_offset: i32,
    parallax_scroll: i32,
    mic_level: MicLevel,
    outcome: Option<Outcome>,
    tuning: GameTuning,
}

impl GameScene {
    pub fn new(level: Level, sprites: &SpriteBank, tuning: GameTuning, rng: StdRng) -> Self {
        Self {
            player: Player::new(sprites),
            entities: level.entities,
            fireworks: level.fireworks,
            rng,
            finish_time: None,
            death_time: None,
            camera_offset: 0,
            parallax_scroll: 0,
            mic_level: MicLevel::Idle,
            outcome: None,
            tuning,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[allow(dead_code)]
    pub fn fireworks(&self) -> &[Entity] {
        &self.fireworks
    }

    pub fn is_finished(&self) -> bool {
        self.finish_time.is_some()
    }

    #[allow(dead_code)]
    pub fn death_pending(&self) -> bool {
        self.death_time.is_some()
    }

    pub fn camera_offset(&self) -> i32 {
        self.camera_offset
    }

    #[allow(dead_code)]
    pub fn parallax_scroll(&self) -> i32 {
        self.parallax_scroll
    }

    pub fn mic_level(&self) -> MicLevel {
        self.mic_level
    }

    /// Set once the scene asked to leave for the restart screen.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn step(&mut self, input: &TickInput<'_>, sprites: &SpriteBank) -> SceneFlow {
        let now = input.now;
        self.mic_level = MicLevel::classify(input.loudness, input.threshold);

        if input.keys.is_just_pressed(Key::R) {
            log::info!("Run aborted");
            return self.finish_run(Outcome::Lost);
        }
        if input.keys.quit_requested() || input.keys.is_just_pressed(Key::Escape) {
            return SceneFlow::Quit;
        }
        if input.keys.is_just_pressed(Key::Space) && self.player.can_jump() {
            self.player.jump();
        }

        self.player.tick(self.tuning.fps, sprites);
        self.advance_level(sprites, now);

        if self.is_finished() {
            let rng = &mut self.rng;
            for firework in &mut self.fireworks {
                firework.advance(sprites, now, rng);
            }
        }

        let mut flow = SceneFlow::Continue;
        match self.death_time {
            None => self.movement_step(input),
            Some(died) if now.saturating_sub(died) >= self.tuning.end_cooldown => {
                flow = self.finish_run(Outcome::Lost);
            }
            Some(_) => {}
        }
        if flow == SceneFlow::Continue {
            if let Some(finished) = self.finish_time {
                if now.saturating_sub(finished) >= self.tuning.end_cooldown {
                    flow = self.finish_run(Outcome::Won);
                }
            }
        }

        self.follow_player();
        flow
    }

    fn finish_run(&mut self, outcome: Outcome) -> SceneFlow {
        self.outcome = Some(outcome);
        SceneFlow::Goto(SceneId::Restart)
    }

    fn advance_level(&mut self, sprites: &SpriteBank, now: Duration) {
        let rng = &mut self.rng;
        self.entities
            .retain_mut(|entity| entity.advance(sprites, now, rng) == Advance::Keep);

        if self.finish_time.is_none()
            && self
                .entities
                .iter()
                .any(|entity| entity.is_finish() && entity.rect.intersects(&self.player.rect))
        {
            log::info!("Finish reached at {:.2}s", now.as_secs_f32());
            self.finish_time = Some(now);
        }
    }

    fn movement_step(&mut self, input: &TickInput<'_>) {
        let vel = self.tuning.player_velocity;
        let probe = vel * 2;
        self.player.x_vel = 0;
        let blocked_left = probe_horizontal(&self.player, &self.entities, -probe);
        let blocked_right = probe_horizontal(&self.player, &self.entities, probe);

        if input.keys.is_held(Key::Left) && blocked_left.is_none() {
            self.player.move_left(vel);
            if self.parallax_scroll > 0 {
                self.parallax_scroll -= SCROLL_STEP;
            }
        }
        if input.keys.is_held(Key::Right) && blocked_right.is_none() {
            self.player.move_right(vel);
            if self.parallax_scroll < SCROLL_LIMIT_KEYS {
                self.parallax_scroll += SCROLL_STEP;
            }
        }

        if input.loudness > input.threshold as f32 && self.player.can_jump() {
            self.player.jump();
        }
        if input.loudness > MIC_MOVE_LOUDNESS && blocked_right.is_none() {
            self.player.move_right(vel);
            if self.parallax_scroll < SCROLL_LIMIT_MIC {
                self.parallax_scroll += SCROLL_STEP;
            }
        }

        if self.player.rect.y > self.tuning.window_height + FALL_MARGIN && !self.is_finished() {
            self.kill(input.now, "fell off the level");
        }

        let dy = self.player.y_vel;
        let touched = resolve_vertical(&mut self.player, &self.entities, dy);
        for index in blocked_left.into_iter().chain(blocked_right).chain(touched) {
            if self.entities[index].on_player_contact(input.now) == Contact::Kill {
                let tag = self.entities[index].tag;
                self.kill(input.now, &format!("touched {tag:?}"));
            }
        }
    }

    fn kill(&mut self, now: Duration, cause: &str) {
        self.player.make_hit();
        if self.death_time.is_none() {
            log::info!("Frog died ({cause}) at {:.2}s", now.as_secs_f32());
            self.death_time = Some(now);
        }
    }

    fn follow_player(&mut self) {
        let rect = self.player.rect;
        let x_vel = self.player.x_vel;
        let margin = self.tuning.scroll_area_width;
        let near_right = rect.right() - self.camera_offset >= self.tuning.window_width - margin;
        let near_left = rect.x - self.camera_offset <= margin;
        if (near_right && x_vel > 0) || (near_left && x_vel < 0) {
            self.camera_offset += x_vel;
        }
    }

    /// Quads for this frame, back to front.
    pub fn draw_list(&self, sprites: &SpriteBank, now: Duration) -> Vec<DrawCommand> {
        let offset = self.camera_offset as f32;
        let mut out = Vec::with_capacity(self.entities.len() + 40);

        for repeat in 0..BACKGROUND_REPEATS {
            let mut speed = 0.1;
            for layer in 0..sprites::PARALLAX_LAYERS {
                if let Some(frame) = sprites.first_frame(&sprites::parallax_clip(layer)) {
                    let x = (repeat * frame.width as i32) as f32
                        - self.parallax_scroll as f32 * speed;
                    out.push(command(&frame, x + offset, 0.0));
                }
                speed += 0.2;
            }
        }

        for entity in &self.entities {
            out.push(command(&entity.frame, entity.rect.x as f32, entity.rect.y as f32));
        }
        out.push(command(
            &self.player.frame,
            self.player.rect.x as f32,
            self.player.rect.y as f32,
        ));
        if self.is_finished() {
            for firework in &self.fireworks {
                out.push(command(&firework.frame, firework.rect.x as f32, firework.rect.y as f32));
            }
        }

        let (icon, (dx, dy)) = match self.mic_level {
            MicLevel::Idle => (sprites::MIC_IDLE, (0, 0)),
            MicLevel::Loud => (sprites::MIC_LOUD, (0, 0)),
            MicLevel::Screaming => (sprites::MIC_LOUD, mic_shake_offset(now)),
        };
        if let Some(frame) = sprites.first_frame(icon) {
            out.push(command(
                &frame,
                MIC_ICON_POS.0 + dx as f32 + offset,
                MIC_ICON_POS.1 + dy as f32,
            ));
        }
        out
    }
}

fn command(frame: &sprites::SpriteFrame, x: f32, y: f32) -> DrawCommand {
    DrawCommand {
        texture_key: frame.texture_key.clone(),
        x,
        y,
        width: frame.width as f32,
        height: frame.height as f32,
    }
}

pub fn mic_shake_offset(now: Duration) -> (i32, i32) {
    let t = now.as_secs_f32() * MIC_SHAKE_FREQUENCY;
    (
        (t.sin() * MIC_SHAKE_AMPLITUDE) as i32,
        (t.cos() * MIC_SHAKE_AMPLITUDE) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, EntityTag};
    use rand::SeedableRng;

    fn bank() -> SpriteBank {
        SpriteBank::placeholder(48, 816)
    }

    fn scene(bank: &SpriteBank, entities: Vec<Entity>, fireworks: Vec<Entity>) -> GameScene {
        GameScene::new(
            Level {
                entities,
                fireworks,
            },
            bank,
            GameTuning::default(),
            StdRng::seed_from_u64(7),
        )
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn input(keys: &InputState, loudness: f32, threshold: u32, now: Duration) -> TickInput<'_> {
        TickInput {
            keys,
            loudness,
            threshold,
            now,
        }
    }

    #[test]
    fn mic_level_bands() {
        assert_eq!(MicLevel::classify(0.0, 200), MicLevel::Idle);
        assert_eq!(MicLevel::classify(5.0, 200), MicLevel::Idle);
        assert_eq!(MicLevel::classify(5.5, 200), MicLevel::Loud);
        assert_eq!(MicLevel::classify(200.0, 200), MicLevel::Loud);
        assert_eq!(MicLevel::classify(200.5, 200), MicLevel::Screaming);
    }

    #[test]
    fn gravity_never_decreases_while_airborne() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let keys = InputState::new();
        let mut last = game.player().y_vel;
        for tick in 0..180u64 {
            game.step(&input(&keys, 0.0, 200, ms(tick * 16)), &bank);
            assert!(game.player().y_vel >= last, "tick {tick}");
            last = game.player().y_vel;
        }
    }

    #[test]
    fn jump_count_never_exceeds_two() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let mut keys = InputState::new();
        for tick in 0..120u64 {
            keys.key_up(Key::Space);
            keys.key_down(Key::Space);
            game.step(&input(&keys, 300.0, 100, ms(tick * 16)), &bank);
            keys.end_frame();
            assert!(game.player().jump_count <= 2, "tick {tick}");
        }
        assert_eq!(game.player().jump_count, 2);
    }

    #[test]
    fn silence_never_jumps_even_at_lowest_threshold() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let keys = InputState::new();
        for tick in 0..90u64 {
            game.step(&input(&keys, 0.0, 100, ms(tick * 16)), &bank);
            assert_eq!(game.player().jump_count, 0);
        }
        assert_eq!(game.player().x_vel, 0);
        assert_eq!(game.mic_level(), MicLevel::Idle);
    }

    #[test]
    fn scream_above_threshold_jumps_and_walks() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let keys = InputState::new();
        let flow = game.step(&input(&keys, 250.0, 200, ms(0)), &bank);
        assert_eq!(flow, SceneFlow::Continue);
        assert_eq!(game.player().jump_count, 1);
        assert_eq!(game.player().y_vel, -8.0);
        assert_eq!(game.player().x_vel, 5);
        assert_eq!(game.mic_level(), MicLevel::Screaming);
        assert_eq!(game.parallax_scroll(), 5);
    }

    #[test]
    fn quiet_noise_walks_without_jumping() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let keys = InputState::new();
        game.step(&input(&keys, 10.0, 200, ms(0)), &bank);
        assert_eq!(game.player().jump_count, 0);
        assert_eq!(game.player().x_vel, 5);
        assert_eq!(game.mic_level(), MicLevel::Loud);
    }

    #[test]
    fn fall_death_restarts_after_exactly_the_cooldown() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        game.player.rect.y = 900;
        let keys = InputState::new();

        assert_eq!(game.step(&input(&keys, 0.0, 200, ms(2_000)), &bank), SceneFlow::Continue);
        assert!(game.death_pending());
        assert!(game.player().hit);

        assert_eq!(game.step(&input(&keys, 0.0, 200, ms(3_499)), &bank), SceneFlow::Continue);
        assert_eq!(game.outcome(), None);
        assert_eq!(
            game.step(&input(&keys, 0.0, 200, ms(3_500)), &bank),
            SceneFlow::Goto(SceneId::Restart)
        );
        assert_eq!(game.outcome(), Some(Outcome::Lost));
    }

    #[test]
    fn death_outranks_a_finish_on_the_same_tick() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        game.death_time = Some(ms(0));
        game.finish_time = Some(ms(0));
        let keys = InputState::new();
        let flow = game.step(&input(&keys, 0.0, 200, ms(1_500)), &bank);
        assert_eq!(flow, SceneFlow::Goto(SceneId::Restart));
        assert_eq!(game.outcome(), Some(Outcome::Lost));
    }

    #[test]
    fn spike_contact_kills() {
        let bank = bank();
        let spike = Entity::new(EntityTag::Spike, 40, 250, 48, &bank);
        let mut game = scene(&bank, vec![spike], Vec::new());
        let keys = InputState::new();
        game.step(&input(&keys, 0.0, 200, ms(0)), &bank);
        assert!(game.death_pending());
    }

    #[test]
    fn unlit_fire_is_a_floor_and_lit_fire_kills() {
        let bank = bank();
        let keys = InputState::new();

        let cold = Entity::new(EntityTag::Fire, 40, 262, 48, &bank);
        let mut game = scene(&bank, vec![cold], Vec::new());
        game.player.y_vel = 1.0;
        game.step(&input(&keys, 0.0, 200, ms(0)), &bank);
        assert!(!game.death_pending());
        assert_eq!(game.player().rect.bottom(), 262);

        let mut hot = Entity::new(EntityTag::Fire, 40, 262, 48, &bank);
        hot.set_lit(true);
        let mut game = scene(&bank, vec![hot], Vec::new());
        game.player.y_vel = 1.0;
        game.step(&input(&keys, 0.0, 200, ms(0)), &bank);
        assert!(game.death_pending());
    }

    #[test]
    fn landing_on_a_stick_breaks_it_once() {
        let bank = bank();
        let stick = Entity::new(EntityTag::Stick, 40, 300, 48, &bank);
        let mut game = scene(&bank, vec![stick], Vec::new());
        game.player.rect.y = 300 - game.player.rect.h;
        game.player.y_vel = 1.0;
        let keys = InputState::new();

        game.step(&input(&keys, 0.0, 200, ms(1_000)), &bank);
        assert_eq!(game.player().rect.bottom(), 300);
        assert_eq!(game.player().jump_count, 0);
        assert_eq!(game.entities().len(), 1);

        game.step(&input(&keys, 0.0, 200, ms(1_499)), &bank);
        assert_eq!(game.entities().len(), 1);
        game.step(&input(&keys, 0.0, 200, ms(1_500)), &bank);
        assert!(game.entities().is_empty());
        game.step(&input(&keys, 0.0, 200, ms(2_500)), &bank);
        assert!(game.entities().is_empty());
    }

    #[test]
    fn landing_on_a_stick_beside_a_spike_shakes_and_kills() {
        let bank = bank();
        let stick = Entity::new(EntityTag::Stick, 40, 300, 48, &bank);
        let spike = Entity::new(EntityTag::Spike, 88, 252, 48, &bank);
        let mut game = scene(&bank, vec![stick, spike], Vec::new());
        game.player.rect.y = 300 - game.player.rect.h;
        game.player.y_vel = 1.0;
        let keys = InputState::new();

        game.step(&input(&keys, 0.0, 200, ms(1_000)), &bank);
        assert!(matches!(
            game.entities()[0].kind,
            EntityKind::Stick { shaking: true, .. }
        ));
        assert!(game.death_pending());
        assert!(game.player().hit);
    }

    #[test]
    fn wall_stops_the_mic_nudge() {
        let bank = bank();
        let wall = Entity::new(EntityTag::GrassBlock, 50 + 64 + 4, 200, 48, &bank);
        let mut game = scene(&bank, vec![wall], Vec::new());
        let keys = InputState::new();
        let x = game.player().rect.x;
        for tick in 0..5u64 {
            game.step(&input(&keys, 50.0, 200, ms(tick * 16)), &bank);
        }
        assert_eq!(game.mic_level(), MicLevel::Loud);
        assert_eq!(game.player().rect.x, x);
        assert_eq!(game.player().x_vel, 0);
        assert_eq!(game.player().jump_count, 0);
        assert_eq!(game.parallax_scroll(), 0);
    }

    #[test]
    fn wall_blocks_walking_without_moving_the_frog() {
        let bank = bank();
        let wall = Entity::new(EntityTag::GrassBlock, 50 + 64 + 4, 200, 48, &bank);
        let mut game = scene(&bank, vec![wall], Vec::new());
        let mut keys = InputState::new();
        keys.key_down(Key::Right);
        let x = game.player().rect.x;
        for tick in 0..5u64 {
            game.step(&input(&keys, 0.0, 200, ms(tick * 16)), &bank);
            keys.end_frame();
        }
        assert_eq!(game.player().rect.x, x);
        assert_eq!(game.player().x_vel, 0);
        assert_eq!(game.parallax_scroll(), 0);
    }

    #[test]
    fn fireworks_only_move_from_the_finishing_tick() {
        let bank = bank();
        let finish = Entity::new(EntityTag::FinishPoint, 2_000, 364, 64, &bank);
        let firework = Entity::new(EntityTag::Firework, 0, 500, 256, &bank);
        let mut game = scene(&bank, vec![finish], vec![firework]);
        let keys = InputState::new();

        for tick in 0..3u64 {
            game.step(&input(&keys, 0.0, 200, ms(tick * 16)), &bank);
            assert_eq!(game.fireworks()[0].rect.y, 500);
        }
        assert!(!game
            .draw_list(&bank, ms(48))
            .iter()
            .any(|cmd| cmd.texture_key.starts_with("firework/")));

        game.entities[0].rect.x = game.player.rect.x;
        game.entities[0].rect.y = game.player.rect.y;
        game.step(&input(&keys, 0.0, 200, ms(64)), &bank);
        assert!(game.is_finished());
        assert_eq!(game.fireworks()[0].rect.y, 485);
        game.step(&input(&keys, 0.0, 200, ms(80)), &bank);
        assert_eq!(game.fireworks()[0].rect.y, 470);
        assert!(game
            .draw_list(&bank, ms(80))
            .iter()
            .any(|cmd| cmd.texture_key.starts_with("firework/")));
    }

    #[test]
    fn finish_wins_after_cooldown() {
        let bank = bank();
        let finish = Entity::new(EntityTag::FinishPoint, 50, 200, 64, &bank);
        let mut game = scene(&bank, vec![finish], Vec::new());
        let keys = InputState::new();
        assert_eq!(game.step(&input(&keys, 0.0, 200, ms(100)), &bank), SceneFlow::Continue);
        assert!(game.is_finished());
        assert_eq!(game.step(&input(&keys, 0.0, 200, ms(1_599)), &bank), SceneFlow::Continue);
        assert_eq!(
            game.step(&input(&keys, 0.0, 200, ms(1_600)), &bank),
            SceneFlow::Goto(SceneId::Restart)
        );
        assert_eq!(game.outcome(), Some(Outcome::Won));
    }

    #[test]
    fn abort_and_quit_keys() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let mut keys = InputState::new();
        keys.key_down(Key::Escape);
        assert_eq!(game.step(&input(&keys, 0.0, 200, ms(0)), &bank), SceneFlow::Quit);

        let mut keys = InputState::new();
        keys.key_down(Key::R);
        assert_eq!(
            game.step(&input(&keys, 0.0, 200, ms(16)), &bank),
            SceneFlow::Goto(SceneId::Restart)
        );
        assert_eq!(game.outcome(), Some(Outcome::Lost));
    }

    #[test]
    fn camera_follows_near_the_right_edge() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let mut keys = InputState::new();
        keys.key_down(Key::Right);

        game.step(&input(&keys, 0.0, 200, ms(0)), &bank);
        assert_eq!(game.camera_offset(), 0);

        game.player.rect.x = 260;
        game.step(&input(&keys, 0.0, 200, ms(16)), &bank);
        assert_eq!(game.camera_offset(), 5);
    }

    #[test]
    fn camera_follows_near_the_left_edge() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        let mut keys = InputState::new();
        keys.key_down(Key::Left);
        game.camera_offset = 300;

        game.player.rect.x = 700;
        game.step(&input(&keys, 0.0, 200, ms(0)), &bank);
        assert_eq!(game.player().x_vel, -5);
        assert_eq!(game.camera_offset(), 300);

        game.player.rect.x = 450;
        game.step(&input(&keys, 0.0, 200, ms(16)), &bank);
        assert_eq!(game.camera_offset(), 295);
        keys.key_up(Key::Left);
        game.step(&input(&keys, 0.0, 200, ms(32)), &bank);
        assert_eq!(game.camera_offset(), 295);
    }

    #[test]
    fn draw_list_layers_back_to_front() {
        let bank = bank();
        let block = Entity::new(EntityTag::GrassBlock, 0, 768, 48, &bank);
        let mut game = scene(&bank, vec![block], Vec::new());
        game.camera_offset = 100;
        let list = game.draw_list(&bank, ms(0));

        let backgrounds = (BACKGROUND_REPEATS as usize) * sprites::PARALLAX_LAYERS;
        assert_eq!(list.len(), backgrounds + 3);
        assert!(list[..backgrounds]
            .iter()
            .all(|cmd| cmd.texture_key.starts_with("background/")));
        assert_eq!(list[0].x, 100.0);
        assert_eq!(list[backgrounds].texture_key.as_ref(), "tile/grass#0");
        assert!(list[backgrounds + 1].texture_key.starts_with("frog/"));
        let icon = list.last().expect("mic icon");
        assert_eq!(icon.texture_key.as_ref(), "ui/mic_idle#0");
        assert_eq!((icon.x, icon.y), (180.0, 80.0));
    }

    #[test]
    fn screaming_icon_shakes() {
        let bank = bank();
        let mut game = scene(&bank, Vec::new(), Vec::new());
        game.mic_level = MicLevel::Screaming;
        let now = ms(0);
        let icon = game.draw_list(&bank, now).pop().expect("mic icon");
        assert_eq!(icon.texture_key.as_ref(), "ui/mic_loud#0");
        let (dx, dy) = mic_shake_offset(now);
        assert_eq!((dx, dy), (0, 8));
        assert_eq!((icon.x, icon.y), (80.0, 88.0));
    }
}

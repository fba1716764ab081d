//! Level objects: one `Entity` struct with the shared fields and an
//! `EntityKind` carrying per-variant state.
//!
//! An entity's `frame` is always the frame it is drawing, and collision reads
//! `frame.mask`, so swapping the frame swaps the mask with it.

use std::time::Duration;

use rand::Rng;
use sf_core::animation::FrameClock;

use crate::collision::Rect;
use crate::sprites::{self, SpriteBank, SpriteFrame};

pub const STICK_LIFETIME: Duration = Duration::from_millis(500);
pub const STICK_SHAKE_MAGNITUDE: f32 = 3.0;
pub const STICK_SHAKE_FREQUENCY: f32 = 50.0;
pub const FIREWORK_RISE: i32 = 15;

const FIRE_DELAY: u32 = 3;
const START_DELAY: u32 = 3;
const FINISH_DELAY: u32 = 8;
const FIREWORK_DELAY: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTag {
    GrassBlock,
    DirtBlock,
    Spike,
    Stick,
    Fire,
    StartPoint,
    FinishPoint,
    Firework,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Block,
    Spike,
    Stick {
        shaking: bool,
        shake_started: Option<Duration>,
        origin: (i32, i32),
    },
    Fire {
        lit: bool,
        clock: FrameClock,
    },
    StartPoint {
        clock: FrameClock,
    },
    FinishPoint {
        clock: FrameClock,
    },
    Firework {
        base_y: i32,
        variant: u8,
        clock: FrameClock,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Keep,
    Remove,
}

/// What touching an entity does to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    None,
    Kill,
    StartShaking,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub tag: EntityTag,
    pub rect: Rect,
    pub frame: SpriteFrame,
    pub kind: EntityKind,
}

impl Entity {
    /// Builds an entity with its first frame at `(x, y)`.
    ///
    /// `size` is the footprint used until the first animated frame replaces it.
    pub fn new(tag: EntityTag, x: i32, y: i32, size: i32, sprites: &SpriteBank) -> Self {
        let (kind, clip) = match tag {
            EntityTag::GrassBlock => (EntityKind::Block, sprites::TILE_GRASS.to_string()),
            EntityTag::DirtBlock => (EntityKind::Block, sprites::TILE_DIRT.to_string()),
            EntityTag::Spike => (EntityKind::Spike, sprites::TILE_SPIKE.to_string()),
            EntityTag::Stick => (
                EntityKind::Stick {
                    shaking: false,
                    shake_started: None,
                    origin: (x, y),
                },
                sprites::TILE_STICK.to_string(),
            ),
            EntityTag::Fire => (
                EntityKind::Fire {
                    lit: false,
                    clock: FrameClock::new(FIRE_DELAY),
                },
                sprites::FIRE_OFF.to_string(),
            ),
            EntityTag::StartPoint => (
                EntityKind::StartPoint {
                    clock: FrameClock::new(START_DELAY),
                },
                sprites::START_MOVE.to_string(),
            ),
            EntityTag::FinishPoint => (
                EntityKind::FinishPoint {
                    clock: FrameClock::new(FINISH_DELAY),
                },
                sprites::FINISH_MOVE.to_string(),
            ),
            EntityTag::Firework => (
                EntityKind::Firework {
                    base_y: y,
                    variant: 1,
                    clock: FrameClock::new(FIREWORK_DELAY),
                },
                sprites::firework_clip(1),
            ),
        };
        let side = size.max(1) as u32;
        let frame = sprites.first_frame_or_blank(&clip, (side, side));
        Self {
            tag,
            rect: Rect::new(x, y, size, size),
            frame,
            kind,
        }
    }

    /// Start/finish markers and fireworks are scenery for collision purposes.
    pub fn is_solid(&self) -> bool {
        !matches!(
            self.kind,
            EntityKind::StartPoint { .. } | EntityKind::FinishPoint { .. } | EntityKind::Firework { .. }
        )
    }

    pub fn is_lethal(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Spike | EntityKind::Fire { lit: true, .. }
        )
    }

    pub fn is_finish(&self) -> bool {
        matches!(self.kind, EntityKind::FinishPoint { .. })
    }

    pub fn set_lit(&mut self, on: bool) {
        if let EntityKind::Fire { lit, .. } = &mut self.kind {
            *lit = on;
        }
    }

    /// Applies the effect of the player touching this entity at `now`.
    pub fn on_player_contact(&mut self, now: Duration) -> Contact {
        if self.is_lethal() {
            return Contact::Kill;
        }
        match &mut self.kind {
            EntityKind::Stick {
                shaking,
                shake_started,
                ..
            } => {
                if !*shaking {
                    *shaking = true;
                    *shake_started = Some(now);
                    log::debug!("Stick at ({}, {}) starts shaking", self.rect.x, self.rect.y);
                }
                Contact::StartShaking
            }
            _ => Contact::None,
        }
    }

    /// Stops a shaking stick, putting it back where it was built.
    #[allow(dead_code)]
    pub fn stop_shaking(&mut self) {
        if let EntityKind::Stick {
            shaking,
            shake_started,
            origin,
        } = &mut self.kind
        {
            *shaking = false;
            *shake_started = None;
            self.rect.x = origin.0;
            self.rect.y = origin.1;
        }
    }

    /// Runs one tick of the entity's own behaviour.
    pub fn advance<R: Rng>(&mut self, sprites: &SpriteBank, now: Duration, rng: &mut R) -> Advance {
        match &mut self.kind {
            EntityKind::Block | EntityKind::Spike => Advance::Keep,
            EntityKind::Stick {
                shaking,
                shake_started,
                origin,
            } => {
                if !*shaking {
                    self.rect.x = origin.0;
                    self.rect.y = origin.1;
                    return Advance::Keep;
                }
                let started = *shake_started.get_or_insert(now);
                let elapsed = now.saturating_sub(started);
                if elapsed >= STICK_LIFETIME {
                    log::debug!("Stick at ({}, {}) broke", origin.0, origin.1);
                    return Advance::Remove;
                }
                let (dx, dy) = stick_shake_offset(elapsed);
                self.rect.x = origin.0 + dx;
                self.rect.y = origin.1 + dy;
                Advance::Keep
            }
            EntityKind::Fire { lit, clock } => {
                let clip = if *lit { sprites::FIRE_ON } else { sprites::FIRE_OFF };
                let frames = sprites.clip(clip);
                if !frames.is_empty() {
                    let index = clock.tick(frames.len());
                    self.frame = frames[index].clone();
                    self.fit_rect_to_frame();
                }
                Advance::Keep
            }
            EntityKind::StartPoint { clock } => {
                let frames = sprites.clip(sprites::START_MOVE);
                if !frames.is_empty() {
                    self.frame = frames[clock.tick(frames.len())].clone();
                }
                Advance::Keep
            }
            EntityKind::FinishPoint { clock } => {
                let frames = sprites.clip(sprites::FINISH_MOVE);
                if !frames.is_empty() {
                    self.frame = frames[clock.tick(frames.len())].clone();
                    self.fit_rect_to_frame();
                }
                Advance::Keep
            }
            EntityKind::Firework {
                base_y,
                variant,
                clock,
            } => {
                if self.rect.y > 0 {
                    self.rect.y -= FIREWORK_RISE;
                } else {
                    self.rect.y = *base_y;
                    *variant = rng.random_range(1..=3);
                }
                let frames = sprites.clip(&sprites::firework_clip(*variant));
                if !frames.is_empty() {
                    self.frame = frames[clock.tick(frames.len())].clone();
                }
                Advance::Keep
            }
        }
    }

    fn fit_rect_to_frame(&mut self) {
        self.rect.w = self.frame.width as i32;
        self.rect.h = self.frame.height as i32;
    }
}

/// Shake offset `elapsed` into a stick's break-up.
pub fn stick_shake_offset(elapsed: Duration) -> (i32, i32) {
    let t = elapsed.as_secs_f32() * STICK_SHAKE_FREQUENCY;
    (
        (STICK_SHAKE_MAGNITUDE * t.sin()) as i32,
        (STICK_SHAKE_MAGNITUDE * t.cos()) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn stick_shakes_then_breaks_after_half_a_second() {
        let bank = SpriteBank::placeholder(48, 816);
        let mut rng = StdRng::seed_from_u64(1);
        let mut stick = Entity::new(EntityTag::Stick, 96, 480, 48, &bank);

        assert_eq!(stick.advance(&bank, ms(100), &mut rng), Advance::Keep);
        assert_eq!((stick.rect.x, stick.rect.y), (96, 480));

        assert_eq!(stick.on_player_contact(ms(1_000)), Contact::StartShaking);
        // A second contact does not restart the timer.
        stick.on_player_contact(ms(1_200));

        assert_eq!(stick.advance(&bank, ms(1_250), &mut rng), Advance::Keep);
        let (dx, dy) = stick_shake_offset(ms(250));
        assert_eq!((stick.rect.x, stick.rect.y), (96 + dx, 480 + dy));
        assert!(dx.abs() <= 3 && dy.abs() <= 3);

        assert_eq!(stick.advance(&bank, ms(1_499), &mut rng), Advance::Keep);
        assert_eq!(stick.advance(&bank, ms(1_500), &mut rng), Advance::Remove);
    }

    #[test]
    fn stopping_a_shake_restores_origin_and_forgets_start() {
        let bank = SpriteBank::placeholder(48, 816);
        let mut rng = StdRng::seed_from_u64(1);
        let mut stick = Entity::new(EntityTag::Stick, 10, 20, 48, &bank);

        stick.on_player_contact(ms(0));
        stick.advance(&bank, ms(30), &mut rng);
        stick.stop_shaking();
        assert_eq!((stick.rect.x, stick.rect.y), (10, 20));
        assert_eq!(
            stick.kind,
            EntityKind::Stick {
                shaking: false,
                shake_started: None,
                origin: (10, 20)
            }
        );

        // Well past the original deadline, it is still there.
        assert_eq!(stick.advance(&bank, ms(5_000), &mut rng), Advance::Keep);
        stick.on_player_contact(ms(5_000));
        assert_eq!(stick.advance(&bank, ms(5_400), &mut rng), Advance::Keep);
        assert_eq!(stick.advance(&bank, ms(5_500), &mut rng), Advance::Remove);
    }

    #[test]
    fn shake_offset_follows_sine_and_cosine() {
        assert_eq!(stick_shake_offset(Duration::ZERO), (0, 3));
        for millis in (0..500).step_by(7) {
            let (dx, dy) = stick_shake_offset(Duration::from_millis(millis));
            assert!(dx.abs() <= 3 && dy.abs() <= 3);
        }
    }

    #[test]
    fn fire_is_solid_but_only_lethal_when_lit() {
        let bank = SpriteBank::placeholder(48, 816);
        let mut fire = Entity::new(EntityTag::Fire, 0, 0, 48, &bank);
        assert!(fire.is_solid());
        assert_eq!(fire.on_player_contact(ms(0)), Contact::None);

        fire.set_lit(true);
        assert_eq!(fire.on_player_contact(ms(0)), Contact::Kill);

        let mut rng = StdRng::seed_from_u64(3);
        fire.advance(&bank, ms(16), &mut rng);
        assert_eq!(fire.frame.texture_key.as_ref(), "fire/on#0");
        assert_eq!(fire.rect.w, fire.frame.width as i32);
    }

    #[test]
    fn fire_frame_and_mask_change_together() {
        let bank = SpriteBank::placeholder(48, 816);
        let mut rng = StdRng::seed_from_u64(3);
        let mut fire = Entity::new(EntityTag::Fire, 0, 0, 48, &bank);
        fire.set_lit(true);
        let clip = bank.clip(sprites::FIRE_ON);
        for _ in 0..20 {
            fire.advance(&bank, ms(0), &mut rng);
            let shown = clip
                .iter()
                .find(|frame| frame.texture_key == fire.frame.texture_key)
                .expect("frame comes from the on clip");
            assert!(std::sync::Arc::ptr_eq(&shown.mask, &fire.frame.mask));
        }
    }

    #[test]
    fn spike_kills_and_blocks() {
        let bank = SpriteBank::placeholder(48, 816);
        let mut spike = Entity::new(EntityTag::Spike, 0, 0, 48, &bank);
        assert!(spike.is_solid());
        assert_eq!(spike.on_player_contact(ms(0)), Contact::Kill);
    }

    #[test]
    fn markers_are_not_solid() {
        let bank = SpriteBank::placeholder(48, 816);
        for tag in [EntityTag::StartPoint, EntityTag::FinishPoint, EntityTag::Firework] {
            assert!(!Entity::new(tag, 0, 0, 64, &bank).is_solid(), "{tag:?}");
        }
        assert!(Entity::new(EntityTag::FinishPoint, 0, 0, 64, &bank).is_finish());
    }

    #[test]
    fn checkpoint_clips_use_their_own_delays() {
        let bank = SpriteBank::placeholder(48, 816);
        let mut rng = StdRng::seed_from_u64(3);
        let mut start = Entity::new(EntityTag::StartPoint, 0, 500, 64, &bank);
        let mut finish = Entity::new(EntityTag::FinishPoint, 0, 364, 64, &bank);
        for _ in 0..4 {
            start.advance(&bank, ms(0), &mut rng);
            finish.advance(&bank, ms(0), &mut rng);
        }
        // Tick 4 shows frame 1 at delay 3 and still frame 0 at delay 8.
        assert_eq!(start.frame.texture_key.as_ref(), "start/move#1");
        assert_eq!(finish.frame.texture_key.as_ref(), "finish/move#0");
    }

    #[test]
    fn firework_rises_then_resets_with_new_variant() {
        let bank = SpriteBank::placeholder(48, 816);
        let mut rng = StdRng::seed_from_u64(42);
        let mut firework = Entity::new(EntityTag::Firework, 0, 30, 256, &bank);

        firework.advance(&bank, ms(0), &mut rng);
        assert_eq!(firework.rect.y, 15);
        firework.advance(&bank, ms(0), &mut rng);
        assert_eq!(firework.rect.y, 0);
        firework.advance(&bank, ms(0), &mut rng);
        assert_eq!(firework.rect.y, 30);
        let EntityKind::Firework { variant, .. } = firework.kind else {
            panic!("still a firework");
        };
        assert!((1..=3).contains(&variant));
        assert!(firework
            .frame
            .texture_key
            .starts_with(&format!("firework/firework{variant}#")));
    }
}

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_fps")]
    pub fps: u32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct ReplayFrame {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub space: bool,
    #[serde(default)]
    pub loudness: f32,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    /// One entry per tick.
    pub fn expanded_frames(&self) -> Vec<ReplayFrame> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(ReplayFrame {
                    loudness: frame.loudness.max(0.0),
                    repeat: 1,
                    ..*frame
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fps == 0 {
        return Err("Replay validation failed: fps must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_fps() -> u32 {
    60
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::{GameScene, GameTuning, TickInput};
    use crate::level::{build_level, LevelFile};
    use crate::sprites::SpriteBank;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sf_core::input::{InputState, Key};
    use sf_core::session::SceneFlow;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sf_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn sample_level() -> LevelFile {
        let tiles: Vec<serde_json::Value> = (0..30)
            .map(|x| serde_json::json!({ "x": x, "y": 16, "type": "grassBlock" }))
            .chain([
                serde_json::json!({ "x": 8, "y": 15, "type": "stick" }),
                serde_json::json!({ "x": 14, "y": 15, "type": "fire" }),
                serde_json::json!({ "x": 25, "y": 16, "type": "FinishPoint" }),
                serde_json::json!({ "x": 20, "y": 16, "type": "firework" }),
                serde_json::json!({ "x": 22, "y": 16, "type": "firework" }),
            ])
            .collect();
        serde_json::from_value(serde_json::json!({
            "version": "0.1",
            "level_id": "replay",
            "tile_size": 48,
            "width": 30,
            "height": 17,
            "tiles": tiles
        }))
        .expect("sample level json")
    }

    /// Final state worth comparing between two runs.
    #[derive(Debug, PartialEq)]
    struct Snapshot {
        player: (i32, i32, i32, i32),
        y_vel_bits: u32,
        jump_count: u8,
        entities: Vec<(i32, i32)>,
        fireworks: Vec<(i32, i32, String)>,
        camera_offset: i32,
        parallax_scroll: i32,
        finished: bool,
        flows: Vec<SceneFlow>,
    }

    fn run(replay: &ReplaySequence, bank: &SpriteBank, seed: u64) -> Snapshot {
        let level = build_level(&sample_level(), bank);
        let mut game = GameScene::new(level, bank, GameTuning::default(), StdRng::seed_from_u64(seed));
        let mut keys = InputState::new();
        let mut flows = Vec::new();
        let tick_ms = 1000 / u64::from(replay.fps);

        for (tick, frame) in replay.expanded_frames().iter().enumerate() {
            for (key, held) in [
                (Key::Left, frame.left),
                (Key::Right, frame.right),
                (Key::Space, frame.space),
            ] {
                if held {
                    keys.key_down(key);
                } else {
                    keys.key_up(key);
                }
            }
            let flow = game.step(
                &TickInput {
                    keys: &keys,
                    loudness: frame.loudness,
                    threshold: 200,
                    now: Duration::from_millis(tick as u64 * tick_ms),
                },
                bank,
            );
            keys.end_frame();
            if flow != SceneFlow::Continue {
                flows.push(flow);
            }
        }

        let player = game.player();
        Snapshot {
            player: (player.rect.x, player.rect.y, player.rect.w, player.rect.h),
            y_vel_bits: player.y_vel.to_bits(),
            jump_count: player.jump_count,
            entities: game.entities().iter().map(|e| (e.rect.x, e.rect.y)).collect(),
            fireworks: game
                .fireworks()
                .iter()
                .map(|f| (f.rect.x, f.rect.y, f.frame.texture_key.to_string()))
                .collect(),
            camera_offset: game.camera_offset(),
            parallax_scroll: game.parallax_scroll(),
            finished: game.is_finished(),
            flows,
        }
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "right": true, "repeat": 3 },
                { "space": true },
                { "loudness": -4.0, "repeat": 2 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        assert_eq!(replay.fps, 60);
        let expanded = replay.expanded_frames();
        assert_eq!(expanded.len(), 6);
        assert!(expanded[2].right);
        assert!(expanded[3].space);
        assert_eq!(expanded[5].loudness, 0.0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "fps": 60,
              "frames": [
                { "repeat": 40 },
                { "right": true, "repeat": 60 },
                { "right": true, "space": true },
                { "right": true, "repeat": 30 },
                { "loudness": 260.0, "repeat": 2 },
                { "loudness": 40.0, "repeat": 150 },
                { "left": true, "repeat": 20 },
                { "loudness": 40.0, "repeat": 200 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let bank = SpriteBank::placeholder(48, 816);
        let first = run(&replay, &bank, 99);
        let second = run(&replay, &bank, 99);
        assert_eq!(first, second);
        // The run actually went somewhere.
        assert!(first.parallax_scroll > 0);
        assert!(first.player.0 > 50);

        let _ = fs::remove_file(path);
    }
}

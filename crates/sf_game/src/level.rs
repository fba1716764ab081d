//! Level files: tile lists on a square grid, turned into entities at game-scene entry.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entity::{Entity, EntityTag};
use crate::sprites::SpriteBank;

pub const LEVEL_VERSION: &str = "0.1";

const START_Y: i32 = 500;
const FINISH_Y: i32 = 364;
const CHECKPOINT_SIZE: i32 = 64;
const FIREWORK_Y: i32 = 500;
const FIREWORK_SIZE: i32 = 256;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("level validation failed: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    pub tile_size: i32,
    /// Grid width in tiles.
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<LevelTile>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelTile {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub tile_type: String,
    /// Only meaningful for `fire` tiles.
    #[serde(default)]
    pub lit: bool,
}

/// Entities in level order plus the celebration list shown after finishing.
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub entities: Vec<Entity>,
    pub fireworks: Vec<Entity>,
}

pub fn tag_for_tile_type(tile_type: &str) -> Option<EntityTag> {
    match tile_type {
        "grassBlock" => Some(EntityTag::GrassBlock),
        "dirtBlock" => Some(EntityTag::DirtBlock),
        "stick" => Some(EntityTag::Stick),
        "Spike" => Some(EntityTag::Spike),
        "startingPoint" => Some(EntityTag::StartPoint),
        "FinishPoint" => Some(EntityTag::FinishPoint),
        "fire" => Some(EntityTag::Fire),
        "firework" => Some(EntityTag::Firework),
        _ => None,
    }
}

pub fn load_level_from_path(level_path: &Path) -> Result<LevelFile, LevelError> {
    let raw = fs::read_to_string(level_path).map_err(|source| LevelError::Read {
        path: level_path.to_path_buf(),
        source,
    })?;
    let level: LevelFile = serde_json::from_str(&raw).map_err(|source| LevelError::Parse {
        path: level_path.to_path_buf(),
        source,
    })?;
    validate_level(&level)?;
    log::info!(
        "Loaded level '{}' from {} ({} tiles)",
        level.level_id,
        level_path.display(),
        level.tiles.len()
    );
    Ok(level)
}

fn validate_level(level: &LevelFile) -> Result<(), LevelError> {
    if level.version != LEVEL_VERSION {
        return Err(LevelError::Invalid(format!(
            "unsupported version '{}', expected '{LEVEL_VERSION}'",
            level.version
        )));
    }
    if level.tile_size <= 0 {
        return Err(LevelError::Invalid("tile_size must be > 0".to_string()));
    }
    if level.width <= 0 || level.height <= 0 {
        return Err(LevelError::Invalid("width and height must be > 0".to_string()));
    }
    for tile in &level.tiles {
        if !(0..level.width).contains(&tile.x) || !(0..level.height).contains(&tile.y) {
            return Err(LevelError::Invalid(format!(
                "tile '{}' at ({}, {}) is outside the {}x{} grid",
                tile.tile_type, tile.x, tile.y, level.width, level.height
            )));
        }
    }
    Ok(())
}

/// Places every known tile. Checkpoints and fireworks sit at fixed heights.
pub fn build_level(file: &LevelFile, sprites: &SpriteBank) -> Level {
    let n = file.tile_size;
    let mut level = Level::default();
    for tile in &file.tiles {
        let Some(tag) = tag_for_tile_type(&tile.tile_type) else {
            log::debug!(
                "Skipping unknown tile type '{}' at ({}, {})",
                tile.tile_type,
                tile.x,
                tile.y
            );
            continue;
        };
        let x = tile.x * n;
        match tag {
            EntityTag::StartPoint => level
                .entities
                .push(Entity::new(tag, x, START_Y, CHECKPOINT_SIZE, sprites)),
            EntityTag::FinishPoint => level
                .entities
                .push(Entity::new(tag, x, FINISH_Y, CHECKPOINT_SIZE, sprites)),
            EntityTag::Fire => {
                let mut fire = Entity::new(tag, x, tile.y * n - n, n, sprites);
                fire.set_lit(tile.lit);
                level.entities.push(fire);
            }
            EntityTag::Firework => level
                .fireworks
                .push(Entity::new(tag, x, FIREWORK_Y, FIREWORK_SIZE, sprites)),
            _ => level.entities.push(Entity::new(tag, x, tile.y * n, n, sprites)),
        }
    }
    log::debug!(
        "Built level '{}': {} entities, {} fireworks",
        file.level_id,
        level.entities.len(),
        level.fireworks.len()
    );
    level
}

//! Sprite sheets, tiles and the collision masks that travel with each frame.
//!
//! Art lives under the asset root as horizontal PNG strips (one clip per file)
//! plus one tileset image. Strips are sliced into equal frames and scaled 2x
//! with nearest-neighbour filtering; directional character clips get a
//! mirrored `_left` twin. Each frame gets its own texture key and a [`Mask`]
//! computed once at load time.
//!
//! A missing or unreadable image never stops the game: the clip is replaced by
//! generated placeholder frames and a warning is logged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::collision::Mask;

pub const SPRITE_SCALE: u32 = 2;
pub const PARALLAX_LAYERS: usize = 5;

pub const FIRE_ON: &str = "fire/on";
pub const FIRE_OFF: &str = "fire/off";
pub const START_MOVE: &str = "start/move";
pub const FINISH_MOVE: &str = "finish/move";
pub const TILE_GRASS: &str = "tile/grass";
pub const TILE_DIRT: &str = "tile/dirt";
pub const TILE_STICK: &str = "tile/stick";
pub const TILE_SPIKE: &str = "tile/spike";
pub const MENU_BACKGROUND: &str = "background/menu";
pub const MIC_IDLE: &str = "ui/mic_idle";
pub const MIC_LOUD: &str = "ui/mic_loud";

const TILESET_PATH: &str = "Level/Tilemap/Level1_map.png";

/// Tiles cut from the tileset, by pixel origin. The tileset is laid out on a
/// 48 px grid.
const TILES: [(&str, u32, u32); 4] = [
    (TILE_GRASS, 96, 0),
    (TILE_DIRT, 0, 192),
    (TILE_STICK, 288, 0),
    (TILE_SPIKE, 384, 0),
];

const FROG_CLIPS: [(&str, u32); 6] = [
    ("idle", 11),
    ("run", 12),
    ("jump", 1),
    ("double_jump", 6),
    ("fall", 1),
    ("hit", 7),
];

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} is {width}x{height}, smaller than one {frame_width}x{frame_height} frame")]
    TooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("tile at ({x}, {y}) with size {size} lies outside {path}")]
    TileOutOfBounds {
        path: PathBuf,
        x: u32,
        y: u32,
        size: u32,
    },
}

#[derive(Debug, Clone)]
pub struct SpriteFrame {
    pub texture_key: Arc<str>,
    pub width: u32,
    pub height: u32,
    pub mask: Arc<Mask>,
}

/// Clip name of a frog pose, e.g. `frog/run_left`.
pub fn frog_clip(pose: &str, direction: &str) -> String {
    format!("frog/{pose}_{direction}")
}

pub fn firework_clip(variant: u8) -> String {
    format!("firework/firework{variant}")
}

pub fn parallax_clip(layer: usize) -> String {
    format!("background/plx-{}", layer + 1)
}

/// Where each clip comes from and how big its frames are before scaling.
struct SheetSpec {
    clip: String,
    path: String,
    frame: (u32, u32),
    placeholder_frames: u32,
    color: [u8; 4],
}

fn sheet_specs(tile_size: u32) -> Vec<SheetSpec> {
    let mut specs = Vec::new();
    for (name, frames) in FROG_CLIPS {
        specs.push(SheetSpec {
            clip: format!("frog/{name}"),
            path: format!("Sprites/Frog/{name}.png"),
            frame: (32, 32),
            placeholder_frames: frames,
            color: [70, 190, 90, 255],
        });
    }
    let half_tile = (tile_size / SPRITE_SCALE).max(1);
    specs.push(SheetSpec {
        clip: FIRE_ON.to_string(),
        path: "Sprites/Fire/on.png".to_string(),
        frame: (half_tile, half_tile),
        placeholder_frames: 3,
        color: [240, 110, 30, 255],
    });
    specs.push(SheetSpec {
        clip: FIRE_OFF.to_string(),
        path: "Sprites/Fire/off.png".to_string(),
        frame: (half_tile, half_tile),
        placeholder_frames: 1,
        color: [120, 120, 120, 255],
    });
    specs.push(SheetSpec {
        clip: START_MOVE.to_string(),
        path: "Sprites/Start/move.png".to_string(),
        frame: (32, 32),
        placeholder_frames: 10,
        color: [230, 230, 80, 255],
    });
    specs.push(SheetSpec {
        clip: FINISH_MOVE.to_string(),
        path: "Sprites/End/move.png".to_string(),
        frame: (32, 32),
        placeholder_frames: 8,
        color: [230, 80, 200, 255],
    });
    for variant in 1..=3u8 {
        specs.push(SheetSpec {
            clip: firework_clip(variant),
            path: format!("Sprites/Firework/firework{variant}.png"),
            frame: (128, 128),
            placeholder_frames: 4,
            color: [255, 60 * variant, 90, 200],
        });
    }
    specs
}

#[derive(Default)]
pub struct SpriteBank {
    clips: HashMap<String, Vec<SpriteFrame>>,
    images: Vec<(Arc<str>, RgbaImage)>,
}

impl SpriteBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every clip the game uses from `asset_root`, substituting
    /// placeholders for anything missing.
    pub fn load(asset_root: &Path, tile_size: u32, window_height: u32) -> Self {
        let mut bank = Self::new();
        let mut fallbacks = 0usize;

        for spec in sheet_specs(tile_size) {
            let path = asset_root.join(&spec.path);
            let frames = match load_sheet(&path, spec.frame.0, spec.frame.1, SPRITE_SCALE) {
                Ok(frames) => frames,
                Err(err) => {
                    log::warn!("{err}. Using placeholder frames for '{}'.", spec.clip);
                    fallbacks += 1;
                    placeholder_frames(&spec, SPRITE_SCALE)
                }
            };
            bank.insert_sheet(&spec.clip, frames, spec.clip.starts_with("frog/"));
        }

        let tileset_path = asset_root.join(TILESET_PATH);
        let tileset = open_rgba(&tileset_path);
        if let Err(err) = &tileset {
            log::warn!("{err}. Using placeholder tiles.");
        }
        for (clip, x, y) in TILES {
            let cropped = match &tileset {
                Ok(image) => match crop_tile(image, &tileset_path, x, y, tile_size) {
                    Ok(tile) => Some(tile),
                    Err(err) => {
                        log::warn!("{err}. Using a placeholder for '{clip}'.");
                        None
                    }
                },
                Err(_) => None,
            };
            let tile = cropped.unwrap_or_else(|| {
                fallbacks += 1;
                placeholder_tile(clip, tile_size)
            });
            bank.insert_clip(clip, vec![tile]);
        }

        for layer in 0..PARALLAX_LAYERS {
            let path = asset_root.join(format!("Background/plx-{}.png", layer + 1));
            let image = match open_rgba(&path) {
                Ok(image) => scale_to_height(&image, window_height),
                Err(err) => {
                    log::warn!("{err}. Using a placeholder parallax layer.");
                    fallbacks += 1;
                    placeholder_parallax(layer, window_height)
                }
            };
            bank.insert_clip(&parallax_clip(layer), vec![image]);
        }

        let menu_path = asset_root.join("Background/Whole_Background.png");
        let menu = match open_rgba(&menu_path) {
            Ok(image) => scale_by(&image, SPRITE_SCALE),
            Err(err) => {
                log::warn!("{err}. Using a placeholder menu background.");
                fallbacks += 1;
                solid(window_height * 2 / 3, window_height, [38, 34, 60, 255])
            }
        };
        bank.insert_clip(MENU_BACKGROUND, vec![menu]);

        for (clip, file, scale_percent) in [
            (MIC_IDLE, "UI/mic_idle.png", 100),
            (MIC_LOUD, "UI/mic_loud.png", 110),
        ] {
            let path = asset_root.join(file);
            let image = match open_rgba(&path) {
                Ok(image) => scale_percent_nearest(&image, scale_percent),
                Err(err) => {
                    log::warn!("{err}. Using a placeholder mic icon.");
                    fallbacks += 1;
                    placeholder_mic(clip == MIC_LOUD)
                }
            };
            bank.insert_clip(clip, vec![image]);
        }

        log::info!(
            "Sprites loaded: {} clips, {} textures, {} placeholders",
            bank.clips.len(),
            bank.images.len(),
            fallbacks
        );
        bank
    }

    /// Every clip generated in memory. Frames are fully opaque, so masks are full.
    #[allow(dead_code)]
    pub fn placeholder(tile_size: u32, window_height: u32) -> Self {
        let mut bank = Self::new();
        for spec in sheet_specs(tile_size) {
            let frames = placeholder_frames(&spec, SPRITE_SCALE);
            bank.insert_sheet(&spec.clip, frames, spec.clip.starts_with("frog/"));
        }
        for (clip, _, _) in TILES {
            bank.insert_clip(clip, vec![placeholder_tile(clip, tile_size)]);
        }
        for layer in 0..PARALLAX_LAYERS {
            bank.insert_clip(
                &parallax_clip(layer),
                vec![placeholder_parallax(layer, window_height)],
            );
        }
        bank.insert_clip(
            MENU_BACKGROUND,
            vec![solid(window_height * 2 / 3, window_height, [38, 34, 60, 255])],
        );
        bank.insert_clip(MIC_IDLE, vec![placeholder_mic(false)]);
        bank.insert_clip(MIC_LOUD, vec![placeholder_mic(true)]);
        bank
    }

    fn insert_sheet(&mut self, clip: &str, frames: Vec<RgbaImage>, directional: bool) {
        if directional {
            let mirrored = frames
                .iter()
                .map(|frame| imageops::flip_horizontal(frame))
                .collect();
            self.insert_clip(&format!("{clip}_right"), frames);
            self.insert_clip(&format!("{clip}_left"), mirrored);
        } else {
            self.insert_clip(clip, frames);
        }
    }

    pub fn insert_clip(&mut self, clip: &str, frames: Vec<RgbaImage>) {
        let mut sprite_frames = Vec::with_capacity(frames.len());
        for (index, image) in frames.into_iter().enumerate() {
            let texture_key: Arc<str> = Arc::from(format!("{clip}#{index}"));
            sprite_frames.push(SpriteFrame {
                texture_key: texture_key.clone(),
                width: image.width(),
                height: image.height(),
                mask: Arc::new(Mask::from_image(&image)),
            });
            self.images.push((texture_key, image));
        }
        self.clips.insert(clip.to_string(), sprite_frames);
    }

    /// Frames of `clip`; empty when the clip is unknown.
    pub fn clip(&self, clip: &str) -> &[SpriteFrame] {
        self.clips.get(clip).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_frame(&self, clip: &str) -> Option<SpriteFrame> {
        self.clip(clip).first().cloned()
    }

    /// First frame of `clip`, or an invisible full-mask frame of `fallback_size`.
    pub fn first_frame_or_blank(&self, clip: &str, fallback_size: (u32, u32)) -> SpriteFrame {
        self.first_frame(clip).unwrap_or_else(|| {
            log::warn!("Unknown sprite clip '{clip}'");
            SpriteFrame {
                texture_key: Arc::from(""),
                width: fallback_size.0,
                height: fallback_size.1,
                mask: Arc::new(Mask::full(fallback_size.0, fallback_size.1)),
            }
        })
    }

    #[allow(dead_code)]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Pixel data for every frame, keyed like `SpriteFrame::texture_key`.
    pub fn images(&self) -> &[(Arc<str>, RgbaImage)] {
        &self.images
    }

    /// Drops the CPU copies once they have been uploaded.
    pub fn release_images(&mut self) {
        self.images = Vec::new();
    }
}

fn open_rgba(path: &Path) -> Result<RgbaImage, SpriteError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|source| SpriteError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Slices a horizontal strip into `frame_width`-wide frames and scales each by `scale`.
pub fn load_sheet(
    path: &Path,
    frame_width: u32,
    frame_height: u32,
    scale: u32,
) -> Result<Vec<RgbaImage>, SpriteError> {
    let sheet = open_rgba(path)?;
    slice_sheet(&sheet, path, frame_width, frame_height, scale)
}

fn slice_sheet(
    sheet: &RgbaImage,
    path: &Path,
    frame_width: u32,
    frame_height: u32,
    scale: u32,
) -> Result<Vec<RgbaImage>, SpriteError> {
    let count = if frame_width == 0 { 0 } else { sheet.width() / frame_width };
    if count == 0 || sheet.height() < frame_height {
        return Err(SpriteError::TooSmall {
            path: path.to_path_buf(),
            width: sheet.width(),
            height: sheet.height(),
            frame_width,
            frame_height,
        });
    }
    Ok((0..count)
        .map(|i| {
            let frame = imageops::crop_imm(sheet, i * frame_width, 0, frame_width, frame_height)
                .to_image();
            scale_by(&frame, scale)
        })
        .collect())
}

fn crop_tile(
    tileset: &RgbaImage,
    path: &Path,
    x: u32,
    y: u32,
    size: u32,
) -> Result<RgbaImage, SpriteError> {
    if size == 0 || x + size > tileset.width() || y + size > tileset.height() {
        return Err(SpriteError::TileOutOfBounds {
            path: path.to_path_buf(),
            x,
            y,
            size,
        });
    }
    Ok(imageops::crop_imm(tileset, x, y, size, size).to_image())
}

fn scale_by(image: &RgbaImage, factor: u32) -> RgbaImage {
    if factor == 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        FilterType::Nearest,
    )
}

fn scale_percent_nearest(image: &RgbaImage, percent: u32) -> RgbaImage {
    if percent == 100 {
        return image.clone();
    }
    let width = (image.width() * percent / 100).max(1);
    let height = (image.height() * percent / 100).max(1);
    imageops::resize(image, width, height, FilterType::Nearest)
}

/// Scales to `height`, keeping the aspect ratio.
fn scale_to_height(image: &RgbaImage, height: u32) -> RgbaImage {
    if image.height() == 0 || image.height() == height {
        return image.clone();
    }
    let width = (image.width() as u64 * height as u64 / image.height() as u64).max(1) as u32;
    imageops::resize(image, width, height, FilterType::Nearest)
}

fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), Rgba(color))
}

fn shade(color: [u8; 4], amount: u8) -> [u8; 4] {
    [
        color[0].saturating_sub(amount),
        color[1].saturating_sub(amount),
        color[2].saturating_sub(amount),
        color[3],
    ]
}

fn placeholder_frames(spec: &SheetSpec, scale: u32) -> Vec<RgbaImage> {
    let width = spec.frame.0 * scale;
    let height = spec.frame.1 * scale;
    let count = spec.placeholder_frames.max(1);
    (0..count)
        .map(|i| {
            let mut frame = solid(width, height, spec.color);
            // A darker band that walks across the frame makes playback visible.
            let band = width * i / count;
            let band_width = (width / count).max(1);
            let dark = Rgba(shade(spec.color, 60));
            for y in 0..height {
                for x in band..(band + band_width).min(width) {
                    frame.put_pixel(x, y, dark);
                }
            }
            frame
        })
        .collect()
}

fn placeholder_tile(clip: &str, size: u32) -> RgbaImage {
    let color = match clip {
        TILE_GRASS => [90, 160, 60, 255],
        TILE_DIRT => [130, 90, 50, 255],
        TILE_STICK => [170, 120, 70, 255],
        TILE_SPIKE => [200, 200, 210, 255],
        _ => [255, 0, 255, 255],
    };
    let size = size.max(1);
    let mut tile = solid(size, size, color);
    let edge = Rgba(shade(color, 50));
    for i in 0..size {
        tile.put_pixel(i, 0, edge);
        tile.put_pixel(0, i, edge);
    }
    tile
}

fn placeholder_parallax(layer: usize, height: u32) -> RgbaImage {
    let width = height * 2 / 3;
    if layer == 0 {
        return solid(width, height, [120, 170, 220, 255]);
    }
    // Farther layers sit higher; each is a translucent band over the sky.
    let mut image = RgbaImage::new(width.max(1), height.max(1));
    let top = height * (3 + layer as u32) / 10;
    let tone = 60 + 25 * layer as u8;
    for y in top..height {
        for x in 0..width {
            image.put_pixel(x, y, Rgba([tone / 2, tone, tone / 2, 255]));
        }
    }
    image
}

fn placeholder_mic(loud: bool) -> RgbaImage {
    let (size, color) = if loud {
        (70, [235, 70, 70, 255])
    } else {
        (64, [220, 220, 220, 255])
    };
    let mut image = RgbaImage::new(size, size);
    let center = size as f32 / 2.0;
    let radius = center - 4.0;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x, y, Rgba(color));
            }
        }
    }
    image
}

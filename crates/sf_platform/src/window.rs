use std::sync::Arc;

use winit::dpi::LogicalSize;
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use sf_core::config::GameConfig;

/// Window settings, in logical pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl PlatformConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        Self {
            title: config.title.clone(),
            width: config.window_width,
            height: config.window_height,
        }
    }

    fn attributes(&self) -> WindowAttributes {
        // Levels are laid out for exactly this viewport.
        WindowAttributes::default()
            .with_title(&self.title)
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_resizable(false)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::from_game_config(&GameConfig::default())
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, OsError> {
    let window = event_loop.create_window(config.attributes())?;
    log::info!(
        "Window '{}' created: {}x{} logical",
        config.title,
        config.width,
        config.height
    );
    Ok(Arc::new(window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_game_config() {
        let game = GameConfig {
            title: "Frog".to_string(),
            window_width: 320,
            window_height: 480,
            ..GameConfig::default()
        };
        let config = PlatformConfig::from_game_config(&game);
        assert_eq!(
            config,
            PlatformConfig {
                title: "Frog".to_string(),
                width: 320,
                height: 480,
            }
        );
    }

    #[test]
    fn default_window_is_portrait() {
        let config = PlatformConfig::default();
        assert_eq!((config.width, config.height), (500, 816));
        assert_eq!(config.title, "Scream Frog");
    }
}

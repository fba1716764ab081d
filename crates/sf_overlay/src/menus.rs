//! Start / Restart / Settings screens.
//!
//! The menus are thin: each button maps to exactly one [`SceneFlow`], and the
//! settings slider reports the new threshold for the caller to store in the
//! session. Nothing here holds state between frames.

use sf_core::session::{Outcome, SceneFlow, SceneId, SessionContext, THRESHOLD_MAX, THRESHOLD_MIN};

const BUTTON_SIZE: [f32; 2] = [200.0, 56.0];
const BUTTON_GAP: f32 = 44.0;
const TEXT_COLOR: egui::Color32 = egui::Color32::WHITE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Start,
    Restart { outcome: Option<Outcome> },
    Settings { threshold: u32 },
}

impl MenuScreen {
    /// The menu shown for `scene`, or `None` while the game itself is running.
    pub fn for_scene(scene: SceneId, session: &SessionContext) -> Option<Self> {
        match scene {
            SceneId::Start => Some(MenuScreen::Start),
            SceneId::Restart => Some(MenuScreen::Restart {
                outcome: session.last_outcome,
            }),
            SceneId::Settings => Some(MenuScreen::Settings {
                threshold: session.loudness_threshold(),
            }),
            SceneId::Game => None,
        }
    }

    pub fn buttons(self) -> &'static [MenuButton] {
        match self {
            MenuScreen::Start => &[MenuButton::Play, MenuButton::MicSet],
            MenuScreen::Restart { .. } => &[MenuButton::Again, MenuButton::MicSet],
            MenuScreen::Settings { .. } => &[MenuButton::Back],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    Play,
    Again,
    MicSet,
    Back,
}

impl MenuButton {
    pub fn label(self) -> &'static str {
        match self {
            MenuButton::Play => "Play",
            MenuButton::Again => "Again",
            MenuButton::MicSet => "Mic Set",
            MenuButton::Back => "Back",
        }
    }

    pub fn flow(self) -> SceneFlow {
        match self {
            MenuButton::Play | MenuButton::Again => SceneFlow::Goto(SceneId::Game),
            MenuButton::MicSet => SceneFlow::Goto(SceneId::Settings),
            MenuButton::Back => SceneFlow::Goto(SceneId::Start),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuResponse {
    pub flow: SceneFlow,
    /// Slider value when it moved this frame.
    pub threshold: Option<u32>,
}

impl Default for MenuResponse {
    fn default() -> Self {
        Self {
            flow: SceneFlow::Continue,
            threshold: None,
        }
    }
}

pub fn show_menu(ctx: &egui::Context, screen: MenuScreen) -> MenuResponse {
    let mut response = MenuResponse::default();

    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                let top = (ui.available_height() * 0.5 - 170.0).max(0.0);
                ui.add_space(top);

                match screen {
                    MenuScreen::Start => {
                        ui.add_space(120.0);
                    }
                    MenuScreen::Restart { outcome } => {
                        let banner = outcome.unwrap_or(Outcome::Lost).banner();
                        ui.label(egui::RichText::new(banner).size(48.0).color(TEXT_COLOR));
                        ui.add_space(60.0);
                    }
                    MenuScreen::Settings { threshold } => {
                        ui.label(egui::RichText::new("Intensity").size(32.0).color(TEXT_COLOR));
                        ui.add_space(50.0);
                        let mut value = threshold;
                        ui.spacing_mut().slider_width = 300.0;
                        let slider = ui.add(
                            egui::Slider::new(&mut value, THRESHOLD_MIN..=THRESHOLD_MAX)
                                .show_value(true),
                        );
                        if slider.changed() && value != threshold {
                            response.threshold = Some(value);
                        }
                        ui.add_space(BUTTON_GAP);
                    }
                }

                for &button in screen.buttons() {
                    let text = egui::RichText::new(button.label()).size(24.0);
                    if ui.add_sized(BUTTON_SIZE, egui::Button::new(text)).clicked() {
                        log::debug!("Menu button: {}", button.label());
                        response.flow = button.flow();
                    }
                    ui.add_space(BUTTON_GAP);
                }
            });
        });

    response
}

pub mod menus;
pub mod overlay;

pub use menus::{MenuButton, MenuResponse, MenuScreen};
pub use overlay::{DebugStats, Overlay};

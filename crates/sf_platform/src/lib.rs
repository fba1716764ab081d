pub mod mic;
pub mod window;

pub use mic::{spawn_loudness_sampler, MicError};
pub use window::{create_window, PlatformConfig};

//! Platform-free building blocks shared by the game binary and its front-ends.

pub mod animation;
pub mod config;
pub mod input;
pub mod loudness;
pub mod session;
pub mod time;

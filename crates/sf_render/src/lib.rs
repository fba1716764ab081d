pub mod batch;
pub mod camera;
pub mod gpu_context;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use batch::{DrawCall, QuadSpec, SpriteBatch};
pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::{FrameTarget, GpuContext, GpuError};
pub use sprite_pipeline::SpritePipeline;
pub use texture::Texture;
pub use vertex::SpriteVertex;

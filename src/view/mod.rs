// VIEW: Rendering and graphics
pub mod render;
pub mod gpu_init;
pub mod texture;

pub use render::{Renderer, SceneResources, CameraUniform, TransformUniform};
pub use gpu_init::GpuContext;
pub use texture::DonutTexture;

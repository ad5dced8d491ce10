// MODEL: Geometry and camera
pub mod torus;
pub mod camera;

pub use torus::{TorusParameters, MAX_VERTICES};
pub use camera::Camera;

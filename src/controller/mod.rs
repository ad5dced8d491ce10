// CONTROLLER: Input, transform and update loop
pub mod input;
pub mod transform;
pub mod clock;
pub mod frame_loop;

pub use input::{Axis, InputEvent, InputState, InputProcessor, KeyBindings};
pub use clock::{FrameClock, FpsCounter};
pub use frame_loop::{FrameLoopContext, FrameOutcome, GraphicsBackend, LoopState, ResumeMode};

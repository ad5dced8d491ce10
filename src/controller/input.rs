/// Platform-agnostic input handling system
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A translation slider moved
    Translate { axis: Axis, value: f32 },
    /// Play/pause control clicked
    TogglePause,
    KeyDown(String),
}

/// Shared state written by input handlers and read once per frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    pub translation: Vec3,
    pub paused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent, processor: &InputProcessor) {
        match event {
            InputEvent::Translate { axis, value } => self.set_translation(*axis, *value),
            InputEvent::TogglePause => self.toggle_pause(),
            InputEvent::KeyDown(key) => {
                if processor.wants_to_toggle_pause(key) {
                    self.toggle_pause();
                }
            }
        }
    }

    pub fn set_translation(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.translation.x = value,
            Axis::Y => self.translation.y = value,
            Axis::Z => self.translation.z = value,
        }
    }

    pub fn translation(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.translation.x,
            Axis::Y => self.translation.y,
            Axis::Z => self.translation.z,
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        tracing::debug!(paused = self.paused, "pause toggled");
    }
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub toggle_pause: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_pause: "a".to_string(),
        }
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn wants_to_toggle_pause(&self, key: &str) -> bool {
        key.eq_ignore_ascii_case(&self.bindings.toggle_pause)
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{HtmlInputElement, KeyboardEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent) -> InputEvent {
        InputEvent::KeyDown(e.key())
    }

    /// Read a range input's current value; `None` if it does not parse
    pub fn slider_to_input(axis: Axis, slider: &HtmlInputElement) -> Option<InputEvent> {
        slider
            .value()
            .parse::<f32>()
            .ok()
            .map(|value| InputEvent::Translate { axis, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliders_set_one_axis_each() {
        let processor = InputProcessor::default();
        let mut state = InputState::new();
        state.process_event(&InputEvent::Translate { axis: Axis::X, value: 2.0 }, &processor);
        state.process_event(&InputEvent::Translate { axis: Axis::Z, value: -4.5 }, &processor);
        assert_eq!(state.translation, Vec3::new(2.0, 0.0, -4.5));
        assert_eq!(state.translation(Axis::Z), -4.5);
    }

    #[test]
    fn click_and_toggle_key_flip_pause() {
        let processor = InputProcessor::default();
        let mut state = InputState::new();
        assert!(!state.paused);

        state.process_event(&InputEvent::TogglePause, &processor);
        assert!(state.paused);
        state.process_event(&InputEvent::KeyDown("A".to_string()), &processor);
        assert!(!state.paused);
        state.process_event(&InputEvent::KeyDown("s".to_string()), &processor);
        assert!(!state.paused);
    }

    #[test]
    fn custom_binding() {
        let processor = InputProcessor::new(KeyBindings { toggle_pause: " ".to_string() });
        assert!(processor.wants_to_toggle_pause(" "));
        assert!(!processor.wants_to_toggle_pause("a"));
    }
}

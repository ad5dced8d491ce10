use std::ops::RangeInclusive;

use egui::Context;
use crate::controller::{Axis, InputEvent, InputState};

/// Build the controls window and return the input events it produced
pub fn build_ui(
    ctx: &Context,
    input_state: &InputState,
    slider_range: &RangeInclusive<f32>,
    toggle_key: &str,
    fps: f32,
) -> Vec<InputEvent> {
    let mut events = Vec::new();

    egui::Window::new("Controls")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            for axis in Axis::ALL {
                let mut value = input_state.translation(axis);
                let slider = egui::Slider::new(&mut value, slider_range.clone())
                    .text(format!("{} translation", axis.label()));
                if ui.add(slider).changed() {
                    events.push(InputEvent::Translate { axis, value });
                }
            }

            ui.separator();
            let label = if input_state.paused { "Play" } else { "Pause" };
            if ui.button(label).clicked() {
                events.push(InputEvent::TogglePause);
            }

            ui.separator();
            ui.label(egui::RichText::new(format!("FPS: {:.0}", fps)).small());
            ui.label(egui::RichText::new(format!("{} - Toggle rotation", toggle_key.to_uppercase())).small());
        });

    events
}

/// Whether egui asked for the overlay to be redrawn right away
pub fn needs_repaint(output: &egui::FullOutput) -> bool {
    output
        .viewport_output
        .get(&egui::ViewportId::ROOT)
        .is_some_and(|viewport| viewport.repaint_delay.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_frame_produces_no_events() {
        let ctx = Context::default();
        let state = InputState::default();
        let mut events = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            events = build_ui(ctx, &state, &(-5.0..=5.0), "a", 60.0);
        });
        assert!(events.is_empty());
    }

    #[test]
    fn idle_overlay_settles_and_requests_wake_it() {
        let ctx = Context::default();
        let state = InputState::default();
        let frame = |request: bool| {
            ctx.run(egui::RawInput::default(), |ctx| {
                build_ui(ctx, &state, &(-5.0..=5.0), "a", 60.0);
                if request {
                    ctx.request_repaint();
                }
            })
        };

        // first frames lay the window out and ask for more
        assert!((0..10).any(|_| !needs_repaint(&frame(false))));
        assert!(needs_repaint(&frame(true)));
    }
}

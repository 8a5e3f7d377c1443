//! Stock demo window
//!
//! A small panel exercising text, a slider, a color editor and buttons.
//! All state lives in [`DemoWindow`] so it can be driven without a GPU.

use crate::UiAction;

/// Title of the demo window
pub const DEMO_WINDOW_TITLE: &str = "Dear ImGui";

/// State behind the demo window
#[derive(Debug, Clone, PartialEq)]
pub struct DemoWindow {
    /// Value edited by the slider, in `0.0..=1.0`
    pub slider_value: f32,
    /// Times the counter button was pressed
    pub counter: u32,
    /// Background clear color (RGBA, alpha is not edited)
    pub clear_color: [f32; 4],
    exit_requested: bool,
}

impl DemoWindow {
    /// Create demo state with the given background color
    pub const fn new(clear_color: [f32; 4]) -> Self {
        Self {
            slider_value: 0.0,
            counter: 0,
            clear_color,
            exit_requested: false,
        }
    }

    /// Counter button handler
    pub fn press_counter(&mut self) {
        self.counter = self.counter.wrapping_add(1);
    }

    /// Exit button handler
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Whether the exit button was pressed
    pub const fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Action the engine should take after this frame
    pub const fn action(&self) -> UiAction {
        if self.exit_requested {
            UiAction::Exit
        } else {
            UiAction::Continue
        }
    }

    /// Label shown next to the counter button
    pub fn counter_label(&self) -> String {
        format!("counter = {}", self.counter)
    }

    /// Framerate label
    pub fn framerate_label(framerate: f32) -> String {
        format!("FPS: {framerate:.1}")
    }

    /// Draw the window for this frame
    pub fn build(&mut self, ui: &imgui::Ui, framerate: f32) -> UiAction {
        ui.window(DEMO_WINDOW_TITLE).build(|| {
            ui.text("Just some text");

            ui.slider("float", 0.0, 1.0, &mut self.slider_value);

            let [r, g, b, a] = self.clear_color;
            let mut rgb = [r, g, b];
            if ui.color_edit3("clear color", &mut rgb) {
                self.clear_color = [rgb[0], rgb[1], rgb[2], a];
            }

            if ui.button("Button") {
                self.press_counter();
            }
            ui.same_line();
            ui.text(self.counter_label());

            if ui.button("Exit") {
                self.request_exit();
            }

            ui.text(Self::framerate_label(framerate));
        });

        self.action()
    }
}

impl Default for DemoWindow {
    fn default() -> Self {
        Self::new([0.45, 0.55, 0.60, 1.00])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let demo = DemoWindow::default();
        assert_eq!(demo.slider_value, 0.0);
        assert_eq!(demo.counter, 0);
        assert_eq!(demo.clear_color, [0.45, 0.55, 0.60, 1.00]);
        assert_eq!(demo.action(), UiAction::Continue);
    }

    #[test]
    fn test_counter_increments() {
        let mut demo = DemoWindow::default();
        demo.press_counter();
        demo.press_counter();
        assert_eq!(demo.counter, 2);
        assert_eq!(demo.counter_label(), "counter = 2");
    }

    #[test]
    fn test_exit_request() {
        let mut demo = DemoWindow::default();
        demo.request_exit();
        assert!(demo.exit_requested());
        assert_eq!(demo.action(), UiAction::Exit);
    }

    #[test]
    fn test_framerate_label_precision() {
        assert_eq!(DemoWindow::framerate_label(59.94), "FPS: 59.9");
    }
}

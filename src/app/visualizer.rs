// Visualizer key actions become control events, the same path a settings
// panel would use.

use crate::action::Action;
use crate::app::App;
use crate::visualizer::settings::{SENSITIVITY_RANGE, SMOOTHING_RANGE};
use crate::visualizer::{ControlEvent, VisualizerBinder};

const SENSITIVITY_STEP: f64 = 0.05;
const SMOOTHING_STEP: f64 = 0.05;

/// Step a slider value, rounded to two decimals and kept in range.
pub fn step_value(value: f64, delta: f64, range: (f64, f64)) -> f64 {
    (((value + delta) * 100.0).round() / 100.0).clamp(range.0, range.1)
}

impl App {
    pub(crate) fn handle_visualizer_action(&mut self, action: &Action) {
        let Some(view) = self.binder.as_ref().map(VisualizerBinder::view) else {
            return;
        };
        let event = match action {
            Action::ToggleVisualizer => ControlEvent::Toggle(!view.toggle_checked),
            Action::CycleVisualizerMode => {
                ControlEvent::Mode(view.active_mode.next().as_str().to_string())
            }
            Action::CycleVisualizerTheme => {
                ControlEvent::Theme(view.theme.next().as_str().to_string())
            }
            Action::SensitivityUp => ControlEvent::Sensitivity(step_value(
                view.sensitivity_value,
                SENSITIVITY_STEP,
                SENSITIVITY_RANGE,
            )),
            Action::SensitivityDown => ControlEvent::Sensitivity(step_value(
                view.sensitivity_value,
                -SENSITIVITY_STEP,
                SENSITIVITY_RANGE,
            )),
            Action::SmoothingUp => ControlEvent::Smoothing(step_value(
                view.smoothing_value,
                SMOOTHING_STEP,
                SMOOTHING_RANGE,
            )),
            Action::SmoothingDown => ControlEvent::Smoothing(step_value(
                view.smoothing_value,
                -SMOOTHING_STEP,
                SMOOTHING_RANGE,
            )),
            _ => return,
        };
        self.controls.emit(event);
    }
}

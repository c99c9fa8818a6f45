// Visualizer panel: control strip (badge, mode, theme, sliders) over the
// braille canvas, with the placeholder message while not rendering.

use std::cell::RefCell;
use std::rc::Rc;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::canvas::BrailleCanvas;
use crate::components::Component;
use crate::visualizer::{ControlView, EngineState, Mode};
use crate::theme::Theme;

/// Rows taken by the control strip above the canvas.
pub const CONTROL_ROWS: u16 = 2;

pub struct VisualizerPanel {
    action_tx: Option<UnboundedSender<Action>>,
    canvas: Rc<RefCell<BrailleCanvas>>,
    view: Option<ControlView>,
}

impl VisualizerPanel {
    pub fn new(canvas: Rc<RefCell<BrailleCanvas>>) -> Self {
        Self {
            action_tx: None,
            canvas,
            view: None,
        }
    }

    pub fn set_view(&mut self, view: Option<ControlView>) {
        self.view = view;
    }

    pub fn view(&self) -> Option<&ControlView> {
        self.view.as_ref()
    }

    /// The part of `area` the canvas occupies.
    pub fn canvas_area(area: Rect) -> Rect {
        let [_, canvas] =
            Layout::vertical([Constraint::Length(CONTROL_ROWS), Constraint::Min(0)]).areas(area);
        canvas
    }
}

impl Component for VisualizerPanel {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) {
        self.action_tx = Some(tx);
    }

    fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [controls, canvas_area] =
            Layout::vertical([Constraint::Length(CONTROL_ROWS), Constraint::Min(0)]).areas(area);

        let Some(view) = &self.view else {
            let line = Line::from(Span::styled(
                "Visualizer unavailable",
                Style::default().fg(theme.text_dim),
            ));
            frame.render_widget(
                Paragraph::new(line).alignment(Alignment::Center),
                canvas_area,
            );
            return;
        };

        let badge_color = match view.badge_state {
            EngineState::Running => theme.success,
            EngineState::Idle => theme.accent,
            EngineState::Disabled => theme.text_dim,
        };
        let key = Style::default().fg(theme.text);
        let dim = Style::default().fg(theme.text_dim);
        let div = Span::styled(" │ ", Style::default().fg(theme.border));

        let mut modes: Vec<Span> = vec![Span::styled(" ", dim)];
        for mode in Mode::ALL {
            let style = if mode == view.active_mode {
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                dim
            };
            modes.push(Span::styled(format!(" {} ", mode.label()), style));
        }

        let first = Line::from(
            [
                vec![
                    Span::styled(
                        format!(" ● {} ", view.badge_label),
                        Style::default().fg(badge_color).add_modifier(Modifier::BOLD),
                    ),
                    div.clone(),
                    Span::styled(if view.toggle_checked { "[x]" } else { "[ ]" }, key),
                    Span::styled(" On", dim),
                    div.clone(),
                ],
                modes,
            ]
            .concat(),
        );
        let second = Line::from(vec![
            Span::styled(" Theme ", dim),
            Span::styled(view.theme.as_str(), Style::default().fg(theme.accent)),
            div.clone(),
            Span::styled("Sensitivity ", dim),
            Span::styled(view.sensitivity_label.clone(), key),
            div,
            Span::styled("Smoothing ", dim),
            Span::styled(view.smoothing_label.clone(), key),
        ]);
        frame.render_widget(Paragraph::new(vec![first, second]), controls);

        if let Some(message) = view.placeholder {
            let [_, middle, _] = Layout::vertical([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .areas(canvas_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(message, dim)))
                    .alignment(Alignment::Center),
                middle,
            );
            return;
        }

        frame.render_widget(&*self.canvas.borrow(), canvas_area);
    }
}

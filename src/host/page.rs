// Page lifecycle capability: visibility, device pixel ratio, the canvas
// container's size, and resize notifications.

use std::cell::RefCell;
use std::rc::Rc;

use super::events::{Listener, ListenerId, Listeners};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    VisibilityChange,
    /// The whole window changed size.
    WindowResize,
    /// The observed canvas container changed size.
    ContainerResize,
}

pub trait PageHost {
    fn is_hidden(&self) -> bool;
    fn device_pixel_ratio(&self) -> f64;
    /// Logical size of the canvas container, `None` before layout.
    fn container_size(&self) -> Option<(f64, f64)>;
    /// Subscribe to one kind of event. Returns `None` when the host cannot
    /// deliver that kind (e.g. no container resize observation).
    fn observe(&mut self, kind: PageEvent, listener: Listener<PageEvent>) -> Option<ListenerId>;
    fn unobserve(&mut self, id: ListenerId);
    fn listeners(&self, kind: PageEvent) -> Vec<Listener<PageEvent>>;
}

pub type SharedPage = Rc<RefCell<dyn PageHost>>;

pub fn dispatch_page_event(page: &SharedPage, event: PageEvent) {
    let listeners = page.borrow().listeners(event);
    for listener in listeners {
        listener(&event);
    }
}

/// The terminal as a page: window focus stands in for tab visibility and the
/// visualizer panel is the canvas container.
///
/// One logical unit is one cell wide and half a cell tall; braille cells hold
/// 2x4 dots, so the pixel ratio is 2.
pub struct TerminalPage {
    focused: bool,
    container: Option<(f64, f64)>,
    visibility: Listeners<PageEvent>,
    window_resize: Listeners<PageEvent>,
    container_resize: Listeners<PageEvent>,
}

pub const TERMINAL_PIXEL_RATIO: f64 = 2.0;

impl Default for TerminalPage {
    fn default() -> Self {
        Self {
            focused: true,
            container: None,
            visibility: Listeners::new(),
            window_resize: Listeners::new(),
            container_resize: Listeners::new(),
        }
    }
}

impl TerminalPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record focus; returns the event to dispatch when it changed.
    pub fn set_focused(&mut self, focused: bool) -> Option<PageEvent> {
        if self.focused == focused {
            return None;
        }
        self.focused = focused;
        Some(PageEvent::VisibilityChange)
    }

    /// Record the visualizer panel size in cells; returns the event to
    /// dispatch when it changed.
    pub fn set_container_cells(&mut self, cols: u16, rows: u16) -> Option<PageEvent> {
        let size = (f64::from(cols), f64::from(rows) * 2.0);
        if self.container == Some(size) {
            return None;
        }
        self.container = Some(size);
        Some(PageEvent::ContainerResize)
    }

    fn list_mut(&mut self, kind: PageEvent) -> &mut Listeners<PageEvent> {
        match kind {
            PageEvent::VisibilityChange => &mut self.visibility,
            PageEvent::WindowResize => &mut self.window_resize,
            PageEvent::ContainerResize => &mut self.container_resize,
        }
    }
}

impl PageHost for TerminalPage {
    fn is_hidden(&self) -> bool {
        !self.focused
    }

    fn device_pixel_ratio(&self) -> f64 {
        TERMINAL_PIXEL_RATIO
    }

    fn container_size(&self) -> Option<(f64, f64)> {
        self.container
    }

    fn observe(&mut self, kind: PageEvent, listener: Listener<PageEvent>) -> Option<ListenerId> {
        Some(self.list_mut(kind).add(listener))
    }

    fn unobserve(&mut self, id: ListenerId) {
        let _ = self.visibility.remove(id)
            || self.window_resize.remove(id)
            || self.container_resize.remove(id);
    }

    fn listeners(&self, kind: PageEvent) -> Vec<Listener<PageEvent>> {
        match kind {
            PageEvent::VisibilityChange => self.visibility.snapshot(),
            PageEvent::WindowResize => self.window_resize.snapshot(),
            PageEvent::ContainerResize => self.container_resize.snapshot(),
        }
    }
}

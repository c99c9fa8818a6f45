// Listener registry shared by every host capability that emits events
// (media element, page, control bus).
//
// Dispatch always works on a snapshot so a listener may add or remove
// listeners, or borrow the emitter, while it runs.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

// Ids are unique across every registry, so a host holding several lists can
// route an `unobserve` to the right one.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle returned by `add`, used to detach a listener later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener<E> = Rc<dyn Fn(&E)>;

pub struct Listeners<E> {
    entries: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.entries.push((id, listener));
        id
    }

    /// Detach a listener. Unknown ids are ignored.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone out the current listeners so the caller can release any borrow
    /// on the owner before invoking them.
    pub fn snapshot(&self) -> Vec<Listener<E>> {
        self.entries.iter().map(|(_, l)| Rc::clone(l)).collect()
    }

    pub fn emit(&self, event: &E) {
        for listener in self.snapshot() {
            listener(event);
        }
    }
}

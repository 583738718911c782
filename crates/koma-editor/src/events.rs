//! Typed editor event channel.
//!
//! The overlay (DOM) layer and the canvas layer render the same logical
//! elements but never call each other directly: both subscribe here and
//! react to selection/edit events. This replaces ambient global event
//! dispatch with a channel owned by the editor session — subscribers are
//! dropped on `clear()`, so nothing outlives the editor unmount.
//!
//! Emission is synchronous and in registration order.

use koma_core::ElementId;

/// Events broadcast by the selection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Selection contents changed.
    SelectionChanged {
        selected: Vec<ElementId>,
        active: Option<ElementId>,
    },
    /// Selection emptied (empty-canvas click or cleanup).
    SelectionCleared,
    /// The overlay layer should refresh highlight state for a bubble.
    OverlaySync { id: ElementId },
    /// The canvas layer should refresh highlight state for an element.
    CanvasSync { id: ElementId },
    /// A bubble entered inline text editing.
    EditModeEntered { id: ElementId },
    /// Inline text editing ended.
    EditModeExited { id: ElementId },
    /// While `true`, layers must not route clicks into selection.
    SelectionSuppressed { suppressed: bool },
}

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&EditorEvent)>;

/// Single-owner publish/subscribe channel.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Returns a handle for `unsubscribe`.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every subscriber, in registration order.
    pub fn emit(&mut self, event: &EditorEvent) {
        log::trace!("editor event: {event:?}");
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    /// Drop all subscribers. Called on editor unmount.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emit_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |_| seen.borrow_mut().push(tag));
        }
        bus.emit(&EditorEvent::SelectionCleared);

        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();

        let c = Rc::clone(&count);
        let sub = bus.subscribe(move |_| *c.borrow_mut() += 1);

        bus.emit(&EditorEvent::SelectionCleared);
        assert!(bus.unsubscribe(sub));
        bus.emit(&EditorEvent::SelectionCleared);

        assert_eq!(*count.borrow(), 1);
        assert!(!bus.unsubscribe(sub));
    }

    #[test]
    fn clear_drops_everything() {
        let mut bus = EventBus::new();
        bus.subscribe(|_| {});
        bus.subscribe(|_| {});
        assert_eq!(bus.subscriber_count(), 2);
        bus.clear();
        assert_eq!(bus.subscriber_count(), 0);
    }
}

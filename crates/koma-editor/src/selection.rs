//! Selection manager: pointer → logical target resolution, selection
//! state, and the edit-mode state machine.
//!
//! Every pointer event resolves to exactly one target, checked in strict
//! priority order:
//!
//! 1. **Overlay bubbles** — dialogue bubbles live in an HTML overlay
//!    above the canvas and must stay clickable even when they visually
//!    overlap a panel, so their registered DOM bounds are tested first.
//! 2. **Canvas elements** — point-in-rectangle against non-bubble
//!    elements in descending z-index, first hit wins. Requires a
//!    registered `ViewTransform`; without one this layer is skipped.
//! 3. **Empty canvas** — absence is a valid terminal outcome, not an
//!    error.
//!
//! The manager is constructed per editor session and passed down
//! explicitly; `cleanup()` tears down state and subscribers on unmount.

use crate::events::{EditorEvent, EventBus};
use crate::input::PointerEvent;
use koma_core::geometry::{Rect, ViewTransform};
use koma_core::model::{Layer, PageState};
use koma_core::ElementId;
use smallvec::SmallVec;

/// What a pointer event resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A dialogue bubble in the DOM overlay.
    Bubble(ElementId),
    /// A panel/image/text element on the canvas layer.
    CanvasElement(ElementId),
    /// Open canvas.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Multiple,
}

/// Transient per-session selection state. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub selected: SmallVec<[ElementId; 4]>,
    pub active_element: Option<ElementId>,
    pub mode: SelectionMode,
    pub is_editing: bool,
    pub editing_element_id: Option<ElementId>,
}

/// Coordinates selection across the overlay and canvas layers.
pub struct SelectionManager {
    state: SelectionState,
    bus: EventBus,
    /// Bubble bounds registered by the overlay layer, in DOM pixels.
    /// Later registrations are stacked on top.
    overlay: Vec<(ElementId, Rect)>,
    /// Canvas pan/zoom; `None` until the canvas layer attaches.
    view: Option<ViewTransform>,
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionManager {
    pub fn new() -> Self {
        Self {
            state: SelectionState::default(),
            bus: EventBus::new(),
            overlay: Vec::new(),
            view: None,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    // ─── Layer registration ──────────────────────────────────────────────

    /// Called by the canvas layer whenever pan or zoom changes.
    pub fn set_view_transform(&mut self, view: Option<ViewTransform>) {
        self.view = view;
    }

    /// The overlay layer registers (or refreshes) a bubble's DOM bounds.
    pub fn register_overlay_bounds(&mut self, id: ElementId, bounds: Rect) {
        if let Some(entry) = self.overlay.iter_mut().find(|(eid, _)| *eid == id) {
            entry.1 = bounds;
        } else {
            self.overlay.push((id, bounds));
        }
    }

    pub fn remove_overlay_bounds(&mut self, id: ElementId) {
        self.overlay.retain(|(eid, _)| *eid != id);
    }

    // ─── Target resolution ───────────────────────────────────────────────

    /// Resolve a pointer event to its logical target. Pure read; does not
    /// touch selection state.
    pub fn identify_target(&self, event: &PointerEvent, page: &PageState) -> Target {
        let dom_point = event.position();

        // Overlay first: topmost registration wins.
        for (id, bounds) in self.overlay.iter().rev() {
            if bounds.contains(dom_point) {
                return Target::Bubble(*id);
            }
        }

        // Canvas layer needs a view transform; skip gracefully without one.
        let Some(view) = self.view else {
            log::debug!("no view transform attached, skipping canvas hit-test");
            return Target::Empty;
        };
        let canvas_point = view.dom_to_canvas(dom_point);
        for element in page.canvas_hit_order() {
            if element.transform.bounds().contains(canvas_point) {
                return Target::CanvasElement(element.id);
            }
        }

        Target::Empty
    }

    /// Full click handling: resolve the target and update selection.
    ///
    /// While a bubble is in edit mode, clicks inside it are ignored (the
    /// user is typing); a click anywhere else exits edit mode first and
    /// then applies as a normal selection click.
    pub fn handle_pointer(&mut self, event: &PointerEvent, page: &PageState) -> Target {
        let target = self.identify_target(event, page);

        if self.state.is_editing {
            if let Target::Bubble(id) = target
                && self.state.editing_element_id == Some(id)
            {
                return target;
            }
            self.exit_edit_mode();
        }

        match target {
            Target::Bubble(id) => self.select_element(id, Layer::Overlay),
            Target::CanvasElement(id) => self.select_element(id, Layer::Canvas),
            Target::Empty => {
                // Shift-click on empty space keeps a multi-selection alive.
                if !(event.modifiers.shift && self.state.mode == SelectionMode::Multiple) {
                    self.clear_selection();
                }
            }
        }
        target
    }

    // ─── Selection state ─────────────────────────────────────────────────

    /// Select an element and notify both layers.
    ///
    /// Single mode replaces the selection; multiple mode toggles
    /// membership. The layer-specific sync event keeps the other
    /// rendering surface visually consistent without direct coupling.
    pub fn select_element(&mut self, id: ElementId, layer: Layer) {
        match self.state.mode {
            SelectionMode::Single => {
                self.state.selected.clear();
                self.state.selected.push(id);
                self.state.active_element = Some(id);
            }
            SelectionMode::Multiple => {
                if let Some(pos) = self.state.selected.iter().position(|e| *e == id) {
                    self.state.selected.remove(pos);
                    self.state.active_element = self.state.selected.last().copied();
                } else {
                    self.state.selected.push(id);
                    self.state.active_element = Some(id);
                }
            }
        }

        self.bus.emit(&EditorEvent::SelectionChanged {
            selected: self.state.selected.to_vec(),
            active: self.state.active_element,
        });
        match layer {
            Layer::Overlay => self.bus.emit(&EditorEvent::OverlaySync { id }),
            Layer::Canvas => self.bus.emit(&EditorEvent::CanvasSync { id }),
        }
    }

    pub fn clear_selection(&mut self) {
        if self.state.selected.is_empty() && self.state.active_element.is_none() {
            return;
        }
        self.state.selected.clear();
        self.state.active_element = None;
        self.bus.emit(&EditorEvent::SelectionCleared);
    }

    /// Switching back to single mode collapses the selection to the
    /// active element.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if self.state.mode == mode {
            return;
        }
        self.state.mode = mode;
        if mode == SelectionMode::Single
            && let Some(active) = self.state.active_element
        {
            self.state.selected.clear();
            self.state.selected.push(active);
        }
    }

    // ─── Edit mode ───────────────────────────────────────────────────────

    /// Enter inline text editing for a bubble. No nested edit sessions:
    /// if another element is being edited, its exit events fire before
    /// this element's enter events.
    pub fn start_edit_mode(&mut self, id: ElementId) {
        if self.state.editing_element_id == Some(id) {
            return;
        }
        if self.state.is_editing {
            self.exit_edit_mode();
        }

        self.select_element(id, Layer::Overlay);
        self.state.is_editing = true;
        self.state.editing_element_id = Some(id);
        self.bus.emit(&EditorEvent::EditModeEntered { id });
        self.bus
            .emit(&EditorEvent::SelectionSuppressed { suppressed: true });
    }

    pub fn exit_edit_mode(&mut self) {
        let Some(id) = self.state.editing_element_id.take() else {
            return;
        };
        self.state.is_editing = false;
        self.bus.emit(&EditorEvent::EditModeExited { id });
        self.bus
            .emit(&EditorEvent::SelectionSuppressed { suppressed: false });
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Tear down on editor unmount: drop selection state, the overlay
    /// registry, and every bus subscriber.
    pub fn cleanup(&mut self) {
        self.state = SelectionState::default();
        self.overlay.clear();
        self.view = None;
        self.bus.clear();
    }
}

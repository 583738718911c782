//! Element and page model for the assembly editor.
//!
//! A page is a flat, ordered list of `AssemblyElement` values plus the
//! canvas viewport state. Elements are a closed sum over the four kinds
//! the editor knows (panel frames, placed images, dialogue bubbles, free
//! text); matching on `ElementKind` is exhaustive, so a new kind cannot
//! be half-wired. Dialogue bubbles are rendered in the DOM overlay above
//! the canvas surface, everything else on the canvas layer — `layer()`
//! is the single place that distinction lives.

use crate::geometry::Rect;
use crate::id::ElementId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Color ───────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0]; crosses the wire as a CSS
/// hex string (`#RRGGBB` or `#RRGGBBAA`), matching what the rendering
/// hosts consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`; the `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let byte = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);
        match bytes.len() {
            6 => {
                let r = byte(0)?;
                let g = byte(2)?;
                let b = byte(4)?;
                Some(Self::rgba(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                    1.0,
                ))
            }
            8 => {
                let r = byte(0)?;
                let g = byte(2)?;
                let b = byte(4)?;
                let a = byte(6)?;
                Some(Self::rgba(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                    a as f32 / 255.0,
                ))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        let a = (self.a * 255.0).round() as u8;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {s}")))
    }
}

// ─── Styles ──────────────────────────────────────────────────────────────

/// Panel frame styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelStyle {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f32,
    pub corner_radius: f32,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            stroke: Color::BLACK,
            stroke_width: 2.0,
            corner_radius: 0.0,
        }
    }
}

/// Speech/thought bubble shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleShape {
    #[default]
    Speech,
    Thought,
    Shout,
    Whisper,
}

/// Dialogue bubble styling (rendered by the DOM overlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleStyle {
    pub shape: BubbleShape,
    pub fill: Color,
    pub font_size: f32,
    /// Tail direction in degrees, pointing toward the speaker.
    pub tail_angle: f32,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            shape: BubbleShape::Speech,
            fill: Color::WHITE,
            font_size: 14.0,
            tail_angle: 225.0,
        }
    }
}

/// Free-text styling (sound effects, captions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub color: Color,
    pub font_size: f32,
    pub bold: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_size: 18.0,
            bold: false,
        }
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// Which rendering surface an element lives on.
///
/// Dialogue bubbles are HTML in an overlay above the canvas so their text
/// stays editable; they must win hit-testing over anything painted below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Overlay,
    Canvas,
}

/// Position and extent of an element on the page, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation in degrees around the element center.
    pub rotation: f32,
    pub z_index: i32,
}

impl Transform {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
            z_index: 0,
        }
    }

    /// Axis-aligned bounds used for hit-testing. Rotation is ignored —
    /// the source editor hit-tests unrotated boxes and panels are almost
    /// always axis-aligned.
    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// The element kinds a page can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// A panel frame on the canvas layer.
    Panel { style: PanelStyle },

    /// A placed (AI-generated or uploaded) image.
    Image { src: String, alt: Option<String> },

    /// A dialogue bubble — DOM overlay, always wins selection.
    Dialogue { text: String, style: BubbleStyle },

    /// Free-floating text on the canvas layer.
    #[serde(rename = "text")]
    FreeText { text: String, style: TextStyle },
}

impl ElementKind {
    /// Prefix used when generating ids for this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ElementKind::Panel { .. } => "panel",
            ElementKind::Image { .. } => "image",
            ElementKind::Dialogue { .. } => "bubble",
            ElementKind::FreeText { .. } => "text",
        }
    }
}

/// One element of a page: id + kind + transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyElement {
    pub id: ElementId,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub transform: Transform,
}

impl AssemblyElement {
    /// Create an element with a freshly generated id.
    pub fn new(kind: ElementKind, transform: Transform) -> Self {
        Self {
            id: ElementId::generate(kind.id_prefix()),
            kind,
            transform,
        }
    }

    /// Which surface renders (and owns hit-testing for) this element.
    pub fn layer(&self) -> Layer {
        match self.kind {
            ElementKind::Dialogue { .. } => Layer::Overlay,
            _ => Layer::Canvas,
        }
    }

    pub fn is_dialogue(&self) -> bool {
        matches!(self.kind, ElementKind::Dialogue { .. })
    }

    /// Deep copy under a fresh id, identical kind and transform.
    /// Used by page duplication.
    pub fn duplicate(&self) -> Self {
        Self {
            id: ElementId::generate(self.kind.id_prefix()),
            kind: self.kind.clone(),
            transform: self.transform,
        }
    }
}

// ─── Canvas viewport state ───────────────────────────────────────────────

/// The active tool in the assembly editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Panel,
    Bubble,
    Text,
    Pan,
}

/// Per-page canvas viewport state. Persisted alongside the elements so a
/// reopened page shows the same view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasView {
    pub position_x: f32,
    pub position_y: f32,
    pub zoom: f32,
    pub show_grid: bool,
    pub grid_size: f32,
    pub active_tool: ToolKind,
    pub last_active_tab: String,
    pub timestamp: u64,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            zoom: 1.0,
            show_grid: false,
            grid_size: 20.0,
            active_tool: ToolKind::Select,
            last_active_tab: "assembly".into(),
            timestamp: 0,
        }
    }
}

// ─── Page status ─────────────────────────────────────────────────────────

/// Coarse page progress derived from element count.
///
/// The `< 3` threshold is a placeholder policy carried over from the
/// product, not a load-bearing contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Draft,
    InProgress,
    Completed,
}

impl PageStatus {
    pub fn for_element_count(count: usize) -> Self {
        match count {
            0 => PageStatus::Draft,
            1..=2 => PageStatus::InProgress,
            _ => PageStatus::Completed,
        }
    }
}

// ─── Page ────────────────────────────────────────────────────────────────

/// One manga page: ordered elements + canvas viewport state.
///
/// Invariant: element ids are unique within the page. Inserting an
/// element whose id already exists replaces the old element in place,
/// keeping its position in the list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub elements: Vec<AssemblyElement>,
    pub view: CanvasView,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&AssemblyElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut AssemblyElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Insert an element, replacing any existing element with the same id.
    pub fn insert(&mut self, element: AssemblyElement) {
        if let Some(existing) = self.get_mut(element.id) {
            *existing = element;
        } else {
            self.elements.push(element);
        }
    }

    pub fn remove(&mut self, id: ElementId) -> Option<AssemblyElement> {
        let pos = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(pos))
    }

    /// Canvas-layer elements in hit-test order: descending z-index,
    /// later-inserted first on ties (matches paint order, topmost first).
    /// Dialogue bubbles never appear here — the overlay owns them.
    pub fn canvas_hit_order(&self) -> Vec<&AssemblyElement> {
        let mut hits: Vec<(usize, &AssemblyElement)> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.layer() == Layer::Canvas)
            .collect();
        hits.sort_by(|(ia, a), (ib, b)| {
            b.transform
                .z_index
                .cmp(&a.transform.z_index)
                .then(ib.cmp(ia))
        });
        hits.into_iter().map(|(_, e)| e).collect()
    }

    pub fn status(&self) -> PageStatus {
        PageStatus::for_element_count(self.elements.len())
    }
}

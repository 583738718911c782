//! Wire serialization for page state.
//!
//! `SerializedState` is the JSON shape that crosses the persistence
//! boundary: `{ pageId, projectId, content.stage { … children }, metadata
//! { version, timestamp } }`. Round-trip guarantee: N elements in, N
//! elements out, ids and transforms intact.

use crate::model::{AssemblyElement, Color, PageState};
use serde::{Deserialize, Serialize};

/// Bumped whenever the wire shape changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// Stage dimensions and background for one page. Owned by the host (the
/// project's page template); defaults to B4 manga paper proportions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSettings {
    pub width: f32,
    pub height: f32,
    pub background_color: Color,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1414.0,
            background_color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub width: f32,
    pub height: f32,
    pub background_color: Color,
    pub children: Vec<AssemblyElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: u32,
    pub timestamp: u64,
}

/// The full serialized form of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedState {
    pub page_id: String,
    pub project_id: String,
    pub content: PageContent,
    pub metadata: Metadata,
}

/// Serialize a page into the wire shape.
pub fn serialize_page(
    page: &PageState,
    page_id: &str,
    project_id: &str,
    stage: StageSettings,
    now_ms: u64,
) -> SerializedState {
    SerializedState {
        page_id: page_id.to_string(),
        project_id: project_id.to_string(),
        content: PageContent {
            stage: Stage {
                width: stage.width,
                height: stage.height,
                background_color: stage.background_color,
                children: page.elements.clone(),
            },
        },
        metadata: Metadata {
            version: FORMAT_VERSION,
            timestamp: now_ms,
        },
    }
}

impl SerializedState {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn element_count(&self) -> usize {
        self.content.stage.children.len()
    }

    /// Replace a page's elements with this payload's children. The canvas
    /// viewport state is local to the session and left untouched.
    pub fn apply_to(&self, page: &mut PageState) {
        page.elements = self.content.stage.children.clone();
    }
}

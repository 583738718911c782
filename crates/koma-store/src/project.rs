//! Project store: the single source of truth for one open project.
//!
//! Holds every editable slice (script, characters, backgrounds, decors,
//! scenes, assembly pages) for the session. Updates stamp the touched
//! slice and flip a global dirty flag; `save_to_database` pushes all
//! slices in one call and clears the flag only on success. Loading
//! degrades gracefully — an unreachable backend leaves the defaults in
//! place so the editor stays usable.
//!
//! A JSON mirror of the whole store lives in local storage under
//! `koma_project_<projectId>`, with a versioned migration step for
//! shapes written by older releases.

use crate::backend::{BlobStore, Notifier, PageBackend};
use crate::error::Result;
use koma_core::model::{AssemblyElement, CanvasView, PageState};
use serde::{Deserialize, Serialize};

/// Version of the persisted mirror shape.
pub const MIRROR_VERSION: u32 = 2;

const MIRROR_KEY_PREFIX: &str = "koma_project_";

// ─── Project data slices ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptData {
    pub title: String,
    pub synopsis: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRecord {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorRecord {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    pub id: String,
    pub summary: String,
    pub image_url: Option<String>,
}

/// The page-assembly slice: all pages plus which one is open.
/// Pages are addressed by contiguous 1-based numbers; deleting a page
/// renumbers the remainder implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyData {
    pub pages: Vec<PageState>,
    pub current_page: usize,
}

impl Default for AssemblyData {
    fn default() -> Self {
        Self {
            pages: vec![PageState::new()],
            current_page: 1,
        }
    }
}

/// Per-slice modification stamps (ms since epoch).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceStamps {
    pub script: Option<u64>,
    pub characters: Option<u64>,
    pub backgrounds: Option<u64>,
    pub decors: Option<u64>,
    pub scenes: Option<u64>,
    pub assembly: Option<u64>,
}

/// The full store as it crosses the persistence boundary (backend and
/// local mirror use the same shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub version: u32,
    pub project_id: String,
    pub script: ScriptData,
    pub characters: Vec<CharacterRecord>,
    pub backgrounds: Vec<BackgroundRecord>,
    pub decors: Vec<DecorRecord>,
    pub scenes: Vec<SceneRecord>,
    pub assembly: AssemblyData,
    pub saved_at_ms: u64,
}

// ─── Store ───────────────────────────────────────────────────────────────

/// Client-side store for the open project. Page-lifetime singleton per
/// the hosting page model: created on project open, torn down on
/// navigation away.
pub struct ProjectStore {
    project_id: String,
    script: ScriptData,
    characters: Vec<CharacterRecord>,
    backgrounds: Vec<BackgroundRecord>,
    decors: Vec<DecorRecord>,
    scenes: Vec<SceneRecord>,
    assembly: AssemblyData,
    stamps: SliceStamps,
    has_unsaved_changes: bool,
    last_saved_to_db_ms: Option<u64>,
    last_saved_to_local_ms: Option<u64>,
}

impl ProjectStore {
    /// Fresh store for a newly opened project: defaults everywhere, one
    /// empty page.
    pub fn initialize(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            script: ScriptData::default(),
            characters: Vec::new(),
            backgrounds: Vec::new(),
            decors: Vec::new(),
            scenes: Vec::new(),
            assembly: AssemblyData::default(),
            stamps: SliceStamps::default(),
            has_unsaved_changes: false,
            last_saved_to_db_ms: None,
            last_saved_to_local_ms: None,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn last_saved_to_db_ms(&self) -> Option<u64> {
        self.last_saved_to_db_ms
    }

    pub fn last_saved_to_local_ms(&self) -> Option<u64> {
        self.last_saved_to_local_ms
    }

    pub fn stamps(&self) -> &SliceStamps {
        &self.stamps
    }

    pub fn script(&self) -> &ScriptData {
        &self.script
    }

    pub fn characters(&self) -> &[CharacterRecord] {
        &self.characters
    }

    pub fn backgrounds(&self) -> &[BackgroundRecord] {
        &self.backgrounds
    }

    pub fn decors(&self) -> &[DecorRecord] {
        &self.decors
    }

    pub fn scenes(&self) -> &[SceneRecord] {
        &self.scenes
    }

    pub fn assembly(&self) -> &AssemblyData {
        &self.assembly
    }

    // ─── Slice updates ───────────────────────────────────────────────────

    pub fn update_script(&mut self, script: ScriptData, now_ms: u64) {
        self.script = script;
        self.stamps.script = Some(now_ms);
        self.has_unsaved_changes = true;
    }

    pub fn update_characters(&mut self, characters: Vec<CharacterRecord>, now_ms: u64) {
        self.characters = characters;
        self.stamps.characters = Some(now_ms);
        self.has_unsaved_changes = true;
    }

    pub fn update_backgrounds(&mut self, backgrounds: Vec<BackgroundRecord>, now_ms: u64) {
        self.backgrounds = backgrounds;
        self.stamps.backgrounds = Some(now_ms);
        self.has_unsaved_changes = true;
    }

    pub fn update_decors(&mut self, decors: Vec<DecorRecord>, now_ms: u64) {
        self.decors = decors;
        self.stamps.decors = Some(now_ms);
        self.has_unsaved_changes = true;
    }

    pub fn update_scenes(&mut self, scenes: Vec<SceneRecord>, now_ms: u64) {
        self.scenes = scenes;
        self.stamps.scenes = Some(now_ms);
        self.has_unsaved_changes = true;
    }

    fn touch_assembly(&mut self, now_ms: u64) {
        self.stamps.assembly = Some(now_ms);
        self.has_unsaved_changes = true;
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    pub fn page_count(&self) -> usize {
        self.assembly.pages.len()
    }

    /// 1-based page lookup.
    pub fn page(&self, number: usize) -> Option<&PageState> {
        number
            .checked_sub(1)
            .and_then(|i| self.assembly.pages.get(i))
    }

    pub fn current_page_number(&self) -> usize {
        self.assembly.current_page
    }

    pub fn current_page(&self) -> &PageState {
        &self.assembly.pages[self.assembly.current_page - 1]
    }

    /// Append an empty page and return its number.
    pub fn add_page(&mut self, now_ms: u64) -> usize {
        self.assembly.pages.push(PageState::new());
        self.touch_assembly(now_ms);
        self.assembly.pages.len()
    }

    pub fn set_current_page(&mut self, number: usize) -> bool {
        if number == 0 || number > self.assembly.pages.len() {
            return false;
        }
        self.assembly.current_page = number;
        true
    }

    /// Insert an element into the current page (replacing on id collision).
    pub fn add_element(&mut self, element: AssemblyElement, now_ms: u64) {
        let current = self.assembly.current_page - 1;
        self.assembly.pages[current].insert(element);
        self.touch_assembly(now_ms);
    }

    pub fn remove_element(
        &mut self,
        id: koma_core::ElementId,
        now_ms: u64,
    ) -> Option<AssemblyElement> {
        let current = self.assembly.current_page - 1;
        let removed = self.assembly.pages[current].remove(id);
        if removed.is_some() {
            self.touch_assembly(now_ms);
        }
        removed
    }

    pub fn update_canvas_view(&mut self, view: CanvasView, now_ms: u64) {
        let current = self.assembly.current_page - 1;
        self.assembly.pages[current].view = view;
        self.touch_assembly(now_ms);
    }

    /// Deep-copy a page: every element gets a fresh id but keeps its
    /// transform and content. The copy is appended; returns its number.
    pub fn duplicate_page(&mut self, number: usize, now_ms: u64) -> Option<usize> {
        let source = self.page(number)?;
        let copy = PageState {
            elements: source.elements.iter().map(|e| e.duplicate()).collect(),
            view: source.view.clone(),
        };
        self.assembly.pages.push(copy);
        self.touch_assembly(now_ms);
        Some(self.assembly.pages.len())
    }

    /// Remove a page; the remainder stays contiguously numbered (the
    /// previously-third page of three becomes page 2). The last page
    /// cannot be deleted. The current page is clamped into range.
    pub fn delete_page(&mut self, number: usize, now_ms: u64) -> bool {
        if number == 0 || number > self.assembly.pages.len() || self.assembly.pages.len() == 1 {
            return false;
        }
        self.assembly.pages.remove(number - 1);
        if self.assembly.current_page > self.assembly.pages.len() {
            self.assembly.current_page = self.assembly.pages.len();
        }
        self.touch_assembly(now_ms);
        true
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn snapshot(&self, now_ms: u64) -> ProjectSnapshot {
        ProjectSnapshot {
            version: MIRROR_VERSION,
            project_id: self.project_id.clone(),
            script: self.script.clone(),
            characters: self.characters.clone(),
            backgrounds: self.backgrounds.clone(),
            decors: self.decors.clone(),
            scenes: self.scenes.clone(),
            assembly: self.assembly.clone(),
            saved_at_ms: now_ms,
        }
    }

    fn apply_snapshot(&mut self, snapshot: ProjectSnapshot) {
        self.project_id = snapshot.project_id;
        self.script = snapshot.script;
        self.characters = snapshot.characters;
        self.backgrounds = snapshot.backgrounds;
        self.decors = snapshot.decors;
        self.scenes = snapshot.scenes;
        self.assembly = snapshot.assembly;
        // Never leave the editor without a page to stand on.
        if self.assembly.pages.is_empty() {
            self.assembly = AssemblyData::default();
        }
        if self.assembly.current_page == 0 || self.assembly.current_page > self.assembly.pages.len()
        {
            self.assembly.current_page = 1;
        }
        self.has_unsaved_changes = false;
    }

    /// Push every slice to the backend in one call. Clears the dirty
    /// flag only on success; a toast goes out either way.
    pub fn save_to_database(
        &mut self,
        backend: &mut dyn PageBackend,
        notifier: &mut dyn Notifier,
        now_ms: u64,
    ) -> Result<()> {
        let snapshot = self.snapshot(now_ms);
        match backend.save_project(&snapshot) {
            Ok(()) => {
                self.has_unsaved_changes = false;
                self.last_saved_to_db_ms = Some(now_ms);
                notifier.success("Project saved");
                Ok(())
            }
            Err(e) => {
                log::error!("project save failed for {}: {e}", self.project_id);
                notifier.error("Project save failed — your work is kept locally");
                Err(e)
            }
        }
    }

    /// Pull the project from the backend. Degrades gracefully: on error
    /// the defaults stay and the editor opens anyway (availability over
    /// strict consistency). Returns whether data was loaded.
    pub fn load_from_database(&mut self, backend: &mut dyn PageBackend) -> bool {
        match backend.load_project(&self.project_id.clone()) {
            Ok(Some(snapshot)) => {
                self.apply_snapshot(snapshot);
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!(
                    "project load failed for {}, keeping defaults: {e}",
                    self.project_id
                );
                false
            }
        }
    }

    // ─── Local mirror ────────────────────────────────────────────────────

    fn mirror_key(project_id: &str) -> String {
        format!("{MIRROR_KEY_PREFIX}{project_id}")
    }

    /// Best-effort JSON mirror in local storage. Failures are logged,
    /// never surfaced.
    pub fn save_local_mirror(&mut self, blobs: &mut dyn BlobStore, now_ms: u64) {
        let snapshot = self.snapshot(now_ms);
        let bytes = match serde_json::to_vec(&snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("mirror encode failed: {e}");
                return;
            }
        };
        match blobs.set(&Self::mirror_key(&self.project_id), &bytes) {
            Ok(()) => self.last_saved_to_local_ms = Some(now_ms),
            Err(e) => log::warn!("mirror write skipped: {e}"),
        }
    }

    /// Restore the store from the local mirror, migrating older shapes
    /// first. `None` when there is no usable mirror.
    pub fn load_local_mirror(&mut self, blobs: &dyn BlobStore) -> bool {
        let Some(bytes) = blobs.get(&Self::mirror_key(&self.project_id)) else {
            return false;
        };
        let mut value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("ignoring unreadable mirror: {e}");
                return false;
            }
        };
        if !migrate_mirror(&mut value) {
            return false;
        }
        match serde_json::from_value::<ProjectSnapshot>(value) {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            Err(e) => {
                log::warn!("ignoring incompatible mirror: {e}");
                false
            }
        }
    }
}

/// Upgrade a persisted mirror value to the current shape, in place.
/// Returns false when the value is newer than this build understands.
///
/// v1 → v2: the decors slice and the `currentPage` field did not exist
/// yet; fill in defaults.
pub fn migrate_mirror(value: &mut serde_json::Value) -> bool {
    let version = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(1) as u32;

    if version > MIRROR_VERSION {
        log::warn!("mirror written by a newer version ({version}), ignoring");
        return false;
    }

    if version < 2 {
        let obj = match value.as_object_mut() {
            Some(obj) => obj,
            None => return false,
        };
        obj.entry("decors")
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if let Some(assembly) = obj.get_mut("assembly").and_then(|a| a.as_object_mut())
            && !assembly.contains_key("currentPage")
        {
            assembly.insert("currentPage".into(), serde_json::json!(1));
        }
        obj.insert("version".into(), serde_json::json!(MIRROR_VERSION));
    }

    true
}

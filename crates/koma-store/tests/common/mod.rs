//! In-memory fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use koma_core::model::PageState;
use koma_core::serialize::SerializedState;
use koma_store::{
    BlobStore, Notifier, PageBackend, ProjectSnapshot, Result, StoreError, ThumbnailRenderer,
};

/// Backend over hash maps. Records every call by name so tests can
/// assert ordering (e.g. thumbnail upload strictly after the content
/// save), and can be told to fail the next N page saves.
#[derive(Default)]
pub struct MemoryBackend {
    pub pages: HashMap<String, SerializedState>,
    pub projects: HashMap<String, ProjectSnapshot>,
    pub calls: Vec<String>,
    pub fail_page_saves: usize,
    pub fail_project_saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn page_key(page_id: &str, project_id: &str) -> String {
        format!("{project_id}/{page_id}")
    }
}

impl PageBackend for MemoryBackend {
    fn save_page(&mut self, state: &SerializedState) -> Result<()> {
        self.calls.push(format!("save_page:{}", state.page_id));
        if self.fail_page_saves > 0 {
            self.fail_page_saves -= 1;
            return Err(StoreError::Backend("simulated outage".into()));
        }
        let key = Self::page_key(&state.page_id, &state.project_id);
        self.pages.insert(key, state.clone());
        Ok(())
    }

    fn load_page(&mut self, page_id: &str, project_id: &str) -> Result<Option<SerializedState>> {
        self.calls.push(format!("load_page:{page_id}"));
        Ok(self.pages.get(&Self::page_key(page_id, project_id)).cloned())
    }

    fn upload_thumbnail(&mut self, page_id: &str, _png: &[u8]) -> Result<String> {
        self.calls.push(format!("upload_thumbnail:{page_id}"));
        Ok(format!("https://cdn.test/thumbs/{page_id}.png"))
    }

    fn save_project(&mut self, snapshot: &ProjectSnapshot) -> Result<()> {
        self.calls.push(format!("save_project:{}", snapshot.project_id));
        if self.fail_project_saves > 0 {
            self.fail_project_saves -= 1;
            return Err(StoreError::Backend("simulated outage".into()));
        }
        self.projects
            .insert(snapshot.project_id.clone(), snapshot.clone());
        Ok(())
    }

    fn load_project(&mut self, project_id: &str) -> Result<Option<ProjectSnapshot>> {
        self.calls.push(format!("load_project:{project_id}"));
        Ok(self.projects.get(project_id).cloned())
    }
}

/// Blob store over a hash map, with a switch to simulate quota errors.
#[derive(Default)]
pub struct MemoryBlobStore {
    pub entries: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(StoreError::Storage("quota exceeded".into()));
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Notifier that keeps every toast for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    pub successes: Vec<String>,
    pub errors: Vec<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&mut self, message: &str) {
        self.successes.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

/// Renderer that always produces the same tiny payload.
pub struct FixedThumbnail;

impl ThumbnailRenderer for FixedThumbnail {
    fn render(&self, _page: &PageState) -> Option<Vec<u8>> {
        Some(vec![0x89, b'P', b'N', b'G'])
    }
}

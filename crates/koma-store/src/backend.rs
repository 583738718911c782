//! Trait seams toward the hosting platform.
//!
//! The engine never talks to the network, browser storage, the renderer,
//! or the toast UI directly — each is a small object-safe trait the host
//! implements (HTTP client in production, in-memory fakes in tests).
//! The concurrency model is single-threaded cooperative, so no
//! `Send`/`Sync` bounds are imposed.

use crate::error::Result;
use crate::project::ProjectSnapshot;
use koma_core::model::PageState;
use koma_core::serialize::SerializedState;

/// The authoritative persistence backend for pages and projects.
pub trait PageBackend {
    fn save_page(&mut self, state: &SerializedState) -> Result<()>;

    /// "Not found" is the normal empty-page case: `Ok(None)`.
    fn load_page(&mut self, page_id: &str, project_id: &str) -> Result<Option<SerializedState>>;

    /// Upload a rendered PNG thumbnail; returns its public URL.
    fn upload_thumbnail(&mut self, page_id: &str, png: &[u8]) -> Result<String>;

    fn save_project(&mut self, snapshot: &ProjectSnapshot) -> Result<()>;

    fn load_project(&mut self, project_id: &str) -> Result<Option<ProjectSnapshot>>;
}

/// Browser-local persistent storage (localStorage/IndexedDB behind a
/// byte-oriented key-value view).
pub trait BlobStore {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;

    fn remove(&mut self, key: &str);

    /// All stored keys, for draft-recovery scans.
    fn keys(&self) -> Vec<String>;
}

/// Rasterizes the current page for thumbnail upload. `None` when no live
/// renderer is attached (headless host) — a save never fails for lack of
/// a thumbnail.
pub trait ThumbnailRenderer {
    fn render(&self, page: &PageState) -> Option<Vec<u8>>;
}

/// Transient user notifications (toasts).
pub trait Notifier {
    fn success(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// A renderer for hosts without a canvas attached.
pub struct NoThumbnail;

impl ThumbnailRenderer for NoThumbnail {
    fn render(&self, _page: &PageState) -> Option<Vec<u8>> {
        None
    }
}

/// A notifier that routes toasts into the log.
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn error(&mut self, message: &str) {
        log::error!("{message}");
    }
}

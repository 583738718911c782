//! Deferred save manager.
//!
//! Decouples fast in-editor mutations from expensive backend persistence:
//! edits only flip a dirty flag; a periodic tick snapshots a crash-
//! recovery draft into local storage; the explicit save path serializes
//! the full page, pushes it to the backend, uploads a thumbnail, and
//! clears the draft — strictly in that order, so a thumbnail is never
//! produced for unsaved content.
//!
//! The autosave "timer" is an explicit `tick(now_ms, …)` driven by the
//! editor session's lifecycle; the manager never owns a process-wide
//! timer. Time always arrives as an argument so tests drive the clock.

use crate::backend::{BlobStore, Notifier, PageBackend, ThumbnailRenderer};
use crate::error::Result;
use koma_core::model::{AssemblyElement, PageState, PageStatus};
use koma_core::serialize::{StageSettings, serialize_page};
use serde::{Deserialize, Serialize};

/// Local drafts are refreshed at most this often.
pub const AUTOSAVE_INTERVAL_MS: u64 = 30_000;

/// Bumped when the draft encoding changes; mismatched drafts are ignored.
pub const DRAFT_VERSION: u32 = 1;

const DRAFT_KEY_PREFIX: &str = "assembly_draft_";

/// A crash-recovery draft: the raw element list plus enough identity to
/// refuse restoring it into the wrong page or session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub version: u32,
    pub session_id: String,
    pub page_id: String,
    pub saved_at_ms: u64,
    pub elements: Vec<AssemblyElement>,
}

/// Knobs for one explicit save.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub stage: StageSettings,
    /// Skip toasts (used by background flushes).
    pub silent: bool,
}

/// The platform collaborators a save needs, injected per call.
pub struct SaveDeps<'a> {
    pub backend: &'a mut dyn PageBackend,
    pub blobs: &'a mut dyn BlobStore,
    pub thumbnails: &'a dyn ThumbnailRenderer,
    pub notifier: &'a mut dyn Notifier,
}

/// Per-session save coordinator. One instance per open editor; the
/// session id scopes local drafts so concurrent tabs never collide.
pub struct SaveManager {
    session_id: String,
    dirty: bool,
    autosave_interval_ms: u64,
    last_autosave_ms: Option<u64>,
    last_saved_ms: Option<u64>,
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveManager {
    pub fn new() -> Self {
        Self {
            session_id: format!("{:016x}", fastrand::u64(..)),
            dirty: false,
            autosave_interval_ms: AUTOSAVE_INTERVAL_MS,
            last_autosave_ms: None,
            last_saved_ms: None,
        }
    }

    pub fn with_autosave_interval(mut self, interval_ms: u64) -> Self {
        self.autosave_interval_ms = interval_ms;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved_ms(&self) -> Option<u64> {
        self.last_saved_ms
    }

    /// Flag the page as having unsaved changes. Idempotent — the flag is
    /// a boolean, not a counter.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn draft_key(&self) -> String {
        format!("{DRAFT_KEY_PREFIX}{}", self.session_id)
    }

    // ─── Local autosave ──────────────────────────────────────────────────

    /// Advance the autosave clock. If the page is dirty and the interval
    /// has elapsed, snapshot a draft to local storage. Returns whether a
    /// snapshot was attempted.
    pub fn tick(
        &mut self,
        now_ms: u64,
        page: &PageState,
        page_id: &str,
        blobs: &mut dyn BlobStore,
    ) -> bool {
        if !self.dirty {
            return false;
        }
        if let Some(last) = self.last_autosave_ms
            && now_ms.saturating_sub(last) < self.autosave_interval_ms
        {
            return false;
        }
        self.last_autosave_ms = Some(now_ms);
        self.snapshot_draft(now_ms, page, page_id, blobs);
        true
    }

    /// Best-effort draft write. Failures (quota, encoding) are logged and
    /// swallowed — the draft is a backup, not the save path.
    fn snapshot_draft(
        &self,
        now_ms: u64,
        page: &PageState,
        page_id: &str,
        blobs: &mut dyn BlobStore,
    ) {
        let draft = DraftSnapshot {
            version: DRAFT_VERSION,
            session_id: self.session_id.clone(),
            page_id: page_id.to_string(),
            saved_at_ms: now_ms,
            elements: page.elements.clone(),
        };
        let bytes = match rmp_serde::to_vec_named(&draft) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("draft encode failed: {e}");
                return;
            }
        };
        if let Err(e) = blobs.set(&self.draft_key(), &bytes) {
            log::warn!("draft autosave skipped: {e}");
        } else {
            log::debug!("draft saved for page {page_id} ({} elements)", page.len());
        }
    }

    // ─── Authoritative save ──────────────────────────────────────────────

    /// Serialize and persist the page. Thumbnail upload and draft cleanup
    /// run only after the content save succeeded. On failure the dirty
    /// flag stays set and in-memory state is untouched, so the caller can
    /// simply retry.
    pub fn save_to_database(
        &mut self,
        page: &PageState,
        page_id: &str,
        project_id: &str,
        options: &SaveOptions,
        deps: &mut SaveDeps<'_>,
        now_ms: u64,
    ) -> Result<PageStatus> {
        let state = serialize_page(page, page_id, project_id, options.stage, now_ms);
        let status = page.status();

        if let Err(e) = deps.backend.save_page(&state) {
            log::error!("page save failed for {page_id}: {e}");
            if !options.silent {
                deps.notifier.error("Save failed — your changes are still here, try again");
            }
            return Err(e);
        }

        // Content is durable from here on; the rest is cleanup.
        if let Some(png) = deps.thumbnails.render(page) {
            match deps.backend.upload_thumbnail(page_id, &png) {
                Ok(url) => log::debug!("thumbnail for {page_id} at {url}"),
                Err(e) => log::warn!("thumbnail upload failed for {page_id}: {e}"),
            }
        }
        deps.blobs.remove(&self.draft_key());

        self.dirty = false;
        self.last_saved_ms = Some(now_ms);
        if !options.silent {
            deps.notifier.success("Page saved");
        }
        log::info!("page {page_id} saved as {status:?}");
        Ok(status)
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Fetch the authoritative version and repopulate the page.
    ///
    /// Guard: an empty fetched payload never overwrites a page that
    /// currently holds elements — protects against a load racing a save
    /// and blanking a new, still-unsaved page. Returns whether the page
    /// was repopulated; `Ok(false)` covers both "nothing saved yet" and
    /// the guard.
    pub fn load_last_saved(
        &mut self,
        page_id: &str,
        project_id: &str,
        page: &mut PageState,
        backend: &mut dyn PageBackend,
    ) -> Result<bool> {
        let Some(state) = backend.load_page(page_id, project_id)? else {
            log::debug!("no saved version for page {page_id}");
            return Ok(false);
        };

        if state.element_count() == 0 && !page.is_empty() {
            log::warn!(
                "refusing to overwrite page {page_id} ({} elements in memory) with empty payload",
                page.len()
            );
            return Ok(false);
        }

        state.apply_to(page);
        Ok(true)
    }

    // ─── Draft recovery ──────────────────────────────────────────────────

    /// Look up this session's draft for the given page. Returns the
    /// decoded draft without applying it — restoring over live state
    /// requires explicit user confirmation, then `apply_draft`.
    pub fn load_draft_if_exists(
        &self,
        page_id: &str,
        blobs: &dyn BlobStore,
    ) -> Option<DraftSnapshot> {
        let bytes = blobs.get(&self.draft_key())?;
        decode_draft(&bytes, page_id)
    }

    /// Scan for a draft left behind by a crashed session (any session id
    /// other than this one) for the given page. Newest wins.
    pub fn find_recoverable_draft(
        &self,
        page_id: &str,
        blobs: &dyn BlobStore,
    ) -> Option<DraftSnapshot> {
        let mut best: Option<DraftSnapshot> = None;
        for key in blobs.keys() {
            if !key.starts_with(DRAFT_KEY_PREFIX) || key == self.draft_key() {
                continue;
            }
            let Some(bytes) = blobs.get(&key) else {
                continue;
            };
            if let Some(draft) = decode_draft(&bytes, page_id)
                && best.as_ref().is_none_or(|b| draft.saved_at_ms > b.saved_at_ms)
            {
                best = Some(draft);
            }
        }
        best
    }

    /// Restore a confirmed draft over the page. The recovered content is
    /// unsaved by definition, so the page comes back dirty.
    pub fn apply_draft(&mut self, draft: &DraftSnapshot, page: &mut PageState) {
        page.elements = draft.elements.clone();
        self.dirty = true;
    }

    /// Drop this session's draft (page discarded or save path cleaned up
    /// elsewhere).
    pub fn discard_draft(&self, blobs: &mut dyn BlobStore) {
        blobs.remove(&self.draft_key());
    }

    /// Drop a draft recovered from another session, once it has been
    /// either restored or declined.
    pub fn discard_recovered_draft(&self, draft: &DraftSnapshot, blobs: &mut dyn BlobStore) {
        blobs.remove(&format!("{DRAFT_KEY_PREFIX}{}", draft.session_id));
    }
}

fn decode_draft(bytes: &[u8], page_id: &str) -> Option<DraftSnapshot> {
    let draft: DraftSnapshot = match rmp_serde::from_slice(bytes) {
        Ok(draft) => draft,
        Err(e) => {
            log::debug!("ignoring undecodable draft: {e}");
            return None;
        }
    };
    if draft.version != DRAFT_VERSION {
        log::debug!(
            "ignoring draft with version {} (current {DRAFT_VERSION})",
            draft.version
        );
        return None;
    }
    if draft.page_id != page_id {
        return None;
    }
    Some(draft)
}

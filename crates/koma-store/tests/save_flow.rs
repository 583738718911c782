//! End-to-end save and recovery behavior against in-memory fakes.

mod common;

use common::{FixedThumbnail, MemoryBackend, MemoryBlobStore, RecordingNotifier};
use koma_core::model::{AssemblyElement, ElementKind, PageState, PageStatus, PanelStyle, Transform};
use koma_store::{SaveDeps, SaveManager, SaveOptions};
use pretty_assertions::assert_eq;

fn panel(x: f32, y: f32) -> AssemblyElement {
    AssemblyElement::new(
        ElementKind::Panel {
            style: PanelStyle::default(),
        },
        Transform::new(x, y, 300.0, 200.0),
    )
}

#[test]
fn failed_save_keeps_dirty_flag_and_retry_clears_it() {
    let mut backend = MemoryBackend::new();
    backend.fail_page_saves = 1;
    let mut blobs = MemoryBlobStore::new();
    let mut notifier = RecordingNotifier::new();
    let thumbnails = FixedThumbnail;

    let mut page = PageState::new();
    page.insert(panel(10.0, 10.0));

    let mut manager = SaveManager::new();
    manager.mark_dirty();

    let options = SaveOptions::default();
    let mut deps = SaveDeps {
        backend: &mut backend,
        blobs: &mut blobs,
        thumbnails: &thumbnails,
        notifier: &mut notifier,
    };

    let first = manager.save_to_database(&page, "page-1", "proj", &options, &mut deps, 1_000);
    assert!(first.is_err());
    assert!(manager.is_dirty());
    assert_eq!(manager.last_saved_ms(), None);

    let second = manager.save_to_database(&page, "page-1", "proj", &options, &mut deps, 2_000);
    assert_eq!(second.unwrap(), PageStatus::InProgress);
    assert!(!manager.is_dirty());
    assert_eq!(manager.last_saved_ms(), Some(2_000));

    assert_eq!(notifier.errors.len(), 1);
    assert_eq!(notifier.successes.len(), 1);
}

#[test]
fn thumbnail_and_draft_cleanup_run_only_after_content_save() {
    let mut backend = MemoryBackend::new();
    backend.fail_page_saves = 1;
    let mut blobs = MemoryBlobStore::new();
    let mut notifier = RecordingNotifier::new();
    let thumbnails = FixedThumbnail;

    let mut page = PageState::new();
    page.insert(panel(0.0, 0.0));

    let mut manager = SaveManager::new().with_autosave_interval(0);
    manager.mark_dirty();

    // Leave a draft behind so we can observe when it gets cleaned up.
    assert!(manager.tick(500, &page, "page-1", &mut blobs));
    assert_eq!(blobs.entries.len(), 1);

    let options = SaveOptions::default();
    let mut deps = SaveDeps {
        backend: &mut backend,
        blobs: &mut blobs,
        thumbnails: &thumbnails,
        notifier: &mut notifier,
    };

    let _ = manager.save_to_database(&page, "page-1", "proj", &options, &mut deps, 1_000);

    // The failed attempt must not have uploaded a thumbnail or touched
    // the draft.
    assert_eq!(backend.calls, vec!["save_page:page-1"]);
    assert_eq!(blobs.entries.len(), 1);

    let mut deps = SaveDeps {
        backend: &mut backend,
        blobs: &mut blobs,
        thumbnails: &thumbnails,
        notifier: &mut notifier,
    };
    manager
        .save_to_database(&page, "page-1", "proj", &options, &mut deps, 2_000)
        .unwrap();

    assert_eq!(
        backend.calls,
        vec![
            "save_page:page-1",
            "save_page:page-1",
            "upload_thumbnail:page-1"
        ]
    );
    assert!(blobs.entries.is_empty());
}

#[test]
fn empty_payload_does_not_blank_a_page_with_elements() {
    let mut backend = MemoryBackend::new();
    let mut blobs = MemoryBlobStore::new();
    let mut notifier = RecordingNotifier::new();
    let thumbnails = FixedThumbnail;

    // Persist an empty page first.
    let empty = PageState::new();
    let mut manager = SaveManager::new();
    manager.mark_dirty();
    let options = SaveOptions::default();
    let mut deps = SaveDeps {
        backend: &mut backend,
        blobs: &mut blobs,
        thumbnails: &thumbnails,
        notifier: &mut notifier,
    };
    manager
        .save_to_database(&empty, "page-1", "proj", &options, &mut deps, 1_000)
        .unwrap();

    // Meanwhile the user added content that has not been saved yet.
    let mut page = PageState::new();
    page.insert(panel(50.0, 50.0));

    let loaded = manager
        .load_last_saved("page-1", "proj", &mut page, &mut backend)
        .unwrap();
    assert!(!loaded);
    assert_eq!(page.len(), 1);

    // Loading into an actually empty page is fine.
    let mut fresh = PageState::new();
    assert!(
        manager
            .load_last_saved("page-1", "proj", &mut fresh, &mut backend)
            .unwrap()
    );
    assert!(fresh.is_empty());
}

#[test]
fn crashed_session_draft_is_found_and_restored() {
    let mut blobs = MemoryBlobStore::new();
    let mut page = PageState::new();
    page.insert(panel(10.0, 20.0));
    page.insert(panel(400.0, 20.0));

    // A previous session autosaved and then "crashed".
    let mut crashed = SaveManager::new().with_autosave_interval(0);
    crashed.mark_dirty();
    assert!(crashed.tick(5_000, &page, "page-1", &mut blobs));
    drop(crashed);

    let mut current = SaveManager::new();
    let draft = current
        .find_recoverable_draft("page-1", &blobs)
        .expect("draft from the crashed session");
    assert_eq!(draft.saved_at_ms, 5_000);
    assert_eq!(draft.elements.len(), 2);

    // Drafts for other pages are never offered.
    assert!(current.find_recoverable_draft("page-2", &blobs).is_none());

    let mut restored = PageState::new();
    current.apply_draft(&draft, &mut restored);
    assert_eq!(restored.len(), 2);
    assert!(current.is_dirty());

    current.discard_recovered_draft(&draft, &mut blobs);
    assert!(current.find_recoverable_draft("page-1", &blobs).is_none());
}

#[test]
fn autosave_respects_interval_and_dirty_flag() {
    let mut blobs = MemoryBlobStore::new();
    let mut page = PageState::new();
    page.insert(panel(0.0, 0.0));

    let mut manager = SaveManager::new().with_autosave_interval(30_000);

    // Clean page: ticks are no-ops.
    assert!(!manager.tick(1_000, &page, "page-1", &mut blobs));
    assert!(blobs.entries.is_empty());

    manager.mark_dirty();
    assert!(manager.tick(2_000, &page, "page-1", &mut blobs));

    // Still inside the interval.
    assert!(!manager.tick(20_000, &page, "page-1", &mut blobs));
    assert!(manager.tick(32_000, &page, "page-1", &mut blobs));
}

#[test]
fn quota_failure_during_autosave_is_swallowed() {
    let mut blobs = MemoryBlobStore::new();
    blobs.fail_writes = true;

    let mut page = PageState::new();
    page.insert(panel(0.0, 0.0));

    let mut manager = SaveManager::new().with_autosave_interval(0);
    manager.mark_dirty();

    // Attempted, failed, swallowed; the page stays dirty for the next try.
    assert!(manager.tick(1_000, &page, "page-1", &mut blobs));
    assert!(blobs.entries.is_empty());
    assert!(manager.is_dirty());
}

//! Multi-page editing sessions: switching, duplicating, deleting pages,
//! and round-tripping the whole project through the backend and the
//! local mirror.

mod common;

use common::{MemoryBackend, MemoryBlobStore, RecordingNotifier};
use koma_core::model::{AssemblyElement, ElementKind, PanelStyle, Transform};
use koma_store::{BlobStore, ProjectStore, ScriptData};
use pretty_assertions::assert_eq;

fn panel_at(x: f32, y: f32) -> AssemblyElement {
    AssemblyElement::new(
        ElementKind::Panel {
            style: PanelStyle::default(),
        },
        Transform::new(x, y, 300.0, 200.0),
    )
}

#[test]
fn elements_land_on_the_page_that_is_open() {
    let mut store = ProjectStore::initialize("proj");
    store.add_page(0);
    assert_eq!(store.page_count(), 2);

    assert!(store.set_current_page(2));
    store.add_element(panel_at(200.0, 200.0), 10);

    assert!(store.page(1).unwrap().is_empty());
    let second = store.page(2).unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second.elements[0].transform.x, 200.0);

    // Switching back never drags elements along.
    assert!(store.set_current_page(1));
    assert!(store.current_page().is_empty());
}

#[test]
fn duplicated_page_shares_content_but_not_ids() {
    let mut store = ProjectStore::initialize("proj");
    store.add_element(panel_at(10.0, 20.0), 0);
    store.add_element(panel_at(400.0, 20.0), 0);

    let copy_number = store.duplicate_page(1, 5).unwrap();
    assert_eq!(copy_number, 2);

    let original = store.page(1).unwrap();
    let copy = store.page(2).unwrap();
    assert_eq!(copy.len(), original.len());
    for (a, b) in original.elements.iter().zip(&copy.elements) {
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.transform, b.transform);
    }
}

#[test]
fn deleting_a_middle_page_renumbers_the_rest() {
    let mut store = ProjectStore::initialize("proj");
    store.add_page(0);
    store.add_page(0);
    store.set_current_page(2);
    store.add_element(panel_at(1.0, 1.0), 0);
    store.set_current_page(3);
    store.add_element(panel_at(2.0, 2.0), 0);
    store.add_element(panel_at(3.0, 3.0), 0);

    assert!(store.delete_page(2, 10));
    assert_eq!(store.page_count(), 2);

    // The former page 3 is now page 2.
    assert_eq!(store.page(2).unwrap().len(), 2);

    // Current page was 3, now clamped into range.
    assert_eq!(store.current_page_number(), 2);
}

#[test]
fn project_roundtrip_through_backend() {
    let mut backend = MemoryBackend::new();
    let mut notifier = RecordingNotifier::new();

    let mut store = ProjectStore::initialize("proj");
    store.update_script(
        ScriptData {
            title: "Issue #1".into(),
            synopsis: "A pilot chapter".into(),
            content: "PAGE 1 ...".into(),
        },
        100,
    );
    store.add_element(panel_at(0.0, 0.0), 200);
    assert!(store.has_unsaved_changes());

    store
        .save_to_database(&mut backend, &mut notifier, 300)
        .unwrap();
    assert!(!store.has_unsaved_changes());
    assert_eq!(notifier.successes.len(), 1);

    let mut reopened = ProjectStore::initialize("proj");
    assert!(reopened.load_from_database(&mut backend));
    assert_eq!(reopened.script().title, "Issue #1");
    assert_eq!(reopened.current_page().len(), 1);
    assert!(!reopened.has_unsaved_changes());
}

#[test]
fn backend_failure_keeps_dirty_flag_and_raises_a_toast() {
    let mut backend = MemoryBackend::new();
    backend.fail_project_saves = 1;
    let mut notifier = RecordingNotifier::new();

    let mut store = ProjectStore::initialize("proj");
    store.add_element(panel_at(0.0, 0.0), 0);

    assert!(
        store
            .save_to_database(&mut backend, &mut notifier, 100)
            .is_err()
    );
    assert!(store.has_unsaved_changes());
    assert_eq!(notifier.errors.len(), 1);
}

#[test]
fn unreachable_backend_leaves_defaults_in_place() {
    // load_project over an empty backend: Ok(None), no data, no panic.
    let mut backend = MemoryBackend::new();
    let mut store = ProjectStore::initialize("proj");
    assert!(!store.load_from_database(&mut backend));
    assert_eq!(store.page_count(), 1);
}

#[test]
fn local_mirror_roundtrip_and_v1_migration() {
    let mut blobs = MemoryBlobStore::new();

    let mut store = ProjectStore::initialize("proj");
    store.add_element(panel_at(5.0, 5.0), 0);
    store.save_local_mirror(&mut blobs, 100);
    assert_eq!(store.last_saved_to_local_ms(), Some(100));

    let mut reopened = ProjectStore::initialize("proj");
    assert!(reopened.load_local_mirror(&blobs));
    assert_eq!(reopened.current_page().len(), 1);

    // A mirror written before the decors slice existed still loads.
    let v1 = serde_json::json!({
        "version": 1,
        "projectId": "legacy",
        "script": { "title": "Old", "synopsis": "", "content": "" },
        "characters": [],
        "backgrounds": [],
        "scenes": [],
        "assembly": { "pages": [{ "elements": [], "view": {
            "positionX": 0.0, "positionY": 0.0, "zoom": 1.0,
            "showGrid": false, "gridSize": 20.0, "activeTool": "select",
            "lastActiveTab": "assembly", "timestamp": 0
        }}] },
        "savedAtMs": 0
    });
    blobs
        .set("koma_project_legacy", &serde_json::to_vec(&v1).unwrap())
        .unwrap();

    let mut legacy = ProjectStore::initialize("legacy");
    assert!(legacy.load_local_mirror(&blobs));
    assert_eq!(legacy.script().title, "Old");
    assert!(legacy.decors().is_empty());
    assert_eq!(legacy.current_page_number(), 1);
}

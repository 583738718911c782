//! Simulated editing session against in-memory storage: edit, autosave
//! drafts, crash, recover, save. Run with `RUST_LOG=debug` to watch the
//! save manager's decisions.

use std::collections::HashMap;

use koma_core::model::{
    AssemblyElement, BubbleStyle, ElementKind, PageState, PanelStyle, Transform,
};
use koma_store::backend::LogNotifier;
use koma_store::{
    BlobStore, PageBackend, ProjectSnapshot, Result, SaveDeps, SaveManager, SaveOptions,
    StoreError, ThumbnailRenderer,
};

struct MemoryBackend {
    pages: HashMap<String, koma_core::serialize::SerializedState>,
    offline: bool,
}

impl PageBackend for MemoryBackend {
    fn save_page(&mut self, state: &koma_core::serialize::SerializedState) -> Result<()> {
        if self.offline {
            return Err(StoreError::Backend("network unreachable".into()));
        }
        self.pages.insert(state.page_id.clone(), state.clone());
        Ok(())
    }

    fn load_page(
        &mut self,
        page_id: &str,
        _project_id: &str,
    ) -> Result<Option<koma_core::serialize::SerializedState>> {
        Ok(self.pages.get(page_id).cloned())
    }

    fn upload_thumbnail(&mut self, page_id: &str, _png: &[u8]) -> Result<String> {
        Ok(format!("mem://thumbs/{page_id}"))
    }

    fn save_project(&mut self, _snapshot: &ProjectSnapshot) -> Result<()> {
        Ok(())
    }

    fn load_project(&mut self, _project_id: &str) -> Result<Option<ProjectSnapshot>> {
        Ok(None)
    }
}

#[derive(Default)]
struct MemoryBlobs {
    entries: HashMap<String, Vec<u8>>,
}

impl BlobStore for MemoryBlobs {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
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

struct StubThumbnail;

impl ThumbnailRenderer for StubThumbnail {
    fn render(&self, _page: &PageState) -> Option<Vec<u8>> {
        Some(vec![0x89, b'P', b'N', b'G'])
    }
}

fn main() {
    env_logger::init();

    let mut backend = MemoryBackend {
        pages: HashMap::new(),
        offline: true,
    };
    let mut blobs = MemoryBlobs::default();
    let mut notifier = LogNotifier;
    let thumbnails = StubThumbnail;

    // First session: lay out a page while the network is down.
    let mut page = PageState::new();
    page.insert(AssemblyElement::new(
        ElementKind::Panel {
            style: PanelStyle::default(),
        },
        Transform::new(40.0, 40.0, 420.0, 300.0),
    ));
    page.insert(AssemblyElement::new(
        ElementKind::Dialogue {
            text: "Did you hear that?".into(),
            style: BubbleStyle::default(),
        },
        Transform::new(80.0, 70.0, 180.0, 90.0),
    ));

    let mut session = SaveManager::new().with_autosave_interval(30_000);
    session.mark_dirty();
    session.tick(30_000, &page, "page-1", &mut blobs);

    let mut deps = SaveDeps {
        backend: &mut backend,
        blobs: &mut blobs,
        thumbnails: &thumbnails,
        notifier: &mut notifier,
    };
    let options = SaveOptions::default();
    if session
        .save_to_database(&page, "page-1", "demo", &options, &mut deps, 31_000)
        .is_err()
    {
        println!("save failed while offline; draft kept, page still dirty");
    }

    // The tab closes without ever saving. A new session finds the draft.
    drop(session);
    let mut session = SaveManager::new();
    let mut recovered = PageState::new();
    match session.find_recoverable_draft("page-1", &blobs) {
        Some(draft) => {
            println!(
                "recovered draft from {} ({} elements)",
                draft.saved_at_ms,
                draft.elements.len()
            );
            session.apply_draft(&draft, &mut recovered);
            session.discard_recovered_draft(&draft, &mut blobs);
        }
        None => println!("no draft to recover"),
    }

    // Back online: the save goes through and cleans up after itself.
    backend.offline = false;
    let mut deps = SaveDeps {
        backend: &mut backend,
        blobs: &mut blobs,
        thumbnails: &thumbnails,
        notifier: &mut notifier,
    };
    match session.save_to_database(&recovered, "page-1", "demo", &options, &mut deps, 90_000) {
        Ok(status) => println!("saved, page status {status:?}, dirty = {}", session.is_dirty()),
        Err(e) => println!("save failed again: {e}"),
    }
    println!("drafts left behind: {}", blobs.keys().len());
}

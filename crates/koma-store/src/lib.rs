pub mod backend;
pub mod error;
pub mod project;
pub mod save;

pub use backend::{BlobStore, Notifier, PageBackend, ThumbnailRenderer};
pub use error::{Result, StoreError};
pub use project::{
    AssemblyData, BackgroundRecord, CharacterRecord, DecorRecord, ProjectSnapshot, ProjectStore,
    SceneRecord, ScriptData,
};
pub use save::{DraftSnapshot, SaveDeps, SaveManager, SaveOptions};

//! Core of the visual to-do list: record model, sync engine with offline
//! fallback, mutation API and filter/search view model.

pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod search;
pub mod service;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::todo::{ImageRef, Todo, TodoId, TodoPatch, TodoValidationError};
pub use remote::image_endpoint::{HttpImageEndpoint, ImageEndpoint, InlineImage, UploadedImage};
pub use remote::record_store::{HttpRecordStore, RecordStore};
pub use remote::{RemoteClient, RemoteError, RemoteResult};
pub use repo::local_store::{
    LocalStore, LocalStoreError, LocalStoreResult, MemoryLocalStore, SqliteLocalStore,
};
pub use search::slideshow::{slideshow_available, Slideshow};
pub use search::view::{recent_completions, visible_todos, TodoFilter, TodoStats, ViewQuery};
pub use service::bootstrap::{open_session, open_session_from_env, BootstrapError, Session};
pub use service::todo_service::TodoService;
pub use sync::{
    notice_channel, Connectivity, Notice, NoticeLevel, NoticeReceiver, NoticeSender,
    PersistHandle, SyncEngine,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

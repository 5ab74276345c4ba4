//! Mutation API and state container for the to-do collection.
//!
//! # Responsibility
//! - Provide add/update/toggle/delete entry points.
//! - Keep the collection ordered most-recent-first.
//!
//! # Invariants
//! - The collection is changed in memory before persistence starts, and a
//!   persist task never writes back into it.
//! - Invalid input (blank text, unknown id) is a silent no-op and triggers no
//!   persist.
//! - Every record satisfies `Todo::validate()` after each mutation.
//! - An inline image is stored as given and swapped for its remote URL only
//!   while the record still carries that same payload.

use crate::model::todo::{ImageRef, Todo, TodoId, TodoPatch};
use crate::search::view::{visible_todos, TodoStats, ViewQuery};
use crate::remote::image_endpoint::UploadedImage;
use crate::remote::RemoteResult;
use crate::sync::notice::{Notice, ADDED_NOTICE, DELETED_NOTICE, IMAGE_FALLBACK_NOTICE};
use crate::sync::{PersistHandle, SyncEngine};
use chrono::Utc;
use log::{debug, warn};
use tokio::sync::mpsc;

/// Outcome of a background image upload, waiting to be merged.
struct SettledUpload {
    id: TodoId,
    payload: String,
    result: RemoteResult<UploadedImage>,
}

/// Session-scoped owner of the collection.
pub struct TodoService {
    todos: Vec<Todo>,
    engine: SyncEngine,
    uploads_tx: mpsc::UnboundedSender<SettledUpload>,
    uploads_rx: mpsc::UnboundedReceiver<SettledUpload>,
    pending_uploads: usize,
}

impl TodoService {
    /// Creates an empty container; call `load` to populate it.
    pub fn new(engine: SyncEngine) -> Self {
        Self::with_todos(engine, Vec::new())
    }

    pub fn with_todos(engine: SyncEngine, todos: Vec<Todo>) -> Self {
        let (uploads_tx, uploads_rx) = mpsc::unbounded_channel();
        Self {
            todos,
            engine,
            uploads_tx,
            uploads_rx,
            pending_uploads: 0,
        }
    }

    /// Replaces the collection with the engine's view of it.
    pub async fn load(&mut self) {
        self.todos = self.engine.load().await;
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    pub fn view(&self, query: &ViewQuery) -> Vec<&Todo> {
        visible_todos(&self.todos, query)
    }

    pub fn stats(&self) -> TodoStats {
        TodoStats::from_todos(&self.todos)
    }

    /// Prepends a new open record.
    ///
    /// Returns `None` (and changes nothing) when `text` is blank.
    pub fn add(&mut self, text: &str) -> Option<PersistHandle> {
        let todo = Todo::new(text, Utc::now()).ok()?;
        debug!("event=todo_add module=service status=ok id={}", todo.id);
        self.todos.insert(0, todo);

        if self.engine.is_online() {
            self.engine.notify(Notice::success(ADDED_NOTICE));
        }
        Some(self.persist())
    }

    /// Merges `patch` into the record `id` and persists.
    ///
    /// An inline image is stored as given and its upload starts in the
    /// background; `finish_upload` or `apply_settled_uploads` later swaps in
    /// the remote URL.
    pub fn update(&mut self, id: &TodoId, patch: TodoPatch) -> Option<PersistHandle> {
        if patch.has_blank_text() {
            return None;
        }
        let payload = patch.inline_image().map(str::to_string);
        let handle = self.apply(id, patch)?;
        if let Some(payload) = payload {
            self.start_upload(id.clone(), payload);
        }
        Some(handle)
    }

    /// Uploads started by `update` whose outcome is not merged yet.
    pub fn pending_uploads(&self) -> usize {
        self.pending_uploads
    }

    /// Waits for the next upload to settle and merges it.
    ///
    /// Returns the persist started by the swap, or `None` when nothing is
    /// pending, the upload failed, or the record no longer carries the
    /// uploaded payload.
    pub async fn finish_upload(&mut self) -> Option<PersistHandle> {
        if self.pending_uploads == 0 {
            return None;
        }
        let settled = self.uploads_rx.recv().await?;
        self.merge_upload(settled)
    }

    /// Merges every upload that has already settled, without waiting.
    pub fn apply_settled_uploads(&mut self) -> Vec<PersistHandle> {
        let mut handles = Vec::new();
        while let Ok(settled) = self.uploads_rx.try_recv() {
            handles.extend(self.merge_upload(settled));
        }
        handles
    }

    /// Flips completion and sets or clears `completed_at`.
    pub fn toggle_complete(&mut self, id: &TodoId) -> Option<PersistHandle> {
        let patch = self.get(id)?.toggle_patch(Utc::now());
        self.apply(id, patch)
    }

    /// Removes the record `id`.
    pub fn delete(&mut self, id: &TodoId) -> Option<PersistHandle> {
        let index = self.position(id)?;
        self.todos.remove(index);
        debug!("event=todo_delete module=service status=ok id={id}");

        self.engine.notify(Notice::success(DELETED_NOTICE));
        Some(self.persist())
    }

    fn apply(&mut self, id: &TodoId, patch: TodoPatch) -> Option<PersistHandle> {
        let index = self.position(id)?;
        self.todos[index].apply_patch(patch, Utc::now());
        debug!("event=todo_update module=service status=ok id={id}");
        Some(self.persist())
    }

    fn start_upload(&mut self, id: TodoId, payload: String) {
        let engine = self.engine.clone();
        let settled = self.uploads_tx.clone();
        self.pending_uploads += 1;
        self.engine.spawn(async move {
            let result = engine.upload_image(&payload).await;
            if let Err(err) = &result {
                warn!("event=image_upload module=service status=fallback id={id} error={err}");
                engine.notify(Notice::warning(IMAGE_FALLBACK_NOTICE));
            }
            if settled.send(SettledUpload { id, payload, result }).is_err() {
                debug!("event=image_upload module=service status=dropped");
            }
        });
    }

    fn merge_upload(&mut self, settled: SettledUpload) -> Option<PersistHandle> {
        self.pending_uploads = self.pending_uploads.saturating_sub(1);
        let uploaded = settled.result.ok()?;
        let index = self.position(&settled.id)?;
        let still_inline = matches!(
            &self.todos[index].image,
            Some(ImageRef::Inline(current)) if *current == settled.payload
        );
        if !still_inline {
            debug!(
                "event=image_swap module=service status=skipped id={}",
                settled.id
            );
            return None;
        }
        self.apply(&settled.id, TodoPatch::image(ImageRef::Remote(uploaded.url)))
    }

    fn position(&self, id: &TodoId) -> Option<usize> {
        self.todos.iter().position(|todo| &todo.id == id)
    }

    fn persist(&self) -> PersistHandle {
        self.engine.spawn_persist(self.todos.clone())
    }
}

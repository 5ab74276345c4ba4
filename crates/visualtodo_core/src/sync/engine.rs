//! Sync engine: load, persist and connectivity tracking for one user.
//!
//! # Responsibility
//! - Fetch the user's collection, falling back to the local mirror.
//! - Write snapshots to the Record Store and mirror them locally.
//! - Exchange inline images for remote references.
//!
//! # Invariants
//! - `load`, `persist` and `health` never return an error; outcomes are
//!   folded into `Connectivity` and notices.
//! - The local mirror is written on every persist, online or not.
//! - Overlapping persists are not ordered: the last remote write to finish
//!   wins.
//! - Background work runs on the runtime captured at construction, so
//!   mutations may be issued from threads outside that runtime.
//! - Local store calls run on the blocking pool, never on a runtime worker.

use super::notice::{Notice, NoticeSender, OFFLINE_NOTICE};
use crate::model::todo::Todo;
use crate::remote::image_endpoint::{upload_file_name, ImageEndpoint, InlineImage, UploadedImage};
use crate::remote::record_store::RecordStore;
use crate::remote::RemoteResult;
use crate::repo::local_store::LocalStore;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::future::Future;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const BACKUP_KEY_PREFIX: &str = "todos-backup";

/// Outcome of the most recent remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// Background persist task; resolves to the connectivity it observed.
pub type PersistHandle = JoinHandle<Connectivity>;

/// Cloneable handle; clones share stores, connectivity and notices.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    user_id: String,
    records: Arc<dyn RecordStore>,
    images: Arc<dyn ImageEndpoint>,
    local: Arc<dyn LocalStore>,
    connectivity: watch::Sender<Connectivity>,
    notices: NoticeSender,
    runtime: Handle,
}

impl SyncEngine {
    /// Builds an engine whose background tasks run on `runtime`.
    pub fn new(
        user_id: impl Into<String>,
        records: Arc<dyn RecordStore>,
        images: Arc<dyn ImageEndpoint>,
        local: Arc<dyn LocalStore>,
        notices: NoticeSender,
        runtime: Handle,
    ) -> Self {
        let (connectivity, _) = watch::channel(Connectivity::Online);
        Self {
            inner: Arc::new(EngineInner {
                user_id: user_id.into(),
                records,
                images,
                local,
                connectivity,
                notices,
                runtime,
            }),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    pub fn connectivity(&self) -> Connectivity {
        *self.inner.connectivity.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity() == Connectivity::Online
    }

    /// Subscribes to connectivity transitions.
    pub fn watch_connectivity(&self) -> watch::Receiver<Connectivity> {
        self.inner.connectivity.subscribe()
    }

    pub fn notify(&self, notice: Notice) {
        self.inner.notices.emit(notice);
    }

    /// Local key holding this user's mirrored collection.
    pub fn backup_key(&self) -> String {
        format!("{BACKUP_KEY_PREFIX}:{}", self.inner.user_id)
    }

    /// Loads the collection, preferring the remote copy.
    ///
    /// On remote failure the local mirror is used; an absent or unreadable
    /// mirror yields an empty collection.
    pub async fn load(&self) -> Vec<Todo> {
        let started_at = Instant::now();
        match self.inner.records.fetch(&self.inner.user_id).await {
            Ok(todos) => {
                self.set_connectivity(Connectivity::Online);
                info!(
                    "event=sync_load module=sync status=ok source=remote count={} duration_ms={}",
                    todos.len(),
                    started_at.elapsed().as_millis()
                );
                todos
            }
            Err(err) => {
                self.set_connectivity(Connectivity::Offline);
                warn!(
                    "event=sync_load module=sync status=fallback source=local duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                self.read_backup().await
            }
        }
    }

    /// Writes `todos` remotely and mirrors them locally.
    pub async fn persist(&self, todos: Vec<Todo>) -> Connectivity {
        let started_at = Instant::now();
        let serialized = match serde_json::to_string(&todos) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!("event=sync_persist module=sync status=error stage=encode error={err}");
                return self.connectivity();
            }
        };

        let outcome = match self.inner.records.replace(&self.inner.user_id, &todos).await {
            Ok(()) => {
                info!(
                    "event=sync_persist module=sync status=ok count={} duration_ms={}",
                    todos.len(),
                    started_at.elapsed().as_millis()
                );
                Connectivity::Online
            }
            Err(err) => {
                warn!(
                    "event=sync_persist module=sync status=offline count={} duration_ms={} error={err}",
                    todos.len(),
                    started_at.elapsed().as_millis()
                );
                Connectivity::Offline
            }
        };

        self.set_connectivity(outcome);
        self.write_backup(serialized).await;
        if outcome == Connectivity::Offline {
            self.notify(Notice::warning(OFFLINE_NOTICE));
        }
        outcome
    }

    /// Runs `persist` as an independent task on the engine's runtime.
    pub fn spawn_persist(&self, todos: Vec<Todo>) -> PersistHandle {
        let engine = self.clone();
        self.spawn(async move { engine.persist(todos).await })
    }

    /// Spawns `task` on the engine's runtime.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.inner.runtime.spawn(task)
    }

    /// Probes the remote host and records the result.
    pub async fn health(&self) -> Connectivity {
        let outcome = match self.inner.records.health(&self.inner.user_id).await {
            Ok(()) => Connectivity::Online,
            Err(err) => {
                debug!("event=sync_health module=sync status=offline error={err}");
                Connectivity::Offline
            }
        };
        self.set_connectivity(outcome);
        outcome
    }

    /// Validates and uploads an inline `data:image/` payload.
    pub async fn upload_image(&self, data_url: &str) -> RemoteResult<UploadedImage> {
        let image = InlineImage::parse(data_url)?;
        let file_name = upload_file_name(Utc::now());
        let uploaded = self
            .inner
            .images
            .upload(&self.inner.user_id, &image, &file_name)
            .await?;
        info!(
            "event=image_upload module=sync status=ok mime={} bytes={}",
            image.mime_type(),
            image.byte_len()
        );
        Ok(uploaded)
    }

    /// Re-signs a stored image path whose URL expired.
    pub async fn refresh_image_url(&self, path: &str) -> RemoteResult<String> {
        self.inner.images.signed_url(&self.inner.user_id, path).await
    }

    async fn read_backup(&self) -> Vec<Todo> {
        let local = self.inner.local.clone();
        let key = self.backup_key();
        let raw = match self
            .inner
            .runtime
            .spawn_blocking(move || local.get(&key))
            .await
        {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => return Vec::new(),
            Ok(Err(err)) => {
                warn!("event=backup_read module=sync status=error error={err}");
                return Vec::new();
            }
            Err(err) => {
                warn!("event=backup_read module=sync status=error stage=join error={err}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Todo>>(&raw) {
            Ok(todos) => todos,
            Err(err) => {
                warn!("event=backup_read module=sync status=error stage=decode error={err}");
                Vec::new()
            }
        }
    }

    async fn write_backup(&self, serialized: String) {
        let local = self.inner.local.clone();
        let key = self.backup_key();
        match self
            .inner
            .runtime
            .spawn_blocking(move || local.set(&key, &serialized))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("event=backup_write module=sync status=error error={err}"),
            Err(err) => {
                warn!("event=backup_write module=sync status=error stage=join error={err}")
            }
        }
    }

    fn set_connectivity(&self, next: Connectivity) {
        let previous = self.inner.connectivity.send_replace(next);
        if previous != next {
            info!(
                "event=connectivity_changed module=sync from={} to={}",
                previous.as_str(),
                next.as_str()
            );
        }
    }
}

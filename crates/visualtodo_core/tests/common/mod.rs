#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use visualtodo_core::{
    notice_channel, ImageEndpoint, InlineImage, LocalStore, LocalStoreResult, MemoryLocalStore,
    Notice, NoticeReceiver, RecordStore, RemoteError, RemoteResult, SyncEngine, UploadedImage,
};

pub const USER: &str = "user_test0001";

fn unreachable() -> RemoteError {
    RemoteError::Decode("fake remote is offline".to_string())
}

/// In-memory Record Store with failure switch and per-size write delays.
#[derive(Default)]
pub struct FakeRecordStore {
    stored: Mutex<HashMap<String, Vec<visualtodo_core::Todo>>>,
    writes: Mutex<Vec<Vec<visualtodo_core::Todo>>>,
    delays_by_len: Mutex<HashMap<usize, Duration>>,
    failing: AtomicBool,
}

impl FakeRecordStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn seed(&self, user_id: &str, todos: Vec<visualtodo_core::Todo>) {
        self.stored
            .lock()
            .unwrap()
            .insert(user_id.to_string(), todos);
    }

    pub fn stored(&self, user_id: &str) -> Option<Vec<visualtodo_core::Todo>> {
        self.stored.lock().unwrap().get(user_id).cloned()
    }

    pub fn writes(&self) -> Vec<Vec<visualtodo_core::Todo>> {
        self.writes.lock().unwrap().clone()
    }

    /// Delays every write of a collection with `len` records.
    pub fn delay_writes_of_len(&self, len: usize, delay: Duration) {
        self.delays_by_len.lock().unwrap().insert(len, delay);
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn fetch(&self, user_id: &str) -> RemoteResult<Vec<visualtodo_core::Todo>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        Ok(self.stored(user_id).unwrap_or_default())
    }

    async fn replace(&self, user_id: &str, todos: &[visualtodo_core::Todo]) -> RemoteResult<()> {
        let delay = self.delays_by_len.lock().unwrap().get(&todos.len()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        self.stored
            .lock()
            .unwrap()
            .insert(user_id.to_string(), todos.to_vec());
        self.writes.lock().unwrap().push(todos.to_vec());
        Ok(())
    }

    async fn health(&self, _user_id: &str) -> RemoteResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        Ok(())
    }
}

/// Image Endpoint answering with predictable URLs.
#[derive(Default)]
pub struct FakeImageEndpoint {
    uploads: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl FakeImageEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let endpoint = Self::new();
        endpoint.failing.store(true, Ordering::SeqCst);
        endpoint
    }

    /// Answers every upload only after `delay`.
    pub fn slow(delay: Duration) -> Arc<Self> {
        let endpoint = Self::new();
        *endpoint.delay.lock().unwrap() = Some(delay);
        endpoint
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageEndpoint for FakeImageEndpoint {
    async fn upload(
        &self,
        user_id: &str,
        _image: &InlineImage,
        file_name: &str,
    ) -> RemoteResult<UploadedImage> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        let path = format!("{user_id}/{file_name}");
        Ok(UploadedImage {
            url: format!("https://images.test/{path}?token=signed"),
            path: Some(path),
        })
    }

    async fn signed_url(&self, _user_id: &str, path: &str) -> RemoteResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        Ok(format!("https://images.test/{path}?token=fresh"))
    }
}

pub struct Harness {
    pub engine: SyncEngine,
    pub records: Arc<FakeRecordStore>,
    pub images: Arc<FakeImageEndpoint>,
    pub local: Arc<MemoryLocalStore>,
    pub notices: NoticeReceiver,
}

impl Harness {
    /// Must be called inside a tokio runtime.
    pub fn new(records: Arc<FakeRecordStore>, images: Arc<FakeImageEndpoint>) -> Self {
        Self::on_runtime(records, images, Handle::current())
    }

    pub fn on_runtime(
        records: Arc<FakeRecordStore>,
        images: Arc<FakeImageEndpoint>,
        runtime: Handle,
    ) -> Self {
        let local = Arc::new(MemoryLocalStore::new());
        let (notice_tx, notices) = notice_channel();
        let engine = SyncEngine::new(
            USER,
            records.clone(),
            images.clone(),
            local.clone() as Arc<dyn LocalStore>,
            notice_tx,
            runtime,
        );
        Self {
            engine,
            records,
            images,
            local,
            notices,
        }
    }

    pub fn online() -> Self {
        Self::new(FakeRecordStore::new(), FakeImageEndpoint::new())
    }

    /// Collects every notice emitted so far.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut drained = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            drained.push(notice);
        }
        drained
    }
}

/// Local store whose writes hold the calling thread for `delay`.
pub struct SlowLocalStore {
    inner: MemoryLocalStore,
    delay: Duration,
}

impl SlowLocalStore {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryLocalStore::new(),
            delay,
        })
    }
}

impl LocalStore for SlowLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>> {
        std::thread::sleep(self.delay);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> LocalStoreResult<()> {
        std::thread::sleep(self.delay);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> LocalStoreResult<()> {
        self.inner.remove(key)
    }
}

/// Minimal valid inline PNG-ish payload ("hello" in base64).
pub const INLINE_IMAGE: &str = "data:image/png;base64,aGVsbG8=";

//! Session wiring from configuration.

use crate::config::{ConfigError, SyncConfig};
use crate::identity::resolve_user_id;
use crate::remote::image_endpoint::HttpImageEndpoint;
use crate::remote::record_store::HttpRecordStore;
use crate::remote::{RemoteClient, RemoteError};
use crate::repo::local_store::{LocalStore, LocalStoreError, SqliteLocalStore};
use crate::service::todo_service::TodoService;
use crate::sync::{notice_channel, NoticeReceiver, SyncEngine};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinError;

#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    LocalStore(LocalStoreError),
    Remote(RemoteError),
    /// The blocking local setup task did not complete.
    Task(JoinError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::LocalStore(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::Task(err) => write!(f, "local setup task failed: {err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::LocalStore(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::Task(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LocalStoreError> for BootstrapError {
    fn from(value: LocalStoreError) -> Self {
        Self::LocalStore(value)
    }
}

impl From<JoinError> for BootstrapError {
    fn from(value: JoinError) -> Self {
        Self::Task(value)
    }
}

impl From<RemoteError> for BootstrapError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// A loaded service plus the channel its notices arrive on.
pub struct Session {
    pub service: TodoService,
    pub notices: NoticeReceiver,
}

/// Opens local storage, resolves identity, builds HTTP clients and loads.
///
/// Only setup failures are returned; an unreachable remote still yields a
/// session, in offline mode.
pub async fn open_session(config: &SyncConfig) -> Result<Session, BootstrapError> {
    let db_path = config.local_db_path();
    let (local, user_id) = tokio::task::spawn_blocking(move || open_local(db_path)).await??;

    let client = RemoteClient::new(config)?;
    let (notice_tx, notices) = notice_channel();
    let engine = SyncEngine::new(
        user_id,
        Arc::new(HttpRecordStore::new(client.clone())),
        Arc::new(HttpImageEndpoint::new(client)),
        local,
        notice_tx,
        Handle::current(),
    );

    let mut service = TodoService::new(engine);
    service.load().await;
    info!(
        "event=session_open module=service status=ok connectivity={} count={}",
        service.engine().connectivity().as_str(),
        service.todos().len()
    );

    Ok(Session { service, notices })
}

fn open_local(path: Option<PathBuf>) -> Result<(Arc<dyn LocalStore>, String), LocalStoreError> {
    let local: Arc<dyn LocalStore> = match path {
        Some(path) => Arc::new(SqliteLocalStore::open(path)?),
        None => Arc::new(SqliteLocalStore::open_in_memory()?),
    };
    let user_id = resolve_user_id(local.as_ref())?;
    Ok((local, user_id))
}

/// `open_session` with settings taken from the environment.
pub async fn open_session_from_env() -> Result<Session, BootstrapError> {
    let config = SyncConfig::from_env()?;
    open_session(&config).await
}

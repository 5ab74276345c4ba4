//! Remote Record Store: one serialized collection per user.
//!
//! # Invariants
//! - `replace` overwrites the whole collection; there is no merge.
//! - `fetch` validates every record; one bad record fails the whole fetch.

use super::client::{RemoteClient, RemoteResult};
use crate::model::todo::Todo;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

const TODOS_PATH: &str = "todos";

/// Durable per-user collection endpoint.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the stored collection, empty when nothing is stored yet.
    async fn fetch(&self, user_id: &str) -> RemoteResult<Vec<Todo>>;
    /// Replaces the stored collection with `todos`.
    async fn replace(&self, user_id: &str, todos: &[Todo]) -> RemoteResult<()>;
    /// Reports whether the endpoint is reachable.
    async fn health(&self, user_id: &str) -> RemoteResult<()>;
}

#[derive(Deserialize)]
struct FetchBody {
    #[serde(default)]
    todos: Option<Vec<Todo>>,
}

#[derive(Serialize)]
struct ReplaceBody<'a> {
    todos: &'a [Todo],
}

#[derive(Deserialize)]
struct ReplaceAck {
    #[serde(default)]
    success: bool,
}

/// Record Store reached over the function host's `/todos` route.
#[derive(Clone)]
pub struct HttpRecordStore {
    client: RemoteClient,
}

impl HttpRecordStore {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch(&self, user_id: &str) -> RemoteResult<Vec<Todo>> {
        let request = self.client.request(Method::GET, TODOS_PATH, user_id);
        let body: FetchBody = self.client.send_json(TODOS_PATH, request).await?;
        Ok(body.todos.unwrap_or_default())
    }

    async fn replace(&self, user_id: &str, todos: &[Todo]) -> RemoteResult<()> {
        let request = self
            .client
            .request(Method::POST, TODOS_PATH, user_id)
            .json(&ReplaceBody { todos });
        let ack: ReplaceAck = self.client.send_json(TODOS_PATH, request).await?;
        if !ack.success {
            return Err(super::RemoteError::Decode(
                "record store did not acknowledge the write".to_string(),
            ));
        }
        Ok(())
    }

    async fn health(&self, user_id: &str) -> RemoteResult<()> {
        self.client.health(user_id).await
    }
}

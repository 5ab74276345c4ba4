//! Shared HTTP client for the function host.

use crate::config::SyncConfig;
use log::warn;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Header carrying the opaque per-client user id.
pub const USER_ID_HEADER: &str = "x-user-id";

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug)]
pub enum RemoteError {
    /// Connection, timeout or protocol failure.
    Transport(reqwest::Error),
    /// The host answered with a non-success status.
    Status { endpoint: String, status: u16 },
    /// The body could not be decoded into the expected shape.
    Decode(String),
    /// The image payload is not a base64 `data:image/` URL.
    InvalidImage(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "remote transport error: {err}"),
            Self::Status { endpoint, status } => {
                write!(f, "remote endpoint `{endpoint}` answered status {status}")
            }
            Self::Decode(message) => write!(f, "remote payload decode error: {message}"),
            Self::InvalidImage(message) => write!(f, "invalid image payload: {message}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

/// Cheap-to-clone handle around one `reqwest::Client`.
#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    config: Arc<SyncConfig>,
}

impl RemoteClient {
    pub fn new(config: &SyncConfig) -> RemoteResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config: Arc::new(config.clone()),
        })
    }

    /// Starts an authenticated request for `path` on behalf of `user_id`.
    pub fn request(&self, method: Method, path: &str, user_id: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.endpoint(path))
            .bearer_auth(&self.config.anon_key)
            .header(USER_ID_HEADER, user_id)
    }

    /// Sends `request` and decodes a JSON body from a 2xx answer.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> RemoteResult<T> {
        let response = ensure_success(path, request.send().await?)?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Probes `GET /health`.
    pub async fn health(&self, user_id: &str) -> RemoteResult<()> {
        let request = self.request(Method::GET, "health", user_id);
        let body: HealthBody = self.send_json("health", request).await?;
        if body.status != "ok" {
            return Err(RemoteError::Decode(format!(
                "health status `{}`",
                body.status
            )));
        }
        Ok(())
    }
}

fn ensure_success(path: &str, response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(
        "event=remote_call module=remote status=error endpoint={path} http_status={}",
        status.as_u16()
    );
    Err(RemoteError::Status {
        endpoint: path.to_string(),
        status: status.as_u16(),
    })
}

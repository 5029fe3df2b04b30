//! GitHub contents API client.
//!
//! `GET {base}/{path}?ref={branch}` returns the blob sha, `PUT` creates or
//! updates (the prior sha is required for updates) and `DELETE` needs the
//! current sha. Every mutation is a commit on `branch`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::config::StorageConfig;
use super::error::StorageError;
use super::service::{DeleteOutcome, ObjectStore, ObjectVersion, StoredObject, validate_key};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Object store backed by a repository on a GitHub-compatible host.
#[derive(Clone)]
pub struct GitHubContentStore {
    client: Client,
    contents_base: String,
    branch: String,
    token: String,
}

impl std::fmt::Debug for GitHubContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubContentStore")
            .field("contents_base", &self.contents_base)
            .field("branch", &self.branch)
            .field("token", &"[hidden]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    sha: String,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: Option<ContentEntry>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    message: String,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

impl GitHubContentStore {
    /// Create a client for `{api_base}/repos/{owner}/{repo}/contents`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any segment is empty or the HTTP
    /// client cannot be built.
    pub fn new(
        api_base: &str,
        owner: &str,
        repo: &str,
        branch: &str,
        token: &str,
        config: &StorageConfig,
    ) -> Result<Self, StorageError> {
        for (name, value) in [
            ("api_base", api_base),
            ("owner", owner),
            ("repo", repo),
            ("branch", branch),
            ("token", token),
        ] {
            if value.trim().is_empty() {
                return Err(StorageError::configuration(format!(
                    "github storage requires `{name}`"
                )));
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| StorageError::configuration(e.to_string()))?;

        Ok(Self {
            client,
            contents_base: format!(
                "{}/repos/{owner}/{repo}/contents",
                api_base.trim_end_matches('/')
            ),
            branch: branch.to_string(),
            token: token.to_string(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{path}", self.contents_base)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn fetch_version(&self, path: &str) -> Result<Option<ObjectVersion>, StorageError> {
        let response = self
            .authorize(self.client.get(self.object_url(path)))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let entry: ContentEntry = ensure_success(response).await?.json().await?;

        Ok(Some(ObjectVersion {
            path: entry.path.unwrap_or_else(|| path.to_string()),
            sha: entry.sha,
        }))
    }
}

impl ObjectStore for GitHubContentStore {
    #[instrument(skip(self), fields(branch = %self.branch))]
    async fn stat(&self, path: &str) -> Result<Option<ObjectVersion>, StorageError> {
        validate_key(path)?;
        self.fetch_version(path).await
    }

    #[instrument(skip(self, data, message), fields(branch = %self.branch, size = data.len()))]
    async fn put(&self, path: &str, data: Bytes, message: &str) -> Result<StoredObject, StorageError> {
        validate_key(path)?;
        let prior = self.fetch_version(path).await?;
        if let Some(prior) = &prior {
            debug!(sha = %prior.sha, "Overwriting existing object");
        }

        let body = PutBody {
            message,
            content: STANDARD.encode(&data),
            branch: &self.branch,
            sha: prior.as_ref().map(|v| v.sha.as_str()),
        };
        let response = self
            .authorize(self.client.put(self.object_url(path)))
            .json(&body)
            .send()
            .await?;
        let written: WriteResponse = ensure_success(response).await?.json().await?;

        Ok(StoredObject {
            path: path.to_string(),
            sha: written.content.map(|c| c.sha),
        })
    }

    #[instrument(skip(self, message), fields(branch = %self.branch))]
    async fn delete(&self, path: &str, message: &str) -> Result<DeleteOutcome, StorageError> {
        validate_key(path)?;
        let Some(current) = self.fetch_version(path).await? else {
            debug!("Object already absent");
            return Ok(DeleteOutcome::AlreadyAbsent);
        };

        let body = DeleteBody {
            message,
            sha: &current.sha,
            branch: &self.branch,
        };
        let response = self
            .authorize(self.client.delete(self.object_url(path)))
            .json(&body)
            .send()
            .await?;

        // Removed by someone else between the lookup and the delete.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DeleteOutcome::AlreadyAbsent);
        }
        ensure_success(response).await?;
        Ok(DeleteOutcome::Deleted)
    }
}

/// Pass 2xx responses through; turn anything else into `StorageError::Remote`
/// carrying the remote message verbatim.
async fn ensure_success(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<RemoteError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    warn!(status = status.as_u16(), message = %message, "Content API request failed");
    Err(StorageError::remote(status.as_u16(), message))
}

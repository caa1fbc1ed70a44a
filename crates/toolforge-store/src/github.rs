//! GitHub contents-API store
//!
//! Maps the versioned-store contract onto
//! `GET/PUT /repos/{owner}/{repo}/contents/{path}`:
//! - the blob SHA is the [`VersionTag`]
//! - `sha` in the PUT body is the `IfMatch` precondition; omitting it means
//!   create-only (GitHub answers 422 if the file exists)
//! - a stale `sha` is answered with 409

use crate::error::StoreError;
use crate::store::{PutOutcome, PutRequest, StoredFile, VersionedStore, WriteCondition};
use crate::version::VersionTag;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Public GitHub API root
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Media type GitHub recommends for REST calls
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
/// Pinned REST API version
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GitHubStore`]
#[derive(Clone)]
pub struct GitHubConfig {
    /// API root, e.g. `https://api.github.com` or a GHES `/api/v3` URL
    pub api_base: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch every read and write targets
    pub branch: String,
    /// Bearer token; anonymous when `None`
    pub token: Option<String>,
    /// `User-Agent` header (required by GitHub)
    pub user_agent: String,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Honour `HTTP(S)_PROXY` from the environment
    pub use_system_proxy: bool,
}

impl GitHubConfig {
    /// Create configuration for `owner/repo` on `main`
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            ..Self::default()
        }
    }

    /// With branch
    #[inline]
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// With API root
    #[inline]
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Without environment proxies
    #[inline]
    #[must_use]
    pub fn without_system_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }

    /// Check required fields
    ///
    /// # Errors
    /// Returns `StoreError::Config` naming the first problem.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.owner.trim().is_empty() {
            return Err(StoreError::Config("repository owner is empty".to_string()));
        }
        if self.repo.trim().is_empty() {
            return Err(StoreError::Config("repository name is empty".to_string()));
        }
        if self.branch.trim().is_empty() {
            return Err(StoreError::Config("branch is empty".to_string()));
        }
        Url::parse(&self.api_base)
            .map_err(|e| StoreError::Config(format!("invalid api_base '{}': {e}", self.api_base)))?;
        Ok(())
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            token: None,
            user_agent: format!("toolforge/{}", crate::VERSION),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            use_system_proxy: true,
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("use_system_proxy", &self.use_system_proxy)
            .finish()
    }
}

/// `GET contents` response (file case)
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// `PUT contents` request body
#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// `PUT contents` response
#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    sha: String,
}

/// GitHub error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Versioned store over the GitHub contents API
#[derive(Debug, Clone)]
pub struct GitHubStore {
    client: Client,
    config: GitHubConfig,
    base: Url,
}

impl GitHubStore {
    /// Build client for `config`
    ///
    /// # Errors
    /// Returns `StoreError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: GitHubConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let base = Url::parse(&config.api_base)
            .map_err(|e| StoreError::Config(format!("invalid api_base: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            base,
        })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// `{api}/repos/{owner}/{repo}/contents/{path}`
    ///
    /// # Errors
    /// Returns `StoreError::Config` if the API root cannot carry a path.
    pub fn contents_url(&self, path: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StoreError::Config(format!("api_base '{}' cannot be a base URL", self.base)))?;
            segments
                .pop_if_empty()
                .extend(["repos", self.config.owner.as_str(), self.config.repo.as_str(), "contents"])
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl VersionedStore for GitHubStore {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.config.branch);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::transport(path, e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::transport(path, e.to_string()))?;

        tracing::debug!(path, status, branch = %self.config.branch, "GET contents");

        match status {
            200 => decode_contents(path, &body).map(Some),
            404 => Ok(None),
            _ => Err(classify_get_failure(path, status, &body)),
        }
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        let path = request.path.as_str();
        let url = self.contents_url(path)?;
        let body = PutBody {
            message: &request.message,
            content: STANDARD.encode(&request.content),
            branch: &self.config.branch,
            sha: request.condition.expected().map(VersionTag::as_str),
        };

        let response = self
            .authorize(self.client.put(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::transport(path, e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::transport(path, e.to_string()))?;

        tracing::debug!(
            path,
            status,
            conditional = body.sha.is_some(),
            branch = %self.config.branch,
            "PUT contents"
        );

        match status {
            200 | 201 => {
                let parsed: PutResponse = serde_json::from_slice(&bytes).map_err(|e| {
                    tracing::warn!(path, status, error = %e, "write accepted but reply unreadable");
                    StoreError::unconfirmed(path, format!("status {status}, unreadable reply: {e}"))
                })?;
                let version = VersionTag::new(parsed.content.sha);
                Ok(if status == 201 {
                    PutOutcome::Created(version)
                } else {
                    PutOutcome::Updated(version)
                })
            }
            _ => Err(classify_put_failure(path, status, &request.condition, &bytes)),
        }
    }
}

/// Decode a 200 `GET contents` body into a stored file
fn decode_contents(path: &str, body: &[u8]) -> Result<StoredFile, StoreError> {
    let parsed: ContentsResponse = serde_json::from_slice(body)
        .map_err(|e| StoreError::decode(path, format!("expected a file entry: {e}")))?;

    match parsed.encoding.as_deref() {
        Some("base64") | None => {}
        Some(other) => {
            return Err(StoreError::decode(
                path,
                format!("unsupported content encoding '{other}' (file too large for the contents API?)"),
            ))
        }
    }

    let packed: String = parsed.content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let content = STANDARD
        .decode(packed.as_bytes())
        .map_err(|e| StoreError::decode(path, format!("invalid base64 content: {e}")))?;

    Ok(StoredFile {
        content,
        version: VersionTag::new(parsed.sha),
    })
}

/// GitHub's `message`, or the raw body when it has none
fn error_detail(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string())
}

fn classify_get_failure(path: &str, status: u16, body: &[u8]) -> StoreError {
    match status {
        401 | 403 => StoreError::Unauthorized {
            path: path.to_string(),
            status,
        },
        _ => StoreError::status(path, status, error_detail(body)),
    }
}

fn classify_put_failure(
    path: &str,
    status: u16,
    condition: &WriteCondition,
    body: &[u8],
) -> StoreError {
    match (status, condition) {
        (409, _) | (422, WriteCondition::CreateOnly) => {
            StoreError::conflict(path, error_detail(body))
        }
        (401 | 403, _) => StoreError::Unauthorized {
            path: path.to_string(),
            status,
        },
        _ => StoreError::status(path, status, error_detail(body)),
    }
}

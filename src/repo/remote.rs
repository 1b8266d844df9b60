//! Remote listing through the hosting provider's contents API.

use async_trait::async_trait;
use reqwest::{Response, header};
use serde::Deserialize;
use tracing::debug;

use super::{
    Credential, RepositoryLocation, RepositoryReference, ScriptFile, ScriptLocator, ScriptSource,
    is_script_name
};
use crate::error::{RetrievalError, describe_http_error};

/// Default API root of the hosting provider.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// API root serving `host`: the public API for `github.com`, the
/// Enterprise `/api/v3` root for any other host.
pub fn api_root_for_host(host: &str) -> String {
    if host.eq_ignore_ascii_case("github.com") || host.eq_ignore_ascii_case("www.github.com") {
        DEFAULT_API_URL.to_string()
    } else {
        format!("https://{}/api/v3", host)
    }
}

const USER_AGENT: &str = concat!("sql-lineage-analyzer/", env!("CARGO_PKG_VERSION"));

/// One entry of a contents listing. Only the fields the filter needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name:         String,
    #[serde(rename = "type")]
    pub kind:         String,
    #[serde(default)]
    pub download_url: Option<String>
}

/// Keep file entries with a script suffix and a download locator.
pub fn filter_entries(entries: Vec<ContentEntry>) -> Vec<ScriptFile> {
    let mut files: Vec<ScriptFile> = entries
        .into_iter()
        .filter(|e| e.kind == "file" && is_script_name(&e.name))
        .filter_map(|e| {
            e.download_url.map(|url| ScriptFile {
                name:    e.name,
                locator: ScriptLocator::Remote(url)
            })
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// Lists scripts through `GET /repos/{owner}/{repo}/contents/{path}`.
///
/// The credential is sent as an `Authorization: token ...` header and never
/// placed in a URL. Without an explicit API root, the root is derived from
/// the repository's host.
pub struct GithubContentsSource {
    client:  reqwest::Client,
    api_url: Option<String>,
    path:    String
}

impl GithubContentsSource {
    /// Source that always talks to `api_url`.
    pub fn new(api_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::build(Some(api_url.into()), path.into())
    }

    /// Source that picks the API root from each repository's host.
    pub fn for_host(path: impl Into<String>) -> Self {
        Self::build(None, path.into())
    }

    fn build(api_url: Option<String>, path: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_url,
            path
        }
    }

    fn contents_url(&self, location: &RepositoryLocation) -> String {
        let root = match &self.api_url {
            Some(url) => url.clone(),
            None => api_root_for_host(&location.host)
        };
        format!(
            "{}/repos/{}/{}/contents/{}",
            root.trim_end_matches('/'),
            location.owner,
            location.name,
            self.path.trim_matches('/')
        )
    }

    async fn get(&self, url: &str, credential: &Credential) -> Result<Response, RetrievalError> {
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("token {}", credential.expose()))
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(describe_http_error(&e)))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl ScriptSource for GithubContentsSource {
    async fn list_script_files(
        &self,
        reference: &RepositoryReference
    ) -> Result<Vec<ScriptFile>, RetrievalError> {
        let location = reference.locate()?;
        let url = self.contents_url(&location);
        debug!(%url, "listing repository contents");
        let response = self.get(&url, &reference.credential).await?;
        let entries: Vec<ContentEntry> = response
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;
        let total = entries.len();
        let files = filter_entries(entries);
        debug!(total, scripts = files.len(), "filtered contents listing");
        Ok(files)
    }

    async fn fetch_content(
        &self,
        descriptor: &ScriptFile,
        credential: &Credential
    ) -> Result<String, RetrievalError> {
        let ScriptLocator::Remote(url) = &descriptor.locator else {
            return Err(RetrievalError::InvalidReference(format!(
                "{} has no download URL",
                descriptor.name
            )));
        };
        debug!(file = %descriptor.name, "downloading script");
        let response = self.get(url, credential).await?;
        response
            .text()
            .await
            .map_err(|e| RetrievalError::Transport(describe_http_error(&e)))
    }

    fn name(&self) -> &'static str {
        "github-api"
    }
}

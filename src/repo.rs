//! Repository access: references, credentials and script listing.
//!
//! Two [`ScriptSource`] implementations share one contract:
//!
//! | Strategy | Listing | Content |
//! |----------|---------|---------|
//! | [`GithubContentsSource`] | `GET /repos/{owner}/{repo}/contents/{path}` | authenticated GET on `download_url` |
//! | [`CloneSource`] | `git clone` + non-recursive directory scan | local file read |
//!
//! Listing only yields descriptors. Script bodies are fetched on demand,
//! one file at a time, through [`ScriptSource::fetch_content`].

mod clone;
mod remote;

use std::{fmt, path::PathBuf};

use async_trait::async_trait;
pub use clone::{CloneAuth, CloneSource, redact_credentials, scan_working_copy};
pub use remote::{
    ContentEntry, DEFAULT_API_URL, GithubContentsSource, api_root_for_host, filter_entries
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::RetrievalError;

/// Suffix that marks a script file. Matching is case-sensitive.
pub const SCRIPT_SUFFIX: &str = ".sql";

/// Returns `true` when `name` carries the exact lowercase `.sql` suffix.
pub fn is_script_name(name: &str) -> bool {
    name.ends_with(SCRIPT_SUFFIX)
}

/// Access token that never shows up in debug output, logs or serialized data.
///
/// The value is zeroed when dropped. Transport code reads it through
/// [`Credential::expose`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw token value. Only pass this to a transport, never to a formatter.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for Credential {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>
    {
        String::deserialize(deserializer).map(Self)
    }
}

/// Repository location plus the token used to reach it.
#[derive(Debug, Clone)]
pub struct RepositoryReference {
    pub location:   String,
    pub credential: Credential
}

impl RepositoryReference {
    pub fn new(location: impl Into<String>, credential: Credential) -> Self {
        Self {
            location: location.into(),
            credential
        }
    }

    /// Split the location into host, owner and repository name.
    pub fn locate(&self) -> Result<RepositoryLocation, RetrievalError> {
        parse_repository_location(&self.location)
    }
}

/// Host-qualified coordinates of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    pub host:  String,
    pub owner: String,
    pub name:  String
}

impl RepositoryLocation {
    /// HTTPS clone URL without any credential.
    pub fn clone_url(&self) -> String {
        format!("https://{}/{}/{}.git", self.host, self.owner, self.name)
    }
}

/// Parse `https://host/owner/repo(.git)`, `host/owner/repo` or `owner/repo`.
///
/// The bare `owner/repo` form resolves to `github.com`.
pub fn parse_repository_location(location: &str) -> Result<RepositoryLocation, RetrievalError> {
    let invalid = || RetrievalError::InvalidReference(location.to_string());
    let trimmed = location.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    // Drop any user info already present in the location.
    let without_userinfo = match without_scheme.split_once('@') {
        Some((_, rest)) => rest,
        None => without_scheme
    };
    let segments: Vec<&str> = without_userinfo
        .trim_end_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let (host, owner, name) = match segments.as_slice() {
        [owner, name] => ("github.com", *owner, *name),
        [host, owner, name] => (*host, *owner, *name),
        _ => return Err(invalid())
    };
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() || owner.is_empty() {
        return Err(invalid());
    }
    Ok(RepositoryLocation {
        host:  host.to_string(),
        owner: owner.to_string(),
        name:  name.to_string()
    })
}

/// Where a script's content can be retrieved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "at", rename_all = "lowercase")]
pub enum ScriptLocator {
    /// Path inside a local working copy
    Local(PathBuf),
    /// Download URL on the hosting provider
    Remote(String)
}

/// Descriptor of a candidate script. Holds no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptFile {
    pub name:    String,
    pub locator: ScriptLocator
}

/// Listing and fetching contract shared by both repository strategies.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Candidate scripts in the repository. An empty vector means the
    /// repository has no scripts and is not an error.
    async fn list_script_files(
        &self,
        reference: &RepositoryReference
    ) -> Result<Vec<ScriptFile>, RetrievalError>;

    /// Raw text of one script.
    async fn fetch_content(
        &self,
        descriptor: &ScriptFile,
        credential: &Credential
    ) -> Result<String, RetrievalError>;

    fn name(&self) -> &'static str;
}

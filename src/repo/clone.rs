//! Clone-based listing: `git clone` into a working directory, then scan it.
//!
//! A working copy left by an earlier session is fetched and reset instead
//! of cloned again.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::LazyLock
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use regex::Regex;
use serde::Deserialize;
use tokio::{fs, process::Command};
use tracing::{debug, info};

use super::{
    Credential, RepositoryLocation, RepositoryReference, ScriptFile, ScriptLocator, ScriptSource,
    is_script_name, parse_repository_location
};
use crate::error::RetrievalError;

/// User info segment of an HTTP(S) URL, e.g. the token in `https://tok@host`.
static URL_USERINFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://)[^@/\s]+@").expect("valid regex"));

/// How the clone authenticates against the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloneAuth {
    /// `Authorization` header passed through git's environment config
    #[default]
    Header,
    /// Legacy `https://<token>@host/...` URL. The token ends up in the
    /// process arguments and in the clone's remote config.
    EmbeddedUrl
}

/// Replace URL user info and any literal occurrence of the token.
pub fn redact_credentials(text: &str, credential: &Credential) -> String {
    let redacted = URL_USERINFO.replace_all(text, "${1}[REDACTED]@").into_owned();
    if credential.is_empty() {
        redacted
    } else {
        redacted.replace(credential.expose(), "[REDACTED]")
    }
}

/// Script files directly inside `dir`, sorted by name. Not recursive.
pub async fn scan_working_copy(dir: &Path) -> Result<Vec<ScriptFile>, RetrievalError> {
    let io_error = |source| RetrievalError::Io {
        path: dir.display().to_string(),
        source
    };
    let mut entries = fs::read_dir(dir).await.map_err(io_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_file && is_script_name(&name) {
            files.push(ScriptFile {
                locator: ScriptLocator::Local(entry.path()),
                name
            });
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Clones the repository into `workdir/<repo-name>` and scans the result.
/// An existing clone of the same repository at that path is reused.
pub struct CloneSource {
    workdir: PathBuf,
    git:     String,
    auth:    CloneAuth,
    shallow: bool
}

impl CloneSource {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            git:     String::from("git"),
            auth:    CloneAuth::default(),
            shallow: false
        }
    }

    pub fn with_auth(mut self, auth: CloneAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    /// Use a different `git` executable.
    pub fn with_git(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    /// Directory the repository is cloned into.
    pub fn destination(&self, location: &RepositoryLocation) -> PathBuf {
        self.workdir.join(&location.name)
    }

    /// `git` with credential config, prompts disabled and output captured.
    fn git(&self, credential: &Credential) -> Command {
        let mut cmd = Command::new(&self.git);
        if self.auth == CloneAuth::Header {
            let basic = STANDARD.encode(format!("x-access-token:{}", credential.expose()));
            cmd.env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "http.extraHeader")
                .env("GIT_CONFIG_VALUE_0", format!("Authorization: Basic {}", basic));
        }
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn clone_command(
        &self,
        location: &RepositoryLocation,
        credential: &Credential,
        dest: &Path
    ) -> Command {
        let mut cmd = self.git(credential);
        cmd.arg("clone");
        if self.shallow {
            cmd.args(["--depth", "1"]);
        }
        match self.auth {
            CloneAuth::Header => cmd.arg(location.clone_url()),
            CloneAuth::EmbeddedUrl => cmd.arg(embedded_credential_url(location, credential))
        };
        cmd.arg(dest);
        cmd
    }

    /// Run `cmd` to completion and return its stdout. Failures carry the
    /// redacted stderr.
    async fn run(
        &self,
        mut cmd: Command,
        credential: &Credential
    ) -> Result<String, RetrievalError> {
        let output = cmd
            .output()
            .await
            .map_err(|e| RetrievalError::Clone(format!("failed to run '{}': {}", self.git, e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RetrievalError::Clone(redact_credentials(stderr.trim(), credential)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Bring a working copy left by an earlier session up to date.
    ///
    /// The copy must track the same repository; anything else is refused
    /// rather than overwritten.
    async fn refresh(
        &self,
        location: &RepositoryLocation,
        credential: &Credential,
        dest: &Path
    ) -> Result<(), RetrievalError> {
        let mut remote = self.git(credential);
        remote.arg("-C").arg(dest).args(["remote", "get-url", "origin"]);
        let origin = self.run(remote, credential).await?;
        let tracked = parse_repository_location(&origin).is_ok_and(|found| found == *location);
        if !tracked {
            return Err(RetrievalError::Clone(format!(
                "{} already holds a different repository ({})",
                dest.display(),
                redact_credentials(&origin, credential)
            )));
        }

        let mut fetch = self.git(credential);
        fetch.arg("-C").arg(dest).arg("fetch");
        if self.shallow {
            fetch.args(["--depth", "1"]);
        }
        fetch.arg("origin");
        self.run(fetch, credential).await?;

        let mut reset = self.git(credential);
        reset
            .arg("-C")
            .arg(dest)
            .args(["reset", "--hard", "FETCH_HEAD"]);
        self.run(reset, credential).await?;
        Ok(())
    }
}

/// `https://<token>@host/owner/repo.git`
pub(crate) fn embedded_credential_url(
    location: &RepositoryLocation,
    credential: &Credential
) -> String {
    format!(
        "https://{}@{}/{}/{}.git",
        credential.expose(),
        location.host,
        location.owner,
        location.name
    )
}

#[async_trait]
impl ScriptSource for CloneSource {
    async fn list_script_files(
        &self,
        reference: &RepositoryReference
    ) -> Result<Vec<ScriptFile>, RetrievalError> {
        let location = reference.locate()?;
        let dest = self.destination(&location);
        let repo = format!("{}/{}", location.owner, location.name);
        if fs::try_exists(dest.join(".git")).await.unwrap_or(false) {
            info!(%repo, dest = %dest.display(), "updating existing working copy");
            self.refresh(&location, &reference.credential, &dest).await?;
        } else {
            info!(%repo, dest = %dest.display(), auth = ?self.auth, "cloning repository");
            let clone = self.clone_command(&location, &reference.credential, &dest);
            self.run(clone, &reference.credential).await?;
        }
        let files = scan_working_copy(&dest).await?;
        debug!(scripts = files.len(), "scanned working copy");
        Ok(files)
    }

    async fn fetch_content(
        &self,
        descriptor: &ScriptFile,
        _credential: &Credential
    ) -> Result<String, RetrievalError> {
        let ScriptLocator::Local(path) = &descriptor.locator else {
            return Err(RetrievalError::InvalidReference(format!(
                "{} is not in a local working copy",
                descriptor.name
            )));
        };
        debug!(path = %path.display(), "reading script");
        fs::read_to_string(path)
            .await
            .map_err(|source| RetrievalError::Io {
                path: path.display().to_string(),
                source
            })
    }

    fn name(&self) -> &'static str {
        "git-clone"
    }
}

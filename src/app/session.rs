//! One user session: a repository reference and the strategy that reaches it.

use tracing::{info, warn};

use crate::{
    classify::{ClassificationResult, ScriptClassifier},
    error::RetrievalError,
    repo::{RepositoryReference, ScriptFile, ScriptSource, redact_credentials}
};

/// Lists once, then fetches and classifies on demand.
///
/// The reference (and its credential) lives only as long as the session.
pub struct Session {
    source:    Box<dyn ScriptSource>,
    reference: RepositoryReference
}

impl Session {
    pub fn new(source: Box<dyn ScriptSource>, reference: RepositoryReference) -> Self {
        Self {
            source,
            reference
        }
    }

    /// Candidate scripts. Empty is a valid outcome, distinct from an error.
    pub async fn list(&self) -> Result<Vec<ScriptFile>, RetrievalError> {
        info!(
            repo = %redact_credentials(&self.reference.location, &self.reference.credential),
            strategy = self.source.name(),
            "listing scripts"
        );
        let files = self.source.list_script_files(&self.reference).await?;
        if files.is_empty() {
            warn!("no script files found");
        }
        Ok(files)
    }

    /// Read one script's content. One call, one read.
    pub async fn fetch(&self, file: &ScriptFile) -> Result<String, RetrievalError> {
        info!(file = %file.name, "fetching script");
        self.source
            .fetch_content(file, &self.reference.credential)
            .await
    }

    /// Fetch `file` exactly once and classify its content.
    pub async fn analyze(
        &self,
        file: &ScriptFile,
        classifier: &ScriptClassifier
    ) -> Result<ClassificationResult, RetrievalError> {
        let script = self.fetch(file).await?;
        info!(file = %file.name, chars = script.len(), "classifying script");
        Ok(classifier.analyze(&script).await)
    }
}

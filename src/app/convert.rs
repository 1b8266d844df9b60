//! Type conversion functions for CLI to internal types.

use crate::{
    classify::ErrorPolicy,
    cli::{Format, Policy},
    output::OutputFormat,
    repo::CloneAuth
};

/// Converts a CLI format to the internal output format.
pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml
    }
}

/// Converts a CLI error policy to the classifier's policy.
pub fn convert_policy(policy: Policy) -> ErrorPolicy {
    match policy {
        Policy::Collapse => ErrorPolicy::Collapse,
        Policy::PerCategory => ErrorPolicy::PerCategory
    }
}

/// `--embed-token` forces the legacy URL form, otherwise the configured mode.
pub fn convert_clone_auth(embed_token: bool, configured: CloneAuth) -> CloneAuth {
    if embed_token {
        CloneAuth::EmbeddedUrl
    } else {
        configured
    }
}

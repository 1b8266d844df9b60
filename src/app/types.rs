//! Application types for CLI commands.
//!
//! This module defines the parameter and output structures passed between
//! the command-line layer and the pipeline.

use crate::cli::{Format, LlmArgs, Policy, RepoArgs};

/// Parameters for the list command.
#[derive(Debug, Clone)]
pub struct ListParams {
    /// Repository reference and listing strategy.
    pub repo:          RepoArgs,
    /// Output format for the listing.
    pub output_format: Format,
    /// Disable colored terminal output.
    pub no_color:      bool
}

/// Parameters for the analyze command.
///
/// Contains everything the command line passes in to drive one session:
/// repository access, generation settings and output preferences.
#[derive(Debug, Clone)]
pub struct AnalyzeParams {
    /// Repository reference and listing strategy.
    pub repo:          RepoArgs,
    /// LLM provider overrides.
    pub llm:           LlmArgs,
    /// Script to analyze without prompting.
    pub file:          Option<String>,
    /// Override for how generation failures are shown.
    pub error_policy:  Option<Policy>,
    /// Output format for results.
    pub output_format: Format,
    /// Dry run mode - show what would be sent to LLM.
    pub dry_run:       bool,
    /// Disable colored terminal output.
    pub no_color:      bool
}

/// Output from CLI command execution.
///
/// # Example
///
/// ```
/// use sql_lineage_analyzer::app::CommandOutput;
///
/// let output = CommandOutput {
///     exit_code: 0,
///     stdout:    vec!["orders_etl.sql".to_string()],
///     stderr:    vec![]
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code for the process (see [`crate::app`] for the meaning).
    pub exit_code: i32,
    /// Lines to print to stdout.
    pub stdout:    Vec<String>,
    /// Warnings and errors to print to stderr.
    pub stderr:    Vec<String>
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Transport;

    fn repo_args() -> RepoArgs {
        RepoArgs {
            repo:        Some("acme/etl".to_string()),
            token:       Some("ghp_secret".to_string()),
            transport:   Transport::Api,
            path:        None,
            api_url:     None,
            workdir:     None,
            embed_token: false
        }
    }

    #[test]
    fn test_list_params_clone() {
        let params = ListParams {
            repo:          repo_args(),
            output_format: Format::Text,
            no_color:      true
        };
        let cloned = params.clone();
        assert_eq!(cloned.repo.repo, params.repo.repo);
    }

    #[test]
    fn test_command_output_default() {
        let output = CommandOutput::default();
        assert_eq!(output.exit_code, 0);
        assert!(output.stdout.is_empty());
        assert!(output.stderr.is_empty());
    }
}

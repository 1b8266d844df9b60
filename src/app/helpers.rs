//! Helper functions for CLI operations.
//!
//! Resolving effective settings from CLI flags and configuration, building
//! the repository source and LLM provider, and interpreting user selections.

use std::{io, time::Duration};

use super::convert::{convert_clone_auth, convert_format, convert_policy};
use crate::{
    classify::{DEFAULT_TEMPERATURE, ScriptClassifier},
    cli::{Format, LlmArgs, Policy, Provider, RepoArgs, Transport},
    config::Config,
    error::{AppResult, config_error},
    llm::{LlmClient, LlmProvider},
    output::OutputOptions,
    repo::{
        CloneSource, Credential, GithubContentsSource, RepositoryReference, ScriptFile,
        ScriptSource
    }
};

/// Message shown when the repository reference or credential is missing.
pub const MISSING_INPUT_MESSAGE: &str =
    "Please provide the GitHub repository URL and personal access token.";

/// Prompt shown when the token has to be typed in.
pub const TOKEN_PROMPT: &str = "GitHub personal access token: ";

/// Ask for the token when a repository is given without one.
///
/// `read` does the actual (masked) read. It is not called when the token is
/// already present or there is no repository to use it for. A blank answer
/// leaves the token unset.
pub fn fill_missing_token<F>(args: &mut RepoArgs, read: F) -> io::Result<()>
where
    F: FnOnce() -> io::Result<String>
{
    let has_token = args.token.as_deref().is_some_and(|t| !t.trim().is_empty());
    let has_repo = args.repo.as_deref().is_some_and(|r| !r.trim().is_empty());
    if has_token || !has_repo {
        return Ok(());
    }
    let token = read()?;
    let token = token.trim();
    args.token = (!token.is_empty()).then(|| token.to_string());
    Ok(())
}

/// Create output options from parameters
pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  convert_format(format),
        colored: !no_color
    }
}

/// Repository reference from CLI input, `None` when either part is missing.
pub fn build_reference(args: &RepoArgs) -> Option<RepositoryReference> {
    let location = args.repo.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let credential = args
        .token
        .as_deref()
        .map(Credential::new)
        .filter(|c| !c.is_empty())?;
    Some(RepositoryReference::new(location, credential))
}

/// Listing strategy selected by `--transport`.
pub fn build_source(args: &RepoArgs, config: &Config) -> Box<dyn ScriptSource> {
    match args.transport {
        Transport::Api => {
            let path = args.path.clone().unwrap_or_else(|| config.github.path.clone());
            match args.api_url.clone().or_else(|| config.github.api_url.clone()) {
                Some(api_url) => Box::new(GithubContentsSource::new(api_url, path)),
                None => Box::new(GithubContentsSource::for_host(path))
            }
        }
        Transport::Clone => {
            let workdir = args
                .workdir
                .clone()
                .unwrap_or_else(|| config.working_copy.workdir.clone());
            let auth = convert_clone_auth(args.embed_token, config.working_copy.auth);
            Box::new(
                CloneSource::new(workdir)
                    .with_auth(auth)
                    .with_shallow(config.working_copy.shallow)
            )
        }
    }
}

/// Provider from the CLI, then configuration, then Groq.
pub fn resolve_provider(cli: Option<Provider>, config_name: Option<&str>) -> AppResult<Provider> {
    if let Some(provider) = cli {
        return Ok(provider);
    }
    match config_name {
        Some(name) => Provider::from_name(name)
            .ok_or_else(|| config_error(format!("Unknown LLM provider '{}'", name))),
        None => Ok(Provider::Groq)
    }
}

/// Check if LLM access is available
pub fn has_llm_access(api_key: &Option<Credential>, provider: &Provider) -> bool {
    api_key.is_some() || matches!(provider, Provider::Ollama)
}

/// Get effective model name
pub fn get_effective_model(
    model: Option<String>,
    config_model: Option<String>,
    provider: &Provider
) -> String {
    model
        .or(config_model)
        .unwrap_or_else(|| provider.default_model().to_string())
}

/// Build LLM provider from parameters
pub fn build_llm_provider(
    provider: Provider,
    api_key: Option<Credential>,
    model: String,
    base_url: String
) -> AppResult<LlmProvider> {
    let require_key = |key: Option<Credential>, name: &str| {
        key.ok_or_else(|| {
            config_error(format!(
                "API key required for {} (use --api-key or LLM_API_KEY)",
                name
            ))
        })
    };
    match provider {
        Provider::Groq => Ok(LlmProvider::Groq {
            api_key: require_key(api_key, "Groq")?,
            model,
            base_url
        }),
        Provider::OpenAI => Ok(LlmProvider::OpenAI {
            api_key: require_key(api_key, "OpenAI")?,
            model,
            base_url
        }),
        Provider::Anthropic => Ok(LlmProvider::Anthropic {
            api_key: require_key(api_key, "Anthropic")?,
            model,
            base_url
        }),
        Provider::Ollama => Ok(LlmProvider::Ollama {
            base_url,
            model
        })
    }
}

/// Temperature from the CLI, then configuration, then the default.
pub fn get_effective_temperature(cli: Option<f32>, config: Option<f32>) -> f32 {
    cli.or(config).unwrap_or(DEFAULT_TEMPERATURE)
}

/// Classifier wired to the effective provider, key and policy.
///
/// The generation-service key is resolved here, once, and handed to the
/// client. Nothing downstream reads the environment.
pub fn build_classifier(
    args: &LlmArgs,
    policy: Option<Policy>,
    config: &Config
) -> AppResult<ScriptClassifier> {
    let provider = resolve_provider(args.provider, config.llm.provider.as_deref())?;
    let api_key = args
        .api_key
        .as_deref()
        .map(Credential::new)
        .or_else(|| config.llm.api_key.clone());
    if !has_llm_access(&api_key, &provider) {
        return Err(config_error(
            "Set LLM_API_KEY (or GROQ_API_KEY) to analyze scripts"
        ));
    }
    let model = get_effective_model(args.model.clone(), config.llm.model.clone(), &provider);
    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.llm.base_url.clone())
        .unwrap_or_else(|| provider.default_base_url().to_string());
    let llm_provider = build_llm_provider(provider, api_key, model, base_url)?;
    let client = LlmClient::with_timeout(
        llm_provider,
        Duration::from_secs(config.llm.timeout_secs)
    );
    let policy = policy
        .map(convert_policy)
        .unwrap_or(config.analysis.error_policy);
    Ok(ScriptClassifier::new(client)
        .with_temperature(get_effective_temperature(
            args.temperature,
            config.llm.temperature
        ))
        .with_error_policy(policy))
}

/// Interpret a selection as a 1-based index or an exact file name.
pub fn resolve_selection<'a>(files: &'a [ScriptFile], input: &str) -> Option<&'a ScriptFile> {
    let input = input.trim();
    if let Ok(index) = input.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| files.get(i));
    }
    files.iter().find(|f| f.name == input)
}

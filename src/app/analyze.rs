//! Core analysis execution logic.
//!
//! `run_analyze` drives one session: list the repository's scripts, let the
//! user pick one (or take `--file`), fetch that script once and classify it.

use std::{
    io::{BufRead, Write},
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use super::{
    EXIT_MISSING_INPUT, EXIT_OK, EXIT_RETRIEVAL,
    helpers::{
        MISSING_INPUT_MESSAGE, build_classifier, build_reference, build_source,
        create_output_options, get_effective_temperature, resolve_selection
    },
    session::Session,
    types::AnalyzeParams
};
use crate::{
    classify::{ScriptClassifier, preview_requests},
    config::Config,
    error::{AppResult, terminal_error},
    output::{
        EMPTY_LISTING_MESSAGE, OutputOptions, format_classification, format_error, format_listing,
        format_prompts, format_warning
    },
    repo::ScriptFile
};

/// Prompt shown before each selection.
fn selection_prompt(count: usize) -> String {
    format!("Select SQL file [1-{}] (empty to quit): ", count)
}

/// Executes one interactive analysis session.
///
/// 1. **Input check**: a missing repository or token is a warning, exit `2`
/// 2. **Listing**: retrieval failures are shown inline, exit `1`; an empty
///    repository is a warning, exit `0`
/// 3. **Selection**: `--file`, or a prompt read from `input` until an empty
///    line, `q` or end of input
/// 4. **Analysis**: the selected script is fetched once and classified
///
/// Results go to `out`, warnings and errors to `err`.
///
/// # Errors
///
/// Returns an error if the LLM provider cannot be configured or the
/// terminal cannot be read or written. Generation failures never surface
/// here; they are folded into the displayed result.
///
/// # Example
///
/// ```no_run
/// use std::io;
///
/// use sql_lineage_analyzer::{
///     app::{AnalyzeParams, run_analyze},
///     cli::{Format, LlmArgs, RepoArgs, Transport},
///     config::Config
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let params = AnalyzeParams {
///     repo:          RepoArgs {
///         repo:        Some("acme/warehouse".to_string()),
///         token:       Some("ghp_...".to_string()),
///         transport:   Transport::Api,
///         path:        None,
///         api_url:     None,
///         workdir:     None,
///         embed_token: false
///     },
///     llm:           LlmArgs {
///         provider:    None,
///         api_key:     None,
///         model:       None,
///         base_url:    None,
///         temperature: None
///     },
///     file:          Some("orders_etl.sql".to_string()),
///     error_policy:  None,
///     output_format: Format::Text,
///     dry_run:       false,
///     no_color:      false
/// };
///
/// let stdin = io::stdin();
/// let code = run_analyze(
///     params,
///     Config::load()?,
///     &mut stdin.lock(),
///     &mut io::stdout(),
///     &mut io::stderr()
/// )
/// .await?;
/// println!("Exit code: {}", code);
/// # Ok(())
/// # }
/// ```
pub async fn run_analyze<R, W, E>(
    params: AnalyzeParams,
    config: Config,
    input: &mut R,
    out: &mut W,
    err: &mut E
) -> AppResult<i32>
where
    R: BufRead,
    W: Write,
    E: Write
{
    let opts = create_output_options(params.output_format, params.no_color);
    let Some(reference) = build_reference(&params.repo) else {
        writeln!(err, "{}", format_warning(MISSING_INPUT_MESSAGE, &opts)).map_err(terminal_error)?;
        return Ok(EXIT_MISSING_INPUT);
    };

    let classifier = if params.dry_run {
        None
    } else {
        Some(build_classifier(&params.llm, params.error_policy, &config)?)
    };
    let temperature = get_effective_temperature(params.llm.temperature, config.llm.temperature);

    let session = Session::new(build_source(&params.repo, &config), reference);
    let files = match session.list().await {
        Ok(files) => files,
        Err(e) => {
            writeln!(err, "{}", format_error(&e.to_string(), &opts)).map_err(terminal_error)?;
            return Ok(EXIT_RETRIEVAL);
        }
    };
    if files.is_empty() {
        writeln!(err, "{}", format_warning(EMPTY_LISTING_MESSAGE, &opts)).map_err(terminal_error)?;
        return Ok(EXIT_OK);
    }

    if let Some(name) = params.file.as_deref() {
        let Some(file) = resolve_selection(&files, name) else {
            let message = format!("Script '{}' not found in the repository", name);
            writeln!(err, "{}", format_error(&message, &opts)).map_err(terminal_error)?;
            return Ok(EXIT_RETRIEVAL);
        };
        return match analyze_file(&session, file, classifier.as_ref(), temperature, &opts).await {
            Ok(rendered) => {
                writeln!(out, "{}", rendered).map_err(terminal_error)?;
                Ok(EXIT_OK)
            }
            Err(message) => {
                writeln!(err, "{}", format_error(&message, &opts)).map_err(terminal_error)?;
                Ok(EXIT_RETRIEVAL)
            }
        };
    }

    writeln!(out, "{}", format_listing(&files, &opts)).map_err(terminal_error)?;
    let mut line = String::new();
    loop {
        write!(out, "{}", selection_prompt(files.len())).map_err(terminal_error)?;
        out.flush().map_err(terminal_error)?;
        line.clear();
        if input.read_line(&mut line).map_err(terminal_error)? == 0 {
            break;
        }
        let choice = line.trim();
        if choice.is_empty() || choice.eq_ignore_ascii_case("q") {
            break;
        }
        let Some(file) = resolve_selection(&files, choice) else {
            let message = format!("Invalid selection '{}'", choice);
            writeln!(err, "{}", format_error(&message, &opts)).map_err(terminal_error)?;
            continue;
        };
        match analyze_file(&session, file, classifier.as_ref(), temperature, &opts).await {
            Ok(rendered) => writeln!(out, "{}\n", rendered).map_err(terminal_error)?,
            Err(message) => {
                writeln!(err, "{}", format_error(&message, &opts)).map_err(terminal_error)?
            }
        }
    }
    Ok(EXIT_OK)
}

/// Fetch one script and render either its prompts (dry run) or its
/// classification. A retrieval failure comes back as its message.
async fn analyze_file(
    session: &Session,
    file: &ScriptFile,
    classifier: Option<&ScriptClassifier>,
    temperature: f32,
    opts: &OutputOptions
) -> Result<String, String> {
    let Some(classifier) = classifier else {
        let script = session.fetch(file).await.map_err(|e| e.to_string())?;
        debug!(file = %file.name, "dry run, skipping generation");
        let prompts = preview_requests(&script, temperature);
        return Ok(format_prompts(&file.name, &prompts, opts));
    };

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Analyzing {} with LLM...", file.name));
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = session.analyze(file, classifier).await;
    pb.finish_and_clear();

    let result = outcome.map_err(|e| e.to_string())?;
    Ok(format_classification(&file.name, &result, opts))
}

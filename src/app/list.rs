//! The list command: show the scripts a repository offers.

use super::{
    EXIT_MISSING_INPUT, EXIT_OK, EXIT_RETRIEVAL,
    helpers::{MISSING_INPUT_MESSAGE, build_reference, build_source, create_output_options},
    session::Session,
    types::{CommandOutput, ListParams}
};
use crate::{
    config::Config,
    output::{EMPTY_LISTING_MESSAGE, OutputFormat, format_error, format_listing, format_warning}
};

/// Lists the repository's scripts.
///
/// Missing input and retrieval failures are reported as inline messages
/// with a non-zero exit code. An empty repository is a warning on stderr
/// with exit code `0`; structured formats still print the empty list.
pub async fn run_list(params: ListParams, config: Config) -> CommandOutput {
    let opts = create_output_options(params.output_format, params.no_color);
    let Some(reference) = build_reference(&params.repo) else {
        return CommandOutput {
            exit_code: EXIT_MISSING_INPUT,
            stdout:    vec![],
            stderr:    vec![format_warning(MISSING_INPUT_MESSAGE, &opts)]
        };
    };
    let session = Session::new(build_source(&params.repo, &config), reference);
    match session.list().await {
        Ok(files) if files.is_empty() => CommandOutput {
            exit_code: EXIT_OK,
            stdout:    match opts.format {
                OutputFormat::Text => vec![],
                _ => vec![format_listing(&files, &opts)]
            },
            stderr:    vec![format_warning(EMPTY_LISTING_MESSAGE, &opts)]
        },
        Ok(files) => CommandOutput {
            exit_code: EXIT_OK,
            stdout:    vec![format_listing(&files, &opts)],
            stderr:    vec![]
        },
        Err(e) => CommandOutput {
            exit_code: EXIT_RETRIEVAL,
            stdout:    vec![],
            stderr:    vec![format_error(&e.to_string(), &opts)]
        }
    }
}

//! Application logic for the SQL Lineage Analyzer CLI.
//!
//! This module contains the command flows separated from the main entry
//! point to enable testing.
//!
//! # Exit Codes
//!
//! - `0` - Success, including a repository with no SQL files
//! - `1` - The repository could not be listed or the script not fetched
//! - `2` - Repository reference or access token missing (the token is
//!   prompted for, masked, when stdin is a terminal)

mod analyze;
mod convert;
mod helpers;
mod list;
mod session;
mod types;

pub use analyze::run_analyze;
pub use convert::{convert_clone_auth, convert_format, convert_policy};
pub use helpers::{
    MISSING_INPUT_MESSAGE, TOKEN_PROMPT, build_classifier, build_llm_provider, build_reference,
    build_source, create_output_options, fill_missing_token, get_effective_model,
    get_effective_temperature, has_llm_access, resolve_provider, resolve_selection
};
pub use list::run_list;
pub use session::Session;
pub use types::{AnalyzeParams, CommandOutput, ListParams};

/// Successful run.
pub const EXIT_OK: i32 = 0;
/// Listing or fetching failed.
pub const EXIT_RETRIEVAL: i32 = 1;
/// Repository reference or token not supplied.
pub const EXIT_MISSING_INPUT: i32 = 2;

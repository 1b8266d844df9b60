//! # SQL Lineage Analyzer
//!
//! Ask an LLM which tables a repository's SQL scripts read from, which they
//! write to, and what business logic they implement.
//!
//! `sql-lineage-analyzer` lists the `.sql` files in a repository, lets you
//! pick one, fetches it once and sends three focused prompts to a
//! chat-completion service. The three answers are shown as labeled blocks.
//!
//! # Architecture
//!
//! A session runs in three steps:
//!
//! 1. **Listing** - Script descriptors come from the GitHub contents API or
//!    from a `git clone` followed by a scan of the working copy root.
//!
//! 2. **Retrieval** - Only the selected script is fetched, exactly once.
//!
//! 3. **Classification** - Three requests (source tables, destination
//!    tables, business logic) are sent concurrently. By default any failure
//!    collapses the whole result into a single error message.
//!
//! # Quick Start
//!
//! ```bash
//! export GITHUB_TOKEN="ghp_..."
//! export LLM_API_KEY="gsk_..."
//!
//! # List scripts
//! sql-lineage-analyzer list -r acme/warehouse
//!
//! # Pick a script interactively
//! sql-lineage-analyzer analyze -r acme/warehouse
//!
//! # Analyze one script through a local clone
//! sql-lineage-analyzer analyze -r acme/warehouse --transport clone --file orders_etl.sql
//!
//! # Inspect the prompts without calling the LLM
//! sql-lineage-analyzer analyze -r acme/warehouse --file orders_etl.sql --dry-run
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`LLM_API_KEY`, `LLM_PROVIDER`, etc.)
//! 3. `.sql-lineage.toml` in current directory
//! 4. `~/.config/sql-lineage/config.toml`
//!
//! ## Example Configuration
//!
//! ```toml
//! [llm]
//! provider = "groq"
//! model = "llama-3.1-8b-instant"
//! temperature = 0.7
//! timeout_secs = 120
//!
//! [github]
//! path = "sql"
//!
//! [clone]
//! workdir = "/tmp/lineage"
//! auth = "header"
//!
//! [analysis]
//! error_policy = "collapse"
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success, including a repository with no SQL files
//! - `1` - Listing or retrieval failed, or a fatal error occurred
//! - `2` - Repository reference or access token missing
//!
//! # Output Formats
//!
//! - `text` - Human-readable colored output (default)
//! - `json` - Structured JSON for programmatic processing
//! - `yaml` - YAML format for configuration management

use std::{
    io::{self, IsTerminal},
    process
};

use clap::Parser;
use sql_lineage_analyzer::{
    app::{AnalyzeParams, ListParams, TOKEN_PROMPT, fill_missing_token, run_analyze, run_list},
    cli::{Cli, Commands},
    config::Config,
    error::{AppResult, terminal_error},
    logging::init_logging
};
use tokio::main;

#[main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run() -> AppResult<i32> {
    let mut cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;
    if io::stdin().is_terminal() {
        fill_missing_token(cli.repo_args_mut(), || {
            rpassword::prompt_password(TOKEN_PROMPT)
        })
        .map_err(terminal_error)?;
    }

    match cli.command {
        Commands::List {
            repo,
            output_format,
            no_color
        } => {
            let output = run_list(
                ListParams {
                    repo,
                    output_format,
                    no_color
                },
                config
            )
            .await;
            for line in &output.stdout {
                println!("{}", line);
            }
            for line in &output.stderr {
                eprintln!("{}", line);
            }
            Ok(output.exit_code)
        }
        Commands::Analyze {
            repo,
            llm,
            file,
            error_policy,
            output_format,
            dry_run,
            no_color
        } => {
            let params = AnalyzeParams {
                repo,
                llm,
                file,
                error_policy,
                output_format,
                dry_run,
                no_color
            };
            let stdin = io::stdin();
            run_analyze(
                params,
                config,
                &mut stdin.lock(),
                &mut io::stdout(),
                &mut io::stderr()
            )
            .await
        }
    }
}

//! Structured diagnostics on stderr.
//!
//! `RUST_LOG` wins when set. Otherwise the crate logs at `warn`, or `debug`
//! with `--verbose`, and HTTP internals stay at `warn`. Credentials are never
//! passed to a log macro.

use std::{env, sync::Once};

use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::Directive, fmt, prelude::*};

static INIT: Once = Once::new();

/// Crate log level when `RUST_LOG` is unset.
pub fn default_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

/// Directives applied on top of the environment filter.
pub fn default_directives(verbose: bool) -> Vec<String> {
    vec![
        format!("sql_lineage_analyzer={}", default_level(verbose)),
        "h2=warn".to_string(),
        "hyper=warn".to_string(),
        "reqwest=warn".to_string()
    ]
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            for directive in default_directives(verbose) {
                if let Ok(directive) = directive.parse::<Directive>() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}

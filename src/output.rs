use colored::Colorize;
use serde::Serialize;

use crate::{
    classify::{Category, ClassificationResult, GenerationPreview},
    repo::ScriptFile
};

/// Message shown when a repository has no script files.
pub const EMPTY_LISTING_MESSAGE: &str = "No SQL files found in the repository.";

/// Output format for results
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// Analysis result for serialization
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub file:   &'a str,
    pub result: &'a ClassificationResult
}

fn heading(text: &str, opts: &OutputOptions) -> String {
    if opts.colored {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Warning line in the same style as other inline messages
pub fn format_warning(message: &str, opts: &OutputOptions) -> String {
    if opts.colored {
        format!("{} {}", "warning:".yellow().bold(), message)
    } else {
        format!("warning: {}", message)
    }
}

/// Error line in the same style as other inline messages
pub fn format_error(message: &str, opts: &OutputOptions) -> String {
    if opts.colored {
        format!("{} {}", "error:".red().bold(), message)
    } else {
        format!("error: {}", message)
    }
}

/// Format the candidate scripts as a numbered selection list
pub fn format_listing(files: &[ScriptFile], opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(files).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(files).unwrap_or_default(),
        OutputFormat::Text => {
            if files.is_empty() {
                return format_warning(EMPTY_LISTING_MESSAGE, opts);
            }
            let mut output = heading("SQL files:", opts);
            output.push('\n');
            for (i, file) in files.iter().enumerate() {
                let index = format!("{:>3}.", i + 1);
                if opts.colored {
                    output.push_str(&format!("{} {}\n", index.cyan(), file.name));
                } else {
                    output.push_str(&format!("{} {}\n", index, file.name));
                }
            }
            output
        }
    }
}

/// Format the three classification fields as labeled blocks
pub fn format_classification(
    file: &str,
    result: &ClassificationResult,
    opts: &OutputOptions
) -> String {
    let report = AnalysisReport {
        file,
        result
    };
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(&report).unwrap_or_default(),
        OutputFormat::Text => {
            let mut output = heading(&format!("=== Analysis Results: {} ===", file), opts);
            output.push_str("\n\n");
            for category in Category::ALL {
                let label = format!("{}:", category.label());
                if opts.colored {
                    output.push_str(&label.cyan().bold().to_string());
                } else {
                    output.push_str(&label);
                }
                output.push('\n');
                output.push_str(result.field(category));
                output.push_str("\n\n");
            }
            output.truncate(output.trim_end().len());
            output
        }
    }
}

/// Format the requests a dry run would send
pub fn format_prompts(file: &str, prompts: &[GenerationPreview], opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(prompts).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(prompts).unwrap_or_default(),
        OutputFormat::Text => {
            let mut output = heading(&format!("=== DRY RUN - Would send to LLM: {} ===", file), opts);
            output.push_str("\n\n");
            for preview in prompts {
                output.push_str(&format!(
                    "[{}] max_tokens={} temperature={}\n",
                    preview.category.label(),
                    preview.request.max_tokens,
                    preview.request.temperature
                ));
                output.push_str(&format!("system: {}\n", preview.request.system));
                output.push_str(&format!("user: {}\n\n", preview.request.prompt));
            }
            output.truncate(output.trim_end().len());
            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::ScriptLocator;

    fn plain() -> OutputOptions {
        OutputOptions {
            format:  OutputFormat::Text,
            colored: false
        }
    }

    fn result() -> ClassificationResult {
        ClassificationResult {
            source_tables:      "staging.orders".to_string(),
            destination_tables: "dw.orders".to_string(),
            business_logic:     "Copies orders.".to_string()
        }
    }

    #[test]
    fn test_empty_listing_is_warning() {
        let out = format_listing(&[], &plain());
        assert_eq!(out, "warning: No SQL files found in the repository.");
    }

    #[test]
    fn test_listing_is_numbered() {
        let files = vec![ScriptFile {
            name:    "orders_etl.sql".to_string(),
            locator: ScriptLocator::Remote("https://raw/orders_etl.sql".to_string())
        }];
        let out = format_listing(&files, &plain());
        assert!(out.contains("  1. orders_etl.sql"));
    }

    #[test]
    fn test_classification_text_blocks_in_order() {
        let out = format_classification("orders_etl.sql", &result(), &plain());
        let src = out.find("Source Tables:\nstaging.orders").unwrap();
        let dst = out.find("Destination Tables:\ndw.orders").unwrap();
        let logic = out.find("Business Logic:\nCopies orders.").unwrap();
        assert!(src < dst && dst < logic);
        assert!(out.starts_with("=== Analysis Results: orders_etl.sql ==="));
    }

    #[test]
    fn test_classification_json() {
        let opts = OutputOptions {
            format:  OutputFormat::Json,
            colored: false
        };
        let out = format_classification("a.sql", &result(), &opts);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["file"], "a.sql");
        assert_eq!(value["result"]["destination_tables"], "dw.orders");
    }

    #[test]
    fn test_error_line() {
        assert_eq!(format_error("boom", &plain()), "error: boom");
    }
}
